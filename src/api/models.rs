use serde::{Deserialize, Serialize};

use crate::{
    FlightResult, FlightSearchParams, FlightSearchResponse, HotelResult, HotelSearchParams, HotelSearchResponse,
    ResultSource,
};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelSearchBody {
    pub success: bool,
    pub hotels: Vec<HotelResult>,
    pub search_params: HotelSearchParams,
    pub total_results: usize,
    pub source: ResultSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
}

impl From<HotelSearchResponse> for HotelSearchBody {
    fn from(response: HotelSearchResponse) -> Self {
        Self {
            success: response.success,
            hotels: response.results,
            search_params: response.search_params,
            total_results: response.total_results,
            source: response.source,
            fallback_reason: response.fallback_reason,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightSearchBody {
    pub success: bool,
    pub flights: Vec<FlightResult>,
    pub search_params: FlightSearchParams,
    pub total_results: usize,
    pub source: ResultSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
}

impl From<FlightSearchResponse> for FlightSearchBody {
    fn from(response: FlightSearchResponse) -> Self {
        Self {
            success: response.success,
            flights: response.results,
            search_params: response.search_params,
            total_results: response.total_results,
            source: response.source,
            fallback_reason: response.fallback_reason,
        }
    }
}

/// Body returned with every 4xx/5xx status
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthBody {
    pub status: String,
    pub provider_configured: bool,
}
