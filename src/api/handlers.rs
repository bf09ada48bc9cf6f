use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

use crate::search::SearchOrchestrator;
use crate::{FlightSearchRequest, HotelSearchRequest, SearchError};

use super::models::{ErrorBody, FlightSearchBody, HealthBody, HotelSearchBody};

type ApiError = (StatusCode, Json<ErrorBody>);

fn error_response(e: SearchError) -> ApiError {
    match e {
        SearchError::InvalidRequest(message) => {
            warn!(error = %message, "Rejected search request");
            (StatusCode::BAD_REQUEST, Json(ErrorBody::new(message)))
        }
        other => {
            error!(error = %other, "Search failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorBody::new(other.to_string())))
        }
    }
}

fn rejection_response(rejection: JsonRejection) -> ApiError {
    warn!(error = %rejection.body_text(), "Malformed request body");
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody::new(format!("Invalid request body: {}", rejection.body_text()))),
    )
}

pub async fn health_handler(State(orchestrator): State<Arc<SearchOrchestrator>>) -> Json<HealthBody> {
    Json(HealthBody {
        status: "ok".to_string(),
        provider_configured: orchestrator.provider_configured(),
    })
}

pub async fn hotel_search_handler(
    State(orchestrator): State<Arc<SearchOrchestrator>>,
    request: Result<Json<HotelSearchRequest>, JsonRejection>,
) -> Result<Json<HotelSearchBody>, ApiError> {
    let start = Instant::now();
    let Json(request) = request.map_err(rejection_response)?;

    let response = orchestrator.search_hotels(&request).await.map_err(error_response)?;

    info!(
        source = %response.source,
        results = response.total_results,
        processing_time_ms = start.elapsed().as_millis(),
        "Hotel search served"
    );
    Ok(Json(response.into()))
}

pub async fn flight_search_handler(
    State(orchestrator): State<Arc<SearchOrchestrator>>,
    request: Result<Json<FlightSearchRequest>, JsonRejection>,
) -> Result<Json<FlightSearchBody>, ApiError> {
    let start = Instant::now();
    let Json(request) = request.map_err(rejection_response)?;

    let response = orchestrator.search_flights(&request).await.map_err(error_response)?;

    info!(
        source = %response.source,
        results = response.total_results,
        processing_time_ms = start.elapsed().as_millis(),
        "Flight search served"
    );
    Ok(Json(response.into()))
}
