//! # Travel Search
//!
//! Hotel and flight search backed by a job-based scraping provider.
//!
//! A search submits a provider run, polls it until it reaches a terminal
//! status, fetches the run's dataset and normalizes the loosely-typed records
//! into [`HotelResult`] / [`FlightResult`]. Whenever the live path cannot
//! produce data the caller still receives a well-shaped response built by
//! the [`fallback`] generator, tagged with [`ResultSource::Fallback`].

pub mod api;
pub mod client;
pub mod config;
pub mod deeplink;
pub mod fallback;
pub mod normalize;
pub mod poller;
pub mod search;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// Re-export main types for convenience
pub use client::{JobProvider, ProviderClient, RawRecord, RunHandle, RunStatus};
pub use config::{AppConfig, ProviderConfig, ServerConfig, SourceConfig};
pub use normalize::{RatingScale, ResultNormalizer};
pub use poller::{JobPoller, PollOutcome, PollPolicy};
pub use search::SearchOrchestrator;

/// Error types for the search pipeline
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Invalid search request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Provider unavailable (status {status}): {body}")]
    ProviderUnavailable { status: u16, body: String },

    #[error("Provider run ended with status {0}")]
    JobFailed(RunStatus),

    #[error("Provider run still pending after {attempts} status checks")]
    JobTimedOut { attempts: u32 },

    #[error("Search cancelled")]
    Cancelled,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl SearchError {
    /// Errors the caller is allowed to see. Everything else is absorbed by
    /// the fallback path.
    pub fn is_user_visible(&self) -> bool {
        matches!(self, SearchError::InvalidRequest(_) | SearchError::Configuration(_))
    }
}

/// Where the results of a response came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultSource {
    Provider,
    Fallback,
}

impl fmt::Display for ResultSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultSource::Provider => write!(f, "provider"),
            ResultSource::Fallback => write!(f, "fallback"),
        }
    }
}

/// Trip type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TripType {
    RoundTrip,
    OneWay,
}

/// Seat class enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SeatClass {
    Economy,
    PremiumEconomy,
    Business,
    First,
}

impl FromStr for SeatClass {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "economy" => Ok(SeatClass::Economy),
            "premium-economy" | "premium_economy" => Ok(SeatClass::PremiumEconomy),
            "business" => Ok(SeatClass::Business),
            "first" => Ok(SeatClass::First),
            _ => Err(SearchError::InvalidRequest(format!("Invalid cabin class: {}", s))),
        }
    }
}

/// Largest party Google Flights accepts in one search
pub const MAX_PASSENGERS: u32 = 9;
/// Booking.com caps both adults and rooms per search at 30
pub const MAX_GUESTS: u32 = 30;
pub const MAX_ROOMS: u32 = 30;

fn default_guests() -> u32 {
    2
}

fn default_rooms() -> u32 {
    1
}

fn default_passengers() -> u32 {
    1
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate, SearchError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        SearchError::InvalidRequest(format!("{} must be a YYYY-MM-DD date, got '{}'", field, value))
    })
}

fn check_count(field: &str, value: u32, max: u32) -> Result<(), SearchError> {
    if value == 0 {
        return Err(SearchError::InvalidRequest(format!("{} must be at least 1", field)));
    }
    if value > max {
        return Err(SearchError::InvalidRequest(format!("{} must be at most {}", field, max)));
    }
    Ok(())
}

fn require(field: &str, value: &str) -> Result<(), SearchError> {
    if value.trim().is_empty() {
        return Err(SearchError::InvalidRequest(format!("{} is required", field)));
    }
    Ok(())
}

/// Hotel search request as submitted by the frontend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelSearchRequest {
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub check_in_date: String,
    #[serde(default)]
    pub check_out_date: String,
    #[serde(default = "default_guests")]
    pub number_of_people: u32,
    #[serde(default = "default_rooms")]
    pub rooms: u32,
}

/// A hotel request that passed validation
#[derive(Debug, Clone)]
pub struct HotelSearch {
    pub destination: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: u32,
    pub rooms: u32,
    pub nights: u32,
}

impl HotelSearchRequest {
    pub fn new(destination: &str, check_in_date: &str, check_out_date: &str) -> Self {
        Self {
            destination: destination.to_string(),
            check_in_date: check_in_date.to_string(),
            check_out_date: check_out_date.to_string(),
            number_of_people: default_guests(),
            rooms: default_rooms(),
        }
    }

    /// Check the request before any provider call is made
    pub fn validate(&self) -> Result<HotelSearch, SearchError> {
        require("destination", &self.destination)?;
        require("checkInDate", &self.check_in_date)?;
        require("checkOutDate", &self.check_out_date)?;

        let check_in = parse_date("checkInDate", &self.check_in_date)?;
        let check_out = parse_date("checkOutDate", &self.check_out_date)?;
        if check_out <= check_in {
            return Err(SearchError::InvalidRequest(
                "checkOutDate must be after checkInDate".to_string(),
            ));
        }
        check_count("numberOfPeople", self.number_of_people, MAX_GUESTS)?;
        check_count("rooms", self.rooms, MAX_ROOMS)?;

        Ok(HotelSearch {
            destination: self.destination.trim().to_string(),
            check_in,
            check_out,
            guests: self.number_of_people,
            rooms: self.rooms,
            nights: (check_out - check_in).num_days() as u32,
        })
    }
}

impl HotelSearch {
    pub fn params(&self) -> HotelSearchParams {
        HotelSearchParams {
            destination: self.destination.clone(),
            check_in_date: self.check_in.to_string(),
            check_out_date: self.check_out.to_string(),
            number_of_people: self.guests,
            rooms: self.rooms,
            nights: self.nights,
        }
    }
}

/// Flight search request as submitted by the frontend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightSearchRequest {
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
    #[serde(default, alias = "departureDate")]
    pub depart_date: String,
    #[serde(default)]
    pub return_date: Option<String>,
    #[serde(default = "default_passengers")]
    pub passengers: u32,
    #[serde(default)]
    pub cabin_class: Option<String>,
}

/// A flight request that passed validation
#[derive(Debug, Clone)]
pub struct FlightSearch {
    pub from: String,
    pub to: String,
    pub depart: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub passengers: u32,
    pub seat_class: SeatClass,
    pub trip_type: TripType,
    /// Trip length in days, zero for one-way trips
    pub duration: u32,
}

impl FlightSearchRequest {
    pub fn new(from: &str, to: &str, depart_date: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            depart_date: depart_date.to_string(),
            return_date: None,
            passengers: default_passengers(),
            cabin_class: None,
        }
    }

    /// Check the request before any provider call is made
    pub fn validate(&self) -> Result<FlightSearch, SearchError> {
        require("to", &self.to)?;
        require("from", &self.from)?;
        require("departDate", &self.depart_date)?;

        let depart = parse_date("departDate", &self.depart_date)?;
        let return_date = match self.return_date.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => {
                let date = parse_date("returnDate", raw)?;
                if date <= depart {
                    return Err(SearchError::InvalidRequest(
                        "returnDate must be after departDate".to_string(),
                    ));
                }
                Some(date)
            }
            _ => None,
        };
        check_count("passengers", self.passengers, MAX_PASSENGERS)?;
        let seat_class = self
            .cabin_class
            .as_deref()
            .map(SeatClass::from_str)
            .transpose()?
            .unwrap_or(SeatClass::Economy);

        let (trip_type, duration) = match return_date {
            Some(date) => (TripType::RoundTrip, (date - depart).num_days() as u32),
            None => (TripType::OneWay, 0),
        };

        Ok(FlightSearch {
            from: self.from.trim().to_uppercase(),
            to: self.to.trim().to_uppercase(),
            depart,
            return_date,
            passengers: self.passengers,
            seat_class,
            trip_type,
            duration,
        })
    }
}

impl FlightSearch {
    pub fn params(&self) -> FlightSearchParams {
        FlightSearchParams {
            from: self.from.clone(),
            to: self.to.clone(),
            depart_date: self.depart.to_string(),
            return_date: self.return_date.map(|d| d.to_string()),
            passengers: self.passengers,
            cabin_class: self.seat_class,
            trip_type: self.trip_type,
            duration: self.duration,
        }
    }
}

/// Hotel search parameters echoed back to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelSearchParams {
    pub destination: String,
    pub check_in_date: String,
    pub check_out_date: String,
    pub number_of_people: u32,
    pub rooms: u32,
    pub nights: u32,
}

/// Flight search parameters echoed back to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightSearchParams {
    pub from: String,
    pub to: String,
    pub depart_date: String,
    pub return_date: Option<String>,
    pub passengers: u32,
    pub cabin_class: SeatClass,
    pub trip_type: TripType,
    pub duration: u32,
}

/// Price information with amount and currency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Price {
    pub amount: f64,
    pub currency: String,
    pub formatted: String,
    pub total: f64,
    pub total_formatted: String,
}

impl Price {
    /// Build a price for `amount` per unit, `multiplier` units
    pub fn new(amount: f64, currency: &str, multiplier: u32) -> Self {
        let amount = if amount.is_finite() { amount.max(0.0) } else { 0.0 };
        let total = amount * f64::from(multiplier.max(1));
        Self {
            amount,
            currency: currency.to_string(),
            formatted: format_money(amount, currency),
            total,
            total_formatted: format_money(total, currency),
        }
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.formatted)
    }
}

/// Render an amount the way the frontend displays it, e.g. `€120` or `CHF 89.50`
pub fn format_money(amount: f64, currency: &str) -> String {
    let number = if amount.fract().abs() < f64::EPSILON {
        format!("{:.0}", amount)
    } else {
        format!("{:.2}", amount)
    };
    match currency {
        "EUR" => format!("€{}", number),
        "GBP" => format!("£{}", number),
        "USD" => format!("${}", number),
        other => format!("{} {}", other, number),
    }
}

/// Hotel location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub address: String,
    pub city: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Normalized hotel result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelResult {
    pub id: String,
    pub name: String,
    pub price: Price,
    pub rating: f64,
    pub rating_text: String,
    pub review_count: u32,
    pub stars: u32,
    pub location: Location,
    pub amenities: Vec<String>,
    pub image_url: String,
    pub booking_url: String,
    pub check_in: String,
    pub check_out: String,
    pub nights: u32,
    pub guests: u32,
    pub rooms: u32,
}

/// Normalized flight result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightResult {
    pub id: String,
    pub airline: String,
    pub flight_number: String,
    pub origin: String,
    pub destination: String,
    pub departure_time: String,
    pub arrival_time: String,
    pub duration: String,
    pub stops: u32,
    pub stops_text: String,
    pub price: Price,
    pub booking_url: String,
    pub depart_date: String,
    pub return_date: Option<String>,
    pub passengers: u32,
}

/// Uniform response envelope for both search kinds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse<T, P> {
    pub success: bool,
    pub results: Vec<T>,
    pub search_params: P,
    pub total_results: usize,
    pub source: ResultSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
}

impl<T, P> SearchResponse<T, P> {
    pub fn new(results: Vec<T>, search_params: P, source: ResultSource) -> Self {
        Self {
            success: true,
            total_results: results.len(),
            results,
            search_params,
            source,
            fallback_reason: None,
        }
    }

    pub fn with_fallback_reason(mut self, reason: impl Into<String>) -> Self {
        self.fallback_reason = Some(reason.into());
        self
    }
}

pub type HotelSearchResponse = SearchResponse<HotelResult, HotelSearchParams>;
pub type FlightSearchResponse = SearchResponse<FlightResult, FlightSearchParams>;
