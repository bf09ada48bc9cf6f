//! Search orchestration
//!
//! One invocation walks `validate → submit → poll → fetch → normalize` and
//! swaps in fallback results on any provider-side failure. Only request
//! validation and missing configuration reach the caller as errors.

use crate::client::{JobProvider, ProviderClient, RawRecord, RunHandle};
use crate::config::{AppConfig, SourceConfig};
use crate::fallback::FallbackProvider;
use crate::normalize::ResultNormalizer;
use crate::poller::JobPoller;
use crate::{
    FlightSearch, FlightSearchRequest, FlightSearchResponse, HotelSearch, HotelSearchRequest,
    HotelSearchResponse, ResultSource, SearchError, SearchResponse,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

enum ProviderState {
    Ready(Arc<dyn JobProvider>),
    /// Credential missing; holds the configuration error message
    Missing(String),
}

/// Entry point for hotel and flight searches
pub struct SearchOrchestrator {
    provider: ProviderState,
    hotels: SourceConfig,
    flights: SourceConfig,
    fallback_without_credentials: bool,
    shutdown: CancellationToken,
}

impl SearchOrchestrator {
    pub fn new(provider: Arc<dyn JobProvider>, hotels: SourceConfig, flights: SourceConfig) -> Self {
        Self {
            provider: ProviderState::Ready(provider),
            hotels,
            flights,
            fallback_without_credentials: false,
            shutdown: CancellationToken::new(),
        }
    }

    /// Build from process configuration. A missing credential does not stop
    /// startup; searches report it as a configuration error instead.
    pub fn from_config(config: &AppConfig) -> Result<Self, SearchError> {
        let provider = match ProviderClient::new(&config.provider) {
            Ok(client) => ProviderState::Ready(Arc::new(client)),
            Err(SearchError::Configuration(reason)) => {
                error!(reason = %reason, "Provider client not configured");
                ProviderState::Missing(reason)
            }
            Err(e) => return Err(e),
        };
        Ok(Self {
            provider,
            hotels: config.hotels.clone(),
            flights: config.flights.clone(),
            fallback_without_credentials: config.server.fallback_without_credentials,
            shutdown: CancellationToken::new(),
        })
    }

    pub fn with_fallback_without_credentials(mut self, enabled: bool) -> Self {
        self.fallback_without_credentials = enabled;
        self
    }

    /// Poll loops end early once `token` is cancelled
    pub fn with_shutdown(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    pub fn provider_configured(&self) -> bool {
        matches!(self.provider, ProviderState::Ready(_))
    }

    /// The live provider, or the reason a fallback/configuration error applies
    fn provider(&self) -> Result<Arc<dyn JobProvider>, SearchError> {
        match &self.provider {
            ProviderState::Ready(provider) => Ok(provider.clone()),
            ProviderState::Missing(reason) => Err(SearchError::Configuration(reason.clone())),
        }
    }

    #[instrument(level = "info", skip(self, request), fields(destination = %request.destination))]
    pub async fn search_hotels(&self, request: &HotelSearchRequest) -> Result<HotelSearchResponse, SearchError> {
        let search = request.validate()?;
        info!(
            check_in = %search.check_in,
            check_out = %search.check_out,
            nights = search.nights,
            guests = search.guests,
            rooms = search.rooms,
            "Hotel search request received"
        );

        let provider = match self.provider() {
            Ok(provider) => provider,
            Err(e) if self.fallback_without_credentials => return Ok(self.hotel_fallback(&search, &e)),
            Err(e) => return Err(e),
        };

        let input = hotel_input(&search, &self.hotels);
        let records = match self.run_live(provider.as_ref(), &self.hotels, &input).await {
            Ok(records) => records,
            Err(e) => return Ok(self.hotel_fallback(&search, &e)),
        };

        let hotels = ResultNormalizer::new(&self.hotels).hotels(&records, &search);
        if hotels.is_empty() {
            let e = SearchError::ProviderUnavailable {
                status: 0,
                body: format!("none of {} records were usable", records.len()),
            };
            return Ok(self.hotel_fallback(&search, &e));
        }

        info!(results = hotels.len(), "Hotel search completed from provider");
        Ok(SearchResponse::new(hotels, search.params(), ResultSource::Provider))
    }

    #[instrument(level = "info", skip(self, request), fields(from = %request.from, to = %request.to))]
    pub async fn search_flights(&self, request: &FlightSearchRequest) -> Result<FlightSearchResponse, SearchError> {
        let search = request.validate()?;
        info!(
            depart = %search.depart,
            return_date = ?search.return_date,
            passengers = search.passengers,
            "Flight search request received"
        );

        let provider = match self.provider() {
            Ok(provider) => provider,
            Err(e) if self.fallback_without_credentials => return Ok(self.flight_fallback(&search, &e)),
            Err(e) => return Err(e),
        };

        let input = flight_input(&search, &self.flights);
        let records = match self.run_live(provider.as_ref(), &self.flights, &input).await {
            Ok(records) => records,
            Err(e) => return Ok(self.flight_fallback(&search, &e)),
        };

        let flights = ResultNormalizer::new(&self.flights).flights(&records, &search);
        if flights.is_empty() {
            let e = SearchError::ProviderUnavailable {
                status: 0,
                body: format!("none of {} records were usable", records.len()),
            };
            return Ok(self.flight_fallback(&search, &e));
        }

        info!(results = flights.len(), "Flight search completed from provider");
        Ok(SearchResponse::new(flights, search.params(), ResultSource::Provider))
    }

    /// Submit, poll and fetch one provider job
    async fn run_live(
        &self,
        provider: &dyn JobProvider,
        source: &SourceConfig,
        input: &Value,
    ) -> Result<Vec<RawRecord>, SearchError> {
        let start_time = Instant::now();
        let run = submit(provider, source, input).await?;

        JobPoller::new(provider, source.poll.clone())
            .poll(&run, &self.shutdown)
            .await
            .into_result()?;

        let records = provider.fetch_items(&run).await?;
        info!(
            run_id = %run.run_id,
            records = records.len(),
            duration_ms = start_time.elapsed().as_millis(),
            "Provider job finished"
        );
        Ok(records)
    }

    fn hotel_fallback(&self, search: &HotelSearch, cause: &SearchError) -> HotelSearchResponse {
        log_fallback("hotels", cause);
        let hotels = FallbackProvider::new(&self.hotels).hotels(search);
        SearchResponse::new(hotels, search.params(), ResultSource::Fallback).with_fallback_reason(cause.to_string())
    }

    fn flight_fallback(&self, search: &FlightSearch, cause: &SearchError) -> FlightSearchResponse {
        log_fallback("flights", cause);
        let flights = FallbackProvider::new(&self.flights).flights(search);
        SearchResponse::new(flights, search.params(), ResultSource::Fallback).with_fallback_reason(cause.to_string())
    }
}

/// Start a run with the primary actor, then the alternate one
async fn submit(provider: &dyn JobProvider, source: &SourceConfig, input: &Value) -> Result<RunHandle, SearchError> {
    let mut last_error = None;
    for actor in source.actors() {
        match provider.start_run(actor, input).await {
            Ok(run) => return Ok(run),
            Err(e) => {
                warn!(actor, error = %e, "Failed to start provider run");
                last_error = Some(e);
            }
        }
    }
    Err(last_error.unwrap_or_else(|| SearchError::ProviderUnavailable {
        status: 0,
        body: "no actor configured".to_string(),
    }))
}

fn log_fallback(kind: &str, cause: &SearchError) {
    match cause {
        SearchError::JobTimedOut { attempts } => {
            warn!(kind, attempts, "Provider job timed out, serving fallback results")
        }
        SearchError::JobFailed(status) => {
            warn!(kind, status = %status, "Provider job failed, serving fallback results")
        }
        SearchError::Cancelled => info!(kind, "Search cancelled, serving fallback results"),
        SearchError::Configuration(reason) => {
            warn!(kind, reason = %reason, "Provider not configured, serving fallback results")
        }
        other => warn!(kind, error = %other, "Provider unavailable, serving fallback results"),
    }
}

/// Provider input for a hotel search
pub fn hotel_input(search: &HotelSearch, source: &SourceConfig) -> Value {
    json!({
        "search": search.destination,
        "checkIn": search.check_in.to_string(),
        "checkOut": search.check_out.to_string(),
        "adults": search.guests,
        "children": 0,
        "rooms": search.rooms,
        "currency": source.default_currency,
        "language": "en-gb",
        "maxItems": source.max_results,
        "sortBy": "distance_from_search",
    })
}

/// Provider input for a flight search
pub fn flight_input(search: &FlightSearch, source: &SourceConfig) -> Value {
    json!({
        "origin": search.from,
        "destination": search.to,
        "departDate": search.depart.to_string(),
        "returnDate": search.return_date.map(|d| d.to_string()),
        "adults": search.passengers,
        "cabinClass": search.seat_class,
        "currency": source.default_currency,
        "maxItems": source.max_results,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::RunStatus;
    use crate::normalize::RatingScale;
    use crate::poller::PollPolicy;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Provider double with fixed behaviour per operation
    struct FakeProvider {
        failing_actors: Vec<&'static str>,
        status: RunStatus,
        items: Result<Vec<Value>, u16>,
        started_with: Mutex<Vec<String>>,
        calls: AtomicU32,
    }

    impl FakeProvider {
        fn new(status: RunStatus, items: Vec<Value>) -> Self {
            Self {
                failing_actors: vec![],
                status,
                items: Ok(items),
                started_with: Mutex::new(vec![]),
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl JobProvider for FakeProvider {
        async fn start_run(&self, actor_id: &str, _input: &Value) -> Result<RunHandle, SearchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.started_with.lock().unwrap().push(actor_id.to_string());
            if self.failing_actors.iter().any(|a| *a == actor_id) {
                return Err(SearchError::ProviderUnavailable {
                    status: 402,
                    body: "payment required".to_string(),
                });
            }
            Ok(RunHandle {
                run_id: format!("run-{}", actor_id),
                dataset_id: "ds".to_string(),
            })
        }

        async fn get_status(&self, _run: &RunHandle) -> Result<RunStatus, SearchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.status)
        }

        async fn fetch_items(&self, _run: &RunHandle) -> Result<Vec<RawRecord>, SearchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.items {
                Ok(items) => Ok(items.clone()),
                Err(code) => Err(SearchError::ProviderUnavailable {
                    status: *code,
                    body: "dataset gone".to_string(),
                }),
            }
        }
    }

    fn source() -> SourceConfig {
        let mut source = SourceConfig::new(
            "primary/actor",
            PollPolicy {
                interval: Duration::from_millis(1),
                max_attempts: 3,
                deadline: None,
            },
        );
        source.alternate_actor_id = Some("alternate/actor".to_string());
        source
    }

    fn orchestrator(provider: Arc<FakeProvider>) -> SearchOrchestrator {
        SearchOrchestrator::new(provider, source().with_rating_scale(RatingScale::ten_point()), source())
    }

    fn hotel_request() -> HotelSearchRequest {
        HotelSearchRequest::new("Vienna", "2025-09-01", "2025-09-04")
    }

    #[tokio::test]
    async fn test_live_hotel_search() {
        let provider = Arc::new(FakeProvider::new(
            RunStatus::Succeeded,
            vec![json!({ "name": "Hotel X", "price": "€120", "guestRating": 8.7 })],
        ));
        let response = orchestrator(provider.clone())
            .search_hotels(&hotel_request())
            .await
            .unwrap();

        assert!(response.success);
        assert_eq!(response.source, ResultSource::Provider);
        assert_eq!(response.total_results, 1);
        assert_eq!(response.results[0].price.total, 360.0);
        assert_eq!(response.search_params.nights, 3);
        assert!(response.fallback_reason.is_none());
        assert_eq!(*provider.started_with.lock().unwrap(), vec!["primary/actor"]);
    }

    #[tokio::test]
    async fn test_alternate_actor_used_when_primary_fails() {
        let mut fake = FakeProvider::new(RunStatus::Succeeded, vec![json!({ "name": "Alt Hotel" })]);
        fake.failing_actors = vec!["primary/actor"];
        let provider = Arc::new(fake);
        let response = orchestrator(provider.clone())
            .search_hotels(&hotel_request())
            .await
            .unwrap();

        assert_eq!(response.source, ResultSource::Provider);
        assert_eq!(
            *provider.started_with.lock().unwrap(),
            vec!["primary/actor", "alternate/actor"]
        );
    }

    #[tokio::test]
    async fn test_both_actors_failing_falls_back() {
        let mut fake = FakeProvider::new(RunStatus::Succeeded, vec![]);
        fake.failing_actors = vec!["primary/actor", "alternate/actor"];
        let response = orchestrator(Arc::new(fake))
            .search_hotels(&hotel_request())
            .await
            .unwrap();

        assert!(response.success);
        assert_eq!(response.source, ResultSource::Fallback);
        assert_eq!(response.total_results, 3);
        assert!(response.fallback_reason.unwrap().contains("402"));
    }

    #[tokio::test]
    async fn test_failed_and_timed_out_runs_fall_back() {
        for status in [RunStatus::Failed, RunStatus::Running] {
            let provider = Arc::new(FakeProvider::new(status, vec![json!({ "name": "Never" })]));
            let response = orchestrator(provider)
                .search_hotels(&hotel_request())
                .await
                .unwrap();
            assert_eq!(response.source, ResultSource::Fallback);
            assert!(!response.results.is_empty());
        }
    }

    #[tokio::test]
    async fn test_fetch_failure_and_unusable_dataset_fall_back() {
        let mut fake = FakeProvider::new(RunStatus::Succeeded, vec![]);
        fake.items = Err(500);
        let response = orchestrator(Arc::new(fake))
            .search_hotels(&hotel_request())
            .await
            .unwrap();
        assert_eq!(response.source, ResultSource::Fallback);

        let fake = FakeProvider::new(RunStatus::Succeeded, vec![json!({ "price": 10 })]);
        let response = orchestrator(Arc::new(fake))
            .search_hotels(&hotel_request())
            .await
            .unwrap();
        assert_eq!(response.source, ResultSource::Fallback);
        assert!(response.fallback_reason.unwrap().contains("usable"));
    }

    #[tokio::test]
    async fn test_validation_gate_makes_no_provider_calls() {
        let provider = Arc::new(FakeProvider::new(RunStatus::Succeeded, vec![]));
        let orchestrator = orchestrator(provider.clone());

        let bad_dates = HotelSearchRequest::new("Vienna", "2025-09-04", "2025-09-04");
        let result = orchestrator.search_hotels(&bad_dates).await;
        assert!(matches!(result, Err(SearchError::InvalidRequest(_))));

        let no_destination = FlightSearchRequest::new("LAX", "", "2025-09-04");
        let result = orchestrator.search_flights(&no_destination).await;
        assert!(matches!(result, Err(SearchError::InvalidRequest(_))));

        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_credentials() {
        let config = AppConfig::from_vars(Default::default()).unwrap();
        let orchestrator = SearchOrchestrator::from_config(&config).unwrap();
        assert!(!orchestrator.provider_configured());

        let result = orchestrator.search_hotels(&hotel_request()).await;
        assert!(matches!(result, Err(SearchError::Configuration(_))));

        let orchestrator = orchestrator.with_fallback_without_credentials(true);
        let response = orchestrator.search_hotels(&hotel_request()).await.unwrap();
        assert_eq!(response.source, ResultSource::Fallback);
    }

    #[tokio::test]
    async fn test_shutdown_cancels_polling() {
        let provider = Arc::new(FakeProvider::new(RunStatus::Running, vec![]));
        let token = CancellationToken::new();
        let mut flights = source();
        flights.poll.interval = Duration::from_secs(3600);
        let orchestrator = SearchOrchestrator::new(provider.clone(), source(), flights)
            .with_shutdown(token.clone());
        token.cancel();

        let response = orchestrator
            .search_flights(&FlightSearchRequest::new("LAX", "JFK", "2025-09-04"))
            .await
            .unwrap();
        assert_eq!(response.source, ResultSource::Fallback);
        assert_eq!(response.fallback_reason.as_deref(), Some("Search cancelled"));
    }

    #[tokio::test]
    async fn test_live_flight_search() {
        let provider = Arc::new(FakeProvider::new(
            RunStatus::Succeeded,
            vec![
                json!({ "airline": "Alaska", "price": 199, "stops": 0 }),
                json!({ "carrier": "Delta", "price": "$250", "stops": "1 stop" }),
            ],
        ));
        let mut request = FlightSearchRequest::new("SEA", "SFO", "2025-09-04");
        request.return_date = Some("2025-09-08".to_string());
        let response = orchestrator(provider).search_flights(&request).await.unwrap();

        assert_eq!(response.source, ResultSource::Provider);
        assert_eq!(response.total_results, 2);
        assert_eq!(response.search_params.duration, 4);
        assert_eq!(response.results[1].stops_text, "1 stop");
    }

    #[test]
    fn test_provider_inputs() {
        let hotels = source();
        let search = hotel_request().validate().unwrap();
        let input = hotel_input(&search, &hotels);
        assert_eq!(input["search"], "Vienna");
        assert_eq!(input["checkIn"], "2025-09-01");
        assert_eq!(input["adults"], 2);

        let mut request = FlightSearchRequest::new("SEA", "SFO", "2025-09-04");
        request.cabin_class = Some("first".to_string());
        let input = flight_input(&request.validate().unwrap(), &hotels);
        assert_eq!(input["cabinClass"], "first");
        assert!(input["returnDate"].is_null());
    }
}
