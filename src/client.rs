//! HTTP client for the job-based scraping provider
//!
//! Pure transport: one request per call, no retries. Retry and backoff
//! belong to the [`JobPoller`](crate::poller::JobPoller).

use crate::config::ProviderConfig;
use crate::SearchError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

/// An untyped record as delivered by the provider
pub type RawRecord = Value;

/// Identifies one in-flight provider run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunHandle {
    pub run_id: String,
    pub dataset_id: String,
}

/// Provider-side run state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Ready,
    Running,
    Succeeded,
    Failed,
    Aborted,
    TimingOut,
    Unknown,
}

impl RunStatus {
    /// Map the provider's status string, tolerating case and separators
    pub fn from_provider(status: &str) -> Self {
        match status.trim().to_uppercase().replace('_', "-").as_str() {
            "READY" => RunStatus::Ready,
            "RUNNING" => RunStatus::Running,
            "SUCCEEDED" => RunStatus::Succeeded,
            "FAILED" => RunStatus::Failed,
            "ABORTING" | "ABORTED" => RunStatus::Aborted,
            "TIMING-OUT" | "TIMED-OUT" => RunStatus::TimingOut,
            _ => RunStatus::Unknown,
        }
    }

    pub fn is_terminal_failure(self) -> bool {
        matches!(self, RunStatus::Failed | RunStatus::Aborted | RunStatus::TimingOut)
    }

    pub fn is_terminal(self) -> bool {
        self == RunStatus::Succeeded || self.is_terminal_failure()
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunStatus::Ready => "READY",
            RunStatus::Running => "RUNNING",
            RunStatus::Succeeded => "SUCCEEDED",
            RunStatus::Failed => "FAILED",
            RunStatus::Aborted => "ABORTED",
            RunStatus::TimingOut => "TIMING-OUT",
            RunStatus::Unknown => "UNKNOWN",
        };
        write!(f, "{}", s)
    }
}

/// The three provider operations the pipeline depends on
#[async_trait]
pub trait JobProvider: Send + Sync {
    /// Submit a run of `actor_id` with a provider-shaped `input`
    async fn start_run(&self, actor_id: &str, input: &Value) -> Result<RunHandle, SearchError>;

    /// Query the current status of a run once
    async fn get_status(&self, run: &RunHandle) -> Result<RunStatus, SearchError>;

    /// Fetch the dataset of a finished run
    async fn fetch_items(&self, run: &RunHandle) -> Result<Vec<RawRecord>, SearchError>;
}

#[derive(Debug, Deserialize)]
struct Envelope {
    data: RunData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunData {
    id: String,
    #[serde(default)]
    default_dataset_id: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

/// Main client for making requests to the provider API
pub struct ProviderClient {
    http_client: Client,
    base_url: String,
    api_token: String,
}

impl ProviderClient {
    /// Create a new provider client. Fails before any network activity when
    /// the access credential is missing.
    pub fn new(config: &ProviderConfig) -> Result<Self, SearchError> {
        let api_token = config
            .api_token
            .clone()
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| SearchError::Configuration("APIFY_API_TOKEN is not set".to_string()))?;

        debug!(base_url = %config.base_url, "Creating provider client");
        let http_client = Client::builder()
            .user_agent(concat!("travel-search/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token,
        })
    }

    fn actor_path(actor_id: &str) -> String {
        actor_id.replace('/', "~")
    }

    /// Turn a non-success response into `ProviderUnavailable`, keeping the
    /// status and body for diagnostics
    async fn check(response: reqwest::Response, operation: &str) -> Result<reqwest::Response, SearchError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        error!(status = %status, operation, body = %body, "Provider request failed");
        Err(SearchError::ProviderUnavailable {
            status: status.as_u16(),
            body,
        })
    }

    fn transport_error(e: reqwest::Error) -> SearchError {
        SearchError::ProviderUnavailable {
            status: e.status().map(|s| s.as_u16()).unwrap_or(0),
            body: e.to_string(),
        }
    }
}

#[async_trait]
impl JobProvider for ProviderClient {
    #[instrument(level = "info", skip(self, input))]
    async fn start_run(&self, actor_id: &str, input: &Value) -> Result<RunHandle, SearchError> {
        let url = format!("{}/acts/{}/runs", self.base_url, Self::actor_path(actor_id));
        info!(url = %url, "Starting provider run");

        let start_time = Instant::now();
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_token)
            .json(input)
            .send()
            .await
            .map_err(Self::transport_error)?;
        info!(
            status = %response.status(),
            duration_ms = start_time.elapsed().as_millis(),
            "Start-run request completed"
        );

        let envelope: Envelope = Self::check(response, "start_run")
            .await?
            .json()
            .await
            .map_err(Self::transport_error)?;
        let dataset_id = envelope.data.default_dataset_id.ok_or_else(|| SearchError::ProviderUnavailable {
            status: 0,
            body: format!("run {} has no dataset id", envelope.data.id),
        })?;

        info!(run_id = %envelope.data.id, dataset_id = %dataset_id, "Provider run started");
        Ok(RunHandle {
            run_id: envelope.data.id,
            dataset_id,
        })
    }

    #[instrument(level = "debug", skip(self, run), fields(run_id = %run.run_id))]
    async fn get_status(&self, run: &RunHandle) -> Result<RunStatus, SearchError> {
        let url = format!("{}/actor-runs/{}", self.base_url, run.run_id);
        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(Self::transport_error)?;

        let envelope: Envelope = Self::check(response, "get_status")
            .await?
            .json()
            .await
            .map_err(Self::transport_error)?;
        let raw = envelope.data.status.unwrap_or_default();
        let status = RunStatus::from_provider(&raw);
        if status == RunStatus::Unknown {
            warn!(raw_status = %raw, "Unrecognized run status");
        }
        debug!(status = %status, "Run status");
        Ok(status)
    }

    #[instrument(level = "info", skip(self, run), fields(dataset_id = %run.dataset_id))]
    async fn fetch_items(&self, run: &RunHandle) -> Result<Vec<RawRecord>, SearchError> {
        let url = format!("{}/datasets/{}/items", self.base_url, run.dataset_id);
        let start_time = Instant::now();
        let response = self
            .http_client
            .get(&url)
            .query(&[("clean", "true"), ("format", "json")])
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(Self::transport_error)?;

        let body: Value = Self::check(response, "fetch_items")
            .await?
            .json()
            .await
            .map_err(Self::transport_error)?;
        match body {
            Value::Array(items) => {
                info!(
                    items = items.len(),
                    duration_ms = start_time.elapsed().as_millis(),
                    "Fetched dataset items"
                );
                Ok(items)
            }
            other => Err(SearchError::ProviderUnavailable {
                status: 0,
                body: format!("dataset is not an array: {}", truncate(&other.to_string(), 200)),
            }),
        }
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
