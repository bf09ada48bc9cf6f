//! Process configuration
//!
//! Built once at startup from the environment and handed to the components
//! that need it. Nothing reads the environment after this point.

use crate::normalize::RatingScale;
use crate::poller::PollPolicy;
use crate::SearchError;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.apify.com/v2";
pub const DEFAULT_HOTEL_ACTOR: &str = "voyager/booking-scraper";
pub const DEFAULT_HOTEL_ALT_ACTOR: &str = "dtrungtin/booking-scraper";
pub const DEFAULT_FLIGHT_ACTOR: &str = "jupri/skyscanner-flight";

/// Connection settings for the job provider
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_token: Option<String>,
    pub base_url: String,
    pub request_timeout: Duration,
}

/// Per-source settings: which actors to run and how to read their output
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub actor_id: String,
    pub alternate_actor_id: Option<String>,
    pub poll: PollPolicy,
    /// Rating table for sources whose records carry a review score
    pub rating_scale: Option<RatingScale>,
    pub default_currency: String,
    /// Amount used when a record carries no parseable price
    pub default_price: f64,
    pub max_results: usize,
}

impl SourceConfig {
    pub fn new(actor_id: &str, poll: PollPolicy) -> Self {
        Self {
            actor_id: actor_id.to_string(),
            alternate_actor_id: None,
            poll,
            rating_scale: None,
            default_currency: "USD".to_string(),
            default_price: 0.0,
            max_results: 20,
        }
    }

    pub fn with_rating_scale(mut self, rating_scale: RatingScale) -> Self {
        self.rating_scale = Some(rating_scale);
        self
    }

    /// Clamp `rating` into the source's scale and label it. Sources without
    /// a table of their own use the ten-point one.
    pub fn rate(&self, rating: f64) -> (f64, String) {
        let ten_point;
        let scale = match &self.rating_scale {
            Some(scale) => scale,
            None => {
                ten_point = RatingScale::ten_point();
                &ten_point
            }
        };
        let rating = scale.clamp(rating);
        (rating, scale.text_for(rating))
    }

    /// Actor identities to try, primary first
    pub fn actors(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.actor_id.as_str()).chain(self.alternate_actor_id.as_deref())
    }
}

/// HTTP server settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub log_dir: String,
    /// Serve fallback results instead of a configuration error when the
    /// provider credential is missing
    pub fallback_without_credentials: bool,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub provider: ProviderConfig,
    pub hotels: SourceConfig,
    pub flights: SourceConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    /// Read the configuration from the process environment
    pub fn from_env() -> Result<Self, SearchError> {
        Self::from_vars(std::env::vars().collect())
    }

    /// Build the configuration from an explicit variable map
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, SearchError> {
        let env = Env(vars);

        let provider = ProviderConfig {
            api_token: env.get("APIFY_API_TOKEN"),
            base_url: env
                .get("APIFY_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            request_timeout: Duration::from_secs(env.parse("PROVIDER_REQUEST_TIMEOUT_SECS", 30u64)?),
        };

        let interval = Duration::from_secs(env.parse("POLL_INTERVAL_SECS", 10u64)?);
        let deadline = env
            .get("POLL_DEADLINE_SECS")
            .map(|raw| parse_value::<u64>("POLL_DEADLINE_SECS", &raw))
            .transpose()?
            .map(Duration::from_secs);
        let default_currency = env.get("DEFAULT_CURRENCY").unwrap_or_else(|| "USD".to_string());
        let default_price: f64 = env.parse("DEFAULT_PRICE", 0.0)?;
        let max_results: usize = env.parse("MAX_RESULTS", 20)?;

        let hotels = SourceConfig {
            actor_id: env.get("HOTEL_ACTOR_ID").unwrap_or_else(|| DEFAULT_HOTEL_ACTOR.to_string()),
            alternate_actor_id: env
                .get("HOTEL_ALT_ACTOR_ID")
                .or_else(|| Some(DEFAULT_HOTEL_ALT_ACTOR.to_string())),
            poll: PollPolicy {
                interval,
                max_attempts: env.parse("HOTEL_POLL_MAX_ATTEMPTS", 24u32)?,
                deadline,
            },
            rating_scale: Some(env.rating_scale("HOTEL_RATING_SCALE")?),
            default_currency: default_currency.clone(),
            default_price,
            max_results,
        };

        let flights = SourceConfig {
            actor_id: env.get("FLIGHT_ACTOR_ID").unwrap_or_else(|| DEFAULT_FLIGHT_ACTOR.to_string()),
            alternate_actor_id: env.get("FLIGHT_ALT_ACTOR_ID"),
            poll: PollPolicy {
                interval,
                max_attempts: env.parse("FLIGHT_POLL_MAX_ATTEMPTS", 15u32)?,
                deadline,
            },
            rating_scale: None,
            default_currency,
            default_price,
            max_results,
        };

        let server = ServerConfig {
            bind_addr: env.parse("BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 8080)))?,
            log_dir: env.get("LOG_DIR").unwrap_or_else(|| "logs".to_string()),
            fallback_without_credentials: env.flag("FALLBACK_WITHOUT_CREDENTIALS")?,
        };

        Ok(Self {
            provider,
            hotels,
            flights,
            server,
        })
    }
}

struct Env(HashMap<String, String>);

impl Env {
    /// Non-empty value of `key`
    fn get(&self, key: &str) -> Option<String> {
        self.0
            .get(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse<T: std::str::FromStr>(&self, key: &str, default: T) -> Result<T, SearchError> {
        match self.get(key) {
            Some(raw) => parse_value(key, &raw),
            None => Ok(default),
        }
    }

    fn rating_scale(&self, key: &str) -> Result<RatingScale, SearchError> {
        match self.get(key).map(|v| v.to_lowercase()).as_deref() {
            None | Some("ten-point") | Some("10") => Ok(RatingScale::ten_point()),
            Some("five-star") | Some("5") => Ok(RatingScale::five_star()),
            Some(other) => Err(SearchError::Configuration(format!(
                "{} must be ten-point or five-star, got '{}'",
                key, other
            ))),
        }
    }

    fn flag(&self, key: &str) -> Result<bool, SearchError> {
        match self.get(key).map(|v| v.to_lowercase()).as_deref() {
            None | Some("0") | Some("false") | Some("no") => Ok(false),
            Some("1") | Some("true") | Some("yes") => Ok(true),
            Some(other) => Err(SearchError::Configuration(format!(
                "{} must be true or false, got '{}'",
                key, other
            ))),
        }
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, SearchError> {
    raw.parse::<T>()
        .map_err(|_| SearchError::Configuration(format!("{} has an invalid value: '{}'", key, raw)))
}
