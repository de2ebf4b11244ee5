//! transport.rest HTTP client.
//!
//! Provides async methods for querying journeys and stop locations.
//! Handles rate limiting and conversion to domain types.

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{debug, instrument};

use crate::domain::{Itinerary, Stop, StopId};

use super::convert::{convert_journeys, convert_stop};
use super::error::TransportError;
use super::types::{JourneysResponse, RawStop};

/// Default base URL for the transport.rest API.
const DEFAULT_BASE_URL: &str = "https://v6.db.transport.rest";

/// Default maximum concurrent requests.
const DEFAULT_MAX_CONCURRENT: usize = 4;

/// Configuration for the transport client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Base URL for the API (defaults to the public DB instance)
    pub base_url: String,
    /// Number of journeys requested per query (primary + alternatives)
    pub results: u8,
    /// Maximum concurrent requests
    pub max_concurrent: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            results: 5,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            timeout_secs: 10,
        }
    }
}

impl TransportConfig {
    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the number of journeys requested per query.
    pub fn with_results(mut self, n: u8) -> Self {
        self.results = n;
        self
    }

    /// Set maximum concurrent requests.
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n;
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// transport.rest API client.
///
/// Uses a semaphore to limit concurrent requests and avoid rate limiting.
#[derive(Debug, Clone)]
pub struct TransportClient {
    http: reqwest::Client,
    base_url: String,
    results: u8,
    semaphore: Arc<Semaphore>,
}

impl TransportClient {
    /// Create a new client with the given configuration.
    pub fn new(config: TransportConfig) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("transit-watch/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            results: config.results,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
        })
    }

    /// Get itineraries between two stops, in the order the API ranks them.
    ///
    /// # Arguments
    ///
    /// * `origin` - Origin stop id
    /// * `destination` - Destination stop id
    /// * `departure` - Earliest departure; `None` means "now"
    #[instrument(skip_all, fields(%origin, %destination, ?departure))]
    pub async fn get_itineraries(
        &self,
        origin: &StopId,
        destination: &StopId,
        departure: Option<DateTime<Utc>>,
    ) -> Result<Vec<Itinerary>, TransportError> {
        let mut query: Vec<(&str, String)> = vec![
            ("from", origin.to_string()),
            ("to", destination.to_string()),
            ("results", self.results.to_string()),
            ("stopovers", "false".to_string()),
            ("remarks", "true".to_string()),
        ];
        if let Some(departure) = departure {
            query.push((
                "departure",
                departure.to_rfc3339_opts(SecondsFormat::Secs, true),
            ));
        }

        let body = self.get("journeys", &query).await?;

        let response: JourneysResponse =
            serde_json::from_str(&body).map_err(|e| TransportError::Json {
                message: e.to_string(),
                body: Some(body.chars().take(500).collect()),
            })?;

        let itineraries = convert_journeys(&response);
        debug!(
            journeys = response.journeys.len(),
            itineraries = itineraries.len(),
            "fetched itineraries"
        );

        Ok(itineraries)
    }

    /// Search stops and stations by name or id.
    #[instrument(skip(self))]
    pub async fn search_locations(&self, text: &str) -> Result<Vec<Stop>, TransportError> {
        let query = [
            ("query", text.to_string()),
            ("results", "5".to_string()),
            ("addresses", "false".to_string()),
            ("poi", "false".to_string()),
        ];

        let body = self.get("locations", &query).await?;

        let raw: Vec<RawStop> = serde_json::from_str(&body).map_err(|e| TransportError::Json {
            message: e.to_string(),
            body: Some(body.chars().take(500).collect()),
        })?;

        Ok(raw.iter().map(convert_stop).collect())
    }

    /// GET `{base_url}/{path}` and return the body of a successful response.
    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<String, TransportError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| TransportError::ApiError {
                status: 0,
                message: "Semaphore closed".to_string(),
            })?;

        let url = format!("{}/{}", self.base_url, path);
        debug!(?url, "requesting");

        let response = self.http.get(&url).query(query).send().await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(TransportError::RateLimited);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(response.text().await?)
    }
}
