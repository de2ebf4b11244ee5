//! Mock transport client for testing without API access.
//!
//! Loads sample `/journeys` responses from JSON files and serves them
//! as if they were live API responses.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::{Itinerary, Stop, StopId};

use super::convert::convert_journeys;
use super::error::TransportError;
use super::types::JourneysResponse;

/// Mock transport client that serves data from JSON files.
///
/// This is useful for development and testing without hitting the public
/// API.
#[derive(Clone)]
pub struct MockTransportClient {
    /// Pre-loaded responses, keyed by `{origin}_{destination}`.
    responses: Arc<RwLock<HashMap<String, JourneysResponse>>>,
}

impl MockTransportClient {
    /// Create a new mock client by loading JSON files from a directory.
    ///
    /// Expects files named `{origin}_{destination}.json`
    /// (e.g. `8400058_8400621.json`).
    pub fn new(data_dir: impl AsRef<Path>) -> Result<Self, TransportError> {
        let data_dir = data_dir.as_ref();
        let mut responses = HashMap::new();

        let entries = std::fs::read_dir(data_dir).map_err(|e| {
            TransportError::MockData(format!("failed to read {}: {e}", data_dir.display()))
        })?;

        for entry in entries {
            let entry = entry.map_err(|e| {
                TransportError::MockData(format!("failed to read directory entry: {e}"))
            })?;

            let path = entry.path();
            if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }

            let key = path
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| TransportError::MockData(format!("invalid filename: {path:?}")))?
                .to_string();

            let json = std::fs::read_to_string(&path)
                .map_err(|e| TransportError::MockData(format!("failed to read {path:?}: {e}")))?;

            let response: JourneysResponse = serde_json::from_str(&json)
                .map_err(|e| TransportError::MockData(format!("failed to parse {path:?}: {e}")))?;

            responses.insert(key, response);
        }

        if responses.is_empty() {
            return Err(TransportError::MockData(format!(
                "no journey files found in {}",
                data_dir.display()
            )));
        }

        Ok(Self {
            responses: Arc::new(RwLock::new(responses)),
        })
    }

    /// Get itineraries between two stops.
    ///
    /// Mimics [`TransportClient::get_itineraries`](super::TransportClient::get_itineraries).
    /// The departure hint is ignored; mock data is static.
    pub async fn get_itineraries(
        &self,
        origin: &StopId,
        destination: &StopId,
        _departure: Option<DateTime<Utc>>,
    ) -> Result<Vec<Itinerary>, TransportError> {
        let responses = self.responses.read().await;
        let key = format!("{origin}_{destination}");

        let response = responses
            .get(&key)
            .ok_or_else(|| TransportError::ApiError {
                status: 404,
                message: format!(
                    "no mock data for {key}. Available: {:?}",
                    responses.keys().collect::<Vec<_>>()
                ),
            })?;

        Ok(convert_journeys(response))
    }

    /// Search the stops appearing in the mock data by id or name.
    pub async fn search_locations(&self, text: &str) -> Result<Vec<Stop>, TransportError> {
        let needle = text.to_lowercase();
        let responses = self.responses.read().await;

        let mut found: Vec<Stop> = Vec::new();
        for itinerary in responses.values().flat_map(convert_journeys) {
            for leg in itinerary.legs() {
                for stop in [leg.origin(), leg.destination()] {
                    let matches = stop.id.as_deref() == Some(text)
                        || stop.name.to_lowercase().contains(&needle);
                    if matches && !found.iter().any(|s| s.name == stop.name) {
                        found.push(stop.clone());
                    }
                }
            }
        }

        Ok(found)
    }

    /// List the `{origin}_{destination}` pairs available in the mock data.
    pub async fn available_routes(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.responses.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}
