//! Service configuration.
//!
//! Loaded once at start-up from a JSON file. Every field except the route
//! list has a default, so a minimal file is just `{"routes": [...]}`.

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::{RouteConfig, RouteError, RouteId, StopId};
use crate::poller::StopLookup;
use crate::transport::{TransportConfig, TransportError};

/// Default polling interval in seconds.
const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

/// Default HTTP bind address.
const DEFAULT_BIND: &str = "127.0.0.1:3000";

/// Errors loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Route(#[from] RouteError),

    #[error("no routes configured")]
    NoRoutes,

    #[error("poll interval must be at least one second")]
    InvalidPollInterval,

    #[error("route {0} is configured more than once")]
    DuplicateRoute(RouteId),

    #[error("stop {0} not found upstream")]
    UnknownStop(StopId),

    #[error("stop lookup failed: {0}")]
    Lookup(#[source] TransportError),
}

/// Top-level configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub transport: TransportConfig,
    pub poll_interval_secs: u64,
    /// Address the HTTP API listens on
    pub bind: String,
    /// Base URL notifications are POSTed to; unset means log only
    pub webhook_url: Option<String>,
    pub routes: Vec<RouteConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            transport: TransportConfig::default(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            bind: DEFAULT_BIND.to_string(),
            webhook_url: None,
            routes: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Read, parse and validate a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::from_json(&text)?;
        info!(path = %path.display(), routes = config.routes.len(), "loaded configuration");
        Ok(config)
    }

    /// Parse and validate configuration text.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every route, and that route ids stay unique after reverse
    /// routes are expanded.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.routes.is_empty() {
            return Err(ConfigError::NoRoutes);
        }
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::InvalidPollInterval);
        }

        for route in &self.routes {
            route.validate()?;
        }

        let mut seen = HashSet::new();
        for route in self.materialized_routes() {
            let id = route.id();
            if !seen.insert(id.clone()) {
                return Err(ConfigError::DuplicateRoute(id));
            }
        }

        Ok(())
    }

    /// Routes with reverse directions expanded.
    pub fn materialized_routes(&self) -> Vec<RouteConfig> {
        self.routes.iter().flat_map(RouteConfig::materialize).collect()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

/// Confirm that every configured stop is known upstream.
///
/// A stop matches when a search result carries its id, or its name equals
/// the configured value ignoring case.
pub async fn verify_stops<L: StopLookup>(
    lookup: &L,
    routes: &[RouteConfig],
) -> Result<(), ConfigError> {
    let stops: BTreeSet<&StopId> = routes
        .iter()
        .flat_map(|r| [&r.origin, &r.destination])
        .collect();

    // Lookups run concurrently; the client bounds how many are in flight.
    let lookups: Vec<_> = stops
        .iter()
        .map(|stop| lookup.search_stops(stop.as_str()))
        .collect();
    let results = join_all(lookups).await;

    for (stop, result) in stops.into_iter().zip(results) {
        let found = result.map_err(ConfigError::Lookup)?;

        let known = found.iter().any(|s| {
            s.id.as_deref() == Some(stop.as_str()) || s.name.eq_ignore_ascii_case(stop.as_str())
        });
        if !known {
            return Err(ConfigError::UnknownStop(stop.clone()));
        }
        debug!(%stop, "stop verified");
    }

    Ok(())
}
