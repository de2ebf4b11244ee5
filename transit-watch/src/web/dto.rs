//! Response types for the HTTP API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::alerts::TransitEvent;
use crate::entity::RouteSnapshot;

/// Error body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// One line of the route list.
#[derive(Debug, Serialize, Deserialize)]
pub struct RouteSummary {
    pub id: String,
    pub entity_id: String,
    pub name: String,
    pub state: String,
    pub last_updated: DateTime<Utc>,
}

impl From<&RouteSnapshot> for RouteSummary {
    fn from(snapshot: &RouteSnapshot) -> Self {
        Self {
            id: snapshot.route.to_string(),
            entity_id: snapshot.sensor.entity_id.clone(),
            name: snapshot.sensor.name.clone(),
            state: snapshot.sensor.state.clone(),
            last_updated: snapshot.sensor.last_updated,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RoutesResponse {
    pub routes: Vec<RouteSummary>,
}

/// Query for the event list.
#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct EventsResponse {
    pub events: Vec<TransitEvent>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub status: String,
}
