//! transport.rest API response DTOs.
//!
//! These types map directly to the HAFAS-backed `/journeys` and
//! `/locations` JSON responses. They use `Option` liberally because the
//! API omits or nulls fields whenever real-time data is missing, and for
//! cancelled legs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Response from `GET /journeys`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneysResponse {
    pub journeys: Vec<RawJourney>,

    /// Paging cursor for earlier journeys (unused).
    pub earlier_ref: Option<String>,

    /// Paging cursor for later journeys (unused).
    pub later_ref: Option<String>,
}

/// A journey: one possible way from origin to destination.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawJourney {
    pub legs: Vec<RawLeg>,

    pub refresh_token: Option<String>,
}

/// A leg of a journey, either a ride or a walk.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLeg {
    pub origin: RawStop,
    pub destination: RawStop,

    /// Real-time departure (planned + delay). Null when cancelled.
    pub departure: Option<DateTime<Utc>>,
    pub planned_departure: Option<DateTime<Utc>>,

    /// Real-time arrival (planned + delay). Null when cancelled.
    pub arrival: Option<DateTime<Utc>>,
    pub planned_arrival: Option<DateTime<Utc>>,

    /// Delays in seconds, when known.
    pub departure_delay: Option<i64>,
    pub arrival_delay: Option<i64>,

    pub departure_platform: Option<String>,
    pub planned_departure_platform: Option<String>,

    pub line: Option<RawLine>,

    /// Set on walking transfers, which have no line.
    pub walking: Option<bool>,

    pub cancelled: Option<bool>,

    #[serde(default)]
    pub remarks: Vec<RawRemark>,
}

impl RawLeg {
    pub fn is_walking(&self) -> bool {
        self.walking.unwrap_or(false)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.unwrap_or(false)
    }
}

/// A stop, station or bare location.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawStop {
    /// `"stop"`, `"station"` or `"location"`.
    #[serde(rename = "type")]
    pub kind: Option<String>,

    pub id: Option<String>,
    pub name: Option<String>,
    pub location: Option<RawLocation>,
}

/// Coordinates of a stop.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawLocation {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// The line a leg is ridden on.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawLine {
    /// Display name, e.g. `"IC 3500"` or `"Bus 22"`.
    pub name: Option<String>,

    /// HAFAS product, e.g. `"nationalExpress"`, `"regional"`, `"bus"`.
    pub product: Option<String>,

    /// Coarse mode, e.g. `"train"`, `"bus"`, `"watercraft"`.
    pub mode: Option<String>,
}

/// A remark attached to a leg.
///
/// Remarks of type `"warning"` describe disruptions; `"hint"` remarks are
/// informational (bicycle carriage, accessibility, ...).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawRemark {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub summary: Option<String>,
    pub text: Option<String>,
}

impl RawRemark {
    pub fn is_warning(&self) -> bool {
        self.kind.as_deref() == Some("warning")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_journeys_response() {
        let json = r#"{
            "earlierRef": "e1",
            "laterRef": "l1",
            "journeys": [{
                "refreshToken": "tok",
                "legs": [
                    {
                        "origin": {
                            "type": "stop",
                            "id": "8400058",
                            "name": "Amsterdam Centraal",
                            "location": { "type": "location", "latitude": 52.378706, "longitude": 4.900489 }
                        },
                        "destination": {
                            "type": "stop",
                            "id": "8400621",
                            "name": "Utrecht Centraal"
                        },
                        "departure": "2024-06-03T08:02:00+02:00",
                        "plannedDeparture": "2024-06-03T08:00:00+02:00",
                        "departureDelay": 120,
                        "arrival": null,
                        "plannedArrival": "2024-06-03T08:27:00+02:00",
                        "departurePlatform": "5b",
                        "line": { "type": "line", "name": "IC 3500", "product": "nationalExpress", "mode": "train" },
                        "remarks": [
                            { "type": "hint", "code": "FB", "text": "Bicycles allowed" },
                            { "type": "warning", "summary": "Signal failure", "text": "Delays expected" }
                        ]
                    },
                    {
                        "origin": { "type": "stop", "id": "8400621", "name": "Utrecht Centraal" },
                        "destination": { "type": "stop", "id": "8400621", "name": "Utrecht Centraal" },
                        "departure": "2024-06-03T08:27:00+02:00",
                        "arrival": "2024-06-03T08:30:00+02:00",
                        "walking": true,
                        "distance": 120
                    }
                ]
            }]
        }"#;

        let response: JourneysResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.journeys.len(), 1);

        let legs = &response.journeys[0].legs;
        assert_eq!(legs.len(), 2);

        let ride = &legs[0];
        assert_eq!(ride.origin.name.as_deref(), Some("Amsterdam Centraal"));
        assert_eq!(
            ride.planned_departure.map(|t| t.to_rfc3339()),
            Some("2024-06-03T06:00:00+00:00".to_string())
        );
        assert!(ride.arrival.is_none());
        assert_eq!(ride.departure_delay, Some(120));
        assert_eq!(ride.remarks.len(), 2);
        assert!(ride.remarks[1].is_warning());
        assert!(!ride.is_walking());
        assert!(!ride.is_cancelled());

        assert!(legs[1].is_walking());
        assert!(legs[1].line.is_none());
        assert!(legs[1].remarks.is_empty());
    }

    #[test]
    fn parse_locations_response() {
        let json = r#"[
            { "type": "stop", "id": "8400058", "name": "Amsterdam Centraal",
              "location": { "type": "location", "latitude": 52.378706, "longitude": 4.900489 } },
            { "type": "location", "address": "Damrak 1", "latitude": 52.37, "longitude": 4.89 }
        ]"#;

        let stops: Vec<RawStop> = serde_json::from_str(json).unwrap();
        assert_eq!(stops.len(), 2);
        assert_eq!(stops[0].kind.as_deref(), Some("stop"));
        assert_eq!(stops[0].id.as_deref(), Some("8400058"));
        assert!(stops[1].id.is_none());
    }
}
