//! Connection risk at transfers.
//!
//! Compares each leg's projected arrival against the next leg's projected
//! departure. This is a best-effort heuristic: the next leg's departure is
//! taken from the feed as-is, and nothing here knows whether the second
//! vehicle will actually wait for the first. A connection that looks fine
//! may still be lost, and one that looks missed may be held.

use chrono::Duration;
use serde::Serialize;

use crate::domain::{Itinerary, whole_minutes};

/// Slack at one transfer point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferRisk {
    /// Index of the leg being boarded (1-based position in the itinerary's legs).
    pub leg_index: usize,
    /// Stop where the change happens.
    pub stop: String,
    /// Time between arriving and the next departure, rounded down.
    pub slack_minutes: i64,
    pub missed: bool,
    pub at_risk: bool,
}

/// Summary used in sensor attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    OnSchedule,
    AtRisk,
    Missed,
}

/// Result of [`evaluate_connections`], reduced to the worst transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionRisk {
    pub missed: bool,
    pub at_risk: bool,
    /// Smallest slack over all transfers; `None` for direct itineraries.
    pub slack_minutes: Option<i64>,
    pub transfers: Vec<TransferRisk>,
}

impl ConnectionRisk {
    pub fn status(&self) -> ConnectionStatus {
        if self.missed {
            ConnectionStatus::Missed
        } else if self.at_risk {
            ConnectionStatus::AtRisk
        } else {
            ConnectionStatus::OnSchedule
        }
    }
}

/// Evaluate every transfer of an itinerary.
///
/// Slack is `next.projected_departure - previous.projected_arrival`, with
/// projected times falling back to scheduled ones. A transfer is missed
/// when the slack is negative and at risk when it is below `min_connection`.
pub fn evaluate_connections(itinerary: &Itinerary, min_connection: Duration) -> ConnectionRisk {
    let min_minutes = whole_minutes(min_connection);

    let transfers: Vec<TransferRisk> = itinerary
        .legs()
        .windows(2)
        .enumerate()
        .map(|(i, pair)| {
            let slack = whole_minutes(pair[1].expected_departure() - pair[0].expected_arrival());
            let missed = slack < 0;
            TransferRisk {
                leg_index: i + 1,
                stop: pair[0].destination().name.clone(),
                slack_minutes: slack,
                missed,
                at_risk: !missed && slack < min_minutes,
            }
        })
        .collect();

    let worst = transfers.iter().min_by_key(|t| t.slack_minutes);

    ConnectionRisk {
        missed: worst.is_some_and(|t| t.missed),
        at_risk: worst.is_some_and(|t| t.at_risk),
        slack_minutes: worst.map(|t| t.slack_minutes),
        transfers,
    }
}
