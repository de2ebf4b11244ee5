//! Events emitted when a condition fires.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{RouteConfig, RouteId, TransportMode};
use crate::engine::{Assessment, ConditionKind};
use crate::entity::AlternativeSummary;
use crate::poller::FetchedItineraries;

/// Event names, one per condition kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    DelayDetected,
    DisruptionDetected,
    RerouteSuggested,
    MissedConnection,
    DepartureReminder,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::DelayDetected => "delay_detected",
            EventType::DisruptionDetected => "disruption_detected",
            EventType::RerouteSuggested => "reroute_suggested",
            EventType::MissedConnection => "missed_connection",
            EventType::DepartureReminder => "departure_reminder",
        }
    }
}

impl From<ConditionKind> for EventType {
    fn from(kind: ConditionKind) -> Self {
        match kind {
            ConditionKind::Delay => EventType::DelayDetected,
            ConditionKind::Disruption => EventType::DisruptionDetected,
            ConditionKind::Reroute => EventType::RerouteSuggested,
            ConditionKind::MissedConnection => EventType::MissedConnection,
            ConditionKind::DepartureReminder => EventType::DepartureReminder,
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event for automations to react to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitEvent {
    pub event_type: EventType,
    pub route: RouteId,
    pub origin: String,
    pub destination: String,
    pub delay_minutes: u32,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub minutes_until_departure: i64,
    pub platform: Option<String>,
    pub vehicle_types: Vec<TransportMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Where a missed connection happens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transfer_stop: Option<String>,
    /// Suggested alternatives (reroute and missed-connection events).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub alternatives: Vec<AlternativeSummary>,
    pub fired_at: DateTime<Utc>,
}

impl TransitEvent {
    /// Build the event for a fired condition.
    pub fn new(
        kind: ConditionKind,
        route: &RouteConfig,
        fetched: &FetchedItineraries,
        assessment: &Assessment,
        now: DateTime<Utc>,
    ) -> Self {
        let primary = &fetched.primary;

        let alternatives = match kind {
            ConditionKind::Reroute | ConditionKind::MissedConnection => assessment
                .reroute
                .ranked
                .iter()
                .map(AlternativeSummary::from_scored)
                .collect(),
            _ => Vec::new(),
        };

        let transfer_stop = match kind {
            ConditionKind::MissedConnection => assessment
                .risk
                .transfers
                .iter()
                .find(|t| t.missed)
                .map(|t| t.stop.clone()),
            _ => None,
        };

        Self {
            event_type: kind.into(),
            route: route.id(),
            origin: primary.first_leg().origin().name.clone(),
            destination: primary.last_leg().destination().name.clone(),
            delay_minutes: assessment.delay.delay_minutes,
            departure_time: primary.scheduled_departure(),
            arrival_time: primary.projected_arrival(),
            minutes_until_departure: (primary.scheduled_departure() - now).num_minutes(),
            platform: primary.platform().map(str::to_owned),
            vehicle_types: primary.modes(),
            reason: assessment.delay.reason.clone(),
            transfer_stop,
            alternatives,
            fired_at: now,
        }
    }
}
