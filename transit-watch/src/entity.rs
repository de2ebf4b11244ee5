//! Per-route entities published after every cycle.
//!
//! Each watched route exposes a sensor (punctuality plus a bag of
//! attributes) and a location entity (where the journey starts, and the
//! path it takes). Both are rebuilt from scratch every cycle.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{Itinerary, RouteConfig, RouteId, TransportMode, whole_minutes};
use crate::engine::{
    Assessment, ConnectionRisk, ConnectionStatus, ScoredItinerary, evaluate_delay,
};
use crate::poller::FetchedItineraries;

/// Sensor state when the last fetch failed.
pub const STATE_UNAVAILABLE: &str = "unavailable";

/// Sensor state when the primary itinerary is not late.
pub const STATE_ON_TIME: &str = "On Time";

/// One upcoming departure (primary or alternative).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepartureSummary {
    pub departure: DateTime<Utc>,
    pub arrival: DateTime<Utc>,
    pub delay: u32,
    pub platform: Option<String>,
    pub on_time: bool,
    pub vehicle_types: Vec<TransportMode>,
}

impl DepartureSummary {
    pub fn from_itinerary(itinerary: &Itinerary) -> Self {
        let delay = evaluate_delay(itinerary).delay_minutes;
        Self {
            departure: itinerary.projected_departure(),
            arrival: itinerary.projected_arrival(),
            delay,
            platform: itinerary.platform().map(str::to_owned),
            on_time: delay == 0,
            vehicle_types: itinerary.modes(),
        }
    }
}

/// One ride of the primary itinerary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegSummary {
    pub line: String,
    pub vehicle_type: TransportMode,
    pub origin: String,
    pub destination: String,
    pub departure: DateTime<Utc>,
    pub arrival: DateTime<Utc>,
    /// Arrival delay of this leg alone.
    pub delay: u32,
    pub platform: Option<String>,
    /// Slack for boarding this leg; `None` on the first leg.
    pub transfer_minutes: Option<i64>,
    pub missed_connection: bool,
    pub connection_at_risk: bool,
}

impl LegSummary {
    /// Summaries of every leg, with transfer slack attached to the leg
    /// being boarded.
    pub fn from_itinerary(itinerary: &Itinerary, risk: &ConnectionRisk) -> Vec<Self> {
        itinerary
            .legs()
            .iter()
            .enumerate()
            .map(|(i, leg)| {
                let transfer = risk.transfers.iter().find(|t| t.leg_index == i);
                let late_by = whole_minutes(leg.expected_arrival() - leg.scheduled_arrival());

                Self {
                    line: leg.line().to_string(),
                    vehicle_type: leg.mode(),
                    origin: leg.origin().name.clone(),
                    destination: leg.destination().name.clone(),
                    departure: leg.expected_departure(),
                    arrival: leg.expected_arrival(),
                    delay: u32::try_from(late_by.max(0)).unwrap_or(u32::MAX),
                    platform: leg.platform().map(str::to_owned),
                    transfer_minutes: transfer.map(|t| t.slack_minutes),
                    missed_connection: transfer.is_some_and(|t| t.missed),
                    connection_at_risk: transfer.is_some_and(|t| t.at_risk),
                }
            })
            .collect()
    }
}

/// A suggested alternative.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlternativeSummary {
    pub departure: DateTime<Utc>,
    pub arrival: DateTime<Utc>,
    pub delay: u32,
    pub description: Vec<String>,
}

impl AlternativeSummary {
    pub fn from_scored(scored: &ScoredItinerary) -> Self {
        Self {
            departure: scored.itinerary.projected_departure(),
            arrival: scored.projected_arrival(),
            delay: scored.delay.delay_minutes,
            description: scored.itinerary.describe(),
        }
    }
}

/// Sensor attributes. Empty (all defaults) while unavailable.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SensorAttributes {
    pub origin: String,
    pub destination: String,
    pub line_filter: Vec<String>,

    pub departure_time: Option<DateTime<Utc>>,
    pub arrival_time: Option<DateTime<Utc>>,
    pub delay: u32,
    pub delay_reason: Option<String>,
    pub platform: Option<String>,
    /// Comma-separated modes of the primary, e.g. `"train, bus"`.
    pub vehicle_type: String,
    /// `[latitude, longitude]` pairs along the primary itinerary.
    pub route_coordinates: Vec<[f64; 2]>,
    pub journey_description: Vec<String>,

    pub total_legs: usize,
    /// Projected door-to-door time of the primary.
    pub total_journey_minutes: i64,
    pub legs: Vec<LegSummary>,
    /// Disruption reasons reported on any leg, in leg order.
    pub warnings: Vec<String>,

    pub connection_status: Option<ConnectionStatus>,
    /// Tightest transfer of the primary, in minutes.
    pub min_transfer_minutes: Option<i64>,
    pub missed_connection: bool,
    pub reroute_recommended: bool,

    pub has_alternatives: bool,
    pub next_departures_count: usize,
    pub next_departures: Vec<DepartureSummary>,
    pub alternative_count: usize,
    pub best_alternative_arrival: Option<DateTime<Utc>>,
    pub alternatives: Vec<AlternativeSummary>,

    /// Why the route is unavailable, if it is.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The punctuality sensor of a route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorEntity {
    pub entity_id: String,
    pub name: String,
    pub state: String,
    pub icon: &'static str,
    pub attributes: SensorAttributes,
    pub last_updated: DateTime<Utc>,
}

/// Where the journey starts, plus the path it takes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationEntity {
    pub entity_id: String,
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub route_coordinates: Vec<[f64; 2]>,
    pub icon: &'static str,
    pub last_updated: DateTime<Utc>,
}

/// Both entities of one route after a cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteSnapshot {
    pub route: RouteId,
    pub sensor: SensorEntity,
    pub location: LocationEntity,
}

impl RouteSnapshot {
    /// Snapshot for a route with fresh data.
    pub fn available(
        route: &RouteConfig,
        fetched: &FetchedItineraries,
        assessment: &Assessment,
        now: DateTime<Utc>,
    ) -> Self {
        let primary = &fetched.primary;
        let modes = primary.modes();
        let icon = icon_for(&modes);
        let coordinates: Vec<[f64; 2]> = primary
            .coordinates()
            .iter()
            .map(|c| [c.latitude, c.longitude])
            .collect();

        let state = if assessment.delay.delay_minutes > 0 {
            format!("Delayed {} min", assessment.delay.delay_minutes)
        } else {
            STATE_ON_TIME.to_string()
        };

        let mut next_departures: Vec<DepartureSummary> =
            fetched.all().map(DepartureSummary::from_itinerary).collect();
        next_departures.sort_by_key(|d| d.departure);

        let alternatives: Vec<AlternativeSummary> = assessment
            .reroute
            .ranked
            .iter()
            .map(AlternativeSummary::from_scored)
            .collect();

        let mut warnings: Vec<String> = Vec::new();
        for reason in primary.legs().iter().filter_map(|leg| leg.disruption()) {
            if !warnings.iter().any(|w| w == reason) {
                warnings.push(reason.to_string());
            }
        }

        let attributes = SensorAttributes {
            origin: route.origin.to_string(),
            destination: route.destination.to_string(),
            line_filter: route.line_filter.iter().cloned().collect(),
            departure_time: Some(primary.projected_departure()),
            arrival_time: Some(primary.projected_arrival()),
            delay: assessment.delay.delay_minutes,
            delay_reason: assessment.delay.reason.clone(),
            platform: primary.platform().map(str::to_owned),
            vehicle_type: modes
                .iter()
                .map(TransportMode::as_str)
                .collect::<Vec<_>>()
                .join(", "),
            route_coordinates: coordinates.clone(),
            journey_description: primary.describe(),
            total_legs: primary.leg_count(),
            total_journey_minutes: whole_minutes(
                primary.projected_arrival() - primary.projected_departure(),
            ),
            legs: LegSummary::from_itinerary(primary, &assessment.risk),
            warnings,
            connection_status: Some(assessment.risk.status()),
            min_transfer_minutes: assessment.risk.slack_minutes,
            missed_connection: assessment.reroute.missed_connection,
            reroute_recommended: assessment.reroute.recommended,
            has_alternatives: !fetched.alternatives.is_empty(),
            next_departures_count: next_departures.len(),
            next_departures,
            alternative_count: alternatives.len(),
            best_alternative_arrival: alternatives.first().map(|a| a.arrival),
            alternatives,
            error: None,
        };

        let (latitude, longitude) = coordinates
            .first()
            .map_or((None, None), |[lat, lon]| (Some(*lat), Some(*lon)));

        Self {
            route: route.id(),
            sensor: SensorEntity {
                entity_id: sensor_entity_id(route),
                name: route.label(),
                state,
                icon,
                attributes,
                last_updated: now,
            },
            location: LocationEntity {
                entity_id: location_entity_id(route),
                name: route.label(),
                latitude,
                longitude,
                route_coordinates: coordinates,
                icon,
                last_updated: now,
            },
        }
    }

    /// Snapshot for a route whose fetch failed this cycle.
    pub fn unavailable(route: &RouteConfig, reason: impl Into<String>, now: DateTime<Utc>) -> Self {
        let attributes = SensorAttributes {
            origin: route.origin.to_string(),
            destination: route.destination.to_string(),
            line_filter: route.line_filter.iter().cloned().collect(),
            error: Some(reason.into()),
            ..SensorAttributes::default()
        };

        Self {
            route: route.id(),
            sensor: SensorEntity {
                entity_id: sensor_entity_id(route),
                name: route.label(),
                state: STATE_UNAVAILABLE.to_string(),
                icon: TransportMode::Train.icon(),
                attributes,
                last_updated: now,
            },
            location: LocationEntity {
                entity_id: location_entity_id(route),
                name: route.label(),
                latitude: None,
                longitude: None,
                route_coordinates: Vec::new(),
                icon: TransportMode::Train.icon(),
                last_updated: now,
            },
        }
    }

    pub fn is_available(&self) -> bool {
        self.sensor.state != STATE_UNAVAILABLE
    }
}

fn sensor_entity_id(route: &RouteConfig) -> String {
    format!("sensor.transit_{}", route.id())
}

fn location_entity_id(route: &RouteConfig) -> String {
    format!("device_tracker.transit_{}", route.id())
}

/// Icon for a set of modes: the first of bus, tram, metro, ferry that is
/// used, otherwise train.
pub fn icon_for(modes: &[TransportMode]) -> &'static str {
    [
        TransportMode::Bus,
        TransportMode::Tram,
        TransportMode::Metro,
        TransportMode::Ferry,
    ]
    .into_iter()
    .find(|mode| modes.contains(mode))
    .unwrap_or(TransportMode::Train)
    .icon()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Coordinate, Leg, Stop, StopId};
    use crate::engine::testing::{at, direct, itinerary, leg};
    use crate::engine::{EngineConfig, assess};

    fn route() -> RouteConfig {
        RouteConfig::new(
            StopId::parse("8400058").unwrap(),
            StopId::parse("8400621").unwrap(),
        )
    }

    fn fetched(primary: Itinerary, alternatives: Vec<Itinerary>) -> FetchedItineraries {
        FetchedItineraries {
            primary,
            alternatives,
        }
    }

    fn snapshot(fetched: &FetchedItineraries) -> RouteSnapshot {
        let assessment = assess(&fetched.primary, &fetched.alternatives, &EngineConfig::default());
        RouteSnapshot::available(&route(), fetched, &assessment, at("07:50"))
    }

    #[test]
    fn on_time_sensor() {
        let snap = snapshot(&fetched(direct("IC 1", "08:00", "08:30", None), vec![]));

        assert_eq!(snap.sensor.state, "On Time");
        assert_eq!(snap.sensor.entity_id, "sensor.transit_8400058_8400621");
        assert_eq!(snap.sensor.icon, "mdi:train");
        assert_eq!(snap.sensor.attributes.delay, 0);
        assert_eq!(snap.sensor.attributes.vehicle_type, "train");
        assert!(!snap.sensor.attributes.has_alternatives);
        assert_eq!(snap.sensor.attributes.next_departures_count, 1);
        assert_eq!(
            snap.sensor.attributes.connection_status,
            Some(ConnectionStatus::OnSchedule)
        );
        assert!(snap.is_available());
    }

    #[test]
    fn delayed_sensor_with_alternatives() {
        let primary = direct("IC 1", "08:00", "08:30", Some("08:42"));
        let alt = direct("IC 2", "08:05", "08:35", None);
        let snap = snapshot(&fetched(primary, vec![alt]));

        let attrs = &snap.sensor.attributes;
        assert_eq!(snap.sensor.state, "Delayed 12 min");
        assert_eq!(attrs.delay, 12);
        assert!(attrs.reroute_recommended);
        assert!(attrs.has_alternatives);
        assert_eq!(attrs.alternative_count, 1);
        assert_eq!(attrs.best_alternative_arrival, Some(at("08:35")));
        assert_eq!(attrs.alternatives[0].description, vec!["IC 2 (train): IC 2 from → IC 2 to"]);
        assert_eq!(attrs.next_departures_count, 2);
        assert_eq!(attrs.next_departures[0].departure, at("08:00"));
        assert!(!attrs.next_departures[0].on_time);

        assert_eq!(attrs.total_legs, 1);
        assert_eq!(attrs.total_journey_minutes, 42);
        assert_eq!(attrs.legs.len(), 1);
        assert_eq!(attrs.legs[0].delay, 12);
        assert_eq!(attrs.legs[0].arrival, at("08:42"));
        assert_eq!(attrs.legs[0].transfer_minutes, None);
        assert!(attrs.warnings.is_empty());
    }

    #[test]
    fn missed_transfer_lands_on_boarded_leg() {
        let primary = itinerary(vec![
            leg("IC 1", "08:00", "08:30")
                .with_projected_arrival(at("08:40"))
                .with_disruption("Signal failure"),
            leg("SPR 2", "08:35", "08:50").with_platform("4b"),
        ]);
        let snap = snapshot(&fetched(primary, vec![]));

        let attrs = &snap.sensor.attributes;
        assert_eq!(attrs.total_legs, 2);
        assert_eq!(attrs.total_journey_minutes, 50);
        assert_eq!(attrs.warnings, vec!["Signal failure"]);
        assert_eq!(attrs.connection_status, Some(ConnectionStatus::Missed));

        let first = &attrs.legs[0];
        assert_eq!(first.line, "IC 1");
        assert_eq!(first.origin, "IC 1 from");
        assert_eq!(first.destination, "IC 1 to");
        assert_eq!(first.delay, 10);
        assert_eq!(first.transfer_minutes, None);
        assert!(!first.missed_connection);

        let second = &attrs.legs[1];
        assert_eq!(second.vehicle_type, TransportMode::Train);
        assert_eq!(second.departure, at("08:35"));
        assert_eq!(second.delay, 0);
        assert_eq!(second.platform.as_deref(), Some("4b"));
        assert_eq!(second.transfer_minutes, Some(-5));
        assert!(second.missed_connection);
        assert!(!second.connection_at_risk);
    }

    #[test]
    fn tight_transfer_is_at_risk() {
        let primary = itinerary(vec![
            leg("IC 1", "08:00", "08:30"),
            leg("SPR 2", "08:31", "08:50"),
        ]);
        let snap = snapshot(&fetched(primary, vec![]));

        let second = &snap.sensor.attributes.legs[1];
        assert_eq!(second.transfer_minutes, Some(1));
        assert!(second.connection_at_risk);
        assert!(!second.missed_connection);
        assert_eq!(snap.sensor.attributes.total_journey_minutes, 50);
    }

    #[test]
    fn location_uses_first_coordinate() {
        let leg = Leg::new(
            TransportMode::Bus,
            "Bus 22",
            Stop::named("A").with_location(Coordinate::new(52.0, 4.0)),
            Stop::named("B").with_location(Coordinate::new(52.1, 4.1)),
            at("08:00"),
            at("08:20"),
        )
        .unwrap();
        let snap = snapshot(&fetched(Itinerary::new(vec![leg]).unwrap(), vec![]));

        assert_eq!(snap.location.latitude, Some(52.0));
        assert_eq!(snap.location.longitude, Some(4.0));
        assert_eq!(snap.location.route_coordinates, vec![[52.0, 4.0], [52.1, 4.1]]);
        assert_eq!(snap.sensor.icon, "mdi:bus");
        assert_eq!(snap.location.entity_id, "device_tracker.transit_8400058_8400621");
    }

    #[test]
    fn unavailable_sensor() {
        let snap = RouteSnapshot::unavailable(&route(), "upstream unavailable", at("07:50"));

        assert_eq!(snap.sensor.state, STATE_UNAVAILABLE);
        assert!(!snap.is_available());
        assert_eq!(
            snap.sensor.attributes.error.as_deref(),
            Some("upstream unavailable")
        );
        assert!(snap.location.latitude.is_none());
    }

    #[test]
    fn icon_priority() {
        use TransportMode::*;

        assert_eq!(icon_for(&[Train]), "mdi:train");
        assert_eq!(icon_for(&[Train, Bus]), "mdi:bus");
        assert_eq!(icon_for(&[Tram, Metro]), "mdi:tram");
        assert_eq!(icon_for(&[Metro]), "mdi:subway-variant");
        assert_eq!(icon_for(&[Ferry]), "mdi:ferry");
        assert_eq!(icon_for(&[]), "mdi:train");
    }

    #[test]
    fn serializes_to_json() {
        let snap = snapshot(&fetched(direct("IC 1", "08:00", "08:30", None), vec![]));
        let json = serde_json::to_value(&snap).unwrap();

        assert_eq!(json["sensor"]["state"], "On Time");
        assert_eq!(json["sensor"]["attributes"]["connection_status"], "on_schedule");
        assert_eq!(json["route"], "8400058_8400621");
        assert!(json["sensor"]["attributes"].get("error").is_none());
        assert_eq!(json["sensor"]["attributes"]["total_legs"], 1);
        assert_eq!(json["sensor"]["attributes"]["legs"][0]["line"], "IC 1");
    }
}
