//! Notification text.

use serde::Serialize;

use crate::domain::{RouteConfig, format_hhmm};
use crate::engine::{Assessment, ConditionKind};
use crate::poller::FetchedItineraries;

/// A message for one notification target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub target: String,
    pub title: String,
    pub message: String,
}

/// Compose the title and body for a fired condition.
///
/// Times are shown as `HH:MM` in the route's time zone.
pub fn compose(
    kind: ConditionKind,
    route: &RouteConfig,
    fetched: &FetchedItineraries,
    assessment: &Assessment,
) -> (String, String) {
    let tz = route.schedule.timezone;
    let primary = &fetched.primary;
    let header = format!(
        "Route: {} → {}\nDeparture: {}",
        primary.first_leg().origin().name,
        primary.last_leg().destination().name,
        format_hhmm(primary.scheduled_departure(), tz),
    );

    let best = assessment.reroute.chosen.as_ref().map(|alt| {
        format!(
            "Alternative: {} departing {}, arriving {}",
            alt.itinerary.lines().collect::<Vec<_>>().join(" / "),
            format_hhmm(alt.itinerary.projected_departure(), tz),
            format_hhmm(alt.projected_arrival(), tz),
        )
    });

    match kind {
        ConditionKind::Delay => (
            "Transport Delay".to_string(),
            format!(
                "{header}\nDelay: {} minutes",
                assessment.delay.delay_minutes
            ),
        ),
        ConditionKind::Disruption => (
            "Transport Disruption".to_string(),
            format!(
                "{header}\nIssue: {}",
                assessment
                    .delay
                    .reason
                    .as_deref()
                    .unwrap_or("Unknown disruption")
            ),
        ),
        ConditionKind::Reroute => {
            let mut message = format!(
                "{header}\nDelay: {} minutes",
                assessment.delay.delay_minutes
            );
            if let Some(best) = best {
                message.push('\n');
                message.push_str(&best);
            }
            ("Reroute Suggested".to_string(), message)
        }
        ConditionKind::MissedConnection => {
            let stop = assessment
                .risk
                .transfers
                .iter()
                .find(|t| t.missed)
                .map_or("a transfer", |t| t.stop.as_str());
            let mut message = format!("{header}\nConnection at {stop} will be missed");
            if let Some(best) = best {
                message.push('\n');
                message.push_str(&best);
            }
            ("Missed Connection".to_string(), message)
        }
        ConditionKind::DepartureReminder => {
            let mut message = header;
            if let Some(platform) = primary.platform() {
                message.push_str(&format!("\nPlatform: {platform}"));
            }
            if assessment.delay.delay_minutes > 0 {
                message.push_str(&format!(
                    "\nDelay: {} minutes",
                    assessment.delay.delay_minutes
                ));
            }
            ("Departure Reminder".to_string(), message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StopId;
    use crate::engine::testing::{at, direct, itinerary, leg};
    use crate::engine::{EngineConfig, assess};

    fn route() -> RouteConfig {
        RouteConfig::new(StopId::parse("A").unwrap(), StopId::parse("B").unwrap())
    }

    fn compose_for(kind: ConditionKind, fetched: &FetchedItineraries) -> (String, String) {
        let assessment = assess(&fetched.primary, &fetched.alternatives, &EngineConfig::default());
        compose(kind, &route(), fetched, &assessment)
    }

    #[test]
    fn delay_message() {
        // 06:00 UTC is 08:00 in Amsterdam in June
        let fetched = FetchedItineraries {
            primary: direct("IC 1", "06:00", "06:30", Some("06:42")),
            alternatives: vec![],
        };

        let (title, message) = compose_for(ConditionKind::Delay, &fetched);

        assert_eq!(title, "Transport Delay");
        assert_eq!(
            message,
            "Route: IC 1 from → IC 1 to\nDeparture: 08:00\nDelay: 12 minutes"
        );
    }

    #[test]
    fn disruption_message() {
        let l = leg("IC 1", "06:00", "06:30").with_disruption("Signal failure");
        let fetched = FetchedItineraries {
            primary: itinerary(vec![l]),
            alternatives: vec![],
        };

        let (title, message) = compose_for(ConditionKind::Disruption, &fetched);

        assert_eq!(title, "Transport Disruption");
        assert!(message.ends_with("Issue: Signal failure"));
    }

    #[test]
    fn reroute_message_names_alternative() {
        let fetched = FetchedItineraries {
            primary: direct("IC 1", "06:00", "06:30", Some("06:42")),
            alternatives: vec![direct("IC 2", "06:05", "06:35", None)],
        };

        let (title, message) = compose_for(ConditionKind::Reroute, &fetched);

        assert_eq!(title, "Reroute Suggested");
        assert!(message.contains("Alternative: IC 2 departing 08:05, arriving 08:35"));
    }

    #[test]
    fn missed_connection_message() {
        let fetched = FetchedItineraries {
            primary: itinerary(vec![
                leg("IC 1", "06:00", "06:30").with_projected_arrival(at("06:40")),
                leg("SPR 2", "06:35", "06:50"),
            ]),
            alternatives: vec![],
        };

        let (title, message) = compose_for(ConditionKind::MissedConnection, &fetched);

        assert_eq!(title, "Missed Connection");
        assert!(message.contains("Connection at IC 1 to will be missed"));
        assert!(!message.contains("Alternative"));
    }

    #[test]
    fn reminder_message() {
        let l = leg("IC 1", "06:00", "06:30").with_platform("5b");
        let fetched = FetchedItineraries {
            primary: itinerary(vec![l]),
            alternatives: vec![],
        };

        let (title, message) = compose_for(ConditionKind::DepartureReminder, &fetched);

        assert_eq!(title, "Departure Reminder");
        assert!(message.ends_with("Platform: 5b"));
        assert!(!message.contains("Delay"));
    }
}
