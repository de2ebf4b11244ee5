//! Itinerary builders shared by engine tests.

use chrono::{DateTime, Utc};

use crate::domain::{Itinerary, Leg, Stop, TransportMode};

/// `"08:30"` on a fixed Monday (2024-06-03), in UTC.
pub(crate) fn at(hhmm: &str) -> DateTime<Utc> {
    format!("2024-06-03T{hhmm}:00Z").parse().unwrap()
}

/// A train leg with scheduled times only.
pub(crate) fn leg(line: &str, dep: &str, arr: &str) -> Leg {
    Leg::new(
        TransportMode::Train,
        line,
        Stop::named(format!("{line} from")),
        Stop::named(format!("{line} to")),
        at(dep),
        at(arr),
    )
    .unwrap()
}

/// A single-leg itinerary with an optional projected arrival.
pub(crate) fn direct(line: &str, dep: &str, arr: &str, projected_arr: Option<&str>) -> Itinerary {
    let mut leg = leg(line, dep, arr);
    if let Some(p) = projected_arr {
        leg = leg.with_projected_arrival(at(p));
    }
    Itinerary::new(vec![leg]).unwrap()
}

/// An itinerary from the given legs.
pub(crate) fn itinerary(legs: Vec<Leg>) -> Itinerary {
    Itinerary::new(legs).unwrap()
}
