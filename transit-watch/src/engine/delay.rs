//! Delay evaluation for a single itinerary.

use serde::Serialize;

use crate::domain::{Itinerary, whole_minutes};

/// Overall punctuality of an itinerary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DelayStatus {
    OnTime,
    Delayed,
    Disrupted,
}

/// Result of [`evaluate_delay`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DelayEvaluation {
    pub status: DelayStatus,
    /// Arrival delay at the destination, never negative.
    pub delay_minutes: u32,
    /// Disruption reason, when the status is `Disrupted`.
    pub reason: Option<String>,
}

impl DelayEvaluation {
    pub fn is_delayed(&self) -> bool {
        self.delay_minutes > 0
    }
}

/// Evaluate how late an itinerary will arrive.
///
/// The delay is the projected arrival at the destination minus the
/// scheduled arrival, in whole minutes rounded down and clamped at zero
/// (running early is not a delay). A disruption on any leg wins over a
/// plain delay; the delay minutes are still reported in that case.
///
/// # Examples
///
/// ```
/// use transit_watch::domain::{Itinerary, Leg, Stop, TransportMode};
/// use transit_watch::engine::{DelayStatus, evaluate_delay};
/// use chrono::{DateTime, Duration, Utc};
///
/// let dep: DateTime<Utc> = "2024-06-03T08:00:00Z".parse().unwrap();
/// let leg = Leg::new(
///     TransportMode::Train,
///     "IC 3500",
///     Stop::named("Amsterdam Centraal"),
///     Stop::named("Utrecht Centraal"),
///     dep,
///     dep + Duration::minutes(27),
/// )
/// .unwrap()
/// .with_projected_arrival(dep + Duration::minutes(34));
///
/// let eval = evaluate_delay(&Itinerary::new(vec![leg]).unwrap());
/// assert_eq!(eval.status, DelayStatus::Delayed);
/// assert_eq!(eval.delay_minutes, 7);
/// ```
pub fn evaluate_delay(itinerary: &Itinerary) -> DelayEvaluation {
    let late_by = itinerary.projected_arrival() - itinerary.scheduled_arrival();
    let delay_minutes = u32::try_from(whole_minutes(late_by).max(0)).unwrap_or(u32::MAX);

    let reason = itinerary.disruption().map(str::to_owned);

    let status = if reason.is_some() {
        DelayStatus::Disrupted
    } else if delay_minutes > 0 {
        DelayStatus::Delayed
    } else {
        DelayStatus::OnTime
    };

    DelayEvaluation {
        status,
        delay_minutes,
        reason,
    }
}
