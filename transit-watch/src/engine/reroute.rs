//! Reroute selection.
//!
//! Given the primary itinerary and the alternatives returned by the same
//! query, decide whether one of the alternatives is worth suggesting.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use crate::domain::Itinerary;

use super::EngineConfig;
use super::connection::{ConnectionRisk, evaluate_connections};
use super::delay::{DelayEvaluation, evaluate_delay};

/// An itinerary together with its evaluations.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredItinerary {
    pub itinerary: Itinerary,
    pub delay: DelayEvaluation,
    pub risk: ConnectionRisk,
}

impl ScoredItinerary {
    pub fn score(itinerary: Itinerary, config: &EngineConfig) -> Self {
        let delay = evaluate_delay(&itinerary);
        let risk = evaluate_connections(&itinerary, config.min_connection());
        Self {
            itinerary,
            delay,
            risk,
        }
    }

    pub fn projected_arrival(&self) -> DateTime<Utc> {
        self.itinerary.projected_arrival()
    }
}

/// Outcome of [`select_reroute`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RerouteDecision {
    /// A reroute should be suggested to the user.
    pub recommended: bool,
    /// The primary itinerary has a missed connection.
    pub missed_connection: bool,
    /// Best alternative, if any qualified.
    pub chosen: Option<ScoredItinerary>,
    /// Qualifying alternatives, best first.
    pub ranked: Vec<ScoredItinerary>,
}

/// Sort alternatives best-first.
///
/// Alternatives are ranked by:
/// 1. Projected arrival (earlier is better)
/// 2. Delay minutes (smaller is better)
/// 3. Number of legs (fewer is better)
///
/// The sort is stable, so ties keep the upstream order.
pub fn rank_alternatives(mut alternatives: Vec<ScoredItinerary>) -> Vec<ScoredItinerary> {
    alternatives.sort_by(|a, b| {
        // Primary: arrival time
        let arr_cmp = a.projected_arrival().cmp(&b.projected_arrival());
        if arr_cmp != Ordering::Equal {
            return arr_cmp;
        }

        // Secondary: less delay
        let delay_cmp = a.delay.delay_minutes.cmp(&b.delay.delay_minutes);
        if delay_cmp != Ordering::Equal {
            return delay_cmp;
        }

        // Tertiary: fewer legs
        a.itinerary.leg_count().cmp(&b.itinerary.leg_count())
    });

    alternatives
}

/// Decide whether to suggest an alternative to the primary itinerary.
///
/// An alternative qualifies when it arrives at least the improvement
/// margin earlier than the primary, or when the primary has a missed
/// connection and the alternative does not. A reroute is recommended only
/// if something qualifies and the primary is either delayed by more than
/// the reroute threshold or has a missed connection.
pub fn select_reroute(
    primary: &Itinerary,
    delay: &DelayEvaluation,
    risk: &ConnectionRisk,
    alternatives: &[Itinerary],
    config: &EngineConfig,
) -> RerouteDecision {
    let primary_arrival = primary.projected_arrival();
    let margin = config.improvement_margin();

    let candidates: Vec<ScoredItinerary> = alternatives
        .iter()
        .cloned()
        .map(|alt| ScoredItinerary::score(alt, config))
        .filter(|alt| {
            let earlier = alt.projected_arrival() + margin <= primary_arrival;
            let rescues = risk.missed && !alt.risk.missed;
            earlier || rescues
        })
        .collect();

    let mut ranked = rank_alternatives(candidates);
    ranked.truncate(config.max_ranked);

    let recommended = !ranked.is_empty()
        && (delay.delay_minutes > config.reroute_delay_threshold_mins || risk.missed);

    RerouteDecision {
        recommended,
        missed_connection: risk.missed,
        chosen: ranked.first().cloned(),
        ranked,
    }
}
