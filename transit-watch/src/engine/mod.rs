//! Delay and reroute decision engine.
//!
//! Pure evaluation of already-fetched itineraries: how late is the primary,
//! are its transfers at risk, is one of the alternatives worth suggesting.
//! The [`Gatekeeper`] then decides which of those findings are announced.
//!
//! The engine never plans routes itself. It only re-ranks the handful of
//! itineraries the upstream API returned.

mod config;
mod connection;
mod delay;
mod gate;
mod reroute;

#[cfg(test)]
pub(crate) mod testing;

pub use config::EngineConfig;
pub use connection::{ConnectionRisk, ConnectionStatus, TransferRisk, evaluate_connections};
pub use delay::{DelayEvaluation, DelayStatus, evaluate_delay};
pub use gate::{
    ConditionKind, GateOutcome, GateState, Gatekeeper, InMemoryNotificationStore,
    NotificationKey, NotificationStore,
};
pub use reroute::{RerouteDecision, ScoredItinerary, rank_alternatives, select_reroute};

use crate::domain::Itinerary;

/// Everything the engine concluded about one route in one cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub delay: DelayEvaluation,
    pub risk: ConnectionRisk,
    pub reroute: RerouteDecision,
}

/// Run the delay, connection and reroute evaluators over a fetch result.
pub fn assess(primary: &Itinerary, alternatives: &[Itinerary], config: &EngineConfig) -> Assessment {
    let delay = evaluate_delay(primary);
    let risk = evaluate_connections(primary, config.min_connection());
    let reroute = select_reroute(primary, &delay, &risk, alternatives, config);

    Assessment {
        delay,
        risk,
        reroute,
    }
}
