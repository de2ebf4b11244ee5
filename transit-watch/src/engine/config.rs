//! Thresholds for the decision engine.

use chrono::Duration;

/// Configuration parameters for delay, connection and reroute evaluation.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Transfers with less slack than this are "at risk" (minutes).
    pub min_connection_mins: i64,

    /// An alternative must arrive at least this much earlier than the
    /// primary to count as an improvement (minutes).
    pub improvement_margin_mins: i64,

    /// Reroutes are only recommended when the primary is delayed by more
    /// than this (minutes), unless a connection is missed.
    pub reroute_delay_threshold_mins: u32,

    /// Maximum number of ranked alternatives to keep.
    pub max_ranked: usize,

    /// Minimum time between two notifications for the same route and
    /// condition (minutes).
    pub cooldown_mins: i64,

    /// Maximum number of alternatives considered besides the primary.
    pub max_alternatives: usize,
}

impl EngineConfig {
    /// Create a new configuration with the given parameters.
    pub fn new(
        min_connection_mins: i64,
        improvement_margin_mins: i64,
        reroute_delay_threshold_mins: u32,
        max_ranked: usize,
        cooldown_mins: i64,
        max_alternatives: usize,
    ) -> Self {
        Self {
            min_connection_mins,
            improvement_margin_mins,
            reroute_delay_threshold_mins,
            max_ranked,
            cooldown_mins,
            max_alternatives,
        }
    }

    /// Returns the minimum comfortable connection time as a Duration.
    pub fn min_connection(&self) -> Duration {
        Duration::minutes(self.min_connection_mins)
    }

    /// Returns the improvement margin as a Duration.
    pub fn improvement_margin(&self) -> Duration {
        Duration::minutes(self.improvement_margin_mins)
    }

    /// Returns the notification cooldown as a Duration.
    pub fn cooldown(&self) -> Duration {
        Duration::minutes(self.cooldown_mins)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_connection_mins: 2,
            improvement_margin_mins: 5,
            reroute_delay_threshold_mins: 10,
            max_ranked: 3,
            cooldown_mins: 10,
            max_alternatives: 4,
        }
    }
}
