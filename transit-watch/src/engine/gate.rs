//! Notification gatekeeping.
//!
//! Decides which conditions should actually be announced this cycle. A
//! condition is only announced inside the pre-departure window, on an
//! active day, and no more than once per cooldown period per route.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::domain::{Itinerary, RouteConfig, RouteId};

use super::Assessment;

/// The kinds of condition that can trigger a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionKind {
    Delay,
    Disruption,
    Reroute,
    MissedConnection,
    DepartureReminder,
}

impl ConditionKind {
    pub const ALL: [ConditionKind; 5] = [
        ConditionKind::Delay,
        ConditionKind::Disruption,
        ConditionKind::Reroute,
        ConditionKind::MissedConnection,
        ConditionKind::DepartureReminder,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionKind::Delay => "delay",
            ConditionKind::Disruption => "disruption",
            ConditionKind::Reroute => "reroute",
            ConditionKind::MissedConnection => "missed_connection",
            ConditionKind::DepartureReminder => "departure_reminder",
        }
    }
}

impl fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-condition state after gatekeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateState {
    /// Condition does not hold, is disabled, or the gate is closed.
    Idle,
    /// Condition holds and is announced now.
    Fired,
    /// Condition holds but was announced too recently.
    Cooling,
}

/// Cooldown key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NotificationKey {
    pub route: RouteId,
    pub kind: ConditionKind,
}

impl NotificationKey {
    pub fn new(route: RouteId, kind: ConditionKind) -> Self {
        Self { route, kind }
    }
}

/// Storage for the last time each condition was announced.
///
/// Entries are created on first fire and never removed.
pub trait NotificationStore: Send {
    fn last_fired(&self, key: &NotificationKey) -> Option<DateTime<Utc>>;
    fn record_fired(&mut self, key: NotificationKey, at: DateTime<Utc>);
}

/// Process-local store. Starts empty, so a restart may repeat one
/// notification per condition.
#[derive(Debug, Default, Clone)]
pub struct InMemoryNotificationStore {
    fired: HashMap<NotificationKey, DateTime<Utc>>,
}

impl InMemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.fired.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fired.is_empty()
    }
}

impl NotificationStore for InMemoryNotificationStore {
    fn last_fired(&self, key: &NotificationKey) -> Option<DateTime<Utc>> {
        self.fired.get(key).copied()
    }

    fn record_fired(&mut self, key: NotificationKey, at: DateTime<Utc>) {
        self.fired.insert(key, at);
    }
}

/// Result of [`Gatekeeper::evaluate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// Not an active day for this route (weekday, holiday or excluded date).
    Inactive,
    /// Departure is not within `[0, notify_before]` from now.
    WindowClosed { minutes_until: i64 },
    /// Window open; the state of every condition kind.
    Open {
        states: Vec<(ConditionKind, GateState)>,
    },
}

impl GateOutcome {
    /// Condition kinds announced this cycle.
    pub fn fired(&self) -> Vec<ConditionKind> {
        match self {
            GateOutcome::Open { states } => states
                .iter()
                .filter(|(_, state)| *state == GateState::Fired)
                .map(|(kind, _)| *kind)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// State of one condition kind (always `Idle` when the gate is closed).
    pub fn state(&self, kind: ConditionKind) -> GateState {
        match self {
            GateOutcome::Open { states } => states
                .iter()
                .find(|(k, _)| *k == kind)
                .map_or(GateState::Idle, |(_, state)| *state),
            _ => GateState::Idle,
        }
    }
}

/// Applies the day, window and cooldown rules on top of a notification store.
#[derive(Debug)]
pub struct Gatekeeper<S> {
    store: S,
    cooldown: Duration,
}

impl<S: NotificationStore> Gatekeeper<S> {
    pub fn new(store: S, cooldown: Duration) -> Self {
        Self { store, cooldown }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Gate the conditions of one route for this cycle.
    ///
    /// Every kind that holds, is enabled and is out of cooldown is
    /// recorded as fired at `now`.
    pub fn evaluate(
        &mut self,
        route: &RouteConfig,
        primary: &Itinerary,
        assessment: &Assessment,
        now: DateTime<Utc>,
    ) -> GateOutcome {
        let departure = primary.scheduled_departure();
        if !route.schedule.is_active(departure) {
            return GateOutcome::Inactive;
        }

        let until = departure - now;
        let lead = Duration::minutes(i64::from(route.notifications.notify_before_minutes));
        if until < Duration::zero() || until > lead {
            return GateOutcome::WindowClosed {
                minutes_until: until.num_minutes(),
            };
        }

        let id = route.id();
        let states = ConditionKind::ALL
            .into_iter()
            .map(|kind| {
                if !holds(kind, route, assessment) {
                    return (kind, GateState::Idle);
                }

                let key = NotificationKey::new(id.clone(), kind);
                let cooling = self
                    .store
                    .last_fired(&key)
                    .is_some_and(|last| now - last < self.cooldown);

                if cooling {
                    (kind, GateState::Cooling)
                } else {
                    self.store.record_fired(key, now);
                    (kind, GateState::Fired)
                }
            })
            .collect();

        GateOutcome::Open { states }
    }
}

/// Whether a condition is enabled and currently true.
fn holds(kind: ConditionKind, route: &RouteConfig, assessment: &Assessment) -> bool {
    let settings = &route.notifications;
    match kind {
        ConditionKind::Delay => {
            settings.on_delay && assessment.delay.delay_minutes >= settings.min_delay_minutes
        }
        ConditionKind::Disruption => settings.on_disruption && assessment.delay.reason.is_some(),
        ConditionKind::Reroute => settings.on_reroute && assessment.reroute.recommended,
        ConditionKind::MissedConnection => {
            settings.on_missed_connection && assessment.risk.missed
        }
        ConditionKind::DepartureReminder => settings.departure_reminder,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StopId;
    use crate::engine::testing::{at, direct};
    use crate::engine::{EngineConfig, assess};

    fn route() -> RouteConfig {
        RouteConfig::new(StopId::parse("A").unwrap(), StopId::parse("B").unwrap())
    }

    fn gatekeeper() -> Gatekeeper<InMemoryNotificationStore> {
        Gatekeeper::new(InMemoryNotificationStore::new(), Duration::minutes(10))
    }

    /// Departs 08:30, 12 minutes late on arrival.
    fn delayed() -> (Itinerary, Assessment) {
        let primary = direct("IC 1", "08:30", "09:00", Some("09:12"));
        let assessment = assess(&primary, &[], &EngineConfig::default());
        (primary, assessment)
    }

    #[test]
    fn cooldown_suppresses_repeat() {
        let mut gate = gatekeeper();
        let route = route();
        let (primary, assessment) = delayed();

        let first = gate.evaluate(&route, &primary, &assessment, at("08:00"));
        assert_eq!(first.state(ConditionKind::Delay), GateState::Fired);

        let second = gate.evaluate(&route, &primary, &assessment, at("08:05"));
        assert_eq!(second.state(ConditionKind::Delay), GateState::Cooling);

        let third = gate.evaluate(&route, &primary, &assessment, at("08:11"));
        assert_eq!(third.state(ConditionKind::Delay), GateState::Fired);
    }

    #[test]
    fn cooldown_boundary_allows_fire() {
        let mut gate = gatekeeper();
        let route = route();
        let (primary, assessment) = delayed();

        gate.evaluate(&route, &primary, &assessment, at("08:00"));
        let again = gate.evaluate(&route, &primary, &assessment, at("08:10"));

        assert_eq!(again.state(ConditionKind::Delay), GateState::Fired);
    }

    #[test]
    fn outside_window_emits_nothing() {
        let mut gate = gatekeeper();
        let route = route();
        let (primary, assessment) = delayed();

        // 45 minutes before departure with a 30 minute window
        let outcome = gate.evaluate(&route, &primary, &assessment, at("07:45"));

        assert_eq!(outcome, GateOutcome::WindowClosed { minutes_until: 45 });
        assert!(outcome.fired().is_empty());
        assert!(gate.store().is_empty());
    }

    #[test]
    fn after_departure_emits_nothing() {
        let mut gate = gatekeeper();
        let route = route();
        let (primary, assessment) = delayed();

        let outcome = gate.evaluate(&route, &primary, &assessment, at("08:31"));

        assert!(matches!(outcome, GateOutcome::WindowClosed { .. }));
        assert_eq!(outcome.state(ConditionKind::DepartureReminder), GateState::Idle);
    }

    #[test]
    fn window_edges_are_inclusive() {
        let route = route();
        let (primary, assessment) = delayed();

        let mut gate = gatekeeper();
        let at_lead = gate.evaluate(&route, &primary, &assessment, at("08:00"));
        assert!(matches!(at_lead, GateOutcome::Open { .. }));

        let mut gate = gatekeeper();
        let at_departure = gate.evaluate(&route, &primary, &assessment, at("08:30"));
        assert!(matches!(at_departure, GateOutcome::Open { .. }));
    }

    /// A direct itinerary departing at `dep` on any day.
    fn departing(dep: &str) -> (Itinerary, Assessment, DateTime<Utc>) {
        let dep: DateTime<Utc> = dep.parse().unwrap();
        let leg = crate::domain::Leg::new(
            crate::domain::TransportMode::Train,
            "IC 1",
            crate::domain::Stop::named("A"),
            crate::domain::Stop::named("B"),
            dep,
            dep + Duration::minutes(30),
        )
        .unwrap();
        let primary = Itinerary::new(vec![leg]).unwrap();
        let assessment = assess(&primary, &[], &EngineConfig::default());
        (primary, assessment, dep)
    }

    #[test]
    fn inactive_day_emits_nothing() {
        let mut gate = gatekeeper();
        // Saturday
        let (primary, assessment, dep) = departing("2024-06-08T08:30:00Z");

        let outcome = gate.evaluate(&route(), &primary, &assessment, dep - Duration::minutes(10));

        assert_eq!(outcome, GateOutcome::Inactive);
        assert!(gate.store().is_empty());
    }

    #[test]
    fn day_of_departure_decides() {
        // Friday 23:50 in Amsterdam, train at 00:10 on Saturday
        let (primary, assessment, dep) = departing("2024-06-07T22:10:00Z");
        let outcome =
            gatekeeper().evaluate(&route(), &primary, &assessment, dep - Duration::minutes(20));
        assert_eq!(outcome, GateOutcome::Inactive);

        // Sunday 23:50 in Amsterdam, train at 00:10 on Monday
        let (primary, assessment, dep) = departing("2024-06-09T22:10:00Z");
        let outcome =
            gatekeeper().evaluate(&route(), &primary, &assessment, dep - Duration::minutes(20));
        assert_eq!(outcome.state(ConditionKind::DepartureReminder), GateState::Fired);
    }

    #[test]
    fn holiday_emits_nothing() {
        let mut gate = gatekeeper();
        // Whit Monday
        let (primary, assessment, dep) = departing("2024-05-20T08:30:00Z");

        let outcome = gate.evaluate(&route(), &primary, &assessment, dep - Duration::minutes(10));
        assert_eq!(outcome, GateOutcome::Inactive);

        let mut route = route();
        route.schedule.exclude_holidays = false;
        let outcome = gate.evaluate(&route, &primary, &assessment, dep - Duration::minutes(10));
        assert_eq!(outcome.state(ConditionKind::DepartureReminder), GateState::Fired);
    }

    #[test]
    fn thresholds_and_flags() {
        let mut route = route();
        route.notifications.min_delay_minutes = 15;
        route.notifications.departure_reminder = false;
        let (primary, assessment) = delayed();

        let outcome = gatekeeper().evaluate(&route, &primary, &assessment, at("08:10"));

        assert_eq!(outcome.state(ConditionKind::Delay), GateState::Idle);
        assert_eq!(outcome.state(ConditionKind::DepartureReminder), GateState::Idle);
        assert!(outcome.fired().is_empty());
    }

    #[test]
    fn kinds_cool_down_independently() {
        let mut gate = gatekeeper();
        let route = route();
        let (primary, assessment) = delayed();

        gate.evaluate(&route, &primary, &assessment, at("08:00"));
        assert_eq!(gate.store().len(), 2);

        let disrupted = direct("IC 1", "08:30", "09:00", Some("09:12"));
        let leg = disrupted.legs()[0].clone().with_disruption("Signal failure");
        let disrupted = Itinerary::new(vec![leg]).unwrap();
        let disrupted_assessment = assess(&disrupted, &[], &EngineConfig::default());

        let outcome = gate.evaluate(&route, &disrupted, &disrupted_assessment, at("08:02"));

        assert_eq!(outcome.state(ConditionKind::Disruption), GateState::Fired);
        assert_eq!(outcome.state(ConditionKind::Delay), GateState::Cooling);
        assert_eq!(outcome.fired(), vec![ConditionKind::Disruption]);
    }

    #[test]
    fn routes_cool_down_independently() {
        let mut gate = gatekeeper();
        let first = route();
        let second = RouteConfig::new(StopId::parse("B").unwrap(), StopId::parse("A").unwrap());
        let (primary, assessment) = delayed();

        gate.evaluate(&first, &primary, &assessment, at("08:00"));
        let outcome = gate.evaluate(&second, &primary, &assessment, at("08:01"));

        assert_eq!(outcome.state(ConditionKind::Delay), GateState::Fired);
    }
}
