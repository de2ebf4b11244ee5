//! The polling loop.
//!
//! Each cycle walks every route in order: fetch, assess, gate, emit, and
//! finally publish a fresh [`RouteSnapshot`]. A failing route only marks
//! its own snapshot unavailable.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Notify, RwLock};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::{ItinerarySource, fetch_itineraries};
use crate::alerts::{EventSink, NotificationSink, TransitEvent, compose, notify_all};
use crate::domain::{RouteConfig, RouteId};
use crate::engine::{
    EngineConfig, GateOutcome, Gatekeeper, InMemoryNotificationStore, NotificationStore, assess,
};
use crate::entity::RouteSnapshot;

/// Latest snapshot per route, shared with the web layer.
pub type SnapshotStore = Arc<RwLock<BTreeMap<RouteId, RouteSnapshot>>>;

/// What one cycle did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub routes: usize,
    pub unavailable: usize,
    pub events: usize,
    pub notifications: usize,
}

/// Drives the engine over all configured routes.
pub struct Poller<S, N, E, St = InMemoryNotificationStore> {
    routes: Vec<RouteConfig>,
    source: S,
    notifier: N,
    events: E,
    gate: Gatekeeper<St>,
    config: EngineConfig,
    snapshots: SnapshotStore,
}

impl<S, N, E> Poller<S, N, E, InMemoryNotificationStore>
where
    S: ItinerarySource,
    N: NotificationSink,
    E: EventSink,
{
    /// Create a poller with an in-memory notification store.
    ///
    /// Reverse routes are expanded here, so `routes` is the configured list.
    pub fn new(
        routes: &[RouteConfig],
        source: S,
        notifier: N,
        events: E,
        config: EngineConfig,
    ) -> Self {
        let routes = routes.iter().flat_map(RouteConfig::materialize).collect();
        let gate = Gatekeeper::new(InMemoryNotificationStore::new(), config.cooldown());

        Self {
            routes,
            source,
            notifier,
            events,
            gate,
            config,
            snapshots: SnapshotStore::default(),
        }
    }
}

impl<S, N, E, St> Poller<S, N, E, St>
where
    S: ItinerarySource,
    N: NotificationSink,
    E: EventSink,
    St: NotificationStore,
{
    /// Swap the notification store.
    pub fn with_store<T: NotificationStore>(self, store: T) -> Poller<S, N, E, T> {
        Poller {
            routes: self.routes,
            source: self.source,
            notifier: self.notifier,
            events: self.events,
            gate: Gatekeeper::new(store, self.config.cooldown()),
            config: self.config,
            snapshots: self.snapshots,
        }
    }

    /// Publish snapshots into an existing store instead of a private one.
    pub fn with_snapshots(mut self, snapshots: SnapshotStore) -> Self {
        self.snapshots = snapshots;
        self
    }

    pub fn snapshots(&self) -> SnapshotStore {
        self.snapshots.clone()
    }

    /// Materialized routes, in polling order.
    pub fn routes(&self) -> &[RouteConfig] {
        &self.routes
    }

    pub fn notification_store(&self) -> &St {
        self.gate.store()
    }

    /// Run one polling cycle at `now`.
    pub async fn run_cycle(&mut self, now: DateTime<Utc>) -> CycleReport {
        let mut report = CycleReport {
            routes: self.routes.len(),
            ..CycleReport::default()
        };

        for route in &self.routes {
            let id = route.id();

            let fetched = match fetch_itineraries(
                &self.source,
                route,
                now,
                self.config.max_alternatives,
            )
            .await
            {
                Ok(fetched) => fetched,
                Err(e) => {
                    warn!(route = %id, error = %e, "route unavailable");
                    report.unavailable += 1;
                    let snapshot = RouteSnapshot::unavailable(route, e.to_string(), now);
                    self.snapshots.write().await.insert(id, snapshot);
                    continue;
                }
            };

            let assessment = assess(&fetched.primary, &fetched.alternatives, &self.config);
            debug!(
                route = %id,
                delay = assessment.delay.delay_minutes,
                connection = ?assessment.risk.status(),
                reroute = assessment.reroute.recommended,
                "assessed"
            );

            let outcome = self.gate.evaluate(route, &fetched.primary, &assessment, now);
            match &outcome {
                GateOutcome::Inactive => debug!(route = %id, "not active today"),
                GateOutcome::WindowClosed { minutes_until } => {
                    debug!(route = %id, minutes_until, "outside notification window")
                }
                GateOutcome::Open { .. } => {}
            }

            for kind in outcome.fired() {
                let event = TransitEvent::new(kind, route, &fetched, &assessment, now);
                self.events.emit(event).await;
                report.events += 1;

                let (title, message) = compose(kind, route, &fetched, &assessment);
                report.notifications += notify_all(
                    &self.notifier,
                    &route.notifications.targets,
                    &title,
                    &message,
                )
                .await;
            }

            let snapshot = RouteSnapshot::available(route, &fetched, &assessment, now);
            self.snapshots.write().await.insert(id, snapshot);
        }

        report
    }

    /// Poll every `period` until Ctrl-C.
    ///
    /// `refresh` wakes the loop for an extra cycle. Cycles never overlap.
    pub async fn run(mut self, period: Duration, refresh: Arc<Notify>) {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = refresh.notified() => debug!("refresh requested"),
                _ = tokio::signal::ctrl_c() => {
                    info!("stopping poller");
                    break;
                }
            }

            let report = self.run_cycle(Utc::now()).await;
            info!(
                routes = report.routes,
                unavailable = report.unavailable,
                events = report.events,
                notifications = report.notifications,
                "cycle complete"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::alerts::{EventLog, EventType, Notification, NotifyError};
    use crate::domain::{Itinerary, StopId};
    use crate::engine::testing::{at, direct};
    use crate::poller::ItineraryQuery;
    use crate::transport::TransportError;

    /// Returns the same candidates every time, or fails.
    struct FixedSource {
        itineraries: Mutex<Option<Vec<Itinerary>>>,
    }

    impl FixedSource {
        fn new(itineraries: Vec<Itinerary>) -> Self {
            Self {
                itineraries: Mutex::new(Some(itineraries)),
            }
        }

        fn failing() -> Self {
            Self {
                itineraries: Mutex::new(None),
            }
        }
    }

    impl ItinerarySource for FixedSource {
        async fn fetch(&self, _query: &ItineraryQuery) -> Result<Vec<Itinerary>, TransportError> {
            self.itineraries
                .lock()
                .unwrap()
                .clone()
                .ok_or(TransportError::RateLimited)
        }
    }

    /// Fails for one origin, answers every other query.
    struct FailingOrigin {
        origin: StopId,
        itineraries: Vec<Itinerary>,
    }

    impl ItinerarySource for FailingOrigin {
        async fn fetch(&self, query: &ItineraryQuery) -> Result<Vec<Itinerary>, TransportError> {
            if query.origin == self.origin {
                Err(TransportError::ApiError {
                    status: 503,
                    message: "unavailable".into(),
                })
            } else {
                Ok(self.itineraries.clone())
            }
        }
    }

    #[derive(Default, Clone)]
    struct RecordingSink {
        sent: Arc<Mutex<Vec<Notification>>>,
    }

    impl NotificationSink for RecordingSink {
        async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
            self.sent.lock().unwrap().push(notification.clone());
            Ok(())
        }
    }

    fn route() -> RouteConfig {
        let mut route =
            RouteConfig::new(StopId::parse("A").unwrap(), StopId::parse("B").unwrap());
        route.notifications.targets = vec!["phone".into(), "tablet".into()];
        route
    }

    fn delayed() -> Vec<Itinerary> {
        vec![
            direct("IC 1", "08:00", "08:30", Some("08:42")),
            direct("IC 2", "08:05", "08:35", None),
        ]
    }

    fn poller(
        source: FixedSource,
    ) -> (Poller<FixedSource, RecordingSink, EventLog>, RecordingSink, EventLog) {
        let sink = RecordingSink::default();
        let events = EventLog::default();
        let poller = Poller::new(
            &[route()],
            source,
            sink.clone(),
            events.clone(),
            EngineConfig::default(),
        );
        (poller, sink, events)
    }

    #[tokio::test]
    async fn delayed_route_fires_events_and_notifications() {
        let (mut poller, sink, events) = poller(FixedSource::new(delayed()));

        let report = poller.run_cycle(at("07:40")).await;

        // delay, reroute and departure reminder
        assert_eq!(report.events, 3);
        assert_eq!(report.notifications, 6);
        assert_eq!(report.unavailable, 0);

        let types: Vec<EventType> = events
            .recent()
            .await
            .into_iter()
            .map(|e| e.event_type)
            .collect();
        assert!(types.contains(&EventType::DelayDetected));
        assert!(types.contains(&EventType::RerouteSuggested));
        assert!(types.contains(&EventType::DepartureReminder));

        let sent = sink.sent.lock().unwrap();
        assert!(
            sent.iter()
                .any(|n| n.target == "tablet" && n.title == "Reroute Suggested")
        );

        let snapshots = poller.snapshots();
        let snapshots = snapshots.read().await;
        let snapshot = snapshots.get(&RouteId::new("a_b")).unwrap();
        assert_eq!(snapshot.sensor.state, "Delayed 12 min");
        assert!(snapshot.sensor.attributes.reroute_recommended);
    }

    #[tokio::test]
    async fn failed_fetch_marks_route_unavailable() {
        let (mut poller, sink, events) = poller(FixedSource::failing());

        let report = poller.run_cycle(at("07:40")).await;

        assert_eq!(report.unavailable, 1);
        assert_eq!(report.events, 0);
        assert!(sink.sent.lock().unwrap().is_empty());
        assert_eq!(events.len().await, 0);

        let snapshots = poller.snapshots();
        let snapshots = snapshots.read().await;
        let snapshot = snapshots.get(&RouteId::new("a_b")).unwrap();
        assert!(!snapshot.is_available());
        assert!(snapshot.sensor.attributes.error.is_some());
    }

    #[tokio::test]
    async fn failing_route_does_not_affect_others() {
        let broken = RouteConfig::new(StopId::parse("X").unwrap(), StopId::parse("Y").unwrap());
        let source = FailingOrigin {
            origin: StopId::parse("X").unwrap(),
            itineraries: delayed(),
        };
        let sink = RecordingSink::default();
        let events = EventLog::default();
        let mut poller = Poller::new(
            &[route(), broken],
            source,
            sink.clone(),
            events.clone(),
            EngineConfig::default(),
        );

        let report = poller.run_cycle(at("07:40")).await;

        assert_eq!(report.routes, 2);
        assert_eq!(report.unavailable, 1);
        assert_eq!(report.events, 3);
        assert!(events.recent().await.iter().all(|e| e.route == RouteId::new("a_b")));
        assert_eq!(sink.sent.lock().unwrap().len(), 6);

        let snapshots = poller.snapshots();
        let snapshots = snapshots.read().await;
        assert_eq!(snapshots[&RouteId::new("a_b")].sensor.state, "Delayed 12 min");
        assert!(!snapshots[&RouteId::new("x_y")].is_available());
    }

    #[tokio::test]
    async fn cooldown_spans_cycles() {
        let (mut poller, _sink, _events) = poller(FixedSource::new(delayed()));

        assert_eq!(poller.run_cycle(at("07:40")).await.events, 3);
        assert_eq!(poller.run_cycle(at("07:45")).await.events, 0);
        assert_eq!(poller.run_cycle(at("07:51")).await.events, 3);
    }

    #[tokio::test]
    async fn outside_window_still_updates_snapshot() {
        let (mut poller, sink, _events) = poller(FixedSource::new(delayed()));

        let report = poller.run_cycle(at("07:15")).await;

        assert_eq!(report.events, 0);
        assert!(sink.sent.lock().unwrap().is_empty());
        let snapshots = poller.snapshots();
        assert_eq!(snapshots.read().await.len(), 1);
    }

    #[tokio::test]
    async fn reverse_routes_are_polled() {
        let mut route = route();
        route.reverse = true;

        let poller = Poller::new(
            &[route],
            FixedSource::new(delayed()),
            RecordingSink::default(),
            EventLog::default(),
            EngineConfig::default(),
        );

        let ids: Vec<String> = poller.routes().iter().map(|r| r.id().to_string()).collect();
        assert_eq!(ids, vec!["a_b", "b_a"]);
    }

    #[tokio::test]
    async fn shared_snapshot_store() {
        let store = SnapshotStore::default();
        let (poller, _sink, _events) = poller(FixedSource::new(delayed()));
        let mut poller = poller.with_snapshots(store.clone());

        poller.run_cycle(at("07:40")).await;

        assert!(store.read().await.contains_key(&RouteId::new("a_b")));
    }
}
