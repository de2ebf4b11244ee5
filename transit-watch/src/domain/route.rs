//! Route configuration.
//!
//! A `RouteConfig` is what the user asks us to watch: a pair of stops plus
//! the rules that decide when to bother them about it. Configs are
//! deserialized from the service configuration file and validated once at
//! start-up.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use super::holidays::is_dutch_holiday;
use super::time::local_date;
use super::StopId;

/// Errors found while validating a route configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    /// Origin and destination are the same stop
    #[error("route {0}: origin and destination must differ")]
    SameStops(RouteId),

    /// Notification lead time outside the supported range
    #[error("route {route}: notify_before_minutes must be between 5 and 120, got {value}")]
    NotifyBeforeOutOfRange { route: RouteId, value: u32 },

    /// Delay threshold outside the supported range
    #[error("route {route}: min_delay_minutes must be between 1 and 60, got {value}")]
    MinDelayOutOfRange { route: RouteId, value: u32 },

    /// No active days selected
    #[error("route {0}: at least one active day is required")]
    NoActiveDays(RouteId),

    /// A notification target name is blank
    #[error("route {0}: notification targets must not be blank")]
    BlankTarget(RouteId),

    /// Name (or stops) without a single letter or digit to build an id from
    #[error("route {0:?}: name must contain a letter or digit")]
    EmptyId(String),
}

/// Stable identity of a (materialized) route.
///
/// Used as the entity id in the HTTP API and as part of the notification
/// cooldown key.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteId(String);

impl RouteId {
    pub fn new(id: impl Into<String>) -> Self {
        RouteId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RouteId({})", self.0)
    }
}

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-route notification settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    /// How long before the scheduled departure alerts may be sent.
    pub notify_before_minutes: u32,

    /// Smallest delay worth a delay alert.
    pub min_delay_minutes: u32,

    /// Names of the notification targets to message (e.g. `mobile_app_phone`).
    pub targets: Vec<String>,

    pub on_delay: bool,
    pub on_disruption: bool,
    pub on_reroute: bool,
    pub on_missed_connection: bool,
    pub departure_reminder: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            notify_before_minutes: 30,
            min_delay_minutes: 5,
            targets: Vec::new(),
            on_delay: true,
            on_disruption: true,
            on_reroute: true,
            on_missed_connection: true,
            departure_reminder: true,
        }
    }
}

/// When a route is watched at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActiveSchedule {
    /// Days of the week the route is travelled.
    pub days: HashSet<Weekday>,

    /// Skip Dutch public holidays.
    pub exclude_holidays: bool,

    /// Extra dates to skip (e.g. days off).
    pub exclude_dates: BTreeSet<NaiveDate>,

    /// Time zone used to decide which local day it is.
    pub timezone: Tz,
}

impl Default for ActiveSchedule {
    fn default() -> Self {
        Self {
            days: [
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ]
            .into(),
            exclude_holidays: true,
            exclude_dates: BTreeSet::new(),
            timezone: chrono_tz::Europe::Amsterdam,
        }
    }
}

impl ActiveSchedule {
    /// Returns true if the route is watched on the local day containing `at`.
    ///
    /// The gate passes the scheduled departure, so a train shortly after
    /// midnight counts for the day it runs on.
    pub fn is_active(&self, at: DateTime<Utc>) -> bool {
        use chrono::Datelike;

        let today = local_date(at, self.timezone);

        if !self.days.contains(&today.weekday()) {
            return false;
        }
        if self.exclude_holidays && is_dutch_holiday(today) {
            return false;
        }
        !self.exclude_dates.contains(&today)
    }
}

/// A user-configured route to watch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteConfig {
    /// Optional display name; also used to build the route id.
    #[serde(default)]
    pub name: Option<String>,

    pub origin: StopId,
    pub destination: StopId,

    /// Also watch the opposite direction as an independent route.
    #[serde(default)]
    pub reverse: bool,

    /// Usual departure time (local), used as a query hint.
    #[serde(default)]
    pub departure_time: Option<NaiveTime>,

    /// Usual departure time of the return trip (local).
    #[serde(default)]
    pub return_time: Option<NaiveTime>,

    /// Only itineraries riding exclusively on these lines are considered.
    /// Empty means no filter.
    #[serde(default)]
    pub line_filter: BTreeSet<String>,

    #[serde(default)]
    pub notifications: NotificationSettings,

    #[serde(default)]
    pub schedule: ActiveSchedule,
}

impl RouteConfig {
    /// Create a route with default settings.
    pub fn new(origin: StopId, destination: StopId) -> Self {
        Self {
            name: None,
            origin,
            destination,
            reverse: false,
            departure_time: None,
            return_time: None,
            line_filter: BTreeSet::new(),
            notifications: NotificationSettings::default(),
            schedule: ActiveSchedule::default(),
        }
    }

    /// Returns this route's identity.
    ///
    /// Named routes use a slug of the name; unnamed routes use
    /// `{origin}_{destination}`.
    pub fn id(&self) -> RouteId {
        match &self.name {
            Some(name) => RouteId(slugify(name)),
            None => RouteId(format!("{}_{}", slugify(self.origin.as_str()), slugify(self.destination.as_str()))),
        }
    }

    /// Human-readable label, e.g. `"8400058 → 8400621"`.
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("{} → {}", self.origin, self.destination),
        }
    }

    /// Expand into the independent routes actually watched.
    ///
    /// A route with `reverse` set yields itself plus a copy with origin and
    /// destination swapped (using `return_time` as its departure hint).
    /// The results never have `reverse` set.
    pub fn materialize(&self) -> Vec<RouteConfig> {
        let mut forward = self.clone();
        forward.reverse = false;

        if !self.reverse {
            return vec![forward];
        }

        let mut backward = forward.clone();
        std::mem::swap(&mut backward.origin, &mut backward.destination);
        backward.departure_time = self.return_time;
        backward.return_time = self.departure_time;
        backward.name = self.name.as_ref().map(|name| format!("{name} (return)"));

        vec![forward, backward]
    }

    /// Validate settings that serde cannot check on its own.
    pub fn validate(&self) -> Result<(), RouteError> {
        let id = self.id();
        if !id.as_str().chars().any(char::is_alphanumeric) {
            return Err(RouteError::EmptyId(self.label()));
        }

        if self.origin == self.destination {
            return Err(RouteError::SameStops(id));
        }

        let n = &self.notifications;
        if !(5..=120).contains(&n.notify_before_minutes) {
            return Err(RouteError::NotifyBeforeOutOfRange {
                route: id,
                value: n.notify_before_minutes,
            });
        }
        if !(1..=60).contains(&n.min_delay_minutes) {
            return Err(RouteError::MinDelayOutOfRange {
                route: id,
                value: n.min_delay_minutes,
            });
        }
        if n.targets.iter().any(|t| t.trim().is_empty()) {
            return Err(RouteError::BlankTarget(id));
        }

        if self.schedule.days.is_empty() {
            return Err(RouteError::NoActiveDays(id));
        }

        Ok(())
    }
}

/// Lowercase, keep alphanumerics, collapse everything else to `_`.
fn slugify(s: &str) -> String {
    let mut slug = String::with_capacity(s.len());
    for c in s.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.ends_with('_') && !slug.is_empty() {
            slug.push('_');
        }
    }
    while slug.ends_with('_') {
        slug.pop();
    }
    slug
}
