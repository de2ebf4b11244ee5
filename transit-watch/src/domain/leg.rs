//! Leg type.
//!
//! A `Leg` is one uninterrupted ride on a single line, from boarding to
//! alighting. It carries both the timetable ("scheduled") and the live
//! ("projected") times; the projected ones are optional because the
//! upstream feed does not always have real-time data.

use chrono::{DateTime, Duration, Utc};

use super::{DomainError, Stop, TransportMode};

/// A leg of an itinerary (one vehicle).
///
/// # Invariants
///
/// - `scheduled_arrival >= scheduled_departure`
///
/// Projected times are not checked against each other: a late-running
/// vehicle may well report an arrival projection that makes no sense
/// relative to its departure projection, and we keep what we were given.
#[derive(Debug, Clone, PartialEq)]
pub struct Leg {
    mode: TransportMode,
    line: String,
    origin: Stop,
    destination: Stop,
    scheduled_departure: DateTime<Utc>,
    scheduled_arrival: DateTime<Utc>,
    projected_departure: Option<DateTime<Utc>>,
    projected_arrival: Option<DateTime<Utc>>,
    platform: Option<String>,
    disruption: Option<String>,
}

impl Leg {
    /// Construct a leg from its timetable data.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the scheduled arrival is before the scheduled
    /// departure, or if the line identifier is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use transit_watch::domain::{Leg, Stop, TransportMode};
    /// use chrono::{DateTime, Duration, Utc};
    ///
    /// let dep: DateTime<Utc> = "2024-06-03T07:00:00Z".parse().unwrap();
    /// let leg = Leg::new(
    ///     TransportMode::Train,
    ///     "IC 3500",
    ///     Stop::named("Amsterdam Centraal"),
    ///     Stop::named("Utrecht Centraal"),
    ///     dep,
    ///     dep + Duration::minutes(27),
    /// )
    /// .unwrap()
    /// .with_projected_arrival(dep + Duration::minutes(31));
    ///
    /// assert_eq!(leg.expected_arrival(), dep + Duration::minutes(31));
    /// assert_eq!(leg.expected_departure(), dep);
    /// ```
    pub fn new(
        mode: TransportMode,
        line: impl Into<String>,
        origin: Stop,
        destination: Stop,
        scheduled_departure: DateTime<Utc>,
        scheduled_arrival: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let line = line.into();
        if line.trim().is_empty() {
            return Err(DomainError::InvalidLeg("line identifier must not be empty"));
        }

        if scheduled_arrival < scheduled_departure {
            return Err(DomainError::InvalidLeg(
                "arrival must not be before departure",
            ));
        }

        Ok(Leg {
            mode,
            line,
            origin,
            destination,
            scheduled_departure,
            scheduled_arrival,
            projected_departure: None,
            projected_arrival: None,
            platform: None,
            disruption: None,
        })
    }

    /// Sets the real-time departure projection.
    pub fn with_projected_departure(mut self, at: DateTime<Utc>) -> Self {
        self.projected_departure = Some(at);
        self
    }

    /// Sets the real-time arrival projection.
    pub fn with_projected_arrival(mut self, at: DateTime<Utc>) -> Self {
        self.projected_arrival = Some(at);
        self
    }

    /// Sets the departure platform.
    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    /// Sets the disruption reason.
    pub fn with_disruption(mut self, reason: impl Into<String>) -> Self {
        self.disruption = Some(reason.into());
        self
    }

    pub fn mode(&self) -> TransportMode {
        self.mode
    }

    /// Returns the line identifier (e.g. "IC 3500", "Bus 22").
    pub fn line(&self) -> &str {
        &self.line
    }

    pub fn origin(&self) -> &Stop {
        &self.origin
    }

    pub fn destination(&self) -> &Stop {
        &self.destination
    }

    pub fn scheduled_departure(&self) -> DateTime<Utc> {
        self.scheduled_departure
    }

    pub fn scheduled_arrival(&self) -> DateTime<Utc> {
        self.scheduled_arrival
    }

    /// Returns the real-time departure, if the feed had one.
    pub fn projected_departure(&self) -> Option<DateTime<Utc>> {
        self.projected_departure
    }

    /// Returns the real-time arrival, if the feed had one.
    pub fn projected_arrival(&self) -> Option<DateTime<Utc>> {
        self.projected_arrival
    }

    /// Best known departure: projected if present, otherwise scheduled.
    pub fn expected_departure(&self) -> DateTime<Utc> {
        self.projected_departure.unwrap_or(self.scheduled_departure)
    }

    /// Best known arrival: projected if present, otherwise scheduled.
    pub fn expected_arrival(&self) -> DateTime<Utc> {
        self.projected_arrival.unwrap_or(self.scheduled_arrival)
    }

    /// Returns the departure platform, if known.
    pub fn platform(&self) -> Option<&str> {
        self.platform.as_deref()
    }

    /// Returns the disruption reason, if any.
    pub fn disruption(&self) -> Option<&str> {
        self.disruption.as_deref()
    }

    /// Returns the timetabled ride duration.
    pub fn scheduled_duration(&self) -> Duration {
        self.scheduled_arrival - self.scheduled_departure
    }

    /// One-line description, e.g. `"IC 3500 (train): Amsterdam Centraal → Utrecht Centraal"`.
    pub fn describe(&self) -> String {
        format!(
            "{} ({}): {} → {}",
            self.line, self.mode, self.origin.name, self.destination.name
        )
    }
}
