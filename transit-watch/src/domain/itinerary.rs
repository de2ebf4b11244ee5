//! Itinerary type.
//!
//! An `Itinerary` is one complete planned journey from origin to
//! destination, made of one or more legs. A fresh set of itineraries is
//! fetched every polling cycle; nothing mutates them afterwards.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};

use super::{Coordinate, DomainError, Leg, TransportMode};

/// A complete journey from origin to destination.
///
/// # Invariants
///
/// - At least one leg
/// - Legs are ordered in the timetable: each leg's scheduled arrival is no
///   later than the next leg's scheduled departure
#[derive(Debug, Clone, PartialEq)]
pub struct Itinerary {
    legs: Vec<Leg>,
}

impl Itinerary {
    /// Constructs an itinerary from legs in travel order.
    ///
    /// # Errors
    ///
    /// Returns `Err` if:
    /// - `legs` is empty
    /// - a leg is scheduled to depart before the previous one arrives
    ///
    /// # Examples
    ///
    /// ```
    /// use transit_watch::domain::{Itinerary, Leg, Stop, TransportMode};
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
    /// .unwrap();
    ///
    /// let itinerary = Itinerary::new(vec![leg]).unwrap();
    /// assert_eq!(itinerary.leg_count(), 1);
    /// assert_eq!(itinerary.transfer_count(), 0);
    /// ```
    pub fn new(legs: Vec<Leg>) -> Result<Self, DomainError> {
        if legs.is_empty() {
            return Err(DomainError::EmptyItinerary);
        }

        for (i, window) in legs.windows(2).enumerate() {
            if window[0].scheduled_arrival() > window[1].scheduled_departure() {
                return Err(DomainError::LegsOutOfOrder(i + 1));
            }
        }

        Ok(Itinerary { legs })
    }

    /// Returns all legs in order.
    pub fn legs(&self) -> &[Leg] {
        &self.legs
    }

    /// Returns the number of legs.
    pub fn leg_count(&self) -> usize {
        self.legs.len()
    }

    /// Returns the number of transfers (legs - 1).
    pub fn transfer_count(&self) -> usize {
        self.legs.len() - 1
    }

    /// Returns the first leg.
    pub fn first_leg(&self) -> &Leg {
        // Safe: validated non-empty at construction
        &self.legs[0]
    }

    /// Returns the last leg.
    pub fn last_leg(&self) -> &Leg {
        // Safe: validated non-empty at construction
        &self.legs[self.legs.len() - 1]
    }

    pub fn scheduled_departure(&self) -> DateTime<Utc> {
        self.first_leg().scheduled_departure()
    }

    pub fn scheduled_arrival(&self) -> DateTime<Utc> {
        self.last_leg().scheduled_arrival()
    }

    /// Best known departure from the origin.
    pub fn projected_departure(&self) -> DateTime<Utc> {
        self.first_leg().expected_departure()
    }

    /// Best known arrival at the destination. Falls back to the scheduled
    /// arrival when the feed has no real-time data.
    pub fn projected_arrival(&self) -> DateTime<Utc> {
        self.last_leg().expected_arrival()
    }

    /// Scheduled door-to-door duration.
    pub fn scheduled_duration(&self) -> Duration {
        self.scheduled_arrival() - self.scheduled_departure()
    }

    /// Platform of the first departure, if known.
    pub fn platform(&self) -> Option<&str> {
        self.first_leg().platform()
    }

    /// First disruption reason reported on any leg.
    pub fn disruption(&self) -> Option<&str> {
        self.legs.iter().find_map(|leg| leg.disruption())
    }

    /// Modes used, in leg order (may repeat).
    pub fn modes(&self) -> Vec<TransportMode> {
        self.legs.iter().map(|leg| leg.mode()).collect()
    }

    /// Line identifiers used, in leg order.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.legs.iter().map(|leg| leg.line())
    }

    /// Returns true if every leg's line is in `allowed`.
    ///
    /// An empty `allowed` set means "no filter" and always matches.
    pub fn uses_only_lines(&self, allowed: &BTreeSet<String>) -> bool {
        allowed.is_empty() || self.lines().all(|line| allowed.contains(line))
    }

    /// Known stop coordinates along the route, in travel order.
    ///
    /// Consecutive duplicates (the transfer stop reported as both an
    /// arrival and a departure) are collapsed.
    pub fn coordinates(&self) -> Vec<Coordinate> {
        let mut coords: Vec<Coordinate> = Vec::with_capacity(self.legs.len() * 2);
        for leg in &self.legs {
            for stop in [leg.origin(), leg.destination()] {
                if let Some(location) = stop.location {
                    if coords.last() != Some(&location) {
                        coords.push(location);
                    }
                }
            }
        }
        coords
    }

    /// Human-readable leg descriptions.
    pub fn describe(&self) -> Vec<String> {
        self.legs.iter().map(Leg::describe).collect()
    }

    /// Returns true if both itineraries ride the same lines at the same
    /// scheduled times.
    ///
    /// Used to keep a duplicate of the primary itinerary out of the
    /// alternatives list.
    pub fn same_trip(&self, other: &Itinerary) -> bool {
        self.legs.len() == other.legs.len()
            && self.legs.iter().zip(&other.legs).all(|(a, b)| {
                a.line() == b.line()
                    && a.scheduled_departure() == b.scheduled_departure()
                    && a.scheduled_arrival() == b.scheduled_arrival()
            })
    }
}
