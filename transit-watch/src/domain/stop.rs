//! Stop identifiers and leg endpoints.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when parsing an invalid stop identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid stop id: {reason}")]
pub struct InvalidStopId {
    reason: &'static str,
}

/// Longest stop identifier we accept. HAFAS ids are short numeric strings,
/// but names are accepted too, so leave some room.
const MAX_STOP_ID_LEN: usize = 100;

/// An identifier for a stop or station as understood by the upstream API.
///
/// This is usually a numeric HAFAS id (e.g. `8400058` for Amsterdam
/// Centraal) but a plain stop name is accepted as well. The value is
/// trimmed and guaranteed non-empty by construction.
///
/// # Examples
///
/// ```
/// use transit_watch::domain::StopId;
///
/// let ams = StopId::parse(" 8400058 ").unwrap();
/// assert_eq!(ams.as_str(), "8400058");
///
/// assert!(StopId::parse("").is_err());
/// assert!(StopId::parse("   ").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StopId(String);

impl StopId {
    /// Parse a stop identifier, trimming surrounding whitespace.
    pub fn parse(s: &str) -> Result<Self, InvalidStopId> {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return Err(InvalidStopId {
                reason: "must not be empty",
            });
        }

        if trimmed.len() > MAX_STOP_ID_LEN {
            return Err(InvalidStopId {
                reason: "must be at most 100 bytes",
            });
        }

        if trimmed.chars().any(char::is_control) {
            return Err(InvalidStopId {
                reason: "must not contain control characters",
            });
        }

        Ok(StopId(trimmed.to_string()))
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for StopId {
    type Error = InvalidStopId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        StopId::parse(&value)
    }
}

impl From<StopId> for String {
    fn from(value: StopId) -> Self {
        value.0
    }
}

impl fmt::Debug for StopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StopId({})", self.0)
    }
}

impl fmt::Display for StopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A WGS84 coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// The endpoint of a leg: where a ride starts or ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    /// Upstream identifier, when the API supplied one
    pub id: Option<String>,
    /// Human-readable stop name
    pub name: String,
    /// Location, when known
    pub location: Option<Coordinate>,
}

impl Stop {
    /// Creates a stop with only a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            location: None,
        }
    }

    /// Sets the upstream identifier.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the location.
    pub fn with_location(mut self, location: Coordinate) -> Self {
        self.location = Some(location);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_trims() {
        let id = StopId::parse("  Utrecht Centraal ").unwrap();
        assert_eq!(id.as_str(), "Utrecht Centraal");
        assert_eq!(id.to_string(), "Utrecht Centraal");
    }

    #[test]
    fn reject_empty() {
        assert!(StopId::parse("").is_err());
        assert!(StopId::parse(" \t ").is_err());
    }

    #[test]
    fn reject_control_characters() {
        assert!(StopId::parse("8400\n058").is_err());
    }

    #[test]
    fn reject_too_long() {
        let long = "x".repeat(MAX_STOP_ID_LEN + 1);
        assert!(StopId::parse(&long).is_err());
    }

    #[test]
    fn deserialize_validates() {
        let ok: Result<StopId, _> = serde_json::from_str("\"8400058\"");
        assert_eq!(ok.unwrap().as_str(), "8400058");

        let bad: Result<StopId, _> = serde_json::from_str("\"  \"");
        assert!(bad.is_err());
    }

    #[test]
    fn stop_builder() {
        let stop = Stop::named("Amsterdam Centraal")
            .with_id("8400058")
            .with_location(Coordinate::new(52.379, 4.900));

        assert_eq!(stop.id.as_deref(), Some("8400058"));
        assert_eq!(stop.location.map(|c| c.latitude), Some(52.379));
    }
}
