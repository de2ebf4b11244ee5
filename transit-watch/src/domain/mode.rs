//! Transport modes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of vehicle a leg is ridden on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    Train,
    Bus,
    Tram,
    Metro,
    Ferry,
}

impl TransportMode {
    /// Map an upstream product or mode name onto a transport mode.
    ///
    /// Accepts the HAFAS product names used by transport.rest
    /// (`nationalExpress`, `regional`, `subway`, ...) as well as the plain
    /// mode names. Matching is case-insensitive. Returns `None` for
    /// anything else, including walking.
    ///
    /// # Examples
    ///
    /// ```
    /// use transit_watch::domain::TransportMode;
    ///
    /// assert_eq!(TransportMode::parse("nationalExpress"), Some(TransportMode::Train));
    /// assert_eq!(TransportMode::parse("subway"), Some(TransportMode::Metro));
    /// assert_eq!(TransportMode::parse("walking"), None);
    /// ```
    pub fn parse(product: &str) -> Option<Self> {
        match product.to_ascii_lowercase().as_str() {
            "nationalexpress" | "national" | "regionalexpress" | "regional" | "suburban"
            | "train" | "rail" => Some(TransportMode::Train),
            "bus" | "coach" => Some(TransportMode::Bus),
            "tram" => Some(TransportMode::Tram),
            "subway" | "metro" => Some(TransportMode::Metro),
            "ferry" | "watercraft" => Some(TransportMode::Ferry),
            _ => None,
        }
    }

    /// Returns the lowercase mode name.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportMode::Train => "train",
            TransportMode::Bus => "bus",
            TransportMode::Tram => "tram",
            TransportMode::Metro => "metro",
            TransportMode::Ferry => "ferry",
        }
    }

    /// Material Design icon name for this mode.
    pub fn icon(&self) -> &'static str {
        match self {
            TransportMode::Train => "mdi:train",
            TransportMode::Bus => "mdi:bus",
            TransportMode::Tram => "mdi:tram",
            TransportMode::Metro => "mdi:subway-variant",
            TransportMode::Ferry => "mdi:ferry",
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
