//! Itinerary sources.
//!
//! An [`ItinerarySource`] answers "how do I get from A to B, leaving
//! around T" with the upstream's candidate itineraries, best first.
//! [`fetch_itineraries`] turns those candidates into the primary plus
//! alternatives a route is evaluated on.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::cache::CachedItinerarySource;
use crate::domain::{Itinerary, RouteConfig, Stop, StopId, next_occurrence};
use crate::transport::{MockTransportClient, TransportClient, TransportError};

/// One itinerary query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItineraryQuery {
    pub origin: StopId,
    pub destination: StopId,
    /// Earliest departure; `None` means "now".
    pub departure: Option<DateTime<Utc>>,
}

impl ItineraryQuery {
    /// Build the query for a route at `now`.
    ///
    /// A configured departure time becomes a hint for its next occurrence
    /// in the route's time zone.
    pub fn for_route(route: &RouteConfig, now: DateTime<Utc>) -> Self {
        let departure = route
            .departure_time
            .and_then(|time| next_occurrence(time, now, route.schedule.timezone));

        Self {
            origin: route.origin.clone(),
            destination: route.destination.clone(),
            departure,
        }
    }
}

/// Something that can fetch candidate itineraries.
pub trait ItinerarySource: Send + Sync {
    /// Fetch candidate itineraries, best first.
    fn fetch(
        &self,
        query: &ItineraryQuery,
    ) -> impl Future<Output = Result<Vec<Itinerary>, TransportError>> + Send;
}

/// Something that can look up stops by name or id.
pub trait StopLookup: Send + Sync {
    fn search_stops(
        &self,
        text: &str,
    ) -> impl Future<Output = Result<Vec<Stop>, TransportError>> + Send;
}

impl ItinerarySource for TransportClient {
    async fn fetch(&self, query: &ItineraryQuery) -> Result<Vec<Itinerary>, TransportError> {
        self.get_itineraries(&query.origin, &query.destination, query.departure)
            .await
    }
}

impl ItinerarySource for MockTransportClient {
    async fn fetch(&self, query: &ItineraryQuery) -> Result<Vec<Itinerary>, TransportError> {
        self.get_itineraries(&query.origin, &query.destination, query.departure)
            .await
    }
}

impl StopLookup for TransportClient {
    async fn search_stops(&self, text: &str) -> Result<Vec<Stop>, TransportError> {
        self.search_locations(text).await
    }
}

impl StopLookup for MockTransportClient {
    async fn search_stops(&self, text: &str) -> Result<Vec<Stop>, TransportError> {
        self.search_locations(text).await
    }
}

/// The itinerary source chosen at start-up.
pub enum AnySource {
    /// transport.rest behind a short-lived cache
    Live(CachedItinerarySource<TransportClient>),
    /// JSON fixtures from disk
    Mock(MockTransportClient),
}

impl ItinerarySource for AnySource {
    async fn fetch(&self, query: &ItineraryQuery) -> Result<Vec<Itinerary>, TransportError> {
        match self {
            AnySource::Live(source) => source.fetch(query).await,
            AnySource::Mock(source) => source.fetch(query).await,
        }
    }
}

impl StopLookup for AnySource {
    async fn search_stops(&self, text: &str) -> Result<Vec<Stop>, TransportError> {
        match self {
            AnySource::Live(source) => source.inner().search_stops(text).await,
            AnySource::Mock(source) => source.search_stops(text).await,
        }
    }
}

/// Why a route has no data this cycle.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Upstream request failed
    #[error("upstream unavailable: {0}")]
    Transport(#[from] TransportError),

    /// Upstream answered without any usable itinerary
    #[error("no itineraries found")]
    NoItineraries,

    /// Itineraries exist but none rides only the allowed lines
    #[error("no itineraries match the line filter")]
    Filtered,
}

/// The primary itinerary plus deduplicated alternatives.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedItineraries {
    pub primary: Itinerary,
    pub alternatives: Vec<Itinerary>,
}

impl FetchedItineraries {
    /// Pick primary and alternatives from the upstream candidates.
    ///
    /// Candidates not matching the route's line filter are dropped. The
    /// first survivor is the primary; the rest, minus duplicates of
    /// earlier ones, become alternatives (at most `max_alternatives`).
    pub fn assemble(
        candidates: Vec<Itinerary>,
        route: &RouteConfig,
        max_alternatives: usize,
    ) -> Result<Self, FetchError> {
        if candidates.is_empty() {
            return Err(FetchError::NoItineraries);
        }

        let mut matching = candidates
            .into_iter()
            .filter(|it| it.uses_only_lines(&route.line_filter));

        let primary = matching.next().ok_or(FetchError::Filtered)?;

        let mut alternatives: Vec<Itinerary> = Vec::with_capacity(max_alternatives);
        for candidate in matching {
            if alternatives.len() == max_alternatives {
                break;
            }
            let duplicate = candidate.same_trip(&primary)
                || alternatives.iter().any(|alt| alt.same_trip(&candidate));
            if !duplicate {
                alternatives.push(candidate);
            }
        }

        Ok(Self {
            primary,
            alternatives,
        })
    }

    /// Primary first, then alternatives.
    pub fn all(&self) -> impl Iterator<Item = &Itinerary> {
        std::iter::once(&self.primary).chain(&self.alternatives)
    }
}

/// Fetch and assemble the itineraries for one route.
pub async fn fetch_itineraries<S: ItinerarySource>(
    source: &S,
    route: &RouteConfig,
    now: DateTime<Utc>,
    max_alternatives: usize,
) -> Result<FetchedItineraries, FetchError> {
    let query = ItineraryQuery::for_route(route, now);
    let candidates = source.fetch(&query).await?;
    FetchedItineraries::assemble(candidates, route, max_alternatives)
}
