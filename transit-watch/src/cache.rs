//! Caching layer for itinerary queries.
//!
//! Several routes can share a query (same stops, different line filters
//! or notification settings), and the HTTP refresh endpoint can trigger a
//! cycle right after a scheduled one. Caching the upstream answer for a
//! short while keeps that to one request.
//!
//! Departure hints are bucketed (5-minute buckets) to bound cache
//! cardinality while ensuring reasonable freshness.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use moka::future::Cache as MokaCache;
use tracing::debug;

use crate::domain::{Itinerary, StopId};
use crate::poller::{ItineraryQuery, ItinerarySource};
use crate::transport::TransportError;

/// Cache key for itinerary queries: (origin, destination, departure bucket).
/// The bucket is the departure hint's Unix time divided by the bucket size;
/// `None` for "leave now" queries.
type QueryKey = (StopId, StopId, Option<i64>);

/// Cached query result.
type QueryEntry = Arc<Vec<Itinerary>>;

/// Configuration for the cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for cached entries.
    pub ttl: Duration,

    /// Maximum number of cached entries.
    pub max_capacity: u64,

    /// Time bucket size in minutes.
    pub bucket_mins: u16,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(30),
            max_capacity: 256,
            bucket_mins: 5,
        }
    }
}

impl CacheConfig {
    /// Set the entry TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

/// An [`ItinerarySource`] with caching.
///
/// Wraps another source and caches successful answers. Failures are never
/// cached, so the next cycle retries.
pub struct CachedItinerarySource<S> {
    inner: S,
    entries: MokaCache<QueryKey, QueryEntry>,
    bucket_mins: u16,
}

impl<S: ItinerarySource> CachedItinerarySource<S> {
    /// Create a new cached source.
    pub fn new(inner: S, config: &CacheConfig) -> Self {
        let entries = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self {
            inner,
            entries,
            bucket_mins: config.bucket_mins.max(1),
        }
    }

    /// Compute the time bucket for a departure hint.
    fn time_bucket(&self, departure: Option<DateTime<Utc>>) -> Option<i64> {
        let bucket_secs = i64::from(self.bucket_mins) * 60;
        departure.map(|d| d.timestamp().div_euclid(bucket_secs))
    }

    fn key(&self, query: &ItineraryQuery) -> QueryKey {
        (
            query.origin.clone(),
            query.destination.clone(),
            self.time_bucket(query.departure),
        )
    }

    /// Access the underlying source for operations that bypass cache.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Get cache statistics.
    pub fn cache_entry_count(&self) -> u64 {
        self.entries.entry_count()
    }

    /// Invalidate all cached entries.
    pub fn invalidate_cache(&self) {
        self.entries.invalidate_all();
    }
}

impl<S: ItinerarySource> ItinerarySource for CachedItinerarySource<S> {
    async fn fetch(&self, query: &ItineraryQuery) -> Result<Vec<Itinerary>, TransportError> {
        let key = self.key(query);

        // Try cache first
        if let Some(cached) = self.entries.get(&key).await {
            debug!(origin = %query.origin, destination = %query.destination, "cache hit");
            return Ok(cached.as_ref().clone());
        }

        let itineraries = self.inner.fetch(query).await?;

        self.entries
            .insert(key, Arc::new(itineraries.clone()))
            .await;

        Ok(itineraries)
    }
}
