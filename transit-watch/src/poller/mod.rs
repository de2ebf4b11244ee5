//! Fetching itineraries and running the polling cycle.

mod coordinator;
mod source;

pub use coordinator::{CycleReport, Poller, SnapshotStore};
pub use source::{
    AnySource, FetchError, FetchedItineraries, ItineraryQuery, ItinerarySource, StopLookup,
    fetch_itineraries,
};
