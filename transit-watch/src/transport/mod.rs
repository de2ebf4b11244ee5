//! transport.rest client.
//!
//! This module provides an HTTP client for the HAFAS-backed transport.rest
//! API (`https://v6.db.transport.rest` by default), which plans journeys
//! with real-time data across Dutch and German public transport.
//!
//! Key characteristics of the API:
//! - Journeys are returned best-first; we treat the first as the primary
//! - Real-time fields (`departure`, `arrival`) are null for cancelled legs
//!   and equal the planned times when no live data exists
//! - Walking transfers appear as legs with `walking: true` and no line

mod client;
mod convert;
mod error;
mod mock;
mod types;

pub use client::{TransportClient, TransportConfig};
pub use convert::{ConversionError, convert_journey, convert_journeys};
pub use error::TransportError;
pub use mock::MockTransportClient;
pub use types::{JourneysResponse, RawJourney, RawLeg, RawLine, RawLocation, RawRemark, RawStop};
