//! Conversion from transport.rest DTOs to domain types.
//!
//! Walking legs are dropped. A journey that cannot be turned into a valid
//! itinerary is skipped with a warning rather than failing the whole
//! response.

use tracing::warn;

use crate::domain::{Coordinate, DomainError, Itinerary, Leg, Stop, TransportMode};

use super::types::{JourneysResponse, RawJourney, RawLeg, RawStop};

/// Reason reported for a cancelled leg without a warning remark.
const CANCELLED_REASON: &str = "Cancelled";

/// Error during DTO to domain conversion.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConversionError {
    /// Missing required field
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Product not mapped to any transport mode
    #[error("unknown product: {0}")]
    UnknownProduct(String),

    /// Journey consists only of walking legs
    #[error("journey has no transit legs")]
    NoTransitLegs,

    /// Domain validation failed
    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Convert a `/journeys` response into itineraries, in upstream order.
///
/// Journeys that fail conversion are logged and skipped.
pub fn convert_journeys(response: &JourneysResponse) -> Vec<Itinerary> {
    response
        .journeys
        .iter()
        .enumerate()
        .filter_map(|(i, journey)| match convert_journey(journey) {
            Ok(itinerary) => Some(itinerary),
            Err(e) => {
                warn!(journey = i, error = %e, "skipping journey");
                None
            }
        })
        .collect()
}

/// Convert a single journey.
pub fn convert_journey(journey: &RawJourney) -> Result<Itinerary, ConversionError> {
    let legs = journey
        .legs
        .iter()
        .filter(|leg| !leg.is_walking())
        .map(convert_leg)
        .collect::<Result<Vec<_>, _>>()?;

    if legs.is_empty() {
        return Err(ConversionError::NoTransitLegs);
    }

    Ok(Itinerary::new(legs)?)
}

/// Convert a single (non-walking) leg.
pub fn convert_leg(raw: &RawLeg) -> Result<Leg, ConversionError> {
    let line = raw.line.as_ref().ok_or(ConversionError::MissingField("line"))?;
    let name = line
        .name
        .as_deref()
        .ok_or(ConversionError::MissingField("line.name"))?;

    let mode = line
        .product
        .as_deref()
        .and_then(TransportMode::parse)
        .or_else(|| line.mode.as_deref().and_then(TransportMode::parse))
        .ok_or_else(|| {
            ConversionError::UnknownProduct(
                line.product
                    .clone()
                    .or_else(|| line.mode.clone())
                    .unwrap_or_default(),
            )
        })?;

    // When the planned time is absent, the feed only knows one time and it
    // is the timetable one.
    let scheduled_departure = raw
        .planned_departure
        .or(raw.departure)
        .ok_or(ConversionError::MissingField("plannedDeparture"))?;
    let scheduled_arrival = raw
        .planned_arrival
        .or(raw.arrival)
        .ok_or(ConversionError::MissingField("plannedArrival"))?;

    let mut leg = Leg::new(
        mode,
        name,
        convert_stop(&raw.origin),
        convert_stop(&raw.destination),
        scheduled_departure,
        scheduled_arrival,
    )?;

    if raw.planned_departure.is_some() {
        if let Some(departure) = raw.departure {
            leg = leg.with_projected_departure(departure);
        }
    }
    if raw.planned_arrival.is_some() {
        if let Some(arrival) = raw.arrival {
            leg = leg.with_projected_arrival(arrival);
        }
    }

    if let Some(platform) = raw
        .departure_platform
        .as_ref()
        .or(raw.planned_departure_platform.as_ref())
    {
        leg = leg.with_platform(platform.clone());
    }

    if let Some(reason) = disruption_reason(raw) {
        leg = leg.with_disruption(reason);
    }

    Ok(leg)
}

/// First warning remark (summary preferred over text), or "Cancelled" for a
/// cancelled leg.
fn disruption_reason(raw: &RawLeg) -> Option<String> {
    let warning = raw
        .remarks
        .iter()
        .filter(|r| r.is_warning())
        .find_map(|r| r.summary.clone().or_else(|| r.text.clone()));

    match warning {
        Some(reason) => Some(reason),
        None if raw.is_cancelled() => Some(CANCELLED_REASON.to_string()),
        None => None,
    }
}

/// Convert a stop, keeping whatever identification the API gave us.
pub fn convert_stop(raw: &RawStop) -> Stop {
    let name = raw
        .name
        .clone()
        .or_else(|| raw.id.clone())
        .unwrap_or_else(|| "Unknown".to_string());

    let mut stop = Stop::named(name);
    if let Some(id) = &raw.id {
        stop = stop.with_id(id.clone());
    }
    if let Some(location) = &raw.location {
        if let (Some(lat), Some(lon)) = (location.latitude, location.longitude) {
            stop = stop.with_location(Coordinate::new(lat, lon));
        }
    }
    stop
}
