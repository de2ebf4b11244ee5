//! Domain types for the transit watcher.
//!
//! This module contains the core domain model types that represent
//! validated journey data and the user's route configuration. All types
//! enforce their invariants at construction time, so code that receives
//! these types can trust their validity.

mod error;
mod holidays;
mod itinerary;
mod leg;
mod mode;
mod route;
mod stop;
mod time;

pub use error::DomainError;
pub use holidays::{dutch_holidays, easter_sunday, is_dutch_holiday};
pub use itinerary::Itinerary;
pub use leg::Leg;
pub use mode::TransportMode;
pub use route::{ActiveSchedule, NotificationSettings, RouteConfig, RouteError, RouteId};
pub use stop::{Coordinate, InvalidStopId, Stop, StopId};
pub use time::{format_hhmm, local_date, next_occurrence, whole_minutes};
