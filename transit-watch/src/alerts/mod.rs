//! Outbound alerts: events, notification text and delivery.

mod event;
mod message;
mod sink;

pub use event::{EventType, TransitEvent};
pub use message::{Notification, compose};
pub use sink::{EventLog, EventSink, NotificationDispatcher, NotificationSink, NotifyError, notify_all};
