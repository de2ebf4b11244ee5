//! Where notifications and events go.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{info, warn};

use super::{Notification, TransitEvent};

/// Default number of events kept by [`EventLog`].
const DEFAULT_EVENT_CAPACITY: usize = 100;

/// Errors delivering a notification.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Webhook answered with an error status
    #[error("webhook returned {status}")]
    Status { status: u16 },
}

/// Delivers a notification to one target.
pub trait NotificationSink: Send + Sync {
    fn send(
        &self,
        notification: &Notification,
    ) -> impl Future<Output = Result<(), NotifyError>> + Send;
}

/// Receives events for automations.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: TransitEvent) -> impl Future<Output = ()> + Send;
}

/// Webhook request body.
#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    title: &'a str,
    message: &'a str,
    data: WebhookData,
}

#[derive(Debug, Serialize)]
struct WebhookData {
    priority: &'static str,
    notification_icon: &'static str,
}

/// Sends notifications to `{webhook}/{target}`, or logs them when no
/// webhook is configured.
#[derive(Debug, Clone)]
pub struct NotificationDispatcher {
    http: reqwest::Client,
    webhook: Option<String>,
}

impl NotificationDispatcher {
    /// Dispatcher posting to a webhook base URL.
    pub fn webhook(base_url: impl Into<String>) -> Result<Self, NotifyError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;

        Ok(Self {
            http,
            webhook: Some(base_url.into().trim_end_matches('/').to_string()),
        })
    }

    /// Dispatcher that only logs.
    pub fn log_only() -> Self {
        Self {
            http: reqwest::Client::new(),
            webhook: None,
        }
    }
}

impl NotificationSink for NotificationDispatcher {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let Some(base) = &self.webhook else {
            info!(
                target_name = %notification.target,
                title = %notification.title,
                message = %notification.message,
                "notification"
            );
            return Ok(());
        };

        let target = notification
            .target
            .strip_prefix("notify.")
            .unwrap_or(&notification.target);
        let url = format!("{base}/{target}");

        let payload = WebhookPayload {
            title: &notification.title,
            message: &notification.message,
            data: WebhookData {
                priority: "high",
                notification_icon: "mdi:train-car",
            },
        };

        let response = self.http.post(&url).json(&payload).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status {
                status: status.as_u16(),
            });
        }

        info!(target_name = %target, "sent notification");
        Ok(())
    }
}

/// Keeps the most recent events in memory and logs each one.
///
/// Cloning shares the underlying buffer.
#[derive(Debug, Clone)]
pub struct EventLog {
    events: Arc<RwLock<VecDeque<TransitEvent>>>,
    capacity: usize,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: Arc::new(RwLock::new(VecDeque::with_capacity(capacity))),
            capacity: capacity.max(1),
        }
    }

    /// Recent events, newest first.
    pub async fn recent(&self) -> Vec<TransitEvent> {
        self.events.read().await.iter().rev().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }
}

impl EventSink for EventLog {
    async fn emit(&self, event: TransitEvent) {
        info!(
            event_type = %event.event_type,
            route = %event.route,
            delay_minutes = event.delay_minutes,
            "event"
        );

        let mut events = self.events.write().await;
        if events.len() == self.capacity {
            events.pop_front();
        }
        events.push_back(event);
    }
}

/// Deliver one notification to every target, logging failures.
///
/// Returns the number of notifications delivered.
pub async fn notify_all<N: NotificationSink>(
    sink: &N,
    targets: &[String],
    title: &str,
    message: &str,
) -> usize {
    let mut delivered = 0;
    for target in targets {
        let notification = Notification {
            target: target.clone(),
            title: title.to_string(),
            message: message.to_string(),
        };
        match sink.send(&notification).await {
            Ok(()) => delivered += 1,
            Err(e) => warn!(target_name = %target, error = %e, "failed to send notification"),
        }
    }
    delivered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::EventType;
    use crate::domain::RouteId;
    use crate::engine::testing::at;

    fn event(n: u32) -> TransitEvent {
        TransitEvent {
            event_type: EventType::DelayDetected,
            route: RouteId::new("a_b"),
            origin: "A".into(),
            destination: "B".into(),
            delay_minutes: n,
            departure_time: at("08:00"),
            arrival_time: at("08:30"),
            minutes_until_departure: 10,
            platform: None,
            vehicle_types: vec![],
            reason: None,
            transfer_stop: None,
            alternatives: vec![],
            fired_at: at("07:50"),
        }
    }

    #[tokio::test]
    async fn event_log_is_bounded() {
        let log = EventLog::new(2);

        log.emit(event(1)).await;
        log.emit(event(2)).await;
        log.emit(event(3)).await;

        let recent = log.recent().await;
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].delay_minutes, 3);
        assert_eq!(recent[1].delay_minutes, 2);
    }

    #[tokio::test]
    async fn clones_share_events() {
        let log = EventLog::default();
        let other = log.clone();

        log.emit(event(1)).await;
        assert_eq!(other.len().await, 1);
    }

    #[tokio::test]
    async fn log_only_dispatcher_succeeds() {
        let dispatcher = NotificationDispatcher::log_only();
        let targets = vec!["phone".to_string(), "tablet".to_string()];

        let delivered = notify_all(&dispatcher, &targets, "Title", "Body").await;
        assert_eq!(delivered, 2);
    }
}
