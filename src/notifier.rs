//! Operator notifications
//!
//! ## Responsibilities
//!
//! - Fan out camera control outcomes to whatever renders them
//! - Never block or fail the component that raised the notification

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Notification severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Success,
    Info,
    Error,
}

/// User-visible notification
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub id: Uuid,
    pub level: NotificationLevel,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera_id: Option<String>,
    pub raised_at: DateTime<Utc>,
}

/// Notification fan-out. Dropping every receiver is fine; sends are
/// fire-and-forget.
#[derive(Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Notification>,
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe a renderer
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    pub fn success(&self, camera_id: Option<&str>, message: impl Into<String>) {
        self.publish(NotificationLevel::Success, camera_id, message.into());
    }

    pub fn info(&self, camera_id: Option<&str>, message: impl Into<String>) {
        self.publish(NotificationLevel::Info, camera_id, message.into());
    }

    pub fn error(&self, camera_id: Option<&str>, message: impl Into<String>) {
        self.publish(NotificationLevel::Error, camera_id, message.into());
    }

    fn publish(&self, level: NotificationLevel, camera_id: Option<&str>, message: String) {
        let notification = Notification {
            id: Uuid::new_v4(),
            level,
            message,
            camera_id: camera_id.map(str::to_string),
            raised_at: Utc::now(),
        };

        tracing::debug!(
            level = ?notification.level,
            camera_id = ?notification.camera_id,
            message = %notification.message,
            "Operator notification"
        );

        // No receivers is not an error; the console may run headless.
        let _ = self.tx.send(notification);
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_receives_notification() {
        let notifier = Notifier::new(8);
        let mut rx = notifier.subscribe();

        notifier.success(Some("c1"), "Gate camera started");

        let received = rx.recv().await.unwrap();
        assert_eq!(received.level, NotificationLevel::Success);
        assert_eq!(received.camera_id.as_deref(), Some("c1"));
    }

    #[test]
    fn test_publish_without_subscribers_is_noop() {
        let notifier = Notifier::new(8);
        notifier.error(None, "no one is listening");
    }
}
