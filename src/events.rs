//! UI event bus
//!
//! Stand-in for frontend toast notifications: services publish structured
//! events on a broadcast channel and any number of UI consumers subscribe.
//! Publishing never blocks and never fails if nobody is listening.

use tokio::sync::broadcast;

/// Notification severity, mirroring the toast levels of the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Success,
    Warning,
    Error,
}

/// Event published towards the UI layer.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Notification {
    pub level: Level,
    pub message: String,
    /// Backend-provided detail, when present.
    pub detail: Option<String>,
}

/// Broadcast bus for UI notifications.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Notification>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(64);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    pub fn publish(&self, level: Level, message: impl Into<String>) {
        self.publish_with_detail(level, message, None);
    }

    pub fn publish_with_detail(
        &self,
        level: Level,
        message: impl Into<String>,
        detail: Option<String>,
    ) {
        let notification = Notification {
            level,
            message: message.into(),
            detail,
        };
        // A send error only means there is no subscriber right now.
        let _ = self.sender.send(notification);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.publish(Level::Info, message);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.publish(Level::Success, message);
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.publish(Level::Warning, message);
    }

    pub fn error(&self, message: impl Into<String>, detail: Option<String>) {
        self.publish_with_detail(Level::Error, message, detail);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
