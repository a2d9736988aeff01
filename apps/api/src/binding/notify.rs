use std::sync::Mutex;

use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Success,
    /// Rendered as a destructive toast on the dashboard.
    Error,
}

/// A transient, user-visible message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub severity: Severity,
}

impl Notification {
    pub fn success(description: impl Into<String>) -> Self {
        Self {
            title: "Success".to_string(),
            description: description.into(),
            severity: Severity::Success,
        }
    }

    pub fn error(description: impl Into<String>) -> Self {
        Self {
            title: "Error".to_string(),
            description: description.into(),
            severity: Severity::Error,
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Emits each notification as a log line.
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.severity {
            Severity::Success => info!(title = %notification.title, "{}", notification.description),
            Severity::Error => warn!(title = %notification.title, "{}", notification.description),
        }
    }
}

/// Collects notifications so they can be returned to the caller.
#[derive(Default)]
pub struct NotificationLog {
    entries: Mutex<Vec<Notification>>,
}

impl NotificationLog {
    pub fn snapshot(&self) -> Vec<Notification> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn errors(&self) -> Vec<Notification> {
        self.snapshot()
            .into_iter()
            .filter(|n| n.severity == Severity::Error)
            .collect()
    }
}

impl Notifier for NotificationLog {
    fn notify(&self, notification: Notification) {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(notification);
    }
}
