//! User-visible notifications ("toasts").
//!
//! The client publishes here instead of talking to any UI. Whatever renders
//! notifications subscribes to a [`NotificationBus`] and shows each
//! [`Notice`] for a short while.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use tokio::sync::broadcast;
use xiaozhi_error::{Error, ErrorPolicy, Severity};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: Severity,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl Notice {
    pub fn new(level: Severity, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            at: Utc::now(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }
}

/// Anything that can show a notice to the user.
pub trait NotificationSink: Send + Sync + std::fmt::Debug {
    fn notify(&self, notice: Notice);
}

#[derive(Debug, Clone)]
pub struct NotificationBus {
    tx: broadcast::Sender<Notice>,
}

pub const DEFAULT_NOTICE_CAPACITY: usize = 100;

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new(DEFAULT_NOTICE_CAPACITY)
    }
}

impl NotificationBus {
    pub fn new(capacity: usize) -> Self {
        Self {
            tx: broadcast::channel(capacity).0,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.tx.subscribe()
    }

    /// Publish to current subscribers. Having none is not an error.
    pub fn publish(&self, notice: Notice) {
        tracing::debug!(level = ?notice.level, message = %notice.message, "notice published");
        let _ = self.tx.send(notice); // Ignore receiver count
    }

    pub fn error(&self, message: impl Into<String>) {
        self.publish(Notice::error(message))
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.publish(Notice::warning(message))
    }

    pub fn info(&self, message: impl Into<String>) {
        self.publish(Notice::info(message))
    }
}

impl NotificationSink for NotificationBus {
    fn notify(&self, notice: Notice) {
        self.publish(notice)
    }
}

/// Routes workspace errors to toasts, using the error's display text.
impl ErrorPolicy for NotificationBus {
    fn emit(&self, error: &Error) {
        self.publish(Notice::new(self.classify(error), error.to_string()))
    }
}

static NOTIFICATIONS: Lazy<NotificationBus> = Lazy::new(NotificationBus::default);

/// The process-wide bus the default client publishes to.
pub fn notifications() -> &'static NotificationBus {
    &NOTIFICATIONS
}
