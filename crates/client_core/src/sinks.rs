//! User-facing notification and event-log ports.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub message: String,
    pub is_error: bool,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_error: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_error: true,
        }
    }
}

/// Transient messages shown to the user.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Fans notifications out to every subscribed receiver. Sending with no
/// receivers is not an error.
pub struct BroadcastNotifier {
    tx: broadcast::Sender<Notification>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }
}

impl NotificationSink for BroadcastNotifier {
    fn notify(&self, notification: Notification) {
        let _ = self.tx.send(notification);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub message: String,
    pub level: LogLevel,
    pub timestamp: DateTime<Utc>,
}

impl LogEntry {
    pub fn info(message: impl Into<String>) -> Self {
        Self::at(message, LogLevel::Info)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::at(message, LogLevel::Error)
    }

    fn at(message: impl Into<String>, level: LogLevel) -> Self {
        Self {
            message: message.into(),
            level,
            timestamp: Utc::now(),
        }
    }
}

/// Append-only event feed.
pub trait LogSink: Send + Sync {
    fn append(&self, entry: LogEntry);
}

/// In-memory event feed, ordered by insertion.
#[derive(Default)]
pub struct EventLog {
    entries: Mutex<Vec<LogEntry>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LogSink for EventLog {
    fn append(&self, entry: LogEntry) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }
}
