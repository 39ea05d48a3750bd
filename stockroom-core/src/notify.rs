//! User-visible notifications
//!
//! Settled submissions and session changes end up here as dismissible
//! messages. New notifications are broadcast so a front end can render them
//! as they arrive; [`NotificationCenter::active`] lists what is still shown.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Error,
    Info,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Level::Success => "success",
            Level::Error => "error",
            Level::Info => "info",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub id: Uuid,
    pub level: Level,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Shared notification list
#[derive(Clone)]
pub struct NotificationCenter {
    active: Arc<Mutex<Vec<Notification>>>,
    events: broadcast::Sender<Notification>,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationCenter {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(64);
        Self { active: Arc::new(Mutex::new(Vec::new())), events }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Notification>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push(&self, level: Level, message: impl Into<String>) -> Uuid {
        let notification = Notification {
            id: Uuid::new_v4(),
            level,
            message: message.into(),
            created_at: Utc::now(),
        };
        match level {
            Level::Error => log::warn!("Notification: {}", notification.message),
            Level::Success | Level::Info => log::info!("Notification: {}", notification.message),
        }

        let id = notification.id;
        self.lock().push(notification.clone());
        let _ = self.events.send(notification);
        id
    }

    pub fn success(&self, message: impl Into<String>) -> Uuid {
        self.push(Level::Success, message)
    }

    pub fn error(&self, message: impl Into<String>) -> Uuid {
        self.push(Level::Error, message)
    }

    pub fn info(&self, message: impl Into<String>) -> Uuid {
        self.push(Level::Info, message)
    }

    /// Remove a notification; `false` if it was already gone
    pub fn dismiss(&self, id: Uuid) -> bool {
        let mut active = self.lock();
        let before = active.len();
        active.retain(|n| n.id != id);
        active.len() != before
    }

    /// Notifications not yet dismissed, oldest first
    pub fn active(&self) -> Vec<Notification> {
        self.lock().clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.events.subscribe()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}
