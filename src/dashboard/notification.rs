use std::collections::VecDeque;
use std::time::Duration;

use serde::Serialize;

/// How many emitted notifications are kept for inspection.
const HISTORY_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
}

/// A transient message shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub id: u64,
    pub message: String,
    pub severity: Severity,
    /// Virtual time at which the notification disappears.
    #[serde(skip)]
    pub expires_at: Duration,
}

/// Single display slot plus a bounded history.
///
/// A new notification replaces whatever is showing. Expiry is by id, so an
/// older notification's expiry never clears a newer one.
#[derive(Debug, Default)]
pub struct NotificationCenter {
    next_id: u64,
    current: Option<Notification>,
    history: VecDeque<Notification>,
}

impl NotificationCenter {
    pub fn push(&mut self, message: String, severity: Severity, expires_at: Duration) -> u64 {
        self.next_id += 1;
        let notification = Notification {
            id: self.next_id,
            message,
            severity,
            expires_at,
        };

        if self.history.len() == HISTORY_LIMIT {
            self.history.pop_front();
        }
        self.history.push_back(notification.clone());
        self.current = Some(notification);
        self.next_id
    }

    /// Clear the slot if it still shows notification `id`.
    pub fn expire(&mut self, id: u64) -> bool {
        if self.current.as_ref().is_some_and(|n| n.id == id) {
            self.current = None;
            true
        } else {
            false
        }
    }

    pub fn current(&self) -> Option<&Notification> {
        self.current.as_ref()
    }

    /// Emitted notifications, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &Notification> {
        self.history.iter()
    }
}
