//! Short-lived user notifications.

use std::time::{Duration, Instant};

/// How long a notification stays visible.
pub const NOTIFICATION_TTL: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Severity of a notification.
pub enum Severity {
    /// Operation succeeded.
    Success,
    /// Operation failed.
    Error,
    /// Something needs attention.
    Warning,
    /// Neutral information.
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// One visible notification.
pub struct Notification {
    /// Identifier used for manual dismissal.
    pub id: u64,
    /// Severity.
    pub severity: Severity,
    /// Message text.
    pub message: String,
    /// When the notification disappears on its own.
    pub expires_at: Instant,
}

/// Rendered set of notifications, oldest first.
#[derive(Debug)]
pub struct Notifications {
    ttl: Duration,
    items: Vec<Notification>,
    next_id: u64,
}

impl Default for Notifications {
    fn default() -> Self {
        Self::with_ttl(NOTIFICATION_TTL)
    }
}

impl Notifications {
    /// Empty set with a custom lifetime.
    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            items: Vec::new(),
            next_id: 0,
        }
    }

    /// Show a message now.
    pub fn push(&mut self, severity: Severity, message: impl Into<String>) -> u64 {
        self.push_at(severity, message, Instant::now())
    }

    /// Show a message as of `now`.
    pub fn push_at(&mut self, severity: Severity, message: impl Into<String>, now: Instant) -> u64 {
        self.next_id += 1;
        self.items.push(Notification {
            id: self.next_id,
            severity,
            message: message.into(),
            expires_at: now + self.ttl,
        });
        self.next_id
    }

    /// Drop every notification that expired by `now`.
    pub fn expire(&mut self, now: Instant) {
        self.items.retain(|item| item.expires_at > now);
    }

    /// Dismiss one notification by id.
    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        self.items.len() != before
    }

    /// Dismiss the most recent notification.
    pub fn dismiss_latest(&mut self) -> bool {
        self.items.pop().is_some()
    }

    /// Visible notifications, oldest first.
    #[must_use]
    pub fn items(&self) -> &[Notification] {
        &self.items
    }

    /// Most recent notification.
    #[must_use]
    pub fn latest(&self) -> Option<&Notification> {
        self.items.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expires_after_ttl() {
        let now = Instant::now();
        let mut notes = Notifications::with_ttl(Duration::from_secs(4));
        notes.push_at(Severity::Info, "hello", now);
        notes.expire(now + Duration::from_secs(3));
        assert_eq!(notes.items().len(), 1);
        notes.expire(now + Duration::from_secs(4));
        assert!(notes.items().is_empty());
    }

    #[test]
    fn dismisses_by_id() {
        let mut notes = Notifications::default();
        let first = notes.push(Severity::Error, "first");
        notes.push(Severity::Success, "second");
        assert!(notes.dismiss(first));
        assert!(!notes.dismiss(first));
        assert_eq!(notes.latest().map(|note| note.message.as_str()), Some("second"));
        assert!(notes.dismiss_latest());
        assert!(notes.items().is_empty());
    }
}
