//! Short-lived notification area
//!
//! Only the latest notification is shown. Each one carries its own hide
//! deadline, so an older notification's timer never hides a newer message.

use std::time::{Duration, Instant};

pub const DEFAULT_VISIBLE_FOR: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
    pub shown_at: Instant,
}

#[derive(Debug, Clone)]
pub struct Notifier {
    current: Option<Notification>,
    visible_for: Duration,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(DEFAULT_VISIBLE_FOR)
    }
}

impl Notifier {
    pub fn new(visible_for: Duration) -> Self {
        Self {
            current: None,
            visible_for,
        }
    }

    /// Replace whatever is shown and restart the visibility window
    pub fn show(&mut self, message: impl Into<String>, severity: Severity, now: Instant) {
        let message = message.into();
        tracing::debug!(?severity, %message, "notification");
        self.current = Some(Notification {
            message,
            severity,
            shown_at: now,
        });
    }

    pub fn current(&self) -> Option<&Notification> {
        self.current.as_ref()
    }

    /// Hide the current notification once its own window has elapsed
    pub fn tick(&mut self, now: Instant) {
        if let Some(n) = &self.current {
            if now.saturating_duration_since(n.shown_at) >= self.visible_for {
                self.current = None;
            }
        }
    }
}
