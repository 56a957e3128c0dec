//! Transient success/error notices.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};

/// How long a notice stays visible.
pub const AUTO_DISMISS_SECS: i64 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

impl Notice {
    pub fn is_visible_at(&self, now: DateTime<Utc>) -> bool {
        now < self.raised_at + Duration::seconds(AUTO_DISMISS_SECS)
    }
}

/// Notices raised by one view, oldest first.
#[derive(Debug, Clone, Default)]
pub struct Notices {
    queue: VecDeque<Notice>,
}

impl Notices {
    pub fn success(&mut self, message: impl Into<String>) {
        self.push(Severity::Success, message.into());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(Severity::Error, message.into());
    }

    fn push(&mut self, severity: Severity, message: String) {
        self.push_at(severity, message, Utc::now());
    }

    /// Queue a notice raised at `now`, dropping those already dismissed.
    fn push_at(&mut self, severity: Severity, message: String, now: DateTime<Utc>) {
        match severity {
            Severity::Success => tracing::info!("{}", message),
            Severity::Error => tracing::warn!("{}", message),
        }
        self.queue.retain(|n| n.is_visible_at(now));
        self.queue.push_back(Notice {
            severity,
            message,
            raised_at: now,
        });
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Drop dismissed notices and return the ones still showing.
    pub fn visible_at(&mut self, now: DateTime<Utc>) -> Vec<Notice> {
        self.queue.retain(|n| n.is_visible_at(now));
        self.queue.iter().cloned().collect()
    }

    pub fn last(&self) -> Option<&Notice> {
        self.queue.back()
    }

    /// Take every pending notice regardless of age.
    pub fn drain(&mut self) -> Vec<Notice> {
        self.queue.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notices_auto_dismiss() {
        let mut notices = Notices::default();
        notices.success("User created successfully");
        let raised_at = notices.last().unwrap().raised_at;

        assert_eq!(notices.visible_at(raised_at + Duration::seconds(5)).len(), 1);
        assert!(notices
            .visible_at(raised_at + Duration::seconds(AUTO_DISMISS_SECS))
            .is_empty());
        assert!(notices.last().is_none());
    }

    #[test]
    fn test_push_prunes_dismissed() {
        let mut notices = Notices::default();
        let start = Utc::now();
        for i in 0..50 {
            notices.push_at(Severity::Error, format!("failure {}", i), start);
        }
        assert_eq!(notices.len(), 50);

        let later = start + Duration::seconds(AUTO_DISMISS_SECS);
        notices.push_at(Severity::Success, "Saved".to_string(), later);

        assert_eq!(notices.len(), 1);
        assert_eq!(notices.last().map(|n| n.message.as_str()), Some("Saved"));
    }
}
