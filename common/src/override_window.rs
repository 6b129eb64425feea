use chrono::{DateTime, Duration, FixedOffset};

/// Expiry tracker for a manual temperature override.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverrideWindow {
    expires_at: DateTime<FixedOffset>,
    duration: Duration,
}

impl OverrideWindow {
    /// Starts inactive: the window expires at `now`.
    pub fn new(now: DateTime<FixedOffset>, duration: Duration) -> Self {
        Self {
            expires_at: now,
            duration,
        }
    }

    pub fn expires_at(&self) -> DateTime<FixedOffset> {
        self.expires_at
    }

    pub fn is_active(&self, now: DateTime<FixedOffset>) -> bool {
        now < self.expires_at
    }

    /// Restarts the window from `now`, whatever state it was in.
    pub fn extend(&mut self, now: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
        self.expires_at = now + self.duration;
        self.expires_at
    }

    pub fn collapse(&mut self, now: DateTime<FixedOffset>) {
        self.expires_at = now;
    }

    /// Zero once the window has lapsed.
    pub fn remaining(&self, now: DateTime<FixedOffset>) -> Duration {
        if self.is_active(now) {
            self.expires_at - now
        } else {
            Duration::zero()
        }
    }
}
