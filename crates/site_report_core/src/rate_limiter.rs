//! Per-sender cooldown between accepted reports.

use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Result of a cooldown check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Throttle {
    Allowed,
    Cooldown { retry_after: TimeDelta },
}

impl Throttle {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Throttle::Allowed)
    }
}

/// Maps each sender to the instant they may submit again.
///
/// Checking and arming are separate steps: two messages from the same sender
/// that both arrive before the first report is stored will both pass. Expired
/// entries are never purged; they are simply inert.
#[derive(Debug, Default)]
pub struct RateLimiter {
    available_at: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check_and_throttle(&self, sender_id: &str, now: DateTime<Utc>) -> Throttle {
        let map = self.available_at.lock().unwrap_or_else(PoisonError::into_inner);
        match map.get(sender_id) {
            Some(&until) if until > now => Throttle::Cooldown {
                retry_after: until - now,
            },
            _ => Throttle::Allowed,
        }
    }

    /// Starts (or restarts) the cooldown for `sender_id`. Last write wins.
    pub fn arm(&self, sender_id: &str, now: DateTime<Utc>, cooldown: TimeDelta) {
        let mut map = self.available_at.lock().unwrap_or_else(PoisonError::into_inner);
        map.insert(sender_id.to_string(), now + cooldown);
    }
}
