//! Sender allow-list.

use std::collections::HashSet;

/// Decides whether a sender may submit reports.
///
/// An empty allow-list means open mode: every non-blank sender is authorized.
#[derive(Debug, Clone, Default)]
pub struct AccessGate {
    allowed: HashSet<String>,
}

impl AccessGate {
    pub fn new<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: allowed
                .into_iter()
                .map(Into::into)
                .filter(|s: &String| !s.trim().is_empty())
                .collect(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.allowed.is_empty()
    }

    pub fn is_authorized(&self, sender_id: &str) -> bool {
        if sender_id.trim().is_empty() {
            return false;
        }
        self.is_open() || self.allowed.contains(sender_id)
    }
}
