//! Duplicate-signal suppression per symbol and side.
//!
//! A signal for a `(symbol, side)` key is allowed when the key has never been
//! seen, or when at least the cool-down window has passed since the last
//! allowed signal. Suppressed signals leave the stored timestamp alone, so a
//! burst of duplicates cannot extend the cool-down.

use chrono::{DateTime, Duration, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::domain::Side;

/// Default cool-down between two accepted signals for the same key.
pub const DEFAULT_WINDOW_SECS: i64 = 330;

/// Last accepted signal for one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceRecord {
    pub side: Side,
    pub timestamp: DateTime<Utc>,
}

/// Concurrent debounce store.
///
/// Records are never evicted; the key space is bounded by the traded symbols.
#[derive(Debug)]
pub struct DebounceGate {
    records: DashMap<String, DebounceRecord>,
    window: Duration,
}

impl DebounceGate {
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            records: DashMap::new(),
            window,
        }
    }

    #[must_use]
    pub fn with_window_secs(secs: i64) -> Self {
        Self::new(Duration::seconds(secs))
    }

    fn key(symbol: &str, side: Side) -> String {
        format!("{symbol}{}", side.as_str())
    }

    /// Whether a new entry is allowed; records `now` when it is.
    ///
    /// The check and the update happen under the same shard lock, so two
    /// concurrent callers for one key cannot both be allowed.
    pub fn allow(&self, symbol: &str, side: Side, now: DateTime<Utc>) -> bool {
        match self.records.entry(Self::key(symbol, side)) {
            Entry::Vacant(vacant) => {
                vacant.insert(DebounceRecord {
                    side,
                    timestamp: now,
                });
                true
            }
            Entry::Occupied(mut occupied) => {
                if now - occupied.get().timestamp >= self.window {
                    occupied.get_mut().timestamp = now;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Cool-down left for a key, zero when an entry would be allowed.
    #[must_use]
    pub fn remaining(&self, symbol: &str, side: Side, now: DateTime<Utc>) -> Duration {
        self.records
            .get(&Self::key(symbol, side))
            .map(|record| self.window - (now - record.timestamp))
            .filter(|left| *left > Duration::zero())
            .unwrap_or_else(Duration::zero)
    }

    /// Stored record for a key.
    #[must_use]
    pub fn record(&self, symbol: &str, side: Side) -> Option<DebounceRecord> {
        self.records.get(&Self::key(symbol, side)).map(|r| *r)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for DebounceGate {
    fn default() -> Self {
        Self::with_window_secs(DEFAULT_WINDOW_SECS)
    }
}
