//! Manually driven [`Clock`].

use chrono::{DateTime, Duration, TimeZone, Utc};
use parking_lot::Mutex;

use crate::service::Clock;

/// A clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock() = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

/// Starts at 2024-03-01T00:00:00Z.
impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}
