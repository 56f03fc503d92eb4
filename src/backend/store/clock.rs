//! Strictly increasing timestamps for ordering keys.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

/// Hands out wall-clock timestamps that never repeat or go backwards
///
/// Values have microsecond resolution, matching what PostgreSQL stores, so
/// two records created in the same microsecond still get distinct keys.
#[derive(Debug, Default)]
pub struct MonotonicClock {
    last_micros: AtomicI64,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// A clock whose next value is at least one microsecond after `last`
    #[cfg(test)]
    pub(crate) fn resuming_after(last: DateTime<Utc>) -> Self {
        Self {
            last_micros: AtomicI64::new(last.timestamp_micros()),
        }
    }

    pub fn next(&self) -> DateTime<Utc> {
        let now = Utc::now().timestamp_micros();
        let previous = self
            .last_micros
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(if now > last { now } else { last + 1 })
            })
            .unwrap_or(now);
        let issued = if now > previous { now } else { previous + 1 };

        DateTime::<Utc>::from_timestamp_micros(issued).unwrap_or_else(Utc::now)
    }
}
