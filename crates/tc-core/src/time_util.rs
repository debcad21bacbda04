//! Time utilities.
//!
//! Trade timestamps are **milliseconds since Unix epoch**. The consume loop
//! reads "now" through the [`Clock`] trait so the watchdog can be driven by a
//! test clock.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Current time as **milliseconds** since Unix epoch.
#[inline]
pub fn now_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
}

/// Milliseconds elapsed between `since_ms` and `now_ms`, saturating at zero
/// when the reference lies in the future.
#[inline]
pub fn elapsed_between(since_ms: u64, now_ms: u64) -> Duration {
    Duration::from_millis(now_ms.saturating_sub(since_ms))
}

/// Source of wall-clock time in epoch milliseconds.
pub trait Clock: Send + Sync + 'static {
    fn now_ms(&self) -> u64;
}

/// [`Clock`] backed by the system realtime clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now_ms(&self) -> u64 {
        now_ms()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_saturates() {
        assert_eq!(elapsed_between(2_000, 1_000), Duration::ZERO);
        assert_eq!(elapsed_between(1_000, 3_500), Duration::from_millis(2_500));
    }

    #[test]
    fn system_clock_is_recent() {
        // 2020-01-01 in ms
        assert!(SystemClock.now_ms() > 1_577_836_800_000);
        assert!(now_ms() >= 1_577_836_800_000);
    }
}
