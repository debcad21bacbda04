//! Liveness watchdog.
//!
//! Tracks the timestamp of the most recent trade and reports a trip once the
//! venue has been silent for longer than its grace window. The watchdog only
//! decides; the consume loop owns the ticking and the runner owns the exit.

use std::time::Duration;

use tc_core::Trade;
use tc_core::time_util::elapsed_between;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogStatus {
    Armed,
    /// Terminal: once tripped every later check reports the same silence.
    Tripped { silence: Duration },
}

#[derive(Debug, Clone)]
pub struct Watchdog {
    grace: Duration,
    last_observed_ms: u64,
    tripped: Option<Duration>,
}

impl Watchdog {
    /// Arm with `grace` as the allowed silence, counting from `armed_at_ms`.
    pub fn new(grace: Duration, armed_at_ms: u64) -> Self {
        Self { grace, last_observed_ms: armed_at_ms, tripped: None }
    }

    pub fn grace(&self) -> Duration {
        self.grace
    }

    pub fn last_observed_ms(&self) -> u64 {
        self.last_observed_ms
    }

    /// Record a trade. Out-of-order timestamps never move the mark backwards.
    #[inline]
    pub fn observe(&mut self, trade: &Trade) {
        self.last_observed_ms = self.last_observed_ms.max(trade.time_ms);
    }

    /// Evaluate silence at `now_ms`. Silence equal to the grace window is
    /// still armed.
    pub fn check(&mut self, now_ms: u64) -> WatchdogStatus {
        if let Some(silence) = self.tripped {
            return WatchdogStatus::Tripped { silence };
        }
        let silence = elapsed_between(self.last_observed_ms, now_ms);
        if silence > self.grace {
            self.tripped = Some(silence);
            return WatchdogStatus::Tripped { silence };
        }
        WatchdogStatus::Armed
    }
}
