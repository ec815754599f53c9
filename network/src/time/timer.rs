//! Periodic protocol timer.
//!
//! Drives the engine's per-connection maintenance (retransmits, ARP aging).
//! Each expiry is consumed by exactly one pass: the pass restarts the timer
//! from "now", so polling faster than the period never runs it twice.

/// Default period: a quarter of a second.
pub const PERIODIC_INTERVAL_MS: u64 = 250;

/// Monotonic millisecond time source.
pub trait Clock {
    /// Milliseconds since an arbitrary fixed origin. May wrap.
    fn now_ms(&self) -> u64;
}

/// Countdown with a fixed period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodicTimer {
    interval_ms: u64,
    start_ms: u64,
}

impl PeriodicTimer {
    /// Create a timer that first expires `interval_ms` after time zero.
    pub const fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            start_ms: 0,
        }
    }

    /// Period in milliseconds.
    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    /// Arm the timer to expire one period after `now_ms`.
    pub fn restart(&mut self, now_ms: u64) {
        self.start_ms = now_ms;
    }

    /// Whether a full period has elapsed since the last restart.
    ///
    /// Wrapping subtraction keeps this correct across clock rollover.
    pub fn expired(&self, now_ms: u64) -> bool {
        now_ms.wrapping_sub(self.start_ms) >= self.interval_ms
    }

    /// Restart and return `true` if expired, else leave untouched.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        if self.expired(now_ms) {
            self.restart(now_ms);
            true
        } else {
            false
        }
    }
}

impl Default for PeriodicTimer {
    fn default() -> Self {
        Self::new(PERIODIC_INTERVAL_MS)
    }
}
