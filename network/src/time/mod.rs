//! Time and timing module.
//!
//! The bridge never reads hardware time itself; the embedder supplies a
//! millisecond [`Clock`] (SysTick counter, calibrated TSC, test double).

pub mod timer;

pub use timer::{Clock, PeriodicTimer, PERIODIC_INTERVAL_MS};
