//! Packet scheduler.
//!
//! The polling loop: pulls at most one inbound packet per invocation, feeds
//! it to the protocol engine, drains any resulting outbound frame through the
//! buffer bridge, and drives the periodic protocol pass.
//!
//! - `phases` - the individual steps of one iteration
//! - `runner` - [`tick`], which runs them in order
//!
//! # Usage
//!
//! ```ignore
//! use uipnet_network::{tick, BridgeContext};
//!
//! let mut ctx = BridgeContext::new();
//! ctx.arm_timer(clock.now_ms());
//! loop {
//!     let report = tick(&mut ctx, &mut engine, &mut memory, &clock);
//!     if report.send_failures > 0 {
//!         // packet memory is full; the engine retransmits on its own timers
//!     }
//! }
//! ```

pub mod phases;
pub mod runner;

pub use runner::{tick, TickReport};
