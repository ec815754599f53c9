//! Scheduler runner.
//!
//! One call to [`tick`] is one full iteration of the polling loop. The
//! caller invokes it repeatedly, at least once per periodic interval.
//!
//! # Reentrancy
//! `tick` must not be called from an interrupt handler while another call
//! is in progress. The exclusive borrows of the context, engine and memory
//! rule this out for safe code; there is no locking.

use crate::buffer::BridgeContext;
use crate::device::PacketMemory;
use crate::stack::ProtocolEngine;
use crate::time::Clock;

use super::phases::{phase1_intake, phase2_dispatch, phase3_release, phase4_periodic};

/// What one [`tick`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// An inbound frame was dispatched.
    pub received: bool,
    /// Frames transmitted.
    pub transmitted: usize,
    /// Outbound frames dropped because packet memory was exhausted.
    pub send_failures: usize,
    /// The periodic pass ran.
    pub periodic: bool,
}

impl TickReport {
    /// Whether the tick did anything at all.
    pub fn is_idle(&self) -> bool {
        !self.received && self.transmitted == 0 && self.send_failures == 0 && !self.periodic
    }
}

/// Run one scheduler iteration.
///
/// # Arguments
/// - `ctx`: the interface context (staging buffer, handles, timer)
/// - `engine`: protocol engine operating on the staging buffer
/// - `memory`: NIC packet memory
/// - `clock`: millisecond time source for the periodic timer
///
/// # Returns
/// A [`TickReport`]; nothing in here fails.
pub fn tick<E, M, C, const N: usize>(
    ctx: &mut BridgeContext<N>,
    engine: &mut E,
    memory: &mut M,
    clock: &C,
) -> TickReport
where
    E: ProtocolEngine,
    M: PacketMemory,
    C: Clock,
{
    let mut report = TickReport::default();

    // Phase 1 + 2 + 3: at most one inbound frame per tick
    if let Some(handle) = phase1_intake(ctx, memory) {
        report.received = true;
        phase2_dispatch(ctx, engine, memory, handle, &mut report);
        phase3_release(ctx, memory);
    }

    // Phase 4: periodic pass
    let periodic = phase4_periodic(ctx, engine, memory, clock, &mut report);
    report.periodic = periodic;

    report
}
