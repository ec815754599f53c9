//! Scheduler phase implementations.
//!
//! # Phase Structure
//! 1. Intake: poll packet memory, only when no inbound handle is held
//! 2. Dispatch: stage the frame and branch on its ethertype
//! 3. Release: settle the inbound handle per the cycle's [`PacketState`]
//! 4. Periodic: one pass over every connection slot per timer expiry
//!
//! Each phase runs to completion; nothing is pipelined. An outbound packet
//! is transmitted and freed before the engine is called again.

use smoltcp::wire::EthernetProtocol;

use crate::buffer::{self, BridgeContext, PacketState, SendOutcome};
use crate::device::{PacketHandle, PacketMemory};
use crate::stack::{Output, ProtocolEngine};
use crate::time::Clock;
use crate::types::ethertype;

use super::runner::TickReport;

/// Phase 1: take the next received frame.
///
/// A held handle (one the engine declined to release last time) blocks
/// intake; `None` from packet memory is routine.
pub fn phase1_intake<M: PacketMemory, const N: usize>(
    ctx: &mut BridgeContext<N>,
    memory: &mut M,
) -> Option<PacketHandle> {
    if ctx.inbound.is_none() {
        ctx.inbound = memory.receive();
        if let Some(handle) = ctx.inbound {
            log::debug!("receive: {}", handle);
        }
    }
    ctx.inbound
}

/// Phase 2: stage `handle` and hand it to the engine.
///
/// IP frames go through inbound resolution, input, and (if a reply was
/// produced) outbound resolution. ARP replies are sent as produced. Anything
/// else is dropped without a transmit.
pub fn phase2_dispatch<E, M, const N: usize>(
    ctx: &mut BridgeContext<N>,
    engine: &mut E,
    memory: &mut M,
    handle: PacketHandle,
    report: &mut TickReport,
) where
    E: ProtocolEngine,
    M: PacketMemory,
{
    ctx.begin_cycle(Some(handle));

    let size = memory.size_of(handle);
    if size == 0 {
        log::trace!("{} is empty", handle);
        ctx.staging.set_len(0);
        return;
    }

    let copied = ctx.staging.load(memory, handle, size);
    log::trace!("{}: {} bytes declared, {} staged", handle, size, copied);

    match ethertype(ctx.staging.frame()) {
        Some(EthernetProtocol::Ipv4) => {
            engine.resolve_for_inbound(&ctx.frame(memory));
            let output = engine.input(&mut ctx.frame(memory));
            ctx.record(&output);
            if output.has_data() {
                let output = engine.resolve_for_outbound(&mut ctx.frame(memory), output);
                ctx.record(&output);
                transmit(ctx, memory, &output, report);
            }
        }
        Some(EthernetProtocol::Arp) => {
            let output = engine.arp_input(&mut ctx.frame(memory));
            ctx.record(&output);
            if output.has_data() {
                transmit(ctx, memory, &output, report);
            }
        }
        Some(other) => {
            log::trace!("dropping frame with ethertype {}", other);
        }
        None => {
            log::warn!("dropping runt frame of {} bytes from {}", size, handle);
        }
    }
}

/// Phase 3: settle the inbound handle.
///
/// Frees it unless the send path already consumed it or the engine kept it.
/// Either way the scheduler stops holding it.
pub fn phase3_release<M: PacketMemory, const N: usize>(
    ctx: &mut BridgeContext<N>,
    memory: &mut M,
) {
    let Some(handle) = ctx.inbound else {
        return;
    };

    match ctx.state {
        PacketState::FreeAfterProcess | PacketState::ReuseForSend => {
            log::debug!("freeing packet: {}", handle);
            memory.free(handle);
        }
        PacketState::Consumed => {
            log::trace!("{} already sent and freed", handle);
        }
        PacketState::Retained => {
            log::debug!("{} retained by engine", handle);
        }
    }

    ctx.inbound = None;
    ctx.outbound = None;
}

/// Phase 4: periodic maintenance.
///
/// Returns `true` if the timer had expired and a pass ran. Slots are visited
/// in ascending order, once each.
pub fn phase4_periodic<E, M, C, const N: usize>(
    ctx: &mut BridgeContext<N>,
    engine: &mut E,
    memory: &mut M,
    clock: &C,
    report: &mut TickReport,
) -> bool
where
    E: ProtocolEngine,
    M: PacketMemory,
    C: Clock,
{
    if !ctx.timer.poll(clock.now_ms()) {
        return false;
    }

    for slot in 0..engine.connection_count() {
        ctx.begin_cycle(None);
        let output = engine.periodic(slot, &mut ctx.frame(memory));
        ctx.record(&output);
        if output.has_data() {
            let output = engine.resolve_for_outbound(&mut ctx.frame(memory), output);
            ctx.record(&output);
            transmit(ctx, memory, &output, report);
        }
    }

    #[cfg(feature = "datagram")]
    for slot in 0..engine.datagram_count() {
        ctx.begin_cycle(None);
        let output = engine.datagram_periodic(slot, &mut ctx.frame(memory));
        ctx.record(&output);
        if output.has_data() {
            transmit(ctx, memory, &output, report);
        }
    }

    true
}

fn transmit<M: PacketMemory, const N: usize>(
    ctx: &mut BridgeContext<N>,
    memory: &mut M,
    output: &Output,
    report: &mut TickReport,
) {
    match buffer::send(ctx, memory, output) {
        SendOutcome::Sent => report.transmitted += 1,
        SendOutcome::NoHandleAvailable
        | SendOutcome::Oversized { .. }
        | SendOutcome::Incomplete { .. } => report.send_failures += 1,
    }
}
