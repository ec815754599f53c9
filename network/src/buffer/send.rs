//! Outbound send path.
//!
//! One packet in flight at a time. Two entry states per cycle:
//!
//! - **Reply in place**: the cycle is `ReuseForSend` and an outbound handle
//!   is held. The engine's headers (`header_len` bytes) are written over the
//!   start of that block; the payload already sits behind them.
//! - **Fresh send**: a new block of `produced_bytes` is allocated and the
//!   staging buffer copied into it.
//!
//! Both finish the same way: transmit, free, forget the handle. Frames that
//! are not fully resident in the staging buffer, or that packet memory does
//! not accept in full, are never transmitted.

use crate::device::{PacketHandle, PacketMemory};
use crate::stack::Output;

use super::{BridgeContext, PacketState};

/// Result of [`send`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Exactly one transmit was issued and the block freed.
    Sent,
    /// Packet memory is exhausted. Nothing was transmitted and the staging
    /// buffer is untouched, so the same output can be retried later.
    NoHandleAvailable,
    /// The bytes to copy exceed the staging buffer. Refused before any
    /// allocation.
    Oversized { len: usize, capacity: usize },
    /// Packet memory took fewer bytes than requested. Nothing was
    /// transmitted; a freshly allocated block has been freed.
    Incomplete { written: usize, expected: usize },
}

impl SendOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, SendOutcome::Sent)
    }
}

/// Transmit the engine's output.
///
/// # Arguments
/// - `ctx`: interface context; its packet state selects the mode
/// - `memory`: NIC packet memory
/// - `output`: what the engine produced in the staging buffer
///
/// # Returns
/// - `SendOutcome::Sent`: outbound handle is back to `None`
/// - `SendOutcome::NoHandleAvailable`: allocation failed; retry with the
///   same output on a later cycle
/// - `SendOutcome::Oversized`: `produced_bytes` (fresh) or `header_len`
///   (reply) is larger than the staging buffer
/// - `SendOutcome::Incomplete`: a write came up short
///
/// # Contract
/// - At most one `transmit` per call, and only of a fully written block
/// - No handle leaks on any path. A reply carrier that was not sent keeps
///   its `ReuseForSend` state and is freed on release.
pub fn send<M: PacketMemory, const N: usize>(
    ctx: &mut BridgeContext<N>,
    memory: &mut M,
    output: &Output,
) -> SendOutcome {
    if let (PacketState::ReuseForSend, Some(handle)) = (ctx.state, ctx.outbound) {
        let header_len = output.header_len;
        if header_len > N {
            log::warn!(
                "network_send: reply header {} exceeds staging buffer {}",
                header_len,
                N
            );
            return SendOutcome::Oversized {
                len: header_len,
                capacity: N,
            };
        }
        log::debug!("network_send reply in {} hdrlen {}", handle, header_len);
        let written = memory.write(handle, 0, &ctx.staging.as_slice()[..header_len]);
        if written < header_len {
            log::warn!(
                "network_send: {} took {} of {} header bytes",
                handle,
                written,
                header_len
            );
            return SendOutcome::Incomplete {
                written,
                expected: header_len,
            };
        }
        transmit_and_free(ctx, memory, handle);
        ctx.state = PacketState::Consumed;
        return SendOutcome::Sent;
    }

    let len = output.produced_bytes;
    if len > N {
        log::warn!(
            "network_send: {} bytes declared, staging buffer holds {}",
            len,
            N
        );
        return SendOutcome::Oversized { len, capacity: N };
    }

    ctx.outbound = memory.alloc(len);
    let Some(handle) = ctx.outbound else {
        log::warn!("network_send: no packet memory for {} bytes", len);
        return SendOutcome::NoHandleAvailable;
    };

    log::debug!("network_send {} bytes in {}", len, handle);
    let written = memory.write(handle, 0, &ctx.staging.as_slice()[..len]);
    if written < len {
        log::warn!("network_send: {} took {} of {} bytes", handle, written, len);
        memory.free(handle);
        ctx.outbound = None;
        return SendOutcome::Incomplete {
            written,
            expected: len,
        };
    }
    transmit_and_free(ctx, memory, handle);
    SendOutcome::Sent
}

fn transmit_and_free<M: PacketMemory, const N: usize>(
    ctx: &mut BridgeContext<N>,
    memory: &mut M,
    handle: PacketHandle,
) {
    memory.transmit(handle);
    memory.free(handle);
    ctx.outbound = None;
}
