//! Buffer bridge.
//!
//! Owns the one staging buffer the engine works in, plus the handles of the
//! current cycle. Everything the scheduler and the send path mutate lives in
//! [`BridgeContext`], passed by `&mut` to every core operation.
//!
//! # Lifecycle
//! The context is created once at bring-up and lives as long as the
//! interface. Every inbound frame overwrites the staging buffer in place; the
//! buffer itself is never reallocated.

pub mod ownership;
pub mod send;

pub use ownership::PacketState;
pub use send::{send, SendOutcome};

use crate::device::{PacketHandle, PacketMemory, PartialChecksum};
use crate::error::{NetworkError, Result};
use crate::stack::{Frame, Output};
use crate::time::PeriodicTimer;
use crate::types::ethernet::{TCP_MIN_HLEN, TRANSPORT_OFFSET};

/// Default staging buffer size (uIP's `UIP_BUFSIZE` for header-only buffering).
///
/// Large enough for link, IPv4 and a TCP header with options; payloads stay
/// in packet memory.
pub const STAGING_BUFFER_SIZE: usize = 98;

/// Smallest staging buffer that holds link + IPv4 + minimal TCP headers.
pub const MIN_STAGING_BUFFER_SIZE: usize = TRANSPORT_OFFSET + TCP_MIN_HLEN;

/// Fixed-capacity frame buffer (uIP's `uip_buf` + `uip_len`).
///
/// `len` is the declared frame length and may exceed the capacity; only the
/// first `capacity()` bytes of such a frame are resident.
#[derive(Debug)]
pub struct StagingBuffer<const N: usize> {
    data: [u8; N],
    len: usize,
}

impl<const N: usize> StagingBuffer<N> {
    pub const fn new() -> Self {
        Self { data: [0; N], len: 0 }
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Declared length of the current frame.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn set_len(&mut self, len: usize) {
        self.len = len;
    }

    /// Bytes of the current frame actually held locally.
    pub fn resident_len(&self) -> usize {
        self.len.min(N)
    }

    /// Resident part of the current frame.
    pub fn frame(&self) -> &[u8] {
        &self.data[..self.resident_len()]
    }

    /// Whole buffer, regardless of the current length.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Copy a received block into the buffer.
    ///
    /// Sets the declared length to `size` and reads at most `N` bytes.
    /// Returns the number of bytes copied.
    pub fn load<M: PacketMemory>(&mut self, memory: &mut M, handle: PacketHandle, size: usize) -> usize {
        self.len = size;
        let resident = size.min(N);
        memory.read(handle, 0, &mut self.data[..resident])
    }
}

impl<const N: usize> Default for StagingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// The single interface context.
///
/// One per process. Nothing in it is shared behind locks: the scheduler is
/// the only writer and it is never re-entered.
#[derive(Debug)]
pub struct BridgeContext<const N: usize = STAGING_BUFFER_SIZE> {
    pub(crate) staging: StagingBuffer<N>,
    /// Received handle being processed.
    pub(crate) inbound: Option<PacketHandle>,
    /// Handle the current frame lives in or is being sent from.
    pub(crate) outbound: Option<PacketHandle>,
    pub(crate) state: PacketState,
    pub(crate) timer: PeriodicTimer,
}

impl BridgeContext<STAGING_BUFFER_SIZE> {
    /// Context with the default staging buffer size.
    pub const fn new() -> Self {
        Self {
            staging: StagingBuffer::new(),
            inbound: None,
            outbound: None,
            state: PacketState::FreeAfterProcess,
            timer: PeriodicTimer::new(crate::time::PERIODIC_INTERVAL_MS),
        }
    }
}

impl Default for BridgeContext<STAGING_BUFFER_SIZE> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> BridgeContext<N> {
    /// Context with a custom staging buffer size.
    ///
    /// Fails if `N` cannot hold the link, IPv4 and minimal TCP headers.
    pub fn try_new() -> Result<Self> {
        if N < MIN_STAGING_BUFFER_SIZE {
            return Err(NetworkError::BufferTooSmall {
                needed: MIN_STAGING_BUFFER_SIZE,
                capacity: N,
            });
        }
        Ok(Self {
            staging: StagingBuffer::new(),
            inbound: None,
            outbound: None,
            state: PacketState::FreeAfterProcess,
            timer: PeriodicTimer::default(),
        })
    }

    /// Override the periodic interval.
    pub fn with_interval(mut self, interval_ms: u64) -> Self {
        self.timer = PeriodicTimer::new(interval_ms);
        self
    }

    pub fn staging(&self) -> &StagingBuffer<N> {
        &self.staging
    }

    pub fn staging_mut(&mut self) -> &mut StagingBuffer<N> {
        &mut self.staging
    }

    /// Inbound handle still held by the scheduler, if any.
    pub fn inbound_handle(&self) -> Option<PacketHandle> {
        self.inbound
    }

    /// Current outbound handle; `None` between cycles.
    pub fn outbound_handle(&self) -> Option<PacketHandle> {
        self.outbound
    }

    pub fn packet_state(&self) -> PacketState {
        self.state
    }

    pub fn timer(&self) -> &PeriodicTimer {
        &self.timer
    }

    /// Restart the periodic timer from `now_ms`.
    pub fn arm_timer(&mut self, now_ms: u64) {
        self.timer.restart(now_ms);
    }

    /// Start a new cycle: default to freeing, forget any outbound handle.
    pub(crate) fn begin_cycle(&mut self, carrier: Option<PacketHandle>) {
        self.state = PacketState::FreeAfterProcess;
        self.outbound = carrier;
    }

    /// Record what the engine produced.
    pub(crate) fn record(&mut self, output: &Output) {
        self.staging.set_len(output.produced_bytes);
        self.state = self.state.after(output.state);
    }

    /// Engine view of the staging buffer.
    pub fn frame<'a>(&'a mut self, memory: &'a mut dyn PartialChecksum) -> Frame<'a> {
        let len = self.staging.len();
        Frame::new(self.staging.as_mut_slice(), len, self.outbound, memory)
    }
}
