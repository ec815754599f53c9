//! Packet memory abstraction.
//!
//! The NIC keeps its packet storage in its own memory (e.g. the 8 KiB SRAM of
//! an ENC28J60), reachable only through opaque block handles. This keeps the
//! bridge generic over concrete controllers and their bus transfer code.
//!
//! # Handle ownership
//!
//! Handles are not reference-counted. A handle is born from [`PacketMemory::receive`]
//! or [`PacketMemory::alloc`] and dies at [`PacketMemory::free`]; whoever holds
//! it last is responsible for freeing it exactly once.

use core::fmt;

use crate::types::MacAddress;

/// Opaque reference to a block of NIC packet memory.
///
/// Only meaningful to the memory manager that issued it. "No block" is
/// `Option::<PacketHandle>::None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PacketHandle(u8);

impl PacketHandle {
    /// Wrap a raw block number issued by a memory manager.
    pub const fn new(raw: u8) -> Self {
        Self(raw)
    }

    /// Raw block number.
    pub const fn raw(self) -> u8 {
        self.0
    }
}

impl fmt::Display for PacketHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Chunked checksum continuation over packet memory.
///
/// Kept separate from [`PacketMemory`] so the checksum engine only sees this
/// one capability.
pub trait PartialChecksum {
    /// Continue the one's-complement sum `seed` over `len` bytes of `handle`
    /// starting at `offset`, with the same word pairing as
    /// [`crate::checksum::checksum`].
    fn partial_checksum(&mut self, seed: u16, handle: PacketHandle, offset: usize, len: usize)
        -> u16;
}

/// Handle-based packet memory of the NIC.
///
/// All calls are bounded-time bus transfers; none of them may block waiting
/// for the network.
pub trait PacketMemory: PartialChecksum {
    /// Bring up the controller with the given station address.
    fn init(&mut self, mac: MacAddress);

    /// Take the next received frame, if any.
    ///
    /// `None` is routine: nothing arrived since the last call.
    fn receive(&mut self) -> Option<PacketHandle>;

    /// Declared size of the block in bytes.
    fn size_of(&mut self, handle: PacketHandle) -> usize;

    /// Copy up to `dst.len()` bytes from `handle` at `offset` into `dst`.
    ///
    /// Returns the number of bytes copied.
    fn read(&mut self, handle: PacketHandle, offset: usize, dst: &mut [u8]) -> usize;

    /// Allocate a block of `len` bytes for transmission.
    ///
    /// Returns `None` when packet memory is exhausted.
    fn alloc(&mut self, len: usize) -> Option<PacketHandle>;

    /// Copy `src` into `handle` at `offset`.
    ///
    /// Returns the number of bytes written.
    fn write(&mut self, handle: PacketHandle, offset: usize, src: &[u8]) -> usize;

    /// Queue the block for transmission.
    ///
    /// The block stays allocated; the caller still frees it.
    fn transmit(&mut self, handle: PacketHandle);

    /// Release the block.
    ///
    /// Releasing a received frame's handle also returns its slot in the
    /// controller's receive area.
    fn free(&mut self, handle: PacketHandle);
}
