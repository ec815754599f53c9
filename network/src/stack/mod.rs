//! Protocol engine integration layer.
//!
//! This module provides the bridge between the NIC packet memory and a
//! uIP-style TCP/IP engine that works in place on one staging buffer.
//!
//! # Components
//!
//! - [`ProtocolEngine`] - What the engine must expose (input, periodic, ARP)
//! - [`Frame`] - The engine's view of the staging buffer, with checksum hooks
//! - [`Output`] - What one engine call produced
//! - [`EthernetInterface`] - Bring-up, `maintain()` and address accessors
//!
//! Engine calls report their output explicitly through [`Output`] instead of
//! a shared length variable.

mod interface;

use core::net::Ipv4Addr;

use smoltcp::wire::IpProtocol;

use crate::buffer::PacketState;
use crate::checksum;
use crate::device::{PacketHandle, PartialChecksum};
use crate::types::MacAddress;

pub use interface::{EthernetInterface, InterfaceState, NetConfig, NetworkIdentity};

/// What one engine call left in the staging buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Output {
    /// Length of the outbound frame; zero means nothing to send.
    pub produced_bytes: usize,
    /// Link + network + transport header bytes, for replies written over an
    /// existing block.
    pub header_len: usize,
    /// What should happen to the inbound handle.
    pub state: PacketState,
}

impl Output {
    /// Nothing to send.
    pub const fn none() -> Self {
        Self {
            produced_bytes: 0,
            header_len: 0,
            state: PacketState::FreeAfterProcess,
        }
    }

    /// A complete frame of `len` bytes in the staging buffer.
    pub const fn frame(len: usize) -> Self {
        Self {
            produced_bytes: len,
            header_len: len,
            state: PacketState::FreeAfterProcess,
        }
    }

    /// A reply carried by the current packet handle; only the first
    /// `header_len` bytes come from the staging buffer.
    pub const fn reply_in_place(len: usize, header_len: usize) -> Self {
        Self {
            produced_bytes: len,
            header_len,
            state: PacketState::ReuseForSend,
        }
    }

    /// The engine keeps the inbound handle and produced nothing.
    pub const fn retained() -> Self {
        Self {
            produced_bytes: 0,
            header_len: 0,
            state: PacketState::Retained,
        }
    }

    /// Keep the inbound handle in addition to whatever was produced.
    pub const fn retaining(mut self) -> Self {
        self.state = PacketState::Retained;
        self
    }

    /// Whether there is something to transmit.
    pub fn has_data(&self) -> bool {
        self.produced_bytes > 0
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::none()
    }
}

/// The engine's view of the staging buffer for one call.
///
/// `len()` is the declared frame length (uIP's `uip_len`), which may be
/// larger than the buffer when the rest of the frame stays in packet memory.
pub struct Frame<'a> {
    buf: &'a mut [u8],
    len: usize,
    handle: Option<PacketHandle>,
    memory: &'a mut dyn PartialChecksum,
}

impl<'a> Frame<'a> {
    pub fn new(
        buf: &'a mut [u8],
        len: usize,
        handle: Option<PacketHandle>,
        memory: &'a mut dyn PartialChecksum,
    ) -> Self {
        Self {
            buf,
            len,
            handle,
            memory,
        }
    }

    /// Declared length of the frame.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Resident bytes of the declared frame.
    pub fn data(&self) -> &[u8] {
        &self.buf[..self.len.min(self.buf.len())]
    }

    /// The whole staging buffer, for building output.
    pub fn buffer(&self) -> &[u8] {
        &*self.buf
    }

    pub fn buffer_mut(&mut self) -> &mut [u8] {
        &mut *self.buf
    }

    /// Packet memory block holding the full frame, if any.
    pub fn packet_handle(&self) -> Option<PacketHandle> {
        self.handle
    }

    /// IPv4 header sum (uIP's `uip_ipchksum`).
    pub fn ip_checksum(&self) -> u16 {
        checksum::ip_header_checksum(&*self.buf)
    }

    /// TCP sum with pseudo-header (uIP's `uip_tcpchksum`).
    pub fn tcp_checksum(&mut self) -> u16 {
        self.transport_checksum(IpProtocol::Tcp)
    }

    /// UDP sum with pseudo-header (uIP's `uip_udpchksum`).
    pub fn udp_checksum(&mut self) -> u16 {
        self.transport_checksum(IpProtocol::Udp)
    }

    /// ICMP sum; the whole message counts as resident.
    pub fn icmp_checksum(&mut self) -> u16 {
        self.transport_checksum(IpProtocol::Icmp)
    }

    fn transport_checksum(&mut self, protocol: IpProtocol) -> u16 {
        checksum::transport_checksum(&*self.buf, protocol, self.handle, &mut *self.memory)
    }
}

/// Minimal TCP/IP engine driven by the bridge.
///
/// Every method runs synchronously on the staging buffer in place. The
/// engine never talks to packet memory directly; it only reports what it
/// produced.
pub trait ProtocolEngine {
    /// Reset all connection state.
    fn init(&mut self);

    /// Station address used in outgoing link headers and ARP.
    fn set_link_address(&mut self, mac: MacAddress);

    fn set_host_addr(&mut self, addr: Ipv4Addr);
    fn set_netmask(&mut self, mask: Ipv4Addr);
    fn set_default_router(&mut self, addr: Ipv4Addr);

    fn host_addr(&self) -> Ipv4Addr;
    fn netmask(&self) -> Ipv4Addr;
    fn default_router(&self) -> Ipv4Addr;

    /// Number of TCP connection slots.
    fn connection_count(&self) -> usize;

    /// Number of datagram socket slots; zero without datagram support.
    fn datagram_count(&self) -> usize {
        0
    }

    /// Learn the sender's link address from an inbound IP frame
    /// (uIP's `uip_arp_ipin`).
    fn resolve_for_inbound(&mut self, frame: &Frame<'_>);

    /// Process an inbound IP frame (uIP's `uip_input`).
    fn input(&mut self, frame: &mut Frame<'_>) -> Output;

    /// Periodic maintenance of one TCP connection slot.
    fn periodic(&mut self, slot: usize, frame: &mut Frame<'_>) -> Output;

    /// Periodic maintenance of one datagram socket slot.
    fn datagram_periodic(&mut self, _slot: usize, _frame: &mut Frame<'_>) -> Output {
        Output::none()
    }

    /// Fill in the link header of an outbound IP frame, or replace the frame
    /// with an ARP request when the next hop is unknown (uIP's `uip_arp_out`).
    fn resolve_for_outbound(&mut self, frame: &mut Frame<'_>, output: Output) -> Output;

    /// Process an inbound ARP frame, possibly producing a reply
    /// (uIP's `uip_arp_arpin`).
    fn arp_input(&mut self, frame: &mut Frame<'_>) -> Output;
}
