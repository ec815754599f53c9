//! Ethernet frame geometry and helpers.
//!
//! Offsets are relative to the start of the staging buffer, which always
//! begins with the 14-byte Ethernet header.
//!
//! # Reference
//! IEEE 802.3, RFC 791, RFC 793, RFC 768

use smoltcp::wire::{EthernetFrame, EthernetProtocol};

/// MAC address length.
pub const ETH_ALEN: usize = 6;

/// Link-layer header length (uIP's `UIP_LLH_LEN`).
pub const ETH_HLEN: usize = 14;

/// IPv4 header length without options (uIP's `UIP_IPH_LEN`).
pub const IPV4_HLEN: usize = 20;

/// UDP header length (uIP's `UIP_UDPH_LEN`).
pub const UDP_HLEN: usize = 8;

/// Minimum TCP header length.
pub const TCP_MIN_HLEN: usize = 20;

/// Start of the transport header in the staging buffer.
pub const TRANSPORT_OFFSET: usize = ETH_HLEN + IPV4_HLEN;

/// Offset of the IPv4 total-length field.
pub const IPV4_LEN_OFFSET: usize = ETH_HLEN + 2;

/// Offset of the IPv4 source address; the destination follows directly.
pub const IPV4_SRC_OFFSET: usize = ETH_HLEN + 12;

/// Offset of the TCP data-offset byte (high nibble).
pub const TCP_DATA_OFFSET: usize = TRANSPORT_OFFSET + 12;

/// Length of an ARP request/reply frame.
pub const ARP_FRAME_LEN: usize = ETH_HLEN + 28;

/// MAC address type.
pub type MacAddress = [u8; ETH_ALEN];

/// Read the ethertype of the frame at the start of `buf`.
///
/// Returns `None` for runts shorter than an Ethernet header.
pub fn ethertype(buf: &[u8]) -> Option<EthernetProtocol> {
    EthernetFrame::new_checked(buf)
        .ok()
        .map(|frame| frame.ethertype())
}
