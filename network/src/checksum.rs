//! Internet checksum engine.
//!
//! 16-bit one's-complement sums over the staging buffer, continued into the
//! packet memory domain when a frame does not fit locally.
//!
//! All sums are returned in host order. Callers write them to the wire with
//! `to_be_bytes()` after complementing, and verify received headers by
//! comparing the sum against `0xFFFF`.
//!
//! # Reference
//! RFC 1071: Computing the Internet Checksum

use smoltcp::wire::{IpProtocol, Ipv4Packet};

use crate::device::{PacketHandle, PartialChecksum};
use crate::types::ethernet::{
    ETH_HLEN, IPV4_HLEN, IPV4_SRC_OFFSET, TCP_DATA_OFFSET, TRANSPORT_OFFSET, UDP_HLEN,
};

/// Length of the source + destination address block in the pseudo-header.
const PSEUDO_ADDR_LEN: usize = 8;

/// Add one 16-bit word with end-around carry.
#[inline]
fn add_word(sum: u16, word: u16) -> u16 {
    let (sum, carry) = sum.overflowing_add(word);
    sum + carry as u16
}

/// Continue a running one's-complement sum over `data`.
///
/// Bytes are taken pairwise as big-endian words. A trailing odd byte is the
/// high half of a word whose low half is zero.
///
/// Continuing a sum is only equivalent to summing the concatenation when the
/// first range has even length; the callers in this crate keep their split
/// points even.
pub fn checksum(sum: u16, data: &[u8]) -> u16 {
    let mut chunks = data.chunks_exact(2);
    let mut sum = chunks
        .by_ref()
        .fold(sum, |acc, pair| add_word(acc, u16::from_be_bytes([pair[0], pair[1]])));

    if let [last] = chunks.remainder() {
        sum = add_word(sum, u16::from_be_bytes([*last, 0]));
    }

    sum
}

/// Map a zero sum to `0xFFFF`; zero is reserved on the wire for "no checksum".
#[inline]
fn finish(sum: u16) -> u16 {
    if sum == 0 {
        0xFFFF
    } else {
        sum
    }
}

/// Sum the IPv4 header in the staging buffer.
///
/// A short buffer contributes only the bytes it has.
pub fn ip_header_checksum(buf: &[u8]) -> u16 {
    let end = (ETH_HLEN + IPV4_HLEN).min(buf.len());
    let header = buf.get(ETH_HLEN..end).unwrap_or(&[]);
    finish(checksum(0, header))
}

/// Transport payload length declared by the IPv4 header.
///
/// Taken from the total-length field, not from how much of the frame is
/// resident locally.
pub fn upper_layer_len(buf: &[u8]) -> usize {
    match buf.get(ETH_HLEN..TRANSPORT_OFFSET) {
        Some(header) => (Ipv4Packet::new_unchecked(header).total_len() as usize)
            .saturating_sub(IPV4_HLEN),
        None => 0,
    }
}

/// How many bytes of the transport segment the engine keeps in the staging
/// buffer, by protocol convention.
///
/// TCP keeps only its header, whose length comes from the 4-bit data offset.
/// That field is not validated by the engine, so the result is clamped to the
/// declared segment length and to what the buffer physically holds.
fn resident_len(buf: &[u8], protocol: IpProtocol, upper_len: usize) -> usize {
    let conventional = match protocol {
        IpProtocol::Tcp => buf
            .get(TCP_DATA_OFFSET)
            .map(|offset| ((offset >> 4) as usize) << 2)
            .unwrap_or(0),
        IpProtocol::Udp => UDP_HLEN,
        _ => upper_len,
    };
    let available = buf.len().saturating_sub(TRANSPORT_OFFSET);
    let local = conventional.min(upper_len).min(available);

    // The remote continuation must start on a word boundary
    if local < upper_len {
        local & !1
    } else {
        local
    }
}

/// Checksum of a TCP/UDP/ICMP segment including the IPv4 pseudo-header.
///
/// Sums whatever part of the segment is resident in `buf`, then delegates
/// the rest of the declared length to `memory`, starting at the byte where
/// local data ended. Nothing is copied out of packet memory.
///
/// # Arguments
/// - `buf`: staging buffer, starting with the Ethernet header
/// - `protocol`: transport protocol summed into the pseudo-header
/// - `handle`: block holding the full frame; `None` if nothing is remote
/// - `memory`: packet memory used for the continuation
///
/// # Returns
/// Host-order sum, `0xFFFF` in place of zero.
pub fn transport_checksum(
    buf: &[u8],
    protocol: IpProtocol,
    handle: Option<PacketHandle>,
    memory: &mut dyn PartialChecksum,
) -> u16 {
    let upper_len = upper_layer_len(buf);

    // Pseudo-header: length + protocol, then source and destination addresses.
    // The length field is 16 bits on the wire, so truncation matches it.
    let mut sum = add_word(upper_len as u16, u8::from(protocol) as u16);
    if let Some(addrs) = buf.get(IPV4_SRC_OFFSET..IPV4_SRC_OFFSET + PSEUDO_ADDR_LEN) {
        sum = checksum(sum, addrs);
    }

    let local = resident_len(buf, protocol, upper_len);
    let segment = buf
        .get(TRANSPORT_OFFSET..TRANSPORT_OFFSET + local)
        .unwrap_or(&[]);
    sum = checksum(sum, segment);
    log::trace!(
        "chksum {} local [{}..{}] = {:#06x}",
        protocol,
        TRANSPORT_OFFSET,
        TRANSPORT_OFFSET + local,
        sum
    );

    if local < upper_len {
        let offset = TRANSPORT_OFFSET + local;
        let remaining = upper_len - local;
        match handle {
            Some(handle) => {
                sum = memory.partial_checksum(sum, handle, offset, remaining);
                log::trace!(
                    "chksum {} remote {} [{}..{}] = {:#06x}",
                    protocol,
                    handle,
                    offset,
                    offset + remaining,
                    sum
                );
            }
            None => {
                log::warn!(
                    "chksum {}: {} bytes beyond staging buffer but no packet handle",
                    protocol,
                    remaining
                );
            }
        }
    }

    finish(sum)
}
