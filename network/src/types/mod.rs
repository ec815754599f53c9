//! Shared data types module.
//!
//! Header geometry of the frames held in the staging buffer.

pub mod ethernet;

// Re-exports
pub use ethernet::{
    ethertype, MacAddress, ARP_FRAME_LEN, ETH_ALEN, ETH_HLEN, IPV4_HLEN, TRANSPORT_OFFSET,
    UDP_HLEN,
};
