//! uipnet Network Bridge
//!
//! Glue between a minimal, synchronous uIP-style TCP/IP engine (one staging
//! buffer, no concurrency of its own) and a NIC whose packet storage lives in
//! a separate memory domain addressed through opaque handles.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  EthernetInterface                          │
//! │  (bring-up, maintain(), address accessors)                  │
//! └─────────────────────────────────────────────────────────────┘
//!            │                                   │
//!            ▼                                   ▼
//! ┌──────────────────────────┐       ┌──────────────────────────┐
//! │  mainloop::tick          │       │  state::LeaseMonitor     │
//! │  (intake, dispatch,      │       │  (DHCP lease polling)    │
//! │   release, periodic)     │       └──────────────────────────┘
//! └──────────────────────────┘
//!            │
//!            ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  buffer::BridgeContext + buffer::send                       │
//! │  (staging buffer, in-flight handle, packet state)           │
//! └─────────────────────────────────────────────────────────────┘
//!            │                                   │
//!            ▼                                   ▼
//! ┌──────────────────────────┐       ┌──────────────────────────┐
//! │  stack::ProtocolEngine   │       │  device::PacketMemory    │
//! │  (uIP input/periodic/ARP)│       │  (alloc/read/write/tx)   │
//! └──────────────────────────┘       └──────────────────────────┘
//! ```
//!
//! Checksums computed by the engine go through [`stack::Frame`], which sums
//! what is resident in the staging buffer and hands the remainder to the
//! memory manager's own [`device::PartialChecksum`].
//!
//! # Concurrency
//!
//! Single-threaded and cooperative. Every core operation takes the context by
//! `&mut`, so the scheduler cannot be re-entered from safe code. Calling
//! `tick()` from an interrupt handler while another `tick()` is running is
//! not supported; embedders that share the interface with an ISR must keep
//! the ISR away from it.
//!
//! # Usage
//!
//! ```ignore
//! use uipnet_network::{EthernetInterface, NetConfig};
//!
//! let mut iface = EthernetInterface::new(engine, enc28j60, clock);
//! iface.begin(mac, NetConfig::static_ip(Ipv4Addr::new(192, 168, 0, 6)))?;
//!
//! loop {
//!     iface.maintain();
//! }
//! ```

#![cfg_attr(not(test), no_std)]

pub mod buffer;
pub mod checksum;
pub mod device;
pub mod error;
pub mod mainloop;
pub mod stack;
pub mod state;
pub mod time;
pub mod types;

pub use buffer::{BridgeContext, PacketState, SendOutcome, StagingBuffer, STAGING_BUFFER_SIZE};
pub use device::{PacketHandle, PacketMemory, PartialChecksum};
pub use error::{NetworkError, Result};
pub use mainloop::{tick, TickReport};
pub use stack::{
    EthernetInterface, Frame, InterfaceState, NetConfig, NetworkIdentity, Output, ProtocolEngine,
};
pub use state::{DhcpClient, LeaseMonitor, LeaseStatus, NoDhcp};
pub use time::{Clock, PeriodicTimer, PERIODIC_INTERVAL_MS};
pub use types::MacAddress;
