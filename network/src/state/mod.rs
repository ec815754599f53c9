//! Lease monitoring.
//!
//! The only state machine the bridge drives besides the scheduler: polling an
//! external DHCP client once per `maintain()` and re-applying the network
//! identity when the lease moves.

pub mod dhcp;

pub use dhcp::{DhcpClient, LeaseMonitor, LeaseStatus, NoDhcp};
