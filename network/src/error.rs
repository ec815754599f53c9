//! Network error types

use core::fmt;

pub type Result<T> = core::result::Result<T, NetworkError>;

/// Bring-up and configuration failures.
///
/// Routine conditions (no inbound packet, a periodic step with nothing to
/// send, an unsupported ethertype) never surface here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkError {
    /// The DHCP client could not obtain a lease.
    DhcpFailed,
    /// Staging buffer cannot hold the link + network headers.
    BufferTooSmall {
        /// Minimum capacity the bridge needs.
        needed: usize,
        /// Capacity that was configured.
        capacity: usize,
    },
    /// Interface used before `begin`.
    NotInitialized,
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DhcpFailed => write!(f, "DHCP lease could not be obtained"),
            Self::BufferTooSmall { needed, capacity } => write!(
                f,
                "Staging buffer too small: need {} bytes, have {}",
                needed, capacity
            ),
            Self::NotInitialized => write!(f, "Interface not initialized"),
        }
    }
}
