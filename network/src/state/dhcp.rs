//! DHCP lease monitor.
//!
//! Wraps an external DHCP client. The client owns the lease timeline and its
//! own retry policy; the monitor only asks it, once per poll, whether
//! anything changed and hands back the new identity on renew/rebind.
//!
//! Only a client that ran discovery at bring-up is polled. An attached
//! client on a statically addressed interface stays idle.
//!
//! # Outcomes
//! NoAction | Renewed | Rebound | RenewFailed | RebindFailed | Other(code)

use core::net::Ipv4Addr;

use crate::stack::NetworkIdentity;
use crate::types::MacAddress;

/// Result of one lease check, returned verbatim by `maintain()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LeaseStatus {
    /// Nothing to do (also returned when no DHCP client is configured).
    #[default]
    NoAction,
    /// Renewal was attempted and failed; the client retries on its own.
    RenewFailed,
    /// Lease renewed with the same server.
    Renewed,
    /// Rebinding was attempted and failed.
    RebindFailed,
    /// Lease rebound, possibly with new parameters.
    Rebound,
    /// A code outside the standard set, kept as the client reported it.
    Other(u8),
}

impl LeaseStatus {
    /// Numeric code as used by Arduino-style DHCP clients.
    pub fn code(self) -> u8 {
        match self {
            LeaseStatus::NoAction => 0,
            LeaseStatus::RenewFailed => 1,
            LeaseStatus::Renewed => 2,
            LeaseStatus::RebindFailed => 3,
            LeaseStatus::Rebound => 4,
            LeaseStatus::Other(code) => code,
        }
    }

    /// Parse a numeric code. Unknown codes are kept in `Other`.
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => LeaseStatus::NoAction,
            1 => LeaseStatus::RenewFailed,
            2 => LeaseStatus::Renewed,
            3 => LeaseStatus::RebindFailed,
            4 => LeaseStatus::Rebound,
            other => LeaseStatus::Other(other),
        }
    }

    /// Whether the identity must be re-read from the client.
    pub fn is_refreshed(self) -> bool {
        matches!(self, LeaseStatus::Renewed | LeaseStatus::Rebound)
    }

    pub fn is_failure(self) -> bool {
        matches!(
            self,
            LeaseStatus::RenewFailed | LeaseStatus::RebindFailed | LeaseStatus::Other(_)
        )
    }
}

impl From<LeaseStatus> for u8 {
    fn from(status: LeaseStatus) -> Self {
        status.code()
    }
}

/// External DHCP client.
pub trait DhcpClient {
    /// Run discovery to completion. Returns `true` once a lease is held.
    fn begin_with_dhcp(&mut self, mac: MacAddress) -> bool;

    /// Advance the lease timeline; renews or rebinds when due.
    fn check_lease(&mut self) -> LeaseStatus;

    fn local_ip(&self) -> Ipv4Addr;
    fn dns_ip(&self) -> Ipv4Addr;
    fn gateway_ip(&self) -> Ipv4Addr;
    fn subnet_mask(&self) -> Ipv4Addr;

    /// Identity granted by the current lease.
    fn identity(&self) -> NetworkIdentity {
        NetworkIdentity {
            ip: self.local_ip(),
            netmask: self.subnet_mask(),
            gateway: self.gateway_ip(),
            dns: self.dns_ip(),
        }
    }
}

/// Placeholder client type for statically addressed interfaces.
///
/// Uninhabited: a monitor over `NoDhcp` is always disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoDhcp {}

impl DhcpClient for NoDhcp {
    fn begin_with_dhcp(&mut self, _mac: MacAddress) -> bool {
        match *self {}
    }

    fn check_lease(&mut self) -> LeaseStatus {
        match *self {}
    }

    fn local_ip(&self) -> Ipv4Addr {
        match *self {}
    }

    fn dns_ip(&self) -> Ipv4Addr {
        match *self {}
    }

    fn gateway_ip(&self) -> Ipv4Addr {
        match *self {}
    }

    fn subnet_mask(&self) -> Ipv4Addr {
        match *self {}
    }
}

/// Polls the DHCP client configured at bring-up, if any.
#[derive(Debug)]
pub struct LeaseMonitor<D> {
    client: Option<D>,
    /// Set once discovery ran; cleared by static bring-up.
    active: bool,
}

impl<D> LeaseMonitor<D> {
    /// Monitor for static addressing; every poll is `NoAction`.
    pub const fn disabled() -> Self {
        Self {
            client: None,
            active: false,
        }
    }

    /// Attach `client`. It is not polled until [`begin`](Self::begin) runs.
    pub const fn new(client: D) -> Self {
        Self {
            client: Some(client),
            active: false,
        }
    }

    /// Whether a client is attached.
    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    /// Whether polls reach the client.
    pub fn is_active(&self) -> bool {
        self.active && self.client.is_some()
    }

    /// Stop polling; the client stays attached.
    pub fn stop(&mut self) {
        self.active = false;
    }

    pub fn client(&self) -> Option<&D> {
        self.client.as_ref()
    }

    pub fn client_mut(&mut self) -> Option<&mut D> {
        self.client.as_mut()
    }
}

impl<D: DhcpClient> LeaseMonitor<D> {
    /// Acquire the first lease.
    ///
    /// Returns the granted identity, or `None` if discovery failed. The
    /// client stays configured either way so later polls keep trying.
    pub fn begin(&mut self, mac: MacAddress) -> Option<NetworkIdentity> {
        let client = self.client.as_mut()?;
        self.active = true;
        if client.begin_with_dhcp(mac) {
            Some(client.identity())
        } else {
            None
        }
    }

    /// Check the lease once.
    ///
    /// # Returns
    /// The client's status, plus the identity to re-apply when the lease was
    /// renewed or rebound.
    pub fn poll(&mut self) -> (LeaseStatus, Option<NetworkIdentity>) {
        if !self.active {
            return (LeaseStatus::NoAction, None);
        }
        let Some(client) = self.client.as_mut() else {
            return (LeaseStatus::NoAction, None);
        };

        let status = client.check_lease();
        match status {
            LeaseStatus::NoAction => (status, None),
            LeaseStatus::Renewed | LeaseStatus::Rebound => (status, Some(client.identity())),
            LeaseStatus::RenewFailed | LeaseStatus::RebindFailed | LeaseStatus::Other(_) => {
                log::warn!("DHCP lease check failed: {:?}", status);
                (status, None)
            }
        }
    }
}

impl<D> Default for LeaseMonitor<D> {
    fn default() -> Self {
        Self::disabled()
    }
}
