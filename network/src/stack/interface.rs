//! Ethernet interface.
//!
//! Owns the bridge context, the protocol engine, packet memory and the
//! clock, and exposes the calls an application makes: bring-up, the polling
//! entry points and the current addressing.
//!
//! # Usage
//!
//! ```ignore
//! use uipnet_network::{EthernetInterface, NetConfig};
//!
//! let mut iface = EthernetInterface::new(engine, memory, clock);
//! iface.begin(mac, NetConfig::static_ip(Ipv4Addr::new(192, 168, 0, 6)))?;
//!
//! loop {
//!     iface.maintain();
//! }
//! ```

use core::net::Ipv4Addr;

use crate::buffer::{self, BridgeContext, SendOutcome, STAGING_BUFFER_SIZE};
use crate::device::PacketMemory;
use crate::error::{NetworkError, Result};
use crate::mainloop::{self, TickReport};
use crate::state::{DhcpClient, LeaseMonitor, LeaseStatus, NoDhcp};
use crate::time::Clock;
use crate::types::MacAddress;

use super::{Output, ProtocolEngine};

/// Addressing applied to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkIdentity {
    pub ip: Ipv4Addr,
    pub netmask: Ipv4Addr,
    pub gateway: Ipv4Addr,
    pub dns: Ipv4Addr,
}

impl NetworkIdentity {
    /// Netmask used when none is given.
    pub const DEFAULT_NETMASK: Ipv4Addr = Ipv4Addr::new(255, 255, 255, 0);

    pub const fn new(ip: Ipv4Addr, dns: Ipv4Addr, gateway: Ipv4Addr, netmask: Ipv4Addr) -> Self {
        Self {
            ip,
            netmask,
            gateway,
            dns,
        }
    }

    /// Address only; DNS and gateway are `.1` of the address's /24.
    pub fn from_ip(ip: Ipv4Addr) -> Self {
        Self::with_dns(ip, first_host(ip))
    }

    /// Address and DNS; the gateway is `.1` of the address's /24.
    pub fn with_dns(ip: Ipv4Addr, dns: Ipv4Addr) -> Self {
        Self::with_gateway(ip, dns, first_host(ip))
    }

    /// Address, DNS and gateway with the default netmask.
    pub fn with_gateway(ip: Ipv4Addr, dns: Ipv4Addr, gateway: Ipv4Addr) -> Self {
        Self::new(ip, dns, gateway, Self::DEFAULT_NETMASK)
    }

    /// Number of leading one bits in the netmask.
    pub fn prefix_len(&self) -> u8 {
        u32::from(self.netmask).leading_ones() as u8
    }
}

fn first_host(ip: Ipv4Addr) -> Ipv4Addr {
    let [a, b, c, _] = ip.octets();
    Ipv4Addr::new(a, b, c, 1)
}

/// How the interface obtains its addressing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetConfig {
    /// Lease from the interface's DHCP client.
    Dhcp,
    /// Fixed addressing.
    Static(NetworkIdentity),
}

impl NetConfig {
    /// Create DHCP configuration.
    pub fn dhcp() -> Self {
        Self::Dhcp
    }

    /// Static address; everything else defaulted.
    pub fn static_ip(ip: Ipv4Addr) -> Self {
        Self::Static(NetworkIdentity::from_ip(ip))
    }

    pub fn static_with_dns(ip: Ipv4Addr, dns: Ipv4Addr) -> Self {
        Self::Static(NetworkIdentity::with_dns(ip, dns))
    }

    pub fn static_with_gateway(ip: Ipv4Addr, dns: Ipv4Addr, gateway: Ipv4Addr) -> Self {
        Self::Static(NetworkIdentity::with_gateway(ip, dns, gateway))
    }

    pub fn static_full(ip: Ipv4Addr, dns: Ipv4Addr, gateway: Ipv4Addr, subnet: Ipv4Addr) -> Self {
        Self::Static(NetworkIdentity::new(ip, dns, gateway, subnet))
    }
}

/// Interface bring-up state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceState {
    /// `begin` not called yet.
    Unconfigured,
    /// Hardware is up but the first DHCP lease failed; `maintain` keeps trying.
    LeasePending,
    /// Addressing applied.
    Ready,
}

/// The single Ethernet interface.
pub struct EthernetInterface<E, M, C, D = NoDhcp, const N: usize = STAGING_BUFFER_SIZE> {
    ctx: BridgeContext<N>,
    engine: E,
    memory: M,
    clock: C,
    lease: LeaseMonitor<D>,
    dns: Ipv4Addr,
    mac: Option<MacAddress>,
    state: InterfaceState,
}

impl<E, M, C> EthernetInterface<E, M, C>
where
    E: ProtocolEngine,
    M: PacketMemory,
    C: Clock,
{
    /// Interface with the default staging buffer and no DHCP client.
    pub fn new(engine: E, memory: M, clock: C) -> Self {
        Self::with_context(BridgeContext::new(), engine, memory, clock)
    }
}

impl<E, M, C, const N: usize> EthernetInterface<E, M, C, NoDhcp, N>
where
    E: ProtocolEngine,
    M: PacketMemory,
    C: Clock,
{
    /// Interface over a prepared context (custom buffer size or interval).
    pub fn with_context(ctx: BridgeContext<N>, engine: E, memory: M, clock: C) -> Self {
        Self {
            ctx,
            engine,
            memory,
            clock,
            lease: LeaseMonitor::disabled(),
            dns: Ipv4Addr::UNSPECIFIED,
            mac: None,
            state: InterfaceState::Unconfigured,
        }
    }

    /// Attach a DHCP client for [`NetConfig::Dhcp`].
    ///
    /// The client is only polled after a DHCP bring-up.
    pub fn with_dhcp<D: DhcpClient>(self, client: D) -> EthernetInterface<E, M, C, D, N> {
        EthernetInterface {
            ctx: self.ctx,
            engine: self.engine,
            memory: self.memory,
            clock: self.clock,
            lease: LeaseMonitor::new(client),
            dns: self.dns,
            mac: self.mac,
            state: self.state,
        }
    }
}

impl<E, M, C, D, const N: usize> EthernetInterface<E, M, C, D, N>
where
    E: ProtocolEngine,
    M: PacketMemory,
    C: Clock,
    D: DhcpClient,
{
    /// Bring up the hardware and engine, then apply `config`.
    ///
    /// # Errors
    /// `DhcpFailed` if no lease could be obtained. The interface is still
    /// usable and `maintain` keeps polling the DHCP client.
    pub fn begin(&mut self, mac: MacAddress, config: NetConfig) -> Result<()> {
        self.init(mac);

        match config {
            NetConfig::Static(identity) => {
                self.lease.stop();
                self.configure(identity);
                Ok(())
            }
            NetConfig::Dhcp => match self.lease.begin(mac) {
                Some(identity) => {
                    self.configure(identity);
                    Ok(())
                }
                None => {
                    if self.lease.is_enabled() {
                        log::warn!("DHCP: no lease obtained, will keep polling");
                    } else {
                        log::warn!("DHCP requested but no client attached");
                    }
                    self.state = InterfaceState::LeasePending;
                    Err(NetworkError::DhcpFailed)
                }
            },
        }
    }

    /// Bring up with fixed addressing.
    ///
    /// An attached DHCP client is not polled afterwards.
    pub fn begin_static(&mut self, mac: MacAddress, identity: NetworkIdentity) {
        self.init(mac);
        self.lease.stop();
        self.configure(identity);
    }

    /// Install `client` and bring up with DHCP.
    ///
    /// The client stays installed even if this returns an error.
    pub fn begin_dhcp(&mut self, mac: MacAddress, client: D) -> Result<()> {
        self.lease = LeaseMonitor::new(client);
        self.begin(mac, NetConfig::Dhcp)
    }

    fn init(&mut self, mac: MacAddress) {
        self.ctx.arm_timer(self.clock.now_ms());
        self.memory.init(mac);
        self.engine.set_link_address(mac);
        self.engine.init();
        self.mac = Some(mac);
        self.state = InterfaceState::LeasePending;
        log::info!(
            "Interface up: {:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            mac[0],
            mac[1],
            mac[2],
            mac[3],
            mac[4],
            mac[5]
        );
    }

    /// Apply `identity` to the engine. DNS is kept here.
    pub fn configure(&mut self, identity: NetworkIdentity) {
        self.engine.set_host_addr(identity.ip);
        self.engine.set_default_router(identity.gateway);
        self.engine.set_netmask(identity.netmask);
        self.dns = identity.dns;
        self.state = InterfaceState::Ready;
        log::info!(
            "Configured {}/{} gw {} dns {}",
            identity.ip,
            identity.prefix_len(),
            identity.gateway,
            identity.dns
        );
    }

    /// One scheduler iteration.
    pub fn tick(&mut self) -> TickReport {
        mainloop::tick(&mut self.ctx, &mut self.engine, &mut self.memory, &self.clock)
    }

    /// Tick, then poll the DHCP client if bring-up used DHCP.
    ///
    /// Returns the lease status unchanged. On renew or rebind the new
    /// addressing is applied before returning.
    pub fn maintain(&mut self) -> LeaseStatus {
        self.tick();

        let (status, identity) = self.lease.poll();
        if let Some(identity) = identity {
            log::info!("DHCP lease {:?}", status);
            self.configure(identity);
        }
        status
    }

    /// Send a frame the application built in the staging buffer.
    ///
    /// # Errors
    /// `NotInitialized` before `begin`.
    pub fn send(&mut self, output: &Output) -> Result<SendOutcome> {
        if self.mac.is_none() {
            return Err(NetworkError::NotInitialized);
        }
        self.ctx.begin_cycle(None);
        self.ctx.record(output);
        Ok(buffer::send(&mut self.ctx, &mut self.memory, output))
    }
}

impl<E, M, C, D, const N: usize> EthernetInterface<E, M, C, D, N>
where
    E: ProtocolEngine,
{
    pub fn state(&self) -> InterfaceState {
        self.state
    }

    pub fn has_ip(&self) -> bool {
        self.state == InterfaceState::Ready
    }

    pub fn local_ip(&self) -> Ipv4Addr {
        self.engine.host_addr()
    }

    pub fn subnet_mask(&self) -> Ipv4Addr {
        self.engine.netmask()
    }

    pub fn gateway_ip(&self) -> Ipv4Addr {
        self.engine.default_router()
    }

    pub fn dns_server_ip(&self) -> Ipv4Addr {
        self.dns
    }

    /// Station address, once `begin` ran.
    pub fn mac_address(&self) -> Option<MacAddress> {
        self.mac
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn memory(&self) -> &M {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut M {
        &mut self.memory
    }

    pub fn dhcp(&self) -> Option<&D> {
        self.lease.client()
    }

    pub fn context(&self) -> &BridgeContext<N> {
        &self.ctx
    }

    /// Staging buffer, for building frames to pass to [`send`](Self::send).
    pub fn staging_mut(&mut self) -> &mut [u8] {
        self.ctx.staging.as_mut_slice()
    }
}
