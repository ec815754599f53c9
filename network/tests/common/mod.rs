//! Common test utilities: in-memory packet memory, scripted engine, clock
//! and DHCP client.

#![allow(dead_code)]

use std::cell::Cell;
use std::collections::{BTreeMap, VecDeque};
use std::net::Ipv4Addr;

use uipnet_network::checksum::checksum;
use uipnet_network::{
    Clock, DhcpClient, Frame, LeaseStatus, MacAddress, NetworkIdentity, Output, PacketHandle,
    PacketMemory, PartialChecksum, ProtocolEngine,
};

pub const MAC: MacAddress = [0x02, 0x00, 0x5e, 0x10, 0x00, 0x01];

/// Calls observed by [`RecordingMemory`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemCall {
    Init(MacAddress),
    Receive(Option<u8>),
    SizeOf(u8),
    Read(u8, usize, usize),
    Alloc(usize),
    Write(u8, usize, usize),
    Transmit(u8),
    Free(u8),
    PartialChecksum(u8, usize, usize),
}

/// Packet memory backed by a map of blocks.
///
/// Received frames are queued with [`push_rx`](Self::push_rx). Transmitted
/// blocks are snapshotted so tests can compare bytes on the wire.
#[derive(Debug, Default)]
pub struct RecordingMemory {
    pub calls: Vec<MemCall>,
    pub blocks: BTreeMap<u8, Vec<u8>>,
    pub rx_queue: VecDeque<u8>,
    pub transmitted: Vec<Vec<u8>>,
    /// Remaining allocations; `None` is unlimited.
    pub alloc_budget: Option<usize>,
    next_block: u8,
}

impl RecordingMemory {
    pub fn new() -> Self {
        Self {
            next_block: 1,
            ..Self::default()
        }
    }

    /// Queue a received frame; returns its handle.
    pub fn push_rx(&mut self, frame: Vec<u8>) -> PacketHandle {
        let raw = self.take_block_number();
        self.blocks.insert(raw, frame);
        self.rx_queue.push_back(raw);
        PacketHandle::new(raw)
    }

    fn take_block_number(&mut self) -> u8 {
        let raw = self.next_block.max(1);
        self.next_block = raw + 1;
        raw
    }

    pub fn count(&self, pred: impl Fn(&MemCall) -> bool) -> usize {
        self.calls.iter().filter(|call| pred(call)).count()
    }

    pub fn transmits(&self) -> usize {
        self.count(|c| matches!(c, MemCall::Transmit(_)))
    }

    pub fn frees(&self) -> Vec<u8> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                MemCall::Free(raw) => Some(*raw),
                _ => None,
            })
            .collect()
    }

    pub fn allocs(&self) -> usize {
        self.count(|c| matches!(c, MemCall::Alloc(_)))
    }

    pub fn position(&self, call: &MemCall) -> Option<usize> {
        self.calls.iter().position(|c| c == call)
    }

    /// Whether every block handed out was freed.
    pub fn all_freed(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl PartialChecksum for RecordingMemory {
    fn partial_checksum(&mut self, seed: u16, handle: PacketHandle, offset: usize, len: usize) -> u16 {
        self.calls
            .push(MemCall::PartialChecksum(handle.raw(), offset, len));
        let block = &self.blocks[&handle.raw()];
        checksum(seed, &block[offset..offset + len])
    }
}

impl PacketMemory for RecordingMemory {
    fn init(&mut self, mac: MacAddress) {
        self.calls.push(MemCall::Init(mac));
    }

    fn receive(&mut self) -> Option<PacketHandle> {
        let raw = self.rx_queue.pop_front();
        self.calls.push(MemCall::Receive(raw));
        raw.map(PacketHandle::new)
    }

    fn size_of(&mut self, handle: PacketHandle) -> usize {
        self.calls.push(MemCall::SizeOf(handle.raw()));
        self.blocks.get(&handle.raw()).map_or(0, Vec::len)
    }

    fn read(&mut self, handle: PacketHandle, offset: usize, dst: &mut [u8]) -> usize {
        self.calls.push(MemCall::Read(handle.raw(), offset, dst.len()));
        let block = &self.blocks[&handle.raw()];
        let n = dst.len().min(block.len().saturating_sub(offset));
        dst[..n].copy_from_slice(&block[offset..offset + n]);
        n
    }

    fn alloc(&mut self, len: usize) -> Option<PacketHandle> {
        self.calls.push(MemCall::Alloc(len));
        if let Some(budget) = self.alloc_budget.as_mut() {
            if *budget == 0 {
                return None;
            }
            *budget -= 1;
        }
        let raw = self.take_block_number();
        self.blocks.insert(raw, vec![0; len]);
        Some(PacketHandle::new(raw))
    }

    fn write(&mut self, handle: PacketHandle, offset: usize, src: &[u8]) -> usize {
        self.calls.push(MemCall::Write(handle.raw(), offset, src.len()));
        let block = self.blocks.get_mut(&handle.raw()).expect("write to unknown block");
        if block.len() < offset + src.len() {
            block.resize(offset + src.len(), 0);
        }
        block[offset..offset + src.len()].copy_from_slice(src);
        src.len()
    }

    fn transmit(&mut self, handle: PacketHandle) {
        self.calls.push(MemCall::Transmit(handle.raw()));
        self.transmitted.push(self.blocks[&handle.raw()].clone());
    }

    fn free(&mut self, handle: PacketHandle) {
        self.calls.push(MemCall::Free(handle.raw()));
        assert!(
            self.blocks.remove(&handle.raw()).is_some(),
            "double free of {}",
            handle
        );
    }
}

/// Calls observed by [`ScriptedEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    Init,
    SetLinkAddress(MacAddress),
    SetHostAddr(Ipv4Addr),
    SetNetmask(Ipv4Addr),
    SetDefaultRouter(Ipv4Addr),
    ResolveForInbound,
    Input,
    Periodic(usize),
    DatagramPeriodic(usize),
    ResolveForOutbound,
    ArpInput,
}

/// Protocol engine that replays canned outputs.
///
/// Whenever it reports output it first fills the staging buffer with
/// `fill_byte`, so tests can recognise its frames on the wire.
#[derive(Debug)]
pub struct ScriptedEngine {
    pub calls: Vec<EngineCall>,
    pub connections: usize,
    pub datagrams: usize,
    pub input_output: Output,
    pub arp_output: Output,
    pub periodic_outputs: BTreeMap<usize, Output>,
    pub datagram_outputs: BTreeMap<usize, Output>,
    /// Replaces the output of `resolve_for_outbound` (e.g. an ARP request).
    pub outbound_override: Option<Output>,
    pub fill_byte: u8,
    /// (declared length, resident bytes, handle) seen by `input`.
    pub seen: Vec<(usize, Vec<u8>, Option<PacketHandle>)>,
    /// TCP checksum computed during `input`, if requested.
    pub compute_tcp_checksum: bool,
    pub tcp_checksums: Vec<u16>,
    pub host: Ipv4Addr,
    pub mask: Ipv4Addr,
    pub router: Ipv4Addr,
}

impl ScriptedEngine {
    pub fn new(connections: usize) -> Self {
        Self {
            calls: Vec::new(),
            connections,
            datagrams: 0,
            input_output: Output::none(),
            arp_output: Output::none(),
            periodic_outputs: BTreeMap::new(),
            datagram_outputs: BTreeMap::new(),
            outbound_override: None,
            fill_byte: 0xEE,
            seen: Vec::new(),
            compute_tcp_checksum: false,
            tcp_checksums: Vec::new(),
            host: Ipv4Addr::UNSPECIFIED,
            mask: Ipv4Addr::UNSPECIFIED,
            router: Ipv4Addr::UNSPECIFIED,
        }
    }

    pub fn count(&self, call: &EngineCall) -> usize {
        self.calls.iter().filter(|c| *c == call).count()
    }

    pub fn periodic_slots(&self) -> Vec<usize> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                EngineCall::Periodic(slot) => Some(*slot),
                _ => None,
            })
            .collect()
    }

    fn produce(&self, frame: &mut Frame<'_>, output: Output) -> Output {
        if output.has_data() {
            let buf = frame.buffer_mut();
            let n = output.header_len.min(buf.len());
            buf[..n].fill(self.fill_byte);
        }
        output
    }
}

impl ProtocolEngine for ScriptedEngine {
    fn init(&mut self) {
        self.calls.push(EngineCall::Init);
    }

    fn set_link_address(&mut self, mac: MacAddress) {
        self.calls.push(EngineCall::SetLinkAddress(mac));
    }

    fn set_host_addr(&mut self, addr: Ipv4Addr) {
        self.calls.push(EngineCall::SetHostAddr(addr));
        self.host = addr;
    }

    fn set_netmask(&mut self, mask: Ipv4Addr) {
        self.calls.push(EngineCall::SetNetmask(mask));
        self.mask = mask;
    }

    fn set_default_router(&mut self, addr: Ipv4Addr) {
        self.calls.push(EngineCall::SetDefaultRouter(addr));
        self.router = addr;
    }

    fn host_addr(&self) -> Ipv4Addr {
        self.host
    }

    fn netmask(&self) -> Ipv4Addr {
        self.mask
    }

    fn default_router(&self) -> Ipv4Addr {
        self.router
    }

    fn connection_count(&self) -> usize {
        self.connections
    }

    fn datagram_count(&self) -> usize {
        self.datagrams
    }

    fn resolve_for_inbound(&mut self, _frame: &Frame<'_>) {
        self.calls.push(EngineCall::ResolveForInbound);
    }

    fn input(&mut self, frame: &mut Frame<'_>) -> Output {
        self.calls.push(EngineCall::Input);
        self.seen
            .push((frame.len(), frame.data().to_vec(), frame.packet_handle()));
        if self.compute_tcp_checksum {
            let sum = frame.tcp_checksum();
            self.tcp_checksums.push(sum);
        }
        self.produce(frame, self.input_output)
    }

    fn periodic(&mut self, slot: usize, frame: &mut Frame<'_>) -> Output {
        self.calls.push(EngineCall::Periodic(slot));
        let output = self.periodic_outputs.get(&slot).copied().unwrap_or_default();
        self.produce(frame, output)
    }

    fn datagram_periodic(&mut self, slot: usize, frame: &mut Frame<'_>) -> Output {
        self.calls.push(EngineCall::DatagramPeriodic(slot));
        let output = self.datagram_outputs.get(&slot).copied().unwrap_or_default();
        self.produce(frame, output)
    }

    fn resolve_for_outbound(&mut self, frame: &mut Frame<'_>, output: Output) -> Output {
        self.calls.push(EngineCall::ResolveForOutbound);
        match self.outbound_override {
            Some(replacement) => self.produce(frame, replacement),
            None => output,
        }
    }

    fn arp_input(&mut self, frame: &mut Frame<'_>) -> Output {
        self.calls.push(EngineCall::ArpInput);
        self.produce(frame, self.arp_output)
    }
}

/// Clock the test advances by hand.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<u64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

impl Clock for &ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

/// DHCP client that grants a fixed identity and replays lease statuses.
#[derive(Debug)]
pub struct ScriptedDhcp {
    pub grant: bool,
    pub identity: NetworkIdentity,
    pub statuses: VecDeque<LeaseStatus>,
    pub begins: usize,
    pub checks: usize,
}

impl ScriptedDhcp {
    pub fn granting(identity: NetworkIdentity) -> Self {
        Self {
            grant: true,
            identity,
            statuses: VecDeque::new(),
            begins: 0,
            checks: 0,
        }
    }

    pub fn refusing(identity: NetworkIdentity) -> Self {
        Self {
            grant: false,
            ..Self::granting(identity)
        }
    }

    pub fn then(mut self, status: LeaseStatus) -> Self {
        self.statuses.push_back(status);
        self
    }
}

impl DhcpClient for ScriptedDhcp {
    fn begin_with_dhcp(&mut self, _mac: MacAddress) -> bool {
        self.begins += 1;
        self.grant
    }

    fn check_lease(&mut self) -> LeaseStatus {
        self.checks += 1;
        self.statuses.pop_front().unwrap_or_default()
    }

    fn local_ip(&self) -> Ipv4Addr {
        self.identity.ip
    }

    fn dns_ip(&self) -> Ipv4Addr {
        self.identity.dns
    }

    fn gateway_ip(&self) -> Ipv4Addr {
        self.identity.gateway
    }

    fn subnet_mask(&self) -> Ipv4Addr {
        self.identity.netmask
    }
}

/// Ethernet frame of `len` bytes with the given ethertype.
pub fn frame_with_ethertype(ethertype: u16, len: usize) -> Vec<u8> {
    let mut frame = vec![0u8; len];
    frame[..6].copy_from_slice(&[0xff; 6]);
    frame[6..12].copy_from_slice(&[0x02, 0, 0, 0, 0, 0x99]);
    frame[12..14].copy_from_slice(&ethertype.to_be_bytes());
    frame
}

/// IPv4/TCP frame carrying `payload_len` bytes after a 20-byte TCP header.
pub fn tcp_frame(payload_len: usize) -> Vec<u8> {
    let total = 20 + 20 + payload_len;
    let mut frame = frame_with_ethertype(0x0800, 14 + total);
    let ip = &mut frame[14..34];
    ip[0] = 0x45;
    ip[2..4].copy_from_slice(&(total as u16).to_be_bytes());
    ip[8] = 64;
    ip[9] = 6;
    ip[12..16].copy_from_slice(&[192, 168, 0, 20]);
    ip[16..20].copy_from_slice(&[192, 168, 0, 6]);
    let tcp = &mut frame[34..54];
    tcp[0..2].copy_from_slice(&40000u16.to_be_bytes());
    tcp[2..4].copy_from_slice(&80u16.to_be_bytes());
    tcp[12] = 5 << 4;
    tcp[13] = 0x18;
    for (i, byte) in frame[54..].iter_mut().enumerate() {
        *byte = (i * 7 + 3) as u8;
    }
    frame
}

/// Broadcast ARP request for `target`.
pub fn arp_request(target: Ipv4Addr) -> Vec<u8> {
    let mut frame = frame_with_ethertype(0x0806, 42);
    let arp = &mut frame[14..42];
    arp[0..2].copy_from_slice(&1u16.to_be_bytes());
    arp[2..4].copy_from_slice(&0x0800u16.to_be_bytes());
    arp[4] = 6;
    arp[5] = 4;
    arp[6..8].copy_from_slice(&1u16.to_be_bytes());
    arp[8..14].copy_from_slice(&[0x02, 0, 0, 0, 0, 0x99]);
    arp[14..18].copy_from_slice(&[192, 168, 0, 20]);
    arp[24..28].copy_from_slice(&target.octets());
    frame
}

/// Reference TCP checksum over a whole frame held in one slice.
pub fn reference_tcp_checksum(frame: &[u8]) -> u16 {
    let total = u16::from_be_bytes([frame[16], frame[17]]) as usize;
    let upper = &frame[34..14 + total];
    let mut pseudo = Vec::with_capacity(12);
    pseudo.extend_from_slice(&frame[26..34]);
    pseudo.extend_from_slice(&[0, 6]);
    pseudo.extend_from_slice(&((total - 20) as u16).to_be_bytes());
    let sum = checksum(checksum(0, &pseudo), upper);
    if sum == 0 {
        0xFFFF
    } else {
        sum
    }
}
