//! Inbound packet ownership for one scheduler cycle.
//!
//! # State Machine
//! ```text
//!                     engine: reply in place
//!   FreeAfterProcess ───────────────────────> ReuseForSend ──send()──> Consumed
//!          │                                       │
//!          │ engine: keep packet                   │ (no reply produced)
//!          ▼                                       ▼
//!       Retained                         freed at end of cycle
//! ```
//!
//! INVARIANT: the inbound handle is freed at most once per cycle, and never
//! by the scheduler once it is `Consumed` or `Retained`.

/// What happens to the inbound handle when the cycle ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PacketState {
    /// Release the inbound handle once dispatch completes.
    #[default]
    FreeAfterProcess,
    /// Carry the reply in the inbound handle instead of allocating a new one.
    ReuseForSend,
    /// The engine took the handle over (e.g. queued it on a connection).
    Retained,
    /// The handle was transmitted and freed by the send path.
    Consumed,
}

impl PacketState {
    /// State after the engine asked for `requested`.
    ///
    /// Once the bridge no longer owns the handle the request is ignored.
    pub fn after(self, requested: PacketState) -> PacketState {
        match self {
            PacketState::Consumed | PacketState::Retained => self,
            PacketState::FreeAfterProcess | PacketState::ReuseForSend => requested,
        }
    }

    /// Whether the scheduler still has to free the inbound handle.
    pub fn frees_inbound(self) -> bool {
        matches!(self, PacketState::FreeAfterProcess | PacketState::ReuseForSend)
    }
}
