//! Manager state types.
//!
//! Defines the state machine for the topology manager lifecycle.
//!
//! # State Transitions
//!
//! ```text
//!                 connect()
//! Created ───────────────────→ Resolving
//!    ↑                              │
//!    │ (resolution failed,          │ (self identity cached,
//!    │  connect() may retry)        │  loop spawned)
//!    └──────────────────────────────┤
//!                                   ↓
//!                               Running ──────────────────┐
//!                                   │                     │
//!                         shutdown()│      (membership    │
//!                                   ↓       stream error) │
//!                             ShuttingDown                │
//!                                   │                     ↓
//!                                   ↓                  Failed
//!                                Stopped
//! ```
//!
//! # State Descriptions
//!
//! - **Created**: Initial state after `TopologyManager::new()`. Nothing running.
//! - **Resolving**: `connect()` called, awaiting self-identity resolution.
//! - **Running**: Normal operation. The reconciliation loop is applying
//!   membership notifications.
//! - **ShuttingDown**: `shutdown()` called. Channels are being closed.
//! - **Stopped**: Shutdown complete, or the membership stream ended cleanly.
//!   Terminal.
//! - **Failed**: The membership stream terminated with an error; all channels
//!   were closed. Terminal; recovery belongs to a supervising layer.

/// State of the topology manager.
///
/// See module docs for the state transition diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopologyState {
    /// Manager created but not connected.
    ///
    /// Call [`connect()`](super::TopologyManager::connect) to begin
    /// reconciliation.
    Created,

    /// Awaiting the one-shot self-identity resolution.
    Resolving,

    /// Applying membership notifications and managing channels.
    Running,

    /// Shutting down gracefully.
    ///
    /// Every tracked channel has been asked to close; the reconciliation
    /// task is draining. Transitions to `Stopped` when complete.
    ShuttingDown,

    /// Stopped. Terminal.
    Stopped,

    /// The membership stream failed. Terminal.
    ///
    /// The true cluster topology is unknown from here on; all channels were
    /// closed rather than kept against a stale view.
    Failed,
}

impl TopologyState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TopologyState::Created => "Created",
            TopologyState::Resolving => "Resolving",
            TopologyState::Running => "Running",
            TopologyState::ShuttingDown => "ShuttingDown",
            TopologyState::Stopped => "Stopped",
            TopologyState::Failed => "Failed",
        }
    }

    /// True for states the manager can never leave.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TopologyState::Stopped | TopologyState::Failed)
    }
}

impl std::fmt::Display for TopologyState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
