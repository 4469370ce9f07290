// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Replication topology manager.
//!
//! The orchestrator that ties together:
//! - Self-identity resolution via [`crate::identity::SelfResolver`]
//! - Membership deltas arriving as [`MembershipEvent`]s
//! - Per-peer channel lifecycle via [`crate::channel::ChannelFactory`]
//!
//! # Architecture
//!
//! The manager owns the full topology lifecycle:
//! 1. Resolves the local node's own addresses (once, at connect)
//! 2. Spawns the reconciliation loop that consumes membership deltas
//! 3. Each tracked peer gets a channel that connects and retries autonomously
//! 4. Handles graceful shutdown by closing every channel and draining the loop

mod membership;
mod types;

pub use types::TopologyState;

use crate::channel::{ChannelFactory, RetryingChannelFactory};
use crate::config::TopologyConfig;
use crate::error::{Result, TopologyError};
use crate::identity::{ConfigResolver, SelfExclusion, SelfResolver};
use crate::membership::MembershipEvent;
use crate::metrics;
use crate::transport::PeerTransport;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// The replication topology manager.
///
/// Maintains one replication channel per registry peer, driven by the
/// membership stream handed to the constructor.
///
/// # Ownership
///
/// The peer map itself lives inside the reconciliation task, which is the
/// only code that reads or writes it. The manager holds the control surfaces:
/// the shutdown signal, the state watch, and the task handle. Observers get
/// the tracked-channel count through [`active_channels()`](Self::active_channels)
/// and lifecycle transitions through [`state_changes()`](Self::state_changes).
pub struct TopologyManager<F: ChannelFactory = RetryingChannelFactory> {
    /// Configuration (validated by [`Self::with_transport`])
    config: TopologyConfig,

    /// Builds one channel per tracked peer
    factory: Arc<F>,

    /// Resolves the local node's own addresses at connect time
    resolver: Arc<dyn SelfResolver>,

    /// Membership stream; moved into the reconcile task by `connect()`
    events_rx: Option<mpsc::Receiver<MembershipEvent>>,

    /// Manager state (broadcast to watchers; shared with the reconcile task)
    state_tx: Arc<watch::Sender<TopologyState>>,

    /// Manager state receiver (for internal reads)
    state_rx: watch::Receiver<TopologyState>,

    /// Shutdown signal sender
    shutdown_tx: watch::Sender<bool>,

    /// Shutdown signal receiver (cloned into the reconcile task)
    shutdown_rx: watch::Receiver<bool>,

    /// Reconcile task handle, held for draining at shutdown
    reconcile_handle: Option<tokio::task::JoinHandle<Result<()>>>,

    /// Count of channels currently tracked by the reconcile loop
    active_channels: Arc<AtomicUsize>,
}

impl TopologyManager<RetryingChannelFactory> {
    /// Create a manager whose channels replicate over the given transport.
    ///
    /// This is the primary constructor. Self-identity comes from
    /// `config.node.advertise_addresses` via [`ConfigResolver`]; swap in a
    /// different [`SelfResolver`] through [`new()`](Self::new) when identity
    /// has to be fetched from somewhere live.
    ///
    /// Validates the config up front so a bad backoff factor or duration
    /// string fails here rather than being silently papered over later.
    pub fn with_transport(
        config: TopologyConfig,
        events_rx: mpsc::Receiver<MembershipEvent>,
        transport: Arc<dyn PeerTransport>,
    ) -> Result<Self> {
        config.validate()?;
        let resolver = Arc::new(ConfigResolver::from_config(&config.node)?);
        let factory = Arc::new(RetryingChannelFactory::new(transport, config.channel.retry()));
        Ok(Self::new(config, events_rx, factory, resolver))
    }
}

impl<F: ChannelFactory> TopologyManager<F> {
    /// Create a manager with an explicit channel factory and self resolver.
    ///
    /// The manager starts in `Created` state. Call
    /// [`connect()`](Self::connect) to resolve identity and begin
    /// reconciling membership deltas.
    pub fn new(
        config: TopologyConfig,
        events_rx: mpsc::Receiver<MembershipEvent>,
        factory: Arc<F>,
        resolver: Arc<dyn SelfResolver>,
    ) -> Self {
        let (state_tx, state_rx) = watch::channel(TopologyState::Created);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        metrics::set_manager_state(TopologyState::Created.as_str());

        Self {
            config,
            factory,
            resolver,
            events_rx: Some(events_rx),
            state_tx: Arc::new(state_tx),
            state_rx,
            shutdown_tx,
            shutdown_rx,
            reconcile_handle: None,
            active_channels: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get current manager state.
    pub fn state(&self) -> TopologyState {
        *self.state_rx.borrow()
    }

    /// Get a receiver to watch state transitions.
    pub fn state_changes(&self) -> watch::Receiver<TopologyState> {
        self.state_rx.clone()
    }

    /// Check if the reconciliation loop is running.
    pub fn is_running(&self) -> bool {
        matches!(self.state(), TopologyState::Running)
    }

    /// Number of peers currently tracked with a channel.
    pub fn active_channels(&self) -> usize {
        self.active_channels.load(Ordering::SeqCst)
    }

    /// Start reconciling the membership stream into replication channels.
    ///
    /// 1. Resolves the local node's own addresses (the self-exclusion set)
    /// 2. Spawns the reconciliation loop on the runtime
    ///
    /// Identity resolution failures surface here and leave the manager back
    /// in `Created`, so the caller can retry once the resolver recovers.
    /// After a successful return the loop runs until [`shutdown()`](Self::shutdown)
    /// or a terminal membership stream failure.
    pub async fn connect(&mut self) -> Result<()> {
        if self.state() != TopologyState::Created {
            return Err(TopologyError::invalid_state(
                "Created",
                format!("{:?}", self.state()),
            ));
        }

        transition(&self.state_tx, TopologyState::Resolving);
        debug!("Resolving self identity");

        let addresses = match self.resolver.resolve().await {
            Ok(addresses) => addresses,
            Err(e) => {
                transition(&self.state_tx, TopologyState::Created);
                return Err(e.into());
            }
        };
        let exclusion = SelfExclusion::new(addresses);
        info!(self_addresses = exclusion.len(), "Self identity resolved");

        let events_rx = match self.events_rx.take() {
            Some(rx) => rx,
            None => {
                transition(&self.state_tx, TopologyState::Created);
                return Err(TopologyError::invalid_state(
                    "membership stream attached",
                    "stream already consumed",
                ));
            }
        };

        // Running is published before the spawn so a loop that dies instantly
        // still wins the state race with its Failed/Stopped transition.
        transition(&self.state_tx, TopologyState::Running);

        let handle = tokio::spawn(membership::run_reconcile(
            Arc::clone(&self.factory),
            exclusion,
            events_rx,
            self.shutdown_rx.clone(),
            Arc::clone(&self.state_tx),
            Arc::clone(&self.active_channels),
        ));
        self.reconcile_handle = Some(handle);

        info!("Topology manager running");
        Ok(())
    }

    /// Shut the topology manager down gracefully.
    ///
    /// Shutdown sequence:
    /// 1. Signal the reconciliation loop to stop
    /// 2. The loop closes every tracked channel and clears its map
    /// 3. Wait for the loop to exit, bounded by `shutdown.drain_timeout`
    ///
    /// Closing a channel is a request: the channel task finishes teardown on
    /// its own and its watchers observe `Closed`. A manager that already
    /// reached `Stopped` or `Failed` keeps that state.
    pub async fn shutdown(&mut self) {
        info!("Shutting down topology manager");

        if !self.state().is_terminal() {
            transition(&self.state_tx, TopologyState::ShuttingDown);
        }
        let _ = self.shutdown_tx.send(true);

        if let Some(handle) = self.reconcile_handle.take() {
            let drain = self.config.shutdown.drain_timeout_duration();
            match tokio::time::timeout(drain, handle).await {
                Ok(Ok(Ok(()))) => {
                    debug!("Reconciliation task completed gracefully");
                }
                Ok(Ok(Err(e))) => {
                    warn!(error = %e, "Reconciliation task had already failed");
                }
                Ok(Err(e)) => {
                    warn!(error = %e, "Reconciliation task panicked during shutdown");
                }
                Err(_) => {
                    warn!(
                        timeout_ms = drain.as_millis() as u64,
                        "Timed out waiting for reconciliation task"
                    );
                }
            }
        }

        if !self.state().is_terminal() {
            transition(&self.state_tx, TopologyState::Stopped);
        }
        info!("Topology manager stopped");
    }
}

/// Publish a state transition and mirror it to the state gauge.
fn transition(state_tx: &watch::Sender<TopologyState>, state: TopologyState) {
    let _ = state_tx.send(state);
    metrics::set_manager_state(state.as_str());
}
