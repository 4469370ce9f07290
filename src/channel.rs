//! Replication channels: per-peer connections with autonomous retry.
//!
//! Each tracked peer gets exactly one channel. A channel owns its connection
//! lifecycle on its own spawned task: it dials the peer through the injected
//! transport, drives the session until the connection drops, then backs off
//! and reconnects, forever. Giving up is only ever external, via [`close()`].
//!
//! # State Transitions
//!
//! ```text
//!              spawn
//! Idle ───────────────────→ Connecting ──────→ Connected
//!                               ↑  │               │
//!                (backoff       │  │ (connect      │ (session
//!                 elapsed)      │  │  failed or    │  ended)
//!                               │  ↓  timed out)   ↓
//!                               └─ Retrying ←──────┘
//!
//!                    close() from any state
//!                               ↓
//!                            Closed
//! ```
//!
//! A hung connect attempt cannot wedge the channel: each attempt is raced
//! against `connect_timeout` and against the close signal, so `close()` takes
//! effect mid-connect and mid-retry alike.
//!
//! [`close()`]: ReplicationChannel::close

use crate::address::PeerAddress;
use crate::metrics;
use crate::resilience::RetryConfig;
use crate::transport::PeerTransport;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{debug, info, warn, Instrument};

/// State of one replication channel.
///
/// See module docs for the state transition diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// Channel handle exists but the actor task has not run yet.
    Idle,

    /// A connect attempt is in flight.
    Connecting,

    /// The session is up and streaming registry updates.
    Connected,

    /// Waiting out a backoff delay before the next connect attempt.
    Retrying,

    /// Teardown finished. Terminal; a closed channel never reconnects.
    Closed,
}

impl ChannelState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelState::Idle => "Idle",
            ChannelState::Connecting => "Connecting",
            ChannelState::Connected => "Connected",
            ChannelState::Retrying => "Retrying",
            ChannelState::Closed => "Closed",
        }
    }

    /// True once the channel can never change state again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ChannelState::Closed)
    }
}

impl std::fmt::Display for ChannelState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One managed connection to one peer.
///
/// Implementations own their retry behavior internally; callers only observe
/// state and request teardown.
pub trait ReplicationChannel: Send + Sync {
    /// The peer this channel replicates with.
    fn peer(&self) -> &PeerAddress;

    /// Current lifecycle state.
    fn state(&self) -> ChannelState;

    /// Watch lifecycle transitions. `Closed` signals teardown completion for
    /// callers that want to wait for it; nothing in this crate does.
    fn state_changes(&self) -> watch::Receiver<ChannelState>;

    /// Request teardown. Idempotent, non-blocking, effective in every state
    /// including mid-connect and mid-retry.
    fn close(&self);
}

/// Creates channels on behalf of the reconciler.
///
/// Injected so tests can substitute a recording fake and observe exactly
/// which addresses triggered creation, without network I/O. `create` must
/// return immediately; connection establishment happens inside the channel.
pub trait ChannelFactory: Send + Sync + 'static {
    fn create(&self, addr: PeerAddress) -> Arc<dyn ReplicationChannel>;
}

/// The production channel: a spawned actor cycling connect/retry until closed.
pub struct RetryingChannel {
    peer: PeerAddress,
    state_rx: watch::Receiver<ChannelState>,
    close_tx: watch::Sender<bool>,
}

impl RetryingChannel {
    /// Create the channel and start its actor task.
    ///
    /// Returns immediately; the first connect attempt happens on the spawned
    /// task. Dropping every handle without calling `close()` also stops the
    /// actor, so an orphaned channel cannot linger.
    pub fn spawn(
        peer: PeerAddress,
        transport: Arc<dyn PeerTransport>,
        retry: RetryConfig,
    ) -> Arc<Self> {
        let (state_tx, state_rx) = watch::channel(ChannelState::Idle);
        let (close_tx, close_rx) = watch::channel(false);

        metrics::record_channel_created(&peer.to_string());

        let span = tracing::info_span!("channel", peer = %peer);
        let actor_peer = peer.clone();
        tokio::spawn(
            run_channel(actor_peer, transport, retry, state_tx, close_rx).instrument(span),
        );

        Arc::new(Self {
            peer,
            state_rx,
            close_tx,
        })
    }
}

impl ReplicationChannel for RetryingChannel {
    fn peer(&self) -> &PeerAddress {
        &self.peer
    }

    fn state(&self) -> ChannelState {
        *self.state_rx.borrow()
    }

    fn state_changes(&self) -> watch::Receiver<ChannelState> {
        self.state_rx.clone()
    }

    fn close(&self) {
        let _ = self.close_tx.send(true);
    }
}

/// Actor loop for one channel. Runs until closed or orphaned.
async fn run_channel(
    peer: PeerAddress,
    transport: Arc<dyn PeerTransport>,
    retry: RetryConfig,
    state_tx: watch::Sender<ChannelState>,
    mut close_rx: watch::Receiver<bool>,
) {
    let peer_label = peer.to_string();
    let mut attempt: usize = 0;

    let _ = close_rx.borrow_and_update();

    loop {
        // close() may have landed before this task first ran
        if *close_rx.borrow() {
            break;
        }

        let _ = state_tx.send(ChannelState::Connecting);

        let connected = tokio::select! {
            biased;

            result = close_rx.changed() => {
                if result.is_err() || *close_rx.borrow() {
                    break;
                }
                continue;
            }

            result = timeout(retry.connect_timeout, transport.connect(&peer)) => result,
        };

        match connected {
            Ok(Ok(mut session)) => {
                attempt = 0;
                let _ = state_tx.send(ChannelState::Connected);
                metrics::record_connect(&peer_label, true);
                info!("Connected");

                let ended = tokio::select! {
                    biased;

                    result = close_rx.changed() => {
                        if result.is_err() || *close_rx.borrow() {
                            break;
                        }
                        continue;
                    }

                    outcome = session.run() => outcome,
                };

                match ended {
                    Ok(()) => info!("Session ended by peer"),
                    Err(e) => warn!(reason = %e, "Session failed"),
                }
            }
            Ok(Err(e)) => {
                metrics::record_connect(&peer_label, false);
                warn!(reason = %e, "Connect failed");
            }
            Err(_) => {
                metrics::record_connect(&peer_label, false);
                warn!(
                    timeout_ms = retry.connect_timeout.as_millis() as u64,
                    "Connect timed out"
                );
            }
        }

        let _ = state_tx.send(ChannelState::Retrying);
        metrics::record_retry(&peer_label);

        attempt += 1;
        let delay = retry.delay_for_attempt(attempt);
        debug!(attempt, delay_ms = delay.as_millis() as u64, "Scheduling reconnect");

        tokio::select! {
            biased;

            result = close_rx.changed() => {
                if result.is_err() || *close_rx.borrow() {
                    break;
                }
            }

            _ = tokio::time::sleep(delay) => {}
        }
    }

    let _ = state_tx.send(ChannelState::Closed);
    metrics::record_channel_closed(&peer_label);
    info!("Channel closed");
}

/// Builds [`RetryingChannel`]s over one shared transport.
pub struct RetryingChannelFactory {
    transport: Arc<dyn PeerTransport>,
    retry: RetryConfig,
}

impl RetryingChannelFactory {
    pub fn new(transport: Arc<dyn PeerTransport>, retry: RetryConfig) -> Self {
        Self { transport, retry }
    }
}

impl ChannelFactory for RetryingChannelFactory {
    fn create(&self, addr: PeerAddress) -> Arc<dyn ReplicationChannel> {
        RetryingChannel::spawn(addr, Arc::clone(&self.transport), self.retry.clone())
    }
}
