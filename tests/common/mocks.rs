//! Mock channels, factories, resolvers, and transports for testing.
//!
//! The mock factory records every channel it hands out so tests can assert
//! exactly which peers got channels and when they were closed. The mock
//! transports script connect behavior (always fail, hang, flap, recover)
//! to exercise the real retrying channel.

use replication_topology::address::PeerAddress;
use replication_topology::channel::{ChannelFactory, ChannelState, ReplicationChannel};
use replication_topology::identity::{
    BoxFuture as ResolveFuture, ResolveError, SelfResolver,
};
use replication_topology::transport::{
    BoxFuture as TransportFuture, PeerTransport, ReplicationSession, TransportError,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

// =============================================================================
// Mock Channel + Factory
// =============================================================================

/// A channel that does nothing except record `close()` calls.
pub struct MockChannel {
    peer: PeerAddress,
    closes: AtomicUsize,
    state_tx: watch::Sender<ChannelState>,
    state_rx: watch::Receiver<ChannelState>,
}

impl MockChannel {
    fn new(peer: PeerAddress) -> Arc<Self> {
        let (state_tx, state_rx) = watch::channel(ChannelState::Connecting);
        Arc::new(Self {
            peer,
            closes: AtomicUsize::new(0),
            state_tx,
            state_rx,
        })
    }

    /// How many times `close()` was called on this channel.
    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// The address this channel was created for.
    #[allow(dead_code)] // Useful for future tests
    pub fn peer_address(&self) -> &PeerAddress {
        &self.peer
    }
}

impl ReplicationChannel for MockChannel {
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
        self.closes.fetch_add(1, Ordering::SeqCst);
        let _ = self.state_tx.send(ChannelState::Closed);
    }
}

/// Factory that records every channel it creates, in creation order.
///
/// # Example
/// ```rust,ignore
/// let factory = Arc::new(MockChannelFactory::new());
/// let mut manager = TopologyManager::new(config, events_rx, Arc::clone(&factory), resolver);
///
/// // Drive membership events...
///
/// assert_eq!(factory.create_count(), 3);
/// assert_eq!(factory.channel_for(&peer).unwrap().close_count(), 1);
/// ```
pub struct MockChannelFactory {
    channels: Mutex<Vec<Arc<MockChannel>>>,
}

impl MockChannelFactory {
    pub fn new() -> Self {
        Self {
            channels: Mutex::new(Vec::new()),
        }
    }

    /// Total number of channels ever created.
    pub fn create_count(&self) -> usize {
        self.channels.lock().unwrap().len()
    }

    /// Addresses of every created channel, in creation order.
    pub fn created_addresses(&self) -> Vec<PeerAddress> {
        self.channels
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.peer.clone())
            .collect()
    }

    /// The most recently created channel for `addr`, if any.
    pub fn channel_for(&self, addr: &PeerAddress) -> Option<Arc<MockChannel>> {
        self.channels
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|c| &c.peer == addr)
            .cloned()
    }

    /// Every created channel, in creation order.
    pub fn channels(&self) -> Vec<Arc<MockChannel>> {
        self.channels.lock().unwrap().clone()
    }

    /// Sum of close calls across all created channels.
    pub fn total_close_count(&self) -> usize {
        self.channels
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.close_count())
            .sum()
    }

    /// Addresses of channels never closed.
    pub fn open_addresses(&self) -> Vec<PeerAddress> {
        self.channels
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.close_count() == 0)
            .map(|c| c.peer.clone())
            .collect()
    }
}

impl Default for MockChannelFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelFactory for MockChannelFactory {
    fn create(&self, addr: PeerAddress) -> Arc<dyn ReplicationChannel> {
        let channel = MockChannel::new(addr);
        self.channels.lock().unwrap().push(Arc::clone(&channel));
        channel
    }
}

/// A channel whose `close()` blocks the calling thread for `stall`, pinning
/// the reconcile loop mid-drain.
#[allow(dead_code)] // Only the chaos binary stalls a drain
pub struct StallingChannel {
    peer: PeerAddress,
    stall: Duration,
    state_tx: watch::Sender<ChannelState>,
    state_rx: watch::Receiver<ChannelState>,
}

impl ReplicationChannel for StallingChannel {
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
        std::thread::sleep(self.stall);
        let _ = self.state_tx.send(ChannelState::Closed);
    }
}

/// Factory whose channels all stall in `close()` for the same duration.
#[allow(dead_code)] // Only the chaos binary stalls a drain
pub struct StallingChannelFactory {
    pub stall: Duration,
}

impl ChannelFactory for StallingChannelFactory {
    fn create(&self, addr: PeerAddress) -> Arc<dyn ReplicationChannel> {
        let (state_tx, state_rx) = watch::channel(ChannelState::Connecting);
        Arc::new(StallingChannel {
            peer: addr,
            stall: self.stall,
            state_tx,
            state_rx,
        })
    }
}

// =============================================================================
// Mock Resolver
// =============================================================================

/// Resolver that always fails, as if the metadata service were down.
#[allow(dead_code)] // Only the integration binary exercises resolver failure
pub struct FailingResolver;

impl SelfResolver for FailingResolver {
    fn resolve(&self) -> ResolveFuture<'_, Vec<PeerAddress>> {
        Box::pin(async { Err(ResolveError("metadata service unreachable".to_string())) })
    }
}

// =============================================================================
// Mock Transports
// =============================================================================

/// Transport whose connects always fail. Channels using it retry forever.
#[derive(Default)]
pub struct FailingTransport {
    attempts: AtomicUsize,
}

impl FailingTransport {
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl PeerTransport for FailingTransport {
    fn connect(&self, addr: &PeerAddress) -> TransportFuture<'_, Box<dyn ReplicationSession>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let addr = addr.clone();
        Box::pin(async move { Err(TransportError(format!("connection refused: {}", addr))) })
    }
}

/// Transport whose connects never complete, as if packets were blackholed.
#[derive(Default)]
pub struct HangingTransport {
    attempts: AtomicUsize,
}

impl HangingTransport {
    /// How many connects were started (and then hung).
    #[allow(dead_code)] // Only the chaos binary counts hung connects
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl PeerTransport for HangingTransport {
    fn connect(&self, _addr: &PeerAddress) -> TransportFuture<'_, Box<dyn ReplicationSession>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Box::pin(std::future::pending())
    }
}

/// Session that drops immediately after the connection is established.
struct DroppingSession;

impl ReplicationSession for DroppingSession {
    fn run(&mut self) -> TransportFuture<'_, ()> {
        Box::pin(async { Err(TransportError("connection reset".to_string())) })
    }
}

/// Transport that connects instantly but every session drops at once,
/// driving the channel around its reconnect cycle.
#[derive(Default)]
pub struct FlappingTransport {
    connects: AtomicUsize,
}

impl FlappingTransport {
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

impl PeerTransport for FlappingTransport {
    fn connect(&self, _addr: &PeerAddress) -> TransportFuture<'_, Box<dyn ReplicationSession>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Box::pin(async {
            Ok(Box::new(DroppingSession) as Box<dyn ReplicationSession>)
        })
    }
}

/// Session that stays up until dropped.
struct StableSession;

impl ReplicationSession for StableSession {
    fn run(&mut self) -> TransportFuture<'_, ()> {
        Box::pin(std::future::pending())
    }
}

/// Transport that fails its first `fail_first` connects, then hands out
/// stable sessions. Models a peer that comes back after a restart.
pub struct RecoveringTransport {
    fail_first: usize,
    attempts: AtomicUsize,
}

impl RecoveringTransport {
    pub fn new(fail_first: usize) -> Self {
        Self {
            fail_first,
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl PeerTransport for RecoveringTransport {
    fn connect(&self, addr: &PeerAddress) -> TransportFuture<'_, Box<dyn ReplicationSession>> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        let failing = attempt < self.fail_first;
        let addr = addr.clone();
        Box::pin(async move {
            if failing {
                Err(TransportError(format!("peer still starting: {}", addr)))
            } else {
                Ok(Box::new(StableSession) as Box<dyn ReplicationSession>)
            }
        })
    }
}
