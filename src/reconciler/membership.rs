//! The reconciliation loop: single consumer of membership events.
//!
//! The topology map (peer address -> channel) lives entirely inside this
//! task. Notifications are applied one at a time in arrival order, so the
//! at-most-one-channel-per-peer invariant holds without any locking: the map
//! is never touched from two places at once.
//!
//! Channel connect/retry work stays off this task. The factory returns
//! immediately and each channel retries on its own schedule, so a hung or
//! flapping peer never delays Add/Delete processing for any other peer.

use super::types::TopologyState;
use super::transition;
use crate::address::PeerAddress;
use crate::channel::{ChannelFactory, ReplicationChannel};
use crate::error::{Result, TopologyError};
use crate::identity::SelfExclusion;
use crate::membership::{ChangeNotification, MembershipEvent};
use crate::metrics;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn, Instrument};

/// Why the loop stopped consuming events.
enum LoopExit {
    /// `shutdown()` signalled; the manager finishes the state transitions.
    Shutdown,
    /// The membership queue closed without a failure marker.
    StreamEnded,
    /// The membership stream reported a terminal error.
    StreamFailed(String),
}

/// Run the reconciliation loop until shutdown or the stream ends.
///
/// Returns the discovery failure if the stream terminated with one, so the
/// join handle records why the loop died.
pub(super) async fn run_reconcile<F: ChannelFactory>(
    factory: Arc<F>,
    exclusion: SelfExclusion,
    mut events_rx: mpsc::Receiver<MembershipEvent>,
    mut shutdown_rx: watch::Receiver<bool>,
    state_tx: Arc<watch::Sender<TopologyState>>,
    active_channels: Arc<AtomicUsize>,
) -> Result<()> {
    let span = tracing::info_span!("reconcile");

    async move {
        let mut topology: HashMap<PeerAddress, Arc<dyn ReplicationChannel>> = HashMap::new();

        let _ = shutdown_rx.borrow_and_update();

        info!(self_addresses = exclusion.len(), "Reconciliation loop started");

        let exit = loop {
            tokio::select! {
                biased;

                result = shutdown_rx.changed() => {
                    if result.is_err() || *shutdown_rx.borrow() {
                        debug!("Shutdown signal received");
                        break LoopExit::Shutdown;
                    }
                    continue;
                }

                event = events_rx.recv() => match event {
                    Some(MembershipEvent::Changed(notification)) => {
                        apply_notification(
                            notification,
                            factory.as_ref(),
                            &exclusion,
                            &mut topology,
                            &active_channels,
                        );
                    }
                    Some(MembershipEvent::Failed(reason)) => {
                        error!(reason = %reason, "Membership stream failed, tearing down topology");
                        metrics::record_stream_failure();
                        break LoopExit::StreamFailed(reason);
                    }
                    None => {
                        warn!("Membership stream ended, tearing down topology");
                        break LoopExit::StreamEnded;
                    }
                }
            }
        };

        close_all(&mut topology, &active_channels);

        let result = match exit {
            LoopExit::Shutdown => Ok(()),
            LoopExit::StreamEnded => {
                transition(&state_tx, TopologyState::Stopped);
                Ok(())
            }
            LoopExit::StreamFailed(reason) => {
                transition(&state_tx, TopologyState::Failed);
                Err(TopologyError::discovery(reason))
            }
        };

        info!("Reconciliation loop stopped");
        result
    }
    .instrument(span)
    .await
}

/// Apply one membership delta to the topology map.
fn apply_notification<F: ChannelFactory>(
    notification: ChangeNotification<PeerAddress>,
    factory: &F,
    exclusion: &SelfExclusion,
    topology: &mut HashMap<PeerAddress, Arc<dyn ReplicationChannel>>,
    active_channels: &AtomicUsize,
) {
    metrics::record_notification(notification.kind_label());

    match notification {
        ChangeNotification::Add(addr) => {
            if exclusion.is_self(&addr) {
                debug!(peer = %addr, "Dropping add for self address");
                metrics::record_self_excluded();
                return;
            }
            if topology.contains_key(&addr) {
                // One channel per peer: keep the live connection, flag the anomaly
                warn!(peer = %addr, "Duplicate add for tracked peer, keeping existing channel");
                metrics::record_duplicate_add(&addr.to_string());
                return;
            }

            let channel = factory.create(addr.clone());
            topology.insert(addr.clone(), channel);
            sync_channel_count(topology.len(), active_channels);
            info!(peer = %addr, tracked = topology.len(), "Peer added to topology");
        }
        ChangeNotification::Delete(addr) => match topology.remove(&addr) {
            Some(channel) => {
                // Close is a request; teardown finishes on the channel's task
                channel.close();
                sync_channel_count(topology.len(), active_channels);
                info!(peer = %addr, tracked = topology.len(), "Peer removed from topology");
            }
            None => {
                debug!(peer = %addr, "Delete for untracked peer, ignoring");
            }
        },
    }
}

/// Close every tracked channel and clear the map.
fn close_all(
    topology: &mut HashMap<PeerAddress, Arc<dyn ReplicationChannel>>,
    active_channels: &AtomicUsize,
) {
    if !topology.is_empty() {
        info!(tracked = topology.len(), "Closing all replication channels");
        for (_, channel) in topology.drain() {
            channel.close();
        }
    }
    sync_channel_count(0, active_channels);
}

fn sync_channel_count(count: usize, active_channels: &AtomicUsize) {
    active_channels.store(count, Ordering::SeqCst);
    metrics::set_active_channels(count);
}
