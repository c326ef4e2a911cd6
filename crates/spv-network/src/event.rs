//! Peer-group lifecycle events.

use crate::{NetworkError, PeerRef, EVENT_CHANNEL_CAPACITY};
use std::fmt;
use tokio::sync::broadcast;
use tracing::trace;

/// Lifecycle events published by the peer group.
#[derive(Clone)]
pub enum PeerGroupEvent {
    /// Peer group started.
    OnStart,
    /// Peer group stopped.
    OnStop,
    /// A peer object was created (not yet connected).
    OnPeerCreate(PeerRef),
    /// TCP connection and handshake completed.
    OnPeerConnect(PeerRef),
    /// A peer disconnected, with the error that caused it if any.
    OnPeerDisconnect {
        peer: PeerRef,
        error: Option<NetworkError>,
    },
    /// A peer finished its tasks and is idle.
    OnPeerReady(PeerRef),
}

impl fmt::Debug for PeerGroupEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeerGroupEvent::OnStart => f.write_str("OnStart"),
            PeerGroupEvent::OnStop => f.write_str("OnStop"),
            PeerGroupEvent::OnPeerCreate(peer) => write!(f, "OnPeerCreate({})", peer.host()),
            PeerGroupEvent::OnPeerConnect(peer) => write!(f, "OnPeerConnect({})", peer.host()),
            PeerGroupEvent::OnPeerDisconnect { peer, error } => f
                .debug_struct("OnPeerDisconnect")
                .field("peer", &peer.host())
                .field("error", error)
                .finish(),
            PeerGroupEvent::OnPeerReady(peer) => write!(f, "OnPeerReady({})", peer.host()),
        }
    }
}

/// Broadcast publisher for [`PeerGroupEvent`]s.
///
/// Every subscriber receives every event published after it subscribed.
#[derive(Clone)]
pub struct PeerGroupEvents {
    tx: broadcast::Sender<PeerGroupEvent>,
}

impl PeerGroupEvents {
    /// Create a publisher with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(EVENT_CHANNEL_CAPACITY)
    }

    /// Create a publisher buffering up to `capacity` events per subscriber.
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to future events.
    pub fn subscribe(&self) -> broadcast::Receiver<PeerGroupEvent> {
        self.tx.subscribe()
    }

    /// Publish an event, returning the number of subscribers it reached.
    pub fn publish(&self, event: PeerGroupEvent) -> usize {
        trace!(event = ?event, "Publishing peer group event");
        // No subscribers is not an error for the publisher.
        self.tx.send(event).unwrap_or(0)
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for PeerGroupEvents {
    fn default() -> Self {
        Self::new()
    }
}
