//! Peer interface.

use crate::PeerTask;
use std::sync::Arc;

/// A connected peer as seen by task handlers.
///
/// `host` is the identity key used to attribute per-peer state; it must stay
/// the same for the lifetime of the connection.
pub trait Peer: Send + Sync {
    /// Stable identity of the peer (its host address).
    fn host(&self) -> &str;

    /// Queue a task for execution against this peer.
    fn add_task(&self, task: PeerTask);
}

/// Shared handle to a peer.
pub type PeerRef = Arc<dyn Peer>;
