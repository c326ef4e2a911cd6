//! Handler traits for peer inventory and completed tasks.

use crate::{InventoryItem, Peer, PeerTask};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::trace;

/// Consumes inventory announcements from peers.
pub trait InventoryItemsHandler: Send + Sync {
    /// Handle items announced by `peer`.
    fn handle_inventory_items(&self, peer: &dyn Peer, items: &[InventoryItem]);
}

/// Consumes tasks a peer has finished.
pub trait PeerTaskHandler: Send + Sync {
    /// Handle a completed task.
    ///
    /// Returns `true` if the task was recognised and handled, so a dispatcher
    /// can stop trying other handlers.
    fn handle_completed_task(&self, peer: &dyn Peer, task: &PeerTask) -> bool;
}

/// Dispatches completed tasks to the first handler that accepts them.
#[derive(Default)]
pub struct PeerTaskHandlerChain {
    handlers: RwLock<Vec<Arc<dyn PeerTaskHandler>>>,
}

impl PeerTaskHandlerChain {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler.
    pub fn add_handler(&self, handler: Arc<dyn PeerTaskHandler>) {
        self.handlers.write().push(handler);
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.read().len()
    }

    /// Whether no handler is registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.read().is_empty()
    }
}

impl PeerTaskHandler for PeerTaskHandlerChain {
    fn handle_completed_task(&self, peer: &dyn Peer, task: &PeerTask) -> bool {
        // Snapshot so handlers may register further handlers.
        let handlers: Vec<_> = self.handlers.read().clone();
        let handled = handlers
            .iter()
            .any(|h| h.handle_completed_task(peer, task));
        if !handled {
            trace!(peer = %peer.host(), task = task.name(), "No handler accepted task");
        }
        handled
    }
}

/// Fans inventory announcements out to every registered handler.
#[derive(Default)]
pub struct InventoryItemsHandlerChain {
    handlers: RwLock<Vec<Arc<dyn InventoryItemsHandler>>>,
}

impl InventoryItemsHandlerChain {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler.
    pub fn add_handler(&self, handler: Arc<dyn InventoryItemsHandler>) {
        self.handlers.write().push(handler);
    }
}

impl InventoryItemsHandler for InventoryItemsHandlerChain {
    fn handle_inventory_items(&self, peer: &dyn Peer, items: &[InventoryItem]) {
        let handlers: Vec<_> = self.handlers.read().clone();
        for handler in handlers {
            handler.handle_inventory_items(peer, items);
        }
    }
}
