//! # spv-network
//!
//! Peer-facing abstractions for the SPV node.
//!
//! This crate provides:
//! - The `Peer` interface tasks are issued through
//! - Inventory items announced by peers
//! - Peer tasks and their completion results
//! - Peer-group lifecycle events over a broadcast channel
//! - Handler traits and dispatch chains for inventory and completed tasks
//!
//! Connection management and the wire codec live outside this crate.

mod error;
mod event;
mod handler;
mod inventory;
mod peer;
mod task;

pub use error::{NetworkError, NetworkResult};
pub use event::{PeerGroupEvent, PeerGroupEvents};
pub use handler::{
    InventoryItemsHandler, InventoryItemsHandlerChain, PeerTaskHandler, PeerTaskHandlerChain,
};
pub use inventory::{InventoryItem, InventoryType};
pub use peer::{Peer, PeerRef};
pub use task::{PeerTask, RequestTransactionsTask, SendTransactionTask};

/// Maximum number of entries in a single `inv`/`getdata` message.
pub const MAX_INV_SIZE: usize = 50_000;

/// Default capacity of the peer-group event channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;
