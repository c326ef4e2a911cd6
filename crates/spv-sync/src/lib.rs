//! # spv-sync
//!
//! Mempool transaction relay for the SPV node.
//!
//! This crate provides:
//! - Per-peer bookkeeping of transactions requested from the mempool
//! - Cross-peer deduplication of transaction fetches
//! - Routing of relayed transactions into the wallet's syncer and sender
//! - Cleanup of outstanding requests when a peer disconnects

mod error;
mod ledger;
mod mempool;
mod syncer;

pub use error::{SyncError, SyncResult};
pub use ledger::RequestedTransactions;
pub use mempool::{MempoolTransactions, RelayConfig};
pub use syncer::{TransactionSender, TransactionSyncer};
