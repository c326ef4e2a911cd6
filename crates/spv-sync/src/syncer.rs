//! Collaborators receiving relayed transactions.

use crate::SyncResult;
use spv_chain::{Hash256, Transaction};

/// Wallet-side transaction index fed by mempool relay.
pub trait TransactionSyncer: Send + Sync {
    /// Process transactions relayed by a peer.
    fn handle_relayed(&self, transactions: &[Transaction]) -> SyncResult<()>;

    /// Whether a transaction announced by a peer is worth fetching.
    fn should_request_transaction(&self, hash: &Hash256) -> bool;
}

/// Outbound transaction sender.
pub trait TransactionSender: Send + Sync {
    /// Transactions were seen relayed back by the network.
    fn transactions_relayed(&self, transactions: &[Transaction]) -> SyncResult<()>;
}
