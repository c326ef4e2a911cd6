//! Tasks executed against a single peer.

use spv_chain::{Hash256, Transaction};

/// Fetch a batch of transactions by hash (`getdata`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTransactionsTask {
    /// Hashes requested from the peer.
    pub hashes: Vec<Hash256>,
    /// Transactions received so far.
    pub transactions: Vec<Transaction>,
}

impl RequestTransactionsTask {
    /// Create a task requesting `hashes`.
    pub fn new(hashes: Vec<Hash256>) -> Self {
        Self {
            hashes,
            transactions: Vec::new(),
        }
    }

    /// Accept a transaction delivered by the peer.
    ///
    /// Returns `false` for transactions that were not requested or were
    /// already received.
    pub fn handle_transaction(&mut self, transaction: Transaction) -> bool {
        if !self.hashes.contains(&transaction.hash) {
            return false;
        }
        if self.transactions.iter().any(|t| t.hash == transaction.hash) {
            return false;
        }
        self.transactions.push(transaction);
        true
    }

    /// Whether every requested transaction has arrived.
    pub fn is_complete(&self) -> bool {
        self.transactions.len() == self.hashes.len()
    }

    /// Hashes that were requested but have not arrived.
    pub fn missing_hashes(&self) -> Vec<Hash256> {
        self.hashes
            .iter()
            .filter(|h| !self.transactions.iter().any(|t| &t.hash == *h))
            .copied()
            .collect()
    }
}

/// Announce and serve one of our own transactions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendTransactionTask {
    /// Transaction being sent.
    pub transaction: Transaction,
}

impl SendTransactionTask {
    /// Create a send task.
    pub fn new(transaction: Transaction) -> Self {
        Self { transaction }
    }
}

/// A unit of work queued on a peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerTask {
    /// Fetch transactions from the peer.
    RequestTransactions(RequestTransactionsTask),
    /// Send a transaction to the peer.
    SendTransaction(SendTransactionTask),
}

impl PeerTask {
    /// Short task name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            PeerTask::RequestTransactions(_) => "request_transactions",
            PeerTask::SendTransaction(_) => "send_transaction",
        }
    }
}
