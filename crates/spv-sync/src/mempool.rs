//! Peer mempool transaction relay.
//!
//! Tracks which announced transactions have been requested from which peer:
//! 1. Filter inventory announcements down to wanted, unrequested transactions
//! 2. Issue one fetch task per batch to the announcing peer
//! 3. Hand fetched transactions to the syncer and sender
//! 4. Clear bookkeeping when the task completes or the peer goes away

use crate::{RequestedTransactions, SyncError, SyncResult, TransactionSender, TransactionSyncer};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use spv_chain::Hash256;
use spv_network::{
    InventoryItem, InventoryItemsHandler, NetworkError, Peer, PeerGroupEvent, PeerTask,
    PeerTaskHandler, RequestTransactionsTask, MAX_INV_SIZE,
};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

/// Relay configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Maximum hashes per fetch task; larger batches are split.
    pub max_hashes_per_request: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            max_hashes_per_request: MAX_INV_SIZE,
        }
    }
}

/// Mempool transaction relay tracker.
///
/// Never returns errors to its callers. Syncer and sender failures are
/// logged and the ledger is cleaned up regardless.
pub struct MempoolTransactions {
    /// Configuration.
    config: RelayConfig,
    /// Wallet transaction index.
    transaction_syncer: Arc<dyn TransactionSyncer>,
    /// Outbound sender, if the wallet broadcasts its own transactions.
    transaction_sender: Option<Arc<dyn TransactionSender>>,
    /// Outstanding requests per peer.
    requested: RequestedTransactions,
    /// Event subscription tasks, aborted on drop.
    subscriptions: Mutex<Vec<JoinHandle<()>>>,
}

impl MempoolTransactions {
    /// Create a tracker with the default configuration.
    pub fn new(
        transaction_syncer: Arc<dyn TransactionSyncer>,
        transaction_sender: Option<Arc<dyn TransactionSender>>,
    ) -> Self {
        Self::with_config(RelayConfig::default(), transaction_syncer, transaction_sender)
    }

    /// Create a tracker.
    pub fn with_config(
        config: RelayConfig,
        transaction_syncer: Arc<dyn TransactionSyncer>,
        transaction_sender: Option<Arc<dyn TransactionSender>>,
    ) -> Self {
        Self {
            config,
            transaction_syncer,
            transaction_sender,
            requested: RequestedTransactions::new(),
            subscriptions: Mutex::new(Vec::new()),
        }
    }

    /// Subscribe to peer-group events, reacting to disconnects.
    ///
    /// Fails with [`SyncError::NoRuntime`] outside a tokio runtime. The
    /// subscription holds only a weak reference and ends when the tracker is
    /// dropped, when [`Self::unsubscribe_all`] is called, or when the
    /// publisher goes away.
    pub fn subscribe_to(
        self: &Arc<Self>,
        mut events: broadcast::Receiver<PeerGroupEvent>,
    ) -> SyncResult<()> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| SyncError::NoRuntime(e.to_string()))?;
        let tracker = Arc::downgrade(self);

        let handle = runtime.spawn(async move {
            loop {
                match events.recv().await {
                    Ok(PeerGroupEvent::OnPeerDisconnect { peer, error }) => {
                        let Some(tracker) = tracker.upgrade() else {
                            break;
                        };
                        tracker.handle_disconnect(peer.as_ref(), error.as_ref());
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Peer group events lagged, disconnects may be missed");
                    }
                    Err(RecvError::Closed) => {
                        debug!("Peer group event channel closed");
                        break;
                    }
                }
            }
        });

        self.subscriptions.lock().push(handle);
        Ok(())
    }

    /// Cancel every event subscription.
    pub fn unsubscribe_all(&self) {
        for handle in self.subscriptions.lock().drain(..) {
            handle.abort();
        }
    }

    /// Handle transaction announcements from `peer`.
    ///
    /// A hash is requested only if no peer has it outstanding and the syncer
    /// still wants it. Accepted hashes are fetched from the announcing peer.
    pub fn handle_inventory_items(&self, peer: &dyn Peer, items: &[InventoryItem]) {
        let candidates: Vec<Hash256> = items
            .iter()
            .filter(|item| item.object_type.is_transaction())
            .map(|item| item.hash)
            .filter(|hash| !self.requested.is_requested(hash))
            .filter(|hash| self.transaction_syncer.should_request_transaction(hash))
            .collect();

        if candidates.is_empty() {
            return;
        }

        // Re-checked under the ledger lock: another peer may have claimed
        // some of these since the filter above.
        let hashes = self.requested.claim(peer.host(), candidates);
        if hashes.is_empty() {
            trace!(peer = %peer.host(), "All announced transactions already requested");
            return;
        }

        let chunk_size = self.config.max_hashes_per_request.max(1);
        let mut tasks = 0;
        for chunk in hashes.chunks(chunk_size) {
            peer.add_task(PeerTask::RequestTransactions(RequestTransactionsTask::new(
                chunk.to_vec(),
            )));
            tasks += 1;
        }

        debug!(
            peer = %peer.host(),
            count = hashes.len(),
            tasks,
            "Requesting mempool transactions"
        );
    }

    /// Handle a task `peer` has finished.
    ///
    /// Returns `false` for anything but a transaction fetch.
    pub fn handle_completed_task(&self, peer: &dyn Peer, task: &PeerTask) -> bool {
        let PeerTask::RequestTransactions(task) = task else {
            return false;
        };

        let released = self.requested.release(peer.host(), &task.hashes);

        debug!(
            peer = %peer.host(),
            requested = task.hashes.len(),
            received = task.transactions.len(),
            released,
            "Mempool transaction request completed"
        );

        if task.transactions.is_empty() {
            return true;
        }

        if let Err(e) = self.transaction_syncer.handle_relayed(&task.transactions) {
            warn!(peer = %peer.host(), error = %e, "Syncer failed to handle relayed transactions");
        }

        if let Some(sender) = &self.transaction_sender {
            if let Err(e) = sender.transactions_relayed(&task.transactions) {
                warn!(peer = %peer.host(), error = %e, "Sender failed to handle relayed transactions");
            }
        }

        true
    }

    /// Forget everything requested from `peer`.
    ///
    /// Dropped hashes are not re-requested elsewhere; the next announcement
    /// from any peer picks them up again.
    pub fn on_peer_disconnect(&self, peer: &dyn Peer) {
        self.handle_disconnect(peer, None);
    }

    fn handle_disconnect(&self, peer: &dyn Peer, error: Option<&NetworkError>) {
        let dropped = self.requested.drop_peer(peer.host());
        if dropped.is_empty() {
            trace!(peer = %peer.host(), "Peer disconnected with no outstanding requests");
            return;
        }
        match error {
            Some(e) => info!(
                peer = %peer.host(),
                dropped = dropped.len(),
                error = %e,
                "Peer disconnected, dropping outstanding transaction requests"
            ),
            None => info!(
                peer = %peer.host(),
                dropped = dropped.len(),
                "Peer disconnected, dropping outstanding transaction requests"
            ),
        }
    }

    /// Whether `hash` is outstanding under any peer.
    pub fn is_transaction_requested(&self, hash: &Hash256) -> bool {
        self.requested.is_requested(hash)
    }

    /// Hashes outstanding under the peer with `host`.
    pub fn requested_hashes(&self, host: &str) -> Vec<Hash256> {
        self.requested.requested_for(host)
    }

    /// The underlying ledger.
    pub fn ledger(&self) -> &RequestedTransactions {
        &self.requested
    }
}

impl Drop for MempoolTransactions {
    fn drop(&mut self) {
        self.unsubscribe_all();
    }
}

impl InventoryItemsHandler for MempoolTransactions {
    fn handle_inventory_items(&self, peer: &dyn Peer, items: &[InventoryItem]) {
        MempoolTransactions::handle_inventory_items(self, peer, items)
    }
}

impl PeerTaskHandler for MempoolTransactions {
    fn handle_completed_task(&self, peer: &dyn Peer, task: &PeerTask) -> bool {
        MempoolTransactions::handle_completed_task(self, peer, task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SyncError, SyncResult};
    use spv_chain::Transaction;
    use spv_network::{InventoryType, PeerGroupEvents, SendTransactionTask};
    use std::collections::HashSet;
    use std::time::Duration;

    struct TestPeer {
        host: String,
        tasks: Mutex<Vec<PeerTask>>,
    }

    impl TestPeer {
        fn new(host: &str) -> Arc<Self> {
            Arc::new(Self {
                host: host.to_string(),
                tasks: Mutex::new(Vec::new()),
            })
        }

        fn requested(&self) -> Vec<Vec<Hash256>> {
            self.tasks
                .lock()
                .iter()
                .filter_map(|t| match t {
                    PeerTask::RequestTransactions(r) => Some(r.hashes.clone()),
                    _ => None,
                })
                .collect()
        }
    }

    impl Peer for TestPeer {
        fn host(&self) -> &str {
            &self.host
        }

        fn add_task(&self, task: PeerTask) {
            self.tasks.lock().push(task);
        }
    }

    #[derive(Default)]
    struct TestSyncer {
        known: HashSet<Hash256>,
        relayed: Mutex<Vec<Hash256>>,
        fail: bool,
    }

    impl TransactionSyncer for TestSyncer {
        fn handle_relayed(&self, transactions: &[Transaction]) -> SyncResult<()> {
            self.relayed
                .lock()
                .extend(transactions.iter().map(|t| t.hash));
            if self.fail {
                return Err(SyncError::Storage("disk full".into()));
            }
            Ok(())
        }

        fn should_request_transaction(&self, hash: &Hash256) -> bool {
            !self.known.contains(hash)
        }
    }

    #[derive(Default)]
    struct TestSender {
        relayed: Mutex<Vec<Hash256>>,
    }

    impl TransactionSender for TestSender {
        fn transactions_relayed(&self, transactions: &[Transaction]) -> SyncResult<()> {
            self.relayed
                .lock()
                .extend(transactions.iter().map(|t| t.hash));
            Ok(())
        }
    }

    fn hash(seed: u8) -> Hash256 {
        Hash256([seed; 32])
    }

    fn tx_items(seeds: &[u8]) -> Vec<InventoryItem> {
        seeds.iter().map(|s| InventoryItem::transaction(hash(*s))).collect()
    }

    fn completed(hashes: &[u8], received: &[u8]) -> PeerTask {
        let mut task = RequestTransactionsTask::new(hashes.iter().map(|s| hash(*s)).collect());
        for seed in received {
            task.handle_transaction(Transaction::new(hash(*seed)));
        }
        PeerTask::RequestTransactions(task)
    }

    fn tracker(syncer: TestSyncer) -> (MempoolTransactions, Arc<TestSyncer>) {
        let syncer = Arc::new(syncer);
        (MempoolTransactions::new(syncer.clone(), None), syncer)
    }

    #[test]
    fn test_inventory_issues_single_task() {
        let (tracker, _) = tracker(TestSyncer::default());
        let peer = TestPeer::new("p");

        tracker.handle_inventory_items(peer.as_ref(), &tx_items(&[1, 2, 3]));

        assert_eq!(peer.requested(), vec![vec![hash(1), hash(2), hash(3)]]);
        assert_eq!(tracker.requested_hashes("p"), vec![hash(1), hash(2), hash(3)]);
    }

    #[test]
    fn test_inventory_ignores_non_transactions() {
        let (tracker, _) = tracker(TestSyncer::default());
        let peer = TestPeer::new("p");

        let items = vec![
            InventoryItem::new(InventoryType::Block, hash(1)),
            InventoryItem::new(InventoryType::FilteredBlock, hash(2)),
        ];
        tracker.handle_inventory_items(peer.as_ref(), &items);

        assert!(peer.requested().is_empty());
        assert!(tracker.ledger().is_empty());
    }

    #[test]
    fn test_inventory_skips_unwanted() {
        let (tracker, _) = tracker(TestSyncer {
            known: [hash(2)].into_iter().collect(),
            ..Default::default()
        });
        let peer = TestPeer::new("p");

        tracker.handle_inventory_items(peer.as_ref(), &tx_items(&[1, 2]));

        assert_eq!(peer.requested(), vec![vec![hash(1)]]);
    }

    #[test]
    fn test_cross_peer_dedup() {
        let (tracker, _) = tracker(TestSyncer::default());
        let p = TestPeer::new("p");
        let q = TestPeer::new("q");

        tracker.handle_inventory_items(p.as_ref(), &tx_items(&[1, 2, 3]));
        tracker.handle_inventory_items(q.as_ref(), &tx_items(&[1, 4]));
        tracker.handle_inventory_items(q.as_ref(), &tx_items(&[2]));

        assert_eq!(q.requested(), vec![vec![hash(4)]]);
        assert_eq!(tracker.requested_hashes("q"), vec![hash(4)]);
    }

    #[test]
    fn test_batch_split_by_config() {
        let syncer = Arc::new(TestSyncer::default());
        let tracker = MempoolTransactions::with_config(
            RelayConfig {
                max_hashes_per_request: 2,
            },
            syncer,
            None,
        );
        let peer = TestPeer::new("p");

        tracker.handle_inventory_items(peer.as_ref(), &tx_items(&[1, 2, 3, 4, 5]));

        assert_eq!(
            peer.requested(),
            vec![
                vec![hash(1), hash(2)],
                vec![hash(3), hash(4)],
                vec![hash(5)]
            ]
        );
    }

    #[test]
    fn test_completed_task_clears_all_hashes() {
        let syncer = Arc::new(TestSyncer::default());
        let sender = Arc::new(TestSender::default());
        let tracker = MempoolTransactions::new(syncer.clone(), Some(sender.clone()));
        let peer = TestPeer::new("p");
        tracker.handle_inventory_items(peer.as_ref(), &tx_items(&[1, 2, 3]));

        // Only two of three arrived; all three must be released.
        let handled = tracker.handle_completed_task(peer.as_ref(), &completed(&[1, 2, 3], &[1, 3]));

        assert!(handled);
        assert!(tracker.requested_hashes("p").is_empty());
        assert!(!tracker.is_transaction_requested(&hash(2)));
        assert_eq!(*syncer.relayed.lock(), vec![hash(1), hash(3)]);
        assert_eq!(*sender.relayed.lock(), vec![hash(1), hash(3)]);
    }

    #[test]
    fn test_completed_task_survives_syncer_failure() {
        let (tracker, syncer) = tracker(TestSyncer {
            fail: true,
            ..Default::default()
        });
        let peer = TestPeer::new("p");
        tracker.handle_inventory_items(peer.as_ref(), &tx_items(&[1]));

        assert!(tracker.handle_completed_task(peer.as_ref(), &completed(&[1], &[1])));
        assert!(tracker.ledger().is_empty());
        assert_eq!(*syncer.relayed.lock(), vec![hash(1)]);
    }

    #[test]
    fn test_other_tasks_not_handled() {
        let (tracker, _) = tracker(TestSyncer::default());
        let peer = TestPeer::new("p");
        let task = PeerTask::SendTransaction(SendTransactionTask::new(Transaction::new(hash(1))));

        assert!(!tracker.handle_completed_task(peer.as_ref(), &task));
    }

    #[test]
    fn test_disconnect_drops_entry() {
        let (tracker, _) = tracker(TestSyncer::default());
        let p = TestPeer::new("p");
        tracker.handle_inventory_items(p.as_ref(), &tx_items(&[1, 2]));

        tracker.on_peer_disconnect(p.as_ref());

        assert!(!tracker.ledger().has_peer("p"));
        assert!(!tracker.is_transaction_requested(&hash(1)));

        // Late completion from the dropped peer leaves the ledger untouched.
        let q = TestPeer::new("q");
        tracker.handle_inventory_items(q.as_ref(), &tx_items(&[1]));
        assert!(tracker.handle_completed_task(p.as_ref(), &completed(&[1, 2], &[])));
        assert_eq!(tracker.requested_hashes("q"), vec![hash(1)]);
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
        for _ in 0..100 {
            if condition() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        condition()
    }

    #[tokio::test]
    async fn test_subscription_handles_disconnect_events() {
        let (tracker, _) = tracker(TestSyncer::default());
        let tracker = Arc::new(tracker);
        let events = PeerGroupEvents::new();
        tracker.subscribe_to(events.subscribe()).unwrap();

        let peer = TestPeer::new("p");
        tracker.handle_inventory_items(peer.as_ref(), &tx_items(&[1]));

        events.publish(PeerGroupEvent::OnPeerConnect(peer.clone()));
        assert!(tracker.ledger().has_peer("p"));

        events.publish(PeerGroupEvent::OnPeerDisconnect {
            peer: peer.clone(),
            error: Some(NetworkError::ConnectionClosed),
        });

        assert!(wait_until(|| !tracker.ledger().has_peer("p")).await);
    }

    #[test]
    fn test_subscribe_outside_runtime_fails() {
        let (tracker, _) = tracker(TestSyncer::default());
        let tracker = Arc::new(tracker);
        let events = PeerGroupEvents::new();

        let err = tracker.subscribe_to(events.subscribe()).unwrap_err();
        assert!(matches!(err, SyncError::NoRuntime(_)));
        assert!(tracker.subscriptions.lock().is_empty());
    }

    #[tokio::test]
    async fn test_drop_ends_subscription() {
        let (tracker, _) = tracker(TestSyncer::default());
        let tracker = Arc::new(tracker);
        let events = PeerGroupEvents::new();
        tracker.subscribe_to(events.subscribe()).unwrap();
        assert_eq!(events.subscriber_count(), 1);

        drop(tracker);

        assert!(wait_until(|| events.subscriber_count() == 0).await);
    }
}
