//! Test harness for integration tests.
//!
//! Provides mock peers, recording collaborators for the relay tracker and
//! stub collaborators for the input setter.

use crate::generators::{test_public_key, test_transaction};
use parking_lot::Mutex;
use spv_chain::{Address, Hash256, PublicKey, ScriptType, Transaction, TransactionOutput};
use spv_network::{Peer, PeerTask, RequestTransactionsTask};
use spv_sync::{SyncError, SyncResult, TransactionSender, TransactionSyncer};
use spv_wallet::{
    AddressConverter, InputSetter, MutableTransaction, Plugin, PluginError, PluginManager,
    PluginRegistry, PublicKeyManager, SelectionResult, TransactionDataSorterFactory,
    TransactionSizeCalculator, UnspentOutput, UnspentOutputProvider, UnspentOutputSelector,
    WalletError, WalletResult,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

// ============================================================================
// Relay collaborators
// ============================================================================

/// Peer that records the tasks it is given.
pub struct MockPeer {
    host: String,
    tasks: Mutex<Vec<PeerTask>>,
}

impl MockPeer {
    pub fn new(host: &str) -> Arc<Self> {
        Arc::new(Self {
            host: host.to_string(),
            tasks: Mutex::new(Vec::new()),
        })
    }

    /// All tasks received so far.
    pub fn tasks(&self) -> Vec<PeerTask> {
        self.tasks.lock().clone()
    }

    pub fn task_count(&self) -> usize {
        self.tasks.lock().len()
    }

    /// Fetch tasks received so far.
    pub fn request_tasks(&self) -> Vec<RequestTransactionsTask> {
        self.tasks
            .lock()
            .iter()
            .filter_map(|task| match task {
                PeerTask::RequestTransactions(request) => Some(request.clone()),
                _ => None,
            })
            .collect()
    }

    /// Every hash this peer was asked for.
    pub fn requested_hashes(&self) -> Vec<Hash256> {
        self.request_tasks()
            .into_iter()
            .flat_map(|task| task.hashes)
            .collect()
    }

    /// Take the oldest fetch task and fill it with every requested
    /// transaction, as a well-behaved peer would.
    pub fn complete_next(&self) -> Option<PeerTask> {
        let mut tasks = self.tasks.lock();
        let position = tasks
            .iter()
            .position(|task| matches!(task, PeerTask::RequestTransactions(_)))?;
        let PeerTask::RequestTransactions(mut request) = tasks.remove(position) else {
            return None;
        };
        for hash in request.hashes.clone() {
            request.handle_transaction(test_transaction(hash));
        }
        Some(PeerTask::RequestTransactions(request))
    }
}

impl Peer for MockPeer {
    fn host(&self) -> &str {
        &self.host
    }

    fn add_task(&self, task: PeerTask) {
        self.tasks.lock().push(task);
    }
}

/// Syncer that wants every hash except those marked known.
#[derive(Default)]
pub struct RecordingSyncer {
    known: Mutex<HashSet<Hash256>>,
    relayed: Mutex<Vec<Hash256>>,
    failing: AtomicBool,
}

impl RecordingSyncer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Mark a hash as already known, so it is no longer requested.
    pub fn mark_known(&self, hash: Hash256) {
        self.known.lock().insert(hash);
    }

    /// Make `handle_relayed` fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Hashes of every transaction handed over, in order.
    pub fn relayed(&self) -> Vec<Hash256> {
        self.relayed.lock().clone()
    }
}

impl TransactionSyncer for RecordingSyncer {
    fn handle_relayed(&self, transactions: &[Transaction]) -> SyncResult<()> {
        self.relayed
            .lock()
            .extend(transactions.iter().map(|tx| tx.hash));
        if self.failing.load(Ordering::SeqCst) {
            return Err(SyncError::Storage("disk full".to_string()));
        }
        Ok(())
    }

    fn should_request_transaction(&self, hash: &Hash256) -> bool {
        !self.known.lock().contains(hash)
    }
}

/// Sender that records relayed hashes.
#[derive(Default)]
pub struct RecordingSender {
    relayed: Mutex<Vec<Hash256>>,
    failing: AtomicBool,
}

impl RecordingSender {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn relayed(&self) -> Vec<Hash256> {
        self.relayed.lock().clone()
    }
}

impl TransactionSender for RecordingSender {
    fn transactions_relayed(&self, transactions: &[Transaction]) -> SyncResult<()> {
        self.relayed
            .lock()
            .extend(transactions.iter().map(|tx| tx.hash));
        if self.failing.load(Ordering::SeqCst) {
            return Err(SyncError::Internal("sender offline".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// Builder collaborators
// ============================================================================

/// Converter that accepts any address not starting with `bad`.
pub struct StubAddressConverter;

impl AddressConverter for StubAddressConverter {
    fn convert(&self, address: &str) -> WalletResult<Address> {
        if address.starts_with("bad") {
            return Err(WalletError::InvalidAddress(address.to_string()));
        }
        Ok(Address {
            script_type: ScriptType::P2pkh,
            payload: vec![0x22; 20],
            string_value: address.to_string(),
            locking_script: vec![0x76, 0xa9, 0x14],
        })
    }

    fn convert_public_key(
        &self,
        public_key: &PublicKey,
        script_type: ScriptType,
    ) -> WalletResult<Address> {
        Ok(Address {
            script_type,
            payload: public_key.key_hash.clone(),
            string_value: format!("change/{}", public_key.path()),
            locking_script: vec![0x00, 0x14],
        })
    }
}

/// Hands out change keys with increasing indices up to a limit.
pub struct SequentialKeyManager {
    next: AtomicU32,
    limit: u32,
}

impl SequentialKeyManager {
    pub fn new(limit: u32) -> Self {
        Self {
            next: AtomicU32::new(0),
            limit,
        }
    }

    /// Keys handed out so far.
    pub fn issued(&self) -> u32 {
        self.next.load(Ordering::SeqCst).min(self.limit)
    }
}

impl PublicKeyManager for SequentialKeyManager {
    fn change_public_key(&self) -> WalletResult<PublicKey> {
        let index = self.next.fetch_add(1, Ordering::SeqCst);
        if index >= self.limit {
            return Err(WalletError::NoKeysAvailable);
        }
        Ok(test_public_key(index))
    }
}

/// Size calculator returning a fixed size.
pub struct FixedSizeCalculator(pub u64);

impl TransactionSizeCalculator for FixedSizeCalculator {
    fn transaction_size(&self, _: &[TransactionOutput], _: &[ScriptType], _: u64) -> u64 {
        self.0
    }

    fn output_size(&self, _: ScriptType) -> u64 {
        34
    }

    fn input_size(&self, _: ScriptType) -> u64 {
        148
    }
}

/// Selector returning a canned result, or insufficient funds.
pub struct FixedSelector {
    result: Option<SelectionResult>,
    calls: Mutex<Vec<(u64, u64, bool, u64)>>,
}

impl FixedSelector {
    pub fn returning(result: SelectionResult) -> Self {
        Self {
            result: Some(result),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn insufficient() -> Self {
        Self {
            result: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// `(value, fee_rate, sender_pay, plugin_data_output_size)` per call.
    pub fn calls(&self) -> Vec<(u64, u64, bool, u64)> {
        self.calls.lock().clone()
    }
}

impl UnspentOutputSelector for FixedSelector {
    fn select(
        &self,
        value: u64,
        fee_rate: u64,
        _output_script_type: ScriptType,
        _change_type: ScriptType,
        sender_pay: bool,
        plugin_data_output_size: u64,
    ) -> WalletResult<SelectionResult> {
        self.calls
            .lock()
            .push((value, fee_rate, sender_pay, plugin_data_output_size));
        self.result
            .clone()
            .ok_or(WalletError::InsufficientFunds {
                needed: value,
                available: 0,
            })
    }
}

/// Provider over a fixed set of outputs.
pub struct VecProvider(pub Vec<UnspentOutput>);

impl UnspentOutputProvider for VecProvider {
    fn spendable_utxo(&self) -> Vec<UnspentOutput> {
        self.0.clone()
    }
}

/// Plugin that records calls into a shared log and attaches data.
pub struct RecordingPlugin {
    id: u8,
    data: Vec<u8>,
    fail: bool,
    log: Arc<Mutex<Vec<u8>>>,
}

impl RecordingPlugin {
    pub fn new(id: u8, data: Vec<u8>, log: &Arc<Mutex<Vec<u8>>>) -> Arc<Self> {
        Arc::new(Self {
            id,
            data,
            fail: false,
            log: log.clone(),
        })
    }

    pub fn failing(id: u8, log: &Arc<Mutex<Vec<u8>>>) -> Arc<Self> {
        Arc::new(Self {
            id,
            data: Vec::new(),
            fail: true,
            log: log.clone(),
        })
    }
}

impl Plugin for RecordingPlugin {
    fn id(&self) -> u8 {
        self.id
    }

    fn process_inputs(&self, transaction: &mut MutableTransaction) -> Result<(), PluginError> {
        self.log.lock().push(self.id);
        if self.fail {
            return Err(format!("plugin {} rejected inputs", self.id).into());
        }
        if transaction.inputs_to_sign().is_empty() {
            return Err("no inputs to process".into());
        }
        transaction.add_plugin_data(self.id, self.data.clone());
        Ok(())
    }
}

/// Input setter over the given selector and plugins, with stub keys and
/// addresses, a fixed 180 vB size and P2WPKH change.
pub fn test_input_setter(
    selector: Arc<dyn UnspentOutputSelector>,
    plugins: Arc<dyn PluginManager>,
) -> InputSetter {
    InputSetter::new(
        selector,
        Arc::new(FixedSizeCalculator(180)),
        Arc::new(StubAddressConverter),
        Arc::new(SequentialKeyManager::new(100)),
        plugins,
        Arc::new(TransactionDataSorterFactory::new()),
        ScriptType::P2wpkh,
    )
}

/// Empty plugin registry.
pub fn no_plugins() -> Arc<PluginRegistry> {
    Arc::new(PluginRegistry::new())
}
