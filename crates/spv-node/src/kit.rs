//! Component assembly.

use crate::KitConfig;
use anyhow::Context;
use spv_network::{InventoryItemsHandlerChain, PeerGroupEvents, PeerTaskHandlerChain};
use spv_sync::{MempoolTransactions, TransactionSender, TransactionSyncer};
use spv_wallet::{
    AccumulativeSelector, AddressConverter, BitcoinSizeCalculator, InputSetter,
    MutableTransaction, PluginRegistry, PublicKeyManager, RelayDustCalculator, SelectorChain,
    SingleNoChangeSelector, TransactionDataSorterFactory, UnspentOutput, UnspentOutputProvider,
    WalletResult,
};
use std::sync::Arc;
use tracing::info;

/// Wallet-side collaborators the kit does not implement itself.
#[derive(Clone)]
pub struct WalletCollaborators {
    /// Spendable outputs.
    pub unspent_output_provider: Arc<dyn UnspentOutputProvider>,
    /// Address encoding.
    pub address_converter: Arc<dyn AddressConverter>,
    /// Change keys.
    pub public_key_manager: Arc<dyn PublicKeyManager>,
    /// Wallet transaction index.
    pub transaction_syncer: Arc<dyn TransactionSyncer>,
    /// Outbound sender, if any.
    pub transaction_sender: Option<Arc<dyn TransactionSender>>,
}

/// Relay tracker and input setter built from one configuration.
pub struct SpvKit {
    config: KitConfig,
    mempool_transactions: Arc<MempoolTransactions>,
    input_setter: InputSetter,
    plugins: Arc<PluginRegistry>,
}

impl SpvKit {
    /// Build the kit.
    ///
    /// Selection tries a single output without change first, then falls
    /// back to accumulating outputs.
    pub fn new(config: KitConfig, collaborators: WalletCollaborators) -> Self {
        let size_calculator = Arc::new(BitcoinSizeCalculator::new());
        let dust_calculator = Arc::new(RelayDustCalculator::new(
            config.wallet.dust_relay_fee_rate,
            size_calculator.clone(),
        ));

        let selector = SelectorChain::new()
            .with(Arc::new(SingleNoChangeSelector::new(
                collaborators.unspent_output_provider.clone(),
                size_calculator.clone(),
                dust_calculator.clone(),
            )))
            .with(Arc::new(
                AccumulativeSelector::new(
                    collaborators.unspent_output_provider.clone(),
                    size_calculator.clone(),
                    dust_calculator,
                )
                .with_max_inputs(config.wallet.max_inputs),
            ));

        let plugins = Arc::new(PluginRegistry::new());
        let input_setter = InputSetter::new(
            Arc::new(selector),
            size_calculator,
            collaborators.address_converter,
            collaborators.public_key_manager,
            plugins.clone(),
            Arc::new(TransactionDataSorterFactory::new()),
            config.wallet.change_script_type,
        );

        let mempool_transactions = Arc::new(MempoolTransactions::with_config(
            config.relay.clone(),
            collaborators.transaction_syncer,
            collaborators.transaction_sender,
        ));

        Self {
            config,
            mempool_transactions,
            input_setter,
            plugins,
        }
    }

    /// Subscribe the relay tracker to peer-group events.
    ///
    /// Fails outside a tokio runtime.
    pub fn start(&self, events: &PeerGroupEvents) -> anyhow::Result<()> {
        self.mempool_transactions
            .subscribe_to(events.subscribe())
            .context("Failed to subscribe relay tracker to peer events")?;
        info!(
            change_type = %self.config.wallet.change_script_type,
            max_hashes = self.config.relay.max_hashes_per_request,
            "SPV kit started"
        );
        Ok(())
    }

    /// Register the relay tracker with a peer group's handler chains.
    pub fn register_handlers(
        &self,
        inventory: &InventoryItemsHandlerChain,
        tasks: &PeerTaskHandlerChain,
    ) {
        inventory.add_handler(self.mempool_transactions.clone());
        tasks.add_handler(self.mempool_transactions.clone());
    }

    /// Fund a transaction using the configured sort order.
    pub fn set_inputs(
        &self,
        change_source: Option<&str>,
        transaction: &mut MutableTransaction,
        fee_rate: u64,
        sender_pay: bool,
    ) -> WalletResult<()> {
        self.input_setter.set_inputs(
            change_source,
            transaction,
            fee_rate,
            sender_pay,
            self.config.wallet.default_sort_type,
        )
    }

    /// Redeem a single P2SH output.
    pub fn redeem(
        &self,
        transaction: &mut MutableTransaction,
        unspent_output: &UnspentOutput,
        fee_rate: u64,
    ) -> WalletResult<()> {
        self.input_setter
            .set_inputs_from_output(transaction, unspent_output, fee_rate)
    }

    pub fn config(&self) -> &KitConfig {
        &self.config
    }

    pub fn mempool_transactions(&self) -> &Arc<MempoolTransactions> {
        &self.mempool_transactions
    }

    pub fn input_setter(&self) -> &InputSetter {
        &self.input_setter
    }

    /// Plugin registry consulted after inputs are set.
    pub fn plugins(&self) -> &Arc<PluginRegistry> {
        &self.plugins
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use spv_chain::{Address, Hash256, PublicKey, ScriptType, Transaction, TransactionOutput};
    use spv_network::{
        InventoryItem, InventoryItemsHandler, Peer, PeerGroupEvent, PeerTask, PeerTaskHandler,
        RequestTransactionsTask,
    };
    use spv_sync::SyncResult;
    use spv_wallet::{WalletError, WalletResult};
    use std::time::Duration;

    struct Utxos(Vec<UnspentOutput>);

    impl UnspentOutputProvider for Utxos {
        fn spendable_utxo(&self) -> Vec<UnspentOutput> {
            self.0.clone()
        }
    }

    struct Converter;

    impl AddressConverter for Converter {
        fn convert(&self, address: &str) -> WalletResult<Address> {
            Err(WalletError::InvalidAddress(address.to_string()))
        }

        fn convert_public_key(
            &self,
            public_key: &PublicKey,
            script_type: ScriptType,
        ) -> WalletResult<Address> {
            Ok(Address {
                script_type,
                payload: public_key.key_hash.clone(),
                string_value: format!("change-{}", public_key.index),
                locking_script: vec![],
            })
        }
    }

    struct Keys;

    impl PublicKeyManager for Keys {
        fn change_public_key(&self) -> WalletResult<PublicKey> {
            Ok(key())
        }
    }

    struct Syncer;

    impl TransactionSyncer for Syncer {
        fn handle_relayed(&self, _: &[Transaction]) -> SyncResult<()> {
            Ok(())
        }

        fn should_request_transaction(&self, _: &Hash256) -> bool {
            true
        }
    }

    struct Peer1 {
        tasks: Mutex<Vec<PeerTask>>,
    }

    impl Peer for Peer1 {
        fn host(&self) -> &str {
            "10.0.0.1"
        }

        fn add_task(&self, task: PeerTask) {
            self.tasks.lock().push(task);
        }
    }

    fn key() -> PublicKey {
        PublicKey {
            account: 0,
            index: 3,
            external: false,
            raw: vec![2; 33],
            key_hash: vec![1; 20],
        }
    }

    fn kit(values: &[u64]) -> SpvKit {
        let utxos = values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let output = TransactionOutput::new(
                    *v,
                    0,
                    Hash256([i as u8 + 1; 32]),
                    vec![],
                    ScriptType::P2wpkh,
                );
                UnspentOutput::new(output, key(), Some(1))
            })
            .collect();
        SpvKit::new(
            KitConfig::default(),
            WalletCollaborators {
                unspent_output_provider: Arc::new(Utxos(utxos)),
                address_converter: Arc::new(Converter),
                public_key_manager: Arc::new(Keys),
                transaction_syncer: Arc::new(Syncer),
                transaction_sender: None,
            },
        )
    }

    fn recipient() -> Address {
        Address {
            script_type: ScriptType::P2wpkh,
            payload: vec![9; 20],
            string_value: "bc1recipient".to_string(),
            locking_script: vec![],
        }
    }

    #[test]
    fn test_set_inputs_balances() {
        let kit = kit(&[60_000, 80_000]);
        let mut tx = MutableTransaction::new(recipient(), 100_000);

        kit.set_inputs(None, &mut tx, 2, true).unwrap();

        assert_eq!(tx.inputs_to_sign().len(), 2);
        assert_eq!(tx.recipient_value, 100_000);
        let change = tx.change.as_ref().unwrap();
        assert_eq!(change.address.string_value, "change-3");
        assert_eq!(change.address.script_type, ScriptType::P2wpkh);
        assert_eq!(
            tx.recipient_value + change.value + tx.fee().unwrap(),
            140_000
        );
    }

    #[test]
    fn test_set_inputs_insufficient() {
        let kit = kit(&[10_000]);
        let mut tx = MutableTransaction::new(recipient(), 100_000);

        let err = kit.set_inputs(None, &mut tx, 2, true).unwrap_err();
        assert!(matches!(err, WalletError::InsufficientFunds { .. }));
    }

    #[test]
    fn test_set_inputs_empty_wallet_is_insufficient() {
        let kit = kit(&[]);
        let mut tx = MutableTransaction::new(recipient(), 100_000);

        let err = kit.set_inputs(None, &mut tx, 2, true).unwrap_err();
        assert!(matches!(
            err,
            WalletError::InsufficientFunds { available: 0, .. }
        ));
        assert!(tx.inputs_to_sign().is_empty());
        assert!(tx.change.is_none());
    }

    #[test]
    fn test_registered_handlers_reach_tracker() {
        let kit = kit(&[]);
        let inventory = InventoryItemsHandlerChain::new();
        let tasks = PeerTaskHandlerChain::new();
        kit.register_handlers(&inventory, &tasks);

        let peer = Peer1 {
            tasks: Mutex::new(Vec::new()),
        };
        let hash = Hash256([7; 32]);
        inventory.handle_inventory_items(&peer, &[InventoryItem::transaction(hash)]);
        assert!(kit.mempool_transactions().is_transaction_requested(&hash));

        let task = PeerTask::RequestTransactions(RequestTransactionsTask::new(vec![hash]));
        assert!(tasks.handle_completed_task(&peer, &task));
        assert!(!kit.mempool_transactions().is_transaction_requested(&hash));
    }

    #[test]
    fn test_start_outside_runtime_fails() {
        let kit = kit(&[]);
        let events = PeerGroupEvents::new();

        assert!(kit.start(&events).is_err());
        assert_eq!(events.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_start_handles_disconnects() {
        let kit = kit(&[]);
        let events = PeerGroupEvents::new();
        kit.start(&events).unwrap();

        let peer = Arc::new(Peer1 {
            tasks: Mutex::new(Vec::new()),
        });
        let hash = Hash256([8; 32]);
        kit.mempool_transactions()
            .handle_inventory_items(peer.as_ref(), &[InventoryItem::transaction(hash)]);
        assert_eq!(peer.tasks.lock().len(), 1);

        events.publish(PeerGroupEvent::OnPeerDisconnect {
            peer: peer.clone(),
            error: None,
        });

        for _ in 0..100 {
            if !kit.mempool_transactions().is_transaction_requested(&hash) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(kit.mempool_transactions().requested_hashes("10.0.0.1").is_empty());
    }
}
