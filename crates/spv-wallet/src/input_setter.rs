//! Transaction input construction.
//!
//! Two entry points fill a [`MutableTransaction`] with unsigned inputs:
//! - [`InputSetter::set_inputs`] funds a payment from the wallet's
//!   spendable outputs, resolving change and running plugins
//! - [`InputSetter::set_inputs_from_output`] redeems one known P2SH output,
//!   paying everything but the fee to the recipient

use crate::{
    AddressConverter, InputToSign, MutableTransaction, PluginManager, PublicKeyManager,
    SorterFactory, TransactionDataSortType, TransactionSizeCalculator, UnspentOutput,
    UnspentOutputSelector, WalletError, WalletResult,
};
use spv_chain::{Address, ScriptType, SEQUENCE_RBF_LOCKTIME};
use std::sync::Arc;
use tracing::{debug, info};

/// Populates transactions with inputs, change and plugin data.
///
/// Holds no per-call state, so one instance may serve concurrent builds of
/// independent transactions.
pub struct InputSetter {
    /// Output selection.
    selector: Arc<dyn UnspentOutputSelector>,
    /// Size estimation.
    size_calculator: Arc<dyn TransactionSizeCalculator>,
    /// Address decoding and encoding.
    address_converter: Arc<dyn AddressConverter>,
    /// Change keys.
    public_key_manager: Arc<dyn PublicKeyManager>,
    /// Input-processing plugins.
    plugin_manager: Arc<dyn PluginManager>,
    /// Input ordering.
    sorter_factory: Arc<dyn SorterFactory>,
    /// Script template for change outputs.
    change_script_type: ScriptType,
}

impl InputSetter {
    /// Create an input setter.
    pub fn new(
        selector: Arc<dyn UnspentOutputSelector>,
        size_calculator: Arc<dyn TransactionSizeCalculator>,
        address_converter: Arc<dyn AddressConverter>,
        public_key_manager: Arc<dyn PublicKeyManager>,
        plugin_manager: Arc<dyn PluginManager>,
        sorter_factory: Arc<dyn SorterFactory>,
        change_script_type: ScriptType,
    ) -> Self {
        Self {
            selector,
            size_calculator,
            address_converter,
            public_key_manager,
            plugin_manager,
            sorter_factory,
            change_script_type,
        }
    }

    /// Script template used for change outputs.
    pub fn change_script_type(&self) -> ScriptType {
        self.change_script_type
    }

    /// Fund `transaction` from the wallet's spendable outputs.
    ///
    /// `change_source` is an encoded address to send change to; when absent
    /// or empty a fresh change key is used. Selector, address and plugin
    /// failures are returned as-is. On error the transaction may already
    /// hold inputs and must be discarded.
    pub fn set_inputs(
        &self,
        change_source: Option<&str>,
        transaction: &mut MutableTransaction,
        fee_rate: u64,
        sender_pay: bool,
        sort_type: TransactionDataSortType,
    ) -> WalletResult<()> {
        let value = transaction.recipient_value;
        let selection = self.selector.select(
            value,
            fee_rate,
            transaction.recipient_address.script_type,
            self.change_script_type,
            sender_pay,
            transaction.plugin_data_output_size(),
        )?;

        let sorted = self
            .sorter_factory
            .sorter(sort_type)
            .sort_unspent_outputs(selection.unspent_outputs);

        for unspent_output in &sorted {
            transaction.add_input_to_sign(InputToSign::new(unspent_output, SEQUENCE_RBF_LOCKTIME))?;
        }

        transaction.recipient_value = selection.recipient_value;

        if let Some(change_value) = selection.change_value {
            let address = self.change_address(change_source)?;
            debug!(address = %address, value = change_value, "Attached change output");
            transaction.set_change(address, change_value);
        }

        self.plugin_manager.process_inputs(transaction)?;

        info!(
            inputs = sorted.len(),
            recipient = transaction.recipient_value,
            change = transaction.change_value(),
            fee = ?transaction.fee(),
            sort = %sort_type,
            "Set transaction inputs"
        );
        Ok(())
    }

    /// Spend a single P2SH output, paying its value minus the fee to the
    /// recipient.
    ///
    /// The fee is `size * fee_rate` for a one-input, one-output transaction.
    /// Fails with [`WalletError::FeeExceedsValue`] when the fee would consume
    /// the whole output.
    pub fn set_inputs_from_output(
        &self,
        transaction: &mut MutableTransaction,
        unspent_output: &UnspentOutput,
        fee_rate: u64,
    ) -> WalletResult<()> {
        let script_type = unspent_output.output.script_type;
        if script_type != ScriptType::P2sh {
            return Err(WalletError::UnsupportedScriptType(script_type));
        }

        let size = self.size_calculator.transaction_size(
            std::slice::from_ref(&unspent_output.output),
            &[transaction.recipient_address.script_type],
            0,
        );
        let fee = size.saturating_mul(fee_rate);
        let value = unspent_output.value();
        if fee >= value {
            return Err(WalletError::FeeExceedsValue { fee, value });
        }

        transaction.add_input_to_sign(InputToSign::new(unspent_output, SEQUENCE_RBF_LOCKTIME))?;
        transaction.recipient_value = value - fee;

        info!(
            out_point = %unspent_output.out_point(),
            size,
            fee,
            recipient = transaction.recipient_value,
            "Set redemption input"
        );
        Ok(())
    }

    fn change_address(&self, change_source: Option<&str>) -> WalletResult<Address> {
        match change_source.filter(|s| !s.is_empty()) {
            Some(encoded) => self.address_converter.convert(encoded),
            None => {
                let public_key = self.public_key_manager.change_public_key()?;
                self.address_converter
                    .convert_public_key(&public_key, self.change_script_type)
            }
        }
    }
}
