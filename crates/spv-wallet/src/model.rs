//! Transaction construction model.

use crate::{WalletError, WalletResult};
use spv_chain::{
    Address, OutPoint, PublicKey, ScriptType, TransactionInput, TransactionOutput, OP_RETURN,
};
use std::collections::BTreeMap;

/// A wallet output available for spending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnspentOutput {
    /// The output itself.
    pub output: TransactionOutput,
    /// Wallet key the output pays to.
    pub public_key: PublicKey,
    /// Height of the block containing it; `None` while in the mempool.
    pub block_height: Option<u32>,
}

impl UnspentOutput {
    /// Create an unspent output.
    pub fn new(output: TransactionOutput, public_key: PublicKey, block_height: Option<u32>) -> Self {
        Self {
            output,
            public_key,
            block_height,
        }
    }

    /// Output value in satoshis.
    pub fn value(&self) -> u64 {
        self.output.value
    }

    /// Outpoint spending this output.
    pub fn out_point(&self) -> OutPoint {
        self.output.out_point()
    }
}

/// An unsigned input together with what the signer needs to sign it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputToSign {
    /// The input; its signature script stays empty until signing.
    pub input: TransactionInput,
    /// Output being spent.
    pub previous_output: TransactionOutput,
    /// Key that signs for the previous output.
    pub previous_output_public_key: PublicKey,
}

impl InputToSign {
    /// Input spending `unspent_output` with the given sequence.
    pub fn new(unspent_output: &UnspentOutput, sequence: u32) -> Self {
        Self {
            input: TransactionInput::new(unspent_output.out_point(), Vec::new(), sequence),
            previous_output: unspent_output.output.clone(),
            previous_output_public_key: unspent_output.public_key.clone(),
        }
    }
}

/// Change returned to the wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeOutput {
    /// Change address.
    pub address: Address,
    /// Change value in satoshis.
    pub value: u64,
}

/// An output of the transaction being built, before signing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedOutput {
    /// Value in satoshis.
    pub value: u64,
    /// Locking script.
    pub locking_script: Vec<u8>,
    /// Script type.
    pub script_type: ScriptType,
}

/// Selected outputs and the resulting value split.
///
/// `recipient_value + change_value + fee == total_value()`, with the fee
/// being whatever remains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionResult {
    /// Outputs to spend.
    pub unspent_outputs: Vec<UnspentOutput>,
    /// Value paid to the recipient.
    pub recipient_value: u64,
    /// Change value, if a change output is worth creating.
    pub change_value: Option<u64>,
}

impl SelectionResult {
    /// Sum of selected output values.
    pub fn total_value(&self) -> u64 {
        self.unspent_outputs.iter().map(UnspentOutput::value).sum()
    }

    /// Implied fee; `None` if recipient and change exceed the inputs.
    pub fn fee(&self) -> Option<u64> {
        self.total_value()
            .checked_sub(self.recipient_value)?
            .checked_sub(self.change_value.unwrap_or(0))
    }
}

/// A transaction under construction.
///
/// Inputs are append-only; the recipient value is adjusted downwards as fee
/// and change are resolved.
#[derive(Debug, Clone)]
pub struct MutableTransaction {
    /// Recipient address.
    pub recipient_address: Address,
    /// Value paid to the recipient.
    pub recipient_value: u64,
    /// Change output, if any.
    pub change: Option<ChangeOutput>,
    /// Version.
    pub version: i32,
    /// nLockTime.
    pub lock_time: u32,
    /// Inputs in signing order.
    inputs_to_sign: Vec<InputToSign>,
    /// Extra data per plugin id, carried in an `OP_RETURN` output.
    plugin_data: BTreeMap<u8, Vec<u8>>,
}

impl MutableTransaction {
    /// Start a transaction paying `recipient_value` to `recipient_address`.
    pub fn new(recipient_address: Address, recipient_value: u64) -> Self {
        Self {
            recipient_address,
            recipient_value,
            change: None,
            version: 2,
            lock_time: 0,
            inputs_to_sign: Vec::new(),
            plugin_data: BTreeMap::new(),
        }
    }

    /// Inputs added so far.
    pub fn inputs_to_sign(&self) -> &[InputToSign] {
        &self.inputs_to_sign
    }

    /// Append an input.
    pub fn add_input_to_sign(&mut self, input: InputToSign) -> WalletResult<()> {
        let out_point = input.input.previous_output;
        if self
            .inputs_to_sign
            .iter()
            .any(|i| i.input.previous_output == out_point)
        {
            return Err(WalletError::DuplicateInput(out_point));
        }
        self.inputs_to_sign.push(input);
        Ok(())
    }

    /// Attach a change output.
    pub fn set_change(&mut self, address: Address, value: u64) {
        self.change = Some(ChangeOutput { address, value });
    }

    /// Change value, zero without change.
    pub fn change_value(&self) -> u64 {
        self.change.as_ref().map_or(0, |c| c.value)
    }

    /// Set data for plugin `id`, replacing earlier data.
    pub fn add_plugin_data(&mut self, id: u8, data: Vec<u8>) {
        self.plugin_data.insert(id, data);
    }

    /// Plugin data by id.
    pub fn plugin_data(&self) -> &BTreeMap<u8, Vec<u8>> {
        &self.plugin_data
    }

    /// `OP_RETURN <id> <data> [<id> <data> ...]`, if any plugin data is set.
    pub fn plugin_data_script(&self) -> Option<Vec<u8>> {
        if self.plugin_data.is_empty() {
            return None;
        }
        let mut script = vec![OP_RETURN];
        for (id, data) in &self.plugin_data {
            push_data(&mut script, &[*id]);
            push_data(&mut script, data);
        }
        Some(script)
    }

    /// Serialized size of the plugin data output, zero without plugin data.
    pub fn plugin_data_output_size(&self) -> u64 {
        self.plugin_data_script().map_or(0, |script| {
            let len = script.len() as u64;
            8 + crate::var_int_size(len) + len
        })
    }

    /// Sum of input values.
    pub fn inputs_total(&self) -> u64 {
        self.inputs_to_sign
            .iter()
            .map(|i| i.previous_output.value)
            .sum()
    }

    /// Fee paid: inputs minus recipient and change.
    pub fn fee(&self) -> Option<u64> {
        self.inputs_total()
            .checked_sub(self.recipient_value)?
            .checked_sub(self.change_value())
    }

    /// Outputs in order: recipient, change, plugin data.
    pub fn outputs(&self) -> Vec<UnsignedOutput> {
        let mut outputs = vec![UnsignedOutput {
            value: self.recipient_value,
            locking_script: self.recipient_address.locking_script.clone(),
            script_type: self.recipient_address.script_type,
        }];
        if let Some(change) = &self.change {
            outputs.push(UnsignedOutput {
                value: change.value,
                locking_script: change.address.locking_script.clone(),
                script_type: change.address.script_type,
            });
        }
        if let Some(script) = self.plugin_data_script() {
            outputs.push(UnsignedOutput {
                value: 0,
                locking_script: script,
                script_type: ScriptType::NullData,
            });
        }
        outputs
    }
}

/// Append a minimal data push to `script`.
fn push_data(script: &mut Vec<u8>, data: &[u8]) {
    let len = data.len();
    match len {
        0..=75 => script.push(len as u8),
        76..=0xff => {
            script.push(0x4c);
            script.push(len as u8);
        }
        0x100..=0xffff => {
            script.push(0x4d);
            script.extend_from_slice(&(len as u16).to_le_bytes());
        }
        _ => {
            script.push(0x4e);
            script.extend_from_slice(&(len as u32).to_le_bytes());
        }
    }
    script.extend_from_slice(data);
}
