//! Transaction virtual-size estimation.
//!
//! Sizes are computed in weight units (BIP-141): non-witness bytes weigh 4,
//! witness bytes weigh 1, and virtual size is weight / 4 rounded up. Signature
//! sizes assume the 72-byte DER maximum plus sighash byte, so estimates never
//! undershoot.

use spv_chain::{ScriptType, TransactionOutput};

/// Version and lock time.
const TX_FIXED_BYTES: u64 = 8;
/// Outpoint and sequence.
const INPUT_FIXED_BYTES: u64 = 36 + 4;
/// Value field of an output.
const OUTPUT_VALUE_BYTES: u64 = 8;
/// Segwit marker and flag, in weight units.
const SEGWIT_MARKER_WEIGHT: u64 = 2;

/// ECDSA signature push (DER + sighash).
const SIG_PUSH: u64 = 1 + 72;
/// Compressed public key push.
const PUBKEY_PUSH: u64 = 1 + 33;
/// Schnorr signature with default sighash.
const SCHNORR_PUSH: u64 = 1 + 64;

/// Computes serialized transaction sizes for fee calculation.
pub trait TransactionSizeCalculator: Send + Sync {
    /// Virtual size of a transaction spending `previous_outputs` into
    /// outputs of `output_script_types`, plus an optional data output of
    /// `plugin_data_output_size` bytes.
    fn transaction_size(
        &self,
        previous_outputs: &[TransactionOutput],
        output_script_types: &[ScriptType],
        plugin_data_output_size: u64,
    ) -> u64;

    /// Serialized size of one output of `script_type`.
    fn output_size(&self, script_type: ScriptType) -> u64;

    /// Virtual size of one input spending `script_type`.
    fn input_size(&self, script_type: ScriptType) -> u64;
}

/// Bytes taken by a CompactSize integer.
pub fn var_int_size(n: u64) -> u64 {
    match n {
        0..=0xfc => 1,
        0xfd..=0xffff => 3,
        0x1_0000..=0xffff_ffff => 5,
        _ => 9,
    }
}

/// Bytes taken by a script push of `len` bytes of data.
pub fn push_data_size(len: u64) -> u64 {
    let opcode = match len {
        0..=75 => 1,
        76..=0xff => 2,
        0x100..=0xffff => 3,
        _ => 5,
    };
    opcode + len
}

/// Size calculator for standard Bitcoin script types.
#[derive(Debug, Clone, Copy, Default)]
pub struct BitcoinSizeCalculator;

impl BitcoinSizeCalculator {
    /// Create a calculator.
    pub fn new() -> Self {
        Self
    }

    fn locking_script_len(script_type: ScriptType) -> u64 {
        match script_type {
            ScriptType::P2pkh | ScriptType::Unknown => 25,
            ScriptType::P2pk => 35,
            ScriptType::P2multi => 37,
            ScriptType::P2sh | ScriptType::P2wpkhSh => 23,
            ScriptType::P2wpkh => 22,
            ScriptType::P2wsh | ScriptType::P2tr => 34,
            ScriptType::NullData => 1,
        }
    }

    fn signature_script_len(script_type: ScriptType, redeem_script: Option<&[u8]>) -> u64 {
        match script_type {
            ScriptType::P2pkh | ScriptType::Unknown => SIG_PUSH + PUBKEY_PUSH,
            ScriptType::P2pk => SIG_PUSH,
            // OP_0 dummy for CHECKMULTISIG plus one signature
            ScriptType::P2multi => 1 + SIG_PUSH,
            ScriptType::P2sh => {
                let redeem_len = redeem_script.map_or(0, |s| s.len() as u64);
                SIG_PUSH + push_data_size(redeem_len)
            }
            ScriptType::P2wpkhSh => push_data_size(22),
            ScriptType::P2wpkh | ScriptType::P2wsh | ScriptType::P2tr | ScriptType::NullData => 0,
        }
    }

    /// Witness weight of one input; zero for legacy inputs.
    fn witness_weight(script_type: ScriptType, redeem_script: Option<&[u8]>) -> u64 {
        match script_type {
            ScriptType::P2wpkh | ScriptType::P2wpkhSh => 1 + SIG_PUSH + PUBKEY_PUSH,
            ScriptType::P2tr => 1 + SCHNORR_PUSH,
            ScriptType::P2wsh => {
                let script_len = redeem_script.map_or(0, |s| s.len() as u64);
                1 + SIG_PUSH + var_int_size(script_len) + script_len
            }
            _ => 0,
        }
    }

    fn input_base_size(script_type: ScriptType, redeem_script: Option<&[u8]>) -> u64 {
        let script_len = Self::signature_script_len(script_type, redeem_script);
        INPUT_FIXED_BYTES + var_int_size(script_len) + script_len
    }
}

impl TransactionSizeCalculator for BitcoinSizeCalculator {
    fn transaction_size(
        &self,
        previous_outputs: &[TransactionOutput],
        output_script_types: &[ScriptType],
        plugin_data_output_size: u64,
    ) -> u64 {
        let segwit = previous_outputs.iter().any(|o| o.script_type.is_witness());
        let output_count =
            output_script_types.len() as u64 + u64::from(plugin_data_output_size > 0);

        let mut base = TX_FIXED_BYTES
            + var_int_size(previous_outputs.len() as u64)
            + var_int_size(output_count)
            + plugin_data_output_size;
        let mut witness = 0;

        for output in previous_outputs {
            let redeem = output.redeem_script.as_deref();
            base += Self::input_base_size(output.script_type, redeem);
            if segwit {
                // Legacy inputs of a segwit transaction carry an empty stack.
                witness += Self::witness_weight(output.script_type, redeem).max(1);
            }
        }
        for script_type in output_script_types {
            base += self.output_size(*script_type);
        }
        if segwit {
            witness += SEGWIT_MARKER_WEIGHT;
        }

        (base * 4 + witness).div_ceil(4)
    }

    fn output_size(&self, script_type: ScriptType) -> u64 {
        let script_len = Self::locking_script_len(script_type);
        OUTPUT_VALUE_BYTES + var_int_size(script_len) + script_len
    }

    fn input_size(&self, script_type: ScriptType) -> u64 {
        let base = Self::input_base_size(script_type, None);
        let witness = Self::witness_weight(script_type, None);
        (base * 4 + witness).div_ceil(4)
    }
}
