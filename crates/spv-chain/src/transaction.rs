//! Transaction structures.

use crate::{Hash256, ScriptType};
use serde::{Deserialize, Serialize};

/// Final sequence number; disables nLockTime and RBF.
pub const SEQUENCE_FINAL: u32 = 0xFFFF_FFFF;

/// Highest sequence that keeps nLockTime enforced.
///
/// BIP-125 treats any sequence below `0xFFFFFFFE` as an explicit RBF opt-in;
/// this value is the one wallet inputs are created with.
pub const SEQUENCE_RBF_LOCKTIME: u32 = 0xFFFF_FFFE;

/// Reference to an output of a previous transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OutPoint {
    /// Hash of the transaction holding the output.
    pub hash: Hash256,
    /// Output index within that transaction.
    pub index: u32,
}

impl OutPoint {
    /// Create a new outpoint.
    pub fn new(hash: Hash256, index: u32) -> Self {
        Self { hash, index }
    }
}

impl std::fmt::Display for OutPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.hash, self.index)
    }
}

/// A transaction output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOutput {
    /// Value in satoshis.
    pub value: u64,
    /// Index within the owning transaction.
    pub index: u32,
    /// Hash of the owning transaction.
    pub transaction_hash: Hash256,
    /// Locking script (scriptPubKey).
    pub locking_script: Vec<u8>,
    /// Classified script type.
    pub script_type: ScriptType,
    /// Redeem script for P2SH outputs the wallet can spend.
    pub redeem_script: Option<Vec<u8>>,
    /// Public key hash or script hash committed to by the locking script.
    pub key_hash: Option<Vec<u8>>,
}

impl TransactionOutput {
    /// Create an output without redeem data.
    pub fn new(
        value: u64,
        index: u32,
        transaction_hash: Hash256,
        locking_script: Vec<u8>,
        script_type: ScriptType,
    ) -> Self {
        Self {
            value,
            index,
            transaction_hash,
            locking_script,
            script_type,
            redeem_script: None,
            key_hash: None,
        }
    }

    /// Attach a redeem script.
    pub fn with_redeem_script(mut self, redeem_script: Vec<u8>) -> Self {
        self.redeem_script = Some(redeem_script);
        self
    }

    /// The outpoint that spends this output.
    pub fn out_point(&self) -> OutPoint {
        OutPoint::new(self.transaction_hash, self.index)
    }
}

/// A transaction input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInput {
    /// Output being spent.
    pub previous_output: OutPoint,
    /// Unlocking script; empty until signed.
    pub signature_script: Vec<u8>,
    /// Sequence number.
    pub sequence: u32,
}

impl TransactionInput {
    /// Create an input.
    pub fn new(previous_output: OutPoint, signature_script: Vec<u8>, sequence: u32) -> Self {
        Self {
            previous_output,
            signature_script,
            sequence,
        }
    }

    /// Whether this input signals replaceability under BIP-125.
    pub fn signals_rbf(&self) -> bool {
        self.sequence < SEQUENCE_RBF_LOCKTIME
    }
}

/// A parsed transaction as received from a peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction data hash (txid).
    pub hash: Hash256,
    /// Version.
    pub version: i32,
    /// nLockTime.
    pub lock_time: u32,
    /// Inputs.
    pub inputs: Vec<TransactionInput>,
    /// Outputs.
    pub outputs: Vec<TransactionOutput>,
}

impl Transaction {
    /// Create a transaction with no inputs or outputs.
    pub fn new(hash: Hash256) -> Self {
        Self {
            hash,
            version: 2,
            lock_time: 0,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }
}
