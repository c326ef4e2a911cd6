//! Test data generators for integration tests.
//!
//! Provides functions to generate hashes, transactions, unspent outputs,
//! addresses and keys.

use spv_chain::{Address, Hash256, PublicKey, ScriptType, Transaction, TransactionOutput};
use spv_network::InventoryItem;
use spv_wallet::{MutableTransaction, UnspentOutput};
use std::sync::atomic::{AtomicU64, Ordering};

/// Global counter for unique hash generation
static HASH_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a test hash with a seed (for deterministic tests).
pub fn test_hash(seed: u8) -> Hash256 {
    let mut bytes = [0u8; 32];
    bytes[0] = 0xAA; // 'T' marker
    bytes[1] = seed;
    bytes[31] = seed.wrapping_mul(3);
    Hash256(bytes)
}

/// Generate a unique test hash (without seed, uses atomic counter).
pub fn unique_hash() -> Hash256 {
    let counter = HASH_COUNTER.fetch_add(1, Ordering::SeqCst);
    let mut bytes = [0u8; 32];
    bytes[0] = 0xBB;
    bytes[1..9].copy_from_slice(&counter.to_be_bytes());
    Hash256(bytes)
}

/// Generate `count` distinct seeded hashes.
pub fn test_hashes(count: u8) -> Vec<Hash256> {
    (0..count).map(test_hash).collect()
}

/// Generate an empty relayed transaction with the given hash.
pub fn test_transaction(hash: Hash256) -> Transaction {
    Transaction::new(hash)
}

/// Transaction inventory for the given hashes.
pub fn tx_inventory(hashes: &[Hash256]) -> Vec<InventoryItem> {
    hashes.iter().copied().map(InventoryItem::transaction).collect()
}

/// Generate a wallet public key.
pub fn test_public_key(index: u32) -> PublicKey {
    PublicKey {
        account: 0,
        index,
        external: false,
        raw: vec![0x02; 33],
        key_hash: vec![index as u8; 20],
    }
}

/// Generate an address of the given type.
pub fn test_address(script_type: ScriptType, name: &str) -> Address {
    Address {
        script_type,
        payload: vec![0x11; 20],
        string_value: name.to_string(),
        locking_script: vec![0x00, 0x14],
    }
}

/// Generate an unspent output with a seeded funding transaction.
pub fn test_unspent_output(seed: u8, value: u64, script_type: ScriptType) -> UnspentOutput {
    let output =
        TransactionOutput::new(value, seed as u32 % 4, test_hash(seed), vec![], script_type);
    UnspentOutput::new(output, test_public_key(seed as u32), Some(100))
}

/// Generate a P2SH output with a redeem script of `redeem_len` bytes.
pub fn test_p2sh_output(seed: u8, value: u64, redeem_len: usize) -> UnspentOutput {
    let mut unspent = test_unspent_output(seed, value, ScriptType::P2sh);
    unspent.output = unspent.output.with_redeem_script(vec![0x51; redeem_len]);
    unspent
}

/// Start a transaction to a P2WPKH recipient.
pub fn test_mutable_transaction(value: u64) -> MutableTransaction {
    MutableTransaction::new(test_address(ScriptType::P2wpkh, "bc1recipient"), value)
}
