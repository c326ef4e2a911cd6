//! Wallet public keys and addresses.

use crate::ScriptType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A wallet-derived public key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicKey {
    /// BIP-44 account.
    pub account: u32,
    /// Address index within the chain.
    pub index: u32,
    /// External (receive) chain when true, internal (change) chain otherwise.
    pub external: bool,
    /// Compressed SEC1 encoding.
    pub raw: Vec<u8>,
    /// HASH160 of `raw`.
    pub key_hash: Vec<u8>,
}

impl PublicKey {
    /// Derivation path relative to the coin root.
    pub fn path(&self) -> String {
        format!(
            "{}'/{}/{}",
            self.account,
            if self.external { 0 } else { 1 },
            self.index
        )
    }
}

/// A decoded address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Script template the address pays to.
    pub script_type: ScriptType,
    /// Key hash, script hash or witness program.
    pub payload: Vec<u8>,
    /// Encoded form (base58check or bech32).
    pub string_value: String,
    /// Locking script paying to this address.
    pub locking_script: Vec<u8>,
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.string_value)
    }
}
