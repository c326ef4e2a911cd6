//! Script type classification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// `OP_RETURN` opcode, used for data-carrier outputs.
pub const OP_RETURN: u8 = 0x6a;

/// Standard locking script templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScriptType {
    /// Non-standard or unrecognised script.
    #[default]
    Unknown,
    /// Pay-to-public-key-hash.
    P2pkh,
    /// Pay-to-public-key.
    P2pk,
    /// Bare multisig.
    P2multi,
    /// Pay-to-script-hash (redeem script).
    P2sh,
    /// Pay-to-witness-script-hash.
    P2wsh,
    /// Pay-to-witness-public-key-hash.
    P2wpkh,
    /// P2WPKH nested in P2SH.
    P2wpkhSh,
    /// Pay-to-taproot.
    P2tr,
    /// `OP_RETURN` data carrier.
    NullData,
}

impl ScriptType {
    /// Whether spending this type puts data in the witness.
    pub fn is_witness(&self) -> bool {
        matches!(
            self,
            ScriptType::P2wpkh | ScriptType::P2wpkhSh | ScriptType::P2wsh | ScriptType::P2tr
        )
    }

    /// Short name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ScriptType::Unknown => "unknown",
            ScriptType::P2pkh => "p2pkh",
            ScriptType::P2pk => "p2pk",
            ScriptType::P2multi => "p2multi",
            ScriptType::P2sh => "p2sh",
            ScriptType::P2wsh => "p2wsh",
            ScriptType::P2wpkh => "p2wpkh",
            ScriptType::P2wpkhSh => "p2wpkhsh",
            ScriptType::P2tr => "p2tr",
            ScriptType::NullData => "nulldata",
        }
    }
}

impl fmt::Display for ScriptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
