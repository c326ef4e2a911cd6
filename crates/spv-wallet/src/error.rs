//! Wallet error types.

use spv_chain::{OutPoint, ScriptType};
use thiserror::Error;

/// Opaque error raised by a plugin.
pub type PluginError = Box<dyn std::error::Error + Send + Sync>;

/// Wallet errors.
#[derive(Error, Debug)]
pub enum WalletError {
    /// Selected outputs cannot cover value and fee.
    #[error("Insufficient funds: need {needed} sat, have {available} sat")]
    InsufficientFunds { needed: u64, available: u64 },

    /// Redeeming an output would cost at least its whole value.
    #[error("Fee {fee} sat exceeds output value {value} sat")]
    FeeExceedsValue { fee: u64, value: u64 },

    /// Output type cannot be redeemed directly.
    #[error("Unsupported script type: {0}")]
    UnsupportedScriptType(ScriptType),

    /// Address could not be decoded.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Plugin failed while processing inputs.
    #[error("Plugin {id} failed: {source}")]
    Plugin {
        id: u8,
        #[source]
        source: PluginError,
    },

    /// No change key could be produced.
    #[error("No public keys available")]
    NoKeysAvailable,

    /// Amount would create a dust output.
    #[error("Amount {value} sat is below dust threshold {dust} sat")]
    AmountBelowDust { value: u64, dust: u64 },

    /// Same outpoint added twice.
    #[error("Duplicate input: {0}")]
    DuplicateInput(OutPoint),

    /// Selector could not produce a result.
    #[error("Selection failed: {0}")]
    SelectionFailed(String),
}

/// Result type for wallet operations.
pub type WalletResult<T> = Result<T, WalletError>;
