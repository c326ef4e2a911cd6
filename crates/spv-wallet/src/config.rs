//! Wallet configuration.

use crate::{TransactionDataSortType, DEFAULT_DUST_RELAY_FEE_RATE};
use serde::{Deserialize, Serialize};
use spv_chain::ScriptType;

/// Transaction construction configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    /// Script template for change outputs.
    pub change_script_type: ScriptType,
    /// Dust relay fee rate in sat/kvB.
    pub dust_relay_fee_rate: u64,
    /// Input ordering used when the caller does not pick one.
    pub default_sort_type: TransactionDataSortType,
    /// Maximum inputs per transaction.
    pub max_inputs: Option<usize>,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            change_script_type: ScriptType::P2wpkh,
            dust_relay_fee_rate: DEFAULT_DUST_RELAY_FEE_RATE,
            default_sort_type: TransactionDataSortType::Shuffle,
            max_inputs: None,
        }
    }
}
