//! Dust thresholds.

use crate::{TransactionSizeCalculator, DEFAULT_DUST_RELAY_FEE_RATE};
use spv_chain::ScriptType;
use std::sync::Arc;

/// Assumed virtual size of spending a witness-program output.
const WITNESS_SPEND_SIZE: u64 = 32 + 4 + 1 + 107 / 4 + 4;

/// Assumed size of spending a legacy output.
const LEGACY_SPEND_SIZE: u64 = 32 + 4 + 1 + 107 + 4;

/// Smallest output value worth creating, per script type.
pub trait DustCalculator: Send + Sync {
    /// Dust threshold in satoshis; outputs below it are not relayed.
    fn dust(&self, script_type: ScriptType) -> u64;
}

/// Dust threshold following Bitcoin Core's relay policy:
/// `(output size + spend size) * dust relay fee rate`.
pub struct RelayDustCalculator {
    /// Relay fee rate in sat/kvB.
    dust_relay_fee_rate: u64,
    /// Output size source.
    size_calculator: Arc<dyn TransactionSizeCalculator>,
}

impl RelayDustCalculator {
    /// Create a calculator with a rate in sat/kvB.
    pub fn new(dust_relay_fee_rate: u64, size_calculator: Arc<dyn TransactionSizeCalculator>) -> Self {
        Self {
            dust_relay_fee_rate,
            size_calculator,
        }
    }

    /// Create a calculator with Bitcoin Core's default rate.
    pub fn with_default_rate(size_calculator: Arc<dyn TransactionSizeCalculator>) -> Self {
        Self::new(DEFAULT_DUST_RELAY_FEE_RATE, size_calculator)
    }

    fn spend_size(script_type: ScriptType) -> u64 {
        match script_type {
            ScriptType::P2wpkh | ScriptType::P2wsh | ScriptType::P2tr => WITNESS_SPEND_SIZE,
            _ => LEGACY_SPEND_SIZE,
        }
    }
}

impl DustCalculator for RelayDustCalculator {
    fn dust(&self, script_type: ScriptType) -> u64 {
        if script_type == ScriptType::NullData {
            return 0;
        }
        let size = self.size_calculator.output_size(script_type) + Self::spend_size(script_type);
        size * self.dust_relay_fee_rate / 1000
    }
}
