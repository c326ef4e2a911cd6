//! Unspent output selection.

use crate::{
    DustCalculator, SelectionResult, TransactionSizeCalculator, UnspentOutput, WalletError,
    WalletResult,
};
use spv_chain::{ScriptType, TransactionOutput};
use std::sync::Arc;
use tracing::debug;

/// Chooses which wallet outputs fund a payment.
///
/// A successful result always satisfies
/// `recipient_value + change_value + fee == total_value()`.
pub trait UnspentOutputSelector: Send + Sync {
    /// Select outputs paying `value` at `fee_rate` sat/vB.
    ///
    /// With `sender_pay` the fee comes on top of `value`; otherwise it is
    /// deducted from the recipient.
    fn select(
        &self,
        value: u64,
        fee_rate: u64,
        output_script_type: ScriptType,
        change_type: ScriptType,
        sender_pay: bool,
        plugin_data_output_size: u64,
    ) -> WalletResult<SelectionResult>;
}

/// Source of spendable wallet outputs.
pub trait UnspentOutputProvider: Send + Sync {
    fn spendable_utxo(&self) -> Vec<UnspentOutput>;
}

/// Value split for a fixed set of inputs, before dust checks.
struct Split {
    recipient_value: u64,
    change_value: Option<u64>,
}

/// Shared fee arithmetic for the selectors.
struct FeeModel<'a> {
    size_calculator: &'a dyn TransactionSizeCalculator,
    dust_calculator: &'a dyn DustCalculator,
    fee_rate: u64,
    output_script_type: ScriptType,
    change_type: ScriptType,
    plugin_data_output_size: u64,
}

impl FeeModel<'_> {
    fn fee(&self, outputs: &[TransactionOutput], with_change: bool) -> u64 {
        let mut script_types = vec![self.output_script_type];
        if with_change {
            script_types.push(self.change_type);
        }
        self.size_calculator
            .transaction_size(outputs, &script_types, self.plugin_data_output_size)
            .saturating_mul(self.fee_rate)
    }

    /// Amount the inputs must cover.
    fn needed(&self, value: u64, outputs: &[TransactionOutput], sender_pay: bool) -> u64 {
        if sender_pay {
            value.saturating_add(self.fee(outputs, false))
        } else {
            value
        }
    }

    /// Split `total` between recipient, change and fee; `total` must cover
    /// [`Self::needed`]. Change below dust is left to the fee.
    fn split(
        &self,
        value: u64,
        total: u64,
        outputs: &[TransactionOutput],
        sender_pay: bool,
    ) -> WalletResult<Split> {
        let change_dust = self.dust_calculator.dust(self.change_type);
        let recipient_dust = self.dust_calculator.dust(self.output_script_type);
        let fee_with_change = self.fee(outputs, true);
        let fee_without_change = self.fee(outputs, false);

        let split = if sender_pay {
            match total.checked_sub(value.saturating_add(fee_with_change)) {
                Some(change) if change > 0 && change >= change_dust => Split {
                    recipient_value: value,
                    change_value: Some(change),
                },
                _ => Split {
                    recipient_value: value,
                    change_value: None,
                },
            }
        } else {
            let excess = total - value;
            let (fee, change_value) = if excess >= change_dust && excess > 0 {
                (fee_with_change, Some(excess))
            } else {
                (fee_without_change, None)
            };
            let recipient_value = value.saturating_sub(fee);
            if recipient_value < recipient_dust || recipient_value == 0 {
                return Err(WalletError::AmountBelowDust {
                    value: recipient_value,
                    dust: recipient_dust,
                });
            }
            Split {
                recipient_value,
                change_value,
            }
        };
        Ok(split)
    }
}

fn previous_outputs(outputs: &[UnspentOutput]) -> Vec<TransactionOutput> {
    outputs.iter().map(|o| o.output.clone()).collect()
}

/// Accumulates outputs smallest first until the payment is covered.
///
/// With an input cap the smallest selected output is dropped whenever the
/// cap is exceeded, so the selection drifts towards larger outputs.
pub struct AccumulativeSelector {
    provider: Arc<dyn UnspentOutputProvider>,
    size_calculator: Arc<dyn TransactionSizeCalculator>,
    dust_calculator: Arc<dyn DustCalculator>,
    max_inputs: Option<usize>,
}

impl AccumulativeSelector {
    pub fn new(
        provider: Arc<dyn UnspentOutputProvider>,
        size_calculator: Arc<dyn TransactionSizeCalculator>,
        dust_calculator: Arc<dyn DustCalculator>,
    ) -> Self {
        Self {
            provider,
            size_calculator,
            dust_calculator,
            max_inputs: None,
        }
    }

    /// Cap the number of selected inputs.
    pub fn with_max_inputs(mut self, max_inputs: Option<usize>) -> Self {
        self.max_inputs = max_inputs.filter(|max| *max > 0);
        self
    }
}

impl UnspentOutputSelector for AccumulativeSelector {
    fn select(
        &self,
        value: u64,
        fee_rate: u64,
        output_script_type: ScriptType,
        change_type: ScriptType,
        sender_pay: bool,
        plugin_data_output_size: u64,
    ) -> WalletResult<SelectionResult> {
        let mut utxos = self.provider.spendable_utxo();

        let model = FeeModel {
            size_calculator: self.size_calculator.as_ref(),
            dust_calculator: self.dust_calculator.as_ref(),
            fee_rate,
            output_script_type,
            change_type,
            plugin_data_output_size,
        };
        if utxos.is_empty() {
            return Err(WalletError::InsufficientFunds {
                needed: model.needed(value, &[], sender_pay),
                available: 0,
            });
        }

        let recipient_dust = self.dust_calculator.dust(output_script_type);
        if value == 0 || value < recipient_dust {
            return Err(WalletError::AmountBelowDust {
                value,
                dust: recipient_dust,
            });
        }

        utxos.sort_by(|a, b| {
            a.value()
                .cmp(&b.value())
                .then_with(|| a.out_point().cmp(&b.out_point()))
        });

        let mut selected: Vec<UnspentOutput> = Vec::new();
        let mut total = 0u64;
        let mut needed = value;

        for utxo in utxos {
            total += utxo.value();
            selected.push(utxo);
            if let Some(max) = self.max_inputs {
                if selected.len() > max {
                    let dropped = selected.remove(0);
                    total -= dropped.value();
                }
            }

            let outputs = previous_outputs(&selected);
            needed = model.needed(value, &outputs, sender_pay);
            if total >= needed {
                let split = model.split(value, total, &outputs, sender_pay)?;
                debug!(
                    inputs = selected.len(),
                    total,
                    recipient = split.recipient_value,
                    change = ?split.change_value,
                    "Selected unspent outputs"
                );
                return Ok(SelectionResult {
                    unspent_outputs: selected,
                    recipient_value: split.recipient_value,
                    change_value: split.change_value,
                });
            }
        }

        Err(WalletError::InsufficientFunds {
            needed,
            available: total,
        })
    }
}

/// Picks one output that covers the payment with an excess below dust, so
/// no change output is needed.
pub struct SingleNoChangeSelector {
    provider: Arc<dyn UnspentOutputProvider>,
    size_calculator: Arc<dyn TransactionSizeCalculator>,
    dust_calculator: Arc<dyn DustCalculator>,
}

impl SingleNoChangeSelector {
    pub fn new(
        provider: Arc<dyn UnspentOutputProvider>,
        size_calculator: Arc<dyn TransactionSizeCalculator>,
        dust_calculator: Arc<dyn DustCalculator>,
    ) -> Self {
        Self {
            provider,
            size_calculator,
            dust_calculator,
        }
    }
}

impl UnspentOutputSelector for SingleNoChangeSelector {
    fn select(
        &self,
        value: u64,
        fee_rate: u64,
        output_script_type: ScriptType,
        change_type: ScriptType,
        sender_pay: bool,
        plugin_data_output_size: u64,
    ) -> WalletResult<SelectionResult> {
        let mut utxos = self.provider.spendable_utxo();

        let model = FeeModel {
            size_calculator: self.size_calculator.as_ref(),
            dust_calculator: self.dust_calculator.as_ref(),
            fee_rate,
            output_script_type,
            change_type,
            plugin_data_output_size,
        };
        if utxos.is_empty() {
            return Err(WalletError::InsufficientFunds {
                needed: model.needed(value, &[], sender_pay),
                available: 0,
            });
        }
        let change_dust = self.dust_calculator.dust(change_type);

        utxos.sort_by(|a, b| {
            a.value()
                .cmp(&b.value())
                .then_with(|| a.out_point().cmp(&b.out_point()))
        });

        for utxo in utxos {
            let outputs = previous_outputs(std::slice::from_ref(&utxo));
            let needed = model.needed(value, &outputs, sender_pay);
            let Some(excess) = utxo.value().checked_sub(needed) else {
                continue;
            };
            if excess >= change_dust {
                // Sorted ascending, every later output leaves even more.
                break;
            }
            let recipient_value = if sender_pay {
                value
            } else {
                value.saturating_sub(model.fee(&outputs, false))
            };
            let recipient_dust = self.dust_calculator.dust(output_script_type);
            if recipient_value == 0 || recipient_value < recipient_dust {
                return Err(WalletError::AmountBelowDust {
                    value: recipient_value,
                    dust: recipient_dust,
                });
            }
            debug!(value = utxo.value(), recipient = recipient_value, "Selected single output");
            return Ok(SelectionResult {
                unspent_outputs: vec![utxo],
                recipient_value,
                change_value: None,
            });
        }

        Err(WalletError::SelectionFailed(
            "no single output matches without change".to_string(),
        ))
    }
}

/// Tries selectors in order; the first success wins.
#[derive(Default)]
pub struct SelectorChain {
    selectors: Vec<Arc<dyn UnspentOutputSelector>>,
}

impl SelectorChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a selector.
    pub fn with(mut self, selector: Arc<dyn UnspentOutputSelector>) -> Self {
        self.selectors.push(selector);
        self
    }
}

impl UnspentOutputSelector for SelectorChain {
    fn select(
        &self,
        value: u64,
        fee_rate: u64,
        output_script_type: ScriptType,
        change_type: ScriptType,
        sender_pay: bool,
        plugin_data_output_size: u64,
    ) -> WalletResult<SelectionResult> {
        let mut last_error = None;
        for selector in &self.selectors {
            match selector.select(
                value,
                fee_rate,
                output_script_type,
                change_type,
                sender_pay,
                plugin_data_output_size,
            ) {
                Ok(result) => return Ok(result),
                Err(e) => last_error = Some(e),
            }
        }
        Err(last_error
            .unwrap_or_else(|| WalletError::SelectionFailed("no selectors".to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BitcoinSizeCalculator, RelayDustCalculator};
    use spv_chain::{Hash256, PublicKey};

    struct FixedProvider(Vec<UnspentOutput>);

    impl UnspentOutputProvider for FixedProvider {
        fn spendable_utxo(&self) -> Vec<UnspentOutput> {
            self.0.clone()
        }
    }

    /// Every transaction is 100 vB.
    struct FlatSize;

    impl TransactionSizeCalculator for FlatSize {
        fn transaction_size(&self, _: &[TransactionOutput], _: &[ScriptType], _: u64) -> u64 {
            100
        }

        fn output_size(&self, _: ScriptType) -> u64 {
            34
        }

        fn input_size(&self, _: ScriptType) -> u64 {
            148
        }
    }

    struct FlatDust(u64);

    impl DustCalculator for FlatDust {
        fn dust(&self, _: ScriptType) -> u64 {
            self.0
        }
    }

    fn unspent(seed: u8, value: u64) -> UnspentOutput {
        let output =
            TransactionOutput::new(value, 0, Hash256([seed; 32]), vec![], ScriptType::P2pkh);
        let key = PublicKey {
            account: 0,
            index: seed as u32,
            external: true,
            raw: vec![],
            key_hash: vec![],
        };
        UnspentOutput::new(output, key, Some(1))
    }

    fn accumulative(values: &[u64], dust: u64) -> AccumulativeSelector {
        let utxos = values
            .iter()
            .enumerate()
            .map(|(i, v)| unspent(i as u8 + 1, *v))
            .collect();
        AccumulativeSelector::new(
            Arc::new(FixedProvider(utxos)),
            Arc::new(FlatSize),
            Arc::new(FlatDust(dust)),
        )
    }

    fn assert_balanced(result: &SelectionResult) {
        let fee = result.fee().expect("fee");
        assert_eq!(
            result.recipient_value + result.change_value.unwrap_or(0) + fee,
            result.total_value()
        );
    }

    #[test]
    fn test_accumulates_smallest_first() {
        let selector = accumulative(&[50_000, 10_000, 100_000], 546);
        let result = selector
            .select(65_000, 10, ScriptType::P2pkh, ScriptType::P2pkh, true, 0)
            .unwrap();

        // 10k + 50k short of 65k + 1k fee, 100k tips it over
        assert_eq!(result.unspent_outputs.len(), 3);
        assert_eq!(result.recipient_value, 65_000);
        assert_eq!(result.change_value, Some(160_000 - 65_000 - 1_000));
        assert_balanced(&result);
    }

    #[test]
    fn test_zero_change_dropped_without_dust_threshold() {
        let selector = accumulative(&[10_100], 0);
        let result = selector
            .select(10_000, 1, ScriptType::P2pkh, ScriptType::P2pkh, true, 0)
            .unwrap();

        assert_eq!(result.recipient_value, 10_000);
        assert_eq!(result.change_value, None);
        assert_balanced(&result);
    }

    #[test]
    fn test_change_below_dust_goes_to_fee() {
        let selector = accumulative(&[101_500], 546);
        let result = selector
            .select(100_000, 10, ScriptType::P2pkh, ScriptType::P2pkh, true, 0)
            .unwrap();

        assert_eq!(result.change_value, None);
        assert_eq!(result.fee(), Some(1_500));
        assert_balanced(&result);
    }

    #[test]
    fn test_receiver_pays_fee() {
        let selector = accumulative(&[30_000, 80_000], 546);
        let result = selector
            .select(100_000, 10, ScriptType::P2pkh, ScriptType::P2pkh, false, 0)
            .unwrap();

        assert_eq!(result.recipient_value, 99_000);
        assert_eq!(result.change_value, Some(10_000));
        assert_balanced(&result);
    }

    #[test]
    fn test_insufficient_funds() {
        let selector = accumulative(&[10_000, 20_000], 546);
        let err = selector
            .select(50_000, 10, ScriptType::P2pkh, ScriptType::P2pkh, true, 0)
            .unwrap_err();

        match err {
            WalletError::InsufficientFunds { needed, available } => {
                assert_eq!(needed, 51_000);
                assert_eq!(available, 30_000);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_and_dust_amounts() {
        let empty = accumulative(&[], 546);
        assert!(matches!(
            empty.select(10_000, 1, ScriptType::P2pkh, ScriptType::P2pkh, true, 0),
            Err(WalletError::InsufficientFunds { needed: 10_100, available: 0 })
        ));

        let selector = accumulative(&[10_000], 546);
        assert!(matches!(
            selector.select(500, 1, ScriptType::P2pkh, ScriptType::P2pkh, true, 0),
            Err(WalletError::AmountBelowDust { value: 500, dust: 546 })
        ));
    }

    #[test]
    fn test_max_inputs_prefers_larger() {
        let selector = accumulative(&[1_000, 2_000, 3_000, 50_000], 546).with_max_inputs(Some(2));
        let result = selector
            .select(40_000, 10, ScriptType::P2pkh, ScriptType::P2pkh, true, 0)
            .unwrap();

        let values: Vec<u64> = result.unspent_outputs.iter().map(|u| u.value()).collect();
        assert_eq!(values, vec![3_000, 50_000]);
        assert_balanced(&result);
    }

    #[test]
    fn test_real_calculators_balance() {
        let size = Arc::new(BitcoinSizeCalculator::new());
        let utxos = vec![unspent(1, 120_000), unspent(2, 40_000)];
        let selector = AccumulativeSelector::new(
            Arc::new(FixedProvider(utxos)),
            size.clone(),
            Arc::new(RelayDustCalculator::with_default_rate(size)),
        );

        let result = selector
            .select(100_000, 5, ScriptType::P2wpkh, ScriptType::P2wpkh, true, 0)
            .unwrap();
        assert_eq!(result.unspent_outputs.len(), 2);
        assert!(result.change_value.is_some());
        assert_balanced(&result);
    }

    #[test]
    fn test_single_no_change() {
        let utxos = vec![unspent(1, 60_000), unspent(2, 101_200), unspent(3, 200_000)];
        let selector = SingleNoChangeSelector::new(
            Arc::new(FixedProvider(utxos)),
            Arc::new(FlatSize),
            Arc::new(FlatDust(546)),
        );

        let result = selector
            .select(100_000, 10, ScriptType::P2pkh, ScriptType::P2pkh, true, 0)
            .unwrap();
        assert_eq!(result.unspent_outputs[0].value(), 101_200);
        assert_eq!(result.change_value, None);
        assert_eq!(result.fee(), Some(1_200));
    }

    #[test]
    fn test_single_no_change_fails_without_match() {
        let selector = SingleNoChangeSelector::new(
            Arc::new(FixedProvider(vec![unspent(1, 200_000)])),
            Arc::new(FlatSize),
            Arc::new(FlatDust(546)),
        );
        assert!(matches!(
            selector.select(100_000, 10, ScriptType::P2pkh, ScriptType::P2pkh, true, 0),
            Err(WalletError::SelectionFailed(_))
        ));
    }

    #[test]
    fn test_chain_falls_back() {
        let provider = Arc::new(FixedProvider(vec![unspent(1, 200_000)]));
        let chain = SelectorChain::new()
            .with(Arc::new(SingleNoChangeSelector::new(
                provider.clone(),
                Arc::new(FlatSize),
                Arc::new(FlatDust(546)),
            )))
            .with(Arc::new(AccumulativeSelector::new(
                provider,
                Arc::new(FlatSize),
                Arc::new(FlatDust(546)),
            )));

        let result = chain
            .select(100_000, 10, ScriptType::P2pkh, ScriptType::P2pkh, true, 0)
            .unwrap();
        assert_eq!(result.change_value, Some(99_000));
    }

    #[test]
    fn test_empty_chain_fails() {
        assert!(matches!(
            SelectorChain::new().select(1_000, 1, ScriptType::P2pkh, ScriptType::P2pkh, true, 0),
            Err(WalletError::SelectionFailed(_))
        ));
    }
}
