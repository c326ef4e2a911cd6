//! Input ordering policies.
//!
//! Every policy is deterministic for a given input set: the shuffle is
//! seeded from the inputs themselves, so rebuilding the same transaction
//! yields the same order.

use crate::UnspentOutput;
use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Input ordering policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionDataSortType {
    /// Keep the selector's order.
    None,
    /// Pseudo-random order seeded by the selected outpoints.
    #[default]
    Shuffle,
    /// BIP-69 lexicographic order.
    Bip69,
}

impl fmt::Display for TransactionDataSortType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "none",
            Self::Shuffle => "shuffle",
            Self::Bip69 => "bip69",
        })
    }
}

/// Orders the outputs selected for spending.
pub trait TransactionDataSorter: Send + Sync {
    fn sort_unspent_outputs(&self, outputs: Vec<UnspentOutput>) -> Vec<UnspentOutput>;
}

/// Maps a policy to its sorter.
pub trait SorterFactory: Send + Sync {
    fn sorter(&self, sort_type: TransactionDataSortType) -> Arc<dyn TransactionDataSorter>;
}

/// Leaves outputs as selected.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoneSorter;

impl TransactionDataSorter for NoneSorter {
    fn sort_unspent_outputs(&self, outputs: Vec<UnspentOutput>) -> Vec<UnspentOutput> {
        outputs
    }
}

/// BIP-69: previous transaction hash, then output index.
///
/// Hashes compare in their displayed (reversed) byte order.
#[derive(Debug, Default, Clone, Copy)]
pub struct Bip69Sorter;

impl TransactionDataSorter for Bip69Sorter {
    fn sort_unspent_outputs(&self, mut outputs: Vec<UnspentOutput>) -> Vec<UnspentOutput> {
        outputs.sort_by(|a, b| {
            a.output
                .transaction_hash
                .reversed()
                .cmp(&b.output.transaction_hash.reversed())
                .then(a.output.index.cmp(&b.output.index))
        });
        outputs
    }
}

/// Shuffle seeded by a BLAKE2b digest of the sorted outpoints.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShuffleSorter;

impl ShuffleSorter {
    fn seed(outputs: &[UnspentOutput]) -> [u8; 32] {
        let mut hasher = Blake2b::<U32>::new();
        for output in outputs {
            hasher.update(output.output.transaction_hash.as_bytes());
            hasher.update(output.output.index.to_le_bytes());
        }
        let digest = hasher.finalize();
        let mut seed = [0u8; 32];
        seed.copy_from_slice(&digest);
        seed
    }
}

impl TransactionDataSorter for ShuffleSorter {
    fn sort_unspent_outputs(&self, outputs: Vec<UnspentOutput>) -> Vec<UnspentOutput> {
        // Canonical order first so the result ignores the incoming order.
        let mut outputs = Bip69Sorter.sort_unspent_outputs(outputs);
        let mut rng = StdRng::from_seed(Self::seed(&outputs));
        outputs.shuffle(&mut rng);
        outputs
    }
}

/// Default factory covering every [`TransactionDataSortType`].
#[derive(Debug, Default, Clone, Copy)]
pub struct TransactionDataSorterFactory;

impl TransactionDataSorterFactory {
    pub fn new() -> Self {
        Self
    }
}

impl SorterFactory for TransactionDataSorterFactory {
    fn sorter(&self, sort_type: TransactionDataSortType) -> Arc<dyn TransactionDataSorter> {
        match sort_type {
            TransactionDataSortType::None => Arc::new(NoneSorter),
            TransactionDataSortType::Shuffle => Arc::new(ShuffleSorter),
            TransactionDataSortType::Bip69 => Arc::new(Bip69Sorter),
        }
    }
}
