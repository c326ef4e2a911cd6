//! # spv-wallet
//!
//! Transaction construction for the SPV wallet.
//!
//! This crate provides:
//! - The in-progress `MutableTransaction` model
//! - `InputSetter`, which funds a transaction from wallet outputs or
//!   redeems a single P2SH output
//! - Unspent output selection with change and dust handling
//! - Virtual-size and dust calculation
//! - Input ordering policies (BIP-69, deterministic shuffle)
//! - A plugin registry for extra input processing
//!
//! ## Example
//!
//! ```ignore
//! use spv_wallet::{InputSetter, MutableTransaction, TransactionDataSortType};
//!
//! let mut tx = MutableTransaction::new(recipient, 100_000);
//! input_setter.set_inputs(None, &mut tx, 10, true, TransactionDataSortType::Shuffle)?;
//! assert!(!tx.inputs_to_sign().is_empty());
//! ```

mod config;
mod dust;
mod error;
mod input_setter;
mod keys;
mod model;
mod plugin;
mod selector;
mod size;
mod sorter;

pub use config::WalletConfig;
pub use dust::{DustCalculator, RelayDustCalculator};
pub use error::{PluginError, WalletError, WalletResult};
pub use input_setter::InputSetter;
pub use keys::{AddressConverter, PublicKeyManager};
pub use model::{
    ChangeOutput, InputToSign, MutableTransaction, SelectionResult, UnsignedOutput, UnspentOutput,
};
pub use plugin::{Plugin, PluginManager, PluginRegistry};
pub use selector::{
    AccumulativeSelector, SelectorChain, SingleNoChangeSelector, UnspentOutputProvider,
    UnspentOutputSelector,
};
pub use size::{push_data_size, var_int_size, BitcoinSizeCalculator, TransactionSizeCalculator};
pub use sorter::{
    Bip69Sorter, NoneSorter, ShuffleSorter, SorterFactory, TransactionDataSortType,
    TransactionDataSorter, TransactionDataSorterFactory,
};

/// Bitcoin Core's default dust relay fee, in sat/kvB.
pub const DEFAULT_DUST_RELAY_FEE_RATE: u64 = 3_000;
