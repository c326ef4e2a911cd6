//! # spv-chain
//!
//! Bitcoin chain primitives shared by the SPV crates.
//!
//! This crate provides:
//! - 256-bit hashes with RPC-order hex display
//! - Script type classification
//! - Transaction inputs, outputs and outpoints
//! - Wallet public keys and addresses

mod address;
mod error;
mod hash;
mod script;
mod transaction;

pub use address::{Address, PublicKey};
pub use error::{ChainError, ChainResult};
pub use hash::Hash256;
pub use script::{ScriptType, OP_RETURN};
pub use transaction::{
    OutPoint, Transaction, TransactionInput, TransactionOutput, SEQUENCE_FINAL,
    SEQUENCE_RBF_LOCKTIME,
};
