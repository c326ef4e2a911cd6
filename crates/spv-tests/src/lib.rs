//! # spv-tests
//!
//! Integration tests for the SPV toolkit.
//!
//! This crate provides:
//! - Relay tests for mempool request tracking across peers
//! - Builder tests for input construction and redemption
//! - Selector tests against the real size and dust calculators
//! - Property-based tests for balance, sequence and dedup invariants

pub mod generators;
pub mod harness;





pub use generators::*;
pub use harness::*;
