//! # spv-node
//!
//! Wires the SPV components into one kit.
//!
//! This crate provides:
//! - `KitConfig`, the TOML configuration for all components
//! - `init_logging`, the tracing subscriber setup
//! - `SpvKit`, which owns the relay tracker and the input setter and
//!   connects them to peer-group events

mod config;
mod kit;
mod logging;

pub use config::KitConfig;
pub use kit::{SpvKit, WalletCollaborators};
pub use logging::{init_logging, parse_level};
