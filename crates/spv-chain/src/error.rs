//! Chain primitive error types.

use thiserror::Error;

/// Errors produced while parsing chain primitives.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// Hex decoding failed.
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    /// Hash had the wrong number of bytes.
    #[error("Invalid hash length: got {got} bytes, expected {expected}")]
    InvalidHashLength { got: usize, expected: usize },
}

/// Result type for chain primitive operations.
pub type ChainResult<T> = Result<T, ChainError>;
