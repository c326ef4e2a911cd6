//! 256-bit hash type.

use crate::{ChainError, ChainResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A double-SHA256 hash as it travels on the wire (internal byte order).
///
/// Bitcoin RPCs and explorers print hashes byte-reversed, so `Display` and
/// [`Hash256::to_hex`] reverse the bytes and [`Hash256::from_hex`] expects
/// the reversed form.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    /// Length in bytes.
    pub const LEN: usize = 32;

    /// Create from wire-order bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Create from a wire-order slice.
    pub fn from_slice(bytes: &[u8]) -> ChainResult<Self> {
        let array: [u8; 32] = bytes
            .try_into()
            .map_err(|_| ChainError::InvalidHashLength {
                got: bytes.len(),
                expected: Self::LEN,
            })?;
        Ok(Self(array))
    }

    /// Parse from reversed (RPC-order) hex.
    pub fn from_hex(s: &str) -> ChainResult<Self> {
        let mut bytes = hex::decode(s).map_err(|e| ChainError::InvalidHex(e.to_string()))?;
        bytes.reverse();
        Self::from_slice(&bytes)
    }

    /// Wire-order bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Bytes in reversed (RPC) order.
    pub fn reversed(&self) -> [u8; 32] {
        let mut bytes = self.0;
        bytes.reverse();
        bytes
    }

    /// Reversed (RPC-order) hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.reversed())
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash256({})", self.to_hex())
    }
}

impl From<[u8; 32]> for Hash256 {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}
