//! Inventory vectors announced by peers.

use spv_chain::Hash256;

/// Object type of an inventory vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InventoryType {
    /// Ignorable error entry.
    Error,
    /// Transaction.
    Transaction,
    /// Block.
    Block,
    /// Merkle block (BIP-37).
    FilteredBlock,
    /// Compact block (BIP-152).
    CompactBlock,
    /// Transaction with witness (BIP-144).
    WitnessTransaction,
    /// Block with witness (BIP-144).
    WitnessBlock,
}

impl InventoryType {
    /// Decode from the wire value.
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(InventoryType::Error),
            1 => Some(InventoryType::Transaction),
            2 => Some(InventoryType::Block),
            3 => Some(InventoryType::FilteredBlock),
            4 => Some(InventoryType::CompactBlock),
            0x4000_0001 => Some(InventoryType::WitnessTransaction),
            0x4000_0002 => Some(InventoryType::WitnessBlock),
            _ => None,
        }
    }

    /// Wire value.
    pub fn to_u32(&self) -> u32 {
        match self {
            InventoryType::Error => 0,
            InventoryType::Transaction => 1,
            InventoryType::Block => 2,
            InventoryType::FilteredBlock => 3,
            InventoryType::CompactBlock => 4,
            InventoryType::WitnessTransaction => 0x4000_0001,
            InventoryType::WitnessBlock => 0x4000_0002,
        }
    }

    /// Whether the vector refers to a transaction.
    pub fn is_transaction(&self) -> bool {
        matches!(
            self,
            InventoryType::Transaction | InventoryType::WitnessTransaction
        )
    }
}

/// An object a peer claims to have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InventoryItem {
    /// Object type.
    pub object_type: InventoryType,
    /// Object hash.
    pub hash: Hash256,
}

impl InventoryItem {
    /// Create a new inventory item.
    pub fn new(object_type: InventoryType, hash: Hash256) -> Self {
        Self { object_type, hash }
    }

    /// Transaction inventory item.
    pub fn transaction(hash: Hash256) -> Self {
        Self::new(InventoryType::Transaction, hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_values() {
        for ty in [
            InventoryType::Error,
            InventoryType::Transaction,
            InventoryType::Block,
            InventoryType::FilteredBlock,
            InventoryType::CompactBlock,
            InventoryType::WitnessTransaction,
            InventoryType::WitnessBlock,
        ] {
            assert_eq!(InventoryType::from_u32(ty.to_u32()), Some(ty));
        }
        assert_eq!(InventoryType::from_u32(99), None);
    }

    #[test]
    fn test_is_transaction() {
        assert!(InventoryType::Transaction.is_transaction());
        assert!(InventoryType::WitnessTransaction.is_transaction());
        assert!(!InventoryType::Block.is_transaction());
        assert!(!InventoryType::FilteredBlock.is_transaction());
    }
}
