//! Key and address collaborators.

use crate::WalletResult;
use spv_chain::{Address, PublicKey, ScriptType};

/// Source of wallet public keys.
pub trait PublicKeyManager: Send + Sync {
    /// A fresh, unused key from the change chain.
    ///
    /// Fails with [`crate::WalletError::NoKeysAvailable`] when the gap limit
    /// is exhausted.
    fn change_public_key(&self) -> WalletResult<PublicKey>;
}

/// Address encoding and decoding.
pub trait AddressConverter: Send + Sync {
    /// Decode an encoded address.
    ///
    /// Fails with [`crate::WalletError::InvalidAddress`].
    fn convert(&self, address: &str) -> WalletResult<Address>;

    /// Address paying to `public_key` with the given script template.
    fn convert_public_key(
        &self,
        public_key: &PublicKey,
        script_type: ScriptType,
    ) -> WalletResult<Address>;
}
