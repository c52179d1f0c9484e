//! Owner-side signing helpers
//!
//! Owners sign the [`WalletMessageHash`] directly (no EIP-191 prefix), and
//! the wallet expects their signatures concatenated in ascending owner
//! order.

use crate::eip712::{address_from_private_key, sign_hash, EcdsaSignature};
use crate::error::SafeResult;
use crate::types::{Address, Confirmation, WalletMessageHash};

/// One owner's 65-byte `r || s || v` signature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnerSignature {
    pub owner: Address,
    pub signature: EcdsaSignature,
}

impl OwnerSignature {
    pub fn to_bytes(&self) -> [u8; 65] {
        self.signature.to_bytes()
    }

    pub fn to_hex(&self) -> String {
        self.signature.to_hex()
    }
}

impl From<OwnerSignature> for Confirmation {
    fn from(signed: OwnerSignature) -> Self {
        let mut confirmation = Confirmation::new(signed.owner, signed.to_bytes().to_vec());
        confirmation.signature_type = Some("EOA".to_string());
        confirmation
    }
}

/// Sign a wallet message hash with an owner key
pub fn sign_wallet_message(private_key: &[u8], hash: &WalletMessageHash) -> SafeResult<OwnerSignature> {
    let owner = address_from_private_key(private_key)?;
    let signature = sign_hash(hash.as_bytes(), private_key)?;

    crate::log_debug!(
        "signing",
        "Signed wallet message",
        owner = crate::types::checksum(&owner),
        wallet_message_hash = hash,
    );

    Ok(OwnerSignature { owner, signature })
}

/// Concatenate signatures sorted by owner address, one per owner
pub fn build_prepared_signature(confirmations: &[Confirmation]) -> Vec<u8> {
    let mut sorted: Vec<&Confirmation> = confirmations.iter().collect();
    sorted.sort_by_key(|c| c.owner);
    sorted.dedup_by_key(|c| c.owner);

    sorted
        .into_iter()
        .flat_map(|c| c.signature.iter().copied())
        .collect()
}
