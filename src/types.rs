//! Shared types for the Safe message client
//!
//! Hash newtypes live here so that the two 32-byte digests in the flow can
//! never be swapped silently: the relay is keyed by [`WalletMessageHash`],
//! the wallet contract validates against [`MessageHash`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{SafeMessageError, SafeResult};
use crate::utils::crypto::decode_hex;

pub use ethers_core::types::{Address, H256};

// =============================================================================
// Digest Types
// =============================================================================

macro_rules! digest_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(H256);

        impl $name {
            pub fn from_bytes(bytes: [u8; 32]) -> Self {
                Self(H256(bytes))
            }

            pub fn as_bytes(&self) -> &[u8; 32] {
                self.0.as_fixed_bytes()
            }

            pub fn to_fixed_bytes(self) -> [u8; 32] {
                self.0.to_fixed_bytes()
            }

            pub fn to_hex(&self) -> String {
                format!("0x{}", hex::encode(self.as_bytes()))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl FromStr for $name {
            type Err = SafeMessageError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let bytes = decode_hex(s)?;
                if bytes.len() != 32 {
                    return Err(SafeMessageError::invalid_input(format!(
                        "{}: expected 32 bytes, got {}",
                        stringify!($name),
                        bytes.len()
                    )));
                }
                let mut out = [0u8; 32];
                out.copy_from_slice(&bytes);
                Ok(Self::from_bytes(out))
            }
        }
    };
}

digest_newtype! {
    /// Digest of the message itself (EIP-191 or EIP-712).
    ///
    /// This is the value the wallet's `isValidSignature` expects.
    MessageHash
}

digest_newtype! {
    /// Wallet-scoped digest of a [`MessageHash`].
    ///
    /// Owners sign this and the relay indexes confirmations under it. It is
    /// never a valid input to on-chain verification.
    WalletMessageHash
}

// =============================================================================
// Addresses
// =============================================================================

/// Parse a 20-byte hex address (with or without `0x`), checksum not enforced
pub fn parse_address(s: &str) -> SafeResult<Address> {
    let trimmed = s.trim();
    let hex_part = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if hex_part.len() != 40 {
        return Err(SafeMessageError::invalid_address(format!(
            "invalid length: expected 40 hex chars, got {}",
            hex_part.len()
        )));
    }

    let bytes = hex::decode(hex_part)
        .map_err(|e| SafeMessageError::invalid_address(format!("invalid hex: {}", e)))?;

    Ok(Address::from_slice(&bytes))
}

/// EIP-55 checksummed form of an address
pub fn checksum(address: &Address) -> String {
    ethers_core::utils::to_checksum(address, None)
}

// =============================================================================
// Confirmations
// =============================================================================

/// One owner's signature over a [`WalletMessageHash`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Confirmation {
    pub owner: Address,
    #[serde(with = "hex_bytes")]
    pub signature: Vec<u8>,
    /// Relay classification, e.g. `EOA` or `CONTRACT_SIGNATURE`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
}

impl Confirmation {
    pub fn new(owner: Address, signature: impl Into<Vec<u8>>) -> Self {
        Self {
            owner,
            signature: signature.into(),
            signature_type: None,
            created: None,
            modified: None,
        }
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&crate::utils::crypto::encode_hex(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        crate::utils::crypto::decode_hex(&s).map_err(serde::de::Error::custom)
    }
}
