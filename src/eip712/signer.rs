//! ECDSA Signing and Recovery
//!
//! Owner-side signing of 32-byte digests and EOA signature recovery.
//! Wallet owners sign with these primitives; an EOA signature is checked
//! by recovering its signer, where a contract wallet needs EIP-1271.

use super::hasher::hash_typed_data;
use super::types::*;
use crate::types::Address;
use crate::utils::crypto::keccak256;
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use zeroize::Zeroizing;

/// secp256k1 signature in Ethereum's 65-byte `r || s || v` layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EcdsaSignature {
    pub r: [u8; 32],
    pub s: [u8; 32],
    /// Recovery id plus 27
    pub v: u8,
}

impl EcdsaSignature {
    pub fn new(r: [u8; 32], s: [u8; 32], v: u8) -> Self {
        Self { r, s, v }
    }

    /// Create from 65-byte signature (r || s || v); v may be 0/1 or 27/28
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SignerError> {
        if bytes.len() != 65 {
            return Err(SignerError::InvalidSignature(format!(
                "expected 65 bytes, got {}",
                bytes.len()
            )));
        }

        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[0..32]);
        s.copy_from_slice(&bytes[32..64]);
        let v = match bytes[64] {
            v @ (0 | 1) => v + 27,
            v => v,
        };

        Ok(Self { r, s, v })
    }

    pub fn to_bytes(&self) -> [u8; 65] {
        let mut bytes = [0u8; 65];
        bytes[0..32].copy_from_slice(&self.r);
        bytes[32..64].copy_from_slice(&self.s);
        bytes[64] = self.v;
        bytes
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_bytes()))
    }
}

/// Errors from signing and recovery
#[derive(Debug, Clone, thiserror::Error)]
pub enum SignerError {
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Recovery failed: {0}")]
    RecoveryFailed(String),

    #[error(transparent)]
    TypedData(#[from] Eip712Error),
}

/// Sign EIP-712 typed data
pub fn sign_typed_data(typed_data: &TypedData, private_key: &[u8]) -> Result<EcdsaSignature, SignerError> {
    let hash = hash_typed_data(typed_data)?;
    sign_hash(&hash, private_key)
}

/// Sign a pre-computed digest directly (no prefix applied)
pub fn sign_hash(hash: &[u8; 32], private_key: &[u8]) -> Result<EcdsaSignature, SignerError> {
    if private_key.len() != 32 {
        return Err(SignerError::InvalidPrivateKey(format!(
            "expected 32 bytes, got {}",
            private_key.len()
        )));
    }

    let key_bytes = Zeroizing::new(private_key.to_vec());
    let secret_key = SecretKey::from_slice(&key_bytes)
        .map_err(|e| SignerError::InvalidPrivateKey(e.to_string()))?;

    let secp = Secp256k1::new();
    let message = Message::from_digest(*hash);
    let (recovery_id, signature) = secp
        .sign_ecdsa_recoverable(&message, &secret_key)
        .serialize_compact();

    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&signature[0..32]);
    s.copy_from_slice(&signature[32..64]);

    Ok(EcdsaSignature::new(r, s, recovery_id.to_i32() as u8 + 27))
}

/// Recover the signer's address from a digest signature
pub fn recover_address(hash: &[u8; 32], signature: &EcdsaSignature) -> Result<Address, SignerError> {
    let recovery = signature
        .v
        .checked_sub(27)
        .ok_or_else(|| SignerError::InvalidSignature(format!("invalid v: {}", signature.v)))?;
    let recovery_id = RecoveryId::from_i32(recovery as i32)
        .map_err(|e| SignerError::InvalidSignature(e.to_string()))?;

    let mut sig_bytes = [0u8; 64];
    sig_bytes[0..32].copy_from_slice(&signature.r);
    sig_bytes[32..64].copy_from_slice(&signature.s);

    let recoverable = RecoverableSignature::from_compact(&sig_bytes, recovery_id)
        .map_err(|e| SignerError::InvalidSignature(e.to_string()))?;

    let secp = Secp256k1::new();
    let public_key = secp
        .recover_ecdsa(&Message::from_digest(*hash), &recoverable)
        .map_err(|e| SignerError::RecoveryFailed(e.to_string()))?;

    Ok(public_key_to_address(&public_key))
}

/// True if `signature` over `hash` was produced by `expected`
pub fn verify_signature(
    hash: &[u8; 32],
    signature: &EcdsaSignature,
    expected: &Address,
) -> Result<bool, SignerError> {
    Ok(recover_address(hash, signature)? == *expected)
}

/// Address controlled by a private key
pub fn address_from_private_key(private_key: &[u8]) -> Result<Address, SignerError> {
    let secret_key = SecretKey::from_slice(private_key)
        .map_err(|e| SignerError::InvalidPrivateKey(e.to_string()))?;
    let secp = Secp256k1::new();
    Ok(public_key_to_address(&PublicKey::from_secret_key(&secp, &secret_key)))
}

/// Last 20 bytes of keccak256 over the uncompressed key, minus its 0x04 tag
fn public_key_to_address(public_key: &PublicKey) -> Address {
    let pubkey_bytes = public_key.serialize_uncompressed();
    let hash = keccak256(&pubkey_bytes[1..]);
    Address::from_slice(&hash[12..32])
}
