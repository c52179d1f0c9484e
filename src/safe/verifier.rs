//! On-chain Verifier
//!
//! Asks the wallet contract whether an aggregated signature is valid for a
//! [`MessageHash`] under EIP-1271. A signature that does not verify is
//! `Ok(false)`; only an unreachable node or a non-revert RPC failure is an
//! error.

use super::contract::{
    decode_bytes32, decode_owners, decode_threshold, get_message_hash_calldata, get_owners_calldata,
    get_threshold_calldata, has_magic_value, is_valid_signature_bytes32_calldata,
    is_valid_signature_calldata, LEGACY_MAGIC_VALUE, MAGIC_VALUE,
};
use super::rpc::{CallOutcome, ContractReader, JsonRpcClient};
use crate::config::ClientConfig;
use crate::eip712::{recover_address, EcdsaSignature};
use crate::error::{SafeMessageError, SafeResult};
use crate::types::{checksum, Address, MessageHash, WalletMessageHash};
use crate::utils::logging::{LogEntry, LogLevel};

/// EIP-1271 verifier over any [`ContractReader`]
pub struct OnChainVerifier<R> {
    reader: R,
}

impl OnChainVerifier<JsonRpcClient> {
    /// Verifier backed by the node in `config.rpc_url`
    pub fn from_config(config: &ClientConfig) -> SafeResult<Self> {
        Ok(Self::new(JsonRpcClient::new(config)?))
    }
}

impl<R: ContractReader> OnChainVerifier<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    /// `isValidSignature(bytes,bytes)` with the raw message hash as `_data`.
    ///
    /// True iff the result starts with `0x20c13b0b`.
    pub fn verify(&self, wallet: &Address, message_hash: &MessageHash, signature: &[u8]) -> SafeResult<bool> {
        let calldata = is_valid_signature_calldata(message_hash.as_bytes(), signature);
        let valid = self.check_magic(wallet, &calldata, LEGACY_MAGIC_VALUE)?;

        verification_entry("isValidSignature(bytes,bytes)", wallet, message_hash, valid)
            .field("signature", crate::utils::crypto::encode_hex(signature))
            .log();
        Ok(valid)
    }

    /// `isValidSignature(bytes32,bytes)`, true iff the result starts with `0x1626ba7e`
    pub fn verify_bytes32(&self, wallet: &Address, message_hash: &MessageHash, signature: &[u8]) -> SafeResult<bool> {
        let calldata = is_valid_signature_bytes32_calldata(message_hash.as_bytes(), signature);
        let valid = self.check_magic(wallet, &calldata, MAGIC_VALUE)?;

        verification_entry("isValidSignature(bytes32,bytes)", wallet, message_hash, valid).log();
        Ok(valid)
    }

    /// Check a signature from any account: ecrecover for an EOA, EIP-1271
    /// for a contract
    pub fn verify_signer(&self, signer: &Address, message_hash: &MessageHash, signature: &[u8]) -> SafeResult<bool> {
        if !self.reader.code(signer)?.is_empty() {
            return self.verify(signer, message_hash, signature);
        }

        let valid = EcdsaSignature::from_bytes(signature)
            .and_then(|sig| recover_address(message_hash.as_bytes(), &sig))
            .map(|recovered| recovered == *signer)
            .unwrap_or(false);

        crate::log_debug!(
            "verifier",
            "EOA signature checked",
            address = checksum(signer),
            valid = valid,
        );
        Ok(valid)
    }

    /// Current confirmation threshold
    pub fn get_threshold(&self, wallet: &Address) -> SafeResult<u64> {
        let result = self.read(wallet, &get_threshold_calldata(), "getThreshold()")?;
        decode_threshold(&result)
    }

    /// Current owners, in the contract's linked-list order
    pub fn get_owners(&self, wallet: &Address) -> SafeResult<Vec<Address>> {
        let result = self.read(wallet, &get_owners_calldata(), "getOwners()")?;
        decode_owners(&result)
    }

    /// The contract's own `getMessageHash(bytes)` for a message hash
    pub fn get_message_hash(&self, wallet: &Address, message_hash: &MessageHash) -> SafeResult<WalletMessageHash> {
        let calldata = get_message_hash_calldata(message_hash.as_bytes());
        let result = self.read(wallet, &calldata, "getMessageHash(bytes)")?;
        Ok(WalletMessageHash::from_bytes(decode_bytes32(&result)?))
    }

    fn check_magic(&self, wallet: &Address, calldata: &[u8], magic: [u8; 4]) -> SafeResult<bool> {
        match self.reader.call(wallet, calldata)? {
            CallOutcome::Returned(result) => Ok(has_magic_value(&result, magic)),
            CallOutcome::Reverted(reason) => {
                crate::log_debug!(
                    "verifier",
                    "isValidSignature reverted",
                    wallet = checksum(wallet),
                    reason = reason,
                );
                Ok(false)
            }
        }
    }

    /// Plain read call; a revert or empty result here means `wallet` is not
    /// a wallet contract
    fn read(&self, wallet: &Address, calldata: &[u8], method: &str) -> SafeResult<Vec<u8>> {
        match self.reader.call(wallet, calldata)? {
            CallOutcome::Returned(result) if result.is_empty() => Err(SafeMessageError::invalid_address(format!(
                "{} returned no data from {}",
                method,
                checksum(wallet)
            ))),
            CallOutcome::Returned(result) => Ok(result),
            CallOutcome::Reverted(reason) => Err(SafeMessageError::rpc(format!("{} reverted", method))
                .with_details(reason)),
        }
    }
}

/// Per-call trace, logged at debug level
fn verification_entry(method: &str, wallet: &Address, message_hash: &MessageHash, valid: bool) -> LogEntry {
    LogEntry::new(LogLevel::Debug, "verifier", method)
        .field("wallet", checksum(wallet))
        .field("message_hash", message_hash)
        .field("valid", valid)
}
