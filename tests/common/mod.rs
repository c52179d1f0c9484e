//! In-memory stand-ins for the relay and a wallet contract

#![allow(dead_code)]

use ethers_core::abi::{decode, encode, ParamType, Token};
use ethers_core::types::U256;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use safe_message::eip712::{address_from_private_key, recover_address, EcdsaSignature};
use safe_message::relay::{RelayConfirmation, RelayMessage};
use safe_message::safe::hashing::{DOMAIN_SEPARATOR_TYPEHASH, SAFE_MSG_TYPEHASH};
use safe_message::safe::LEGACY_MAGIC_VALUE;
use safe_message::safe::MAGIC_VALUE;
use safe_message::types::checksum;
use safe_message::utils::crypto::{encode_hex, keccak256, selector};
use safe_message::{
    build_prepared_signature, derive_hash, wallet_message_hash, Address, CallOutcome, Confirmation,
    ContractReader, Message, MessageRelay, SafeMessageError, SafeResult, WalletMessageHash,
};

/// Hardhat accounts #0..#3
pub const OWNER_KEYS: [&str; 4] = [
    "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
    "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d",
    "5de4111afa1a4b94908f83103eb1f1706367c2e68ca870fc3fb9a804cdab365a",
    "7c852118294e51e653712a81e05800f419141751be58f605c371e15141b007a6",
];

pub const SEPOLIA: u64 = 11155111;

pub fn key(index: usize) -> Vec<u8> {
    hex::decode(OWNER_KEYS[index]).unwrap()
}

pub fn address_of(index: usize) -> Address {
    address_from_private_key(&key(index)).unwrap()
}

/// Wallet contract with the validation logic of a Safe's fallback handler
pub struct SimulatedSafe {
    pub address: Address,
    pub chain_id: u64,
    pub owners: Vec<Address>,
    pub threshold: u64,
}

impl SimulatedSafe {
    /// `threshold`-of-`owners` wallet over the first owner keys
    pub fn new(owners: usize, threshold: u64) -> Self {
        Self {
            address: safe_message::types::parse_address("0x5aFE3855358E112B5647B952709E6165e1c1eEEe").unwrap(),
            chain_id: SEPOLIA,
            owners: (0..owners).map(address_of).collect(),
            threshold,
        }
    }

    /// getMessageHash(bytes), computed the way the contract does
    pub fn message_hash_for(&self, message: &[u8]) -> [u8; 32] {
        let domain_separator = keccak256(&encode(&[
            Token::FixedBytes(DOMAIN_SEPARATOR_TYPEHASH.to_vec()),
            Token::Uint(U256::from(self.chain_id)),
            Token::Address(self.address),
        ]));
        let struct_hash = keccak256(&encode(&[
            Token::FixedBytes(SAFE_MSG_TYPEHASH.to_vec()),
            Token::FixedBytes(keccak256(message).to_vec()),
        ]));

        let mut data = vec![0x19, 0x01];
        data.extend_from_slice(&domain_separator);
        data.extend_from_slice(&struct_hash);
        keccak256(&data)
    }

    /// checkSignatures: `threshold` ECDSA signatures from distinct owners in
    /// ascending order
    fn check_signatures(&self, hash: &[u8; 32], signatures: &[u8]) -> Result<(), String> {
        if self.threshold == 0 {
            return Err("GS001".to_string());
        }
        if signatures.len() < self.threshold as usize * 65 {
            return Err("GS020".to_string());
        }

        let mut last_owner = Address::zero();
        for chunk in signatures.chunks(65).take(self.threshold as usize) {
            let signature = EcdsaSignature::from_bytes(chunk).map_err(|e| e.to_string())?;
            let owner = recover_address(hash, &signature).map_err(|_| "GS026".to_string())?;
            if owner <= last_owner || !self.owners.contains(&owner) {
                return Err("GS026".to_string());
            }
            last_owner = owner;
        }
        Ok(())
    }

    fn is_valid_signature(&self, data: &[u8], signatures: &[u8], magic: [u8; 4]) -> CallOutcome {
        let hash = self.message_hash_for(data);
        match self.check_signatures(&hash, signatures) {
            Ok(()) => CallOutcome::Returned(encode(&[Token::FixedBytes(magic.to_vec())])),
            Err(reason) => CallOutcome::Reverted(format!("execution reverted: {}", reason)),
        }
    }
}

impl ContractReader for SimulatedSafe {
    fn call(&self, to: &Address, data: &[u8]) -> SafeResult<CallOutcome> {
        if *to != self.address || data.len() < 4 {
            return Ok(CallOutcome::Returned(Vec::new()));
        }

        let mut function = [0u8; 4];
        function.copy_from_slice(&data[..4]);
        let args = &data[4..];

        let outcome = if function == selector("getThreshold()") {
            CallOutcome::Returned(encode(&[Token::Uint(U256::from(self.threshold))]))
        } else if function == selector("getOwners()") {
            let owners = self.owners.iter().copied().map(Token::Address).collect();
            CallOutcome::Returned(encode(&[Token::Array(owners)]))
        } else if function == selector("getMessageHash(bytes)") {
            let tokens = decode(&[ParamType::Bytes], args)?;
            let message = tokens[0].clone().into_bytes().unwrap_or_default();
            CallOutcome::Returned(encode(&[Token::FixedBytes(self.message_hash_for(&message).to_vec())]))
        } else if function == selector("isValidSignature(bytes,bytes)") {
            let tokens = decode(&[ParamType::Bytes, ParamType::Bytes], args)?;
            let message = tokens[0].clone().into_bytes().unwrap_or_default();
            let signatures = tokens[1].clone().into_bytes().unwrap_or_default();
            self.is_valid_signature(&message, &signatures, LEGACY_MAGIC_VALUE)
        } else if function == selector("isValidSignature(bytes32,bytes)") {
            let tokens = decode(&[ParamType::FixedBytes(32), ParamType::Bytes], args)?;
            let hash = tokens[0].clone().into_fixed_bytes().unwrap_or_default();
            let signatures = tokens[1].clone().into_bytes().unwrap_or_default();
            self.is_valid_signature(&hash, &signatures, MAGIC_VALUE)
        } else {
            CallOutcome::Reverted("execution reverted".to_string())
        };
        Ok(outcome)
    }

    fn code(&self, address: &Address) -> SafeResult<Vec<u8>> {
        if *address == self.address {
            Ok(vec![0x60, 0x80, 0x60, 0x40])
        } else {
            Ok(Vec::new())
        }
    }
}

struct StoredMessage {
    wallet: Address,
    message: Message,
    proposed_by: Address,
    confirmations: Vec<Confirmation>,
}

/// Transaction service that checks owner signatures like the hosted one
pub struct InMemoryRelay {
    safe: Arc<SimulatedSafe>,
    records: Mutex<HashMap<WalletMessageHash, StoredMessage>>,
    pub gets: Mutex<usize>,
}

impl InMemoryRelay {
    pub fn new(safe: Arc<SimulatedSafe>) -> Self {
        Self {
            safe,
            records: Mutex::new(HashMap::new()),
            gets: Mutex::new(0),
        }
    }

    fn owner_confirmation(&self, hash: &WalletMessageHash, signature: &[u8]) -> SafeResult<Confirmation> {
        let parsed = EcdsaSignature::from_bytes(signature)?;
        let owner = recover_address(hash.as_bytes(), &parsed)?;
        if !self.safe.owners.contains(&owner) {
            return Err(SafeMessageError::relay(format!("{} is not an owner", checksum(&owner))));
        }

        let mut confirmation = Confirmation::new(owner, signature.to_vec());
        confirmation.signature_type = Some("EOA".to_string());
        Ok(confirmation)
    }
}

impl MessageRelay for InMemoryRelay {
    fn get_message(&self, hash: &WalletMessageHash) -> SafeResult<Option<RelayMessage>> {
        *self.gets.lock().unwrap() += 1;
        let records = self.records.lock().unwrap();
        let Some(stored) = records.get(hash) else {
            return Ok(None);
        };

        let confirmed = stored.confirmations.len() as u64 >= self.safe.threshold;
        Ok(Some(RelayMessage {
            message_hash: hash.to_hex(),
            safe: Some(checksum(&stored.wallet)),
            status: Some(if confirmed { "CONFIRMED" } else { "NEEDS_CONFIRMATION" }.to_string()),
            message: Some(stored.message.to_relay_value()?),
            confirmations_submitted: None,
            confirmations_required: None,
            confirmations: stored
                .confirmations
                .iter()
                .rev()
                .map(|c| RelayConfirmation {
                    owner: checksum(&c.owner),
                    signature: encode_hex(&c.signature),
                    signature_type: c.signature_type.clone(),
                    created: None,
                    modified: None,
                })
                .collect(),
            prepared_signature: confirmed.then(|| encode_hex(&build_prepared_signature(&stored.confirmations))),
            proposed_by: Some(checksum(&stored.proposed_by)),
            safe_app_id: None,
            created: None,
            modified: None,
        }))
    }

    fn propose_message(&self, wallet: &Address, message: &Message, signature: &[u8]) -> SafeResult<()> {
        if *wallet != self.safe.address {
            return Err(SafeMessageError::relay("unknown safe"));
        }
        let message_hash = derive_hash(message)?;
        let hash = wallet_message_hash(self.safe.chain_id, wallet, &message_hash)?;
        let confirmation = self.owner_confirmation(&hash, signature)?;

        let mut records = self.records.lock().unwrap();
        if records.contains_key(&hash) {
            return Err(SafeMessageError::relay("message already exists"));
        }
        records.insert(
            hash,
            StoredMessage {
                wallet: *wallet,
                message: message.clone(),
                proposed_by: confirmation.owner,
                confirmations: vec![confirmation],
            },
        );
        Ok(())
    }

    fn add_confirmation(&self, hash: &WalletMessageHash, signature: &[u8]) -> SafeResult<()> {
        let confirmation = self.owner_confirmation(hash, signature)?;

        let mut records = self.records.lock().unwrap();
        let stored = records
            .get_mut(hash)
            .ok_or_else(|| SafeMessageError::relay("Relay returned 404 Not Found"))?;
        if stored.confirmations.iter().any(|c| c.owner == confirmation.owner) {
            return Err(SafeMessageError::relay("owner already confirmed"));
        }
        stored.confirmations.push(confirmation);
        Ok(())
    }
}
