//! Safe Message Core Library
//!
//! Client for multisig wallet (Safe) message signing and EIP-1271
//! verification.
//!
//! # Architecture
//!
//! This crate provides:
//! - **message**: EIP-191 / EIP-712 message hashing (the Hash Deriver)
//! - **eip712**: Typed-data encoding, hashing and owner-side ECDSA
//! - **safe**: Wallet-scoped hashing, contract reads and on-chain verification
//! - **relay**: Transaction service client and confirmation aggregation
//! - **config**: Per-network endpoints and HTTP settings
//!
//! # Flow
//!
//! 1. Derive the [`MessageHash`] of a message.
//! 2. Owners sign the [`WalletMessageHash`] and submit to the relay.
//! 3. Poll the relay until the threshold is met.
//! 4. Verify the prepared signature against the [`MessageHash`] on-chain.
//!
//! The relay is keyed by the wallet hash and the contract validates the
//! message hash; the two are distinct types so they cannot be swapped.
//!
//! # Example
//!
//! ```rust,ignore
//! use safe_message::{derive_hash, wallet_message_hash, ClientConfig, ConfirmationAggregator, Message,
//!     OnChainVerifier, PollConfig, SafeNetwork};
//!
//! let config = ClientConfig::new(SafeNetwork::Sepolia);
//! let message_hash = derive_hash(&Message::text("Hello World!"))?;
//! let wallet_hash = wallet_message_hash(config.chain_id(), &wallet, &message_hash)?;
//!
//! let aggregator = ConfirmationAggregator::from_config(&config)?;
//! let record = aggregator.wait_for_confirmation(&wallet, &wallet_hash, &PollConfig::default())?;
//!
//! let verifier = OnChainVerifier::from_config(&config)?;
//! let valid = verifier.verify(&wallet, &message_hash, record.aggregated_signature().unwrap_or_default())?;
//! ```

pub mod config;
pub mod eip712;
pub mod error;
pub mod message;
pub mod relay;
pub mod safe;
pub mod types;
pub mod utils;

pub use config::{ClientConfig, SafeNetwork};
pub use error::{ErrorCode, SafeMessageError, SafeResult};
pub use message::{derive_hash, Message};
pub use relay::{ConfirmationAggregator, MessageRelay, MessageStatus, PollConfig, RelayClient, SignedMessageRecord};
pub use safe::{
    build_prepared_signature, sign_wallet_message, wallet_message_hash, CallOutcome, ContractReader,
    JsonRpcClient, OnChainVerifier, OwnerSignature,
};
pub use types::{Address, Confirmation, MessageHash, WalletMessageHash};
