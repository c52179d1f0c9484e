//! Relay (transaction service) side of the message flow
//!
//! The relay collects owner confirmations keyed by [`WalletMessageHash`]
//! and, once enough arrive, a prepared signature for on-chain checks.
//!
//! [`WalletMessageHash`]: crate::types::WalletMessageHash

pub mod aggregator;
pub mod client;
pub mod types;

pub use aggregator::{ConfirmationAggregator, MessageStatus, PollConfig, SignedMessageRecord};
pub use client::{MessageRelay, RelayClient};
pub use types::{RelayConfirmation, RelayMessage};
