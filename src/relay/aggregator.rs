//! Confirmation Aggregator
//!
//! Reads the relay's record for a [`WalletMessageHash`] and decides whether
//! enough owners have confirmed. The relay's own `status` is advisory: a
//! record is CONFIRMED only when the submitted count reaches a non-zero
//! threshold and a prepared signature is present. A threshold that cannot be
//! read leaves the record PENDING rather than failing the poll.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use super::client::{MessageRelay, RelayClient};
use super::types::{RelayConfirmation, RelayMessage};
use crate::config::ClientConfig;
use crate::error::{SafeMessageError, SafeResult};
use crate::message::Message;
use crate::safe::rpc::{ContractReader, JsonRpcClient};
use crate::safe::signing::OwnerSignature;
use crate::safe::verifier::OnChainVerifier;
use crate::types::{checksum, parse_address, Address, Confirmation, WalletMessageHash};
use crate::utils::crypto::decode_hex;

/// Lifecycle of a signed message; CONFIRMED is terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageStatus {
    Pending,
    Confirmed,
}

impl MessageStatus {
    pub fn derive(submitted: u64, required: u64, has_signature: bool) -> Self {
        if required > 0 && submitted >= required && has_signature {
            Self::Confirmed
        } else {
            Self::Pending
        }
    }
}

/// Snapshot of a message's confirmations
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedMessageRecord {
    wallet: Address,
    wallet_message_hash: WalletMessageHash,
    status: MessageStatus,
    confirmations: Vec<Confirmation>,
    required_threshold: Option<u64>,
    submitted_count: u64,
    #[serde(skip)]
    aggregated_signature: Option<Vec<u8>>,
    #[serde(skip)]
    message: Option<Message>,
}

impl SignedMessageRecord {
    /// A record the relay does not know yet
    pub fn pending(wallet: Address, hash: WalletMessageHash, required_threshold: Option<u64>) -> Self {
        Self {
            wallet,
            wallet_message_hash: hash,
            status: MessageStatus::Pending,
            confirmations: Vec::new(),
            required_threshold,
            submitted_count: 0,
            aggregated_signature: None,
            message: None,
        }
    }

    /// Validate a relay snapshot against the request and derive its status.
    ///
    /// `threshold` is consulted only when the relay omits
    /// `confirmationsRequired`; `None` means unknown and keeps the record
    /// PENDING.
    pub fn from_relay<F>(
        wallet: &Address,
        hash: &WalletMessageHash,
        relay: RelayMessage,
        threshold: F,
    ) -> SafeResult<Self>
    where
        F: FnOnce() -> Option<u64>,
    {
        let reported_hash: WalletMessageHash = relay
            .message_hash
            .parse()
            .map_err(|_| SafeMessageError::relay(format!("Malformed messageHash: {}", relay.message_hash)))?;
        if reported_hash != *hash {
            return Err(SafeMessageError::relay("Relay returned a record for a different message hash")
                .with_details(format!("requested {}, got {}", hash, reported_hash)));
        }

        if let Some(safe) = relay.safe.as_deref() {
            let reported_wallet = parse_address(safe)
                .map_err(|_| SafeMessageError::relay(format!("Malformed safe address: {}", safe)))?;
            if reported_wallet != *wallet {
                return Err(SafeMessageError::relay("Relay returned a record for a different wallet")
                    .with_details(format!("requested {}, got {}", checksum(wallet), checksum(&reported_wallet))));
            }
        }

        let confirmations = relay
            .confirmations
            .into_iter()
            .map(parse_confirmation)
            .collect::<SafeResult<Vec<_>>>()?;

        let submitted_count = relay
            .confirmations_submitted
            .unwrap_or(confirmations.len() as u64);
        let required_threshold = relay.confirmations_required.or_else(threshold);

        let prepared = match relay.prepared_signature.as_deref() {
            Some(sig) => decode_hex(sig)
                .map_err(|_| SafeMessageError::relay("Malformed preparedSignature"))?,
            None => Vec::new(),
        };
        let status = MessageStatus::derive(submitted_count, required_threshold.unwrap_or(0), !prepared.is_empty());

        if let Some(reported) = relay.status.as_deref() {
            let agrees = match status {
                MessageStatus::Confirmed => reported.eq_ignore_ascii_case("confirmed"),
                MessageStatus::Pending => !reported.eq_ignore_ascii_case("confirmed"),
            };
            if !agrees {
                crate::log_warn!(
                    "aggregator",
                    "Relay status disagrees with confirmations, ignoring it",
                    wallet_message_hash = hash,
                    reported = reported,
                    submitted = submitted_count,
                    required = format!("{:?}", required_threshold),
                );
            }
        }

        let message = match relay.message.as_ref().filter(|m| !m.is_null()) {
            Some(value) => match Message::from_relay_value(value) {
                Ok(message) => Some(message),
                Err(e) => {
                    crate::log_warn!("aggregator", "Unreadable relay message", error = e);
                    None
                }
            },
            None => None,
        };

        Ok(Self {
            wallet: *wallet,
            wallet_message_hash: *hash,
            status,
            confirmations,
            required_threshold,
            submitted_count,
            aggregated_signature: (status == MessageStatus::Confirmed).then_some(prepared),
            message,
        })
    }

    pub fn wallet(&self) -> &Address {
        &self.wallet
    }

    pub fn wallet_message_hash(&self) -> &WalletMessageHash {
        &self.wallet_message_hash
    }

    pub fn status(&self) -> MessageStatus {
        self.status
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == MessageStatus::Confirmed
    }

    /// Confirmations in the order the relay returned them
    pub fn confirmations(&self) -> &[Confirmation] {
        &self.confirmations
    }

    /// `None` when the relay omitted it and the wallet could not be read
    pub fn required_threshold(&self) -> Option<u64> {
        self.required_threshold
    }

    pub fn submitted_count(&self) -> u64 {
        self.submitted_count
    }

    /// The signature to hand to the verifier; only set once CONFIRMED
    pub fn aggregated_signature(&self) -> Option<&[u8]> {
        self.aggregated_signature.as_deref()
    }

    pub fn message(&self) -> Option<&Message> {
        self.message.as_ref()
    }
}

fn parse_confirmation(raw: RelayConfirmation) -> SafeResult<Confirmation> {
    let owner = parse_address(&raw.owner)
        .map_err(|_| SafeMessageError::relay(format!("Malformed confirmation owner: {}", raw.owner)))?;
    let signature = decode_hex(&raw.signature)
        .map_err(|_| SafeMessageError::relay("Malformed confirmation signature"))?;

    Ok(Confirmation {
        owner,
        signature,
        signature_type: raw.signature_type,
        created: raw.created,
        modified: raw.modified,
    })
}

/// Polling cadence for [`ConfirmationAggregator::wait_for_confirmation`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            timeout: Duration::from_secs(120),
        }
    }
}

/// Relay-backed view of message confirmations
pub struct ConfirmationAggregator<R, C> {
    relay: R,
    verifier: OnChainVerifier<C>,
}

impl ConfirmationAggregator<RelayClient, JsonRpcClient> {
    /// Aggregator over the configured relay and node
    pub fn from_config(config: &ClientConfig) -> SafeResult<Self> {
        Ok(Self::new(RelayClient::new(config)?, JsonRpcClient::new(config)?))
    }
}

impl<R: MessageRelay, C: ContractReader> ConfirmationAggregator<R, C> {
    pub fn new(relay: R, reader: C) -> Self {
        Self {
            relay,
            verifier: OnChainVerifier::new(reader),
        }
    }

    pub fn relay(&self) -> &R {
        &self.relay
    }

    /// One read of the relay record
    pub fn poll_status(&self, wallet: &Address, hash: &WalletMessageHash) -> SafeResult<SignedMessageRecord> {
        let record = match self.relay.get_message(hash)? {
            Some(relay_message) => {
                SignedMessageRecord::from_relay(wallet, hash, relay_message, || self.lookup_threshold(wallet))?
            }
            None => {
                crate::log_debug!("aggregator", "No relay record yet", wallet_message_hash = hash);
                SignedMessageRecord::pending(*wallet, *hash, self.lookup_threshold(wallet))
            }
        };

        crate::log_debug!(
            "aggregator",
            "Polled message status",
            safe = checksum(wallet),
            wallet_message_hash = hash,
            status = format!("{:?}", record.status()),
            submitted = record.submitted_count(),
            required = format!("{:?}", record.required_threshold()),
        );
        Ok(record)
    }

    fn lookup_threshold(&self, wallet: &Address) -> Option<u64> {
        match self.verifier.get_threshold(wallet) {
            Ok(threshold) => Some(threshold),
            Err(e) => {
                crate::log_warn!(
                    "aggregator",
                    "Could not read wallet threshold",
                    safe = checksum(wallet),
                    error = e,
                );
                None
            }
        }
    }

    /// Poll until CONFIRMED or `config.timeout` elapses
    pub fn wait_for_confirmation(
        &self,
        wallet: &Address,
        hash: &WalletMessageHash,
        config: &PollConfig,
    ) -> SafeResult<SignedMessageRecord> {
        let start = Instant::now();

        loop {
            let record = self.poll_status(wallet, hash)?;
            if record.is_confirmed() {
                crate::log_info!(
                    "aggregator",
                    "Message confirmed",
                    safe = checksum(wallet),
                    wallet_message_hash = hash,
                    submitted = record.submitted_count(),
                );
                return Ok(record);
            }

            if start.elapsed().saturating_add(config.interval) > config.timeout {
                return Err(SafeMessageError::timeout(format!(
                    "Timeout waiting for confirmations of {}",
                    hash
                ))
                .with_details(format!(
                    "{}/{} confirmations",
                    record.submitted_count(),
                    record
                        .required_threshold()
                        .map_or_else(|| "?".to_string(), |t| t.to_string())
                )));
            }

            std::thread::sleep(config.interval);
        }
    }

    /// Submit the first owner signature for a message
    pub fn propose(&self, wallet: &Address, message: &Message, signed: &OwnerSignature) -> SafeResult<()> {
        self.relay.propose_message(wallet, message, &signed.to_bytes())?;
        crate::log_info!(
            "aggregator",
            "Proposed message",
            safe = checksum(wallet),
            owner = checksum(&signed.owner),
        );
        Ok(())
    }

    /// Submit a further owner signature
    pub fn confirm(&self, hash: &WalletMessageHash, signed: &OwnerSignature) -> SafeResult<()> {
        self.relay.add_confirmation(hash, &signed.to_bytes())?;
        crate::log_info!(
            "aggregator",
            "Added confirmation",
            wallet_message_hash = hash,
            owner = checksum(&signed.owner),
        );
        Ok(())
    }
}
