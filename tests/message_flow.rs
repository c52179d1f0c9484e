//! End-to-end message flow against an in-memory relay and wallet

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{address_of, key, InMemoryRelay, SimulatedSafe};
use safe_message::{
    build_prepared_signature, derive_hash, sign_wallet_message, wallet_message_hash, Address, CallOutcome,
    ConfirmationAggregator, ContractReader, ErrorCode, Message, MessageHash, MessageStatus, OnChainVerifier,
    PollConfig, SafeMessageError, SafeResult,
};

/// Node that refuses every request
struct OfflineNode;

impl ContractReader for OfflineNode {
    fn call(&self, _to: &Address, _data: &[u8]) -> SafeResult<CallOutcome> {
        Err(SafeMessageError::network("connection refused"))
    }

    fn code(&self, _address: &Address) -> SafeResult<Vec<u8>> {
        Err(SafeMessageError::network("connection refused"))
    }
}

struct Harness {
    safe: Arc<SimulatedSafe>,
    relay: Arc<InMemoryRelay>,
    aggregator: ConfirmationAggregator<Arc<InMemoryRelay>, Arc<SimulatedSafe>>,
    verifier: OnChainVerifier<Arc<SimulatedSafe>>,
}

fn harness(owners: usize, threshold: u64) -> Harness {
    let safe = Arc::new(SimulatedSafe::new(owners, threshold));
    let relay = Arc::new(InMemoryRelay::new(safe.clone()));
    Harness {
        aggregator: ConfirmationAggregator::new(relay.clone(), safe.clone()),
        verifier: OnChainVerifier::new(safe.clone()),
        safe,
        relay,
    }
}

fn fast_poll() -> PollConfig {
    PollConfig {
        interval: Duration::from_millis(5),
        timeout: Duration::from_millis(500),
    }
}

#[test]
fn hello_world_two_of_three() {
    let h = harness(3, 2);
    let wallet = h.safe.address;
    let message = Message::text("Hello World!");

    let message_hash = derive_hash(&message).unwrap();
    let wallet_hash = wallet_message_hash(h.safe.chain_id, &wallet, &message_hash).unwrap();

    // local and contract-side wallet hashes agree
    assert_eq!(h.verifier.get_message_hash(&wallet, &message_hash).unwrap(), wallet_hash);

    // nothing on the relay yet: pending, threshold read from the contract
    let record = h.aggregator.poll_status(&wallet, &wallet_hash).unwrap();
    assert_eq!(record.status(), MessageStatus::Pending);
    assert_eq!(record.submitted_count(), 0);
    assert_eq!(record.required_threshold(), Some(2));
    assert!(record.aggregated_signature().is_none());

    let first = sign_wallet_message(&key(0), &wallet_hash).unwrap();
    h.aggregator.propose(&wallet, &message, &first).unwrap();

    let record = h.aggregator.poll_status(&wallet, &wallet_hash).unwrap();
    assert_eq!(record.status(), MessageStatus::Pending);
    assert_eq!(record.submitted_count(), 1);
    assert_eq!(record.required_threshold(), Some(2));
    assert!(record.aggregated_signature().is_none());
    assert_eq!(record.message(), Some(&message));
    assert_eq!(record.wallet_message_hash(), &wallet_hash);

    let second = sign_wallet_message(&key(2), &wallet_hash).unwrap();
    h.aggregator.confirm(&wallet_hash, &second).unwrap();

    let record = h.aggregator.wait_for_confirmation(&wallet, &wallet_hash, &fast_poll()).unwrap();
    assert_eq!(record.status(), MessageStatus::Confirmed);
    assert_eq!(record.submitted_count(), 2);

    let signature = record.aggregated_signature().unwrap();
    assert_eq!(signature.len(), 130);
    assert_eq!(signature, build_prepared_signature(record.confirmations()).as_slice());

    assert!(h.verifier.verify(&wallet, &message_hash, signature).unwrap());
    assert!(h.verifier.verify_bytes32(&wallet, &message_hash, signature).unwrap());
    assert!(h.verifier.verify_signer(&wallet, &message_hash, signature).unwrap());

    // the relay key is never a valid input to the contract
    let substituted = MessageHash::from_bytes(wallet_hash.to_fixed_bytes());
    assert!(!h.verifier.verify(&wallet, &substituted, signature).unwrap());
}

#[test]
fn verify_requires_a_quorum_of_current_owners() {
    let h = harness(3, 2);
    let wallet = h.safe.address;
    let message_hash = derive_hash(&Message::text("Hello World!")).unwrap();
    let wallet_hash = wallet_message_hash(h.safe.chain_id, &wallet, &message_hash).unwrap();

    let sign = |index: usize| -> safe_message::Confirmation {
        sign_wallet_message(&key(index), &wallet_hash).unwrap().into()
    };

    let one = build_prepared_signature(&[sign(0)]);
    assert!(!h.verifier.verify(&wallet, &message_hash, &one).unwrap());

    let quorum = build_prepared_signature(&[sign(1), sign(0)]);
    assert!(h.verifier.verify(&wallet, &message_hash, &quorum).unwrap());

    // account #3 is not an owner
    let outsider = build_prepared_signature(&[sign(0), sign(3)]);
    assert!(!h.verifier.verify(&wallet, &message_hash, &outsider).unwrap());

    // unsorted concatenation is rejected by the wallet
    let (a, b) = (sign(0), sign(1));
    let (low, high) = if a.owner < b.owner { (a, b) } else { (b, a) };
    let mut unsorted = high.signature.clone();
    unsorted.extend_from_slice(&low.signature);
    assert!(!h.verifier.verify(&wallet, &message_hash, &unsorted).unwrap());

    assert!(!h.verifier.verify(&wallet, &message_hash, &[]).unwrap());
}

#[test]
fn typed_data_message_flow() {
    let h = harness(2, 2);
    let wallet = h.safe.address;
    let message = Message::typed_from_json(
        r#"{
            "types": {
                "EIP712Domain": [
                    {"name": "name", "type": "string"},
                    {"name": "chainId", "type": "uint256"}
                ],
                "Approval": [
                    {"name": "note", "type": "string"},
                    {"name": "amount", "type": "uint256"}
                ]
            },
            "primaryType": "Approval",
            "domain": {"name": "Treasury", "chainId": 11155111},
            "message": {"note": "Q3 budget", "amount": "1000000000000000000000"}
        }"#,
    )
    .unwrap();

    let message_hash = derive_hash(&message).unwrap();
    let wallet_hash = wallet_message_hash(h.safe.chain_id, &wallet, &message_hash).unwrap();

    h.aggregator
        .propose(&wallet, &message, &sign_wallet_message(&key(0), &wallet_hash).unwrap())
        .unwrap();
    h.aggregator
        .confirm(&wallet_hash, &sign_wallet_message(&key(1), &wallet_hash).unwrap())
        .unwrap();

    let record = h.aggregator.poll_status(&wallet, &wallet_hash).unwrap();
    assert!(record.is_confirmed());
    assert!(record.message().unwrap().is_typed());
    assert_eq!(derive_hash(record.message().unwrap()).unwrap(), message_hash);

    let signature = record.aggregated_signature().unwrap();
    assert!(h.verifier.verify(&wallet, &message_hash, signature).unwrap());
}

#[test]
fn wait_times_out_below_threshold() {
    let h = harness(3, 2);
    let wallet = h.safe.address;
    let message = Message::text("Hello World!");
    let message_hash = derive_hash(&message).unwrap();
    let wallet_hash = wallet_message_hash(h.safe.chain_id, &wallet, &message_hash).unwrap();

    h.aggregator
        .propose(&wallet, &message, &sign_wallet_message(&key(0), &wallet_hash).unwrap())
        .unwrap();

    let config = PollConfig {
        interval: Duration::from_millis(5),
        timeout: Duration::from_millis(30),
    };
    let err = h.aggregator.wait_for_confirmation(&wallet, &wallet_hash, &config).unwrap_err();
    assert_eq!(err.code, ErrorCode::Timeout);
    assert!(*h.relay.gets.lock().unwrap() >= 2);
}

#[test]
fn wait_with_huge_interval_times_out() {
    let h = harness(3, 2);
    let wallet = h.safe.address;
    let message_hash = derive_hash(&Message::text("Hello World!")).unwrap();
    let wallet_hash = wallet_message_hash(h.safe.chain_id, &wallet, &message_hash).unwrap();

    let config = PollConfig {
        interval: Duration::MAX,
        timeout: Duration::from_millis(30),
    };
    let err = h.aggregator.wait_for_confirmation(&wallet, &wallet_hash, &config).unwrap_err();
    assert_eq!(err.code, ErrorCode::Timeout);
    assert_eq!(*h.relay.gets.lock().unwrap(), 1);
}

#[test]
fn absent_record_on_undeployed_wallet_is_pending() {
    let h = harness(3, 2);
    let undeployed = Address::repeat_byte(0x77);
    let message_hash = derive_hash(&Message::text("Hello World!")).unwrap();
    let wallet_hash = wallet_message_hash(h.safe.chain_id, &undeployed, &message_hash).unwrap();

    let record = h.aggregator.poll_status(&undeployed, &wallet_hash).unwrap();
    assert_eq!(record.status(), MessageStatus::Pending);
    assert_eq!(record.submitted_count(), 0);
    assert_eq!(record.required_threshold(), None);
    assert!(record.aggregated_signature().is_none());
}

#[test]
fn unreachable_node_keeps_records_pending() {
    let h = harness(3, 2);
    let offline = ConfirmationAggregator::new(h.relay.clone(), OfflineNode);
    let wallet = h.safe.address;
    let message = Message::text("Hello World!");
    let message_hash = derive_hash(&message).unwrap();
    let wallet_hash = wallet_message_hash(h.safe.chain_id, &wallet, &message_hash).unwrap();

    let record = offline.poll_status(&wallet, &wallet_hash).unwrap();
    assert_eq!(record.status(), MessageStatus::Pending);
    assert_eq!(record.required_threshold(), None);

    h.aggregator
        .propose(&wallet, &message, &sign_wallet_message(&key(0), &wallet_hash).unwrap())
        .unwrap();
    h.aggregator
        .confirm(&wallet_hash, &sign_wallet_message(&key(1), &wallet_hash).unwrap())
        .unwrap();

    // the relay omits the threshold, so without the node it stays unknown
    let record = offline.poll_status(&wallet, &wallet_hash).unwrap();
    assert_eq!(record.submitted_count(), 2);
    assert_eq!(record.required_threshold(), None);
    assert_eq!(record.status(), MessageStatus::Pending);

    assert!(h.aggregator.poll_status(&wallet, &wallet_hash).unwrap().is_confirmed());
}

#[test]
fn relay_rejects_non_owner_and_duplicate() {
    let h = harness(3, 2);
    let wallet = h.safe.address;
    let message = Message::text("Hello World!");
    let message_hash = derive_hash(&message).unwrap();
    let wallet_hash = wallet_message_hash(h.safe.chain_id, &wallet, &message_hash).unwrap();

    let outsider = sign_wallet_message(&key(3), &wallet_hash).unwrap();
    assert_eq!(outsider.owner, address_of(3));
    let err = h.aggregator.propose(&wallet, &message, &outsider).unwrap_err();
    assert_eq!(err.code, ErrorCode::RelayError);

    let first = sign_wallet_message(&key(0), &wallet_hash).unwrap();
    h.aggregator.propose(&wallet, &message, &first).unwrap();
    let err = h.aggregator.confirm(&wallet_hash, &first).unwrap_err();
    assert_eq!(err.code, ErrorCode::RelayError);

    let record = h.aggregator.poll_status(&wallet, &wallet_hash).unwrap();
    assert_eq!(record.submitted_count(), 1);
}

#[test]
fn owners_and_threshold_reads() {
    let h = harness(3, 2);
    let owners = h.verifier.get_owners(&h.safe.address).unwrap();
    assert_eq!(owners, vec![address_of(0), address_of(1), address_of(2)]);
    assert_eq!(h.verifier.get_threshold(&h.safe.address).unwrap(), 2);

    // an EOA has no code and no wallet entry points
    let err = h.verifier.get_threshold(&address_of(0)).unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidAddress);
}
