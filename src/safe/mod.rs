//! Wallet contract side of the message flow
//!
//! - Wallet-scoped hashing (`SafeMessage` under the wallet's EIP-712 domain)
//! - Owner signing and prepared-signature assembly
//! - Contract reads and EIP-1271 verification over JSON-RPC

pub mod contract;
pub mod hashing;
pub mod rpc;
pub mod signing;
pub mod verifier;

pub use contract::{LEGACY_MAGIC_VALUE, MAGIC_VALUE};
pub use hashing::{wallet_domain_separator, wallet_message_hash};
pub use rpc::{CallOutcome, ContractReader, JsonRpcClient};
pub use signing::{build_prepared_signature, sign_wallet_message, OwnerSignature};
pub use verifier::OnChainVerifier;
