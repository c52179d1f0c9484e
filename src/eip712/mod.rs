//! EIP-712 Typed Data Hashing
//!
//! Implementation of EIP-712 typed structured data hashing, plus the
//! ECDSA primitives owners use to sign digests.
//!
//! # Reference
//! - <https://eips.ethereum.org/EIPS/eip-712>
//!
//! # Example
//! ```rust,ignore
//! use safe_message::eip712::{TypedData, hash_typed_data};
//!
//! let typed_data = TypedData::from_json(json_string)?;
//! let hash = hash_typed_data(&typed_data)?;
//! ```

pub mod types;
pub mod encoder;
pub mod hasher;
pub mod signer;

pub use types::*;
pub use encoder::*;
pub use hasher::*;
pub use signer::*;
