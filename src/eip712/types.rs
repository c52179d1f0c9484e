//! EIP-712 Type Definitions
//!
//! Core data structures for EIP-712 typed data.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Name of the implicit domain struct
pub const DOMAIN_TYPE: &str = "EIP712Domain";

/// A field in a struct type definition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TypedDataField {
    /// The name of the field
    pub name: String,
    /// The type of the field (e.g., "address", "uint256", "bytes32")
    #[serde(rename = "type")]
    pub type_name: String,
}

impl TypedDataField {
    pub fn new(name: &str, type_name: &str) -> Self {
        Self {
            name: name.to_string(),
            type_name: type_name.to_string(),
        }
    }
}

/// The EIP-712 domain separator data
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Eip712Domain {
    /// The human-readable name of the signing domain
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// The current major version of the signing domain
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// The EIP-155 chain ID (number, decimal string or hex string)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<serde_json::Value>,

    /// The address of the contract that will verify the signature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verifying_contract: Option<String>,

    /// An optional disambiguating salt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salt: Option<String>,
}

impl Eip712Domain {
    /// Domain fields in canonical order, for the values that are present
    pub fn present_fields(&self) -> Vec<TypedDataField> {
        let mut fields = Vec::new();

        if self.name.is_some() {
            fields.push(TypedDataField::new("name", "string"));
        }
        if self.version.is_some() {
            fields.push(TypedDataField::new("version", "string"));
        }
        if self.chain_id.is_some() {
            fields.push(TypedDataField::new("chainId", "uint256"));
        }
        if self.verifying_contract.is_some() {
            fields.push(TypedDataField::new("verifyingContract", "address"));
        }
        if self.salt.is_some() {
            fields.push(TypedDataField::new("salt", "bytes32"));
        }

        fields
    }
}

/// Complete EIP-712 typed data structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TypedData {
    /// Type definitions (struct name -> fields)
    pub types: HashMap<String, Vec<TypedDataField>>,

    /// The name of the primary type being signed
    pub primary_type: String,

    /// The EIP-712 domain
    pub domain: Eip712Domain,

    /// The actual message data to sign
    pub message: serde_json::Value,
}

impl TypedData {
    /// Parse typed data from a JSON string
    pub fn from_json(json: &str) -> Result<Self, Eip712Error> {
        serde_json::from_str(json).map_err(|e| Eip712Error::InvalidJson(e.to_string()))
    }

    /// Parse typed data from an already-decoded JSON value
    pub fn from_value(value: serde_json::Value) -> Result<Self, Eip712Error> {
        serde_json::from_value(value).map_err(|e| Eip712Error::InvalidJson(e.to_string()))
    }

    /// Domain fields to hash.
    ///
    /// A declared `EIP712Domain` must name exactly the domain values that are
    /// present, with their standard types; its declaration order is kept.
    /// Without a declaration the canonical order is used.
    pub fn domain_fields(&self) -> Result<Vec<TypedDataField>, Eip712Error> {
        let present = self.domain.present_fields();

        let Some(declared) = self.types.get(DOMAIN_TYPE) else {
            return Ok(present);
        };

        if declared.len() != present.len() {
            return Err(Eip712Error::InvalidDomain(format!(
                "{} declares {} fields but the domain has {}",
                DOMAIN_TYPE,
                declared.len(),
                present.len()
            )));
        }
        for field in declared {
            if !present.contains(field) {
                return Err(Eip712Error::InvalidDomain(format!(
                    "declared field `{} {}` has no matching domain value",
                    field.type_name, field.name
                )));
            }
        }

        Ok(declared.clone())
    }

    /// Validate the typed data structure
    pub fn validate(&self) -> Result<(), Eip712Error> {
        if !self.types.contains_key(&self.primary_type) {
            return Err(Eip712Error::InvalidPrimaryType(self.primary_type.clone()));
        }

        for fields in self.types.values() {
            for field in fields {
                self.validate_type(&field.type_name)?;
            }
        }

        self.domain_fields()?;

        Ok(())
    }

    /// Check if a type is valid (either a built-in type or defined in types)
    fn validate_type(&self, type_name: &str) -> Result<(), Eip712Error> {
        let base_type = base_type(type_name);

        if is_atomic_type(base_type) || is_dynamic_type(base_type) {
            return Ok(());
        }

        if self.types.contains_key(base_type) {
            return Ok(());
        }

        Err(Eip712Error::InvalidType(type_name.to_string()))
    }
}

/// Errors that can occur during EIP-712 operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum Eip712Error {
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("Invalid type: {0}")]
    InvalidType(String),

    #[error("Invalid primary type: {0}")]
    InvalidPrimaryType(String),

    #[error("Invalid domain: {0}")]
    InvalidDomain(String),

    #[error("Missing field: {0}")]
    MissingField(String),

    #[error("Invalid value for type {type_name}: {value}")]
    InvalidValue { type_name: String, value: String },

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}

/// Strip every array suffix: "Person[][2]" -> "Person"
pub fn base_type(type_name: &str) -> &str {
    match type_name.find('[') {
        Some(pos) => &type_name[..pos],
        None => type_name,
    }
}

/// Check if a type is an atomic (fixed-size) type
pub fn is_atomic_type(type_name: &str) -> bool {
    if type_name == "address" || type_name == "bool" {
        return true;
    }

    // uintN and intN
    let bits = type_name
        .strip_prefix("uint")
        .or_else(|| type_name.strip_prefix("int"));
    if let Some(bits) = bits {
        if let Ok(n) = bits.parse::<u32>() {
            return n > 0 && n <= 256 && n % 8 == 0;
        }
        return false;
    }

    // bytesN (fixed-size bytes)
    if let Some(size) = type_name.strip_prefix("bytes") {
        if let Ok(n) = size.parse::<u32>() {
            return n > 0 && n <= 32;
        }
    }

    false
}

/// Check if a type is a dynamic type
pub fn is_dynamic_type(type_name: &str) -> bool {
    type_name == "bytes" || type_name == "string"
}
