//! EIP-712 Type Encoding
//!
//! Implements `encodeType`, `typeHash` and `encodeData` for typed data.

use super::types::*;
use crate::utils::crypto::keccak256;
use ethers_core::types::{I256, U256};
use std::collections::{HashMap, HashSet};

type Types = HashMap<String, Vec<TypedDataField>>;

/// Encode a type string for a struct type
/// Format: "TypeName(type1 name1,type2 name2,...)Dep1(...)Dep2(...)"
pub fn encode_type(type_name: &str, types: &Types) -> Result<String, Eip712Error> {
    let fields = types
        .get(type_name)
        .ok_or_else(|| Eip712Error::InvalidType(type_name.to_string()))?;

    let mut result = format_type_string(type_name, fields);

    // Primary type first, then dependencies alphabetically
    let mut sorted_deps: Vec<_> = find_type_dependencies(type_name, types)
        .into_iter()
        .filter(|dep| dep != type_name)
        .collect();
    sorted_deps.sort();

    for dep in sorted_deps {
        if let Some(dep_fields) = types.get(&dep) {
            result.push_str(&format_type_string(&dep, dep_fields));
        }
    }

    Ok(result)
}

fn format_type_string(type_name: &str, fields: &[TypedDataField]) -> String {
    let field_strs: Vec<String> = fields
        .iter()
        .map(|f| format!("{} {}", f.type_name, f.name))
        .collect();

    format!("{}({})", type_name, field_strs.join(","))
}

/// Find all struct types reachable from `type_name`, itself included
pub fn find_type_dependencies(type_name: &str, types: &Types) -> HashSet<String> {
    let mut dependencies = HashSet::new();
    let mut to_visit = vec![type_name.to_string()];

    while let Some(current) = to_visit.pop() {
        if dependencies.contains(&current) {
            continue;
        }

        if let Some(fields) = types.get(&current) {
            dependencies.insert(current.clone());

            for field in fields {
                let base = base_type(&field.type_name);
                if types.contains_key(base) && !dependencies.contains(base) {
                    to_visit.push(base.to_string());
                }
            }
        }
    }

    dependencies
}

/// typeHash = keccak256(encodeType(typeOf(s)))
pub fn type_hash(type_name: &str, types: &Types) -> Result<[u8; 32], Eip712Error> {
    let encoded = encode_type(type_name, types)?;
    Ok(keccak256(encoded.as_bytes()))
}

/// Encode a value according to its type.
///
/// Atomic values come back as their 32-byte word; structs, arrays and
/// dynamic values come back as the pre-image that their enclosing struct
/// hashes (see [`encode_field`]).
pub fn encode_value(type_name: &str, value: &serde_json::Value, types: &Types) -> Result<Vec<u8>, Eip712Error> {
    if let Some(element_type) = array_element_type(type_name) {
        return encode_array(type_name, element_type, value, types);
    }

    match type_name {
        "bytes" => encode_bytes(value),
        "string" => encode_string(value),
        _ if types.contains_key(type_name) => encode_struct(type_name, value, types),
        _ => Ok(encode_atomic(type_name, value)?.to_vec()),
    }
}

/// The 32-byte word a member contributes to its parent's encoding
pub fn encode_field(type_name: &str, value: &serde_json::Value, types: &Types) -> Result<[u8; 32], Eip712Error> {
    let encoded = encode_value(type_name, value, types)?;

    let hashed = array_element_type(type_name).is_some()
        || is_dynamic_type(type_name)
        || types.contains_key(type_name);
    if hashed {
        return Ok(keccak256(&encoded));
    }

    let mut word = [0u8; 32];
    word.copy_from_slice(&encoded);
    Ok(word)
}

/// "uint256[][3]" -> "uint256[]", "Person[]" -> "Person"
fn array_element_type(type_name: &str) -> Option<&str> {
    if !type_name.ends_with(']') {
        return None;
    }
    type_name.rfind('[').map(|pos| &type_name[..pos])
}

/// Declared length of a fixed-size array type, `None` for `T[]`
fn array_length(type_name: &str) -> Result<Option<usize>, Eip712Error> {
    let open = type_name
        .rfind('[')
        .ok_or_else(|| Eip712Error::InvalidType(type_name.to_string()))?;
    let inner = &type_name[open + 1..type_name.len() - 1];
    if inner.is_empty() {
        return Ok(None);
    }
    inner
        .parse()
        .map(Some)
        .map_err(|_| Eip712Error::InvalidType(type_name.to_string()))
}

fn encode_struct(type_name: &str, value: &serde_json::Value, types: &Types) -> Result<Vec<u8>, Eip712Error> {
    let obj = value.as_object().ok_or_else(|| invalid_value(type_name, value))?;

    let fields = types
        .get(type_name)
        .ok_or_else(|| Eip712Error::InvalidType(type_name.to_string()))?;

    let mut encoded = Vec::with_capacity(32 * (fields.len() + 1));
    encoded.extend_from_slice(&type_hash(type_name, types)?);

    for field in fields {
        let field_value = obj.get(&field.name).ok_or_else(|| {
            Eip712Error::MissingField(format!("{}.{}", type_name, field.name))
        })?;
        encoded.extend_from_slice(&encode_field(&field.type_name, field_value, types)?);
    }

    Ok(encoded)
}

fn encode_array(
    type_name: &str,
    element_type: &str,
    value: &serde_json::Value,
    types: &Types,
) -> Result<Vec<u8>, Eip712Error> {
    let arr = value.as_array().ok_or_else(|| invalid_value(type_name, value))?;

    if let Some(expected) = array_length(type_name)? {
        if arr.len() != expected {
            return Err(Eip712Error::InvalidValue {
                type_name: type_name.to_string(),
                value: format!("expected {} elements, got {}", expected, arr.len()),
            });
        }
    }

    let mut encoded = Vec::with_capacity(32 * arr.len());
    for item in arr {
        encoded.extend_from_slice(&encode_field(element_type, item, types)?);
    }

    Ok(encoded)
}

/// Encode an atomic (fixed-size) value into one word
fn encode_atomic(type_name: &str, value: &serde_json::Value) -> Result<[u8; 32], Eip712Error> {
    let mut result = [0u8; 32];

    if type_name == "address" {
        let addr = value.as_str().ok_or_else(|| invalid_value(type_name, value))?;
        result[12..].copy_from_slice(&parse_address(addr)?);
        return Ok(result);
    }

    if type_name == "bool" {
        let b = value.as_bool().ok_or_else(|| invalid_value(type_name, value))?;
        result[31] = u8::from(b);
        return Ok(result);
    }

    if let Some(bits) = type_name.strip_prefix("uint") {
        let bits: usize = bits.parse().map_err(|_| Eip712Error::InvalidType(type_name.to_string()))?;
        let n = parse_uint(type_name, value)?;
        if n.bits() > bits {
            return Err(Eip712Error::InvalidValue {
                type_name: type_name.to_string(),
                value: format!("{} does not fit in {} bits", n, bits),
            });
        }
        n.to_big_endian(&mut result);
        return Ok(result);
    }

    if type_name.starts_with("int") {
        // Two's complement, sign-extended to 256 bits
        parse_int(type_name, value)?.into_raw().to_big_endian(&mut result);
        return Ok(result);
    }

    if let Some(size) = type_name.strip_prefix("bytes") {
        let size: usize = size.parse().map_err(|_| Eip712Error::InvalidType(type_name.to_string()))?;
        let hex_str = value.as_str().ok_or_else(|| invalid_value(type_name, value))?;
        let bytes = parse_hex(hex_str)?;
        if bytes.len() > size {
            return Err(Eip712Error::InvalidValue {
                type_name: type_name.to_string(),
                value: format!("bytes too long: {} > {}", bytes.len(), size),
            });
        }

        // Right-padded
        result[..bytes.len()].copy_from_slice(&bytes);
        return Ok(result);
    }

    Err(Eip712Error::InvalidType(type_name.to_string()))
}

fn encode_bytes(value: &serde_json::Value) -> Result<Vec<u8>, Eip712Error> {
    let hex_str = value.as_str().ok_or_else(|| invalid_value("bytes", value))?;
    parse_hex(hex_str)
}

fn encode_string(value: &serde_json::Value) -> Result<Vec<u8>, Eip712Error> {
    let s = value.as_str().ok_or_else(|| invalid_value("string", value))?;
    Ok(s.as_bytes().to_vec())
}

fn invalid_value(type_name: &str, value: &serde_json::Value) -> Eip712Error {
    Eip712Error::InvalidValue {
        type_name: type_name.to_string(),
        value: value.to_string(),
    }
}

/// Parse an Ethereum address
fn parse_address(addr: &str) -> Result<[u8; 20], Eip712Error> {
    let addr = addr.strip_prefix("0x").unwrap_or(addr);

    if addr.len() != 40 {
        return Err(Eip712Error::InvalidAddress(format!(
            "invalid length: expected 40 hex chars, got {}",
            addr.len()
        )));
    }

    let bytes = hex::decode(addr).map_err(|e| Eip712Error::InvalidAddress(format!("invalid hex: {}", e)))?;

    let mut result = [0u8; 20];
    result.copy_from_slice(&bytes);
    Ok(result)
}

/// Unsigned integer from a JSON number, decimal string or `0x` hex string
fn parse_uint(type_name: &str, value: &serde_json::Value) -> Result<U256, Eip712Error> {
    let text = match value {
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => s.trim().to_string(),
        _ => return Err(invalid_value(type_name, value)),
    };

    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(digits) => U256::from_str_radix(digits, 16).ok(),
        None => U256::from_dec_str(&text).ok(),
    };
    parsed.ok_or_else(|| invalid_value(type_name, value))
}

/// Signed integer from a JSON number, decimal string or `0x` hex string
fn parse_int(type_name: &str, value: &serde_json::Value) -> Result<I256, Eip712Error> {
    let text = match value {
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => s.trim().to_string(),
        _ => return Err(invalid_value(type_name, value)),
    };

    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(digits) => U256::from_str_radix(digits, 16).ok().map(I256::from_raw),
        None => I256::from_dec_str(&text).ok(),
    };
    parsed.ok_or_else(|| invalid_value(type_name, value))
}

/// Parse a hex string (with or without 0x prefix)
fn parse_hex(s: &str) -> Result<Vec<u8>, Eip712Error> {
    let s = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
    hex::decode(s).map_err(|e| Eip712Error::EncodingError(format!("invalid hex: {}", e)))
}

#[cfg(test)]
mod encoder_tests {
    use super::*;
    use serde_json::json;

    fn mail_types() -> Types {
        let mut types = HashMap::new();
        types.insert("Mail".to_string(), vec![
            TypedDataField::new("from", "Person"),
            TypedDataField::new("to", "Person"),
            TypedDataField::new("contents", "string"),
        ]);
        types.insert("Person".to_string(), vec![
            TypedDataField::new("name", "string"),
            TypedDataField::new("wallet", "address"),
        ]);
        types
    }

    #[test]
    fn test_encode_type_simple() {
        let encoded = encode_type("Person", &mail_types()).unwrap();
        assert_eq!(encoded, "Person(string name,address wallet)");
    }

    #[test]
    fn test_encode_type_with_dependencies() {
        let encoded = encode_type("Mail", &mail_types()).unwrap();
        assert_eq!(encoded, "Mail(Person from,Person to,string contents)Person(string name,address wallet)");
    }

    #[test]
    fn test_mail_type_hash() {
        // typeHash from the EIP-712 reference example
        let hash = type_hash("Mail", &mail_types()).unwrap();
        assert_eq!(
            hex::encode(hash),
            "a0cedeb2dc280ba39b857546d74f5549c3a1d7bdc2dd96bf881f76108e23dac2"
        );
    }

    #[test]
    fn test_uint_encodings_agree() {
        let as_number = encode_atomic("uint256", &json!(1_000_000)).unwrap();
        let as_decimal = encode_atomic("uint256", &json!("1000000")).unwrap();
        let as_hex = encode_atomic("uint256", &json!("0xf4240")).unwrap();
        assert_eq!(as_number, as_decimal);
        assert_eq!(as_number, as_hex);
        assert_eq!(&as_number[29..], &[0x0f, 0x42, 0x40]);
    }

    #[test]
    fn test_uint_full_width() {
        let max = "115792089237316195423570985008687907853269984665640564039457584007913129639935";
        assert_eq!(encode_atomic("uint256", &json!(max)).unwrap(), [0xff; 32]);
        assert!(encode_atomic("uint8", &json!(256)).is_err());
        assert!(encode_atomic("uint8", &json!(-1)).is_err());
    }

    #[test]
    fn test_negative_int_sign_extends() {
        let encoded = encode_atomic("int256", &json!(-1)).unwrap();
        assert_eq!(encoded, [0xff; 32]);

        let encoded = encode_atomic("int64", &json!("-2")).unwrap();
        assert_eq!(encoded[31], 0xfe);
        assert_eq!(encoded[0], 0xff);
    }

    #[test]
    fn test_bytes_n_right_padded() {
        let encoded = encode_atomic("bytes4", &json!("0xdeadbeef")).unwrap();
        assert_eq!(&encoded[..4], &[0xde, 0xad, 0xbe, 0xef]);
        assert!(encoded[4..].iter().all(|b| *b == 0));
        assert!(encode_atomic("bytes2", &json!("0xdeadbeef")).is_err());
    }

    #[test]
    fn test_fixed_array_length_checked() {
        let types = HashMap::new();
        assert!(encode_value("uint8[2]", &json!([1, 2]), &types).is_ok());
        assert!(encode_value("uint8[2]", &json!([1, 2, 3]), &types).is_err());
    }

    #[test]
    fn test_nested_array_elements_hashed() {
        let types = HashMap::new();
        let encoded = encode_value("uint8[][]", &json!([[1], [2, 3]]), &types).unwrap();
        // One hashed word per inner array
        assert_eq!(encoded.len(), 64);
        let inner = encode_value("uint8[]", &json!([1]), &types).unwrap();
        assert_eq!(&encoded[..32], &keccak256(&inner));
    }

    #[test]
    fn test_missing_field() {
        let value = json!({"name": "Cow"});
        let err = encode_value("Person", &value, &mail_types()).unwrap_err();
        assert!(matches!(err, Eip712Error::MissingField(f) if f == "Person.wallet"));
    }

    #[test]
    fn test_parse_address() {
        let addr = parse_address("0xCD2a3d9F938E13CD947Ec05AbC7FE734Df8DD826").unwrap();
        assert_eq!(addr.len(), 20);
        assert_eq!(addr[0], 0xCD);
    }
}
