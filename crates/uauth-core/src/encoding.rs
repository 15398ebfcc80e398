//! # Hex Encoding
//!
//! Keys, signatures, and identifiers cross every boundary as lowercase hex.
//! Decoding failures are `CryptoError::MalformedInput` and name the field
//! that was malformed.

use crate::error::CryptoError;

/// Render bytes as lowercase hex.
pub fn to_hex(bytes: impl AsRef<[u8]>) -> String {
    hex::encode(bytes)
}

/// Decode a hex field. Surrounding whitespace is ignored; both cases are
/// accepted.
pub fn decode_hex(field: &str, value: &str) -> Result<Vec<u8>, CryptoError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CryptoError::MalformedInput(format!("{field} is empty")));
    }
    hex::decode(value)
        .map_err(|e| CryptoError::MalformedInput(format!("{field} is not valid hex: {e}")))
}

/// Decode a hex field into a fixed-size array.
pub fn decode_hex_array<const N: usize>(field: &str, value: &str) -> Result<[u8; N], CryptoError> {
    let bytes = decode_hex(field, value)?;
    let len = bytes.len();
    bytes.try_into().map_err(|_| {
        CryptoError::MalformedInput(format!(
            "{field} must be {N} bytes ({} hex chars), got {len} bytes",
            N * 2
        ))
    })
}

/// First four bytes as hex, for `Debug` output that must not reveal a key.
pub fn hex_prefix(bytes: &[u8]) -> String {
    hex::encode(&bytes[..bytes.len().min(4)])
}
