//! Value encodings.
//!
//! Counters and balances are 8-byte big-endian integers so they stay
//! readable through `debug_get_raw`. Structured records are CBOR via
//! [`ciborium`].

use serde::{de::DeserializeOwned, Serialize};
use verity_types::{AccountId, ACCOUNT_ID_LEN};

use crate::{Result, StoreError};

/// Encode a `u64` as 8 big-endian bytes.
pub fn encode_u64(value: u64) -> Vec<u8> {
    value.to_be_bytes().to_vec()
}

/// Decode a `u64` written by [`encode_u64`].
///
/// # Errors
///
/// Returns [`StoreError::Codec`] if `bytes` is not exactly 8 bytes long.
pub fn decode_u64(bytes: &[u8]) -> Result<u64> {
    let arr: [u8; 8] = bytes
        .try_into()
        .map_err(|_| StoreError::Codec(format!("expected 8-byte u64, got {} bytes", bytes.len())))?;
    Ok(u64::from_be_bytes(arr))
}

/// Encode an `i64` as 8 big-endian bytes.
pub fn encode_i64(value: i64) -> Vec<u8> {
    value.to_be_bytes().to_vec()
}

/// Decode an `i64` written by [`encode_i64`].
///
/// # Errors
///
/// Returns [`StoreError::Codec`] if `bytes` is not exactly 8 bytes long.
pub fn decode_i64(bytes: &[u8]) -> Result<i64> {
    let arr: [u8; 8] = bytes
        .try_into()
        .map_err(|_| StoreError::Codec(format!("expected 8-byte i64, got {} bytes", bytes.len())))?;
    Ok(i64::from_be_bytes(arr))
}

/// Decode an account identity stored as its raw bytes.
///
/// # Errors
///
/// Returns [`StoreError::Codec`] on a length mismatch.
pub fn decode_account(bytes: &[u8]) -> Result<AccountId> {
    let arr: [u8; ACCOUNT_ID_LEN] = bytes.try_into().map_err(|_| {
        StoreError::Codec(format!(
            "expected {ACCOUNT_ID_LEN}-byte account id, got {} bytes",
            bytes.len()
        ))
    })?;
    Ok(AccountId(arr))
}

/// Serialize a record to CBOR bytes.
///
/// # Errors
///
/// Returns [`StoreError::Codec`] if the value cannot be serialized.
pub fn to_vec<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf)
        .map_err(|e| StoreError::Codec(format!("CBOR serialization failed: {e}")))?;
    Ok(buf)
}

/// Deserialize a record from CBOR bytes.
///
/// # Errors
///
/// Returns [`StoreError::Codec`] if the bytes do not decode into `T`.
pub fn from_slice<T: DeserializeOwned>(data: &[u8]) -> Result<T> {
    ciborium::from_reader(data)
        .map_err(|e| StoreError::Codec(format!("CBOR deserialization failed: {e}")))
}
