//! Cryptographic primitives for the sync channel.
//!
//! Content checksums use SHA3-256 over canonical JSON; request signatures use
//! HMAC-SHA256 with a node-scoped secret.

use crate::core::{Error, Hash256, Result};
use hmac::{Hmac, Mac};
use sha2::{Digest as Sha2Digest, Sha256};
use sha3::{Digest, Sha3_256};

type HmacSha256 = Hmac<Sha256>;

/// Compute SHA3-256 hash of data.
pub fn sha3_256(data: &[u8]) -> Hash256 {
    let mut hasher = Sha3_256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&result);
    Hash256::new(bytes)
}

/// Compute SHA-256 of data as a hex string.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Canonical JSON serialization with stable key order.
///
/// serde_json objects are BTreeMap-backed, so keys serialize sorted; two
/// structurally equal values always produce identical bytes.
pub fn canonical_json(value: &serde_json::Value) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

/// Hex SHA3-256 checksum over the canonical serialization of a payload.
pub fn payload_checksum(value: &serde_json::Value) -> Result<String> {
    Ok(sha3_256(&canonical_json(value)?).to_hex())
}

/// The string a request signature commits to.
pub fn signing_input(method: &str, path: &str, body: &[u8], timestamp: i64) -> String {
    format!("{}{}{}{}", method, path, sha256_hex(body), timestamp)
}

/// Sign a request with a node-scoped secret. Returns the hex HMAC-SHA256 tag.
pub fn sign_request(
    secret: &[u8],
    method: &str,
    path: &str,
    body: &[u8],
    timestamp: i64,
) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| Error::Internal(format!("invalid signing secret: {}", e)))?;
    mac.update(signing_input(method, path, body, timestamp).as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verify a hex request signature in constant time.
pub fn verify_request(
    secret: &[u8],
    method: &str,
    path: &str,
    body: &[u8],
    timestamp: i64,
    signature: &str,
) -> Result<()> {
    let tag = hex::decode(signature)
        .map_err(|_| Error::Authentication("malformed signature encoding".to_string()))?;
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| Error::Internal(format!("invalid signing secret: {}", e)))?;
    mac.update(signing_input(method, path, body, timestamp).as_bytes());
    mac.verify_slice(&tag)
        .map_err(|_| Error::Authentication("request signature mismatch".to_string()))
}
