//! Outbound request signing.
//!
//! Builds deliveries carrying the same header set the inbound pipeline
//! verifies: bearer token, key id, timestamp, signature, and nonce.

use crate::channel::crypto::{canonical_json, payload_checksum, sign_request};
use crate::channel::inbound::RequestHeaders;
use crate::core::{now, Result};

/// A signed, ready-to-send delivery.
#[derive(Clone, Debug)]
pub struct SignedDelivery {
    /// HTTP-style method the signature commits to
    pub method: String,
    /// Path the signature commits to
    pub path: String,
    /// Canonical body bytes
    pub body: Vec<u8>,
    /// Authentication headers
    pub headers: RequestHeaders,
    /// Payload checksum carried alongside the body
    pub checksum: String,
}

/// Signs outbound requests on behalf of this service's node identity.
pub struct OutboundSigner {
    node_id: String,
    key_id: String,
    secret: Vec<u8>,
    encoded_token: String,
}

impl OutboundSigner {
    /// Create a signer from this node's credential and encoded bearer token.
    pub fn new(node_id: &str, key_id: &str, secret: Vec<u8>, encoded_token: String) -> Self {
        Self {
            node_id: node_id.to_string(),
            key_id: key_id.to_string(),
            secret,
            encoded_token,
        }
    }

    /// Identity this signer asserts.
    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// Sign a payload for delivery to `path`.
    pub fn sign(&self, method: &str, path: &str, payload: &serde_json::Value) -> Result<SignedDelivery> {
        let body = canonical_json(payload)?;
        let timestamp = now().timestamp();
        let signature = sign_request(&self.secret, method, path, &body, timestamp)?;

        Ok(SignedDelivery {
            method: method.to_string(),
            path: path.to_string(),
            checksum: payload_checksum(payload)?,
            headers: RequestHeaders {
                token: self.encoded_token.clone(),
                key_id: self.key_id.clone(),
                timestamp,
                signature,
                nonce: fresh_nonce(),
            },
            body,
        })
    }
}

/// Random 128-bit hex nonce.
fn fresh_nonce() -> String {
    use rand::RngCore;
    let mut bytes = [0u8; 16];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::crypto::verify_request;
    use serde_json::json;

    fn signer() -> OutboundSigner {
        OutboundSigner::new("hub-node", "k1", b"hub-secret".to_vec(), "token".to_string())
    }

    #[test]
    fn test_signed_delivery_verifies() {
        let delivery = signer().sign("POST", "/sync", &json!({"v": 1})).unwrap();

        assert!(verify_request(
            b"hub-secret",
            "POST",
            "/sync",
            &delivery.body,
            delivery.headers.timestamp,
            &delivery.headers.signature,
        )
        .is_ok());
        assert_eq!(delivery.checksum, payload_checksum(&json!({"v": 1})).unwrap());
    }

    #[test]
    fn test_nonces_are_unique_per_delivery() {
        let s = signer();
        let a = s.sign("POST", "/sync", &json!({"v": 1})).unwrap();
        let b = s.sign("POST", "/sync", &json!({"v": 1})).unwrap();
        assert_ne!(a.headers.nonce, b.headers.nonce);
    }

    #[test]
    fn test_body_is_canonical() {
        let delivery = signer()
            .sign("POST", "/sync", &serde_json::from_str(r#"{"b":2,"a":1}"#).unwrap())
            .unwrap();
        assert_eq!(delivery.body, br#"{"a":1,"b":2}"#.to_vec());
    }
}
