//! Bearer identity tokens.
//!
//! Tokens assert a node's identity and are Ed25519-signed by a trusted issuer.

use crate::core::{now, Error, Result, Timestamp};
use crate::channel::crypto::sha3_256;
use base64::Engine;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};

/// Claims asserted by an identity token.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Node this token identifies
    pub node_id: String,
    /// Node role/type (e.g. "worker", "coordinator")
    pub node_type: String,
    /// Issuing authority
    pub issuer: String,
    /// Intended recipient service
    pub audience: String,
    /// Issuance time
    pub issued_at: Timestamp,
}

/// A signed bearer token.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IdentityToken {
    /// Asserted claims
    pub claims: TokenClaims,
    /// Base64 Ed25519 signature over the claims hash
    pub signature: String,
}

impl IdentityToken {
    fn claims_hash(claims: &TokenClaims) -> Result<[u8; 32]> {
        let json = serde_json::to_vec(claims)?;
        Ok(*sha3_256(&json).as_bytes())
    }

    /// Issue a token by signing the claims with the issuer key.
    pub fn issue(claims: TokenClaims, issuer_key: &SigningKey) -> Result<Self> {
        let hash = Self::claims_hash(&claims)?;
        let signature = issuer_key.sign(&hash);
        Ok(Self {
            claims,
            signature: base64::engine::general_purpose::STANDARD.encode(signature.to_bytes()),
        })
    }

    /// Encode as a base64 bearer string.
    pub fn encode(&self) -> Result<String> {
        let json = serde_json::to_vec(self)?;
        Ok(base64::engine::general_purpose::STANDARD.encode(json))
    }

    /// Decode from a base64 bearer string.
    pub fn decode(encoded: &str) -> Result<Self> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|_| Error::Authentication("malformed bearer token".to_string()))?;
        serde_json::from_slice(&bytes)
            .map_err(|_| Error::Authentication("malformed bearer token".to_string()))
    }

    /// Verify the issuer signature and the intended audience.
    pub fn verify(&self, issuer_key: &VerifyingKey, expected_audience: &str) -> Result<()> {
        let sig_bytes: [u8; 64] = base64::engine::general_purpose::STANDARD
            .decode(&self.signature)
            .map_err(|_| Error::Authentication("malformed token signature".to_string()))?
            .try_into()
            .map_err(|_| Error::Authentication("invalid token signature length".to_string()))?;
        let signature = Signature::from_bytes(&sig_bytes);

        let hash = Self::claims_hash(&self.claims)?;
        issuer_key
            .verify(&hash, &signature)
            .map_err(|_| Error::Authentication("token signature mismatch".to_string()))?;

        if self.claims.audience != expected_audience {
            return Err(Error::Authentication(format!(
                "token audience '{}' does not match '{}'",
                self.claims.audience, expected_audience
            )));
        }
        Ok(())
    }
}

/// Token issuing authority holding the signing key.
pub struct TokenIssuer {
    signing_key: SigningKey,
    issuer: String,
}

impl TokenIssuer {
    /// Create an issuer with a fresh random key pair.
    pub fn generate(issuer: &str) -> Self {
        use rand::RngCore;
        let mut csprng = rand::rngs::OsRng;
        let mut secret_key_bytes = [0u8; 32];
        csprng.fill_bytes(&mut secret_key_bytes);
        Self {
            signing_key: SigningKey::from_bytes(&secret_key_bytes),
            issuer: issuer.to_string(),
        }
    }

    /// Create an issuer from existing key bytes.
    pub fn from_bytes(issuer: &str, bytes: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(bytes),
            issuer: issuer.to_string(),
        }
    }

    /// The public key nodes use to verify tokens.
    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Issue a token for a node.
    pub fn issue_for(&self, node_id: &str, node_type: &str, audience: &str) -> Result<IdentityToken> {
        IdentityToken::issue(
            TokenClaims {
                node_id: node_id.to_string(),
                node_type: node_type.to_string(),
                issuer: self.issuer.clone(),
                audience: audience.to_string(),
                issued_at: now(),
            },
            &self.signing_key,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_verify() {
        let issuer = TokenIssuer::generate("accord-ca");
        let token = issuer.issue_for("node-a", "worker", "consensus-core").unwrap();

        assert!(token.verify(&issuer.verifying_key(), "consensus-core").is_ok());
        assert_eq!(token.claims.issuer, "accord-ca");
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let issuer = TokenIssuer::generate("accord-ca");
        let token = issuer.issue_for("node-a", "worker", "consensus-core").unwrap();

        let encoded = token.encode().unwrap();
        let decoded = IdentityToken::decode(&encoded).unwrap();
        assert_eq!(decoded.claims.node_id, "node-a");
        assert!(decoded.verify(&issuer.verifying_key(), "consensus-core").is_ok());
    }

    #[test]
    fn test_wrong_audience_rejected() {
        let issuer = TokenIssuer::generate("accord-ca");
        let token = issuer.issue_for("node-a", "worker", "consensus-core").unwrap();

        let err = token.verify(&issuer.verifying_key(), "other-service").unwrap_err();
        assert_eq!(err.classification(), "authentication_error");
    }

    #[test]
    fn test_wrong_issuer_key_rejected() {
        let issuer = TokenIssuer::generate("accord-ca");
        let impostor = TokenIssuer::generate("accord-ca");
        let token = issuer.issue_for("node-a", "worker", "consensus-core").unwrap();

        assert!(token.verify(&impostor.verifying_key(), "consensus-core").is_err());
    }

    #[test]
    fn test_tampered_claims_rejected() {
        let issuer = TokenIssuer::generate("accord-ca");
        let mut token = issuer.issue_for("node-a", "worker", "consensus-core").unwrap();
        token.claims.node_id = "node-b".to_string();

        assert!(token.verify(&issuer.verifying_key(), "consensus-core").is_err());
    }

    #[test]
    fn test_decode_garbage_rejected() {
        assert!(IdentityToken::decode("not base64!!").is_err());
    }
}
