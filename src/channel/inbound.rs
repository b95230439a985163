//! Inbound verification pipeline.
//!
//! Order: token -> request signature -> timestamp window -> nonce ->
//! payload checksum -> `(node_id, sync_id)` uniqueness. Any failure rejects
//! the whole request; duplicates return the originally stored acknowledgment.

use crate::audit::{AuditEntry, AuditEventType, AuditLog};
use crate::channel::crypto::{payload_checksum, verify_request};
use crate::channel::envelope::{SyncEnvelope, SyncRequest, SyncResponse, SyncStatus};
use crate::channel::token::IdentityToken;
use crate::core::{now, EngineConfig, Error, Result};
use crate::registry::{require_credential, CredentialStore};
use crate::store::{InsertOutcome, NonceStore, SyncStore};
use std::sync::Arc;
use tracing::{debug, warn};

/// Authentication material carried alongside a request body.
#[derive(Clone, Debug)]
pub struct RequestHeaders {
    /// Encoded bearer identity token
    pub token: String,
    /// Identifier of the secret used to sign the request
    pub key_id: String,
    /// Sender clock, unix seconds
    pub timestamp: i64,
    /// Hex HMAC-SHA256 request signature
    pub signature: String,
    /// Single-use nonce
    pub nonce: String,
}

/// Result of accepting an inbound sync.
#[derive(Clone, Debug)]
pub struct SyncReceipt {
    /// Response to return to the caller
    pub response: SyncResponse,
    /// The stored envelope, present only for first-time acceptance
    pub envelope: Option<SyncEnvelope>,
}

/// The authenticated, replay-protected, idempotent inbound channel.
pub struct SecureChannel {
    credentials: Arc<dyn CredentialStore>,
    nonces: Arc<dyn NonceStore>,
    sync_store: Arc<dyn SyncStore>,
    audit: Arc<dyn AuditLog>,
    config: EngineConfig,
    /// Audience this service accepts tokens for
    audience: String,
}

impl SecureChannel {
    /// Create a channel.
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        nonces: Arc<dyn NonceStore>,
        sync_store: Arc<dyn SyncStore>,
        audit: Arc<dyn AuditLog>,
        config: EngineConfig,
        audience: &str,
    ) -> Self {
        Self {
            credentials,
            nonces,
            sync_store,
            audit,
            config,
            audience: audience.to_string(),
        }
    }

    /// Process an inbound signed request. Every outcome is audited.
    pub async fn receive(
        &self,
        method: &str,
        path: &str,
        headers: &RequestHeaders,
        body: &[u8],
    ) -> Result<SyncReceipt> {
        match self.verify_and_store(method, path, headers, body).await {
            Ok((receipt, actor)) => {
                let duplicate = receipt.response.acknowledgment.duplicate;
                self.audit
                    .append(
                        AuditEntry::new(AuditEventType::SyncInbound, &actor, path)
                            .with_metadata("sync_id", &receipt.response.sync_id)
                            .with_metadata("duplicate", duplicate),
                    )
                    .await?;
                Ok(receipt)
            }
            Err(err) => {
                warn!(path, error = %err, "inbound sync rejected");
                let actor = IdentityToken::decode(&headers.token)
                    .map(|t| t.claims.node_id)
                    .unwrap_or_else(|_| "unknown".to_string());
                self.audit
                    .append(
                        AuditEntry::new(AuditEventType::SyncInbound, &actor, path)
                            .failed(err.classification()),
                    )
                    .await?;
                Err(err)
            }
        }
    }

    async fn verify_and_store(
        &self,
        method: &str,
        path: &str,
        headers: &RequestHeaders,
        body: &[u8],
    ) -> Result<(SyncReceipt, String)> {
        // 1. Caller identity
        let token = IdentityToken::decode(&headers.token)?;
        let issuer_key = self.credentials.issuer_key().await?;
        token.verify(&issuer_key, &self.audience)?;
        let node_id = token.claims.node_id.clone();

        // 2. Request signature with the node-scoped secret
        let credential = require_credential(self.credentials.as_ref(), &node_id).await?;
        if credential.key_id != headers.key_id {
            return Err(Error::Authentication(format!(
                "unknown key id '{}' for node {}",
                headers.key_id, node_id
            )));
        }
        verify_request(
            &credential.secret,
            method,
            path,
            body,
            headers.timestamp,
            &headers.signature,
        )?;

        // 3. Timestamp tolerance window
        let skew = (now().timestamp() - headers.timestamp).abs();
        if skew > self.config.replay_tolerance_secs {
            return Err(Error::Replay(format!(
                "timestamp {}s outside {}s tolerance window",
                skew, self.config.replay_tolerance_secs
            )));
        }

        // 4. Nonce uniqueness
        if !self.nonces.claim(&headers.nonce).await? {
            return Err(Error::Replay(format!("nonce '{}' already used", headers.nonce)));
        }

        // 5. Payload checksum, recomputed independently of the signature
        let request: SyncRequest = serde_json::from_slice(body)
            .map_err(|e| Error::Validation(format!("malformed sync body: {}", e)))?;
        if request.node_id != node_id {
            return Err(Error::Authentication(format!(
                "body node '{}' does not match token subject '{}'",
                request.node_id, node_id
            )));
        }
        let computed = payload_checksum(&request.data)?;
        if computed != request.metadata.checksum {
            return Err(Error::Integrity(format!(
                "declared checksum {} does not match computed {}",
                request.metadata.checksum, computed
            )));
        }

        // 6. (node_id, sync_id) uniqueness, atomic at the store
        let mut envelope = SyncEnvelope::inbound(&request);
        envelope.transition(SyncStatus::Verifying)?;
        let sync_id = envelope.sync_id.clone();

        match self.sync_store.insert(envelope).await? {
            InsertOutcome::Inserted => {
                self.sync_store
                    .update_status(&node_id, &sync_id, SyncStatus::Verified)
                    .await?;
                let stored = self
                    .sync_store
                    .get(&node_id, &sync_id)
                    .await?
                    .ok_or_else(|| Error::Internal("stored envelope vanished".to_string()))?;
                debug!(%node_id, %sync_id, "sync accepted");
                Ok((
                    SyncReceipt {
                        response: SyncResponse {
                            success: true,
                            sync_id,
                            acknowledgment: stored.acknowledgment(false),
                        },
                        envelope: Some(stored),
                    },
                    node_id,
                ))
            }
            InsertOutcome::Duplicate(original) => {
                debug!(%node_id, %sync_id, "sync replay deduplicated");
                Ok((
                    SyncReceipt {
                        response: SyncResponse {
                            success: true,
                            sync_id,
                            acknowledgment: original.acknowledgment(true),
                        },
                        envelope: None,
                    },
                    node_id,
                ))
            }
        }
    }
}
