//! Node registry and credential store collaborators.
//!
//! The engine consumes these through narrow traits; production deployments
//! back them with their own directory and secret-management services.

use crate::core::{now, Error, Result, Timestamp};
use async_trait::async_trait;
use ed25519_dalek::VerifyingKey;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

/// A registered participant node.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeEntry {
    /// Node ID
    pub node_id: String,
    /// Node role/type
    pub node_type: String,
    /// Delivery endpoint for broadcasts
    pub endpoint: String,
    /// Whether the node currently receives broadcasts
    pub active: bool,
    /// Registration time
    pub registered_at: Timestamp,
}

impl NodeEntry {
    /// Create an active node entry.
    pub fn new(node_id: &str, node_type: &str, endpoint: &str) -> Self {
        Self {
            node_id: node_id.to_string(),
            node_type: node_type.to_string(),
            endpoint: endpoint.to_string(),
            active: true,
            registered_at: now(),
        }
    }
}

/// Directory of participant nodes.
#[async_trait]
pub trait NodeRegistry: Send + Sync {
    /// Look up a node by ID.
    async fn get(&self, node_id: &str) -> Result<Option<NodeEntry>>;

    /// Number of registered nodes (quorum denominator).
    async fn registered_count(&self) -> Result<usize>;
}

/// In-memory node registry.
pub struct InMemoryNodeRegistry {
    nodes: RwLock<HashMap<String, NodeEntry>>,
}

impl InMemoryNodeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            nodes: RwLock::new(HashMap::new()),
        }
    }

    /// Register or replace a node.
    pub fn register(&self, entry: NodeEntry) {
        self.nodes
            .write()
            .unwrap()
            .insert(entry.node_id.clone(), entry);
    }

    /// Mark a node inactive; broadcasts will skip it.
    pub fn deactivate(&self, node_id: &str) {
        if let Some(entry) = self
            .nodes
            .write()
            .unwrap()
            .get_mut(node_id)
        {
            entry.active = false;
        }
    }
}

impl Default for InMemoryNodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NodeRegistry for InMemoryNodeRegistry {
    async fn get(&self, node_id: &str) -> Result<Option<NodeEntry>> {
        Ok(self
            .nodes
            .read()
            .unwrap()
            .get(node_id)
            .cloned())
    }

    async fn registered_count(&self) -> Result<usize> {
        Ok(self.nodes.read().unwrap().len())
    }
}

/// Signing material for a node.
#[derive(Clone, Debug)]
pub struct NodeCredential {
    /// Node ID
    pub node_id: String,
    /// Identifier of the active secret (rotated out-of-band)
    pub key_id: String,
    /// Node-scoped HMAC secret
    pub secret: Vec<u8>,
}

/// Source of per-node secrets and the issuer public key.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up a node's signing credential.
    async fn credential(&self, node_id: &str) -> Result<Option<NodeCredential>>;

    /// Public key used to verify bearer tokens.
    async fn issuer_key(&self) -> Result<VerifyingKey>;
}

/// In-memory credential store.
pub struct InMemoryCredentialStore {
    credentials: RwLock<HashMap<String, NodeCredential>>,
    issuer_key: VerifyingKey,
}

impl InMemoryCredentialStore {
    /// Create a store trusting the given issuer key.
    pub fn new(issuer_key: VerifyingKey) -> Self {
        Self {
            credentials: RwLock::new(HashMap::new()),
            issuer_key,
        }
    }

    /// Install a node credential.
    pub fn insert(&self, credential: NodeCredential) {
        self.credentials
            .write()
            .unwrap()
            .insert(credential.node_id.clone(), credential);
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn credential(&self, node_id: &str) -> Result<Option<NodeCredential>> {
        Ok(self
            .credentials
            .read()
            .unwrap()
            .get(node_id)
            .cloned())
    }

    async fn issuer_key(&self) -> Result<VerifyingKey> {
        Ok(self.issuer_key)
    }
}

/// Fetch a credential or fail with an authentication error.
pub async fn require_credential(
    store: &dyn CredentialStore,
    node_id: &str,
) -> Result<NodeCredential> {
    store
        .credential(node_id)
        .await?
        .ok_or_else(|| Error::Authentication(format!("no credential for node {}", node_id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::token::TokenIssuer;

    #[tokio::test]
    async fn test_register_and_lookup() {
        let registry = InMemoryNodeRegistry::new();
        registry.register(NodeEntry::new("node-a", "worker", "http://a.local/sync"));

        let entry = registry.get("node-a").await.unwrap().unwrap();
        assert!(entry.active);
        assert_eq!(registry.registered_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_deactivate() {
        let registry = InMemoryNodeRegistry::new();
        registry.register(NodeEntry::new("node-a", "worker", "http://a.local/sync"));
        registry.deactivate("node-a");

        let entry = registry.get("node-a").await.unwrap().unwrap();
        assert!(!entry.active);
        // still counted as registered
        assert_eq!(registry.registered_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_credential_lookup() {
        let issuer = TokenIssuer::generate("accord-ca");
        let store = InMemoryCredentialStore::new(issuer.verifying_key());
        store.insert(NodeCredential {
            node_id: "node-a".to_string(),
            key_id: "k1".to_string(),
            secret: b"secret".to_vec(),
        });

        let cred = require_credential(&store, "node-a").await.unwrap();
        assert_eq!(cred.key_id, "k1");

        let err = require_credential(&store, "node-x").await.unwrap_err();
        assert_eq!(err.classification(), "authentication_error");
    }
}
