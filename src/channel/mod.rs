//! Secure synchronization channel.
//!
//! Authenticates callers, verifies message integrity, rejects replays, and
//! deduplicates inbound sync messages; signs outbound broadcast deliveries.

pub mod crypto;
pub mod envelope;
pub mod inbound;
pub mod outbound;
pub mod token;

pub use crypto::{payload_checksum, sha3_256, sign_request, verify_request};
pub use envelope::{
    SyncAcknowledgment, SyncDirection, SyncEnvelope, SyncMetadata, SyncRequest, SyncResponse,
    SyncStatus,
};
pub use inbound::{RequestHeaders, SecureChannel, SyncReceipt};
pub use outbound::{OutboundSigner, SignedDelivery};
pub use token::{IdentityToken, TokenClaims, TokenIssuer};
