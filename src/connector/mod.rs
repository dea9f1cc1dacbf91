//! Wallet Connectors
//!
//! One capability surface over interchangeable signing backends. A
//! connector owns its configuration for life: the local variant signs
//! in-process with a held key or injected signer, the orchestrator variant
//! delegates to a remote signing authority over an authenticated call.
//! Either way the caller hands in a raw issuer challenge and gets back the
//! canonical [`Signature`].

pub mod extract;
pub mod local;
pub mod orchestrator;

pub use local::LocalWalletConnector;
pub use orchestrator::OrchestratorWalletConnector;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::WalletError;
use crate::types::{Signature, WalletKind, WalletMetadata};

/// Capability set every wallet backend implements.
///
/// Implementations are safe to call concurrently for different challenges;
/// nothing mutable is shared beyond read-only configuration (and the
/// orchestrator's access token, which each call reads once at entry).
#[async_trait]
pub trait WalletConnector: Send + Sync {
    /// Which configuration variant backs this connector.
    fn kind(&self) -> WalletKind;

    /// Normalize `raw` and sign it with this backend.
    ///
    /// Normalization failures surface before any signing or I/O happens;
    /// an expired challenge never reaches the backend.
    async fn sign(&self, raw: &Value) -> Result<Signature, WalletError>;

    /// Identity metadata for the wallet behind this connector.
    async fn metadata(&self) -> Result<WalletMetadata, WalletError>;
}
