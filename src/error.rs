//! Wallet Error Taxonomy
//!
//! Every failure in the signing pipeline maps to exactly one variant here,
//! so callers can branch on recoverability instead of string-matching.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::types::SigningScheme;

/// Errors from challenge normalization, connector construction, and signing.
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    /// The raw challenge is missing a required field (`id` or `nonce`)
    /// or is not an object in any recognized shape.
    #[error("malformed challenge: {0}")]
    MalformedChallenge(String),

    /// The challenge expired before normalization. Never forwarded to a
    /// connector.
    #[error("challenge expired at {expires_at}")]
    ExpiredChallenge { expires_at: DateTime<Utc> },

    /// `issued_at` or `expires_at` could not be parsed, or the interval
    /// between them is empty or inverted.
    #[error("invalid challenge timestamp: {0}")]
    InvalidTimestamp(String),

    /// The detected signing scheme needs a capability the active signer
    /// does not implement. Falling back to a different scheme would sign a
    /// different message than the issuer's challenge, so this is fatal for
    /// the attempt.
    #[error("signer does not support {0} signing")]
    UnsupportedSigningScheme(SigningScheme),

    /// The orchestrator connector was asked to sign without an access
    /// token. Recoverable: supply a token and retry.
    #[error("no access token available for orchestrator signing")]
    MissingAccessToken,

    /// The network call to the remote signing authority failed. Retry
    /// policy is the caller's.
    #[error("orchestrator transport error: {0}")]
    Transport(String),

    /// The remote authority answered with a shape no extractor recognizes.
    /// The raw response is attached for diagnosis.
    #[error("unparsable orchestrator response: {reason}")]
    UnparsableResponse { reason: String, raw: Value },

    /// The wallet configuration variant is incomplete or unrecognized.
    /// No connector is constructed.
    #[error("invalid wallet config: {0}")]
    InvalidWalletConfig(String),

    /// The signing primitive itself failed (bad key material, signer
    /// backend error).
    #[error("signing failed: {0}")]
    Signing(String),

    /// The caller's deadline elapsed before the signing attempt finished.
    #[error("signing cancelled")]
    Cancelled,
}

impl WalletError {
    /// Whether the caller can reasonably retry after fixing a precondition
    /// (supplying a token) or waiting out a transient transport failure.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WalletError::MissingAccessToken | WalletError::Transport(_) | WalletError::Cancelled
        )
    }
}
