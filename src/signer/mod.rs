//! Challenge Signer Capability
//!
//! The seam between connectors and concrete key material. A connector only
//! ever talks to a [`ChallengeSigner`]; whether that is a locally parsed
//! private key or something caller-supplied (hardware wallet bridge, KMS
//! client) is invisible to the signing pipeline.

pub mod private_key;

pub use private_key::PrivateKeyChallengeSigner;

use async_trait::async_trait;

use crate::error::WalletError;
use crate::types::{SigningScheme, TypedDataPayload};

/// Signing capability over a single wallet identity.
///
/// `sign_message` is mandatory; typed-data signing and address reporting
/// are optional capabilities with conservative defaults. A signer that
/// cannot do typed data must say so rather than signing something else --
/// the default returns [`WalletError::UnsupportedSigningScheme`].
#[async_trait]
pub trait ChallengeSigner: Send + Sync {
    /// Sign raw message bytes (EIP-191 style for EVM signers) and return
    /// the hex signature string.
    async fn sign_message(&self, message: &[u8]) -> Result<String, WalletError>;

    /// Whether this signer implements [`ChallengeSigner::sign_typed_data`].
    fn supports_typed_data(&self) -> bool {
        false
    }

    /// Sign an EIP-712 typed-data payload.
    async fn sign_typed_data(&self, _payload: &TypedDataPayload) -> Result<String, WalletError> {
        Err(WalletError::UnsupportedSigningScheme(
            SigningScheme::StructuredTypedData,
        ))
    }

    /// The signer's address, when it can report one.
    async fn address(&self) -> Option<String> {
        None
    }
}
