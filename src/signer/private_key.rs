//! Private Key Challenge Signer
//!
//! Wraps an `alloy` secp256k1 private key behind the [`ChallengeSigner`]
//! capability. The key is parsed once at construction and lives only as
//! long as the signer value; it is never logged or re-exported.

use alloy::dyn_abi::TypedData;
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer;
use async_trait::async_trait;
use serde_json::json;

use crate::error::WalletError;
use crate::signer::ChallengeSigner;
use crate::types::TypedDataPayload;

/// In-process signer backed by a raw secp256k1 private key.
pub struct PrivateKeyChallengeSigner {
    inner: PrivateKeySigner,
}

impl std::fmt::Debug for PrivateKeyChallengeSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Only the derived address; key material stays out of Debug output.
        f.debug_struct("PrivateKeyChallengeSigner")
            .field("address", &self.inner.address())
            .finish()
    }
}

impl PrivateKeyChallengeSigner {
    /// Parse a hex-encoded private key (with or without `0x` prefix).
    ///
    /// A key that does not parse to a valid secp256k1 scalar is a
    /// configuration error, reported as [`WalletError::InvalidWalletConfig`]
    /// without echoing any key material.
    pub fn new(private_key: &str) -> Result<Self, WalletError> {
        let inner: PrivateKeySigner = private_key.trim().parse().map_err(|_| {
            WalletError::InvalidWalletConfig("private key is not valid secp256k1 hex".to_string())
        })?;
        Ok(Self { inner })
    }

    /// The checksummed address derived from the held key.
    pub fn checksummed_address(&self) -> String {
        self.inner.address().to_checksum(None)
    }
}

#[async_trait]
impl ChallengeSigner for PrivateKeyChallengeSigner {
    async fn sign_message(&self, message: &[u8]) -> Result<String, WalletError> {
        let signature = self
            .inner
            .sign_message(message)
            .await
            .map_err(|e| WalletError::Signing(e.to_string()))?;
        Ok(format!("0x{}", hex::encode(signature.as_bytes())))
    }

    fn supports_typed_data(&self) -> bool {
        true
    }

    async fn sign_typed_data(&self, payload: &TypedDataPayload) -> Result<String, WalletError> {
        // Reassemble the standard EIP-712 JSON envelope so alloy can
        // resolve the type graph and compute the domain-separated digest.
        let envelope = json!({
            "domain": payload.domain,
            "primaryType": payload.primary_type,
            "types": payload.types,
            "message": payload.message,
        });

        let typed_data: TypedData = serde_json::from_value(envelope)
            .map_err(|e| WalletError::Signing(format!("invalid typed data payload: {}", e)))?;

        let digest = typed_data
            .eip712_signing_hash()
            .map_err(|e| WalletError::Signing(format!("typed data hashing failed: {}", e)))?;

        let signature = self
            .inner
            .sign_hash(&digest)
            .await
            .map_err(|e| WalletError::Signing(e.to_string()))?;

        Ok(format!("0x{}", hex::encode(signature.as_bytes())))
    }

    async fn address(&self) -> Option<String> {
        Some(self.checksummed_address())
    }
}
