//! Local Wallet Connector
//!
//! Signs challenges in-process through a [`ChallengeSigner`]: either a
//! private key parsed at construction or a capability the caller injected.
//! No I/O beyond the signing primitive itself.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::challenge::{
    detect_message_encoding, encoding::decode_hex_message, normalize_challenge, signable_message,
    typed_data_payload, NormalizeOptions,
};
use crate::connector::extract::canonicalize_address;
use crate::connector::WalletConnector;
use crate::error::WalletError;
use crate::signer::{ChallengeSigner, PrivateKeyChallengeSigner};
use crate::types::{
    LocalWalletConfig, NormalizedChallenge, Signature, SigningScheme, WalletKind, WalletMetadata,
};

/// In-process wallet backend.
pub struct LocalWalletConnector {
    signer: Arc<dyn ChallengeSigner>,
    config: LocalWalletConfig,
    normalize_options: NormalizeOptions,
}

impl std::fmt::Debug for LocalWalletConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The config's own Debug already redacts key material.
        f.debug_struct("LocalWalletConnector")
            .field("config", &self.config)
            .field("normalize_options", &self.normalize_options)
            .finish()
    }
}

impl LocalWalletConnector {
    /// Build a local connector from its options.
    ///
    /// Exactly one of `private_key` / `signer` must be set. A raw key is
    /// wrapped in [`PrivateKeyChallengeSigner`] here and the plaintext hex
    /// is dropped with the config copy -- only the parsed key survives.
    pub fn new(mut config: LocalWalletConfig) -> Result<Self, WalletError> {
        let signer: Arc<dyn ChallengeSigner> = match (config.private_key.take(), config.signer.take())
        {
            (Some(_), Some(_)) => {
                return Err(WalletError::InvalidWalletConfig(
                    "local wallet takes a private key or a signer, not both".to_string(),
                ))
            }
            (Some(key), None) => Arc::new(PrivateKeyChallengeSigner::new(&key)?),
            (None, Some(signer)) => signer,
            (None, None) => {
                return Err(WalletError::InvalidWalletConfig(
                    "local wallet needs a private key or a signer".to_string(),
                ))
            }
        };

        Ok(Self {
            signer,
            config,
            normalize_options: NormalizeOptions::default(),
        })
    }

    /// Override the normalization clock/grace, mainly for tests.
    pub fn with_normalize_options(mut self, options: NormalizeOptions) -> Self {
        self.normalize_options = options;
        self
    }

    async fn sign_normalized(
        &self,
        challenge: &NormalizedChallenge,
    ) -> Result<Signature, WalletError> {
        let scheme = detect_message_encoding(challenge);
        debug!(challenge_id = %challenge.id, %scheme, "signing challenge locally");

        let signature = match scheme {
            SigningScheme::PlainText => {
                let message = signable_message(challenge);
                self.signer.sign_message(message.as_bytes()).await?
            }
            SigningScheme::HexBytes => {
                let message = signable_message(challenge);
                let bytes = decode_hex_message(&message).map_err(|e| {
                    WalletError::MalformedChallenge(format!("hex payload did not decode: {}", e))
                })?;
                self.signer.sign_message(&bytes).await?
            }
            SigningScheme::StructuredTypedData => {
                if !self.signer.supports_typed_data() {
                    // Never fall back to plain-text here: that would sign
                    // a different message than the issuer's challenge.
                    return Err(WalletError::UnsupportedSigningScheme(scheme));
                }
                let payload = typed_data_payload(challenge).ok_or_else(|| {
                    WalletError::MalformedChallenge(
                        "typed data scheme without a typed data payload".to_string(),
                    )
                })?;
                self.signer.sign_typed_data(&payload).await?
            }
        };

        // Only the signer's own capability may name the signature's
        // address. Configured metadata is identity decoration, not proof
        // of which key signed; it never leaks into the result here.
        Ok(Signature {
            signature,
            scheme,
            address: self.signer.address().await,
        })
    }
}

#[async_trait]
impl WalletConnector for LocalWalletConnector {
    fn kind(&self) -> WalletKind {
        WalletKind::Local
    }

    async fn sign(&self, raw: &Value) -> Result<Signature, WalletError> {
        let challenge = normalize_challenge(raw, Some(&self.normalize_options))?;
        self.sign_normalized(&challenge).await
    }

    async fn metadata(&self) -> Result<WalletMetadata, WalletError> {
        let address = match &self.config.address {
            Some(configured) => configured.clone(),
            None => self.signer.address().await.ok_or_else(|| {
                WalletError::InvalidWalletConfig(
                    "local wallet has no address: configure one or use a signer that reports it"
                        .to_string(),
                )
            })?,
        };

        Ok(WalletMetadata {
            address: canonicalize_address(&address),
            caip2: self.config.caip2.clone(),
            chain: self.config.chain.clone(),
            chain_type: self.config.chain_type.clone(),
            provider: self.config.provider.clone(),
            label: self.config.label.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const DEV_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    /// Message-only signer used to prove typed-data is never silently
    /// downgraded.
    struct MessageOnlySigner;

    #[async_trait]
    impl ChallengeSigner for MessageOnlySigner {
        async fn sign_message(&self, message: &[u8]) -> Result<String, WalletError> {
            Ok(format!("0x{}", hex::encode(message)))
        }
    }

    fn frozen_options() -> NormalizeOptions {
        NormalizeOptions {
            now: Some("2024-01-01T00:01:00Z".parse().unwrap()),
            ..Default::default()
        }
    }

    fn key_connector() -> LocalWalletConnector {
        LocalWalletConnector::new(LocalWalletConfig {
            private_key: Some(DEV_KEY.to_string()),
            ..Default::default()
        })
        .unwrap()
        .with_normalize_options(frozen_options())
    }

    fn raw_challenge(payload: Value) -> Value {
        json!({
            "id": "c1",
            "nonce": "n1",
            "issued_at": "2024-01-01T00:00:00Z",
            "expires_at": "2024-01-01T00:05:00Z",
            "payload": payload,
        })
    }

    #[test]
    fn test_rejects_empty_and_ambiguous_configs() {
        let err = LocalWalletConnector::new(LocalWalletConfig::default()).unwrap_err();
        assert!(matches!(err, WalletError::InvalidWalletConfig(_)));

        let err = LocalWalletConnector::new(LocalWalletConfig {
            private_key: Some(DEV_KEY.to_string()),
            signer: Some(Arc::new(MessageOnlySigner)),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, WalletError::InvalidWalletConfig(_)));
    }

    #[tokio::test]
    async fn test_plain_text_signing_fills_derived_address() {
        let connector = key_connector();
        let signature = connector
            .sign(&raw_challenge(json!("prove wallet control")))
            .await
            .unwrap();
        assert_eq!(signature.scheme, SigningScheme::PlainText);
        assert_eq!(signature.address.as_deref(), Some(DEV_ADDRESS));
        assert!(signature.signature.starts_with("0x"));

        // Fixed key over a fixed challenge is deterministic.
        let again = connector
            .sign(&raw_challenge(json!("prove wallet control")))
            .await
            .unwrap();
        assert_eq!(signature, again);
    }

    #[tokio::test]
    async fn test_hex_payload_signs_decoded_bytes() {
        let connector = LocalWalletConnector::new(LocalWalletConfig {
            signer: Some(Arc::new(MessageOnlySigner)),
            ..Default::default()
        })
        .unwrap()
        .with_normalize_options(frozen_options());

        let signature = connector
            .sign(&raw_challenge(json!("0x48656c6c6f")))
            .await
            .unwrap();
        assert_eq!(signature.scheme, SigningScheme::HexBytes);
        // MessageOnlySigner echoes its input: decoded bytes, not hex text.
        assert_eq!(signature.signature, format!("0x{}", hex::encode(b"Hello")));
        // Signer reports no address and none is configured.
        assert!(signature.address.is_none());
    }

    #[tokio::test]
    async fn test_signature_address_absent_without_signer_capability() {
        // A configured metadata address names a wallet, not the key that
        // produced this signature; it must not surface here.
        let connector = LocalWalletConnector::new(LocalWalletConfig {
            signer: Some(Arc::new(MessageOnlySigner)),
            address: Some("0x000000000000000000000000000000000000dead".to_string()),
            ..Default::default()
        })
        .unwrap()
        .with_normalize_options(frozen_options());

        let signature = connector
            .sign(&raw_challenge(json!("prove wallet control")))
            .await
            .unwrap();
        assert!(signature.address.is_none());

        // The configured address still backs metadata().
        let metadata = connector.metadata().await.unwrap();
        assert_eq!(metadata.address, "0x000000000000000000000000000000000000dead");
    }

    #[tokio::test]
    async fn test_typed_data_without_capability_fails_closed() {
        let connector = LocalWalletConnector::new(LocalWalletConfig {
            signer: Some(Arc::new(MessageOnlySigner)),
            ..Default::default()
        })
        .unwrap()
        .with_normalize_options(frozen_options());

        let typed = raw_challenge(json!({
            "domain": { "name": "AgentChallenge", "chainId": 8453 },
            "primaryType": "Challenge",
            "types": { "Challenge": [{ "name": "id", "type": "string" }] },
            "message": { "id": "c1" },
        }));
        let err = connector.sign(&typed).await.unwrap_err();
        assert!(matches!(
            err,
            WalletError::UnsupportedSigningScheme(SigningScheme::StructuredTypedData)
        ));
    }

    #[tokio::test]
    async fn test_typed_data_with_private_key_signer() {
        let connector = key_connector();
        let typed = raw_challenge(json!({
            "domain": { "name": "AgentChallenge", "version": "1", "chainId": 8453 },
            "primaryType": "Challenge",
            "types": {
                "Challenge": [
                    { "name": "id", "type": "string" },
                    { "name": "nonce", "type": "string" },
                ],
            },
            "message": { "id": "c1", "nonce": "n1" },
        }));
        let signature = connector.sign(&typed).await.unwrap();
        assert_eq!(signature.scheme, SigningScheme::StructuredTypedData);
        assert_eq!(signature.address.as_deref(), Some(DEV_ADDRESS));
    }

    #[tokio::test]
    async fn test_expired_challenge_never_reaches_signer() {
        let connector = key_connector().with_normalize_options(NormalizeOptions {
            now: Some("2024-01-01T00:10:00Z".parse().unwrap()),
            ..Default::default()
        });
        let err = connector
            .sign(&raw_challenge(json!("too late")))
            .await
            .unwrap_err();
        assert!(matches!(err, WalletError::ExpiredChallenge { .. }));
    }

    #[tokio::test]
    async fn test_metadata_prefers_configured_address() {
        let connector = LocalWalletConnector::new(LocalWalletConfig {
            private_key: Some(DEV_KEY.to_string()),
            address: Some("0x000000000000000000000000000000000000dead".to_string()),
            caip2: Some("eip155:8453".to_string()),
            label: Some("agent treasury".to_string()),
            ..Default::default()
        })
        .unwrap();

        let metadata = connector.metadata().await.unwrap();
        assert_eq!(metadata.address, "0x000000000000000000000000000000000000dead");
        assert_eq!(metadata.caip2.as_deref(), Some("eip155:8453"));
        assert_eq!(metadata.label.as_deref(), Some("agent treasury"));

        // Metadata addresses are folded to the canonical lowercase form.
        let derived = key_connector().metadata().await.unwrap();
        assert_eq!(derived.address, DEV_ADDRESS.to_ascii_lowercase());
    }
}
