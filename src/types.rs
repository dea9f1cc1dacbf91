//! Agent Wallet - Type Definitions
//!
//! Canonical data model shared across the signing pipeline: normalized
//! challenges, signing schemes, signature results, wallet metadata, and the
//! tagged wallet configuration variants.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::signer::ChallengeSigner;

// ─── Challenges ──────────────────────────────────────────────────

/// Canonical form of an issuer challenge.
///
/// Built once by [`normalize_challenge`](crate::challenge::normalize_challenge),
/// immutable afterwards, and discarded when the signing attempt terminates.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedChallenge {
    /// Unique per issued challenge, non-empty.
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_id: Option<String>,
    /// Single-use replay guard, non-empty.
    pub nonce: String,
    /// Issuer payload, passed through untouched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    /// Issuer-supplied hash, or derived from the canonical payload text
    /// when the issuer omitted it. Absent when there is no payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scopes: Vec<String>,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Issuer's own signature over the challenge, opaque to this crate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_signature: Option<String>,
}

/// How a normalized challenge's message is encoded for signing.
///
/// Chosen once per challenge by
/// [`detect_message_encoding`](crate::challenge::detect_message_encoding)
/// and never re-derived downstream.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum SigningScheme {
    /// UTF-8 text signed as-is (EIP-191 personal message).
    #[serde(rename = "plain_text")]
    PlainText,
    /// Even-length hex string decoded to raw bytes before signing.
    #[serde(rename = "hex_bytes")]
    HexBytes,
    /// Domain-separated structured record (EIP-712 typed data).
    #[serde(rename = "typed_data")]
    StructuredTypedData,
}

impl fmt::Display for SigningScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PlainText => write!(f, "plain text"),
            Self::HexBytes => write!(f, "hex bytes"),
            Self::StructuredTypedData => write!(f, "typed data"),
        }
    }
}

/// EIP-712 typed-data payload as issuers tag it on a challenge.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TypedDataPayload {
    pub domain: Value,
    pub primary_type: String,
    pub types: Value,
    pub message: Value,
}

// ─── Signing results ─────────────────────────────────────────────

/// Canonical signing result, identical in shape for every connector.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Signature {
    /// Hex signature string, `0x`-prefixed for EVM signers.
    pub signature: String,
    pub scheme: SigningScheme,
    /// Signer address when derivable. Local signing always fills it from
    /// the key; remote signing reports whatever the authority returned,
    /// unmodified.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Identity metadata for the wallet behind a connector.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WalletMetadata {
    pub address: String,
    /// CAIP-2 chain identifier, e.g. `eip155:8453`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caip2: Option<String>,
    /// Human-readable chain name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

// ─── Wallet configuration ────────────────────────────────────────

/// Which connector variant backs a wallet handle.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WalletKind {
    Local,
    Orchestrator,
}

/// Local wallet options: a raw private key or an injected signer, plus
/// optional identity metadata.
///
/// Exactly one of `private_key` / `signer` must be set; the factory
/// rejects everything else.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalWalletConfig {
    /// Hex-encoded secp256k1 key, with or without `0x` prefix. Held only
    /// for the lifetime of the connector, never logged.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
    /// Caller-supplied signer capability. Not part of the serialized form.
    #[serde(skip)]
    pub signer: Option<Arc<dyn ChallengeSigner>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caip2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl fmt::Debug for LocalWalletConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalWalletConfig")
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("signer", &self.signer.as_ref().map(|_| "<injected>"))
            .field("address", &self.address)
            .field("caip2", &self.caip2)
            .field("chain", &self.chain)
            .field("chain_type", &self.chain_type)
            .field("provider", &self.provider)
            .field("label", &self.label)
            .finish()
    }
}

/// Remote orchestrator wallet options.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestratorWalletConfig {
    pub base_url: String,
    /// Agent identifier or slug within the orchestrator.
    pub agent_ref: String,
    /// Bearer token; may also be supplied later via the wallet handle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Free-form context forwarded with every signing request (payment or
    /// identity extensions).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_context: Option<Map<String, Value>>,
    /// Extra headers for every request to the orchestrator.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,
}

impl fmt::Debug for OrchestratorWalletConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrchestratorWalletConfig")
            .field("base_url", &self.base_url)
            .field("agent_ref", &self.agent_ref)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("authorization_context", &self.authorization_context)
            .field("headers", &self.headers)
            .finish()
    }
}

/// Tagged wallet configuration. Exactly one variant is active per
/// connector instance and the variant is immutable for its lifetime.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentWalletConfig {
    Local(LocalWalletConfig),
    /// Remote signing authority. Accepts the historical `remote` tag too.
    #[serde(alias = "remote")]
    Orchestrator(OrchestratorWalletConfig),
}

/// Wallet configuration for a whole agent deployment: the agent's own
/// wallet plus an optional developer wallet.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<AgentWalletConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub developer: Option<AgentWalletConfig>,
}
