//! Orchestrator Wallet Connector
//!
//! Delegates signing to a remote authority that custodies the agent's
//! wallet. Every signing call is one authenticated POST; the connector
//! performs no retries and owns no retry policy -- it surfaces typed
//! failures and lets the caller decide.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::challenge::{detect_message_encoding, normalize_challenge, NormalizeOptions};
use crate::connector::extract::{extract_signature, extract_wallet_metadata};
use crate::connector::WalletConnector;
use crate::error::WalletError;
use crate::types::{
    NormalizedChallenge, OrchestratorWalletConfig, Signature, WalletKind, WalletMetadata,
};

/// Remote signing backend reached over an authenticated HTTP call.
pub struct OrchestratorWalletConnector {
    base_url: String,
    agent_ref: String,
    /// Bearer token, mutable between calls. Each call clones the value at
    /// entry; a concurrent update never affects an in-flight request.
    access_token: RwLock<Option<String>>,
    authorization_context: Option<Map<String, Value>>,
    extra_headers: HashMap<String, String>,
    http: Client,
    normalize_options: NormalizeOptions,
}

impl std::fmt::Debug for OrchestratorWalletConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrchestratorWalletConnector")
            .field("base_url", &self.base_url)
            .field("agent_ref", &self.agent_ref)
            // Bearer tokens never reach Debug output.
            .field("access_token", &"<redacted>")
            .finish()
    }
}

impl OrchestratorWalletConnector {
    /// Build an orchestrator connector from its options.
    pub fn new(config: OrchestratorWalletConfig) -> Result<Self, WalletError> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(WalletError::InvalidWalletConfig(
                "orchestrator wallet needs a base url".to_string(),
            ));
        }
        let agent_ref = config.agent_ref.trim().to_string();
        if agent_ref.is_empty() {
            return Err(WalletError::InvalidWalletConfig(
                "orchestrator wallet needs an agent ref".to_string(),
            ));
        }

        Ok(Self {
            base_url,
            agent_ref,
            access_token: RwLock::new(config.access_token.filter(|t| !t.is_empty())),
            authorization_context: config.authorization_context,
            extra_headers: config.headers.unwrap_or_default(),
            http: Client::new(),
            normalize_options: NormalizeOptions::default(),
        })
    }

    /// Override the normalization clock/grace, mainly for tests.
    pub fn with_normalize_options(mut self, options: NormalizeOptions) -> Self {
        self.normalize_options = options;
        self
    }

    /// Replace or clear the access token used by subsequent calls.
    pub async fn set_access_token(&self, token: Option<String>) {
        *self.access_token.write().await = token.filter(|t| !t.is_empty());
    }

    /// The token for one call, captured once at entry.
    async fn current_token(&self) -> Result<String, WalletError> {
        self.access_token
            .read()
            .await
            .clone()
            .ok_or(WalletError::MissingAccessToken)
    }

    /// Authenticated request to an orchestrator endpoint; JSON in, JSON out.
    async fn request(
        &self,
        method: reqwest::Method,
        path: &str,
        token: &str,
        body: Option<&Value>,
    ) -> Result<Value, WalletError> {
        let url = format!("{}{}", self.base_url, path);

        let mut builder = self
            .http
            .request(method.clone(), &url)
            .header("Authorization", format!("Bearer {}", token))
            .header("Content-Type", "application/json");

        for (name, value) in &self.extra_headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if let Some(b) = body {
            builder = builder.json(b);
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| WalletError::Transport(format!("{} {}: {}", method, path, e)))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            warn!(%status, path, "orchestrator request failed");
            return Err(WalletError::Transport(format!(
                "{} {} -> {}: {}",
                method,
                path,
                status.as_u16(),
                snippet(&text)
            )));
        }

        let content_type = resp
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if content_type.contains("application/json") {
            resp.json()
                .await
                .map_err(|e| WalletError::Transport(format!("{} {}: {}", method, path, e)))
        } else {
            let text = resp
                .text()
                .await
                .map_err(|e| WalletError::Transport(format!("{} {}: {}", method, path, e)))?;
            Ok(Value::String(text))
        }
    }

    fn sign_request_body(&self, challenge: &NormalizedChallenge) -> Value {
        let mut body = Map::new();
        body.insert(
            "challenge".to_string(),
            serde_json::to_value(challenge).unwrap_or(Value::Null),
        );
        body.insert(
            "encoding".to_string(),
            serde_json::to_value(detect_message_encoding(challenge)).unwrap_or(Value::Null),
        );
        if let Some(context) = &self.authorization_context {
            body.insert(
                "authorizationContext".to_string(),
                Value::Object(context.clone()),
            );
        }
        Value::Object(body)
    }
}

#[async_trait]
impl WalletConnector for OrchestratorWalletConnector {
    fn kind(&self) -> WalletKind {
        WalletKind::Orchestrator
    }

    async fn sign(&self, raw: &Value) -> Result<Signature, WalletError> {
        let challenge = normalize_challenge(raw, Some(&self.normalize_options))?;

        // Precondition before any I/O: a caller without a token gets a
        // retryable, named failure, not a transport error.
        let token = self.current_token().await?;

        debug!(challenge_id = %challenge.id, agent_ref = %self.agent_ref, "delegating challenge signing");

        let path = format!("/agents/{}/challenges/sign", self.agent_ref);
        let body = self.sign_request_body(&challenge);
        let response = self
            .request(reqwest::Method::POST, &path, &token, Some(&body))
            .await?;

        extract_signature(&response)
    }

    async fn metadata(&self) -> Result<WalletMetadata, WalletError> {
        let token = self.current_token().await?;
        let path = format!("/agents/{}/wallet", self.agent_ref);
        let response = self
            .request(reqwest::Method::GET, &path, &token, None)
            .await?;

        extract_wallet_metadata(&response)
    }
}

/// First part of an error body, enough to diagnose without flooding logs.
fn snippet(text: &str) -> &str {
    let end = text
        .char_indices()
        .nth(200)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    &text[..end]
}
