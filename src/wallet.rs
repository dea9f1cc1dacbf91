//! Agent Wallet Facade
//!
//! One dispatch point from tagged configuration to a live connector, plus
//! the handle callers hold for the connector's lifetime. Connectors are
//! constructed once and reused across many challenges.

use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use crate::connector::{
    LocalWalletConnector, OrchestratorWalletConnector, WalletConnector,
};
use crate::error::WalletError;
use crate::types::{
    AgentWalletConfig, Signature, WalletKind, WalletMetadata, WalletsConfig,
};

/// Long-lived handle over a constructed wallet connector.
pub struct AgentWalletHandle {
    kind: WalletKind,
    connector: Arc<dyn WalletConnector>,
    // Kept concretely so token updates can reach the orchestrator variant.
    orchestrator: Option<Arc<OrchestratorWalletConnector>>,
}

impl std::fmt::Debug for AgentWalletHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentWalletHandle")
            .field("kind", &self.kind)
            .finish()
    }
}

impl AgentWalletHandle {
    /// Which configuration variant backs this wallet.
    pub fn kind(&self) -> WalletKind {
        self.kind
    }

    /// Normalize and sign a raw issuer challenge.
    pub async fn sign(&self, raw: &Value) -> Result<Signature, WalletError> {
        self.connector.sign(raw).await
    }

    /// Sign with a caller-imposed deadline.
    ///
    /// Elapsing the deadline cancels the attempt cleanly (no partial state
    /// is retained) and reports [`WalletError::Cancelled`].
    pub async fn sign_with_deadline(
        &self,
        raw: &Value,
        deadline: std::time::Duration,
    ) -> Result<Signature, WalletError> {
        match tokio::time::timeout(deadline, self.connector.sign(raw)).await {
            Ok(result) => result,
            Err(_) => Err(WalletError::Cancelled),
        }
    }

    /// Identity metadata for the wallet behind this handle.
    pub async fn metadata(&self) -> Result<WalletMetadata, WalletError> {
        self.connector.metadata().await
    }

    /// Replace or clear the orchestrator access token.
    ///
    /// Only meaningful for the orchestrator variant; calling it on a local
    /// wallet is a wiring mistake and reported as such.
    pub async fn set_access_token(&self, token: Option<String>) -> Result<(), WalletError> {
        match &self.orchestrator {
            Some(connector) => {
                connector.set_access_token(token).await;
                Ok(())
            }
            None => Err(WalletError::InvalidWalletConfig(
                "access tokens only apply to orchestrator wallets".to_string(),
            )),
        }
    }
}

/// Construct the connector matching a tagged wallet configuration.
///
/// Fails with [`WalletError::InvalidWalletConfig`] for incomplete variants;
/// nothing is partially constructed.
pub fn create_agent_wallet(config: AgentWalletConfig) -> Result<AgentWalletHandle, WalletError> {
    match config {
        AgentWalletConfig::Local(options) => {
            let connector = Arc::new(LocalWalletConnector::new(options)?);
            info!("created local agent wallet");
            Ok(AgentWalletHandle {
                kind: WalletKind::Local,
                connector,
                orchestrator: None,
            })
        }
        AgentWalletConfig::Orchestrator(options) => {
            let connector = Arc::new(OrchestratorWalletConnector::new(options)?);
            info!("created orchestrator agent wallet");
            Ok(AgentWalletHandle {
                kind: WalletKind::Orchestrator,
                connector: connector.clone(),
                orchestrator: Some(connector),
            })
        }
    }
}

/// Wallets available to a running agent deployment.
#[derive(Debug, Default)]
pub struct WalletsRuntime {
    /// The agent's own wallet.
    pub agent: Option<AgentWalletHandle>,
    /// The developer's wallet, when configured alongside the agent's.
    pub developer: Option<AgentWalletHandle>,
}

/// Build every wallet named in a [`WalletsConfig`].
///
/// An empty or absent config yields an empty runtime; a present but
/// invalid entry fails the whole construction rather than dropping the
/// broken wallet silently.
pub fn create_wallets_runtime(
    config: Option<WalletsConfig>,
) -> Result<WalletsRuntime, WalletError> {
    let config = config.unwrap_or_default();

    Ok(WalletsRuntime {
        agent: config.agent.map(create_agent_wallet).transpose()?,
        developer: config.developer.map(create_agent_wallet).transpose()?,
    })
}
