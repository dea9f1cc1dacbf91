//! Wallet Configuration From Environment
//!
//! Adapter that assembles a [`WalletsConfig`] from process environment
//! variables. This lives outside the signing core on purpose: the core
//! only ever accepts fully-resolved configuration values and never reads
//! ambient process state itself.

use std::env;

use crate::error::WalletError;
use crate::types::{
    AgentWalletConfig, LocalWalletConfig, OrchestratorWalletConfig, WalletsConfig,
};

/// Assemble wallet configuration from the environment.
///
/// Recognized variables, per wallet prefix (`AGENT_WALLET` for the agent,
/// `DEVELOPER_WALLET` for the developer wallet):
///
/// - `{PREFIX}_PRIVATE_KEY` -- selects the local variant
/// - `{PREFIX}_ORCHESTRATOR_URL` + `{PREFIX}_ORCHESTRATOR_AGENT_REF`
///   (+ optional `{PREFIX}_ORCHESTRATOR_ACCESS_TOKEN`) -- selects the
///   orchestrator variant
/// - `{PREFIX}_ADDRESS`, `{PREFIX}_CAIP2`, `{PREFIX}_CHAIN`,
///   `{PREFIX}_CHAIN_TYPE`, `{PREFIX}_PROVIDER`, `{PREFIX}_LABEL` --
///   optional metadata for the local variant
///
/// A prefix with no variables set yields no wallet. Setting both variants,
/// or half of the orchestrator pair, is a configuration error.
pub fn wallets_from_env() -> Result<WalletsConfig, WalletError> {
    Ok(WalletsConfig {
        agent: wallet_from_prefix("AGENT_WALLET")?,
        developer: wallet_from_prefix("DEVELOPER_WALLET")?,
    })
}

fn wallet_from_prefix(prefix: &str) -> Result<Option<AgentWalletConfig>, WalletError> {
    let private_key = var(prefix, "PRIVATE_KEY");
    let orchestrator_url = var(prefix, "ORCHESTRATOR_URL");
    let agent_ref = var(prefix, "ORCHESTRATOR_AGENT_REF");

    match (&private_key, &orchestrator_url) {
        (Some(_), Some(_)) => {
            return Err(WalletError::InvalidWalletConfig(format!(
                "{0}_PRIVATE_KEY and {0}_ORCHESTRATOR_URL are mutually exclusive",
                prefix
            )))
        }
        (None, Some(_)) if agent_ref.is_none() => {
            return Err(WalletError::InvalidWalletConfig(format!(
                "{0}_ORCHESTRATOR_URL requires {0}_ORCHESTRATOR_AGENT_REF",
                prefix
            )))
        }
        _ => {}
    }

    if let Some(base_url) = orchestrator_url {
        return Ok(Some(AgentWalletConfig::Orchestrator(
            OrchestratorWalletConfig {
                base_url,
                // Checked above.
                agent_ref: agent_ref.unwrap_or_default(),
                access_token: var(prefix, "ORCHESTRATOR_ACCESS_TOKEN"),
                authorization_context: None,
                headers: None,
            },
        )));
    }

    if private_key.is_some() {
        return Ok(Some(AgentWalletConfig::Local(LocalWalletConfig {
            private_key,
            signer: None,
            address: var(prefix, "ADDRESS"),
            caip2: var(prefix, "CAIP2"),
            chain: var(prefix, "CHAIN"),
            chain_type: var(prefix, "CHAIN_TYPE"),
            provider: var(prefix, "PROVIDER"),
            label: var(prefix, "LABEL"),
        })));
    }

    Ok(None)
}

/// Read `{prefix}_{name}`, treating empty values as unset.
fn var(prefix: &str, name: &str) -> Option<String> {
    env::var(format!("{}_{}", prefix, name))
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
