//! sign-challenge -- Demo CLI For The Agent Wallet Core
//!
//! Reads a raw issuer challenge (file or stdin), builds a wallet from the
//! environment, and prints the canonical signature as JSON. Exercises the
//! public surface end to end; not part of the library API.

use std::io::Read;

use anyhow::{bail, Context, Result};
use clap::Parser;

use agent_wallet::{
    create_wallets_runtime, detect_message_encoding, env::wallets_from_env, normalize_challenge,
};

/// Sign an issuer challenge with the wallet configured in the environment.
#[derive(Parser, Debug)]
#[command(
    name = "sign-challenge",
    about = "Sign an agent challenge with an environment-configured wallet"
)]
struct Cli {
    /// Path to a JSON challenge file; reads stdin when omitted
    #[arg(long)]
    challenge: Option<String>,

    /// Inspect the challenge (normalized form + detected scheme) without signing
    #[arg(long)]
    inspect: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();

    let cli = Cli::parse();

    let raw_text = match &cli.challenge {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read challenge file {}", path))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read challenge from stdin")?;
            buf
        }
    };

    let raw: serde_json::Value =
        serde_json::from_str(&raw_text).context("challenge is not valid JSON")?;

    if cli.inspect {
        let challenge = normalize_challenge(&raw, None)?;
        let scheme = detect_message_encoding(&challenge);
        println!(
            "{}",
            serde_json::json!({
                "challenge": challenge,
                "scheme": scheme,
            })
        );
        return Ok(());
    }

    let runtime = create_wallets_runtime(Some(wallets_from_env()?))?;
    let Some(wallet) = runtime.agent else {
        bail!("no agent wallet configured; set AGENT_WALLET_PRIVATE_KEY or AGENT_WALLET_ORCHESTRATOR_URL");
    };

    let signature = wallet.sign(&raw).await?;
    println!("{}", serde_json::to_string_pretty(&signature)?);

    Ok(())
}
