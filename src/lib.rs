//! Agent Wallet -- Challenge Signing Core
//!
//! Lets an autonomous agent prove control of a wallet to counterparties
//! that issue nonce-bearing challenges. Raw challenges arrive in whatever
//! shape an issuer produces; this crate folds them into one canonical
//! form, picks the signing scheme, dispatches to a local or remote
//! backend, and returns one canonical signature shape regardless of
//! backend.

pub mod canonical;
pub mod challenge;
pub mod connector;
pub mod env;
pub mod error;
pub mod signer;
pub mod types;
pub mod wallet;

pub use canonical::stable_json_stringify;
pub use challenge::{detect_message_encoding, normalize_challenge, NormalizeOptions};
pub use connector::{
    extract::{extract_signature, extract_wallet_metadata},
    LocalWalletConnector, OrchestratorWalletConnector, WalletConnector,
};
pub use error::WalletError;
pub use signer::{ChallengeSigner, PrivateKeyChallengeSigner};
pub use types::{
    AgentWalletConfig, LocalWalletConfig, NormalizedChallenge, OrchestratorWalletConfig,
    Signature, SigningScheme, TypedDataPayload, WalletKind, WalletMetadata, WalletsConfig,
};
pub use wallet::{create_agent_wallet, create_wallets_runtime, AgentWalletHandle, WalletsRuntime};
