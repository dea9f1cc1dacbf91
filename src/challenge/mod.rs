//! Challenge Normalization
//!
//! Issuers send challenges in whatever shape their stack produces: field
//! names vary, timestamps come as RFC 3339 strings or epoch numbers, and
//! some wrap the whole thing in a `challenge` envelope. This module folds
//! all of that into one canonical [`NormalizedChallenge`] and rejects
//! anything expired or malformed before a connector ever sees it.

pub mod encoding;

pub use encoding::{detect_message_encoding, typed_data_payload};

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::{Map, Value};
use tracing::debug;

use crate::canonical::{hash_payload, stable_json_stringify};
use crate::error::WalletError;
use crate::types::NormalizedChallenge;

/// Knobs for [`normalize_challenge`].
#[derive(Clone, Debug)]
pub struct NormalizeOptions {
    /// Fixed clock for tests; defaults to the real time.
    pub now: Option<DateTime<Utc>>,
    /// Allowance for clock skew between issuer and agent before a
    /// challenge counts as expired. Defaults to zero.
    pub expiry_grace: Duration,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            now: None,
            expiry_grace: Duration::zero(),
        }
    }
}

/// Convert a raw issuer challenge into canonical form.
///
/// Fails with [`WalletError::MalformedChallenge`] when `id` or `nonce`
/// cannot be extracted, [`WalletError::InvalidTimestamp`] when the
/// timestamps do not parse or the validity interval is inverted, and
/// [`WalletError::ExpiredChallenge`] when `expires_at` is already in the
/// past. Pure apart from reading the clock.
///
/// `scopes` keeps only string entries; issuers occasionally emit mixed
/// arrays and non-string members carry no scope meaning, so they are
/// dropped rather than rejected.
pub fn normalize_challenge(
    raw: &Value,
    options: Option<&NormalizeOptions>,
) -> Result<NormalizedChallenge, WalletError> {
    let default_options = NormalizeOptions::default();
    let options = options.unwrap_or(&default_options);

    // Some issuers wrap the challenge in a single-field response envelope.
    let obj = match raw.get("challenge") {
        Some(Value::Object(inner)) => inner,
        _ => raw
            .as_object()
            .ok_or_else(|| WalletError::MalformedChallenge("challenge is not a JSON object".to_string()))?,
    };

    let id = string_field(obj, &["id", "challenge_id", "challengeId"])
        .ok_or_else(|| WalletError::MalformedChallenge("missing challenge id".to_string()))?;
    let nonce = string_field(obj, &["nonce"])
        .ok_or_else(|| WalletError::MalformedChallenge("missing challenge nonce".to_string()))?;

    let issued_at = parse_timestamp(obj, &["issued_at", "issuedAt"])?;
    let expires_at = parse_timestamp(obj, &["expires_at", "expiresAt"])?;

    if expires_at <= issued_at {
        return Err(WalletError::InvalidTimestamp(format!(
            "expires_at {} is not after issued_at {}",
            expires_at, issued_at
        )));
    }

    let now = options.now.unwrap_or_else(Utc::now);
    if expires_at + options.expiry_grace <= now {
        debug!(challenge_id = %id, %expires_at, "rejecting expired challenge");
        return Err(WalletError::ExpiredChallenge { expires_at });
    }

    let payload = match obj.get("payload") {
        None | Some(Value::Null) => None,
        Some(value) => Some(value.clone()),
    };

    let payload_hash = string_field(obj, &["payload_hash", "payloadHash"])
        .or_else(|| payload.as_ref().map(hash_payload));

    let scopes: Vec<String> = obj
        .get("scopes")
        .and_then(Value::as_array)
        .map(|items| {
            let kept: Vec<String> = items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect();
            if kept.len() < items.len() {
                debug!(
                    challenge_id = %id,
                    dropped = items.len() - kept.len(),
                    "ignoring non-string scope entries"
                );
            }
            kept
        })
        .unwrap_or_default();

    Ok(NormalizedChallenge {
        id,
        credential_id: string_field(obj, &["credential_id", "credentialId"]),
        nonce,
        payload,
        payload_hash,
        scopes,
        issued_at,
        expires_at,
        server_signature: string_field(obj, &["server_signature", "serverSignature"]),
    })
}

/// The text a plain-text signer should sign for this challenge.
///
/// A string payload is signed verbatim; any other payload is signed as its
/// canonical JSON text. A challenge with no payload signs the canonical
/// serialization of the challenge itself, which keeps the signature bound
/// to the nonce.
pub fn signable_message(challenge: &NormalizedChallenge) -> String {
    match &challenge.payload {
        Some(Value::String(text)) => text.clone(),
        Some(other) => stable_json_stringify(other),
        None => {
            let envelope = serde_json::to_value(challenge).unwrap_or(Value::Null);
            stable_json_stringify(&envelope)
        }
    }
}

// ─── Field extraction helpers ────────────────────────────────────

/// First non-empty string among the candidate field names.
fn string_field(obj: &Map<String, Value>, names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| obj.get(*name))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// Parse a timestamp field that may be an RFC 3339 string or a unix epoch
/// number (seconds, or milliseconds when the magnitude says so).
fn parse_timestamp(
    obj: &Map<String, Value>,
    names: &[&str],
) -> Result<DateTime<Utc>, WalletError> {
    let value = names
        .iter()
        .filter_map(|name| obj.get(*name))
        .find(|v| !v.is_null())
        .ok_or_else(|| WalletError::InvalidTimestamp(format!("missing field {}", names[0])))?;

    match value {
        Value::String(text) => DateTime::parse_from_rfc3339(text)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| WalletError::InvalidTimestamp(format!("{}: {}", names[0], e))),
        Value::Number(num) => {
            let epoch = num.as_i64().ok_or_else(|| {
                WalletError::InvalidTimestamp(format!("{}: non-integer epoch", names[0]))
            })?;
            // Epoch values this large can only be milliseconds.
            let parsed = if epoch.abs() >= 1_000_000_000_000 {
                Utc.timestamp_millis_opt(epoch).single()
            } else {
                Utc.timestamp_opt(epoch, 0).single()
            };
            parsed.ok_or_else(|| {
                WalletError::InvalidTimestamp(format!("{}: epoch out of range", names[0]))
            })
        }
        other => Err(WalletError::InvalidTimestamp(format!(
            "{}: unsupported value {}",
            names[0], other
        ))),
    }
}
