//! Message Encoding Detection
//!
//! Decides once, per normalized challenge, which signing scheme applies.
//! The policy is ordered: an explicit typed-data tag wins, then hex-looking
//! payloads, then plain text. Ambiguity between hex and plain text resolves
//! to hex; callers needing plain-text semantics for hex-like content must
//! tag the payload as structured or pre-escape it.

use serde_json::Value;

use crate::canonical::stable_json_stringify;
use crate::types::{NormalizedChallenge, SigningScheme, TypedDataPayload};

/// Pick the signing scheme for a normalized challenge.
///
/// Pure and deterministic: the same challenge always yields the same
/// scheme, and the pipeline never re-derives it downstream.
pub fn detect_message_encoding(challenge: &NormalizedChallenge) -> SigningScheme {
    if typed_data_payload(challenge).is_some() {
        return SigningScheme::StructuredTypedData;
    }

    let text = match &challenge.payload {
        Some(Value::String(text)) => text.clone(),
        Some(other) => stable_json_stringify(other),
        None => return SigningScheme::PlainText,
    };

    if is_hex_message(&text) {
        SigningScheme::HexBytes
    } else {
        SigningScheme::PlainText
    }
}

/// Extract the EIP-712 envelope from a payload tagged as typed data.
///
/// A payload counts as typed data only when domain, type descriptors,
/// message, and a primary type are all present.
pub fn typed_data_payload(challenge: &NormalizedChallenge) -> Option<TypedDataPayload> {
    let obj = challenge.payload.as_ref()?.as_object()?;

    let domain = obj.get("domain")?;
    let types = obj.get("types")?;
    let message = obj.get("message")?;
    let primary_type = obj
        .get("primary_type")
        .or_else(|| obj.get("primaryType"))?
        .as_str()?;

    if !domain.is_object() || !types.is_object() || !message.is_object() {
        return None;
    }

    Some(TypedDataPayload {
        domain: domain.clone(),
        primary_type: primary_type.to_string(),
        types: types.clone(),
        message: message.clone(),
    })
}

/// Whether `text` is a non-empty, even-length hex string, with or without
/// a `0x` prefix.
fn is_hex_message(text: &str) -> bool {
    let digits = text.strip_prefix("0x").unwrap_or(text);
    !digits.is_empty() && digits.len() % 2 == 0 && digits.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Decode a hex payload (with or without `0x` prefix) to raw bytes.
pub(crate) fn decode_hex_message(text: &str) -> Result<Vec<u8>, hex::FromHexError> {
    hex::decode(text.strip_prefix("0x").unwrap_or(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono::Utc;
    use serde_json::json;

    fn challenge_with_payload(payload: Option<Value>) -> NormalizedChallenge {
        NormalizedChallenge {
            id: "c1".to_string(),
            credential_id: None,
            nonce: "n1".to_string(),
            payload,
            payload_hash: None,
            scopes: Vec::new(),
            issued_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            expires_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 5, 0).unwrap(),
            server_signature: None,
        }
    }

    #[test]
    fn test_hex_payload_detected() {
        // "Hello" in hex, no explicit tag: resolves to hex by policy.
        let challenge = challenge_with_payload(Some(json!("48656c6c6f")));
        assert_eq!(detect_message_encoding(&challenge), SigningScheme::HexBytes);

        let prefixed = challenge_with_payload(Some(json!("0x48656c6c6f")));
        assert_eq!(detect_message_encoding(&prefixed), SigningScheme::HexBytes);
    }

    #[test]
    fn test_odd_length_or_non_hex_is_plain_text() {
        let odd = challenge_with_payload(Some(json!("48656c6c6")));
        assert_eq!(detect_message_encoding(&odd), SigningScheme::PlainText);

        let words = challenge_with_payload(Some(json!("hello world")));
        assert_eq!(detect_message_encoding(&words), SigningScheme::PlainText);

        let empty = challenge_with_payload(Some(json!("")));
        assert_eq!(detect_message_encoding(&empty), SigningScheme::PlainText);
    }

    #[test]
    fn test_no_payload_is_plain_text() {
        let challenge = challenge_with_payload(None);
        assert_eq!(detect_message_encoding(&challenge), SigningScheme::PlainText);
    }

    #[test]
    fn test_typed_data_tag_wins() {
        let challenge = challenge_with_payload(Some(json!({
            "domain": { "name": "AgentChallenge", "chainId": 8453 },
            "primaryType": "Challenge",
            "types": { "Challenge": [{ "name": "id", "type": "string" }] },
            "message": { "id": "c1" },
        })));
        assert_eq!(
            detect_message_encoding(&challenge),
            SigningScheme::StructuredTypedData
        );

        let payload = typed_data_payload(&challenge).unwrap();
        assert_eq!(payload.primary_type, "Challenge");
    }

    #[test]
    fn test_partial_typed_data_tag_is_not_typed_data() {
        // Missing `types` descriptor: falls through to plain text.
        let challenge = challenge_with_payload(Some(json!({
            "domain": { "name": "AgentChallenge" },
            "primaryType": "Challenge",
            "message": { "id": "c1" },
        })));
        assert!(typed_data_payload(&challenge).is_none());
        assert_eq!(detect_message_encoding(&challenge), SigningScheme::PlainText);
    }

    #[test]
    fn test_detection_is_deterministic() {
        let challenge = challenge_with_payload(Some(json!("deadbeef")));
        let first = detect_message_encoding(&challenge);
        let second = detect_message_encoding(&challenge);
        assert_eq!(first, second);
    }

    #[test]
    fn test_decode_hex_message() {
        assert_eq!(decode_hex_message("0x48656c6c6f").unwrap(), b"Hello");
        assert_eq!(decode_hex_message("48656c6c6f").unwrap(), b"Hello");
        assert!(decode_hex_message("0xzz").is_err());
    }
}
