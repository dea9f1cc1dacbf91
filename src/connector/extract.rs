//! Orchestrator Response Extraction
//!
//! The remote signing authority has shipped several response shapes across
//! provider versions: flat objects, `data`/`result` wrappers, a
//! `signed_challenge` envelope, different field names for the same thing.
//! Each extractor walks a small ordered list of candidate shapes and folds
//! the first match into the canonical structure. Pure parsers, no I/O.

use serde_json::Value;

use crate::error::WalletError;
use crate::types::{Signature, SigningScheme, WalletMetadata};

/// Parse a raw orchestrator response into a canonical [`Signature`].
///
/// Idempotent on already-canonical input. Fails with
/// [`WalletError::UnparsableResponse`] (raw response attached) when no
/// known shape matches.
pub fn extract_signature(raw: &Value) -> Result<Signature, WalletError> {
    // A bare string response is the signature itself.
    if let Some(text) = raw.as_str() {
        if !text.is_empty() {
            return Ok(Signature {
                signature: text.to_string(),
                scheme: SigningScheme::PlainText,
                address: None,
            });
        }
    }

    for candidate in candidate_objects(raw) {
        if let Some(signature) = signature_from_object(candidate) {
            return Ok(signature);
        }
    }

    Err(WalletError::UnparsableResponse {
        reason: "no signature field in any known response shape".to_string(),
        raw: raw.clone(),
    })
}

/// Parse a raw orchestrator response into canonical [`WalletMetadata`].
///
/// Address is the one mandatory field; EVM-looking addresses are folded to
/// lowercase so equal wallets compare equal.
pub fn extract_wallet_metadata(raw: &Value) -> Result<WalletMetadata, WalletError> {
    for candidate in candidate_objects(raw) {
        if let Some(metadata) = metadata_from_object(candidate) {
            return Ok(metadata);
        }
    }

    Err(WalletError::UnparsableResponse {
        reason: "no wallet address in any known response shape".to_string(),
        raw: raw.clone(),
    })
}

/// Candidate locations for the interesting object, outermost first.
fn candidate_objects(raw: &Value) -> Vec<&Value> {
    let mut candidates = vec![raw];
    for key in ["data", "result", "signed_challenge", "signedChallenge", "wallet"] {
        if let Some(inner) = raw.get(key) {
            candidates.push(inner);
            // One more level covers data.signed_challenge / data.wallet.
            for nested_key in ["signed_challenge", "signedChallenge", "wallet"] {
                if let Some(nested) = inner.get(nested_key) {
                    candidates.push(nested);
                }
            }
        }
    }
    candidates
}

fn signature_from_object(value: &Value) -> Option<Signature> {
    let signature = value["signature"]
        .as_str()
        .or_else(|| value["sig"].as_str())
        .filter(|s| !s.is_empty())?
        .to_string();

    let scheme = value["scheme"]
        .as_str()
        .or_else(|| value["encoding"].as_str())
        .or_else(|| value["messageEncoding"].as_str())
        .and_then(parse_scheme)
        .unwrap_or(SigningScheme::PlainText);

    // The authority's address is reported exactly as returned.
    let address = value["address"]
        .as_str()
        .or_else(|| value["signerAddress"].as_str())
        .or_else(|| value["signer_address"].as_str())
        .or_else(|| value["walletAddress"].as_str())
        .or_else(|| value["wallet_address"].as_str())
        .map(|s| s.to_string());

    Some(Signature {
        signature,
        scheme,
        address,
    })
}

fn metadata_from_object(value: &Value) -> Option<WalletMetadata> {
    let address = value["address"]
        .as_str()
        .or_else(|| value["walletAddress"].as_str())
        .or_else(|| value["wallet_address"].as_str())
        .filter(|s| !s.is_empty())?;

    let chain_type = opt_string(value, &["chainType", "chain_type"]);

    Some(WalletMetadata {
        address: canonicalize_address(address),
        caip2: opt_string(value, &["caip2", "caip_2", "chainId", "chain_id"])
            .filter(|v| v.contains(':')),
        chain: opt_string(value, &["chain", "chainName", "chain_name"]),
        chain_type,
        provider: opt_string(value, &["provider", "providerName", "provider_name"]),
        label: opt_string(value, &["label", "name"]),
    })
}

fn opt_string(value: &Value, names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| value[*name].as_str())
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

fn parse_scheme(name: &str) -> Option<SigningScheme> {
    match name {
        "plain_text" | "plaintext" | "text" => Some(SigningScheme::PlainText),
        "hex_bytes" | "hex" | "raw_hex" => Some(SigningScheme::HexBytes),
        "typed_data" | "typedData" | "eip712" | "eip-712" => {
            Some(SigningScheme::StructuredTypedData)
        }
        _ => None,
    }
}

/// One canonical case for addresses whose chain type permits it: EVM
/// addresses are case-insensitive, so fold them to lowercase. Anything
/// else passes through untouched.
pub(crate) fn canonicalize_address(address: &str) -> String {
    let digits = match address.strip_prefix("0x") {
        Some(rest) => rest,
        None => return address.to_string(),
    };
    if digits.len() == 40 && digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        address.to_ascii_lowercase()
    } else {
        address.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flat_signature_shape() {
        let raw = json!({
            "signature": "0xabc123",
            "scheme": "hex_bytes",
            "address": "0xSigner",
        });
        let sig = extract_signature(&raw).unwrap();
        assert_eq!(sig.signature, "0xabc123");
        assert_eq!(sig.scheme, SigningScheme::HexBytes);
        assert_eq!(sig.address.as_deref(), Some("0xSigner"));
    }

    #[test]
    fn test_wrapped_and_legacy_shapes() {
        let wrapped = json!({ "data": { "signature": "0xabc", "encoding": "eip712" } });
        let sig = extract_signature(&wrapped).unwrap();
        assert_eq!(sig.scheme, SigningScheme::StructuredTypedData);

        let envelope = json!({
            "result": {
                "signed_challenge": { "sig": "0xdef", "signer_address": "0xS" }
            }
        });
        let sig = extract_signature(&envelope).unwrap();
        assert_eq!(sig.signature, "0xdef");
        assert_eq!(sig.address.as_deref(), Some("0xS"));

        let bare = json!("0xbarestring");
        assert_eq!(extract_signature(&bare).unwrap().signature, "0xbarestring");
    }

    #[test]
    fn test_signature_extraction_is_idempotent_on_canonical_input() {
        let canonical = Signature {
            signature: "0xabc".to_string(),
            scheme: SigningScheme::StructuredTypedData,
            address: Some("0xsigner".to_string()),
        };
        let round_tripped =
            extract_signature(&serde_json::to_value(&canonical).unwrap()).unwrap();
        assert_eq!(round_tripped, canonical);
    }

    #[test]
    fn test_unknown_shape_attaches_raw_response() {
        let raw = json!({ "status": "ok" });
        match extract_signature(&raw).unwrap_err() {
            WalletError::UnparsableResponse { raw: attached, .. } => assert_eq!(attached, raw),
            other => panic!("expected UnparsableResponse, got {:?}", other),
        }
    }

    #[test]
    fn test_metadata_shapes_and_address_folding() {
        let flat = json!({
            "walletAddress": "0xF39FD6E51AAD88F6F4CE6AB8827279CFFFB92266",
            "caip2": "eip155:8453",
            "chain": "Base",
            "chainType": "evm",
            "provider": "orchestrator",
        });
        let metadata = extract_wallet_metadata(&flat).unwrap();
        assert_eq!(metadata.address, "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266");
        assert_eq!(metadata.caip2.as_deref(), Some("eip155:8453"));
        assert_eq!(metadata.chain.as_deref(), Some("Base"));

        let nested = json!({ "data": { "wallet": { "address": "addr1solana", "chain_type": "solana" } } });
        let metadata = extract_wallet_metadata(&nested).unwrap();
        // Non-EVM addresses keep their case.
        assert_eq!(metadata.address, "addr1solana");

        let no_address = json!({ "wallet": { "label": "x" } });
        assert!(matches!(
            extract_wallet_metadata(&no_address).unwrap_err(),
            WalletError::UnparsableResponse { .. }
        ));
    }

    #[test]
    fn test_numeric_chain_id_is_not_mistaken_for_caip2() {
        let raw = json!({ "address": "0xabc0000000000000000000000000000000000abc", "chain_id": "8453" });
        let metadata = extract_wallet_metadata(&raw).unwrap();
        // Bare chain ids without a namespace are not CAIP-2.
        assert!(metadata.caip2.is_none());
    }
}
