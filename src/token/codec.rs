//! Signing and verification of pinning tokens.

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// The deployment a client is pinned to, and when the pin was issued.
///
/// Serializes as `{"id":"<deployment>","ts":<epoch ms>}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    #[serde(rename = "id")]
    pub deployment_id: String,

    #[serde(rename = "ts")]
    pub issued_at_ms: u64,
}

impl Payload {
    pub fn new(deployment_id: impl Into<String>, issued_at_ms: u64) -> Self {
        Self {
            deployment_id: deployment_id.into(),
            issued_at_ms,
        }
    }

    /// Whether more than `max_age_ms` has elapsed since issuance.
    ///
    /// A timestamp in the future is never expired.
    pub fn is_expired(&self, now_ms: u64, max_age_ms: u64) -> bool {
        now_ms.saturating_sub(self.issued_at_ms) > max_age_ms
    }
}

/// Why a token was rejected.
///
/// Callers must treat every variant the same way; the distinction only
/// exists for diagnostics.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token has no '.' separator")]
    MissingSeparator,

    #[error("token segment is not valid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("token signature does not match")]
    Signature,

    #[error("invalid signing key")]
    Key,

    #[error("token payload could not be (de)serialized: {0}")]
    Payload(#[from] serde_json::Error),
}

fn mac_for(secret: &str, message: &[u8]) -> Result<HmacSha256, TokenError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| TokenError::Key)?;
    mac.update(message);
    Ok(mac)
}

/// Sign a payload, returning `<hex payload>.<hex signature>`.
pub fn sign(payload: &Payload, secret: &str) -> Result<String, TokenError> {
    let message = serde_json::to_vec(payload)?;
    let signature = mac_for(secret, &message)?.finalize().into_bytes();

    Ok(format!("{}.{}", hex::encode(&message), hex::encode(signature)))
}

/// Verify a token's signature, then decode its payload.
pub fn verify(token: &str, secret: &str) -> Result<Payload, TokenError> {
    let (message, signature) = token.split_once('.').ok_or(TokenError::MissingSeparator)?;
    let message = hex::decode(message)?;
    let signature = hex::decode(signature)?;

    mac_for(secret, &message)?
        .verify_slice(&signature)
        .map_err(|_| TokenError::Signature)?;

    Ok(serde_json::from_slice(&message)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "secret";

    #[test]
    fn test_round_trip() {
        let payload = Payload::new("deploy-id", 1_700_000_000_000);
        let token = sign(&payload, SECRET).unwrap();

        assert_eq!(verify(&token, SECRET).unwrap(), payload);
    }

    #[test]
    fn test_wire_shape() {
        let token = sign(&Payload::new("abc", 42), SECRET).unwrap();
        let (message, signature) = token.split_once('.').unwrap();

        assert_eq!(hex::decode(message).unwrap(), br#"{"id":"abc","ts":42}"#);
        // SHA-256 output, hex encoded
        assert_eq!(signature.len(), 64);
        assert!(token.chars().all(|c| c == '.' || c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_signing_is_deterministic() {
        let payload = Payload::new("deploy-id", 7);
        assert_eq!(sign(&payload, SECRET).unwrap(), sign(&payload, SECRET).unwrap());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = sign(&Payload::new("deploy-id", 1), SECRET).unwrap();
        assert!(matches!(verify(&token, "other"), Err(TokenError::Signature)));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let token = sign(&Payload::new("deploy-a", 1), SECRET).unwrap();
        let (_, signature) = token.split_once('.').unwrap();
        let forged = format!("{}.{}", hex::encode(br#"{"id":"deploy-b","ts":1}"#), signature);

        assert!(matches!(verify(&forged, SECRET), Err(TokenError::Signature)));
    }

    #[test]
    fn test_malformed_tokens_rejected() {
        let valid = sign(&Payload::new("deploy-id", 1), SECRET).unwrap();
        let truncated_mac = &valid[..valid.len() - 2];

        for input in [
            "",
            ".",
            "no-separator",
            "abc.def",
            "zz.zz",
            "0.00",
            "00.0",
            truncated_mac,
        ] {
            assert!(verify(input, SECRET).is_err(), "{input:?} should be rejected");
        }
    }

    #[test]
    fn test_signed_garbage_payload_rejected() {
        let message = b"not json";
        let signature = mac_for(SECRET, message).unwrap().finalize().into_bytes();
        let token = format!("{}.{}", hex::encode(message), hex::encode(signature));

        assert!(matches!(verify(&token, SECRET), Err(TokenError::Payload(_))));
    }

    #[test]
    fn test_expiry_boundary() {
        let payload = Payload::new("deploy-id", 1_000);

        assert!(!payload.is_expired(1_000 + 500, 500));
        assert!(payload.is_expired(1_000 + 501, 500));
        assert!(!payload.is_expired(0, 500));
    }
}
