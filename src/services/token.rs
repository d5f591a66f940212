//! Short-lived signed tokens issued by API-key validation.
//!
//! A token is `hex(json(claims)) + "." + hex(hmac_sha256(payload_hex))`.
//! Verification recomputes the tag with the server's secret (the HMAC
//! comparison is constant-time) and then checks expiry.

use crate::error::AppError;
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Claims embedded in an issued token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenClaims {
    /// Id of the API key the token was issued for
    pub key_id: Uuid,
    pub permissions: Vec<String>,
    /// Declared rate-limit tier carried for downstream consumers
    pub rate_limit: i32,
    /// Expiry as a unix timestamp
    pub exp: i64,
}

fn sign_payload(secret: &str, payload_hex: &str) -> Vec<u8> {
    // HMAC accepts keys of any length, so this cannot fail
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(payload_hex.as_bytes());
    mac.finalize().into_bytes().to_vec()
}

/// Issue a signed token for the given claims.
pub fn issue(secret: &str, claims: &TokenClaims) -> Result<String, AppError> {
    let payload = serde_json::to_vec(claims)
        .map_err(|e| AppError::InvalidRequest(format!("could not encode claims: {e}")))?;
    let payload_hex = hex::encode(payload);
    let tag = sign_payload(secret, &payload_hex);
    Ok(format!("{payload_hex}.{}", hex::encode(tag)))
}

/// Verify a token's signature and expiry, returning its claims.
pub fn verify(secret: &str, token: &str) -> Result<TokenClaims, AppError> {
    let (payload_hex, tag_hex) = token.split_once('.').ok_or(AppError::InvalidToken)?;
    let tag = hex::decode(tag_hex).map_err(|_| AppError::InvalidToken)?;

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(payload_hex.as_bytes());
    // Constant-time tag comparison
    mac.verify_slice(&tag).map_err(|_| AppError::InvalidToken)?;

    let payload = hex::decode(payload_hex).map_err(|_| AppError::InvalidToken)?;
    let claims: TokenClaims =
        serde_json::from_slice(&payload).map_err(|_| AppError::InvalidToken)?;

    if claims.exp <= Utc::now().timestamp() {
        return Err(AppError::InvalidToken);
    }

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(ttl_secs: i64) -> TokenClaims {
        TokenClaims {
            key_id: Uuid::new_v4(),
            permissions: vec!["read".into(), "write".into()],
            rate_limit: 1000,
            exp: Utc::now().timestamp() + ttl_secs,
        }
    }

    #[test]
    fn issued_tokens_verify() {
        let claims = claims(600);
        let token = issue("server-secret", &claims).unwrap();
        let decoded = verify("server-secret", &token).unwrap();
        assert_eq!(decoded, claims);
    }

    #[test]
    fn tampered_payloads_are_rejected() {
        let token = issue("server-secret", &claims(600)).unwrap();
        let (payload, tag) = token.split_once('.').unwrap();
        let mut flipped = payload.to_string();
        // flip the first hex digit
        let first = flipped.remove(0);
        flipped.insert(0, if first == '0' { '1' } else { '0' });
        assert!(verify("server-secret", &format!("{flipped}.{tag}")).is_err());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue("server-secret", &claims(600)).unwrap();
        assert!(verify("other-secret", &token).is_err());
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let token = issue("server-secret", &claims(-10)).unwrap();
        assert!(verify("server-secret", &token).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(verify("server-secret", "").is_err());
        assert!(verify("server-secret", "no-dot-here").is_err());
        assert!(verify("server-secret", "zzzz.zzzz").is_err());
    }
}
