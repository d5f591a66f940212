//! API key model, key material generation, and secret verification.
//!
//! Keys authenticate machine clients. The public key identifier is stored
//! as-is; the secret is stored only as a SHA-256 hex digest and compared
//! in constant time on every check.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use uuid::Uuid;

/// An API key row from the `api_keys` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ApiKey {
    pub id: Uuid,
    pub name: String,
    /// Public identifier, `ak_` + 32 hex chars
    pub key: String,
    /// SHA-256 hex digest of the secret; the secret itself is never stored
    pub secret_hash: String,
    /// Permission tags; "full" is a wildcard
    pub permissions: Vec<String>,
    /// Declared requests-per-hour tier (metadata only, not enforced)
    pub rate_limit: i32,
    /// "active" or "inactive"; inactive keys fail validation
    pub status: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub usage_count: i64,
    pub last_used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ApiKey {
    /// Whether this key currently passes validation checks.
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.status == "active" && self.expires_at.is_none_or(|exp| exp > now)
    }
}

/// Client-facing view of a key. The secret is absent; it is shown exactly
/// once, in the create response.
#[derive(Debug, Serialize)]
pub struct ApiKeyResponse {
    pub id: Uuid,
    pub name: String,
    pub key: String,
    pub permissions: Vec<String>,
    pub rate_limit: i32,
    pub status: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub usage_count: i64,
    pub last_used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ApiKey> for ApiKeyResponse {
    fn from(record: ApiKey) -> Self {
        Self {
            id: record.id,
            name: record.name,
            key: record.key,
            permissions: record.permissions,
            rate_limit: record.rate_limit,
            status: record.status,
            expires_at: record.expires_at,
            usage_count: record.usage_count,
            last_used_at: record.last_used_at,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Create response: the key record plus the one-time plaintext secret.
#[derive(Debug, Serialize)]
pub struct CreatedApiKeyResponse {
    #[serde(flatten)]
    pub key: ApiKeyResponse,
    /// Returned once at create time; store it, it cannot be recovered
    pub secret: String,
}

/// Request body for `POST /api/v1/api-keys`.
#[derive(Debug, Deserialize)]
pub struct CreateApiKeyRequest {
    pub name: String,
    #[serde(default)]
    pub permissions: Vec<String>,
    pub rate_limit: Option<i32>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Request body for `PUT /api/v1/api-keys/{id}`.
///
/// The key and secret are never updatable; rotate by creating a new key.
#[derive(Debug, Deserialize)]
pub struct UpdateApiKeyRequest {
    pub name: Option<String>,
    pub permissions: Option<Vec<String>>,
    pub rate_limit: Option<i32>,
    pub status: Option<String>,
    /// Absent: keep the stored expiry. Null: clear it. Value: replace it.
    #[serde(default, deserialize_with = "double_option")]
    pub expires_at: Option<Option<DateTime<Utc>>>,
}

/// Maps a present-but-null JSON field to `Some(None)` so the handler can
/// tell "clear expires_at" apart from "leave it alone".
fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<DateTime<Utc>>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<DateTime<Utc>>::deserialize(deserializer).map(Some)
}

/// Request body for `POST /api/v1/api-keys/validate`.
#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    pub key: String,
    pub secret: String,
}

/// Freshly generated key material, pre-hashing.
pub struct GeneratedKey {
    pub key: String,
    pub secret: String,
    pub secret_hash: String,
}

/// Generate a key/secret pair: `ak_` + 16 random bytes for the public
/// identifier, 32 random bytes for the secret, both hex encoded.
pub fn generate_key() -> GeneratedKey {
    let mut rng = rand::rng();
    let key_bytes: [u8; 16] = rng.random();
    let secret_bytes: [u8; 32] = rng.random();

    let secret = hex::encode(secret_bytes);
    GeneratedKey {
        key: format!("ak_{}", hex::encode(key_bytes)),
        secret_hash: hash_secret(&secret),
        secret,
    }
}

/// SHA-256 hex digest of a secret.
pub fn hash_secret(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Constant-time comparison of a presented secret against the stored
/// digest. Both sides are hashed first so the comparison length never
/// depends on client input.
pub fn verify_secret(presented: &str, stored_hash: &str) -> bool {
    let presented_hash = hash_secret(presented);
    presented_hash
        .as_bytes()
        .ct_eq(stored_hash.as_bytes())
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_keys_have_expected_shape() {
        let generated = generate_key();
        assert!(generated.key.starts_with("ak_"));
        assert_eq!(generated.key.len(), 3 + 32);
        assert_eq!(generated.secret.len(), 64);
        assert_eq!(generated.secret_hash, hash_secret(&generated.secret));
    }

    #[test]
    fn generated_keys_are_unique() {
        let a = generate_key();
        let b = generate_key();
        assert_ne!(a.key, b.key);
        assert_ne!(a.secret, b.secret);
    }

    #[test]
    fn verify_accepts_only_the_original_secret() {
        let generated = generate_key();
        assert!(verify_secret(&generated.secret, &generated.secret_hash));
        assert!(!verify_secret("wrong-secret", &generated.secret_hash));
        assert!(!verify_secret("", &generated.secret_hash));
    }

    fn key_with(status: &str, permissions: &[&str], expires_at: Option<DateTime<Utc>>) -> ApiKey {
        ApiKey {
            id: Uuid::new_v4(),
            name: "test".into(),
            key: "ak_test".into(),
            secret_hash: "x".into(),
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
            rate_limit: 1000,
            status: status.into(),
            expires_at,
            usage_count: 0,
            last_used_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn usable_requires_active_and_unexpired() {
        let now = Utc::now();
        assert!(key_with("active", &[], None).is_usable(now));
        assert!(!key_with("inactive", &[], None).is_usable(now));
        assert!(!key_with("active", &[], Some(now - chrono::Duration::hours(1))).is_usable(now));
        assert!(key_with("active", &[], Some(now + chrono::Duration::hours(1))).is_usable(now));
    }

    #[test]
    fn update_body_distinguishes_absent_and_null_expiry() {
        let body: UpdateApiKeyRequest = serde_json::from_str(r#"{"name":"x"}"#).unwrap();
        assert_eq!(body.expires_at, None);

        let body: UpdateApiKeyRequest = serde_json::from_str(r#"{"expires_at":null}"#).unwrap();
        assert_eq!(body.expires_at, Some(None));

        let body: UpdateApiKeyRequest =
            serde_json::from_str(r#"{"expires_at":"2030-01-01T00:00:00Z"}"#).unwrap();
        assert!(matches!(body.expires_at, Some(Some(_))));
    }
}
