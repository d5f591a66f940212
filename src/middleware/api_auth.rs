//! API key/secret authentication middleware.
//!
//! Machine clients authenticate every request with an `x-api-key` /
//! `x-api-secret` header pair. The middleware:
//! 1. Extracts both headers
//! 2. Looks the key up and verifies the secret digest in constant time
//! 3. Checks active status and expiry
//! 4. Bumps the key's usage counter and last-used timestamp
//! 5. Injects an [`AuthContext`] for handlers, or rejects with 401

use crate::{
    AppState,
    error::AppError,
    models::api_key::{ApiKey, verify_secret},
};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use uuid::Uuid;

/// Authentication context attached to authenticated requests.
///
/// Inserted into the request's extension map; handlers extract it with
/// `Extension<AuthContext>` to check permissions and attribute writes.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Id of the authenticated API key
    pub api_key_id: Uuid,

    /// Human-readable key name
    pub key_name: String,

    /// Permission tags granted to the key ("full" is a wildcard)
    pub permissions: Vec<String>,

    /// Declared rate-limit tier (metadata only)
    pub rate_limit: i32,
}

impl AuthContext {
    /// Membership in the permissions list, or the "full" wildcard.
    pub fn has_permission(&self, required: &str) -> bool {
        self.permissions
            .iter()
            .any(|p| p == required || p == "full")
    }

    /// Permission gate used by handlers; 403 on failure.
    pub fn require(&self, required: &'static str) -> Result<(), AppError> {
        if self.has_permission(required) {
            Ok(())
        } else {
            Err(AppError::PermissionDenied(required))
        }
    }
}

/// API key authentication middleware function.
///
/// # Headers
///
/// ```text
/// x-api-key: ak_0123abcd...
/// x-api-secret: 9f2c...
/// ```
///
/// # Returns
///
/// - `Ok(Response)` if authenticated (calls the next handler)
/// - `Err(AppError::InvalidApiKey)` otherwise (401)
pub async fn api_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let headers = request.headers();
    let key = headers
        .get("x-api-key")
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::InvalidApiKey)?
        .to_string();
    let secret = headers
        .get("x-api-secret")
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::InvalidApiKey)?
        .to_string();

    let record = sqlx::query_as::<_, ApiKey>("SELECT * FROM api_keys WHERE key = $1")
        .bind(&key)
        .fetch_optional(&state.pool)
        .await?
        .ok_or(AppError::InvalidApiKey)?;

    // Constant-time digest comparison; the stored secret is never decoded
    if !verify_secret(&secret, &record.secret_hash) {
        return Err(AppError::InvalidApiKey);
    }
    if !record.is_usable(Utc::now()) {
        return Err(AppError::InvalidApiKey);
    }

    // Usage bookkeeping on every authenticated call. This is a write on
    // the read path, kept for parity with the existing key-usage reports.
    sqlx::query(
        "UPDATE api_keys SET usage_count = usage_count + 1, last_used_at = NOW() WHERE id = $1",
    )
    .bind(record.id)
    .execute(&state.pool)
    .await?;

    let auth_context = AuthContext {
        api_key_id: record.id,
        key_name: record.name,
        permissions: record.permissions,
        rate_limit: record.rate_limit,
    };
    request.extensions_mut().insert(auth_context);

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(permissions: &[&str]) -> AuthContext {
        AuthContext {
            api_key_id: Uuid::new_v4(),
            key_name: "test".into(),
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
            rate_limit: 1000,
        }
    }

    #[test]
    fn require_passes_on_membership() {
        assert!(context(&["read"]).require("read").is_ok());
        assert!(context(&["read", "write"]).require("write").is_ok());
    }

    #[test]
    fn require_fails_without_permission() {
        let err = context(&["read"]).require("write").unwrap_err();
        assert!(matches!(err, AppError::PermissionDenied("write")));
    }

    #[test]
    fn full_wildcard_grants_everything() {
        let ctx = context(&["full"]);
        assert!(ctx.require("read").is_ok());
        assert!(ctx.require("write").is_ok());
    }
}
