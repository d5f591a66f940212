//! API key management and validation handlers.
//!
//! - POST /api/v1/api-keys - create (secret shown once)
//! - GET /api/v1/api-keys - list
//! - GET /api/v1/api-keys/{id}
//! - PUT /api/v1/api-keys/{id}
//! - DELETE /api/v1/api-keys/{id}
//! - POST /api/v1/api-keys/validate - public; exchanges key+secret for a
//!   short-lived signed token
//!
//! Management endpoints require the `full` permission; the first key is
//! seeded out of band.

use crate::{
    AppState,
    error::AppError,
    middleware::api_auth::AuthContext,
    models::api_key::{
        ApiKey, ApiKeyResponse, CreateApiKeyRequest, CreatedApiKeyResponse, UpdateApiKeyRequest,
        ValidateRequest, generate_key, verify_secret,
    },
    response::ApiResponse,
    services::token::{self, TokenClaims},
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Create a new API key. The generated secret appears in this response
/// only; the database keeps just its digest.
pub async fn create_api_key(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<CreateApiKeyRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth.require("full")?;

    if request.name.trim().is_empty() {
        return Err(AppError::Validation(vec!["name is required".to_string()]));
    }
    if let Some(rate_limit) = request.rate_limit
        && rate_limit <= 0
    {
        return Err(AppError::Validation(vec![
            "rate_limit must be positive".to_string(),
        ]));
    }

    let generated = generate_key();
    let record = sqlx::query_as::<_, ApiKey>(
        r#"
        INSERT INTO api_keys (name, key, secret_hash, permissions, rate_limit, expires_at)
        VALUES ($1, $2, $3, $4, COALESCE($5, 1000), $6)
        RETURNING *
        "#,
    )
    .bind(request.name.trim())
    .bind(&generated.key)
    .bind(&generated.secret_hash)
    .bind(&request.permissions)
    .bind(request.rate_limit)
    .bind(request.expires_at)
    .fetch_one(&state.pool)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "API key created; the secret is shown only once",
            CreatedApiKeyResponse {
                key: record.into(),
                secret: generated.secret,
            },
        )),
    ))
}

/// List all keys, newest first. Secrets are never included.
pub async fn list_api_keys(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<ApiResponse<Vec<ApiKeyResponse>>>, AppError> {
    auth.require("full")?;

    let keys = sqlx::query_as::<_, ApiKey>("SELECT * FROM api_keys ORDER BY created_at DESC")
        .fetch_all(&state.pool)
        .await?;

    Ok(Json(ApiResponse::ok(
        keys.into_iter().map(Into::into).collect(),
    )))
}

/// Fetch one key by id.
pub async fn get_api_key(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ApiKeyResponse>>, AppError> {
    auth.require("full")?;

    let key = sqlx::query_as::<_, ApiKey>("SELECT * FROM api_keys WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or(AppError::NotFound("API key"))?;

    Ok(Json(ApiResponse::ok(key.into())))
}

/// Update a key's metadata. Key and secret are immutable; rotate by
/// creating a new key.
pub async fn update_api_key(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateApiKeyRequest>,
) -> Result<Json<ApiResponse<ApiKeyResponse>>, AppError> {
    auth.require("full")?;

    if let Some(status) = &request.status
        && status != "active"
        && status != "inactive"
    {
        return Err(AppError::Validation(vec![
            "status must be active or inactive".to_string(),
        ]));
    }

    let key = sqlx::query_as::<_, ApiKey>(
        r#"
        UPDATE api_keys
        SET name = COALESCE($1, name),
            permissions = COALESCE($2, permissions),
            rate_limit = COALESCE($3, rate_limit),
            status = COALESCE($4, status),
            expires_at = CASE WHEN $5 THEN $6 ELSE expires_at END,
            updated_at = NOW()
        WHERE id = $7
        RETURNING *
        "#,
    )
    .bind(&request.name)
    .bind(&request.permissions)
    .bind(request.rate_limit)
    .bind(&request.status)
    .bind(request.expires_at.is_some())
    .bind(request.expires_at.flatten())
    .bind(id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or(AppError::NotFound("API key"))?;

    Ok(Json(ApiResponse::with_message("API key updated", key.into())))
}

/// Delete a key, revoking it immediately.
pub async fn delete_api_key(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ApiKeyResponse>>, AppError> {
    auth.require("full")?;

    let key = sqlx::query_as::<_, ApiKey>("DELETE FROM api_keys WHERE id = $1 RETURNING *")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or(AppError::NotFound("API key"))?;

    Ok(Json(ApiResponse::with_message("API key deleted", key.into())))
}

/// Response body for a successful validation.
#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub permissions: Vec<String>,
    pub rate_limit: i32,
}

/// Exchange a key/secret pair for a short-lived signed token.
///
/// Public endpoint. The secret digest comparison is constant-time, and
/// inactive or expired keys fail identically to unknown ones so the
/// response does not reveal which check failed.
pub async fn validate_api_key(
    State(state): State<AppState>,
    Json(request): Json<ValidateRequest>,
) -> Result<Json<ApiResponse<ValidateResponse>>, AppError> {
    let record = sqlx::query_as::<_, ApiKey>("SELECT * FROM api_keys WHERE key = $1")
        .bind(&request.key)
        .fetch_optional(&state.pool)
        .await?
        .ok_or(AppError::InvalidApiKey)?;

    if !verify_secret(&request.secret, &record.secret_hash) {
        return Err(AppError::InvalidApiKey);
    }
    if !record.is_usable(Utc::now()) {
        return Err(AppError::InvalidApiKey);
    }

    let expires_at = Utc::now() + chrono::Duration::seconds(state.config.token_ttl_secs);
    let claims = TokenClaims {
        key_id: record.id,
        permissions: record.permissions.clone(),
        rate_limit: record.rate_limit,
        exp: expires_at.timestamp(),
    };
    let token = token::issue(&state.config.token_secret, &claims)?;

    Ok(Json(ApiResponse::with_message(
        "API key validated",
        ValidateResponse {
            token,
            expires_at,
            permissions: record.permissions,
            rate_limit: record.rate_limit,
        },
    )))
}
