//! Read-only user endpoints.
//!
//! Users are seeded out of band; the API only lists them so clients can
//! populate owner/author pickers.

use crate::{
    AppState, error::AppError, middleware::api_auth::AuthContext, models::user::User,
    response::ApiResponse,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use uuid::Uuid;

/// List all users, alphabetically.
pub async fn list_users(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<ApiResponse<Vec<User>>>, AppError> {
    auth.require("read")?;

    let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY name")
        .fetch_all(&state.pool)
        .await?;

    Ok(Json(ApiResponse::ok(users)))
}

/// Fetch one user; 404 on miss.
pub async fn get_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<User>>, AppError> {
    auth.require("read")?;

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or(AppError::NotFound("User"))?;

    Ok(Json(ApiResponse::ok(user)))
}
