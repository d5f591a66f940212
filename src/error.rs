//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses. Every handler returns `Result<_, AppError>`, so
//! status-code mapping lives in exactly one place instead of being
//! repeated per controller.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Application-wide error type.
///
/// # Error Categories
///
/// - **Database**: any sqlx::Error from queries (unique violations are
///   reported as 400 duplicates, everything else as 500)
/// - **Authentication**: missing/invalid API key or secret
/// - **Authorization**: key lacks the required permission
/// - **Resource**: requested record not found
/// - **Validation**: request body fails field-level rules
/// - **Transition**: illegal opportunity status change
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed (connection error, query error).
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// API key is missing, invalid, inactive, or expired.
    ///
    /// Returns HTTP 401 Unauthorized.
    #[error("Invalid API key or secret")]
    InvalidApiKey,

    /// Authenticated key lacks the required permission.
    ///
    /// Returns HTTP 403 Forbidden.
    #[error("Missing required permission: {0}")]
    PermissionDenied(&'static str),

    /// Requested record does not exist. The string names the resource
    /// ("Lead", "Make", ...) for the client-facing message.
    ///
    /// Returns HTTP 404 Not Found.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Request body or parameters are invalid.
    ///
    /// Returns HTTP 400 Bad Request with a per-field error list.
    #[error("Validation failed")]
    Validation(Vec<String>),

    /// Request is malformed in a way that isn't tied to a field list.
    ///
    /// Returns HTTP 400 Bad Request.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Opportunity status change outside Open -> Won | Lost.
    ///
    /// Returns HTTP 422 Unprocessable Entity.
    #[error("Illegal status transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    /// Invalid or expired short-lived API token.
    ///
    /// Returns HTTP 401 Unauthorized.
    #[error("Invalid or expired token")]
    InvalidToken,
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// ```json
/// {
///   "status": "error",
///   "message": "Human-readable error message",
///   "errors": ["field-level detail", ...]   // validation only
/// }
/// ```
///
/// Database driver details are never echoed to clients; they are logged
/// server-side and replaced with a generic message.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, errors) = match self {
            AppError::InvalidApiKey | AppError::InvalidToken => {
                (StatusCode::UNAUTHORIZED, self.to_string(), None)
            }
            AppError::PermissionDenied(_) => (StatusCode::FORBIDDEN, self.to_string(), None),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string(), None),
            AppError::Validation(ref fields) => (
                StatusCode::BAD_REQUEST,
                "Validation failed".to_string(),
                Some(fields.clone()),
            ),
            AppError::InvalidRequest(ref msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::InvalidTransition { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, self.to_string(), None)
            }
            AppError::Database(ref e) => {
                // Unique-constraint violations come back as client errors;
                // everything else is a server fault.
                if e.as_database_error()
                    .and_then(|d| d.code())
                    .is_some_and(|code| code == "23505")
                {
                    (
                        StatusCode::BAD_REQUEST,
                        "Duplicate key value".to_string(),
                        None,
                    )
                } else {
                    tracing::error!(error = %e, "database error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "An internal error occurred".to_string(),
                        None,
                    )
                }
            }
        };

        let mut body = json!({
            "status": "error",
            "message": message,
        });
        if let Some(errors) = errors {
            body["errors"] = json!(errors);
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404() {
        let resp = AppError::NotFound("Lead").into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn validation_maps_to_400() {
        let resp = AppError::Validation(vec!["name is required".into()]).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn transition_maps_to_422() {
        let resp = AppError::InvalidTransition {
            from: "Won".into(),
            to: "Open".into(),
        }
        .into_response();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn auth_errors_map_to_401_and_403() {
        assert_eq!(
            AppError::InvalidApiKey.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::PermissionDenied("write").into_response().status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn database_error_maps_to_500() {
        let resp = AppError::Database(sqlx::Error::RowNotFound).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
