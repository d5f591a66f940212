//! Note HTTP handlers.
//!
//! - POST /api/v1/notes
//! - GET /api/v1/notes/lead/{leadId}
//! - GET /api/v1/notes/{id}
//! - PUT /api/v1/notes/{id}
//! - DELETE /api/v1/notes/{id}
//!
//! Every mutation writes an audit activity. The lead and author names
//! used in activity content are resolved through the same joined query
//! that loads the note, so the log never shows an unresolved reference.

use crate::{
    AppState,
    error::AppError,
    middleware::api_auth::AuthContext,
    models::note::{CreateNoteRequest, Note, UpdateNoteRequest},
    response::{ApiResponse, ListResponse, PageParams, Pagination},
    services::audit,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use uuid::Uuid;

/// Joined select: lead and author names ride along with the note.
const SELECT_JOINED: &str = r#"
    SELECT n.id, n.lead_id, n.note_text, n.attachments, n.created_by,
           n.created_at, n.updated_at,
           l.name AS lead_name, u.name AS author_name
    FROM notes n
    LEFT JOIN leads l ON l.id = n.lead_id
    LEFT JOIN users u ON u.id = n.created_by
"#;

async fn fetch_note(state: &AppState, id: Uuid) -> Result<Note, AppError> {
    let sql = format!("{SELECT_JOINED} WHERE n.id = $1");
    sqlx::query_as::<_, Note>(&sql)
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or(AppError::NotFound("Note"))
}

/// Trimmed note text, rejecting blank input. Applies to create and
/// update alike so a PUT cannot empty a note.
fn require_note_text(text: &str) -> Result<&str, AppError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(vec![
            "note_text is required".to_string(),
        ]));
    }
    Ok(trimmed)
}

/// Create a note on an existing lead.
pub async fn create_note(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<CreateNoteRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth.require("write")?;

    let note_text = require_note_text(&request.note_text)?;

    let lead_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM leads WHERE id = $1)")
        .bind(request.lead_id)
        .fetch_one(&state.pool)
        .await?;
    if !lead_exists {
        return Err(AppError::NotFound("Lead"));
    }

    let id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO notes (lead_id, note_text, attachments, created_by)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(request.lead_id)
    .bind(note_text)
    .bind(&request.attachments)
    .bind(request.created_by)
    .fetch_one(&state.pool)
    .await?;

    let note = fetch_note(&state, id).await?;
    audit::record(
        &state.pool,
        Some(note.created_by),
        "note_created",
        format!(
            "Note added for lead {} by {}",
            note.lead_name.as_deref().unwrap_or("unknown"),
            note.author_name.as_deref().unwrap_or("unknown")
        ),
        Some(note.lead_id),
        Some(note.id),
        json!({ "attachments": note.attachments.len() }),
    )
    .await;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("Note created", note)),
    ))
}

/// List the notes of one lead, newest first.
pub async fn list_notes_by_lead(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(lead_id): Path<Uuid>,
    Query(page): Query<PageParams>,
) -> Result<Json<ListResponse<Note>>, AppError> {
    auth.require("read")?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notes WHERE lead_id = $1")
        .bind(lead_id)
        .fetch_one(&state.pool)
        .await?;

    let sql = format!(
        "{SELECT_JOINED} WHERE n.lead_id = $1 ORDER BY n.created_at DESC LIMIT $2 OFFSET $3"
    );
    let notes = sqlx::query_as::<_, Note>(&sql)
        .bind(lead_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&state.pool)
        .await?;

    Ok(Json(ListResponse::new(
        notes,
        Pagination::new(page.page(), page.limit(), total),
    )))
}

/// Fetch one note; 404 on miss.
pub async fn get_note(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Note>>, AppError> {
    auth.require("read")?;
    let note = fetch_note(&state, id).await?;
    Ok(Json(ApiResponse::ok(note)))
}

/// Update a note's text and/or attachments.
pub async fn update_note(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateNoteRequest>,
) -> Result<Json<ApiResponse<Note>>, AppError> {
    auth.require("write")?;

    let note_text = request
        .note_text
        .as_deref()
        .map(require_note_text)
        .transpose()?;

    let updated = sqlx::query(
        r#"
        UPDATE notes
        SET note_text = COALESCE($1, note_text),
            attachments = COALESCE($2, attachments),
            updated_at = NOW()
        WHERE id = $3
        "#,
    )
    .bind(note_text)
    .bind(&request.attachments)
    .bind(id)
    .execute(&state.pool)
    .await?
    .rows_affected();
    if updated == 0 {
        return Err(AppError::NotFound("Note"));
    }

    let note = fetch_note(&state, id).await?;
    audit::record(
        &state.pool,
        Some(note.created_by),
        "note_updated",
        format!(
            "Note updated for lead {}",
            note.lead_name.as_deref().unwrap_or("unknown")
        ),
        Some(note.lead_id),
        Some(note.id),
        json!({}),
    )
    .await;

    Ok(Json(ApiResponse::with_message("Note updated", note)))
}

/// Delete a note, recording a text snapshot in the audit trail.
pub async fn delete_note(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Note>>, AppError> {
    auth.require("write")?;

    let note = fetch_note(&state, id).await?;

    sqlx::query("DELETE FROM notes WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;

    audit::record(
        &state.pool,
        Some(note.created_by),
        "note_deleted",
        format!(
            "Note deleted for lead {}",
            note.lead_name.as_deref().unwrap_or("unknown")
        ),
        Some(note.lead_id),
        Some(note.id),
        json!({ "snapshot": { "note_text": note.note_text, "attachments": note.attachments } }),
    )
    .await;

    Ok(Json(ApiResponse::with_message("Note deleted", note)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_note_text_is_rejected() {
        assert!(matches!(
            require_note_text(""),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            require_note_text("   \n\t"),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn note_text_is_trimmed() {
        assert_eq!(require_note_text("  hello  ").unwrap(), "hello");
    }
}
