//! Note data model and API request/response types.
//!
//! Notes hang off a lead and carry optional attachment paths. Attachment
//! storage itself happens elsewhere; this service records the paths the
//! client supplies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A note row joined with its lead and author display names.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Note {
    pub id: Uuid,
    pub lead_id: Uuid,
    pub note_text: String,
    pub attachments: Vec<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub lead_name: Option<String>,
    pub author_name: Option<String>,
}

/// Request body for `POST /api/v1/notes`.
#[derive(Debug, Deserialize)]
pub struct CreateNoteRequest {
    pub lead_id: Uuid,
    pub note_text: String,
    #[serde(default)]
    pub attachments: Vec<String>,
    pub created_by: Uuid,
}

/// Request body for `PUT /api/v1/notes/{id}`.
#[derive(Debug, Deserialize)]
pub struct UpdateNoteRequest {
    pub note_text: Option<String>,
    pub attachments: Option<Vec<String>>,
}
