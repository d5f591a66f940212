//! User records referenced as opportunity owners and note authors.
//!
//! Users exist so owner/author references resolve to display names when
//! activity entries are written. There is no user-management API surface;
//! rows are seeded out of band.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A user row from the `users` table.
#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
