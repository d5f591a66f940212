//! Activity (audit log) data model and API types.
//!
//! Activities are append-only: the application exposes create and query
//! endpoints, never update or delete. Most rows are written as side
//! effects of opportunity and note mutations; `content_id` is a
//! polymorphic reference to whichever record triggered the entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// An activity row from the `activities` table.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Activity {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    /// Free-text tag, e.g. "sell_opportunity_created"
    pub activity_type: String,
    /// Human-readable description
    pub content: String,
    pub lead_id: Option<Uuid>,
    /// Id of the record that triggered this entry, if any
    pub content_id: Option<Uuid>,
    /// Free-form snapshot (before/after field values, deleted documents)
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
}

/// Request body for `POST /api/v1/activities`.
#[derive(Debug, Deserialize)]
pub struct CreateActivityRequest {
    pub user_id: Option<Uuid>,
    pub activity_type: String,
    pub content: String,
    pub lead_id: Option<Uuid>,
    pub content_id: Option<Uuid>,
    pub metadata: Option<Value>,
}

/// Filters for `GET /api/v1/activities`.
#[derive(Debug, Default, Deserialize)]
pub struct ActivityFilter {
    /// Free-text search over content and activity_type
    pub search: Option<String>,
    pub user_id: Option<Uuid>,
    pub activity_type: Option<String>,
    pub lead_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// Scope parameters for `GET /api/v1/activities/stats`.
#[derive(Debug, Default, Deserialize)]
pub struct StatsParams {
    pub user_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// One row of the per-type breakdown in the stats response.
#[derive(Debug, sqlx::FromRow, Serialize)]
pub struct TypeCount {
    pub activity_type: String,
    pub count: i64,
    pub last_activity: DateTime<Utc>,
}

/// Response body for the stats endpoint.
///
/// Invariant: `total_activities` equals the sum of all per-type counts,
/// and `most_frequent_type` is the breakdown entry with the highest count.
#[derive(Debug, Serialize)]
pub struct ActivityStats {
    pub total_activities: i64,
    pub activities_by_type: Vec<TypeCount>,
    pub most_frequent_type: Option<String>,
}
