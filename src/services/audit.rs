//! Audit-trail writer.
//!
//! Opportunity and note mutations record an activity entry alongside the
//! primary write. The two writes are not transactional: the audit insert
//! runs after the primary statement commits, and a failure is logged at
//! warn level without failing the request. Losing an audit row is
//! tolerable; losing the primary write is not.

use crate::db::DbPool;
use serde_json::Value;
use uuid::Uuid;

/// Append an activity entry, swallowing (but logging) any failure.
pub async fn record(
    pool: &DbPool,
    user_id: Option<Uuid>,
    activity_type: &str,
    content: String,
    lead_id: Option<Uuid>,
    content_id: Option<Uuid>,
    metadata: Value,
) {
    let result = sqlx::query(
        r#"
        INSERT INTO activities (user_id, activity_type, content, lead_id, content_id, metadata)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(user_id)
    .bind(activity_type)
    .bind(&content)
    .bind(lead_id)
    .bind(content_id)
    .bind(&metadata)
    .execute(pool)
    .await;

    if let Err(e) = result {
        tracing::warn!(activity_type, error = %e, "failed to write audit activity");
    }
}
