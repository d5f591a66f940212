//! Activity log HTTP handlers.
//!
//! - POST /api/v1/activities - external append
//! - GET /api/v1/activities - list/filter/search
//! - GET /api/v1/activities/stats - per-type aggregation
//!
//! There is no update or delete: the log is append-only.

use crate::{
    AppState,
    error::AppError,
    middleware::api_auth::AuthContext,
    models::activity::{
        Activity, ActivityFilter, ActivityStats, CreateActivityRequest, StatsParams, TypeCount,
    },
    response::{ApiResponse, ListResponse, PageParams, Pagination, escape_like},
};
use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::{Postgres, QueryBuilder};

/// Columns activity list endpoints may sort by.
const SORT_COLUMNS: &[&str] = &["created_at", "activity_type"];

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &ActivityFilter) {
    qb.push(" WHERE TRUE");
    if let Some(user_id) = filter.user_id {
        qb.push(" AND user_id = ").push_bind(user_id);
    }
    if let Some(activity_type) = &filter.activity_type {
        qb.push(" AND activity_type = ").push_bind(activity_type.clone());
    }
    if let Some(lead_id) = filter.lead_id {
        qb.push(" AND lead_id = ").push_bind(lead_id);
    }
    if let Some(from) = filter.from {
        qb.push(" AND created_at >= ").push_bind(from);
    }
    if let Some(to) = filter.to {
        qb.push(" AND created_at <= ").push_bind(to);
    }
    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", escape_like(search.trim()));
        qb.push(" AND (content ILIKE ").push_bind(pattern.clone());
        qb.push(" OR activity_type ILIKE ").push_bind(pattern);
        qb.push(")");
    }
}

/// Append an activity entry.
pub async fn create_activity(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<CreateActivityRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth.require("write")?;

    let mut errors = Vec::new();
    if request.activity_type.trim().is_empty() {
        errors.push("activity_type is required".to_string());
    }
    if request.content.trim().is_empty() {
        errors.push("content is required".to_string());
    }
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let activity = sqlx::query_as::<_, Activity>(
        r#"
        INSERT INTO activities (user_id, activity_type, content, lead_id, content_id, metadata)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(request.user_id)
    .bind(request.activity_type.trim())
    .bind(request.content.trim())
    .bind(request.lead_id)
    .bind(request.content_id)
    .bind(request.metadata.unwrap_or_else(|| json!({})))
    .fetch_one(&state.pool)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("Activity recorded", activity)),
    ))
}

/// List activities with filters, free-text search, and pagination.
pub async fn list_activities(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(page): Query<PageParams>,
    Query(filter): Query<ActivityFilter>,
) -> Result<Json<ListResponse<Activity>>, AppError> {
    auth.require("read")?;

    let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM activities");
    push_filters(&mut count_qb, &filter);
    let total: i64 = count_qb.build_query_scalar().fetch_one(&state.pool).await?;

    let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM activities");
    push_filters(&mut qb, &filter);
    qb.push(format!(
        " ORDER BY {} {} LIMIT ",
        page.sort_column(SORT_COLUMNS),
        page.sort_direction()
    ));
    qb.push_bind(page.limit());
    qb.push(" OFFSET ");
    qb.push_bind(page.offset());

    let activities = qb
        .build_query_as::<Activity>()
        .fetch_all(&state.pool)
        .await?;

    Ok(Json(ListResponse::new(
        activities,
        Pagination::new(page.page(), page.limit(), total),
    )))
}

/// Per-type aggregation, optionally scoped by user and date range.
///
/// The total is computed from the per-type counts, so it always equals
/// their sum. `most_frequent_type` is the entry with the highest count;
/// the breakdown is ordered by count descending, so it is the first row.
pub async fn activity_stats(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<StatsParams>,
) -> Result<Json<ApiResponse<ActivityStats>>, AppError> {
    auth.require("read")?;

    let mut qb = QueryBuilder::<Postgres>::new(
        "SELECT activity_type, COUNT(*) AS count, MAX(created_at) AS last_activity FROM activities WHERE TRUE",
    );
    if let Some(user_id) = params.user_id {
        qb.push(" AND user_id = ").push_bind(user_id);
    }
    if let Some(from) = params.from {
        qb.push(" AND created_at >= ").push_bind(from);
    }
    if let Some(to) = params.to {
        qb.push(" AND created_at <= ").push_bind(to);
    }
    qb.push(" GROUP BY activity_type ORDER BY count DESC, activity_type");

    let activities_by_type = qb
        .build_query_as::<TypeCount>()
        .fetch_all(&state.pool)
        .await?;

    let total_activities = activities_by_type.iter().map(|t| t.count).sum();
    let most_frequent_type = activities_by_type
        .first()
        .map(|t| t.activity_type.clone());

    Ok(Json(ApiResponse::ok(ActivityStats {
        total_activities,
        activities_by_type,
        most_frequent_type,
    })))
}
