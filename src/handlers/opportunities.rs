//! Opportunity HTTP handlers, parameterized by pipeline kind.
//!
//! One handler set serves all five pipelines; the `{kind}` path segment
//! (buy | sell | finance | insurance | rto) selects the stage list and
//! field rules:
//!
//! - POST /api/v1/opportunities/{kind}
//! - GET /api/v1/opportunities/{kind}
//! - GET /api/v1/opportunities/{kind}/{id}
//! - PUT /api/v1/opportunities/{kind}/{id}
//! - PATCH /api/v1/opportunities/{kind}/{id}/status
//! - DELETE /api/v1/opportunities/{kind}/{id}

use crate::{
    AppState,
    error::AppError,
    middleware::api_auth::AuthContext,
    models::opportunity::{
        CreateOpportunityRequest, Opportunity, OpportunityFilter, OpportunityKind,
        UpdateOpportunityRequest, UpdateStatusRequest,
    },
    response::{ApiResponse, ListResponse, PageParams, Pagination},
    services::opportunities,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

/// Resolve the `{kind}` path segment; unknown kinds are a 404.
fn parse_kind(segment: &str) -> Result<OpportunityKind, AppError> {
    OpportunityKind::parse(segment).ok_or(AppError::NotFound("Opportunity type"))
}

/// Create an opportunity of the given kind. Status defaults to Open.
pub async fn create_opportunity(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(kind): Path<String>,
    Json(request): Json<CreateOpportunityRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth.require("write")?;
    let kind = parse_kind(&kind)?;

    let opportunity = opportunities::create(&state.pool, kind, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("Opportunity created", opportunity)),
    ))
}

/// List opportunities of one kind with search/filter/sort/pagination.
pub async fn list_opportunities(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(kind): Path<String>,
    Query(page): Query<PageParams>,
    Query(filter): Query<OpportunityFilter>,
) -> Result<Json<ListResponse<Opportunity>>, AppError> {
    auth.require("read")?;
    let kind = parse_kind(&kind)?;

    let (rows, total) = opportunities::list(&state.pool, kind, &page, &filter).await?;

    Ok(Json(ListResponse::new(
        rows,
        Pagination::new(page.page(), page.limit(), total),
    )))
}

/// Fetch one opportunity; 404 on miss or kind mismatch.
pub async fn get_opportunity(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((kind, id)): Path<(String, Uuid)>,
) -> Result<Json<ApiResponse<Opportunity>>, AppError> {
    auth.require("read")?;
    let kind = parse_kind(&kind)?;

    let opportunity = opportunities::get(&state.pool, kind, id).await?;

    Ok(Json(ApiResponse::ok(opportunity)))
}

/// Update owner/stage/details. Immutable fields are not part of the
/// request type and can never be applied.
pub async fn update_opportunity(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((kind, id)): Path<(String, Uuid)>,
    Json(request): Json<UpdateOpportunityRequest>,
) -> Result<Json<ApiResponse<Opportunity>>, AppError> {
    auth.require("write")?;
    let kind = parse_kind(&kind)?;

    let opportunity = opportunities::update(&state.pool, kind, id, request).await?;

    Ok(Json(ApiResponse::with_message("Opportunity updated", opportunity)))
}

/// Status shortcut. Only Open -> Won | Lost passes the guard; anything
/// else is a 422.
pub async fn update_opportunity_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((kind, id)): Path<(String, Uuid)>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<ApiResponse<Opportunity>>, AppError> {
    auth.require("write")?;
    let kind = parse_kind(&kind)?;

    let opportunity = opportunities::update_status(&state.pool, kind, id, request.status).await?;

    Ok(Json(ApiResponse::with_message("Status updated", opportunity)))
}

/// Hard delete; returns the deleted document.
pub async fn delete_opportunity(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((kind, id)): Path<(String, Uuid)>,
) -> Result<Json<ApiResponse<Opportunity>>, AppError> {
    auth.require("write")?;
    let kind = parse_kind(&kind)?;

    let opportunity = opportunities::delete(&state.pool, kind, id).await?;

    Ok(Json(ApiResponse::with_message("Opportunity deleted", opportunity)))
}
