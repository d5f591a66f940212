//! Lead HTTP handlers.
//!
//! - POST /api/v1/leads - create a lead
//! - GET /api/v1/leads - list with search/filter/sort/pagination
//! - GET /api/v1/leads/export - CSV export of the current filter set
//! - GET /api/v1/leads/{id} - fetch one lead
//! - PUT /api/v1/leads/{id} - update
//! - DELETE /api/v1/leads/{id} - hard delete

use crate::{
    AppState,
    error::AppError,
    middleware::api_auth::AuthContext,
    models::lead::{CreateLeadRequest, Lead, LeadFilter, UpdateLeadRequest, validate_create},
    response::{ApiResponse, ListResponse, PageParams, Pagination, escape_like},
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

/// Columns lead list endpoints may sort by.
const SORT_COLUMNS: &[&str] = &["created_at", "updated_at", "name", "status", "city"];

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &LeadFilter) {
    qb.push(" WHERE TRUE");
    if let Some(status) = &filter.status {
        qb.push(" AND status = ").push_bind(status.clone());
    }
    if let Some(source) = &filter.source {
        qb.push(" AND source = ").push_bind(source.clone());
    }
    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", escape_like(search.trim()));
        qb.push(" AND (name ILIKE ").push_bind(pattern.clone());
        qb.push(" OR phone ILIKE ").push_bind(pattern.clone());
        qb.push(" OR email ILIKE ").push_bind(pattern.clone());
        qb.push(" OR city ILIKE ").push_bind(pattern);
        qb.push(")");
    }
}

/// Create a new lead.
///
/// # Response
///
/// - **201 Created** with the stored lead
/// - **400** when validation fails (field list in `errors`)
pub async fn create_lead(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<CreateLeadRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth.require("write")?;

    let errors = validate_create(&request);
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let lead = sqlx::query_as::<_, Lead>(
        r#"
        INSERT INTO leads (name, phone, email, city, source, status)
        VALUES ($1, $2, $3, $4, $5, COALESCE($6, 'New'))
        RETURNING *
        "#,
    )
    .bind(request.name.trim())
    .bind(&request.phone)
    .bind(&request.email)
    .bind(&request.city)
    .bind(&request.source)
    .bind(&request.status)
    .fetch_one(&state.pool)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("Lead created", lead)),
    ))
}

/// List leads with free-text search, exact filters, sorting, pagination.
pub async fn list_leads(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(page): Query<PageParams>,
    Query(filter): Query<LeadFilter>,
) -> Result<Json<ListResponse<Lead>>, AppError> {
    auth.require("read")?;

    let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM leads");
    push_filters(&mut count_qb, &filter);
    let total: i64 = count_qb.build_query_scalar().fetch_one(&state.pool).await?;

    let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM leads");
    push_filters(&mut qb, &filter);
    qb.push(format!(
        " ORDER BY {} {} LIMIT ",
        page.sort_column(SORT_COLUMNS),
        page.sort_direction()
    ));
    qb.push_bind(page.limit());
    qb.push(" OFFSET ");
    qb.push_bind(page.offset());

    let leads = qb.build_query_as::<Lead>().fetch_all(&state.pool).await?;

    Ok(Json(ListResponse::new(
        leads,
        Pagination::new(page.page(), page.limit(), total),
    )))
}

/// Export the current filter set as CSV.
///
/// Applies the same search/filter parameters as the list endpoint but
/// ignores pagination; the whole result set is streamed into one file.
pub async fn export_leads(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(filter): Query<LeadFilter>,
) -> Result<impl IntoResponse, AppError> {
    auth.require("read")?;

    let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM leads");
    push_filters(&mut qb, &filter);
    qb.push(" ORDER BY created_at DESC");
    let leads = qb.build_query_as::<Lead>().fetch_all(&state.pool).await?;

    let body = leads_to_csv(&leads)
        .map_err(|e| AppError::InvalidRequest(format!("CSV encoding failed: {e}")))?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"leads.csv\"",
            ),
        ],
        body,
    ))
}

/// Serialize leads into a CSV document with a header row.
fn leads_to_csv(leads: &[Lead]) -> Result<String, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "id", "name", "phone", "email", "city", "source", "status", "created_at",
    ])?;
    for lead in leads {
        writer.write_record([
            lead.id.to_string(),
            lead.name.clone(),
            lead.phone.clone().unwrap_or_default(),
            lead.email.clone().unwrap_or_default(),
            lead.city.clone().unwrap_or_default(),
            lead.source.clone().unwrap_or_default(),
            lead.status.clone(),
            lead.created_at.to_rfc3339(),
        ])?;
    }
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    // The writer only ever receives valid UTF-8
    Ok(String::from_utf8(bytes).unwrap_or_default())
}

/// Fetch one lead by id; 404 on miss.
pub async fn get_lead(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Lead>>, AppError> {
    auth.require("read")?;

    let lead = sqlx::query_as::<_, Lead>("SELECT * FROM leads WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or(AppError::NotFound("Lead"))?;

    Ok(Json(ApiResponse::ok(lead)))
}

/// Update a lead. `id` and `created_at` are not updatable; absent fields
/// keep their stored values.
pub async fn update_lead(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateLeadRequest>,
) -> Result<Json<ApiResponse<Lead>>, AppError> {
    auth.require("write")?;

    let lead = sqlx::query_as::<_, Lead>(
        r#"
        UPDATE leads
        SET name = COALESCE($1, name),
            phone = COALESCE($2, phone),
            email = COALESCE($3, email),
            city = COALESCE($4, city),
            source = COALESCE($5, source),
            status = COALESCE($6, status),
            updated_at = NOW()
        WHERE id = $7
        RETURNING *
        "#,
    )
    .bind(&request.name)
    .bind(&request.phone)
    .bind(&request.email)
    .bind(&request.city)
    .bind(&request.source)
    .bind(&request.status)
    .bind(id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or(AppError::NotFound("Lead"))?;

    Ok(Json(ApiResponse::with_message("Lead updated", lead)))
}

/// Hard-delete a lead. Opportunities and notes referencing it are left
/// in place (no cascade).
pub async fn delete_lead(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Lead>>, AppError> {
    auth.require("write")?;

    let lead = sqlx::query_as::<_, Lead>("DELETE FROM leads WHERE id = $1 RETURNING *")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or(AppError::NotFound("Lead"))?;

    Ok(Json(ApiResponse::with_message("Lead deleted", lead)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn csv_export_includes_header_and_rows() {
        let lead = Lead {
            id: Uuid::new_v4(),
            name: "Asha Verma".into(),
            phone: Some("+91 9876543210".into()),
            email: None,
            city: Some("Pune".into()),
            source: Some("Website".into()),
            status: "New".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let csv = leads_to_csv(&[lead.clone()]).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "id,name,phone,email,city,source,status,created_at"
        );
        let row = lines.next().unwrap();
        assert!(row.contains("Asha Verma"));
        assert!(row.contains(&lead.id.to_string()));
        assert!(lines.next().is_none());
    }

    #[test]
    fn csv_export_of_nothing_is_just_the_header() {
        let csv = leads_to_csv(&[]).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }
}
