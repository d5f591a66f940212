//! Opportunity service - CRUD shared by all five pipelines.
//!
//! One implementation parameterized by [`OpportunityKind`] replaces five
//! near-identical resources. Each function validates against the kind's
//! static field rules, performs the primary write, and appends an audit
//! activity describing what changed.
//!
//! List queries are built dynamically with `sqlx::QueryBuilder`: the same
//! filter clause feeds both the page query and the companion COUNT.
//! Detail-field names interpolated into JSONB path expressions come only
//! from the static kind specs, never from client input.

use crate::{
    db::DbPool,
    error::AppError,
    models::opportunity::{
        CreateOpportunityRequest, Opportunity, OpportunityFilter, OpportunityKind,
        OpportunityStatus, SORT_COLUMNS, UpdateOpportunityRequest, validate_details,
        validate_stage,
    },
    response::{PageParams, escape_like},
    services::audit,
};
use serde_json::{Map, Value, json};
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

/// Joined select used by every read path: lead and owner names ride
/// along with the row.
const SELECT_JOINED: &str = r#"
    SELECT o.id, o.kind, o.lead_id, o.owner_id, o.status, o.stage, o.details,
           o.created_at, o.updated_at,
           l.name AS lead_name, u.name AS owner_name
    FROM opportunities o
    LEFT JOIN leads l ON l.id = o.lead_id
    LEFT JOIN users u ON u.id = o.owner_id
"#;

/// Fetch one opportunity of the given kind, with referenced names.
pub async fn get(pool: &DbPool, kind: OpportunityKind, id: Uuid) -> Result<Opportunity, AppError> {
    let sql = format!("{SELECT_JOINED} WHERE o.id = $1 AND o.kind = $2");
    sqlx::query_as::<_, Opportunity>(&sql)
        .bind(id)
        .bind(kind.as_str())
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Opportunity"))
}

/// Create an opportunity.
///
/// Validates the referenced lead and owner, the stage (defaulting to the
/// kind's first stage), and the detail fields with all required-field
/// rules active. Status always starts Open.
pub async fn create(
    pool: &DbPool,
    kind: OpportunityKind,
    request: CreateOpportunityRequest,
) -> Result<Opportunity, AppError> {
    let lead_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM leads WHERE id = $1)")
        .bind(request.lead_id)
        .fetch_one(pool)
        .await?;
    if !lead_exists {
        return Err(AppError::NotFound("Lead"));
    }

    let owner_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
        .bind(request.owner_id)
        .fetch_one(pool)
        .await?;
    if !owner_exists {
        return Err(AppError::NotFound("User"));
    }

    let stage = match request.stage {
        Some(stage) if validate_stage(kind, &stage) => stage,
        Some(_) => {
            return Err(AppError::Validation(vec![format!(
                "stage must be one of: {}",
                kind.spec().stages.join(", ")
            )]));
        }
        None => kind.spec().stages[0].to_string(),
    };

    let details = request.details.unwrap_or_default();
    let errors = validate_details(kind, &details, true);
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO opportunities (kind, lead_id, owner_id, status, stage, details)
        VALUES ($1, $2, $3, 'Open', $4, $5)
        RETURNING id
        "#,
    )
    .bind(kind.as_str())
    .bind(request.lead_id)
    .bind(request.owner_id)
    .bind(&stage)
    .bind(Value::Object(details))
    .fetch_one(pool)
    .await?;

    let created = get(pool, kind, id).await?;
    audit::record(
        pool,
        Some(created.owner_id),
        &format!("{}_opportunity_created", kind.as_str()),
        format!(
            "{} opportunity created for lead {} (stage {})",
            kind.as_str(),
            created.lead_name.as_deref().unwrap_or("unknown"),
            created.stage
        ),
        Some(created.lead_id),
        Some(created.id),
        json!({ "stage": created.stage, "details": created.details }),
    )
    .await;

    Ok(created)
}

/// Push the WHERE clause shared by the page query and its COUNT twin.
fn push_filters(
    qb: &mut QueryBuilder<'_, Postgres>,
    kind: OpportunityKind,
    filter: &OpportunityFilter,
) {
    qb.push(" WHERE o.kind = ").push_bind(kind.as_str());

    if let Some(owner_id) = filter.owner_id {
        qb.push(" AND o.owner_id = ").push_bind(owner_id);
    }
    if let Some(lead_id) = filter.lead_id {
        qb.push(" AND o.lead_id = ").push_bind(lead_id);
    }
    if let Some(status) = &filter.status {
        qb.push(" AND o.status = ").push_bind(status.clone());
    }
    if let Some(stage) = &filter.stage {
        qb.push(" AND o.stage = ").push_bind(stage.clone());
    }
    if let Some(from) = filter.from {
        qb.push(" AND o.created_at >= ").push_bind(from);
    }
    if let Some(to) = filter.to {
        qb.push(" AND o.created_at <= ").push_bind(to);
    }
    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", escape_like(search.trim()));
        qb.push(" AND (l.name ILIKE ").push_bind(pattern.clone());
        // Searchable field names come from the static kind spec
        for field in kind.spec().searchable {
            qb.push(format!(" OR o.details->>'{field}' ILIKE "))
                .push_bind(pattern.clone());
        }
        qb.push(")");
    }
}

/// List opportunities of one kind: filter, search, sort, paginate.
///
/// Returns the page of rows plus the unpaginated total for the
/// pagination envelope.
pub async fn list(
    pool: &DbPool,
    kind: OpportunityKind,
    page: &PageParams,
    filter: &OpportunityFilter,
) -> Result<(Vec<Opportunity>, i64), AppError> {
    let mut count_qb = QueryBuilder::<Postgres>::new(
        "SELECT COUNT(*) FROM opportunities o LEFT JOIN leads l ON l.id = o.lead_id",
    );
    push_filters(&mut count_qb, kind, filter);
    let total: i64 = count_qb.build_query_scalar().fetch_one(pool).await?;

    let mut qb = QueryBuilder::<Postgres>::new(SELECT_JOINED);
    push_filters(&mut qb, kind, filter);
    qb.push(format!(
        " ORDER BY o.{} {} LIMIT ",
        page.sort_column(SORT_COLUMNS),
        page.sort_direction()
    ));
    qb.push_bind(page.limit());
    qb.push(" OFFSET ");
    qb.push_bind(page.offset());

    let rows = qb
        .build_query_as::<Opportunity>()
        .fetch_all(pool)
        .await?;

    Ok((rows, total))
}

/// Update an opportunity's owner, stage, and/or detail fields.
///
/// Incoming detail fields are merged over the stored document and the
/// merged result is re-validated with all rules active, so an update can
/// never leave a document the create path would have rejected. `id`,
/// `kind`, and `created_at` are untouchable.
pub async fn update(
    pool: &DbPool,
    kind: OpportunityKind,
    id: Uuid,
    request: UpdateOpportunityRequest,
) -> Result<Opportunity, AppError> {
    let existing = get(pool, kind, id).await?;

    if let Some(owner_id) = request.owner_id {
        let owner_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
                .bind(owner_id)
                .fetch_one(pool)
                .await?;
        if !owner_exists {
            return Err(AppError::NotFound("User"));
        }
    }

    let stage = match &request.stage {
        Some(stage) if validate_stage(kind, stage) => stage.clone(),
        Some(_) => {
            return Err(AppError::Validation(vec![format!(
                "stage must be one of: {}",
                kind.spec().stages.join(", ")
            )]));
        }
        None => existing.stage.clone(),
    };

    let mut merged: Map<String, Value> = existing
        .details
        .as_object()
        .cloned()
        .unwrap_or_default();
    if let Some(incoming) = request.details {
        for (field, value) in incoming {
            merged.insert(field, value);
        }
    }
    let errors = validate_details(kind, &merged, true);
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let owner_id = request.owner_id.unwrap_or(existing.owner_id);

    sqlx::query(
        r#"
        UPDATE opportunities
        SET owner_id = $1, stage = $2, details = $3, updated_at = NOW()
        WHERE id = $4 AND kind = $5
        "#,
    )
    .bind(owner_id)
    .bind(&stage)
    .bind(Value::Object(merged))
    .bind(id)
    .bind(kind.as_str())
    .execute(pool)
    .await?;

    let updated = get(pool, kind, id).await?;
    audit::record(
        pool,
        Some(updated.owner_id),
        &format!("{}_opportunity_updated", kind.as_str()),
        format!(
            "{} opportunity updated for lead {}",
            kind.as_str(),
            updated.lead_name.as_deref().unwrap_or("unknown")
        ),
        Some(updated.lead_id),
        Some(updated.id),
        json!({
            "before": { "owner_id": existing.owner_id, "stage": existing.stage, "details": existing.details },
            "after": { "owner_id": updated.owner_id, "stage": updated.stage, "details": updated.details },
        }),
    )
    .await;

    Ok(updated)
}

/// Status shortcut with the server-side transition guard.
///
/// Open -> Won and Open -> Lost are the only legal moves; Won and Lost
/// are terminal.
pub async fn update_status(
    pool: &DbPool,
    kind: OpportunityKind,
    id: Uuid,
    next: OpportunityStatus,
) -> Result<Opportunity, AppError> {
    let existing = get(pool, kind, id).await?;

    let current = OpportunityStatus::parse(&existing.status).ok_or_else(|| {
        // Status column carries a CHECK constraint, so this is unreachable
        // short of manual data edits.
        AppError::InvalidRequest(format!("stored status {} is unknown", existing.status))
    })?;

    if !current.can_transition_to(next) {
        return Err(AppError::InvalidTransition {
            from: current.as_str().to_string(),
            to: next.as_str().to_string(),
        });
    }

    sqlx::query("UPDATE opportunities SET status = $1, updated_at = NOW() WHERE id = $2")
        .bind(next.as_str())
        .bind(id)
        .execute(pool)
        .await?;

    let updated = get(pool, kind, id).await?;
    audit::record(
        pool,
        Some(updated.owner_id),
        &format!("{}_opportunity_status_changed", kind.as_str()),
        format!(
            "{} opportunity for lead {} marked {}",
            kind.as_str(),
            updated.lead_name.as_deref().unwrap_or("unknown"),
            updated.status
        ),
        Some(updated.lead_id),
        Some(updated.id),
        json!({ "from": existing.status, "to": updated.status }),
    )
    .await;

    Ok(updated)
}

/// Hard-delete an opportunity, recording a snapshot in the audit trail.
pub async fn delete(
    pool: &DbPool,
    kind: OpportunityKind,
    id: Uuid,
) -> Result<Opportunity, AppError> {
    let existing = get(pool, kind, id).await?;

    sqlx::query("DELETE FROM opportunities WHERE id = $1 AND kind = $2")
        .bind(id)
        .bind(kind.as_str())
        .execute(pool)
        .await?;

    audit::record(
        pool,
        Some(existing.owner_id),
        &format!("{}_opportunity_deleted", kind.as_str()),
        format!(
            "{} opportunity deleted for lead {}",
            kind.as_str(),
            existing.lead_name.as_deref().unwrap_or("unknown")
        ),
        Some(existing.lead_id),
        Some(existing.id),
        json!({
            "snapshot": {
                "owner_id": existing.owner_id,
                "status": existing.status,
                "stage": existing.stage,
                "details": existing.details,
            }
        }),
    )
    .await;

    Ok(existing)
}
