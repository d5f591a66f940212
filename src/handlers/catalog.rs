//! Reference data HTTP handlers: makes, vehicle models, variants.
//!
//! - POST/GET /api/v1/makes, PUT/DELETE /api/v1/makes/{id}
//! - POST/GET /api/v1/vehicle-models, GET /api/v1/vehicle-models/make/{makeId},
//!   PUT/DELETE /api/v1/vehicle-models/{id}
//! - POST/GET /api/v1/variants, GET /api/v1/variants/model/{modelId},
//!   PUT/DELETE /api/v1/variants/{id}
//!
//! Names are not unique and parent deletes do not cascade; both are
//! deliberate carryovers from the previous system.

use crate::{
    AppState,
    error::AppError,
    middleware::api_auth::AuthContext,
    models::catalog::{
        CreateModelRequest, CreateVariantRequest, Make, MakeBody, UpdateModelRequest,
        UpdateVariantRequest, VehicleModel, Variant,
    },
    response::ApiResponse,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

fn require_name(name: &str) -> Result<&str, AppError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(vec!["name is required".to_string()]));
    }
    Ok(trimmed)
}

// ---- Makes ----

/// Create a make, e.g. `{"name": "Toyota"}` -> 201.
pub async fn create_make(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(body): Json<MakeBody>,
) -> Result<impl IntoResponse, AppError> {
    auth.require("write")?;
    let name = require_name(&body.name)?;

    let make = sqlx::query_as::<_, Make>("INSERT INTO makes (name) VALUES ($1) RETURNING *")
        .bind(name)
        .fetch_one(&state.pool)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("Make created", make)),
    ))
}

/// List all makes, alphabetically.
pub async fn list_makes(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<ApiResponse<Vec<Make>>>, AppError> {
    auth.require("read")?;

    let makes = sqlx::query_as::<_, Make>("SELECT * FROM makes ORDER BY name")
        .fetch_all(&state.pool)
        .await?;

    Ok(Json(ApiResponse::ok(makes)))
}

/// Rename a make; 404 on missing id.
pub async fn update_make(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(body): Json<MakeBody>,
) -> Result<Json<ApiResponse<Make>>, AppError> {
    auth.require("write")?;
    let name = require_name(&body.name)?;

    let make = sqlx::query_as::<_, Make>(
        "UPDATE makes SET name = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
    )
    .bind(name)
    .bind(id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or(AppError::NotFound("Make"))?;

    Ok(Json(ApiResponse::with_message("Make updated", make)))
}

/// Delete a make. Its vehicle models are left in place.
pub async fn delete_make(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Make>>, AppError> {
    auth.require("write")?;

    let make = sqlx::query_as::<_, Make>("DELETE FROM makes WHERE id = $1 RETURNING *")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or(AppError::NotFound("Make"))?;

    Ok(Json(ApiResponse::with_message("Make deleted", make)))
}

// ---- Vehicle models ----

/// Create a vehicle model under an existing make.
pub async fn create_model(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<CreateModelRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth.require("write")?;
    let name = require_name(&request.name)?;

    let make_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM makes WHERE id = $1)")
        .bind(request.make_id)
        .fetch_one(&state.pool)
        .await?;
    if !make_exists {
        return Err(AppError::NotFound("Make"));
    }

    let model = sqlx::query_as::<_, VehicleModel>(
        "INSERT INTO vehicle_models (name, make_id) VALUES ($1, $2) RETURNING *",
    )
    .bind(name)
    .bind(request.make_id)
    .fetch_one(&state.pool)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("Model created", model)),
    ))
}

/// List all vehicle models.
pub async fn list_models(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<ApiResponse<Vec<VehicleModel>>>, AppError> {
    auth.require("read")?;

    let models = sqlx::query_as::<_, VehicleModel>("SELECT * FROM vehicle_models ORDER BY name")
        .fetch_all(&state.pool)
        .await?;

    Ok(Json(ApiResponse::ok(models)))
}

/// List the vehicle models of one make.
pub async fn list_models_by_make(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(make_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<VehicleModel>>>, AppError> {
    auth.require("read")?;

    let models = sqlx::query_as::<_, VehicleModel>(
        "SELECT * FROM vehicle_models WHERE make_id = $1 ORDER BY name",
    )
    .bind(make_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(ApiResponse::ok(models)))
}

/// Update a vehicle model; the parent make may be re-pointed.
pub async fn update_model(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateModelRequest>,
) -> Result<Json<ApiResponse<VehicleModel>>, AppError> {
    auth.require("write")?;

    if let Some(make_id) = request.make_id {
        let make_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM makes WHERE id = $1)")
                .bind(make_id)
                .fetch_one(&state.pool)
                .await?;
        if !make_exists {
            return Err(AppError::NotFound("Make"));
        }
    }

    let model = sqlx::query_as::<_, VehicleModel>(
        r#"
        UPDATE vehicle_models
        SET name = COALESCE($1, name),
            make_id = COALESCE($2, make_id),
            updated_at = NOW()
        WHERE id = $3
        RETURNING *
        "#,
    )
    .bind(&request.name)
    .bind(request.make_id)
    .bind(id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or(AppError::NotFound("Model"))?;

    Ok(Json(ApiResponse::with_message("Model updated", model)))
}

/// Delete a vehicle model. Its variants are left in place.
pub async fn delete_model(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<VehicleModel>>, AppError> {
    auth.require("write")?;

    let model =
        sqlx::query_as::<_, VehicleModel>("DELETE FROM vehicle_models WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&state.pool)
            .await?
            .ok_or(AppError::NotFound("Model"))?;

    Ok(Json(ApiResponse::with_message("Model deleted", model)))
}

// ---- Variants ----

/// Create a variant under an existing vehicle model.
pub async fn create_variant(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<CreateVariantRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth.require("write")?;
    let name = require_name(&request.name)?;

    let model_exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM vehicle_models WHERE id = $1)")
            .bind(request.model_id)
            .fetch_one(&state.pool)
            .await?;
    if !model_exists {
        return Err(AppError::NotFound("Model"));
    }

    let variant = sqlx::query_as::<_, Variant>(
        "INSERT INTO variants (name, model_id) VALUES ($1, $2) RETURNING *",
    )
    .bind(name)
    .bind(request.model_id)
    .fetch_one(&state.pool)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("Variant created", variant)),
    ))
}

/// List all variants.
pub async fn list_variants(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<ApiResponse<Vec<Variant>>>, AppError> {
    auth.require("read")?;

    let variants = sqlx::query_as::<_, Variant>("SELECT * FROM variants ORDER BY name")
        .fetch_all(&state.pool)
        .await?;

    Ok(Json(ApiResponse::ok(variants)))
}

/// List the variants of one vehicle model.
pub async fn list_variants_by_model(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(model_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<Variant>>>, AppError> {
    auth.require("read")?;

    let variants =
        sqlx::query_as::<_, Variant>("SELECT * FROM variants WHERE model_id = $1 ORDER BY name")
            .bind(model_id)
            .fetch_all(&state.pool)
            .await?;

    Ok(Json(ApiResponse::ok(variants)))
}

/// Update a variant; the parent model may be re-pointed.
pub async fn update_variant(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateVariantRequest>,
) -> Result<Json<ApiResponse<Variant>>, AppError> {
    auth.require("write")?;

    if let Some(model_id) = request.model_id {
        let model_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM vehicle_models WHERE id = $1)")
                .bind(model_id)
                .fetch_one(&state.pool)
                .await?;
        if !model_exists {
            return Err(AppError::NotFound("Model"));
        }
    }

    let variant = sqlx::query_as::<_, Variant>(
        r#"
        UPDATE variants
        SET name = COALESCE($1, name),
            model_id = COALESCE($2, model_id),
            updated_at = NOW()
        WHERE id = $3
        RETURNING *
        "#,
    )
    .bind(&request.name)
    .bind(request.model_id)
    .bind(id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or(AppError::NotFound("Variant"))?;

    Ok(Json(ApiResponse::with_message("Variant updated", variant)))
}

/// Delete a variant.
pub async fn delete_variant(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Variant>>, AppError> {
    auth.require("write")?;

    let variant = sqlx::query_as::<_, Variant>("DELETE FROM variants WHERE id = $1 RETURNING *")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or(AppError::NotFound("Variant"))?;

    Ok(Json(ApiResponse::with_message("Variant deleted", variant)))
}
