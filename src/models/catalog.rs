//! Make / vehicle model / variant reference data.
//!
//! A strict three-level hierarchy: every vehicle model belongs to a make,
//! every variant belongs to a vehicle model. Deleting a parent leaves
//! children in place with a dangling reference; no cascade is performed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A make row (e.g. "Toyota").
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Make {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A vehicle model row (e.g. "Corolla"), child of a make.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct VehicleModel {
    pub id: Uuid,
    pub name: String,
    pub make_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A variant row (e.g. "Corolla Altis 1.8 VL"), child of a vehicle model.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Variant {
    pub id: Uuid,
    pub name: String,
    pub model_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create/update body for makes.
#[derive(Debug, Deserialize)]
pub struct MakeBody {
    pub name: String,
}

/// Create body for vehicle models.
#[derive(Debug, Deserialize)]
pub struct CreateModelRequest {
    pub name: String,
    pub make_id: Uuid,
}

/// Update body for vehicle models; the parent may be re-pointed.
#[derive(Debug, Deserialize)]
pub struct UpdateModelRequest {
    pub name: Option<String>,
    pub make_id: Option<Uuid>,
}

/// Create body for variants.
#[derive(Debug, Deserialize)]
pub struct CreateVariantRequest {
    pub name: String,
    pub model_id: Uuid,
}

/// Update body for variants.
#[derive(Debug, Deserialize)]
pub struct UpdateVariantRequest {
    pub name: Option<String>,
    pub model_id: Option<Uuid>,
}
