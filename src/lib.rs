//! Dealership CRM REST API.
//!
//! A REST/JSON backend for a vehicle dealership: customer leads, five
//! opportunity pipelines (buy, sell, finance, insurance, RTO), notes, an
//! append-only activity audit log, make/model/variant reference data,
//! and API-key machine authentication.
//!
//! # Architecture
//!
//! - **Web framework**: Axum (async HTTP server)
//! - **Database**: PostgreSQL with sqlx (async queries)
//! - **Authentication**: API key/secret header pair, SHA-256 digests
//!   compared in constant time
//! - **Format**: JSON requests/responses with a common envelope

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod response;
pub mod services;

use axum::{
    Router, middleware as axum_middleware,
    routing::{delete, get, patch, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Shared application state: the connection pool plus configuration.
#[derive(Clone)]
pub struct AppState {
    pub pool: db::DbPool,
    pub config: config::Config,
}

/// Build the full application router.
///
/// Everything under `/api/v1` except key validation sits behind the
/// API-key middleware; `/health` and `POST /api/v1/api-keys/validate`
/// are public.
pub fn app_router(state: AppState) -> Router {
    let authenticated_routes = Router::new()
        // Leads
        .route("/api/v1/leads", post(handlers::leads::create_lead))
        .route("/api/v1/leads", get(handlers::leads::list_leads))
        .route("/api/v1/leads/export", get(handlers::leads::export_leads))
        .route("/api/v1/leads/{id}", get(handlers::leads::get_lead))
        .route("/api/v1/leads/{id}", put(handlers::leads::update_lead))
        .route("/api/v1/leads/{id}", delete(handlers::leads::delete_lead))
        // Reference data: makes
        .route("/api/v1/makes", post(handlers::catalog::create_make))
        .route("/api/v1/makes", get(handlers::catalog::list_makes))
        .route("/api/v1/makes/{id}", put(handlers::catalog::update_make))
        .route("/api/v1/makes/{id}", delete(handlers::catalog::delete_make))
        // Reference data: vehicle models
        .route(
            "/api/v1/vehicle-models",
            post(handlers::catalog::create_model),
        )
        .route("/api/v1/vehicle-models", get(handlers::catalog::list_models))
        .route(
            "/api/v1/vehicle-models/make/{make_id}",
            get(handlers::catalog::list_models_by_make),
        )
        .route(
            "/api/v1/vehicle-models/{id}",
            put(handlers::catalog::update_model),
        )
        .route(
            "/api/v1/vehicle-models/{id}",
            delete(handlers::catalog::delete_model),
        )
        // Reference data: variants
        .route("/api/v1/variants", post(handlers::catalog::create_variant))
        .route("/api/v1/variants", get(handlers::catalog::list_variants))
        .route(
            "/api/v1/variants/model/{model_id}",
            get(handlers::catalog::list_variants_by_model),
        )
        .route(
            "/api/v1/variants/{id}",
            put(handlers::catalog::update_variant),
        )
        .route(
            "/api/v1/variants/{id}",
            delete(handlers::catalog::delete_variant),
        )
        // Opportunities, one handler set for all five kinds
        .route(
            "/api/v1/opportunities/{kind}",
            post(handlers::opportunities::create_opportunity),
        )
        .route(
            "/api/v1/opportunities/{kind}",
            get(handlers::opportunities::list_opportunities),
        )
        .route(
            "/api/v1/opportunities/{kind}/{id}",
            get(handlers::opportunities::get_opportunity),
        )
        .route(
            "/api/v1/opportunities/{kind}/{id}",
            put(handlers::opportunities::update_opportunity),
        )
        .route(
            "/api/v1/opportunities/{kind}/{id}/status",
            patch(handlers::opportunities::update_opportunity_status),
        )
        .route(
            "/api/v1/opportunities/{kind}/{id}",
            delete(handlers::opportunities::delete_opportunity),
        )
        // Notes
        .route("/api/v1/notes", post(handlers::notes::create_note))
        .route(
            "/api/v1/notes/lead/{lead_id}",
            get(handlers::notes::list_notes_by_lead),
        )
        .route("/api/v1/notes/{id}", get(handlers::notes::get_note))
        .route("/api/v1/notes/{id}", put(handlers::notes::update_note))
        .route("/api/v1/notes/{id}", delete(handlers::notes::delete_note))
        // Activity log (append + query only)
        .route(
            "/api/v1/activities",
            post(handlers::activities::create_activity),
        )
        .route(
            "/api/v1/activities",
            get(handlers::activities::list_activities),
        )
        .route(
            "/api/v1/activities/stats",
            get(handlers::activities::activity_stats),
        )
        // Users (read-only; rows are seeded out of band)
        .route("/api/v1/users", get(handlers::users::list_users))
        .route("/api/v1/users/{id}", get(handlers::users::get_user))
        // API key management
        .route("/api/v1/api-keys", post(handlers::api_keys::create_api_key))
        .route("/api/v1/api-keys", get(handlers::api_keys::list_api_keys))
        .route("/api/v1/api-keys/{id}", get(handlers::api_keys::get_api_key))
        .route(
            "/api/v1/api-keys/{id}",
            put(handlers::api_keys::update_api_key),
        )
        .route(
            "/api/v1/api-keys/{id}",
            delete(handlers::api_keys::delete_api_key),
        )
        // Apply authentication middleware to all routes in this group
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::api_auth::api_auth,
        ));

    Router::new()
        // Public routes (no authentication required)
        .route("/health", get(handlers::health::health_check))
        .route(
            "/api/v1/api-keys/validate",
            post(handlers::api_keys::validate_api_key),
        )
        .merge(authenticated_routes)
        // The React clients call these endpoints directly from the browser
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
