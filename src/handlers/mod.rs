//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (JSON body, URL params, query string)
//! 2. Checks the caller's permission and runs the database work
//! 3. Returns a JSON envelope or an `AppError`

/// Activity log endpoints
pub mod activities;
/// API key management and validation endpoints
pub mod api_keys;
/// Make / vehicle model / variant endpoints
pub mod catalog;
/// Health check endpoint
pub mod health;
/// Lead endpoints
pub mod leads;
/// Note endpoints
pub mod notes;
/// Opportunity endpoints, parameterized by kind
pub mod opportunities;
/// Read-only user endpoints
pub mod users;
