//! Data models representing database entities.
//!
//! Each submodule pairs a database row struct (`sqlx::FromRow`) with the
//! typed request/response DTOs for its endpoints.

/// Append-only audit log entries
pub mod activity;
/// API key auth model
pub mod api_key;
/// Make / vehicle model / variant reference data
pub mod catalog;
/// Customer leads
pub mod lead;
/// Notes attached to leads
pub mod note;
/// Opportunity pipelines (buy/sell/finance/insurance/rto)
pub mod opportunity;
/// Owner / author user records
pub mod user;
