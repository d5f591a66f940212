//! Business logic services.
//!
//! Services hold the logic shared across handlers: the audit-trail
//! writer, opportunity CRUD parameterized by kind, and the signed-token
//! scheme backing API-key validation.

pub mod audit;
pub mod opportunities;
pub mod token;
