//! HTTP middleware components.
//!
//! Middleware runs before route handlers. It can authenticate requests,
//! inject context, or short-circuit unauthorized calls.

/// API key/secret authentication middleware
pub mod api_auth;
