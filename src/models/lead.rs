//! Lead data model and API request/response types.
//!
//! A lead is the central customer record; every opportunity, note, and
//! most activity entries reference one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A lead row from the `leads` table.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Lead {
    pub id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub city: Option<String>,
    /// Where the lead came from (walk-in, website, referral, ...)
    pub source: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for `POST /api/v1/leads`.
///
/// ```json
/// {
///   "name": "Asha Verma",
///   "phone": "+91-9876543210",
///   "email": "asha@example.com",
///   "city": "Pune",
///   "source": "Website"
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct CreateLeadRequest {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub city: Option<String>,
    pub source: Option<String>,
    /// Defaults to "New" when omitted
    pub status: Option<String>,
}

/// Request body for `PUT /api/v1/leads/{id}`.
///
/// Only the listed fields are updatable; `id` and `created_at` are not
/// part of the type, so they can never be overwritten by a payload.
#[derive(Debug, Deserialize)]
pub struct UpdateLeadRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub city: Option<String>,
    pub source: Option<String>,
    pub status: Option<String>,
}

/// Exact-match filters for `GET /api/v1/leads`.
#[derive(Debug, Default, Deserialize)]
pub struct LeadFilter {
    /// Free-text search across name/phone/email/city
    pub search: Option<String>,
    pub status: Option<String>,
    pub source: Option<String>,
}

/// Field-level validation for lead create payloads.
///
/// Returns the list of violated rules; empty means the payload is valid.
pub fn validate_create(request: &CreateLeadRequest) -> Vec<String> {
    let mut errors = Vec::new();

    if request.name.trim().is_empty() {
        errors.push("name is required".to_string());
    }
    if let Some(phone) = &request.phone {
        // Digits plus common separators; real normalization is a client concern
        if !phone
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'))
        {
            errors.push("phone contains invalid characters".to_string());
        }
    }
    if let Some(email) = &request.email
        && !email.contains('@')
    {
        errors.push("email is malformed".to_string());
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str) -> CreateLeadRequest {
        CreateLeadRequest {
            name: name.to_string(),
            phone: None,
            email: None,
            city: None,
            source: None,
            status: None,
        }
    }

    #[test]
    fn name_is_required() {
        assert_eq!(validate_create(&request("  ")), vec!["name is required"]);
        assert!(validate_create(&request("Asha")).is_empty());
    }

    #[test]
    fn phone_rejects_letters() {
        let mut req = request("Asha");
        req.phone = Some("call-me-maybe".to_string());
        assert_eq!(
            validate_create(&req),
            vec!["phone contains invalid characters"]
        );

        req.phone = Some("+91 (20) 555-0101".to_string());
        assert!(validate_create(&req).is_empty());
    }

    #[test]
    fn email_must_contain_at_sign() {
        let mut req = request("Asha");
        req.email = Some("not-an-email".to_string());
        assert_eq!(validate_create(&req), vec!["email is malformed"]);
    }
}
