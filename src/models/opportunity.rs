//! Opportunity data model shared by all five pipelines.
//!
//! The five opportunity types (buy, sell, finance, insurance, RTO) are
//! structurally identical: a lead reference, an owner, an Open/Won/Lost
//! status, a pipeline stage, and a bag of type-specific detail fields.
//! Rather than five duplicated resources, a single `opportunities` table
//! and handler set are parameterized by [`OpportunityKind`], whose static
//! [`KindSpec`] carries the per-type stage list and field rules.
//!
//! All detail validation runs server-side: required fields, enum
//! membership, numeric non-negativity, and cross-field requirements.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Which of the five pipelines an opportunity belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpportunityKind {
    Buy,
    Sell,
    Finance,
    Insurance,
    Rto,
}

impl OpportunityKind {
    /// Lowercase form used in URLs and the `kind` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
            Self::Finance => "finance",
            Self::Insurance => "insurance",
            Self::Rto => "rto",
        }
    }

    /// Parse a URL path segment; unknown kinds are a routing 404.
    pub fn parse(segment: &str) -> Option<Self> {
        match segment {
            "buy" => Some(Self::Buy),
            "sell" => Some(Self::Sell),
            "finance" => Some(Self::Finance),
            "insurance" => Some(Self::Insurance),
            "rto" => Some(Self::Rto),
            _ => None,
        }
    }

    /// Static field rules for this pipeline.
    pub fn spec(&self) -> &'static KindSpec {
        match self {
            Self::Buy => &BUY_SPEC,
            Self::Sell => &SELL_SPEC,
            Self::Finance => &FINANCE_SPEC,
            Self::Insurance => &INSURANCE_SPEC,
            Self::Rto => &RTO_SPEC,
        }
    }
}

/// Opportunity lifecycle status.
///
/// The only legal transitions are Open -> Won and Open -> Lost; both
/// targets are terminal. The guard runs server-side on every status
/// update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpportunityStatus {
    Open,
    Won,
    Lost,
}

impl OpportunityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::Won => "Won",
            Self::Lost => "Lost",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Open" => Some(Self::Open),
            "Won" => Some(Self::Won),
            "Lost" => Some(Self::Lost),
            _ => None,
        }
    }

    /// Whether a status change is legal.
    pub fn can_transition_to(&self, next: OpportunityStatus) -> bool {
        matches!(
            (self, next),
            (Self::Open, OpportunityStatus::Won) | (Self::Open, OpportunityStatus::Lost)
        )
    }
}

/// A cross-field requirement: when `when` equals `equals`, `then` must be
/// present and non-empty.
pub struct RequireIf {
    pub when: &'static str,
    pub equals: &'static str,
    pub then: &'static str,
}

/// Static description of one pipeline's stage list and detail-field rules.
pub struct KindSpec {
    /// Ordered stage names; the first is the create-time default
    pub stages: &'static [&'static str],
    /// Detail fields that must be present and non-empty on create
    pub required: &'static [&'static str],
    /// Detail fields restricted to a fixed value set
    pub enums: &'static [(&'static str, &'static [&'static str])],
    /// Detail fields that must be non-negative numbers when present
    pub numeric: &'static [&'static str],
    /// Detail fields included in free-text search
    pub searchable: &'static [&'static str],
    /// Cross-field requirements
    pub require_if: &'static [RequireIf],
}

static BUY_SPEC: KindSpec = KindSpec {
    stages: &[
        "Enquiry",
        "Inspection",
        "Valuation",
        "Negotiation",
        "Purchased",
    ],
    required: &["vehicle_make", "vehicle_model", "registration_number"],
    enums: &[
        ("ownership", &["First", "Second", "Third", "Fourth+"]),
        (
            "fuel_type",
            &["Petrol", "Diesel", "CNG", "Electric", "Hybrid"],
        ),
    ],
    numeric: &["expected_price", "quoted_price", "kilometers_driven"],
    searchable: &["vehicle_make", "vehicle_model", "registration_number"],
    require_if: &[],
};

static SELL_SPEC: KindSpec = KindSpec {
    stages: &["Enquiry", "TestDrive", "Negotiation", "Booking", "Delivered"],
    required: &["vehicle_make", "vehicle_model"],
    enums: &[
        ("finance_required", &["Yes", "No"]),
        ("exchange_vehicle", &["Yes", "No"]),
    ],
    numeric: &["asking_price", "booking_amount", "finance_amount"],
    searchable: &["vehicle_make", "vehicle_model", "variant"],
    require_if: &[RequireIf {
        when: "finance_required",
        equals: "Yes",
        then: "finance_amount",
    }],
};

static FINANCE_SPEC: KindSpec = KindSpec {
    stages: &[
        "Enquiry",
        "DocumentsCollected",
        "LoggedIn",
        "Approved",
        "Disbursed",
    ],
    required: &["bank_name", "loan_amount"],
    enums: &[
        ("loan_type", &["New", "Used", "Refinance"]),
        ("income_proof", &["Yes", "No"]),
    ],
    numeric: &["loan_amount", "down_payment", "tenure_months"],
    searchable: &["bank_name", "scheme"],
    require_if: &[],
};

static INSURANCE_SPEC: KindSpec = KindSpec {
    stages: &["Enquiry", "QuoteShared", "Proposal", "PolicyIssued"],
    required: &["insurer_name", "policy_type"],
    enums: &[
        ("policy_type", &["Comprehensive", "ThirdParty", "ZeroDep"]),
        ("previous_policy", &["Yes", "No"]),
    ],
    numeric: &["premium_amount", "idv"],
    searchable: &["insurer_name", "policy_number"],
    require_if: &[RequireIf {
        when: "previous_policy",
        equals: "Yes",
        then: "previous_insurer",
    }],
};

static RTO_SPEC: KindSpec = KindSpec {
    stages: &["Enquiry", "DocumentsCollected", "Submitted", "Completed"],
    required: &["work_type", "registration_number"],
    enums: &[(
        "work_type",
        &[
            "OwnershipTransfer",
            "Hypothecation",
            "NocIssue",
            "DuplicateRc",
            "AddressChange",
        ],
    )],
    numeric: &["government_fee", "agent_fee"],
    searchable: &["registration_number", "rto_office"],
    require_if: &[],
};

/// Columns list endpoints may sort by.
pub const SORT_COLUMNS: &[&str] = &["created_at", "updated_at", "status", "stage"];

fn is_present(value: Option<&Value>) -> bool {
    match value {
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Null) | None => false,
        Some(_) => true,
    }
}

/// Validate an opportunity's detail fields against its kind's rules.
///
/// `require_all` is set on create; updates validate only the fields they
/// carry (the merged document is re-checked by the service layer).
/// Returns the violated rules; empty means valid.
pub fn validate_details(kind: OpportunityKind, details: &Map<String, Value>, require_all: bool) -> Vec<String> {
    let spec = kind.spec();
    let mut errors = Vec::new();

    if require_all {
        for field in spec.required {
            if !is_present(details.get(*field)) {
                errors.push(format!("{field} is required"));
            }
        }
    }

    for (field, allowed) in spec.enums {
        if let Some(value) = details.get(*field) {
            match value.as_str() {
                Some(s) if allowed.contains(&s) => {}
                _ => errors.push(format!(
                    "{field} must be one of: {}",
                    allowed.join(", ")
                )),
            }
        }
    }

    for field in spec.numeric {
        if let Some(value) = details.get(*field) {
            match value.as_f64() {
                Some(n) if n >= 0.0 => {}
                _ => errors.push(format!("{field} must be a non-negative number")),
            }
        }
    }

    for rule in spec.require_if {
        let triggered = details.get(rule.when).and_then(Value::as_str) == Some(rule.equals);
        if triggered && !is_present(details.get(rule.then)) {
            errors.push(format!(
                "{} is required when {} is {}",
                rule.then, rule.when, rule.equals
            ));
        }
    }

    errors
}

/// Validate a stage name against the kind's stage list.
pub fn validate_stage(kind: OpportunityKind, stage: &str) -> bool {
    kind.spec().stages.contains(&stage)
}

/// An opportunity row joined with its lead and owner display names.
///
/// Every query selects through LEFT JOINs on `leads` and `users`, so the
/// referenced names ride along in list/get responses and activity content
/// without a second round trip.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Opportunity {
    pub id: Uuid,
    pub kind: String,
    pub lead_id: Uuid,
    pub owner_id: Uuid,
    pub status: String,
    pub stage: String,
    pub details: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub lead_name: Option<String>,
    pub owner_name: Option<String>,
}

/// Request body for `POST /api/v1/opportunities/{kind}`.
///
/// ```json
/// {
///   "lead_id": "550e8400-...",
///   "owner_id": "660e8400-...",
///   "stage": "Enquiry",
///   "details": {
///     "vehicle_make": "Toyota",
///     "vehicle_model": "Corolla",
///     "finance_required": "Yes",
///     "finance_amount": 650000
///   }
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct CreateOpportunityRequest {
    pub lead_id: Uuid,
    pub owner_id: Uuid,
    /// Defaults to the kind's first stage when omitted
    pub stage: Option<String>,
    pub details: Option<Map<String, Value>>,
}

/// Request body for `PUT /api/v1/opportunities/{kind}/{id}`.
///
/// `id`, `kind`, and `created_at` are not part of the type; payloads
/// carrying them have those fields ignored, never applied.
#[derive(Debug, Deserialize)]
pub struct UpdateOpportunityRequest {
    pub owner_id: Option<Uuid>,
    pub stage: Option<String>,
    /// Merged over the stored details, field by field
    pub details: Option<Map<String, Value>>,
}

/// Request body for the status shortcut endpoint.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OpportunityStatus,
}

/// Exact-match filters for opportunity list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct OpportunityFilter {
    /// Free-text search across the kind's searchable fields + lead name
    pub search: Option<String>,
    pub owner_id: Option<Uuid>,
    pub status: Option<String>,
    pub stage: Option<String>,
    pub lead_id: Option<Uuid>,
    /// Creation-time range, RFC 3339
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn details(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn kind_parses_url_segments() {
        assert_eq!(OpportunityKind::parse("buy"), Some(OpportunityKind::Buy));
        assert_eq!(OpportunityKind::parse("rto"), Some(OpportunityKind::Rto));
        assert_eq!(OpportunityKind::parse("lease"), None);
        assert_eq!(OpportunityKind::parse("Buy"), None);
    }

    #[test]
    fn only_open_transitions_to_won_or_lost() {
        use OpportunityStatus::*;
        assert!(Open.can_transition_to(Won));
        assert!(Open.can_transition_to(Lost));
        assert!(!Open.can_transition_to(Open));
        assert!(!Won.can_transition_to(Lost));
        assert!(!Won.can_transition_to(Open));
        assert!(!Lost.can_transition_to(Won));
    }

    #[test]
    fn create_requires_kind_fields() {
        let errors = validate_details(OpportunityKind::Buy, &Map::new(), true);
        assert!(errors.contains(&"vehicle_make is required".to_string()));
        assert!(errors.contains(&"registration_number is required".to_string()));
    }

    #[test]
    fn blank_strings_do_not_satisfy_required_fields() {
        let d = details(json!({
            "vehicle_make": "  ",
            "vehicle_model": "Corolla",
            "registration_number": "MH12AB1234"
        }));
        let errors = validate_details(OpportunityKind::Buy, &d, true);
        assert_eq!(errors, vec!["vehicle_make is required"]);
    }

    #[test]
    fn enum_fields_reject_unknown_values() {
        let d = details(json!({ "fuel_type": "Steam" }));
        let errors = validate_details(OpportunityKind::Buy, &d, false);
        assert_eq!(
            errors,
            vec!["fuel_type must be one of: Petrol, Diesel, CNG, Electric, Hybrid"]
        );
    }

    #[test]
    fn numeric_fields_reject_negatives_and_strings() {
        let d = details(json!({ "loan_amount": -1 }));
        let errors = validate_details(OpportunityKind::Finance, &d, false);
        assert_eq!(errors, vec!["loan_amount must be a non-negative number"]);

        let d = details(json!({ "loan_amount": "650000" }));
        let errors = validate_details(OpportunityKind::Finance, &d, false);
        assert_eq!(errors, vec!["loan_amount must be a non-negative number"]);
    }

    #[test]
    fn finance_amount_required_when_financed() {
        let d = details(json!({
            "vehicle_make": "Honda",
            "vehicle_model": "City",
            "finance_required": "Yes"
        }));
        let errors = validate_details(OpportunityKind::Sell, &d, true);
        assert_eq!(
            errors,
            vec!["finance_amount is required when finance_required is Yes"]
        );

        let d = details(json!({
            "vehicle_make": "Honda",
            "vehicle_model": "City",
            "finance_required": "No"
        }));
        assert!(validate_details(OpportunityKind::Sell, &d, true).is_empty());
    }

    #[test]
    fn stage_must_belong_to_the_kind() {
        assert!(validate_stage(OpportunityKind::Finance, "Disbursed"));
        assert!(!validate_stage(OpportunityKind::Finance, "TestDrive"));
        assert!(validate_stage(OpportunityKind::Rto, "Submitted"));
    }

    #[test]
    fn every_kind_has_a_default_stage() {
        for kind in [
            OpportunityKind::Buy,
            OpportunityKind::Sell,
            OpportunityKind::Finance,
            OpportunityKind::Insurance,
            OpportunityKind::Rto,
        ] {
            assert!(!kind.spec().stages.is_empty());
            assert!(validate_stage(kind, kind.spec().stages[0]));
        }
    }
}
