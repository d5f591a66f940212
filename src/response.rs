//! Shared response envelopes and pagination helpers.
//!
//! Every endpoint responds with the same JSON shape:
//! - mutations: `{"status":"success","message":...,"data":...}`
//! - lists: `{"status":"success","data":[...],"pagination":{...}}`

use serde::{Deserialize, Serialize};

/// Success envelope for single-record responses.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: T,
}

impl<T> ApiResponse<T> {
    /// Plain success wrapper with no message.
    pub fn ok(data: T) -> Self {
        Self {
            status: "success",
            message: None,
            data,
        }
    }

    /// Success wrapper with a human-readable message.
    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            status: "success",
            message: Some(message.into()),
            data,
        }
    }
}

/// Success envelope for list responses.
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub status: &'static str,
    pub data: Vec<T>,
    pub pagination: Pagination,
}

impl<T> ListResponse<T> {
    pub fn new(data: Vec<T>, pagination: Pagination) -> Self {
        Self {
            status: "success",
            data,
            pagination,
        }
    }
}

/// Pagination block attached to every list response.
#[derive(Debug, Serialize, PartialEq)]
pub struct Pagination {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_items: i64,
    pub items_per_page: i64,
}

impl Pagination {
    /// Build a pagination block from the resolved page/limit and the
    /// total row count returned by the companion COUNT query.
    pub fn new(page: i64, limit: i64, total_items: i64) -> Self {
        Self {
            current_page: page,
            // ceil(total / limit); zero rows yield zero pages
            total_pages: (total_items + limit - 1) / limit,
            total_items,
            items_per_page: limit,
        }
    }
}

/// Escape LIKE/ILIKE metacharacters in a user-supplied search term so
/// `%` and `_` match literally instead of acting as wildcards.
pub fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Common query parameters accepted by every list endpoint.
///
/// Flattened into each resource's filter struct, e.g.
/// `GET /api/v1/leads?page=2&limit=25&sort_by=name&sort_order=asc`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct PageParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl PageParams {
    const DEFAULT_LIMIT: i64 = 10;
    const MAX_LIMIT: i64 = 100;

    /// Resolved page number (1-based).
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    /// Resolved page size, clamped to 1..=100.
    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }

    /// Row offset for the resolved page.
    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.limit()
    }

    /// Sort column, validated against the resource's whitelist.
    ///
    /// Unknown or missing columns fall back to `created_at`. Sorting is
    /// interpolated into SQL, so only whitelisted names are ever used.
    pub fn sort_column<'a>(&'a self, allowed: &[&'a str]) -> &'a str {
        match &self.sort_by {
            Some(requested) => allowed
                .iter()
                .find(|col| **col == requested.as_str())
                .copied()
                .unwrap_or("created_at"),
            None => "created_at",
        }
    }

    /// SQL sort direction; anything other than "asc" sorts descending.
    pub fn sort_direction(&self) -> &'static str {
        match self.sort_order.as_deref() {
            Some("asc") | Some("ASC") => "ASC",
            _ => "DESC",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_is_ceiling_of_items_over_limit() {
        assert_eq!(Pagination::new(1, 10, 0).total_pages, 0);
        assert_eq!(Pagination::new(1, 10, 1).total_pages, 1);
        assert_eq!(Pagination::new(1, 10, 10).total_pages, 1);
        assert_eq!(Pagination::new(1, 10, 11).total_pages, 2);
        assert_eq!(Pagination::new(1, 25, 100).total_pages, 4);
    }

    #[test]
    fn page_and_limit_defaults() {
        let params = PageParams::default();
        assert_eq!(params.page(), 1);
        assert_eq!(params.limit(), 10);
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn limit_is_clamped() {
        let params = PageParams {
            limit: Some(10_000),
            ..Default::default()
        };
        assert_eq!(params.limit(), 100);

        let params = PageParams {
            limit: Some(0),
            ..Default::default()
        };
        assert_eq!(params.limit(), 1);
    }

    #[test]
    fn offset_uses_resolved_page() {
        let params = PageParams {
            page: Some(3),
            limit: Some(25),
            ..Default::default()
        };
        assert_eq!(params.offset(), 50);
    }

    #[test]
    fn sort_column_rejects_unlisted_names() {
        let params = PageParams {
            sort_by: Some("name; DROP TABLE leads".into()),
            ..Default::default()
        };
        assert_eq!(params.sort_column(&["name", "created_at"]), "created_at");

        let params = PageParams {
            sort_by: Some("name".into()),
            ..Default::default()
        };
        assert_eq!(params.sort_column(&["name", "created_at"]), "name");
    }

    #[test]
    fn escape_like_neutralizes_wildcards() {
        assert_eq!(escape_like("plain search"), "plain search");
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
    }

    #[test]
    fn sort_direction_defaults_to_desc() {
        assert_eq!(PageParams::default().sort_direction(), "DESC");
        let params = PageParams {
            sort_order: Some("asc".into()),
            ..Default::default()
        };
        assert_eq!(params.sort_direction(), "ASC");
    }
}
