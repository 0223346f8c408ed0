pub mod blog_post;
pub mod option_fields;
pub mod submission;
pub mod token;
pub mod upload;

use serde::Serialize;

/// Page metadata returned alongside every list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
    pub has_more: bool,
}

impl Pagination {
    pub fn new(total: i64, limit: i64, offset: i64) -> Self {
        Pagination {
            total,
            limit,
            offset,
            has_more: offset + limit < total,
        }
    }
}
