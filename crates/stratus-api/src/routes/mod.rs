//! Route handlers.

pub mod auth;
pub mod entities;
pub mod tenants;

use serde::Deserialize;
use stratus_core::repository::Pagination;

/// Query-string pagination shared by list endpoints.
#[derive(Debug, Deserialize, Default)]
pub struct PageQuery {
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

impl From<PageQuery> for Pagination {
    fn from(query: PageQuery) -> Self {
        let defaults = Pagination::default();
        Pagination {
            offset: query.offset.unwrap_or(defaults.offset),
            limit: query.limit.unwrap_or(defaults.limit),
        }
    }
}
