//! Response envelopes and pagination.
//!
//! Every success body is `{success: true, data, pagination?}` and every
//! error body is `{success: false, error}` (see `error.rs`), so callers
//! branch on one stable shape.

use serde::Serialize;

use crate::config::schema::PaginationConfig;
use crate::error::ApiError;

/// Success envelope.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

impl<T: Serialize> Envelope<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
            pagination: None,
        }
    }

    pub fn paginated(data: T, pagination: Pagination) -> Self {
        Self {
            success: true,
            data,
            pagination: Some(pagination),
        }
    }
}

/// Pagination block returned by list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl Pagination {
    /// `limit` must be non-zero; `resolve_page` guarantees that.
    pub fn new(page: u64, limit: u64, total: u64) -> Self {
        Self {
            page,
            limit,
            total,
            total_pages: total.div_ceil(limit),
        }
    }
}

/// Validated page request.
#[derive(Debug, Clone, Copy)]
pub struct PageWindow {
    pub page: u64,
    pub limit: u64,
    pub offset: u64,
}

/// Validate raw `page`/`limit` query values against configured bounds.
///
/// `page` defaults to 1 and must be positive; `limit` defaults to the
/// configured page size and is capped at the configured maximum.
pub fn resolve_page(
    page: Option<i64>,
    limit: Option<i64>,
    config: &PaginationConfig,
) -> Result<PageWindow, ApiError> {
    let page = match page {
        None => 1,
        Some(p) if p >= 1 => p as u64,
        Some(_) => return Err(ApiError::Validation("page must be at least 1".into())),
    };
    let limit = match limit {
        None => config.default_limit,
        Some(l) if l >= 1 => (l as u64).min(config.max_limit),
        Some(_) => return Err(ApiError::Validation("limit must be at least 1".into())),
    };

    Ok(PageWindow {
        page,
        limit,
        offset: (page - 1) * limit,
    })
}
