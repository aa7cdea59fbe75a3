//! Limit/offset pagination
//!
//! Query values arrive as raw strings so that junk (`limit=abc`, `offset=-5`)
//! falls back to a default instead of rejecting the request.
//!
//! # Examples
//!
//! ```rust,ignore
//! use ohlc_server::features::shared::pagination::{PageParams, PageMetadata};
//!
//! let params = PageParams::new(Some("10"), None);
//! assert_eq!(params.limit(), 10);
//! assert_eq!(params.offset(), 0);
//!
//! let meta = PageMetadata::new(params.limit(), params.offset(), 25);
//! assert!(meta.has_more);
//! ```

use serde::{Deserialize, Serialize};

pub const DEFAULT_LIMIT: i64 = 100;
pub const MAX_LIMIT: i64 = 1000;
pub const DEFAULT_OFFSET: i64 = 0;

/// Raw `limit` / `offset` query parameters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<String>,
}

impl PageParams {
    pub fn new(limit: Option<&str>, offset: Option<&str>) -> Self {
        Self {
            limit: limit.map(String::from),
            offset: offset.map(String::from),
        }
    }

    /// Page size in `1..=1000`; missing, unparsable or out of range gives 100.
    pub fn limit(&self) -> i64 {
        self.limit
            .as_deref()
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .filter(|limit| (1..=MAX_LIMIT).contains(limit))
            .unwrap_or(DEFAULT_LIMIT)
    }

    /// Rows to skip; missing, unparsable or negative gives 0.
    pub fn offset(&self) -> i64 {
        self.offset
            .as_deref()
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .filter(|offset| *offset >= 0)
            .unwrap_or(DEFAULT_OFFSET)
    }
}

/// Pagination fields of a list response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetadata {
    pub limit: i64,
    pub offset: i64,
    pub total_count: i64,
    pub has_more: bool,
}

impl PageMetadata {
    pub fn new(limit: i64, offset: i64, total_count: i64) -> Self {
        Self {
            limit,
            offset,
            total_count,
            has_more: offset.saturating_add(limit) < total_count,
        }
    }
}
