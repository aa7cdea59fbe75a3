//! Read side of the OHLC store

use async_trait::async_trait;

use crate::db::DbResult;
use crate::models::OhlcRow;

/// One page of stored rows plus the size of the whole filtered set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OhlcPage {
    pub rows: Vec<OhlcRow>,
    pub total: i64,
}

/// Queryable store of market bars
#[async_trait]
pub trait OhlcStore: Send + Sync {
    /// Rows matching `symbol` (all rows when `None`), ordered by timestamp
    /// then id, skipping `offset` and returning at most `limit`.
    async fn query_page(&self, symbol: Option<&str>, limit: i64, offset: i64) -> DbResult<OhlcPage>;

    /// Cheap liveness probe.
    async fn ping(&self) -> DbResult<()>;
}
