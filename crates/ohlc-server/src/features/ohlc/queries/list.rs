use serde::{Deserialize, Serialize};

use super::super::repository::OhlcStore;
use crate::db::DbError;
use crate::features::shared::pagination::{PageMetadata, PageParams};
use crate::models::OhlcRow;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListOhlcQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListOhlcResponse {
    pub data: Vec<OhlcRow>,
    #[serde(flatten)]
    pub page: PageMetadata,
}

#[derive(Debug, thiserror::Error)]
pub enum ListOhlcError {
    #[error("query failed")]
    Store(#[from] DbError),
}

impl ListOhlcQuery {
    /// Symbol filter; an empty value means no filter.
    fn symbol(&self) -> Option<&str> {
        self.symbol.as_deref().filter(|s| !s.is_empty())
    }

    fn page_params(&self) -> PageParams {
        PageParams::new(self.limit.as_deref(), self.offset.as_deref())
    }
}

#[tracing::instrument(skip(store))]
pub async fn handle(
    store: &dyn OhlcStore,
    query: ListOhlcQuery,
) -> Result<ListOhlcResponse, ListOhlcError> {
    let params = query.page_params();
    let (limit, offset) = (params.limit(), params.offset());

    let page = store.query_page(query.symbol(), limit, offset).await?;

    Ok(ListOhlcResponse {
        page: PageMetadata::new(limit, offset, page.total),
        data: page.rows,
    })
}
