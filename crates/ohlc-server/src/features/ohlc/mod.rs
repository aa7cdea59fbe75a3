pub mod commands;
pub mod queries;
pub mod repository;
pub mod routes;

pub use commands::{UploadOhlcError, UploadOhlcResponse};
pub use queries::{ListOhlcError, ListOhlcQuery, ListOhlcResponse};
pub use repository::{OhlcPage, OhlcStore};
pub use routes::ohlc_routes;
