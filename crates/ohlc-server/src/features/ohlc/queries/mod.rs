pub mod list;

pub use list::{ListOhlcError, ListOhlcQuery, ListOhlcResponse};
