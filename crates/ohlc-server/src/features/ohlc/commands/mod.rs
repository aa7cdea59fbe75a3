pub mod upload;

pub use upload::{UploadOhlcError, UploadOhlcResponse};
