// hydropack-net/src/lib.rs
pub mod http;
pub mod validation;

pub use http::{build_http_client, HttpFetcher};
pub use hydropack_common::error::{FetchError, HydroError, Result};
pub use validation::validate_url;
