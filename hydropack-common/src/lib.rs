// hydropack-common/src/lib.rs
pub mod config;
pub mod error;
pub mod fetch;
pub mod model;

// Re-export key types
pub use config::Config;
pub use error::{FetchError, FetchStage, HydroError, Result};
pub use fetch::Fetcher;
pub use model::{ArtifactOutcome, ArtifactSpec, ExtractionMethod};
