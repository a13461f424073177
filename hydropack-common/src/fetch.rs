// hydropack-common/src/fetch.rs
use std::path::Path;

use async_trait::async_trait;

use crate::error::FetchError;
use crate::model::ArtifactSpec;

/// Transfers an artifact's source into a local file.
///
/// Implementations must stream rather than buffer, must not return before the
/// data is flushed, and on failure must leave nothing at `destination`.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, spec: &ArtifactSpec, destination: &Path) -> Result<u64, FetchError>;
}
