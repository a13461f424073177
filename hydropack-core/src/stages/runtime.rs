use hydropack_common::config::Config;
use hydropack_common::error::Result;
use hydropack_common::fetch::Fetcher;
use hydropack_common::model::{ArtifactSpec, ExtractionMethod};
use tracing::info;

use crate::artifact::ensure_artifact;

pub fn runtime_artifact(config: &Config) -> ArtifactSpec {
    ArtifactSpec::archive(
        "Node.js",
        config.runtime_url(),
        config.runtime_cache_path(),
        config.runtime_dir(),
        ExtractionMethod::TarXz,
    )
}

/// Downloads and unpacks the pinned Node.js runtime into dist.
pub async fn prepare_runtime<F>(config: &Config, fetcher: &F) -> Result<()>
where
    F: Fetcher + ?Sized,
{
    info!(
        "Downloading Node.js {} for linux on {}.",
        config.node_version,
        std::env::consts::ARCH
    );
    ensure_artifact(&runtime_artifact(config), fetcher).await?;
    Ok(())
}
