use std::sync::Arc;

use hydropack_common::config::{Config, MINIO_URL, MONGODB_URL, SANDBOX_URL};
use hydropack_common::error::Result;
use hydropack_common::fetch::Fetcher;
use hydropack_common::model::{ArtifactSpec, ExtractionMethod};
use tracing::info;

use crate::artifact::{check_reports, ensure_all};

/// The database, object store and sandbox executor shipped next to the app.
pub fn extra_artifacts(config: &Config) -> Vec<ArtifactSpec> {
    let dist = config.dist_dir();
    vec![
        ArtifactSpec::executable("minio", MINIO_URL, dist.join("minio")),
        ArtifactSpec::executable("sandbox", SANDBOX_URL, dist.join("sandbox")),
        ArtifactSpec::archive(
            "mongodb",
            MONGODB_URL,
            config.cache_dir().join("mongodb.tgz"),
            dist.join("mongodb"),
            ExtractionMethod::TarGzip,
        ),
    ]
}

/// Fetches every extra concurrently and reports all failures together.
pub async fn prepare_extras<F>(config: &Config, fetcher: Arc<F>) -> Result<()>
where
    F: Fetcher + ?Sized + 'static,
{
    info!("Downloading Extra Files...");
    let reports = ensure_all(extra_artifacts(config), fetcher).await;
    check_reports(reports)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn extras_have_unique_names_and_cache_paths() {
        let config = Config::with_root("/work");
        let specs = extra_artifacts(&config);
        let names: HashSet<_> = specs.iter().map(|s| s.name.as_str()).collect();
        let caches: HashSet<_> = specs.iter().map(|s| s.cache_destination.clone()).collect();
        assert_eq!(names.len(), specs.len());
        assert_eq!(caches.len(), specs.len());
    }

    #[test]
    fn binaries_are_marked_executable_in_dist() {
        let config = Config::with_root("/work");
        let specs = extra_artifacts(&config);
        let minio = specs.iter().find(|s| s.name == "minio").unwrap();
        assert_eq!(minio.extraction, ExtractionMethod::MarkExecutable);
        assert_eq!(minio.cache_destination, config.dist_dir().join("minio"));
        let mongodb = specs.iter().find(|s| s.name == "mongodb").unwrap();
        assert_eq!(mongodb.extraction, ExtractionMethod::TarGzip);
    }
}
