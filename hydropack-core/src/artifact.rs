// hydropack-core/src/artifact.rs
//! The fetch-and-materialize pipeline.
//!
//! Every artifact goes through the same two halves: a presence-checked
//! download into its cache destination, then an idempotent materialize step
//! chosen by its [`ExtractionMethod`]. Neither half validates content: an
//! existing cache file is trusted as complete, and an existing non-empty
//! materialize directory is never refreshed even if the cache file changes.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use hydropack_common::error::{FetchError, HydroError, Result};
use hydropack_common::fetch::Fetcher;
use hydropack_common::model::{ArtifactOutcome, ArtifactSpec, ExtractionMethod};
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::extract::extract_archive;
use crate::fs;

/// Mode given to binaries marked executable.
pub const EXECUTABLE_MODE: u32 = 0o755;

/// Archives are unpacked with their single top-level directory flattened away.
const STRIP_COMPONENTS: usize = 1;

/// Downloads (if needed) and materializes (if needed) one artifact.
pub async fn ensure_artifact<F>(
    spec: &ArtifactSpec,
    fetcher: &F,
) -> std::result::Result<ArtifactOutcome, FetchError>
where
    F: Fetcher + ?Sized,
{
    let downloaded = fetch_to_cache(spec, fetcher).await?;
    let materialized = materialize(spec).await?;
    if !downloaded && !materialized {
        debug!("'{}' already present, nothing to do.", spec.name);
    }
    Ok(ArtifactOutcome {
        downloaded,
        materialized,
    })
}

/// Downloads `spec` into its cache destination unless a regular file is
/// already there. Returns whether a transfer happened.
pub async fn fetch_to_cache<F>(
    spec: &ArtifactSpec,
    fetcher: &F,
) -> std::result::Result<bool, FetchError>
where
    F: Fetcher + ?Sized,
{
    info!("Checking {} temporary cache.", spec.name);
    if is_regular_file(&spec.cache_destination).await {
        info!("{} exists. Skipping download.", spec.name);
        info!(
            "If you want to re-download {}, delete {}.",
            spec.name,
            spec.cache_destination.display()
        );
        return Ok(false);
    }

    if let Some(parent) = spec.cache_destination.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| FetchError::DownloadFailed {
                artifact: spec.name.clone(),
                url: spec.source_url.clone(),
                reason: format!("Failed to create cache directory {}: {e}", parent.display()),
            })?;
    }

    info!("Now downloading {}.", spec.name);
    let bytes = fetcher.fetch(spec, &spec.cache_destination).await?;
    debug!(
        "Downloaded {} bytes for '{}' to {}",
        bytes,
        spec.name,
        spec.cache_destination.display()
    );
    Ok(true)
}

/// Turns the cached download into its usable form. Returns whether any work
/// was done; an already materialized artifact is left untouched.
pub async fn materialize(spec: &ArtifactSpec) -> std::result::Result<bool, FetchError> {
    let target = match (spec.extraction, spec.materialized_path()) {
        (ExtractionMethod::None, _) => return Ok(false),
        (_, Some(target)) => target.to_path_buf(),
        (_, None) => {
            return Err(FetchError::ExtractionFailed {
                artifact: spec.name.clone(),
                archive: spec.cache_destination.clone(),
                reason: "no materialize destination configured".to_string(),
            })
        }
    };

    if is_materialized(spec.extraction, target.clone()).await {
        match spec.extraction {
            ExtractionMethod::MarkExecutable => {
                info!("{} is already executable. Skipping.", spec.name)
            }
            _ => info!("{} exists. Skipping extract.", spec.name),
        }
        return Ok(false);
    }
    require_cached(spec).await?;

    match spec.extraction {
        ExtractionMethod::MarkExecutable => {
            let path = target.clone();
            run_blocking(move || fs::set_permissions(&path, EXECUTABLE_MODE))
                .await
                .map_err(|reason| FetchError::PermissionChangeFailed {
                    artifact: spec.name.clone(),
                    path: target,
                    reason,
                })?;
        }
        method => {
            info!("Now extracting {}.", spec.name);
            let archive = spec.cache_destination.clone();
            run_blocking(move || extract_archive(&archive, &target, method, STRIP_COMPONENTS))
                .await
                .map_err(|reason| FetchError::ExtractionFailed {
                    artifact: spec.name.clone(),
                    archive: spec.cache_destination.clone(),
                    reason,
                })?;
        }
    }
    Ok(true)
}

/// A non-empty target directory for archives, exec bits for binaries.
async fn is_materialized(method: ExtractionMethod, target: PathBuf) -> bool {
    tokio::task::spawn_blocking(move || match method {
        ExtractionMethod::MarkExecutable => fs::is_executable(&target),
        _ => fs::is_non_empty_dir(&target),
    })
    .await
    .unwrap_or(false)
}

/// Runs blocking filesystem work off the async workers.
async fn run_blocking<T, F>(work: F) -> std::result::Result<T, String>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| e.to_string())
        .and_then(|r| r.map_err(|e| e.to_string()))
}

async fn is_regular_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

async fn require_cached(spec: &ArtifactSpec) -> std::result::Result<(), FetchError> {
    if is_regular_file(&spec.cache_destination).await {
        return Ok(());
    }
    let err = FetchError::MissingPrerequisite {
        artifact: spec.name.clone(),
        path: spec.cache_destination.clone(),
    };
    error!("{}", err);
    Err(err)
}

/// Result of one artifact in a concurrent batch.
#[derive(Debug)]
pub struct ArtifactReport {
    pub name: String,
    pub result: std::result::Result<ArtifactOutcome, FetchError>,
}

/// Runs `ensure_artifact` for every spec concurrently and waits for all of
/// them. Reports come back in the order of `specs`; one failure never cancels
/// the others.
pub async fn ensure_all<F>(specs: Vec<ArtifactSpec>, fetcher: Arc<F>) -> Vec<ArtifactReport>
where
    F: Fetcher + ?Sized + 'static,
{
    let mut tasks = JoinSet::new();
    let mut reports: Vec<Option<ArtifactReport>> = specs.iter().map(|_| None).collect();

    for (index, spec) in specs.into_iter().enumerate() {
        let task_fetcher = Arc::clone(&fetcher);
        tasks.spawn(async move {
            let result = ensure_artifact(&spec, task_fetcher.as_ref()).await;
            (
                index,
                ArtifactReport {
                    name: spec.name,
                    result,
                },
            )
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, report)) => reports[index] = Some(report),
            Err(join_error) => {
                if join_error.is_panic() {
                    let message = panic_message(join_error.into_panic());
                    error!("Artifact task panicked: {}", message);
                    std::panic::resume_unwind(Box::new(message));
                }
                error!("Artifact task was cancelled: {}", join_error);
            }
        }
    }

    reports.into_iter().flatten().collect()
}

/// Logs every failed report and folds them into one error.
pub fn check_reports(reports: Vec<ArtifactReport>) -> Result<()> {
    let failures: Vec<FetchError> = reports
        .into_iter()
        .filter_map(|report| match report.result {
            Ok(outcome) => {
                debug!("'{}' ready ({:?})", report.name, outcome);
                None
            }
            Err(e) => {
                error!("{} failed during {}: {}", report.name, e.stage(), e);
                Some(e)
            }
        })
        .collect();

    if failures.is_empty() {
        Ok(())
    } else {
        Err(HydroError::Artifacts(failures))
    }
}

fn panic_message(e: Box<dyn std::any::Any + Send>) -> String {
    match e.downcast_ref::<&'static str>() {
        Some(s) => (*s).to_string(),
        None => match e.downcast_ref::<String>() {
            Some(s) => s.clone(),
            None => "Unknown panic payload".to_string(),
        },
    }
}
