use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

/// The half of the fetch-and-materialize pipeline an artifact failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStage {
    Download,
    Materialize,
}

impl fmt::Display for FetchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Download => f.write_str("download"),
            Self::Materialize => f.write_str("materialize"),
        }
    }
}

#[derive(Error, Debug, Clone)]
pub enum FetchError {
    #[error("Failed to download '{artifact}' from '{url}': {reason}")]
    DownloadFailed {
        artifact: String,
        url: String,
        reason: String,
    },

    #[error(
        "'{artifact}' was not found in the download cache at {}. Try 'hydropack clean' and fetch it again.",
        .path.display()
    )]
    MissingPrerequisite { artifact: String, path: PathBuf },

    #[error("Failed to extract '{artifact}' from {}: {reason}", .archive.display())]
    ExtractionFailed {
        artifact: String,
        archive: PathBuf,
        reason: String,
    },

    #[error("Failed to mark '{artifact}' executable at {}: {reason}", .path.display())]
    PermissionChangeFailed {
        artifact: String,
        path: PathBuf,
        reason: String,
    },
}

impl FetchError {
    pub fn artifact(&self) -> &str {
        match self {
            Self::DownloadFailed { artifact, .. }
            | Self::MissingPrerequisite { artifact, .. }
            | Self::ExtractionFailed { artifact, .. }
            | Self::PermissionChangeFailed { artifact, .. } => artifact,
        }
    }

    pub fn stage(&self) -> FetchStage {
        match self {
            Self::DownloadFailed { .. } => FetchStage::Download,
            Self::MissingPrerequisite { .. }
            | Self::ExtractionFailed { .. }
            | Self::PermissionChangeFailed { .. } => FetchStage::Materialize,
        }
    }
}

#[derive(Error, Debug, Clone)]
pub enum HydroError {
    #[error("I/O Error: {0}")]
    Io(#[from] Arc<std::io::Error>),

    #[error("JSON Error: {0}")]
    Json(#[from] Arc<serde_json::Error>),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("{} artifact(s) failed: {}", .0.len(), join_artifacts(.0))]
    Artifacts(Vec<FetchError>),

    #[error("Failed to execute command: {0}")]
    CommandExecError(String),

    #[error("Invalid glob pattern '{0}': {1}")]
    Pattern(String, String),

    #[error("Archive Error: {0}")]
    Archive(String),

    #[error("Validation Error: {0}")]
    ValidationError(String),

    #[error("IoError: {0}")]
    IoError(String),

    #[error("Generic Error: {0}")]
    Generic(String),
}

fn join_artifacts(errors: &[FetchError]) -> String {
    errors
        .iter()
        .map(|e| format!("{} ({})", e.artifact(), e.stage()))
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<std::io::Error> for HydroError {
    fn from(err: std::io::Error) -> Self {
        HydroError::Io(Arc::new(err))
    }
}

impl From<serde_json::Error> for HydroError {
    fn from(err: serde_json::Error) -> Self {
        HydroError::Json(Arc::new(err))
    }
}

pub type Result<T> = std::result::Result<T, HydroError>;
