// hydropack-common/src/model/artifact.rs
use std::fmt;
use std::path::{Path, PathBuf};

/// How a downloaded artifact is turned into its usable form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtractionMethod {
    /// Keep the downloaded file as-is.
    None,
    /// gzip-compressed tar, unpacked with the leading path component stripped.
    TarGzip,
    /// xz-compressed tar, unpacked with the leading path component stripped.
    TarXz,
    /// Set mode 0755 on the downloaded file in place.
    MarkExecutable,
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::None => "none",
            Self::TarGzip => "tar+gzip",
            Self::TarXz => "tar+xz",
            Self::MarkExecutable => "mark executable",
        };
        f.write_str(label)
    }
}

/// Static descriptor of one fetchable dependency.
///
/// `name` must be unique among the specs of one run and no two specs may share
/// a `cache_destination`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSpec {
    pub name: String,
    pub source_url: String,
    /// Where the raw downloaded bytes live.
    pub cache_destination: PathBuf,
    /// Where the archive is unpacked. Unused by `MarkExecutable`, which works
    /// on the cache file itself.
    pub materialize_destination: Option<PathBuf>,
    pub extraction: ExtractionMethod,
}

impl ArtifactSpec {
    /// A tar archive cached at `cache_destination` and unpacked into `target_dir`.
    pub fn archive(
        name: impl Into<String>,
        source_url: impl Into<String>,
        cache_destination: impl Into<PathBuf>,
        target_dir: impl Into<PathBuf>,
        extraction: ExtractionMethod,
    ) -> Self {
        Self {
            name: name.into(),
            source_url: source_url.into(),
            cache_destination: cache_destination.into(),
            materialize_destination: Some(target_dir.into()),
            extraction,
        }
    }

    /// A single binary downloaded to `path` and marked executable there.
    pub fn executable(
        name: impl Into<String>,
        source_url: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            source_url: source_url.into(),
            cache_destination: path.into(),
            materialize_destination: None,
            extraction: ExtractionMethod::MarkExecutable,
        }
    }

    /// A file that is only downloaded.
    pub fn download_only(
        name: impl Into<String>,
        source_url: impl Into<String>,
        cache_destination: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            source_url: source_url.into(),
            cache_destination: cache_destination.into(),
            materialize_destination: None,
            extraction: ExtractionMethod::None,
        }
    }

    /// The path whose presence means the artifact is ready.
    pub fn materialized_path(&self) -> Option<&Path> {
        match self.extraction {
            ExtractionMethod::None => None,
            ExtractionMethod::MarkExecutable => Some(self.cache_destination.as_path()),
            ExtractionMethod::TarGzip | ExtractionMethod::TarXz => {
                self.materialize_destination.as_deref()
            }
        }
    }
}

/// What a single `ensure_artifact` call actually did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArtifactOutcome {
    pub downloaded: bool,
    pub materialized: bool,
}

impl ArtifactOutcome {
    /// True when the call only performed existence checks.
    pub fn was_noop(&self) -> bool {
        !self.downloaded && !self.materialized
    }
}
