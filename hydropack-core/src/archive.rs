// hydropack-core/src/archive.rs
use std::fs::File;
use std::io::{self, BufWriter};
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use hydropack_common::error::{HydroError, Result};
use tracing::{debug, info};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::fs;

const COMPRESSION_LEVEL: i64 = 9;

/// Sizes of the archive before and after a rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveSizes {
    pub old_bytes: u64,
    pub new_bytes: u64,
}

impl ArchiveSizes {
    pub fn summary(&self) -> String {
        let old = mib(self.old_bytes);
        let new = mib(self.new_bytes);
        if self.old_bytes == 0 {
            format!("Compressed size: {new:.3} MiB")
        } else {
            let ratio = self.new_bytes as f64 / self.old_bytes as f64 * 100.0;
            format!("Compressed size: {old:.3} -> {new:.3} MiB ({ratio:.1}%)")
        }
    }
}

fn mib(bytes: u64) -> f64 {
    bytes as f64 / 1024.0 / 1024.0
}

fn zip_err(e: zip::result::ZipError) -> HydroError {
    HydroError::Archive(e.to_string())
}

/// Replaces `archive_path` with a zip of `source_dir`. Entries are stored
/// under `prefix/`, keeping unix modes and symlinks.
pub fn create_zip(source_dir: &Path, archive_path: &Path, prefix: &str) -> Result<ArchiveSizes> {
    let old_bytes = fs::file_size_or_zero(archive_path);
    fs::remove_path(archive_path)?;

    debug!(
        "Archiving {} into {} under '{}/'",
        source_dir.display(),
        archive_path.display(),
        prefix
    );
    let file = File::create(archive_path).map_err(|e| {
        HydroError::IoError(format!(
            "Failed to create archive {}: {}",
            archive_path.display(),
            e
        ))
    })?;
    let mut writer = ZipWriter::new(BufWriter::new(file));
    let base = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(COMPRESSION_LEVEL))
        .large_file(true);

    for entry in WalkDir::new(source_dir).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(|e| HydroError::IoError(e.to_string()))?;
        let relative = entry
            .path()
            .strip_prefix(source_dir)
            .map_err(|e| HydroError::Generic(e.to_string()))?;
        let name = if relative.as_os_str().is_empty() {
            prefix.to_string()
        } else {
            format!("{}/{}", prefix, relative.to_string_lossy())
        };

        let metadata = entry.path().symlink_metadata()?;
        let options = with_mode(base, &metadata);
        let file_type = metadata.file_type();
        if file_type.is_symlink() {
            let target = std::fs::read_link(entry.path())?;
            writer
                .add_symlink(name, target.to_string_lossy(), options)
                .map_err(zip_err)?;
        } else if file_type.is_dir() {
            writer.add_directory(name, options).map_err(zip_err)?;
        } else {
            writer.start_file(name, options).map_err(zip_err)?;
            let mut input = File::open(entry.path())?;
            io::copy(&mut input, &mut writer)?;
        }
    }

    let mut inner = writer.finish().map_err(zip_err)?;
    io::Write::flush(&mut inner)?;

    let sizes = ArchiveSizes {
        old_bytes,
        new_bytes: fs::file_size_or_zero(archive_path),
    };
    info!("{}", sizes.summary());
    Ok(sizes)
}

#[cfg(unix)]
fn with_mode(options: SimpleFileOptions, metadata: &std::fs::Metadata) -> SimpleFileOptions {
    options.unix_permissions(metadata.permissions().mode() & 0o7777)
}

#[cfg(not(unix))]
fn with_mode(options: SimpleFileOptions, _metadata: &std::fs::Metadata) -> SimpleFileOptions {
    options
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_reports_ratio() {
        let sizes = ArchiveSizes {
            old_bytes: 2 * 1024 * 1024,
            new_bytes: 1024 * 1024,
        };
        assert_eq!(sizes.summary(), "Compressed size: 2.000 -> 1.000 MiB (50.0%)");
    }

    #[test]
    fn summary_without_previous_archive() {
        let sizes = ArchiveSizes {
            old_bytes: 0,
            new_bytes: 512 * 1024,
        };
        assert_eq!(sizes.summary(), "Compressed size: 0.500 MiB");
    }
}
