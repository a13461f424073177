// Path: hydropack-core/src/extract.rs
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use hydropack_common::error::{HydroError, Result};
use hydropack_common::model::ExtractionMethod;
use tar::{Archive, EntryType};
use tracing::{debug, error, warn};
use xz2::read::XzDecoder;

/// Unpacks a compressed tar archive into `target_dir`, dropping the first
/// `strip_components` path segments of every member. `target_dir` is created
/// when missing.
pub fn extract_archive(
    archive_path: &Path,
    target_dir: &Path,
    method: ExtractionMethod,
    strip_components: usize,
) -> Result<()> {
    debug!(
        "Extracting archive '{}' ({}) to '{}' (strip_components={})",
        archive_path.display(),
        method,
        target_dir.display(),
        strip_components
    );

    let file = File::open(archive_path).map_err(|e| {
        HydroError::IoError(format!(
            "Failed to open archive {}: {}",
            archive_path.display(),
            e
        ))
    })?;
    let reader = BufReader::new(file);

    fs::create_dir_all(target_dir).map_err(|e| {
        HydroError::IoError(format!(
            "Failed to create target directory {}: {}",
            target_dir.display(),
            e
        ))
    })?;

    match method {
        ExtractionMethod::TarGzip => extract_tar_archive(
            GzDecoder::new(reader),
            target_dir,
            strip_components,
            archive_path,
        ),
        ExtractionMethod::TarXz => extract_tar_archive(
            XzDecoder::new(reader),
            target_dir,
            strip_components,
            archive_path,
        ),
        ExtractionMethod::None | ExtractionMethod::MarkExecutable => Err(HydroError::Generic(
            format!(
                "'{}' is not an archive method (file {})",
                method,
                archive_path.display()
            ),
        )),
    }
}

/// Joins the stripped components of `path` onto `target_dir`.
///
/// `Ok(None)` means the entry vanished entirely through stripping.
fn stripped_target(
    path: &Path,
    target_dir: &Path,
    strip_components: usize,
) -> std::result::Result<Option<PathBuf>, String> {
    let mut out = target_dir.to_path_buf();
    let mut pushed = false;
    for comp in path.components().skip(strip_components) {
        match comp {
            Component::Normal(p) => {
                out.push(p);
                pushed = true;
            }
            Component::CurDir => {}
            Component::ParentDir => {
                return Err(format!("Unsafe '..' in TAR path {}", path.display()));
            }
            Component::Prefix(_) | Component::RootDir => {
                return Err(format!(
                    "Disallowed component {:?} in TAR path {}",
                    comp,
                    path.display()
                ));
            }
        }
    }
    Ok(pushed.then_some(out))
}

#[cfg(unix)]
struct DeferredHardLink {
    link_path: PathBuf,
    target_path: PathBuf,
}

fn extract_tar_archive<R: Read>(
    reader: R,
    target_dir: &Path,
    strip_components: usize,
    archive_path_for_log: &Path,
) -> Result<()> {
    let mut archive = Archive::new(reader);
    archive.set_preserve_permissions(true);
    archive.set_overwrite(true);

    #[cfg(unix)]
    let mut deferred_hardlinks: Vec<DeferredHardLink> = Vec::new();
    let mut errors: Vec<String> = Vec::new();

    let entries = archive.entries().map_err(|e| {
        HydroError::Generic(format!(
            "Failed to read TAR entries from {}: {}",
            archive_path_for_log.display(),
            e
        ))
    })?;

    for entry_result in entries {
        let mut entry = entry_result.map_err(|e| {
            HydroError::Generic(format!(
                "Error reading TAR entry from {}: {}",
                archive_path_for_log.display(),
                e
            ))
        })?;

        let original_path: PathBuf = entry
            .path()
            .map_err(|e| {
                HydroError::Generic(format!(
                    "Invalid path in TAR entry from {}: {}",
                    archive_path_for_log.display(),
                    e
                ))
            })?
            .into_owned();

        let final_path = match stripped_target(&original_path, target_dir, strip_components) {
            Ok(Some(p)) => p,
            Ok(None) => {
                debug!("Skipping entry due to strip_components: {:?}", original_path);
                continue;
            }
            Err(msg) => {
                error!("{}", msg);
                errors.push(msg);
                continue;
            }
        };

        if let Some(parent) = final_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    HydroError::IoError(format!(
                        "Failed create parent dir {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        #[cfg(unix)]
        if entry.header().entry_type() == EntryType::Link {
            let link_name = entry.link_name().ok().flatten().map(|l| l.into_owned());
            match link_name.map(|l| stripped_target(&l, target_dir, strip_components)) {
                Some(Ok(Some(target_path))) => {
                    deferred_hardlinks.push(DeferredHardLink {
                        link_path: final_path,
                        target_path,
                    });
                }
                _ => {
                    let msg = format!(
                        "Hardlink entry '{}' in {} has no usable link target.",
                        original_path.display(),
                        archive_path_for_log.display()
                    );
                    warn!("{}", msg);
                    errors.push(msg);
                }
            }
            continue;
        }

        if let Err(e) = entry.unpack(&final_path) {
            if e.kind() != io::ErrorKind::AlreadyExists {
                let msg = format!(
                    "Failed to unpack entry {:?} to {}: {}",
                    original_path,
                    final_path.display(),
                    e
                );
                error!("{}", msg);
                errors.push(msg);
            }
        }
    }

    #[cfg(unix)]
    for deferred in deferred_hardlinks {
        if deferred.link_path.exists() {
            let _ = fs::remove_file(&deferred.link_path);
        }
        if let Err(e) = fs::hard_link(&deferred.target_path, &deferred.link_path) {
            let msg = format!(
                "Failed to create hardlink {} -> {}: {}",
                deferred.link_path.display(),
                deferred.target_path.display(),
                e
            );
            error!("{}", msg);
            errors.push(msg);
        }
    }

    if errors.is_empty() {
        debug!(
            "Finished TAR extraction for {}",
            archive_path_for_log.display()
        );
        Ok(())
    } else {
        Err(HydroError::Generic(format!(
            "{} error(s) extracting {}: {}",
            errors.len(),
            archive_path_for_log.display(),
            errors.join("; ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_drops_leading_directory() {
        let target = Path::new("/dest");
        assert_eq!(
            stripped_target(Path::new("foo/bar.txt"), target, 1).unwrap(),
            Some(PathBuf::from("/dest/bar.txt"))
        );
        assert_eq!(stripped_target(Path::new("foo/"), target, 1).unwrap(), None);
        assert_eq!(
            stripped_target(Path::new("foo/a/b"), target, 1).unwrap(),
            Some(PathBuf::from("/dest/a/b"))
        );
    }

    #[test]
    fn parent_components_are_rejected() {
        assert!(stripped_target(Path::new("foo/../../etc/passwd"), Path::new("/dest"), 1).is_err());
    }
}
