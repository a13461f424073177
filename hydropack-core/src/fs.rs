/*
File: hydropack-core/src/fs.rs
Purpose: Primitive synchronous filesystem operations used by the build stages.
*/
use std::fs;
#[cfg(unix)]
use std::fs::Permissions;
use std::io::{self, Write};
#[cfg(unix)]
use std::os::unix::fs::{symlink, PermissionsExt};
use std::path::Path;
use std::sync::Arc;

use hydropack_common::error::{HydroError, Result};
use tempfile::NamedTempFile;
use tracing::{debug, error};
#[cfg(not(unix))]
use tracing::warn;

/// Creates a directory and all its parent components if they are missing.
pub fn create_dir_all(path: &Path) -> Result<()> {
    debug!("Creating directory recursively: {}", path.display());
    fs::create_dir_all(path).map_err(|e| {
        error!("Failed create dir {}: {}", path.display(), e);
        HydroError::from(e)
    })
}

/// Removes a file, symlink or directory tree. A missing path is not an error.
pub fn remove_path(path: &Path) -> Result<()> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };
    debug!("Removing: {}", path.display());
    let result = if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    match result {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => {
            error!("Failed remove {}: {}", path.display(), e);
            Err(e.into())
        }
    }
}

/// Ensures `path` is an existing, empty directory.
pub fn empty_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        return create_dir_all(path);
    }
    debug!("Emptying directory: {}", path.display());
    for entry in fs::read_dir(path)? {
        remove_path(&entry?.path())?;
    }
    Ok(())
}

/// True when `path` is a directory with at least one entry.
pub fn is_non_empty_dir(path: &Path) -> bool {
    match fs::read_dir(path) {
        Ok(mut entries) => entries.next().is_some(),
        Err(_) => false,
    }
}

/// True when owner, group and other may all execute `path`.
#[cfg(unix)]
pub fn is_executable(path: &Path) -> bool {
    fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 == 0o111)
        .unwrap_or(false)
}

#[cfg(not(unix))]
pub fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Sets file permissions (Unix only). Mode is standard Unix octal mode.
#[cfg(unix)]
pub fn set_permissions(path: &Path, mode: u32) -> Result<()> {
    debug!("Setting permissions on {}: {:o}", path.display(), mode);
    fs::set_permissions(path, Permissions::from_mode(mode)).map_err(|e| {
        error!("Failed set permissions on {}: {}", path.display(), e);
        HydroError::from(e)
    })
}

#[cfg(not(unix))]
pub fn set_permissions(path: &Path, _mode: u32) -> Result<()> {
    warn!(
        "Setting permissions not supported on this platform: {}",
        path.display()
    );
    Ok(())
}

/// Creates a symbolic link. Unix only.
#[cfg(unix)]
pub fn create_symlink(target: &Path, link: &Path) -> Result<()> {
    debug!("Creating symlink {} -> {}", link.display(), target.display());
    symlink(target, link).map_err(|e| {
        error!(
            "Failed create symlink {} -> {}: {}",
            link.display(),
            target.display(),
            e
        );
        HydroError::from(e)
    })
}

#[cfg(not(unix))]
pub fn create_symlink(target: &Path, link: &Path) -> Result<()> {
    warn!(
        "Symlink creation not supported on this platform: {} -> {}",
        link.display(),
        target.display()
    );
    Err(HydroError::Generic(
        "Symlinks not supported on this platform".to_string(),
    ))
}

/// Atomically writes data to a file using a temporary file in the same
/// directory, then applies `mode`.
pub fn atomic_write_file(path: &Path, content: &[u8], mode: u32) -> Result<()> {
    let dir = path.parent().ok_or_else(|| {
        HydroError::IoError(format!(
            "Cannot get parent directory for {}",
            path.display()
        ))
    })?;
    create_dir_all(dir)?;

    let mut temp_file = NamedTempFile::new_in(dir)?;
    debug!(
        "Atomically writing {} bytes to {} via temp file {}",
        content.len(),
        path.display(),
        temp_file.path().display()
    );
    temp_file.write_all(content)?;
    temp_file.flush()?;
    temp_file.as_file().sync_all()?;

    temp_file.persist(path).map_err(|e| {
        error!(
            "Failed to persist temporary file over {}: {}",
            path.display(),
            e.error
        );
        HydroError::Io(Arc::new(e.error))
    })?;

    set_permissions(path, mode)
}

/// Size of a file in bytes, or 0 when it does not exist.
pub fn file_size_or_zero(path: &Path) -> u64 {
    fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_dir_clears_nested_content() {
        let dir = tempfile::tempdir().unwrap();
        let home = dir.path().join("home");
        fs::create_dir_all(home.join("a/b")).unwrap();
        fs::write(home.join("a/b/c.txt"), "x").unwrap();
        fs::write(home.join("top.txt"), "y").unwrap();

        empty_dir(&home).unwrap();

        assert!(home.is_dir());
        assert!(!is_non_empty_dir(&home));
    }

    #[test]
    fn empty_dir_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let tmp = dir.path().join("tmp");
        empty_dir(&tmp).unwrap();
        assert!(tmp.is_dir());
    }

    #[test]
    fn remove_path_ignores_missing() {
        let dir = tempfile::tempdir().unwrap();
        remove_path(&dir.path().join("nope")).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn atomic_write_applies_mode() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("start.sh");
        atomic_write_file(&script, b"#!/bin/sh\n", 0o755).unwrap();
        assert!(is_executable(&script));
        assert_eq!(fs::read_to_string(&script).unwrap(), "#!/bin/sh\n");
    }
}
