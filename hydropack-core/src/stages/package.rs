use std::path::{Path, PathBuf};

use hydropack_common::config::{Config, INSTANCE_DIR_NAME};
use hydropack_common::error::{HydroError, Result};
use tracing::{debug, info};

use crate::archive::{create_zip, ArchiveSizes};
use crate::launcher::write_launcher;
use crate::{fs, trim};

/// Name of the dist tree inside the archive.
const ARCHIVE_PREFIX: &str = "build";

#[derive(Debug, Clone, Copy)]
pub struct PackageOptions {
    pub write_launcher: bool,
}

impl Default for PackageOptions {
    fn default() -> Self {
        Self {
            write_launcher: true,
        }
    }
}

/// First file in the instance's `.yarn/releases`, by name.
fn yarn_release(instance_dir: &Path) -> Result<String> {
    let releases = instance_dir.join(".yarn").join("releases");
    let mut names: Vec<String> = std::fs::read_dir(&releases)
        .map_err(|e| {
            HydroError::Generic(format!(
                "No yarn release found in {} ({e}). Run 'hydropack instance' first.",
                releases.display()
            ))
        })?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names.into_iter().next().ok_or_else(|| {
        HydroError::Generic(format!(
            "{} is empty. Run 'hydropack instance' first.",
            releases.display()
        ))
    })
}

/// Links `node/bin/yarn` to the instance's pinned yarn release unless a
/// `yarn` entry already exists there.
pub fn link_yarn_release(config: &Config) -> Result<PathBuf> {
    let link = config.runtime_bin_dir().join("yarn");
    if link.symlink_metadata().is_ok() {
        debug!("{} already exists, keeping it.", link.display());
        return Ok(link);
    }
    let release = yarn_release(&config.instance_dir())?;
    let target = Path::new("../..")
        .join(INSTANCE_DIR_NAME)
        .join(".yarn")
        .join("releases")
        .join(release);
    fs::create_dir_all(&config.runtime_bin_dir())?;
    fs::create_symlink(&target, &link)?;
    Ok(link)
}

/// Strips dist down to what ships, writes the launcher and rebuilds the
/// archive.
pub fn package(config: &Config, options: PackageOptions) -> Result<ArchiveSizes> {
    let dist = config.dist_dir();
    info!("Packaging {}", dist.display());

    trim::trim_dist(&dist)?;
    link_yarn_release(config)?;
    fs::empty_dir(&config.home_dir())?;
    fs::empty_dir(&config.tmp_dir())?;
    if options.write_launcher {
        write_launcher(&dist)?;
    }

    create_zip(&dist, &config.archive_path(), ARCHIVE_PREFIX)
}
