use hydropack_common::config::Config;
use hydropack_common::error::Result;
use tracing::info;

use crate::fs;

/// Removes the dist tree. The download cache survives.
pub fn clean(config: &Config) -> Result<()> {
    let dist = config.dist_dir();
    info!("Removing {}", dist.display());
    fs::remove_path(&dist)
}

/// Creates the fixed directory layout under the build root.
pub fn make_dirs(config: &Config) -> Result<()> {
    for dir in [
        config.cache_dir(),
        config.home_dir(),
        config.runtime_dir(),
        config.tmp_dir(),
        config.instance_dir(),
    ] {
        fs::create_dir_all(&dir)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn make_dirs_then_clean_keeps_cache() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::with_root(dir.path());

        make_dirs(&config).unwrap();
        assert!(config.cache_dir().is_dir());
        assert!(config.instance_dir().is_dir());
        assert!(config.home_dir().is_dir());

        clean(&config).unwrap();
        assert!(!config.dist_dir().exists());
        assert!(config.cache_dir().is_dir());
    }

    #[test]
    fn clean_without_dist_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        clean(&Config::with_root(dir.path())).unwrap();
    }
}
