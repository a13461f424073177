// hydropack-core/src/launcher.rs
use std::path::{Path, PathBuf};

use hydropack_common::config::{INSTANCE_DIR_NAME, RUNTIME_DIR_NAME};
use hydropack_common::error::Result;
use tracing::info;

use crate::artifact::EXECUTABLE_MODE;
use crate::fs;

pub const LAUNCHER_FILE_NAME: &str = "hydro.sh";

/// First-run script shipped at the root of the bundle. It installs the
/// production dependencies of the instance with the bundled runtime and then
/// starts the application.
pub fn launcher_script() -> String {
    format!(
        r#"#!/bin/sh
set -e
BUNDLE_DIR="$(cd "$(dirname "$0")" && pwd)"
export PATH="$BUNDLE_DIR/{runtime}/bin:$PATH"
cd "$BUNDLE_DIR/{instance}"
echo "Hydro Setup Tool"
yarn workspaces focus --production --all
exec yarn start
"#,
        runtime = RUNTIME_DIR_NAME,
        instance = INSTANCE_DIR_NAME,
    )
}

/// Writes the launcher into `dist` with mode 0755.
pub fn write_launcher(dist: &Path) -> Result<PathBuf> {
    let path = dist.join(LAUNCHER_FILE_NAME);
    fs::atomic_write_file(&path, launcher_script().as_bytes(), EXECUTABLE_MODE)?;
    info!("Wrote launcher {}", path.display());
    Ok(path)
}
