use std::collections::HashMap;
use std::path::Path;

use hydropack_common::config::Config;
use hydropack_common::error::Result;
use serde_json::json;
use tracing::{debug, info};

use crate::fs;
use crate::process::run_command;

const FILE_MODE: u32 = 0o644;

/// Yarn invocations that populate the instance, run in order.
pub const INSTANCE_TASKS: &[&[&str]] = &[
    &["set", "version", "berry"],
    &["config", "set", "nodeLinker", "node-modules"],
    &["plugin", "import", "workspace-tools"],
    &["add", "hydrooj", "@hydrooj/ui-default", "@hydrooj/hydrojudge"],
    &["workspaces", "focus", "--production", "--all"],
];

pub fn instance_manifest() -> serde_json::Value {
    json!({
        "name": "hydro-install",
        "private": true,
        "version": "1.0.0",
        "license": "MIT",
        "workspaces": ["plugins/**"],
        "scripts": {
            "start": "hydrooj",
        },
    })
}

pub fn yarnrc(proxy: &str) -> String {
    format!("httpsProxy: \"{proxy}\"\n")
}

/// Writes `package.json`, an empty `yarn.lock` and, behind a proxy,
/// `.yarnrc.yml` into `dir`.
pub fn write_instance_files(dir: &Path, https_proxy: Option<&str>) -> Result<()> {
    fs::create_dir_all(dir)?;
    let manifest = serde_json::to_vec_pretty(&instance_manifest())?;
    fs::atomic_write_file(&dir.join("package.json"), &manifest, FILE_MODE)?;
    if let Some(proxy) = https_proxy {
        debug!("Writing proxy {} into .yarnrc.yml", proxy);
        fs::atomic_write_file(&dir.join(".yarnrc.yml"), yarnrc(proxy).as_bytes(), FILE_MODE)?;
    }
    fs::atomic_write_file(&dir.join("yarn.lock"), b"", FILE_MODE)?;
    Ok(())
}

/// PATH with the bundled runtime first, when it has been unpacked.
fn task_env(config: &Config) -> HashMap<String, String> {
    let mut envs = HashMap::new();
    let bin = config.runtime_bin_dir();
    if bin.is_dir() {
        let path = std::env::var("PATH").unwrap_or_default();
        envs.insert("PATH".to_string(), format!("{}:{}", bin.display(), path));
    }
    envs
}

/// Sets up the application workspace inside dist and installs it with yarn.
pub async fn create_instance(config: &Config) -> Result<()> {
    let dir = config.instance_dir();
    info!("Creating instance in {}", dir.display());
    write_instance_files(&dir, config.https_proxy.as_deref())?;

    let envs = task_env(config);
    for task in INSTANCE_TASKS {
        info!("yarn {}", task.join(" "));
        run_command("yarn", task, &dir, &envs, true).await?;
    }
    Ok(())
}
