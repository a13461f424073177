// hydropack-common/src/config.rs
use std::env;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::error::{HydroError, Result};

const DEFAULT_NODE_VERSION: &str = "18.20.4";
const DEFAULT_NODE_MIRROR: &str = "https://mirrors.tuna.tsinghua.edu.cn/nodejs-release";
const DEFAULT_ARCHIVE_NAME: &str = "Hydro.zip";

pub const MINIO_URL: &str = "https://dl.min.io/server/minio/release/linux-amd64/minio";
pub const SANDBOX_URL: &str =
    "https://github.com/criyle/go-judge/releases/download/v1.4.0/executorserver-amd64";
pub const MONGODB_URL: &str =
    "https://downloads.mongodb.org/linux/mongodb-linux-x86_64-ubuntu1804-v5.0-latest.tgz";

/// Name of the application instance directory inside dist.
pub const INSTANCE_DIR_NAME: &str = "hydro";
pub const RUNTIME_DIR_NAME: &str = "node";

#[derive(Debug, Clone)]
pub struct Config {
    pub root: PathBuf,
    pub node_version: String,
    pub node_mirror: String,
    pub https_proxy: Option<String>,
    pub archive_name: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        debug!("Loading hydropack configuration");

        let root = match env::var("HYDROPACK_ROOT").ok().filter(|s| !s.is_empty()) {
            Some(root) => PathBuf::from(root),
            None => env::current_dir().map_err(|e| {
                HydroError::Config(format!("Could not determine working directory: {e}"))
            })?,
        };
        debug!("Effective build root set to: {}", root.display());

        let node_version = env::var("HYDROPACK_NODE_VERSION")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_NODE_VERSION.to_string());
        let node_mirror = env::var("HYDROPACK_NODE_MIRROR")
            .ok()
            .filter(|s| !s.is_empty())
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_NODE_MIRROR.to_string());
        let https_proxy = env::var("HTTPS_PROXY")
            .or_else(|_| env::var("https_proxy"))
            .ok()
            .filter(|s| !s.is_empty());

        debug!("Configuration loaded successfully.");
        Ok(Self {
            root,
            node_version,
            node_mirror,
            https_proxy,
            archive_name: DEFAULT_ARCHIVE_NAME.to_string(),
        })
    }

    /// Config rooted at `root` with built-in defaults and no proxy.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            node_version: DEFAULT_NODE_VERSION.to_string(),
            node_mirror: DEFAULT_NODE_MIRROR.to_string(),
            https_proxy: None,
            archive_name: DEFAULT_ARCHIVE_NAME.to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Raw downloads, kept across `clean`.
    pub fn cache_dir(&self) -> PathBuf {
        self.root.join("node_modules").join(".cache")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.cache_dir().join("hydropack-logs")
    }

    /// The tree that becomes the distributable archive.
    pub fn dist_dir(&self) -> PathBuf {
        self.root.join("build")
    }

    pub fn instance_dir(&self) -> PathBuf {
        self.dist_dir().join(INSTANCE_DIR_NAME)
    }

    pub fn runtime_dir(&self) -> PathBuf {
        self.dist_dir().join(RUNTIME_DIR_NAME)
    }

    pub fn runtime_bin_dir(&self) -> PathBuf {
        self.runtime_dir().join("bin")
    }

    pub fn home_dir(&self) -> PathBuf {
        self.dist_dir().join("home")
    }

    pub fn tmp_dir(&self) -> PathBuf {
        self.dist_dir().join("tmp")
    }

    pub fn archive_path(&self) -> PathBuf {
        self.root.join(&self.archive_name)
    }

    pub fn runtime_cache_path(&self) -> PathBuf {
        self.cache_dir().join("node.tar.xz")
    }

    /// Directory name of the Node.js release, e.g. `node-v18.20.4-linux-x64`.
    pub fn runtime_folder_name(&self) -> String {
        format!(
            "node-v{}-linux-{}",
            self.node_version,
            node_arch(env::consts::ARCH)
        )
    }

    pub fn runtime_url(&self) -> String {
        format!(
            "{}/v{}/{}.tar.xz",
            self.node_mirror,
            self.node_version,
            self.runtime_folder_name()
        )
    }
}

/// Maps Rust's target arch names to the ones Node.js publishes under.
pub fn node_arch(rust_arch: &str) -> &str {
    match rust_arch {
        "x86_64" => "x64",
        "x86" => "x86",
        "aarch64" => "arm64",
        "arm" => "armv7l",
        "powerpc64" => "ppc64le",
        other => other,
    }
}
