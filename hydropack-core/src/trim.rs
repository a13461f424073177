// hydropack-core/src/trim.rs
//! Deletes files that are useless in a shipped bundle (docs, sources, maps,
//! tests) from the dist tree.

use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use hydropack_common::error::{HydroError, Result};
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::fs;

/// Runtime leftovers removed from dist before trimming.
pub const RUNTIME_LEFTOVERS: &[&str] = &[
    "node/lib/node_modules/npm",
    "node/lib/node_modules/corepack",
    "node/bin/corepack",
    "node/bin/npm",
    "node/bin/npx",
    "node/share",
    "node/include",
];

/// Patterns matched against paths relative to dist.
pub const TRIM_PATTERNS: &[&str] = &[
    "**/{README,README.*,HISTORY,SECURITY,CHANGELOG,CONTRIBUTING}.md",
    "**/*.{styl,scss,bak,ts,d.ts,png,js.map,html,umd.js,gif,test.js}",
    "**/.{travis.yml,tsconfig.json,editorconfig}",
    "**/{Makefile,yarn.lock,package-lock.json,bower.json}",
    "**/.*{ignore,rc}",
    "**/.*rc.{yaml,js,yml,json}",
];

/// Directories removed together with everything below them.
pub const TRIM_DIR_PATTERNS: &[&str] = &[
    "**/.{github,vscode}",
    "**/{test,example,examples,coverage}",
];

/// Path fragments that are never trimmed: the application's own packages.
pub const PROTECTED_FRAGMENTS: &[&str] = &["/hydrooj/", "/@hydrooj/"];

/// Compiled trim rules.
///
/// Hidden entries (names starting with `.`) are only matched by patterns
/// whose last segment starts with a literal `.`, and hidden directories are
/// never descended into.
pub struct TrimMatcher {
    files: GlobSet,
    hidden_files: GlobSet,
    dirs: GlobSet,
    hidden_dirs: GlobSet,
}

fn is_hidden_pattern(pattern: &str) -> bool {
    pattern.rsplit('/').next().is_some_and(|leaf| leaf.starts_with('.'))
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

/// Splits `patterns` by whether they target hidden names and compiles both
/// halves.
fn build_sets(patterns: &[&str]) -> Result<(GlobSet, GlobSet)> {
    let mut plain = GlobSetBuilder::new();
    let mut hidden = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|e| HydroError::Pattern(pattern.to_string(), e.to_string()))?;
        if is_hidden_pattern(pattern) {
            hidden.add(glob);
        } else {
            plain.add(glob);
        }
    }
    let build = |builder: GlobSetBuilder| {
        builder
            .build()
            .map_err(|e| HydroError::Pattern(patterns.join(" "), e.to_string()))
    };
    Ok((build(plain)?, build(hidden)?))
}

impl TrimMatcher {
    pub fn new(file_patterns: &[&str], dir_patterns: &[&str]) -> Result<Self> {
        let (files, hidden_files) = build_sets(file_patterns)?;
        let (dirs, hidden_dirs) = build_sets(dir_patterns)?;
        Ok(Self {
            files,
            hidden_files,
            dirs,
            hidden_dirs,
        })
    }

    fn matches(&self, relative: &Path, hidden: bool, is_dir: bool) -> bool {
        let (files, dirs) = if hidden {
            (&self.hidden_files, &self.hidden_dirs)
        } else {
            (&self.files, &self.dirs)
        };
        files.is_match(relative) || (is_dir && dirs.is_match(relative))
    }

    /// Every path under `root` to delete, excluding protected application
    /// paths. A matched directory stands for its whole subtree.
    pub fn collect(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let mut matches = Vec::new();
        let mut walker = WalkDir::new(root)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();

        while let Some(entry) = walker.next() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable path during trim: {}", e);
                    continue;
                }
            };
            let is_dir = entry.file_type().is_dir();
            let hidden = is_hidden(&entry);
            let relative = entry
                .path()
                .strip_prefix(root)
                .map_err(|e| HydroError::Generic(e.to_string()))?;

            if is_protected(entry.path()) {
                debug!("Keeping protected path {}", entry.path().display());
            } else if self.matches(relative, hidden, is_dir) {
                matches.push(entry.path().to_path_buf());
                if is_dir {
                    walker.skip_current_dir();
                }
                continue;
            }
            if is_dir && hidden {
                walker.skip_current_dir();
            }
        }
        Ok(matches)
    }
}

fn is_protected(path: &Path) -> bool {
    let text = path.to_string_lossy();
    PROTECTED_FRAGMENTS.iter().any(|fragment| text.contains(fragment))
}

/// Removes every trimmable path from `dist`. Returns how many were removed.
pub fn trim_dist(dist: &Path) -> Result<usize> {
    for leftover in RUNTIME_LEFTOVERS {
        fs::remove_path(&dist.join(leftover))?;
    }

    let matcher = TrimMatcher::new(TRIM_PATTERNS, TRIM_DIR_PATTERNS)?;
    let matches = matcher.collect(dist)?;
    for path in &matches {
        fs::remove_path(path)?;
    }
    info!("Trimmed {} path(s) from {}", matches.len(), dist.display());
    Ok(matches.len())
}

#[cfg(test)]
mod tests {
    use std::fs as stdfs;

    use super::*;

    #[test]
    fn trim_removes_junk_but_keeps_app_packages() {
        let dir = tempfile::tempdir().unwrap();
        let dist = dir.path();
        let lib = dist.join("hydro/node_modules/left-pad");
        let app = dist.join("hydro/node_modules/hydrooj");
        stdfs::create_dir_all(lib.join("test")).unwrap();
        stdfs::create_dir_all(&app).unwrap();
        stdfs::write(lib.join("index.js"), "module.exports = 1").unwrap();
        stdfs::write(lib.join("README.md"), "docs").unwrap();
        stdfs::write(lib.join("index.d.ts"), "types").unwrap();
        stdfs::write(lib.join(".npmignore"), "x").unwrap();
        stdfs::write(lib.join("test/spec.js"), "x").unwrap();
        stdfs::write(app.join("README.md"), "kept").unwrap();
        stdfs::create_dir_all(dist.join("node/bin")).unwrap();
        stdfs::write(dist.join("node/bin/npm"), "npm").unwrap();
        stdfs::write(dist.join("node/bin/node"), "node").unwrap();

        let removed = trim_dist(dist).unwrap();

        assert!(removed >= 4);
        assert!(lib.join("index.js").exists());
        assert!(!lib.join("README.md").exists());
        assert!(!lib.join("index.d.ts").exists());
        assert!(!lib.join(".npmignore").exists());
        assert!(!lib.join("test/spec.js").exists());
        assert!(app.join("README.md").exists());
        assert!(!dist.join("node/bin/npm").exists());
        assert!(dist.join("node/bin/node").exists());
    }

    #[test]
    fn hidden_entries_need_a_dotted_pattern() {
        let dir = tempfile::tempdir().unwrap();
        let dist = dir.path();
        let modules = dist.join("hydro/node_modules");
        stdfs::create_dir_all(modules.join(".cache/x")).unwrap();
        stdfs::create_dir_all(modules.join("pkg/.github/workflows")).unwrap();
        stdfs::write(modules.join(".cache/x/a.ts"), "x").unwrap();
        stdfs::write(modules.join("pkg/.hidden.png"), "x").unwrap();
        stdfs::write(modules.join("pkg/logo.png"), "x").unwrap();
        stdfs::write(modules.join("pkg/.eslintrc.json"), "{}").unwrap();
        stdfs::write(modules.join("pkg/.github/workflows/ci.yml"), "x").unwrap();

        trim_dist(dist).unwrap();

        assert!(modules.join(".cache/x/a.ts").exists());
        assert!(modules.join("pkg/.hidden.png").exists());
        assert!(!modules.join("pkg/logo.png").exists());
        assert!(!modules.join("pkg/.eslintrc.json").exists());
        assert!(!modules.join("pkg/.github").exists());
    }

    #[test]
    fn alternation_patterns_match_every_branch() {
        let matcher = TrimMatcher::new(TRIM_PATTERNS, TRIM_DIR_PATTERNS).unwrap();
        assert!(matcher.matches(Path::new("a/README.md"), false, false));
        assert!(matcher.matches(Path::new("a/README.en.md"), false, false));
        assert!(matcher.matches(Path::new("lib/index.test.js"), false, false));
        assert!(matcher.matches(Path::new(".travis.yml"), true, false));
        assert!(!matcher.matches(Path::new("lib/index.js"), false, false));
        assert!(!matcher.matches(Path::new("lib/test"), false, false));
        assert!(matcher.matches(Path::new("lib/test"), false, true));
    }

    #[test]
    fn star_does_not_cross_directories() {
        let matcher = TrimMatcher::new(&["*.md"], &[]).unwrap();
        assert!(matcher.matches(Path::new("README.md"), false, false));
        assert!(!matcher.matches(Path::new("docs/README.md"), false, false));
    }
}
