#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use flate2::write::GzEncoder;
use flate2::Compression;
use hydropack_common::{ArtifactSpec, FetchError, Fetcher};
use xz2::write::XzEncoder;

/// Serves canned payloads by artifact name and counts every call.
#[derive(Default)]
pub struct CountingFetcher {
    payloads: HashMap<String, Vec<u8>>,
    failing: HashSet<String>,
    calls: AtomicUsize,
    /// Report success without writing anything.
    silent: bool,
}

impl CountingFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_payload(mut self, name: &str, bytes: Vec<u8>) -> Self {
        self.payloads.insert(name.to_string(), bytes);
        self
    }

    pub fn failing_for(mut self, name: &str) -> Self {
        self.failing.insert(name.to_string());
        self
    }

    pub fn silent(mut self) -> Self {
        self.silent = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for CountingFetcher {
    async fn fetch(&self, spec: &ArtifactSpec, destination: &Path) -> Result<u64, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(&spec.name) {
            return Err(FetchError::DownloadFailed {
                artifact: spec.name.clone(),
                url: spec.source_url.clone(),
                reason: "connection refused".to_string(),
            });
        }
        if self.silent {
            return Ok(0);
        }
        let bytes = self.payloads.get(&spec.name).cloned().unwrap_or_default();
        std::fs::write(destination, &bytes).map_err(|e| FetchError::DownloadFailed {
            artifact: spec.name.clone(),
            url: spec.source_url.clone(),
            reason: e.to_string(),
        })?;
        Ok(bytes.len() as u64)
    }
}

/// A tar whose only top-level entry is `foo/` holding `files`.
pub fn tar_with_root(files: &[(&str, &str)]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());

    let mut dir = tar::Header::new_gnu();
    dir.set_entry_type(tar::EntryType::Directory);
    dir.set_mode(0o755);
    dir.set_size(0);
    dir.set_cksum();
    builder.append_data(&mut dir, "foo/", std::io::empty()).unwrap();

    for (name, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_mode(0o644);
        header.set_size(content.len() as u64);
        header.set_cksum();
        builder
            .append_data(&mut header, format!("foo/{name}"), content.as_bytes())
            .unwrap();
    }
    builder.into_inner().unwrap()
}

pub fn gzip(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).unwrap();
    encoder.finish().unwrap()
}

pub fn xz(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = XzEncoder::new(Vec::new(), 6);
    encoder.write_all(bytes).unwrap();
    encoder.finish().unwrap()
}
