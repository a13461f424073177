use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use hydropack_common::error::{FetchError, HydroError, Result};
use hydropack_common::fetch::Fetcher;
use hydropack_common::model::ArtifactSpec;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, StatusCode};
use tokio::fs::{self, File as TokioFile};
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, warn};

use crate::validation::validate_url;

const DOWNLOAD_TIMEOUT_SECS: u64 = 1800;
const CONNECT_TIMEOUT_SECS: u64 = 30;
const USER_AGENT_STRING: &str = "hydropack (Rust; bundle builder)";

pub fn build_http_client() -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_STRING));
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    Client::builder()
        .timeout(Duration::from_secs(DOWNLOAD_TIMEOUT_SECS))
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .default_headers(headers)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(|e| HydroError::Generic(format!("Failed to build HTTP client: {e}")))
}

/// Streams artifacts over HTTPS into their cache destination.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    allow_http: bool,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        Ok(Self::with_client(build_http_client()?))
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            allow_http: false,
        }
    }

    /// Accept plain `http://` sources as well. Meant for local mirrors.
    pub fn allow_http(mut self, allow: bool) -> Self {
        self.allow_http = allow;
        self
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, spec: &ArtifactSpec, destination: &Path) -> std::result::Result<u64, FetchError> {
        let download_failed = |reason: String| FetchError::DownloadFailed {
            artifact: spec.name.clone(),
            url: spec.source_url.clone(),
            reason,
        };

        validate_url(&spec.source_url, self.allow_http).map_err(|e| download_failed(e.to_string()))?;

        debug!(
            "Downloading '{}' from {} to {}",
            spec.name,
            spec.source_url,
            destination.display()
        );
        download_to_path(&self.client, &spec.source_url, destination)
            .await
            .map_err(|e| {
                error!("Download failed for '{}': {}", spec.name, e);
                download_failed(e.to_string())
            })
    }
}

fn temp_path_for(final_path: &Path) -> PathBuf {
    let temp_filename = format!(
        ".{}.download",
        final_path.file_name().unwrap_or_default().to_string_lossy()
    );
    final_path.with_file_name(temp_filename)
}

/// Downloads `url` next to `final_path` and renames it into place once the
/// body is fully on disk. Returns the number of bytes written.
pub async fn download_to_path(client: &Client, url: &str, final_path: &Path) -> Result<u64> {
    let temp_path = temp_path_for(final_path);
    debug!("Downloading to temporary path: {}", temp_path.display());
    if fs::try_exists(&temp_path).await.unwrap_or(false) {
        if let Err(e) = fs::remove_file(&temp_path).await {
            warn!(
                "Could not remove existing temporary file {}: {}",
                temp_path.display(),
                e
            );
        }
    }

    let written = match stream_to_file(client, url, &temp_path).await {
        Ok(written) => written,
        Err(e) => {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e);
        }
    };

    fs::rename(&temp_path, final_path).await.map_err(|e| {
        HydroError::IoError(format!(
            "Failed to move temp file {} to {}: {}",
            temp_path.display(),
            final_path.display(),
            e
        ))
    })?;
    debug!(
        "Moved {} bytes to final location: {}",
        written,
        final_path.display()
    );
    Ok(written)
}

async fn stream_to_file(client: &Client, url: &str, temp_path: &Path) -> Result<u64> {
    let response = client.get(url).send().await.map_err(|e| {
        debug!("HTTP request failed for {url}: {e}");
        HydroError::Generic(format!("HTTP request failed for {url}: {e}"))
    })?;
    let status = response.status();
    debug!("Received HTTP status: {} for {}", status, url);

    if !status.is_success() {
        return Err(match status {
            StatusCode::NOT_FOUND => HydroError::Generic("Resource not found (404)".to_string()),
            StatusCode::FORBIDDEN => HydroError::Generic("Access forbidden (403)".to_string()),
            _ => HydroError::Generic(format!("HTTP error {status}")),
        });
    }

    let mut temp_file = TokioFile::create(temp_path).await.map_err(|e| {
        HydroError::IoError(format!(
            "Failed to create temp file {}: {}",
            temp_path.display(),
            e
        ))
    })?;

    let mut written: u64 = 0;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk
            .map_err(|e| HydroError::Generic(format!("Failed to read response body: {e}")))?;
        temp_file.write_all(&chunk).await.map_err(|e| {
            HydroError::IoError(format!(
                "Failed to write download stream to {}: {}",
                temp_path.display(),
                e
            ))
        })?;
        written += chunk.len() as u64;
    }

    temp_file.flush().await?;
    temp_file.sync_all().await?;
    drop(temp_file);
    debug!("Finished writing download stream to temp file.");
    Ok(written)
}
