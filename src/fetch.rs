// src/fetch.rs

//! Artifact fetching
//!
//! The install engine fetches through the [`Fetcher`] trait so the transport
//! is a seam: [`HttpFetcher`] is the real client, [`MirrorFetcher`] serves
//! artifacts from a local directory for offline installs and hermetic tests.
//!
//! Downloads always land in a `.tmp` sibling first and are renamed into
//! place, so a destination path never holds a partial file.

use crate::error::{Error, Result};
use indicatif::ProgressBar;
use reqwest::blocking::Client;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default timeout for HTTP requests (30 seconds)
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum retry attempts for transport-level download failures
const MAX_RETRIES: u32 = 3;

/// Retry delay in milliseconds
const RETRY_DELAY_MS: u64 = 1000;

/// Buffer size for streaming downloads (8 KB)
const STREAM_BUFFER_SIZE: usize = 8192;

/// Transport abstraction for fetching one artifact to a local path
pub trait Fetcher: Send + Sync {
    /// Fetch `url` into `dest`, reporting progress on `progress` if given.
    ///
    /// On success `dest` holds the complete artifact. On failure no file is
    /// left at `dest`.
    fn fetch(&self, url: &str, dest: &Path, progress: Option<&ProgressBar>) -> Result<()>;
}

/// Final path segment of a URL, used as the local artifact filename
pub fn filename_from_url(url: &str) -> Option<&str> {
    url.rsplit('/').next().filter(|s| !s.is_empty())
}

/// HTTP fetcher with bounded retry on transport errors
///
/// Non-success HTTP statuses are returned immediately: a 404 will not
/// become a 200 on retry. Only connection-level failures are retried.
pub struct HttpFetcher {
    client: Client,
    max_retries: u32,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::DownloadError(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            max_retries: MAX_RETRIES,
        })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str, dest: &Path, progress: Option<&ProgressBar>) -> Result<()> {
        info!("Downloading {} to {}", url, dest.display());

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::IoError(format!("failed to create directory {}: {e}", parent.display()))
            })?;
        }

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.client.get(url).send() {
                Ok(response) => {
                    if !response.status().is_success() {
                        return Err(Error::DownloadError(format!(
                            "HTTP {} from {}",
                            response.status(),
                            url
                        )));
                    }

                    let total_size = response.content_length().unwrap_or(0);

                    // Write to temporary file first
                    let temp_path = dest.with_extension("tmp");
                    let mut file = File::create(&temp_path).map_err(|e| {
                        Error::IoError(format!(
                            "failed to create file {}: {e}",
                            temp_path.display()
                        ))
                    })?;

                    let result =
                        stream_response_to_file(response, &mut file, total_size, progress);

                    let downloaded = match result {
                        Ok(n) => n,
                        Err(e) => {
                            let _ = fs::remove_file(&temp_path);
                            return Err(e);
                        }
                    };

                    // Atomic rename from temp to final destination
                    fs::rename(&temp_path, dest).map_err(|e| {
                        Error::IoError(format!(
                            "failed to move {} to {}: {e}",
                            temp_path.display(),
                            dest.display()
                        ))
                    })?;

                    debug!("Downloaded {} bytes to {}", downloaded, dest.display());
                    return Ok(());
                }
                Err(e) => {
                    if attempt >= self.max_retries {
                        return Err(Error::DownloadError(format!(
                            "failed to download {url} after {attempt} attempts: {e}"
                        )));
                    }
                    warn!("Download attempt {} failed: {}, retrying...", attempt, e);
                    std::thread::sleep(Duration::from_millis(RETRY_DELAY_MS * attempt as u64));
                }
            }
        }
    }
}

/// Stream an HTTP response body to a file, updating the progress bar
fn stream_response_to_file(
    mut response: reqwest::blocking::Response,
    file: &mut File,
    total_size: u64,
    progress: Option<&ProgressBar>,
) -> Result<u64> {
    if let Some(pb) = progress {
        if total_size > 0 {
            pb.set_length(total_size);
        }
    }

    let mut downloaded: u64 = 0;
    let mut buffer = [0u8; STREAM_BUFFER_SIZE];

    loop {
        let bytes_read = response
            .read(&mut buffer)
            .map_err(|e| Error::DownloadError(format!("failed to read response: {e}")))?;

        if bytes_read == 0 {
            break;
        }

        file.write_all(&buffer[..bytes_read])
            .map_err(|e| Error::IoError(format!("failed to write downloaded data: {e}")))?;

        downloaded += bytes_read as u64;

        if let Some(pb) = progress {
            pb.set_position(downloaded);
        }
    }

    Ok(downloaded)
}

/// Fetcher backed by a local mirror directory
///
/// Resolves a URL to `<root>/<final path segment>`. Used for air-gapped
/// installs from a pre-populated artifact directory.
pub struct MirrorFetcher {
    root: std::path::PathBuf,
}

impl MirrorFetcher {
    pub fn new(root: impl Into<std::path::PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Fetcher for MirrorFetcher {
    fn fetch(&self, url: &str, dest: &Path, progress: Option<&ProgressBar>) -> Result<()> {
        let filename = filename_from_url(url)
            .ok_or_else(|| Error::DownloadError(format!("no filename in URL: {url}")))?;
        let source = self.root.join(filename);

        if !source.exists() {
            return Err(Error::DownloadError(format!(
                "artifact not found in mirror: {}",
                source.display()
            )));
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::IoError(format!("failed to create directory {}: {e}", parent.display()))
            })?;
        }

        let copied = fs::copy(&source, dest).map_err(|e| {
            Error::IoError(format!(
                "failed to copy {} to {}: {e}",
                source.display(),
                dest.display()
            ))
        })?;

        if let Some(pb) = progress {
            pb.set_length(copied);
            pb.set_position(copied);
        }

        debug!("Copied {} bytes from mirror", copied);
        Ok(())
    }
}
