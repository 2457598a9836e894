//! HTTP client wrapper with throttle-aware retry.
//!
//! This module provides the `HttpClient` struct used for both search queries
//! and PDF downloads. Throttling responses are waited out according to the
//! client's [`ThrottlePolicy`]; every other failure is returned immediately.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use super::error::FetchError;
use super::filename::PART_SUFFIX;
use super::retry::{ThrottleDecision, ThrottlePolicy, is_throttle_status};
use crate::user_agent;

/// Result of [`HttpClient::fetch_to_file`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileWrite {
    /// The download was moved into place; carries the byte count.
    Written(u64),
    /// The target appeared while downloading; the download was discarded.
    Existing,
}

/// HTTP client for search pages and artifact downloads.
///
/// This client is designed to be created once and cloned into every worker,
/// sharing the underlying connection pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    throttle: ThrottlePolicy,
}

impl HttpClient {
    /// Creates a new HTTP client with default timeouts.
    ///
    /// Default configuration:
    /// - Connect timeout: 30 seconds
    /// - Read timeout: 5 minutes (for large files)
    /// - Gzip decompression: enabled
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    pub fn new(throttle: ThrottlePolicy) -> Self {
        Self::new_with_timeouts(throttle, CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
    }

    /// Creates a new HTTP client with explicit timeout values.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the supplied
    /// timeout configuration.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new_with_timeouts(
        throttle: ThrottlePolicy,
        connect_timeout_secs: u64,
        read_timeout_secs: u64,
    ) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .timeout(Duration::from_secs(read_timeout_secs))
            .gzip(true)
            .user_agent(user_agent::default_user_agent())
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self { client, throttle }
    }

    /// Returns the throttle policy in use.
    #[must_use]
    pub fn throttle_policy(&self) -> &ThrottlePolicy {
        &self.throttle
    }

    /// Fetches a page and returns its body as text.
    ///
    /// `timeout` overrides the client read timeout for this request only. A
    /// timeout is terminal; only throttling responses are retried.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] on network failure, timeout, a non-success
    /// status, or when a bounded throttle policy runs out of attempts.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch_text(
        &self,
        url: &str,
        timeout: Option<Duration>,
    ) -> Result<String, FetchError> {
        let response = self.send_throttled(url, timeout).await?;
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;
        info!(url = %url, bytes = body.len(), "fetched");
        Ok(body)
    }

    /// Downloads `url` into `path` without ever replacing an existing file.
    ///
    /// The body is streamed into a uniquely named `<path>.<id>.part` sibling
    /// and linked into place once fully flushed, so `path` only ever holds
    /// one complete download. Concurrent downloads of the same artifact each
    /// get their own part file; the first to finish wins and the others
    /// return [`FileWrite::Existing`]. The part file is removed on every path.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`fetch_text`](Self::fetch_text), plus
    /// [`FetchError::Io`] if writing or moving the file fails.
    #[instrument(skip(self, path), fields(url = %url, path = %path.display()))]
    pub async fn fetch_to_file(&self, url: &str, path: &Path) -> Result<FileWrite, FetchError> {
        let response = self.send_throttled(url, None).await?;

        let part_path = part_path_for(path);
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&part_path)
            .await
            .map_err(|e| FetchError::io(part_path.clone(), e))?;

        let written = match stream_to_file(&mut file, response, url, &part_path).await {
            Ok(written) => written,
            Err(error) => {
                debug!(path = %part_path.display(), "cleaning up partial file after error");
                drop(file);
                let _ = tokio::fs::remove_file(&part_path).await;
                return Err(error);
            }
        };
        drop(file);

        let placed = persist_no_clobber(&part_path, path).await;
        let _ = tokio::fs::remove_file(&part_path).await;
        match placed {
            Ok(true) => {
                info!(path = %path.display(), bytes = written, "artifact written");
                Ok(FileWrite::Written(written))
            }
            Ok(false) => {
                debug!(path = %path.display(), "artifact written by another task first");
                Ok(FileWrite::Existing)
            }
            Err(e) => Err(FetchError::io(path.to_path_buf(), e)),
        }
    }

    /// Sends a GET, sleeping and retrying while the server throttles.
    async fn send_throttled(
        &self,
        url: &str,
        timeout: Option<Duration>,
    ) -> Result<reqwest::Response, FetchError> {
        Url::parse(url).map_err(|_| FetchError::invalid_url(url))?;

        let mut attempt = 1u32;
        loop {
            let mut request = self.client.get(url);
            if let Some(timeout) = timeout {
                request = request.timeout(timeout);
            }
            let response = request
                .send()
                .await
                .map_err(|e| FetchError::from_reqwest(url, e))?;

            let status = response.status().as_u16();
            if response.status().is_success() {
                return Ok(response);
            }
            if !is_throttle_status(status) {
                return Err(FetchError::http_status(url, status));
            }

            match self.throttle.should_retry(attempt) {
                ThrottleDecision::Wait {
                    delay,
                    attempt: next_attempt,
                } => {
                    warn!(
                        url = %url,
                        status,
                        attempt = next_attempt,
                        delay_secs = delay.as_secs(),
                        "throttled, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt = next_attempt;
                }
                ThrottleDecision::GiveUp { reason } => {
                    debug!(url = %url, %reason, "not retrying throttled request");
                    return Err(FetchError::throttled(url, status, attempt));
                }
            }
        }
    }
}

/// Returns a sibling path, unique per call, used while a download is in flight.
fn part_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".{:016x}{PART_SUFFIX}", rand::random::<u64>()));
    path.with_file_name(name)
}

/// Moves `part` to `path` unless `path` already exists.
///
/// Returns `false` when `path` was already taken. The hard link fails
/// atomically on an existing target; filesystems without hard links fall
/// back to an existence check and a rename.
async fn persist_no_clobber(part: &Path, path: &Path) -> std::io::Result<bool> {
    match tokio::fs::hard_link(part, path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(false),
        Err(e) => {
            debug!(error = %e, "hard link unavailable, renaming instead");
            if tokio::fs::try_exists(path).await? {
                return Ok(false);
            }
            tokio::fs::rename(part, path).await?;
            Ok(true)
        }
    }
}

/// Streams response body to file, returning bytes written.
async fn stream_to_file(
    file: &mut File,
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
) -> Result<u64, FetchError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| FetchError::from_reqwest(url, e))?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| FetchError::io(file_path.to_path_buf(), e))?;

        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| FetchError::io(file_path.to_path_buf(), e))?;

    Ok(bytes_written)
}
