#![warn(missing_docs)]
//! # file-gate-download
//!
//! ## Purpose
//! Prepares the gated download once the wait has elapsed.
//!
//! ## Responsibilities
//! - Validate the configured file location (`http`/`https` only).
//! - Probe file reachability through an injectable [`FileProbe`], with a
//!   blocking HTTP `HEAD` implementation ([`HttpProbe`]).
//! - Derive a filename from a `Content-Disposition` header.
//! - Mark the lock `ready` and produce a [`PreparedDownload`] that always
//!   enables the download control, with a warning on probe failure.
//!
//! ## Data flow
//! Countdown completion -> [`DownloadPreparer::prepare`] writes the `ready`
//! lock -> probe -> filename derivation -> UI download control.
//!
//! ## Ownership and lifetimes
//! Probe responses carry owned header values so no transport buffer outlives
//! the call.
//!
//! ## Error model
//! Transport and status failures are [`DownloadError`] values inside the
//! probe; [`DownloadPreparer::prepare`] converts them into a user-visible
//! warning and never fails.
//!
//! ## Example
//! ```rust
//! use file_gate_download::filename_from_content_disposition;
//!
//! assert_eq!(
//!     filename_from_content_disposition("attachment; filename=\"report.pdf\""),
//!     Some("report.pdf".to_string()),
//! );
//! ```

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use file_gate_core::LockStatus;
use file_gate_session::LockStore;
use percent_encoding::percent_decode_str;
use reqwest::header::CONTENT_DISPOSITION;
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

/// Warning shown when the probe fails but the download stays usable.
pub const PROBE_WARNING: &str = "Warning: The file may not be fully ready or accessible. You can still try downloading, but please contact support if issues persist.";

/// Metadata returned by a file probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw `Content-Disposition` header, when present.
    pub content_disposition: Option<String>,
}

impl ProbeResponse {
    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Metadata-only existence check against the file location.
pub trait FileProbe: Send + Sync {
    /// Probes `url` without downloading the body.
    ///
    /// # Errors
    /// Returns [`DownloadError::Transport`] when no response was received.
    fn probe(&self, url: &str) -> Result<ProbeResponse, DownloadError>;
}

/// Blocking HTTP `HEAD` probe.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: reqwest::blocking::Client,
}

impl HttpProbe {
    /// Builds a probe with a request timeout.
    ///
    /// # Errors
    /// Returns [`DownloadError::Transport`] when the HTTP client cannot be
    /// built.
    pub fn new(timeout: Duration) -> Result<Self, DownloadError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| DownloadError::Transport(error.to_string()))?;
        Ok(Self { client })
    }
}

impl FileProbe for HttpProbe {
    fn probe(&self, url: &str) -> Result<ProbeResponse, DownloadError> {
        let response = self
            .client
            .head(url)
            .send()
            .map_err(|error| DownloadError::Transport(error.without_url().to_string()))?;

        let content_disposition = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        Ok(ProbeResponse {
            status: response.status().as_u16(),
            content_disposition,
        })
    }
}

/// Validates the gated file location.
///
/// # Errors
/// Returns [`DownloadError::InvalidUrl`] when the location does not parse or
/// uses a scheme other than `http`/`https`.
pub fn validate_file_url(file_url: &str) -> Result<Url, DownloadError> {
    let parsed = Url::parse(file_url)
        .map_err(|error| DownloadError::InvalidUrl(format!("invalid file url: {error}")))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(DownloadError::InvalidUrl(format!(
            "file url must use http or https, got {other}"
        ))),
    }
}

/// Extracts a suggested filename from a `Content-Disposition` value.
///
/// Recognises `filename*=charset''percent-encoded` (preferred),
/// `filename="quoted"` and `filename=bare`. The result is reduced to its last
/// path segment.
pub fn filename_from_content_disposition(value: &str) -> Option<String> {
    let lower = value.to_ascii_lowercase();

    if let Some(index) = lower.find("filename*=") {
        let raw = parameter_value(&value[index + "filename*=".len()..]);
        let encoded = match raw.find("''") {
            Some(position) => &raw[position + 2..],
            None => raw,
        };
        if let Ok(decoded) = percent_decode_str(encoded).decode_utf8()
            && let Some(name) = last_segment(decoded.trim())
        {
            return Some(name);
        }
    }

    let index = lower.find("filename=")?;
    let raw = parameter_value(&value[index + "filename=".len()..]);
    last_segment(raw.trim_matches(|ch| ch == '"' || ch == '\'').trim())
}

fn parameter_value(rest: &str) -> &str {
    let rest = rest.trim_start();
    if let Some(quoted) = rest.strip_prefix('"')
        && let Some(end) = quoted.find('"')
    {
        return &quoted[..end];
    }
    rest.split(';').next().unwrap_or(rest).trim()
}

fn last_segment(name: &str) -> Option<String> {
    let name = name.rsplit(['/', '\\']).next().unwrap_or(name).trim();
    if name.is_empty() || name == "." || name == ".." {
        return None;
    }
    Path::new(name)
        .file_name()
        .and_then(|segment| segment.to_str())
        .map(str::to_string)
}

/// Download control contents produced after the wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedDownload {
    /// File location the control points at.
    pub href: String,
    /// Suggested save name.
    pub filename: String,
    /// Non-blocking warning when the probe failed.
    pub warning: Option<String>,
}

/// Runs the post-countdown preparation step.
#[derive(Clone)]
pub struct DownloadPreparer {
    file_url: String,
    default_filename: String,
    probe: Arc<dyn FileProbe>,
}

impl DownloadPreparer {
    /// Creates a preparer for `file_url`.
    pub fn new(
        file_url: impl Into<String>,
        default_filename: impl Into<String>,
        probe: Arc<dyn FileProbe>,
    ) -> Self {
        Self {
            file_url: file_url.into(),
            default_filename: default_filename.into(),
            probe,
        }
    }

    /// Configured file location.
    pub fn file_url(&self) -> &str {
        &self.file_url
    }

    /// Marks the lock `ready`, probes the file and derives the control state.
    ///
    /// A failed lock write or probe is logged and never blocks the download.
    pub fn prepare(&self, locks: &mut LockStore, now_ms: u64) -> PreparedDownload {
        let _ = locks.set_lock(LockStatus::Ready, now_ms);

        let outcome = self.probe.probe(&self.file_url).and_then(|response| {
            if response.is_success() {
                Ok(response)
            } else {
                Err(DownloadError::Status(response.status))
            }
        });

        match outcome {
            Ok(response) => {
                let filename = response
                    .content_disposition
                    .as_deref()
                    .and_then(filename_from_content_disposition)
                    .unwrap_or_else(|| self.default_filename.clone());
                info!(status = response.status, %filename, "download prepared");
                PreparedDownload {
                    href: self.file_url.clone(),
                    filename,
                    warning: None,
                }
            }
            Err(error) => {
                warn!(%error, "download preparation error");
                PreparedDownload {
                    href: self.file_url.clone(),
                    filename: self.default_filename.clone(),
                    warning: Some(PROBE_WARNING.to_string()),
                }
            }
        }
    }
}

/// Download preparation errors.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// File location is malformed or uses an unsupported scheme.
    #[error("invalid file url: {0}")]
    InvalidUrl(String),
    /// No response was received.
    #[error("file probe transport failure: {0}")]
    Transport(String),
    /// The server answered with a non-success status.
    #[error("file validation failed with status: {0}")]
    Status(u16),
}
