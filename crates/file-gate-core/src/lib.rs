#![warn(missing_docs)]
//! # file-gate-core
//!
//! ## Purpose
//! Defines the pure data model shared across the `file-gate` workspace.
//!
//! ## Responsibilities
//! - Represent the persisted session lock record and its two statuses.
//! - Name the four mutually exclusive scenes of the portal.
//! - Hold gate configuration and its validation rules.
//! - Provide countdown arithmetic (`remaining_seconds`, `format_mmss`) and
//!   stale-lock classification.
//!
//! ## Data flow
//! Login success produces a [`LockRecord`] with [`LockStatus::Waiting`], which
//! is encoded to JSON and handed to the session store. On startup the stored
//! JSON is decoded back with [`LockRecord::decode`] and classified with
//! [`LockRecord::is_stale`].
//!
//! ## Ownership and lifetimes
//! All values are small owned structs; configuration strings are owned so a
//! single [`GateConfig`] can be cloned into every subsystem.
//!
//! ## Error model
//! Codec and configuration failures return [`CoreError`]. Decoding a stored
//! record through [`LockRecord::decode`] never fails: corrupt or unknown
//! records are reported as absent.
//!
//! ## Security and privacy notes
//! The shared secret is a deterrent, not a credential. [`GateConfig`] redacts
//! it from its `Debug` output so it never reaches logs by accident.
//!
//! ## Example
//! ```rust
//! use file_gate_core::{format_mmss, remaining_seconds, LockRecord, LockStatus};
//!
//! let record = LockRecord::new(LockStatus::Waiting, 1_000);
//! let raw = record.to_json().unwrap();
//! assert_eq!(LockRecord::decode(&raw), Some(record));
//! assert_eq!(format_mmss(remaining_seconds(301_000, 1_500)), "05:00");
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Storage key the lock record lives under.
pub const DEFAULT_LOCK_KEY: &str = "fileDownloaderSession";

/// Default enforced wait before the download unlocks (5 minutes).
pub const DEFAULT_WAIT_DURATION_MS: u64 = 5 * 60 * 1000;

/// Default buffer added on top of the wait before a lock counts as stale.
pub const DEFAULT_STALE_BUFFER_MS: u64 = 3 * 60 * 1000;

/// Default artificial delay before a submitted password is checked.
pub const DEFAULT_LOGIN_DELAY_MS: u64 = 500;

/// Default fade duration between two scenes.
pub const DEFAULT_TRANSITION_MS: u64 = 300;

/// Default countdown cadence.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1_000;

/// Default delay between a download click and the lock being cleared.
pub const DEFAULT_DOWNLOAD_CLEAR_DELAY_MS: u64 = 1_000;

/// Default shared secret.
pub const DEFAULT_SECRET: &str = "access2024";

/// Default location of the gated file.
pub const DEFAULT_FILE_URL: &str = "https://example.com/files/generated_file.ext";

/// Filename used when the file server does not suggest one.
pub const DEFAULT_FILENAME: &str = "generated_file.ext";

/// Progress of a gated session as recorded in the lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockStatus {
    /// A countdown is running somewhere.
    Waiting,
    /// The countdown finished and the download was unlocked.
    Ready,
}

impl LockStatus {
    /// Wire name used in the persisted record.
    pub fn as_str(self) -> &'static str {
        match self {
            LockStatus::Waiting => "waiting",
            LockStatus::Ready => "ready",
        }
    }
}

impl fmt::Display for LockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single persisted record coordinating gated sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRecord {
    /// Unix epoch milliseconds when the record was last written.
    pub timestamp: u64,
    /// Session progress.
    pub status: LockStatus,
}

impl LockRecord {
    /// Creates a record stamped at `now_ms`.
    pub fn new(status: LockStatus, now_ms: u64) -> Self {
        Self {
            timestamp: now_ms,
            status,
        }
    }

    /// Serializes the record to its compact JSON form.
    ///
    /// # Errors
    /// Returns [`CoreError::Codec`] when JSON serialization fails.
    pub fn to_json(&self) -> Result<String, CoreError> {
        serde_json::to_string(self).map_err(CoreError::Codec)
    }

    /// Parses a stored record strictly.
    ///
    /// Unknown extra fields are ignored; missing fields, a non-integer
    /// timestamp, or an unknown status are errors.
    ///
    /// # Errors
    /// Returns [`CoreError::Codec`] when the payload does not match the schema.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        serde_json::from_str(raw).map_err(CoreError::Codec)
    }

    /// Parses a stored record, treating anything unparseable as absent.
    pub fn decode(raw: &str) -> Option<Self> {
        Self::parse(raw).ok()
    }

    /// Milliseconds elapsed since the record was written.
    ///
    /// A timestamp in the future yields zero.
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.timestamp)
    }

    /// Returns `true` when the record is older than `threshold_ms`.
    ///
    /// The comparison is strict: a record exactly `threshold_ms` old is still
    /// considered live.
    pub fn is_stale(&self, now_ms: u64, threshold_ms: u64) -> bool {
        self.age_ms(now_ms) > threshold_ms
    }
}

/// One of the four mutually exclusive top-level screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scene {
    /// Password form.
    Login,
    /// Countdown in progress in this portal.
    Waiting,
    /// Download control unlocked.
    Download,
    /// Another session is already counting down.
    Busy,
}

impl Scene {
    /// All scenes in display order.
    pub const ALL: [Scene; 4] = [Scene::Login, Scene::Waiting, Scene::Download, Scene::Busy];

    /// Stable lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Scene::Login => "login",
            Scene::Waiting => "waiting",
            Scene::Download => "download",
            Scene::Busy => "busy",
        }
    }
}

impl fmt::Display for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Gate configuration shared by every subsystem.
#[derive(Clone, PartialEq, Eq)]
pub struct GateConfig {
    /// Shared secret compared against submitted passwords.
    pub secret: String,
    /// Enforced wait between login and download.
    pub wait_duration_ms: u64,
    /// Extra age on top of the wait before a lock is presumed abandoned.
    pub stale_buffer_ms: u64,
    /// Location of the gated file.
    pub file_url: String,
    /// Filename used when the server suggests none.
    pub default_filename: String,
    /// Storage key of the lock record.
    pub lock_key: String,
    /// Artificial delay before a password is checked.
    pub login_delay_ms: u64,
    /// Fade duration between scenes.
    pub transition_ms: u64,
    /// Countdown cadence.
    pub tick_interval_ms: u64,
    /// Delay between download click and lock clear.
    pub download_clear_delay_ms: u64,
}

impl GateConfig {
    /// Age beyond which a lock is treated as abandoned.
    pub fn stale_threshold_ms(&self) -> u64 {
        self.wait_duration_ms.saturating_add(self.stale_buffer_ms)
    }

    /// Checks configuration invariants.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidConfig`] for an empty secret, file location,
    /// default filename or lock key, for a zero wait or tick interval, and for
    /// a zero stale buffer, since the stale threshold must exceed the wait.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.secret.is_empty() {
            return Err(CoreError::InvalidConfig("secret is empty".to_string()));
        }
        if self.file_url.trim().is_empty() {
            return Err(CoreError::InvalidConfig("file url is empty".to_string()));
        }
        if self.default_filename.trim().is_empty() {
            return Err(CoreError::InvalidConfig(
                "default filename is empty".to_string(),
            ));
        }
        if self.lock_key.trim().is_empty() {
            return Err(CoreError::InvalidConfig("lock key is empty".to_string()));
        }
        if self.wait_duration_ms == 0 {
            return Err(CoreError::InvalidConfig(
                "wait duration must be greater than zero".to_string(),
            ));
        }
        if self.stale_buffer_ms == 0 {
            return Err(CoreError::InvalidConfig(
                "stale buffer must be greater than zero".to_string(),
            ));
        }
        if self.tick_interval_ms == 0 {
            return Err(CoreError::InvalidConfig(
                "tick interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            secret: DEFAULT_SECRET.to_string(),
            wait_duration_ms: DEFAULT_WAIT_DURATION_MS,
            stale_buffer_ms: DEFAULT_STALE_BUFFER_MS,
            file_url: DEFAULT_FILE_URL.to_string(),
            default_filename: DEFAULT_FILENAME.to_string(),
            lock_key: DEFAULT_LOCK_KEY.to_string(),
            login_delay_ms: DEFAULT_LOGIN_DELAY_MS,
            transition_ms: DEFAULT_TRANSITION_MS,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            download_clear_delay_ms: DEFAULT_DOWNLOAD_CLEAR_DELAY_MS,
        }
    }
}

impl fmt::Debug for GateConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GateConfig")
            .field("secret", &"<redacted>")
            .field("wait_duration_ms", &self.wait_duration_ms)
            .field("stale_buffer_ms", &self.stale_buffer_ms)
            .field("file_url", &self.file_url)
            .field("default_filename", &self.default_filename)
            .field("lock_key", &self.lock_key)
            .field("login_delay_ms", &self.login_delay_ms)
            .field("transition_ms", &self.transition_ms)
            .field("tick_interval_ms", &self.tick_interval_ms)
            .field("download_clear_delay_ms", &self.download_clear_delay_ms)
            .finish()
    }
}

/// Milliseconds left until `end_ms`, floored at zero.
pub fn remaining_ms(end_ms: u64, now_ms: u64) -> u64 {
    end_ms.saturating_sub(now_ms)
}

/// Whole seconds left until `end_ms`, rounded up.
///
/// Rounding up means the display only reads `00:00` once the end instant has
/// actually been reached.
pub fn remaining_seconds(end_ms: u64, now_ms: u64) -> u64 {
    remaining_ms(end_ms, now_ms).div_ceil(1_000)
}

/// Formats a second count as zero-padded `MM:SS`.
///
/// Minutes are not wrapped at 60; waits over an hour render as e.g. `75:00`.
pub fn format_mmss(total_seconds: u64) -> String {
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    format!("{minutes:02}:{seconds:02}")
}

/// Error type for core model codec and configuration failures.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Configuration violates an invariant.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// JSON encoding/decoding error.
    #[error("lock record codec failure: {0}")]
    Codec(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    //! Unit tests for record classification and configuration rules.

    use super::*;

    #[test]
    fn default_config_is_valid_with_eight_minute_threshold() {
        let config = GateConfig::default();
        config.validate().expect("defaults should validate");
        assert_eq!(config.stale_threshold_ms(), 8 * 60 * 1000);
    }

    #[test]
    fn zero_buffer_is_rejected() {
        let config = GateConfig {
            stale_buffer_ms: 0,
            ..GateConfig::default()
        };
        assert!(matches!(config.validate(), Err(CoreError::InvalidConfig(_))));
    }

    #[test]
    fn debug_output_hides_secret() {
        let rendered = format!("{:?}", GateConfig::default());
        assert!(!rendered.contains(DEFAULT_SECRET));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn future_timestamp_has_zero_age() {
        let record = LockRecord::new(LockStatus::Waiting, 5_000);
        assert_eq!(record.age_ms(1_000), 0);
        assert!(!record.is_stale(1_000, 10));
    }
}
