#![warn(missing_docs)]
//! # file-gate-app
//!
//! ## Purpose
//! Orchestrates session resolution, login, countdown, download preparation,
//! and UI state for `file-gate`.
//!
//! ## Responsibilities
//! - Wire the lock store, login flow, countdown, scene controller, and
//!   download preparer into one [`Portal`].
//! - Load gate configuration from the environment.
//! - Provide log redaction and the build-time version string.
//!
//! ## Data flow
//! Startup -> session resolver picks a scene -> login submit -> `waiting`
//! lock + countdown -> completion -> `ready` lock + probe -> download scene ->
//! download click -> delayed lock clear.
//!
//! ## Ownership and lifetimes
//! The portal owns all per-tab state. Only the key-value backend is shared,
//! which is how several portals observe each other's locks.
//!
//! ## Error model
//! Configuration and misuse surface as [`AppError`]. Runtime failures
//! (storage, wrong password, unreachable file) are logged and recovered inside
//! the portal, as none of them should end a session.
//!
//! ## Security and privacy notes
//! - The secret is a deterrent; persisted state is not tamper-proof.
//! - Submitted passwords are never logged; free-form error text goes through
//!   [`redact_sensitive`] before it is logged.

mod config;
mod portal;

use file_gate_auth::AuthError;
use file_gate_core::CoreError;
use file_gate_download::DownloadError;
use file_gate_session::StoreError;
use file_gate_timer::TimerError;
use thiserror::Error;

pub use config::{
    DEFAULT_STATE_DIR, ENV_DEFAULT_FILENAME, ENV_FILE_URL, ENV_SECRET, ENV_STALE_BUFFER_SECS,
    ENV_STATE_DIR, ENV_WAIT_SECS, config_from_env, config_from_lookup, state_dir_from_env,
};
pub use portal::{DownloadTarget, Portal, PortalEvent};

/// Build-time application version loaded from root `VERSION` file.
pub const APP_VERSION: &str = env!("FILE_GATE_VERSION");

const SENSITIVE_MARKERS: [&str; 5] = ["password=", "secret=", "token=", "authorization=", "bearer "];

/// Returns the app version sourced from root `VERSION`.
pub fn app_version() -> &'static str {
    APP_VERSION
}

/// Replaces the values of common credential markers with `<redacted>`.
///
/// Markers are matched case-insensitively (`password=`, `secret=`, `token=`,
/// `authorization=`, `bearer `). A value ends at whitespace, `&`, `;` or `,`;
/// an authorization scheme word (`Bearer`, `Basic`) swallows the following
/// credential too.
pub fn redact_sensitive(input: &str) -> String {
    let lower = input.to_ascii_lowercase();
    let mut output = String::with_capacity(input.len());
    let mut cursor = 0;

    while let Some(value_start) = next_marker_value(&lower, cursor) {
        output.push_str(&input[cursor..value_start]);
        output.push_str("<redacted>");
        cursor = value_end(input, value_start);
    }
    output.push_str(&input[cursor..]);
    output
}

fn next_marker_value(lower: &str, from: usize) -> Option<usize> {
    SENSITIVE_MARKERS
        .iter()
        .filter_map(|marker| {
            lower[from..]
                .find(marker)
                .map(|offset| from + offset + marker.len())
        })
        .min()
}

fn is_value_delimiter(ch: char) -> bool {
    ch.is_whitespace() || matches!(ch, '&' | ';' | ',')
}

fn value_end(input: &str, start: usize) -> usize {
    let token_end = |from: usize| {
        input[from..]
            .find(is_value_delimiter)
            .map_or(input.len(), |offset| from + offset)
    };

    let end = token_end(start);
    let word = &input[start..end];
    if word.eq_ignore_ascii_case("bearer") || word.eq_ignore_ascii_case("basic") {
        let rest = &input[end..];
        let skipped = rest.len() - rest.trim_start().len();
        if skipped > 0 && end + skipped < input.len() {
            return token_end(end + skipped);
        }
    }
    end
}

/// App integration error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Environment configuration could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),
    /// Core model or configuration invariant violated.
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    /// Auth configuration error.
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),
    /// Countdown configuration error.
    #[error("timer error: {0}")]
    Timer(#[from] TimerError),
    /// File location or probe construction error.
    #[error("download error: {0}")]
    Download(#[from] DownloadError),
    /// Durable store could not be opened.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
    /// The session resolver already ran for this portal.
    #[error("portal already loaded")]
    AlreadyLoaded,
}
