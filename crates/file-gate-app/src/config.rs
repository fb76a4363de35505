//! Environment-driven gate configuration.

use std::path::PathBuf;

use file_gate_core::GateConfig;

use crate::AppError;

/// Overrides the shared secret.
pub const ENV_SECRET: &str = "FILE_GATE_SECRET";
/// Overrides the wait duration, in whole seconds.
pub const ENV_WAIT_SECS: &str = "FILE_GATE_WAIT_SECS";
/// Overrides the stale-lock buffer, in whole seconds.
pub const ENV_STALE_BUFFER_SECS: &str = "FILE_GATE_STALE_BUFFER_SECS";
/// Overrides the gated file location.
pub const ENV_FILE_URL: &str = "FILE_GATE_FILE_URL";
/// Overrides the fallback download filename.
pub const ENV_DEFAULT_FILENAME: &str = "FILE_GATE_DEFAULT_FILENAME";
/// Directory of the durable lock store used by the binary.
pub const ENV_STATE_DIR: &str = "FILE_GATE_STATE_DIR";
/// State directory used when [`ENV_STATE_DIR`] is unset.
pub const DEFAULT_STATE_DIR: &str = ".file-gate";

/// Loads configuration from process environment variables.
///
/// # Errors
/// See [`config_from_lookup`].
pub fn config_from_env() -> Result<GateConfig, AppError> {
    config_from_lookup(|key| std::env::var(key).ok())
}

/// Builds configuration from defaults plus the values `lookup` returns.
///
/// The secret is trimmed, since submissions are trimmed before comparison.
///
/// # Errors
/// Returns [`AppError::Config`] for non-numeric durations and
/// [`AppError::Core`] when the result fails [`GateConfig::validate`].
pub fn config_from_lookup<F>(lookup: F) -> Result<GateConfig, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = GateConfig::default();

    if let Some(secret) = lookup(ENV_SECRET) {
        config.secret = secret.trim().to_string();
    }
    if let Some(raw) = lookup(ENV_WAIT_SECS) {
        config.wait_duration_ms = parse_seconds(ENV_WAIT_SECS, &raw)?;
    }
    if let Some(raw) = lookup(ENV_STALE_BUFFER_SECS) {
        config.stale_buffer_ms = parse_seconds(ENV_STALE_BUFFER_SECS, &raw)?;
    }
    if let Some(file_url) = lookup(ENV_FILE_URL) {
        config.file_url = file_url.trim().to_string();
    }
    if let Some(filename) = lookup(ENV_DEFAULT_FILENAME) {
        config.default_filename = filename.trim().to_string();
    }

    config.validate()?;
    Ok(config)
}

/// Directory of the durable lock store.
pub fn state_dir_from_env() -> PathBuf {
    std::env::var_os(ENV_STATE_DIR)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR))
}

fn parse_seconds(key: &str, raw: &str) -> Result<u64, AppError> {
    let seconds: u64 = raw
        .trim()
        .parse()
        .map_err(|error| AppError::Config(format!("{key} must be whole seconds: {error}")))?;
    seconds
        .checked_mul(1_000)
        .ok_or_else(|| AppError::Config(format!("{key} is out of range")))
}
