//! Integration tests for environment-driven configuration.

use file_gate_app::{
    AppError, ENV_DEFAULT_FILENAME, ENV_FILE_URL, ENV_SECRET, ENV_STALE_BUFFER_SECS, ENV_STATE_DIR,
    ENV_WAIT_SECS, config_from_env, config_from_lookup, state_dir_from_env,
};
use file_gate_core::GateConfig;

#[test]
fn config_env_tests_defaults_apply_when_unset() {
    temp_env::with_vars_unset(
        [
            ENV_SECRET,
            ENV_WAIT_SECS,
            ENV_STALE_BUFFER_SECS,
            ENV_FILE_URL,
            ENV_DEFAULT_FILENAME,
        ],
        || {
            let config = config_from_env().expect("defaults should load");
            assert_eq!(config, GateConfig::default());
        },
    );
}

#[test]
fn config_env_tests_overrides_are_applied() {
    temp_env::with_vars(
        [
            (ENV_SECRET, Some(" open-sesame ")),
            (ENV_WAIT_SECS, Some("60")),
            (ENV_STALE_BUFFER_SECS, Some("30")),
            (ENV_FILE_URL, Some("https://downloads.example.test/a.iso")),
        ],
        || {
            let config = config_from_env().expect("overrides should load");
            assert_eq!(config.secret, "open-sesame");
            assert_eq!(config.wait_duration_ms, 60_000);
            assert_eq!(config.stale_threshold_ms(), 90_000);
            assert_eq!(config.file_url, "https://downloads.example.test/a.iso");
        },
    );
}

#[test]
fn config_env_tests_non_numeric_wait_is_rejected() {
    let result = config_from_lookup(|key| (key == ENV_WAIT_SECS).then(|| "five".to_string()));
    assert!(matches!(result, Err(AppError::Config(_))));
}

#[test]
fn config_env_tests_zero_buffer_is_rejected() {
    let result =
        config_from_lookup(|key| (key == ENV_STALE_BUFFER_SECS).then(|| "0".to_string()));
    assert!(matches!(result, Err(AppError::Core(_))));
}

#[test]
fn config_env_tests_state_dir_defaults_when_unset() {
    temp_env::with_var_unset(ENV_STATE_DIR, || {
        assert_eq!(state_dir_from_env(), std::path::PathBuf::from(".file-gate"));
    });
    temp_env::with_var(ENV_STATE_DIR, Some("/var/lib/file-gate"), || {
        assert_eq!(
            state_dir_from_env(),
            std::path::PathBuf::from("/var/lib/file-gate")
        );
    });
}
