// SPDX-FileCopyrightText: 2026 Tuberelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the tuberelay configuration system.

use tuberelay_config::{load_and_validate_str, load_config_from_str};

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_config() {
    let toml = r#"
[bot]
name = "test-bot"
log_level = "debug"

[telegram]
bot_token = "123:ABC"

[youtube]
client_id = "client-id.apps.googleusercontent.com"
client_secret = "shhh"
scopes = ["https://www.googleapis.com/auth/youtube.upload"]

[auth]
admin_password = "hunter2"
code_timeout_secs = 120
token_check_interval_secs = 900
refresh_threshold_secs = 60

[storage]
data_dir = "/tmp/tuberelay-test"

[lock]
enabled = false
stale_timeout_secs = 300
terminate_grace_secs = 2
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.bot.name, "test-bot");
    assert_eq!(config.bot.log_level, "debug");
    assert_eq!(config.telegram.bot_token.as_deref(), Some("123:ABC"));
    assert_eq!(
        config.youtube.client_id.as_deref(),
        Some("client-id.apps.googleusercontent.com")
    );
    assert_eq!(config.youtube.scopes.len(), 1);
    assert_eq!(config.auth.admin_password.as_deref(), Some("hunter2"));
    assert_eq!(config.auth.code_timeout_secs, 120);
    assert_eq!(config.storage.data_dir, "/tmp/tuberelay-test");
    assert!(!config.lock.enabled);
    assert_eq!(config.lock.stale_timeout_secs, 300);
}

/// Unknown field in a section produces an error.
#[test]
fn unknown_field_in_telegram_produces_error() {
    let toml = r#"
[telegram]
bot_tken = "abc"
"#;

    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("bot_tken"),
        "error should mention unknown field, got: {err_str}"
    );
}

/// Missing optional sections use defaults without error.
#[test]
fn missing_optional_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");

    assert_eq!(config.bot.name, "tuberelay");
    assert_eq!(config.bot.log_level, "info");
    assert!(config.telegram.bot_token.is_none());
    assert!(config.youtube.client_id.is_none());
    assert_eq!(config.youtube.scopes.len(), 2);
    assert!(config.auth.admin_password.is_none());
    assert_eq!(config.auth.code_timeout_secs, 300);
    assert_eq!(config.auth.token_check_interval_secs, 1800);
    assert_eq!(config.auth.refresh_threshold_secs, 300);
    assert!(config.lock.enabled);
    assert_eq!(config.lock.stale_timeout_secs, 600);
}

/// Validation failures surface as diagnostics from the high-level entry point.
#[test]
fn load_and_validate_str_rejects_zero_timeout() {
    let toml = r#"
[auth]
code_timeout_secs = 0
"#;

    let errors = load_and_validate_str(toml).expect_err("zero timeout should fail validation");
    assert!(
        errors
            .iter()
            .any(|e| e.to_string().contains("code_timeout_secs"))
    );
}

/// Derived record paths live under the configured data dir.
#[test]
fn storage_paths_derive_from_data_dir() {
    let toml = r#"
[storage]
data_dir = "/var/lib/tuberelay"
"#;
    let config = load_config_from_str(toml).unwrap();
    assert_eq!(
        config.storage.admin_record_path(),
        std::path::PathBuf::from("/var/lib/tuberelay/admin.json")
    );
    assert_eq!(
        config.storage.credential_path(),
        std::path::PathBuf::from("/var/lib/tuberelay/credentials.json")
    );
    assert_eq!(
        config.lock.lock_path(&config.storage.data_dir),
        std::path::PathBuf::from("/var/lib/tuberelay/tuberelay.lock")
    );
}

/// An explicit lock path overrides the data-dir default.
#[test]
fn explicit_lock_path_wins() {
    let toml = r#"
[lock]
path = "/run/tuberelay.lock"
"#;
    let config = load_config_from_str(toml).unwrap();
    assert_eq!(
        config.lock.lock_path("/ignored"),
        std::path::PathBuf::from("/run/tuberelay.lock")
    );
}
