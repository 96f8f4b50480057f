// SPDX-FileCopyrightText: 2026 Tuberelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as non-empty paths and non-zero timeouts.

use crate::diagnostic::ConfigError;
use crate::model::TuberelayConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &TuberelayConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.storage.data_dir.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.data_dir must not be empty".to_string(),
        });
    }

    if let Some(password) = &config.auth.admin_password
        && password.trim().is_empty()
    {
        errors.push(ConfigError::Validation {
            message: "auth.admin_password must not be empty when set".to_string(),
        });
    }

    if config.auth.code_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "auth.code_timeout_secs must be greater than zero".to_string(),
        });
    }

    if config.auth.token_check_interval_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "auth.token_check_interval_secs must be greater than zero".to_string(),
        });
    }

    if config.youtube.scopes.is_empty() {
        errors.push(ConfigError::Validation {
            message: "youtube.scopes must not be empty".to_string(),
        });
    }

    for (i, scope) in config.youtube.scopes.iter().enumerate() {
        if scope.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: format!("youtube.scopes[{i}] must not be empty"),
            });
        }
    }

    if config.lock.stale_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "lock.stale_timeout_secs must be greater than zero".to_string(),
        });
    }

    if let Some(path) = &config.lock.path
        && path.trim().is_empty()
    {
        errors.push(ConfigError::Validation {
            message: "lock.path must not be empty when set".to_string(),
        });
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
