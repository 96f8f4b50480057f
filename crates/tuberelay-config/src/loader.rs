// SPDX-FileCopyrightText: 2026 Tuberelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./tuberelay.toml` > `~/.config/tuberelay/tuberelay.toml`
//! > `/etc/tuberelay/tuberelay.toml` with environment variable overrides via
//! `TUBERELAY_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::TuberelayConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/tuberelay/tuberelay.toml` (system-wide)
/// 3. `~/.config/tuberelay/tuberelay.toml` (user XDG config)
/// 4. `./tuberelay.toml` (local directory)
/// 5. `TUBERELAY_*` environment variables
pub fn load_config() -> Result<TuberelayConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TuberelayConfig::default()))
        .merge(Toml::file("/etc/tuberelay/tuberelay.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("tuberelay/tuberelay.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("tuberelay.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a specific TOML string only (no XDG lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<TuberelayConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TuberelayConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<TuberelayConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TuberelayConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names. For example, `TUBERELAY_TELEGRAM_BOT_TOKEN`
/// must map to `telegram.bot_token`, not `telegram.bot.token`.
fn env_provider() -> Env {
    const SECTIONS: &[&str] = &["bot", "telegram", "youtube", "auth", "storage", "lock"];

    Env::prefixed("TUBERELAY_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: TUBERELAY_AUTH_ADMIN_PASSWORD -> "auth_admin_password"
        let key_str = key.as_str();
        for section in SECTIONS {
            // Match the section only at the start of the key, otherwise
            // TELEGRAM_BOT_TOKEN would split on the inner "bot_".
            if let Some(rest) = key_str.strip_prefix(&format!("{section}_")) {
                return format!("{section}.{rest}").into();
            }
        }
        key_str.to_string().into()
    })
}
