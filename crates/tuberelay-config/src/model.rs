// SPDX-FileCopyrightText: 2026 Tuberelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the tuberelay bot.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level tuberelay configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TuberelayConfig {
    /// Bot identity and logging settings.
    #[serde(default)]
    pub bot: BotConfig,

    /// Telegram bot integration settings.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// YouTube OAuth client settings.
    #[serde(default)]
    pub youtube: YoutubeConfig,

    /// Admin and authorization flow settings.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Durable record storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Single-instance lock settings.
    #[serde(default)]
    pub lock: LockConfig,
}

/// Bot identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    /// Display name of the bot.
    #[serde(default = "default_bot_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: default_bot_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_bot_name() -> String {
    "tuberelay".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Telegram bot integration configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Telegram Bot API token. Required for `serve`.
    #[serde(default)]
    pub bot_token: Option<String>,
}

/// YouTube OAuth client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct YoutubeConfig {
    /// OAuth client id. Required for `serve`.
    #[serde(default)]
    pub client_id: Option<String>,

    /// OAuth client secret. Required for `serve`.
    #[serde(default)]
    pub client_secret: Option<String>,

    /// OAuth scopes requested during authorization.
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
}

impl Default for YoutubeConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            scopes: default_scopes(),
        }
    }
}

fn default_scopes() -> Vec<String> {
    vec![
        "https://www.googleapis.com/auth/youtube.upload".to_string(),
        "https://www.googleapis.com/auth/youtube".to_string(),
    ]
}

/// Admin identity and authorization flow configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Shared secret accepted by `/setadmin`. Required for `serve`.
    /// A password stored in a previously persisted admin record overrides it.
    #[serde(default)]
    pub admin_password: Option<String>,

    /// How long an authorization flow waits for a pasted code.
    #[serde(default = "default_code_timeout_secs")]
    pub code_timeout_secs: u64,

    /// Minimum interval between provider-facing credential checks.
    #[serde(default = "default_token_check_interval_secs")]
    pub token_check_interval_secs: u64,

    /// Window before expiry within which a proactive refresh is attempted.
    #[serde(default = "default_refresh_threshold_secs")]
    pub refresh_threshold_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            admin_password: None,
            code_timeout_secs: default_code_timeout_secs(),
            token_check_interval_secs: default_token_check_interval_secs(),
            refresh_threshold_secs: default_refresh_threshold_secs(),
        }
    }
}

fn default_code_timeout_secs() -> u64 {
    300
}

fn default_token_check_interval_secs() -> u64 {
    1800
}

fn default_refresh_threshold_secs() -> u64 {
    300
}

/// Durable record storage configuration.
///
/// The data directory holds three independent small records: the admin
/// identity, the credential blob, and (by default) the lock file.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Directory for the admin and credential records.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl StorageConfig {
    /// Path of the persisted admin identity record.
    pub fn admin_record_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("admin.json")
    }

    /// Path of the persisted credential record.
    pub fn credential_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("credentials.json")
    }
}

fn default_data_dir() -> String {
    dirs::data_dir()
        .map(|p| p.join("tuberelay"))
        .unwrap_or_else(|| PathBuf::from("tuberelay-data"))
        .to_string_lossy()
        .into_owned()
}

/// Single-instance lock configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LockConfig {
    /// Whether to enforce a single running instance.
    #[serde(default = "default_lock_enabled")]
    pub enabled: bool,

    /// Lock file path. Defaults to `<data_dir>/tuberelay.lock`.
    #[serde(default)]
    pub path: Option<String>,

    /// Age beyond which a lock record is treated as stale.
    #[serde(default = "default_stale_timeout_secs")]
    pub stale_timeout_secs: u64,

    /// How long to wait for a graceful terminate before escalating.
    #[serde(default = "default_terminate_grace_secs")]
    pub terminate_grace_secs: u64,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            enabled: default_lock_enabled(),
            path: None,
            stale_timeout_secs: default_stale_timeout_secs(),
            terminate_grace_secs: default_terminate_grace_secs(),
        }
    }
}

impl LockConfig {
    /// Resolved lock file path for a given data directory.
    pub fn lock_path(&self, data_dir: &str) -> PathBuf {
        match &self.path {
            Some(p) => PathBuf::from(p),
            None => PathBuf::from(data_dir).join("tuberelay.lock"),
        }
    }
}

fn default_lock_enabled() -> bool {
    true
}

fn default_stale_timeout_secs() -> u64 {
    600
}

fn default_terminate_grace_secs() -> u64 {
    5
}
