// SPDX-FileCopyrightText: 2026 Tuberelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the tuberelay bot.

use thiserror::Error;

/// The primary error type used across all tuberelay crates.
#[derive(Debug, Error)]
pub enum TuberelayError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Channel adapter errors (connection failure, message delivery, polling).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The supplied admin password does not match the shared secret.
    #[error("admin password rejected")]
    BadPassword,

    /// A privileged operation was attempted by someone other than the registered admin.
    #[error("sender {sender_id} is not the registered admin")]
    NotAdmin { sender_id: String },

    /// `begin` was called while an authorization flow is already awaiting a
    /// code or exchanging one. At most one flow runs per process.
    #[error("an authorization flow is already in progress")]
    AuthInProgress,

    /// A code was submitted while no flow is waiting for one.
    #[error("no authorization flow is waiting for a code")]
    NotAwaitingCode,

    /// No code arrived within the configured window. The relay has reset to
    /// idle and a fresh flow can be started.
    #[error("timed out after {0:?} waiting for the authorization code")]
    AuthTimeout(std::time::Duration),

    /// The provider classified the submitted code as invalid or expired.
    /// Recoverable: the relay resets to idle.
    #[error("authorization code rejected by the provider: {0}")]
    InvalidGrant(String),

    /// Any other token endpoint failure (network, server error, malformed response).
    #[error("token exchange failed: {message}")]
    TokenExchange {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The stored credential is at or past expiry and could not be refreshed.
    /// Callers must re-run the authorization flow.
    #[error("credential expired and could not be refreshed: {0}")]
    CredentialExpired(String),

    /// Durable record read/write failure (admin record, credential record).
    #[error("storage error: {message}")]
    Storage {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Another live instance holds the lock and could not be displaced.
    /// Fatal at startup: continuing would risk two owners.
    #[error("could not acquire the single-instance lock: {0}")]
    LockContention(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
