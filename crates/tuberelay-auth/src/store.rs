// SPDX-FileCopyrightText: 2026 Tuberelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence and proactive refresh of the OAuth credential.
//!
//! The store is the sole writer of the credential record; everything else
//! receives clones. Writes go through a temp file and an atomic rename so a
//! crash mid-write never leaves a torn record. A corrupt record on load is
//! treated as absent, not fatal -- the admin just re-runs the flow.

use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use tuberelay_config::model::AuthConfig;
use tuberelay_core::{Credential, OauthProvider, TuberelayError};

/// Durable store for the single OAuth credential.
pub struct CredentialStore {
    path: PathBuf,
    /// Minimum interval between provider-facing validity checks.
    check_interval: Duration,
    /// Pre-expiry window within which a refresh is attempted.
    refresh_threshold: chrono::Duration,
    last_check: Mutex<Option<Instant>>,
}

impl CredentialStore {
    pub fn new(path: PathBuf, config: &AuthConfig) -> Self {
        Self {
            path,
            check_interval: Duration::from_secs(config.token_check_interval_secs),
            refresh_threshold: chrono::Duration::seconds(config.refresh_threshold_secs as i64),
            last_check: Mutex::new(None),
        }
    }

    /// Loads the persisted credential. Absent or unreadable records yield
    /// `None`.
    pub fn load(&self) -> Option<Credential> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "could not read credential record");
                return None;
            }
        };
        match serde_json::from_str(&contents) {
            Ok(credential) => Some(credential),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "corrupt credential record, treating as absent");
                None
            }
        }
    }

    /// Atomically overwrites the durable record.
    pub fn save(&self, credential: &Credential) -> Result<(), TuberelayError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| TuberelayError::Storage {
                message: format!("failed to create data directory {}", parent.display()),
                source: Some(Box::new(e)),
            })?;
        }

        let contents = serde_json::to_string_pretty(credential).map_err(|e| {
            TuberelayError::Internal(format!("failed to serialize credential: {e}"))
        })?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, contents).map_err(|e| TuberelayError::Storage {
            message: format!("failed to write credential record {}", tmp.display()),
            source: Some(Box::new(e)),
        })?;
        std::fs::rename(&tmp, &self.path).map_err(|e| TuberelayError::Storage {
            message: format!("failed to persist credential record {}", self.path.display()),
            source: Some(Box::new(e)),
        })?;

        debug!(path = %self.path.display(), "credential stored");
        Ok(())
    }

    /// Removes the persisted record. Idempotent.
    pub fn clear(&self) -> Result<(), TuberelayError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(TuberelayError::Storage {
                message: format!("failed to remove credential record {}", self.path.display()),
                source: Some(Box::new(e)),
            }),
        }
    }

    /// Returns a credential safe to hand to the uploader, refreshing it
    /// first when it is within the refresh threshold of expiry.
    ///
    /// Provider-facing checks are throttled to once per the configured
    /// interval; between checks the last-known-good credential is returned
    /// untouched. A failed refresh (or one that is needed but impossible)
    /// surfaces as [`TuberelayError::CredentialExpired`] rather than a stale
    /// credential -- the caller must re-run the authorization flow.
    pub async fn ensure_fresh(
        &self,
        credential: Credential,
        provider: &dyn OauthProvider,
    ) -> Result<Credential, TuberelayError> {
        {
            let mut last = self.last_check.lock().expect("credential store lock poisoned");
            if let Some(at) = *last
                && at.elapsed() < self.check_interval
            {
                return Ok(credential);
            }
            *last = Some(Instant::now());
        }

        if !credential.expires_within(self.refresh_threshold) {
            return Ok(credential);
        }

        if credential.refresh_token.is_none() {
            return Err(TuberelayError::CredentialExpired(
                "no refresh token; re-run the authorization flow".to_string(),
            ));
        }

        info!("credential near expiry, refreshing");
        match provider.refresh(&credential).await {
            Ok(refreshed) => {
                self.save(&refreshed)?;
                info!("credential refreshed");
                Ok(refreshed)
            }
            Err(e) => Err(TuberelayError::CredentialExpired(format!(
                "refresh failed: {e}"
            ))),
        }
    }
}
