// SPDX-FileCopyrightText: 2026 Tuberelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Admin identity persistence and password gating.
//!
//! One admin per deployment. The first chat to present the shared secret via
//! `/setadmin` becomes the admin; re-registration with the secret replaces
//! the identity. The record is a small JSON file so a deployment survives
//! restarts without re-pairing.

use std::path::PathBuf;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use tuberelay_core::TuberelayError;

/// The persisted admin record.
///
/// The stored password supersedes the configured shared secret on load,
/// letting a deployment rotate the secret without touching config.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AdminRecord {
    admin_chat_id: String,
    admin_password: String,
}

struct AdminState {
    admin_chat_id: Option<String>,
    password: String,
}

/// Registry of the single admin identity, gated by a shared password.
pub struct AdminRegistry {
    path: PathBuf,
    state: RwLock<AdminState>,
}

impl AdminRegistry {
    /// Opens the registry, loading a persisted record if one exists.
    ///
    /// `shared_secret` is the configured password; a password stored in a
    /// previously persisted record takes precedence over it.
    pub fn open(path: PathBuf, shared_secret: String) -> Self {
        let mut state = AdminState {
            admin_chat_id: None,
            password: shared_secret,
        };

        match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<AdminRecord>(&contents) {
                Ok(record) => {
                    info!(admin_chat_id = %record.admin_chat_id, "loaded admin record");
                    state.admin_chat_id = Some(record.admin_chat_id);
                    state.password = record.admin_password;
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "corrupt admin record, ignoring");
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not read admin record");
            }
        }

        Self {
            path,
            state: RwLock::new(state),
        }
    }

    /// Registers `requester_id` as the sole admin if `password` matches the
    /// shared secret. A mismatch returns [`TuberelayError::BadPassword`]
    /// without mutating state; a persistence failure is surfaced, not
    /// swallowed.
    pub fn register(&self, password: &str, requester_id: &str) -> Result<(), TuberelayError> {
        let mut state = self.state.write().expect("admin registry lock poisoned");

        if password != state.password {
            return Err(TuberelayError::BadPassword);
        }

        let record = AdminRecord {
            admin_chat_id: requester_id.to_string(),
            admin_password: state.password.clone(),
        };
        self.persist(&record)?;

        state.admin_chat_id = Some(requester_id.to_string());
        info!(admin_chat_id = %requester_id, "admin registered");
        Ok(())
    }

    /// Returns the persisted admin id, or `None` if never registered.
    pub fn current_admin(&self) -> Option<String> {
        self.state
            .read()
            .expect("admin registry lock poisoned")
            .admin_chat_id
            .clone()
    }

    /// Whether `id` is the registered admin.
    pub fn is_admin(&self, id: &str) -> bool {
        self.current_admin().as_deref() == Some(id)
    }

    /// Removes the persisted record and forgets the admin. Idempotent.
    pub fn clear(&self) -> Result<(), TuberelayError> {
        let mut state = self.state.write().expect("admin registry lock poisoned");
        state.admin_chat_id = None;

        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(TuberelayError::Storage {
                message: format!("failed to remove admin record {}", self.path.display()),
                source: Some(Box::new(e)),
            }),
        }
    }

    fn persist(&self, record: &AdminRecord) -> Result<(), TuberelayError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| TuberelayError::Storage {
                message: format!("failed to create data directory {}", parent.display()),
                source: Some(Box::new(e)),
            })?;
        }
        let contents = serde_json::to_string_pretty(record).map_err(|e| {
            TuberelayError::Internal(format!("failed to serialize admin record: {e}"))
        })?;
        std::fs::write(&self.path, contents).map_err(|e| TuberelayError::Storage {
            message: format!("failed to write admin record {}", self.path.display()),
            source: Some(Box::new(e)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn registry_at(dir: &std::path::Path) -> AdminRegistry {
        AdminRegistry::open(dir.join("admin.json"), "secret".to_string())
    }

    #[test]
    fn wrong_password_never_changes_admin() {
        let dir = tempdir().unwrap();
        let registry = registry_at(dir.path());

        for bad in ["", "Secret", "secret ", "hunter2"] {
            let err = registry.register(bad, "chat-1").unwrap_err();
            assert!(matches!(err, TuberelayError::BadPassword));
            assert_eq!(registry.current_admin(), None);
        }
        assert!(!dir.path().join("admin.json").exists());
    }

    #[test]
    fn correct_password_registers_admin() {
        let dir = tempdir().unwrap();
        let registry = registry_at(dir.path());

        registry.register("secret", "chat-42").unwrap();
        assert_eq!(registry.current_admin().as_deref(), Some("chat-42"));
        assert!(registry.is_admin("chat-42"));
        assert!(!registry.is_admin("chat-43"));
    }

    #[test]
    fn reregistration_replaces_the_single_admin() {
        let dir = tempdir().unwrap();
        let registry = registry_at(dir.path());

        registry.register("secret", "chat-1").unwrap();
        registry.register("secret", "chat-2").unwrap();
        assert_eq!(registry.current_admin().as_deref(), Some("chat-2"));
        assert!(!registry.is_admin("chat-1"));
    }

    #[test]
    fn admin_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("admin.json");

        let registry = AdminRegistry::open(path.clone(), "secret".to_string());
        registry.register("secret", "chat-7").unwrap();
        drop(registry);

        let reopened = AdminRegistry::open(path, "secret".to_string());
        assert!(reopened.is_admin("chat-7"));
    }

    #[test]
    fn persisted_password_overrides_configured_secret() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("admin.json");

        let registry = AdminRegistry::open(path.clone(), "old-secret".to_string());
        registry.register("old-secret", "chat-1").unwrap();
        drop(registry);

        // Reopen with a different configured secret: the stored one wins.
        let reopened = AdminRegistry::open(path, "new-secret".to_string());
        assert!(matches!(
            reopened.register("new-secret", "chat-2").unwrap_err(),
            TuberelayError::BadPassword
        ));
        reopened.register("old-secret", "chat-2").unwrap();
        assert!(reopened.is_admin("chat-2"));
    }

    #[test]
    fn corrupt_record_is_ignored() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("admin.json");
        std::fs::write(&path, "{ not json").unwrap();

        let registry = AdminRegistry::open(path, "secret".to_string());
        assert_eq!(registry.current_admin(), None);
        registry.register("secret", "chat-1").unwrap();
        assert!(registry.is_admin("chat-1"));
    }

    #[test]
    fn clear_is_idempotent() {
        let dir = tempdir().unwrap();
        let registry = registry_at(dir.path());

        registry.register("secret", "chat-1").unwrap();
        registry.clear().unwrap();
        assert_eq!(registry.current_admin(), None);
        registry.clear().unwrap();
    }
}
