// SPDX-FileCopyrightText: 2026 Tuberelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `tuberelay status` command implementation.
//!
//! Reports the local deployment state from the durable records: admin
//! registration, credential presence and expiry, and the lock file.

use serde::Serialize;

use tuberelay_auth::{AdminRegistry, CredentialStore};
use tuberelay_config::model::TuberelayConfig;
use tuberelay_core::TuberelayError;
use tuberelay_lock::{LockGuard, LockState};

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub admin_registered: bool,
    pub admin_chat_id: Option<String>,
    pub credential_present: bool,
    pub credential_expiry: Option<String>,
    pub credential_expired: Option<bool>,
    pub lock_state: String,
}

/// Run the `tuberelay status` command.
pub fn run_status(config: &TuberelayConfig, json: bool) -> Result<(), TuberelayError> {
    let registry = AdminRegistry::open(
        config.storage.admin_record_path(),
        config.auth.admin_password.clone().unwrap_or_default(),
    );
    let store = CredentialStore::new(config.storage.credential_path(), &config.auth);

    let lock_path = config.lock.lock_path(&config.storage.data_dir);
    let lock_state = match LockGuard::inspect(&lock_path, &config.lock) {
        LockState::Unlocked => "unlocked",
        LockState::HeldBySelf => "held by this process",
        LockState::HeldByOtherFresh => "held by a running instance",
        LockState::HeldByOtherStale => "stale (reclaimable)",
    };

    let admin = registry.current_admin();
    let credential = store.load();

    let report = StatusReport {
        admin_registered: admin.is_some(),
        admin_chat_id: admin,
        credential_present: credential.is_some(),
        credential_expiry: credential.as_ref().map(|c| c.expiry.to_rfc3339()),
        credential_expired: credential.as_ref().map(|c| c.is_expired()),
        lock_state: lock_state.to_string(),
    };

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        match &report.admin_chat_id {
            Some(id) => println!("admin:      registered (chat {id})"),
            None => println!("admin:      not registered (use /setadmin)"),
        }
        match (&report.credential_expiry, report.credential_expired) {
            (Some(expiry), Some(expired)) => {
                let suffix = if expired { " [EXPIRED]" } else { "" };
                println!("credential: present, expires {expiry}{suffix}");
            }
            _ => println!("credential: absent (use /auth)"),
        }
        println!("lock:       {}", report.lock_state);
    }

    Ok(())
}
