// SPDX-FileCopyrightText: 2026 Tuberelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `tuberelay reset-auth` command implementation.
//!
//! Deletes the stored credential so the next `/auth` starts from scratch.
//! With `--admin`, the admin record is removed as well and the deployment
//! must be re-paired via `/setadmin`.

use tuberelay_auth::{AdminRegistry, CredentialStore};
use tuberelay_config::model::TuberelayConfig;
use tuberelay_core::TuberelayError;

/// Run the `tuberelay reset-auth` command.
pub fn run_reset_auth(config: &TuberelayConfig, include_admin: bool) -> Result<(), TuberelayError> {
    let store = CredentialStore::new(config.storage.credential_path(), &config.auth);
    let had_credential = store.load().is_some();
    store.clear()?;
    if had_credential {
        println!("credential record removed; run /auth to re-authorize");
    } else {
        println!("no credential record to remove");
    }

    if include_admin {
        let registry = AdminRegistry::open(
            config.storage.admin_record_path(),
            config.auth.admin_password.clone().unwrap_or_default(),
        );
        let had_admin = registry.current_admin().is_some();
        registry.clear()?;
        if had_admin {
            println!("admin record removed; re-pair with /setadmin");
        } else {
            println!("no admin record to remove");
        }
    }

    Ok(())
}
