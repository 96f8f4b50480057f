// SPDX-FileCopyrightText: 2026 Tuberelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The injected session-manager facade.
//!
//! Admin identity, the relay's waiting flag, and the credential record are
//! all fields of one `SessionManager` instance handed to every handler --
//! no process-wide globals, so tests run isolated instances side by side.

use std::sync::Arc;

use tuberelay_config::model::AuthConfig;
use tuberelay_core::{Credential, OauthProvider, TuberelayError};

use crate::admin::AdminRegistry;
use crate::relay::{AuthRequest, OauthRelay, RelayStatus};
use crate::store::CredentialStore;

/// Owns the credential session lifecycle: admin gating, the OAuth relay,
/// and credential persistence/refresh.
pub struct SessionManager {
    registry: AdminRegistry,
    relay: OauthRelay,
    store: Arc<CredentialStore>,
    provider: Arc<dyn OauthProvider>,
}

impl SessionManager {
    pub fn new(
        registry: AdminRegistry,
        store: Arc<CredentialStore>,
        provider: Arc<dyn OauthProvider>,
        config: &AuthConfig,
    ) -> Self {
        let relay = OauthRelay::new(provider.clone(), store.clone(), config);
        Self {
            registry,
            relay,
            store,
            provider,
        }
    }

    /// `/setadmin` -- registers `requester_id` as the admin if the password
    /// matches the shared secret.
    pub fn register_admin(
        &self,
        password: &str,
        requester_id: &str,
    ) -> Result<(), TuberelayError> {
        self.registry.register(password, requester_id)
    }

    pub fn current_admin(&self) -> Option<String> {
        self.registry.current_admin()
    }

    pub fn is_admin(&self, id: &str) -> bool {
        self.registry.is_admin(id)
    }

    /// `/auth` -- starts the authorization flow. Admin-only.
    pub async fn begin_auth(&self, sender_id: &str) -> Result<AuthRequest, TuberelayError> {
        self.require_admin(sender_id)?;
        self.relay.begin().await
    }

    /// A pasted code from the admin chat while a flow is waiting.
    ///
    /// Non-admin senders are rejected with no state change; the relay
    /// rejects codes outside the awaiting state the same way.
    pub async fn submit_code(
        &self,
        raw_text: &str,
        sender_id: &str,
    ) -> Result<String, TuberelayError> {
        self.require_admin(sender_id)?;
        self.relay.submit_code(raw_text).await
    }

    /// Drives a started flow to completion (bounded wait, then exchange).
    pub async fn complete_auth(&self, request: AuthRequest) -> Result<Credential, TuberelayError> {
        self.relay.wait_and_exchange(request).await
    }

    /// Whether the relay is currently waiting for a pasted code.
    pub async fn awaiting_code(&self) -> bool {
        self.relay.status().await == RelayStatus::AwaitingCode
    }

    pub async fn relay_status(&self) -> RelayStatus {
        self.relay.status().await
    }

    /// Loads the stored credential, refreshing it if it is near expiry.
    ///
    /// `CredentialExpired` means the admin must re-run `/auth`.
    pub async fn ensure_fresh_credential(&self) -> Result<Credential, TuberelayError> {
        let Some(credential) = self.store.load() else {
            return Err(TuberelayError::CredentialExpired(
                "no credential stored; run /auth first".to_string(),
            ));
        };
        self.store
            .ensure_fresh(credential, self.provider.as_ref())
            .await
    }

    /// Read-only snapshot of the stored credential, if any.
    pub fn stored_credential(&self) -> Option<Credential> {
        self.store.load()
    }

    fn require_admin(&self, sender_id: &str) -> Result<(), TuberelayError> {
        if !self.registry.is_admin(sender_id) {
            return Err(TuberelayError::NotAdmin {
                sender_id: sender_id.to_string(),
            });
        }
        Ok(())
    }
}
