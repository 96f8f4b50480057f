// SPDX-FileCopyrightText: 2026 Tuberelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The out-of-band OAuth relay state machine.
//!
//! States: Idle -> AwaitingCode -> Exchanging -> {Authorized | Failed},
//! returning to Idle on recoverable failure so a fresh flow is always
//! possible without a restart.
//!
//! No network callback is reachable in this deployment, so a human copies
//! the code from the provider's consent page and pastes it into the admin
//! chat. The wait for that paste is a cancellable timed wait on a oneshot
//! channel, not a sleep-poll loop: the timeout and cancellation paths are
//! deterministic. Code capture and the waiting-flag flip happen in one
//! critical section, so a second pasted message can never overwrite an
//! in-flight exchange.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, oneshot};
use tracing::{debug, info, warn};

use tuberelay_config::model::AuthConfig;
use tuberelay_core::{Credential, OauthProvider, TuberelayError};

use crate::normalize::normalize_oob_code;
use crate::store::CredentialStore;

/// Internal relay state. The oneshot sender lives inside `AwaitingCode` so
/// capturing the code and leaving the waiting state are one atomic swap.
enum RelayState {
    Idle,
    AwaitingCode {
        started_at: DateTime<Utc>,
        code_tx: oneshot::Sender<String>,
    },
    Exchanging,
    Authorized,
    Failed,
}

/// Observable snapshot of the relay state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayStatus {
    Idle,
    AwaitingCode,
    Exchanging,
    Authorized,
    Failed,
}

impl std::fmt::Display for RelayStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelayStatus::Idle => write!(f, "idle"),
            RelayStatus::AwaitingCode => write!(f, "awaiting code"),
            RelayStatus::Exchanging => write!(f, "exchanging"),
            RelayStatus::Authorized => write!(f, "authorized"),
            RelayStatus::Failed => write!(f, "failed"),
        }
    }
}

/// A started authorization flow: the URL for the human, and the receiving
/// end of the code channel for [`OauthRelay::wait_and_exchange`].
#[derive(Debug)]
pub struct AuthRequest {
    pub auth_url: String,
    code_rx: oneshot::Receiver<String>,
}

/// Orchestrates one out-of-band authorization flow at a time.
pub struct OauthRelay {
    state: Mutex<RelayState>,
    provider: Arc<dyn OauthProvider>,
    store: Arc<CredentialStore>,
    code_timeout: Duration,
}

impl OauthRelay {
    pub fn new(
        provider: Arc<dyn OauthProvider>,
        store: Arc<CredentialStore>,
        config: &AuthConfig,
    ) -> Self {
        Self {
            state: Mutex::new(RelayState::Idle),
            provider,
            store,
            code_timeout: Duration::from_secs(config.code_timeout_secs),
        }
    }

    /// Current state snapshot.
    pub async fn status(&self) -> RelayStatus {
        match *self.state.lock().await {
            RelayState::Idle => RelayStatus::Idle,
            RelayState::AwaitingCode { .. } => RelayStatus::AwaitingCode,
            RelayState::Exchanging => RelayStatus::Exchanging,
            RelayState::Authorized => RelayStatus::Authorized,
            RelayState::Failed => RelayStatus::Failed,
        }
    }

    /// When the current flow started waiting for its code, if it is.
    pub async fn awaiting_since(&self) -> Option<DateTime<Utc>> {
        match *self.state.lock().await {
            RelayState::AwaitingCode { started_at, .. } => Some(started_at),
            _ => None,
        }
    }

    /// Starts a flow: builds the authorization URL and transitions to
    /// AwaitingCode.
    ///
    /// Valid from Idle, and from Authorized/Failed (re-authorization and
    /// retry both reset). While a flow is awaiting a code or exchanging one,
    /// returns [`TuberelayError::AuthInProgress`] -- two overlapping flows
    /// are never allowed.
    pub async fn begin(&self) -> Result<AuthRequest, TuberelayError> {
        let mut state = self.state.lock().await;

        if matches!(
            *state,
            RelayState::AwaitingCode { .. } | RelayState::Exchanging
        ) {
            return Err(TuberelayError::AuthInProgress);
        }

        let (code_tx, code_rx) = oneshot::channel();
        *state = RelayState::AwaitingCode {
            started_at: Utc::now(),
            code_tx,
        };

        let auth_url = self.provider.authorization_url();
        info!("authorization flow started, awaiting out-of-band code");
        Ok(AuthRequest { auth_url, code_rx })
    }

    /// Accepts a pasted code while a flow is awaiting one.
    ///
    /// Outside AwaitingCode this is rejected with no state change. The raw
    /// text is normalized, the state swaps to Exchanging, and the candidate
    /// is handed to the waiting [`wait_and_exchange`](Self::wait_and_exchange)
    /// call. Returns the normalized candidate so the caller can acknowledge
    /// receipt (length only -- never echo the code).
    pub async fn submit_code(&self, raw_text: &str) -> Result<String, TuberelayError> {
        let mut state = self.state.lock().await;

        if !matches!(*state, RelayState::AwaitingCode { .. }) {
            return Err(TuberelayError::NotAwaitingCode);
        }

        let previous = std::mem::replace(&mut *state, RelayState::Exchanging);
        let RelayState::AwaitingCode { code_tx, .. } = previous else {
            unreachable!("state checked above");
        };

        let candidate = normalize_oob_code(raw_text);
        debug!(len = candidate.len(), "authorization code captured");

        if code_tx.send(candidate.clone()).is_err() {
            // The waiter timed out in the same instant; reset for a retry.
            *state = RelayState::Idle;
            return Err(TuberelayError::NotAwaitingCode);
        }

        Ok(candidate)
    }

    /// Drives the flow to completion: waits (bounded) for the code, then
    /// exchanges it.
    ///
    /// - Timeout: the relay resets to Idle and exactly one
    ///   [`TuberelayError::AuthTimeout`] is returned.
    /// - `invalid_grant`: resets to Idle so the admin can immediately retry.
    /// - Any other exchange failure: Failed, but a later `begin` still
    ///   resets.
    pub async fn wait_and_exchange(
        &self,
        request: AuthRequest,
    ) -> Result<Credential, TuberelayError> {
        let code = match tokio::time::timeout(self.code_timeout, request.code_rx).await {
            Ok(Ok(code)) => code,
            Ok(Err(_)) => {
                // Sender dropped without sending: the flow was torn down.
                *self.state.lock().await = RelayState::Idle;
                return Err(TuberelayError::Internal(
                    "authorization flow was abandoned".to_string(),
                ));
            }
            Err(_) => {
                *self.state.lock().await = RelayState::Idle;
                warn!(timeout = ?self.code_timeout, "no authorization code arrived in time");
                return Err(TuberelayError::AuthTimeout(self.code_timeout));
            }
        };

        match self.provider.exchange_code(&code).await {
            Ok(credential) => {
                if let Err(e) = self.store.save(&credential) {
                    *self.state.lock().await = RelayState::Failed;
                    return Err(e);
                }
                *self.state.lock().await = RelayState::Authorized;
                info!("authorization complete, credential stored");
                Ok(credential)
            }
            Err(TuberelayError::InvalidGrant(detail)) => {
                *self.state.lock().await = RelayState::Idle;
                warn!(detail = %detail, "authorization code rejected, flow reset");
                Err(TuberelayError::InvalidGrant(detail))
            }
            Err(e) => {
                *self.state.lock().await = RelayState::Failed;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use tuberelay_test_utils::MockOauthProvider;

    fn test_credential() -> Credential {
        Credential {
            access_token: "ya29.test".to_string(),
            refresh_token: Some("1//test".to_string()),
            // Fixed expiry so separately built instances compare equal.
            expiry: "2030-01-01T00:00:00Z".parse().unwrap(),
        }
    }

    struct Fixture {
        relay: OauthRelay,
        provider: Arc<MockOauthProvider>,
        store: Arc<CredentialStore>,
        _dir: tempfile::TempDir,
    }

    fn fixture_with_timeout(code_timeout_secs: u64) -> Fixture {
        let dir = tempdir().unwrap();
        let config = AuthConfig {
            admin_password: None,
            code_timeout_secs,
            token_check_interval_secs: 1800,
            refresh_threshold_secs: 300,
        };
        let provider = Arc::new(MockOauthProvider::new());
        let store = Arc::new(CredentialStore::new(
            dir.path().join("credentials.json"),
            &config,
        ));
        let relay = OauthRelay::new(provider.clone(), store.clone(), &config);
        Fixture {
            relay,
            provider,
            store,
            _dir: dir,
        }
    }

    fn fixture() -> Fixture {
        fixture_with_timeout(300)
    }

    #[tokio::test]
    async fn begin_transitions_to_awaiting() {
        let f = fixture();
        assert_eq!(f.relay.status().await, RelayStatus::Idle);

        let request = f.relay.begin().await.unwrap();
        assert!(!request.auth_url.is_empty());
        assert_eq!(f.relay.status().await, RelayStatus::AwaitingCode);
        assert!(f.relay.awaiting_since().await.is_some());
    }

    #[tokio::test]
    async fn begin_while_awaiting_is_rejected() {
        let f = fixture();
        let _request = f.relay.begin().await.unwrap();
        assert!(matches!(
            f.relay.begin().await.unwrap_err(),
            TuberelayError::AuthInProgress
        ));
        // The original flow is untouched.
        assert_eq!(f.relay.status().await, RelayStatus::AwaitingCode);
    }

    #[tokio::test]
    async fn submit_outside_awaiting_is_rejected_without_transition() {
        let f = fixture();
        assert!(matches!(
            f.relay.submit_code("4/abc").await.unwrap_err(),
            TuberelayError::NotAwaitingCode
        ));
        assert_eq!(f.relay.status().await, RelayStatus::Idle);
    }

    #[tokio::test]
    async fn happy_path_authorizes_and_persists() {
        let f = fixture();
        f.provider.push_exchange_ok(test_credential());

        let request = f.relay.begin().await.unwrap();
        f.relay.submit_code("  '4/0AY0e-g7abc123XYZ'  ").await.unwrap();

        let credential = f.relay.wait_and_exchange(request).await.unwrap();
        assert_eq!(credential, test_credential());
        assert_eq!(f.relay.status().await, RelayStatus::Authorized);
        assert_eq!(f.store.load(), Some(test_credential()));

        // The provider saw the normalized candidate, not the raw paste.
        assert_eq!(f.provider.exchange_codes(), vec!["4/0AY0e-g7abc123XYZ"]);
    }

    #[tokio::test]
    async fn second_submission_cannot_overwrite_inflight_exchange() {
        let f = fixture();
        f.provider.push_exchange_ok(test_credential());

        let request = f.relay.begin().await.unwrap();
        f.relay.submit_code("4/first").await.unwrap();

        // State is Exchanging now; a second paste is rejected outright.
        assert!(matches!(
            f.relay.submit_code("4/second").await.unwrap_err(),
            TuberelayError::NotAwaitingCode
        ));

        f.relay.wait_and_exchange(request).await.unwrap();
        assert_eq!(f.provider.exchange_codes(), vec!["4/first"]);
    }

    #[tokio::test]
    async fn timeout_resets_to_idle_and_reports_once() {
        let f = fixture_with_timeout(0);
        // Zero-second timeout: the wait elapses immediately.
        let request = f.relay.begin().await.unwrap();

        let err = f.relay.wait_and_exchange(request).await.unwrap_err();
        assert!(matches!(err, TuberelayError::AuthTimeout(_)));
        assert_eq!(f.relay.status().await, RelayStatus::Idle);

        // A fresh begin succeeds after the timeout.
        assert!(f.relay.begin().await.is_ok());
    }

    #[tokio::test]
    async fn invalid_grant_resets_to_idle_not_failed() {
        let f = fixture();
        f.provider
            .push_exchange_err(TuberelayError::InvalidGrant("expired code".to_string()));

        let request = f.relay.begin().await.unwrap();
        f.relay.submit_code("4/expired").await.unwrap();

        let err = f.relay.wait_and_exchange(request).await.unwrap_err();
        assert!(matches!(err, TuberelayError::InvalidGrant(_)));
        assert_eq!(f.relay.status().await, RelayStatus::Idle);
        assert!(f.relay.begin().await.is_ok());
    }

    #[tokio::test]
    async fn other_exchange_failure_goes_to_failed_but_begin_resets() {
        let f = fixture();
        f.provider.push_exchange_err(TuberelayError::TokenExchange {
            message: "server on fire".to_string(),
            source: None,
        });

        let request = f.relay.begin().await.unwrap();
        f.relay.submit_code("4/abc").await.unwrap();

        let err = f.relay.wait_and_exchange(request).await.unwrap_err();
        assert!(matches!(err, TuberelayError::TokenExchange { .. }));
        assert_eq!(f.relay.status().await, RelayStatus::Failed);

        // Failed does not wedge the relay.
        assert!(f.relay.begin().await.is_ok());
        assert_eq!(f.relay.status().await, RelayStatus::AwaitingCode);
    }

    #[tokio::test]
    async fn reauthorization_after_success_is_allowed() {
        let f = fixture();
        f.provider.push_exchange_ok(test_credential());

        let request = f.relay.begin().await.unwrap();
        f.relay.submit_code("4/abc").await.unwrap();
        f.relay.wait_and_exchange(request).await.unwrap();
        assert_eq!(f.relay.status().await, RelayStatus::Authorized);

        assert!(f.relay.begin().await.is_ok());
    }
}
