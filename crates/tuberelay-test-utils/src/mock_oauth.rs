// SPDX-FileCopyrightText: 2026 Tuberelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock OAuth provider with scripted exchange and refresh results.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use tuberelay_core::traits::adapter::PluginAdapter;
use tuberelay_core::traits::oauth::OauthProvider;
use tuberelay_core::types::{AdapterType, Credential, HealthStatus};
use tuberelay_core::TuberelayError;

/// A scripted OAuth provider for testing the relay and the credential store.
///
/// Push expected results with `push_exchange_ok`/`push_exchange_err` (and the
/// refresh equivalents); each call pops the front of the queue. Codes passed
/// to `exchange_code` are recorded for assertion.
pub struct MockOauthProvider {
    auth_url: String,
    exchange_results: Mutex<VecDeque<Result<Credential, TuberelayError>>>,
    refresh_results: Mutex<VecDeque<Result<Credential, TuberelayError>>>,
    exchange_codes: Mutex<Vec<String>>,
    refresh_calls: AtomicUsize,
}

impl MockOauthProvider {
    pub fn new() -> Self {
        Self {
            auth_url: "https://auth.example/consent?client_id=mock".to_string(),
            exchange_results: Mutex::new(VecDeque::new()),
            refresh_results: Mutex::new(VecDeque::new()),
            exchange_codes: Mutex::new(Vec::new()),
            refresh_calls: AtomicUsize::new(0),
        }
    }

    pub fn push_exchange_ok(&self, credential: Credential) {
        self.exchange_results
            .lock()
            .unwrap()
            .push_back(Ok(credential));
    }

    pub fn push_exchange_err(&self, err: TuberelayError) {
        self.exchange_results.lock().unwrap().push_back(Err(err));
    }

    pub fn push_refresh_ok(&self, credential: Credential) {
        self.refresh_results
            .lock()
            .unwrap()
            .push_back(Ok(credential));
    }

    pub fn push_refresh_err(&self, err: TuberelayError) {
        self.refresh_results.lock().unwrap().push_back(Err(err));
    }

    /// Codes received by `exchange_code`, in order.
    pub fn exchange_codes(&self) -> Vec<String> {
        self.exchange_codes.lock().unwrap().clone()
    }

    /// Number of `refresh` calls made.
    pub fn refresh_count(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }
}

impl Default for MockOauthProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockOauthProvider {
    fn name(&self) -> &str {
        "mock-oauth"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, TuberelayError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), TuberelayError> {
        Ok(())
    }
}

#[async_trait]
impl OauthProvider for MockOauthProvider {
    fn authorization_url(&self) -> String {
        self.auth_url.clone()
    }

    async fn exchange_code(&self, code: &str) -> Result<Credential, TuberelayError> {
        self.exchange_codes.lock().unwrap().push(code.to_string());
        self.exchange_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(TuberelayError::Internal(
                    "no scripted exchange result".to_string(),
                ))
            })
    }

    async fn refresh(&self, _credential: &Credential) -> Result<Credential, TuberelayError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        self.refresh_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(TuberelayError::Internal(
                    "no scripted refresh result".to_string(),
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn credential() -> Credential {
        Credential {
            access_token: "token".to_string(),
            refresh_token: None,
            expiry: Utc::now(),
        }
    }

    #[tokio::test]
    async fn scripted_exchange_results_pop_in_order() {
        let provider = MockOauthProvider::new();
        provider.push_exchange_ok(credential());
        provider.push_exchange_err(TuberelayError::InvalidGrant("bad".to_string()));

        assert!(provider.exchange_code("4/one").await.is_ok());
        assert!(matches!(
            provider.exchange_code("4/two").await.unwrap_err(),
            TuberelayError::InvalidGrant(_)
        ));
        assert_eq!(provider.exchange_codes(), vec!["4/one", "4/two"]);
    }

    #[tokio::test]
    async fn unscripted_calls_error() {
        let provider = MockOauthProvider::new();
        assert!(provider.exchange_code("4/none").await.is_err());
        assert!(provider.refresh(&credential()).await.is_err());
        assert_eq!(provider.refresh_count(), 1);
    }
}
