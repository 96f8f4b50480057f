// SPDX-FileCopyrightText: 2026 Tuberelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Google OAuth client for the out-of-band authorization flow.
//!
//! Implements [`OauthProvider`] against Google's OAuth 2.0 endpoints with
//! the `urn:ietf:wg:oauth:2.0:oob` redirect, for deployments where no
//! network callback is reachable: the consent page displays the code and a
//! human pastes it into chat.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, warn};

use tuberelay_config::model::YoutubeConfig;
use tuberelay_core::traits::adapter::PluginAdapter;
use tuberelay_core::traits::oauth::OauthProvider;
use tuberelay_core::types::{AdapterType, Credential, HealthStatus};
use tuberelay_core::TuberelayError;

/// Out-of-band redirect marker: the consent page shows the code on screen.
const OOB_REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";

const AUTH_BASE_URL: &str = "https://accounts.google.com/o/oauth2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// HTTP client for Google's OAuth token endpoint.
#[derive(Debug, Clone)]
pub struct GoogleOauthClient {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    scopes: Vec<String>,
    auth_base_url: String,
    token_url: String,
}

/// Successful token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    expires_in: i64,
}

/// Error body from the token endpoint.
#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

impl GoogleOauthClient {
    /// Creates a new client from the YouTube OAuth configuration.
    ///
    /// Requires `client_id` and `client_secret` to be set.
    pub fn new(config: &YoutubeConfig) -> Result<Self, TuberelayError> {
        let client_id = config
            .client_id
            .clone()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                TuberelayError::Config("youtube.client_id is required for authorization".into())
            })?;
        let client_secret = config
            .client_secret
            .clone()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                TuberelayError::Config("youtube.client_secret is required for authorization".into())
            })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| TuberelayError::TokenExchange {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            client_id,
            client_secret,
            scopes: config.scopes.clone(),
            auth_base_url: AUTH_BASE_URL.to_string(),
            token_url: TOKEN_URL.to_string(),
        })
    }

    /// Overrides the endpoint URLs (for testing with wiremock).
    #[cfg(test)]
    fn with_base_urls(mut self, auth_base_url: String, token_url: String) -> Self {
        self.auth_base_url = auth_base_url;
        self.token_url = token_url;
        self
    }

    async fn post_token_request(
        &self,
        params: &[(&str, &str)],
        previous_refresh_token: Option<&str>,
    ) -> Result<Credential, TuberelayError> {
        let response = self
            .client
            .post(&self.token_url)
            .form(params)
            .send()
            .await
            .map_err(|e| TuberelayError::TokenExchange {
                message: format!("token request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, "token endpoint responded");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_token_error(status.as_u16(), &body));
        }

        let token: TokenResponse =
            response
                .json()
                .await
                .map_err(|e| TuberelayError::TokenExchange {
                    message: format!("malformed token response: {e}"),
                    source: Some(Box::new(e)),
                })?;

        Ok(Credential {
            access_token: token.access_token,
            // A refresh response usually omits the refresh token; keep the
            // one we already hold.
            refresh_token: token
                .refresh_token
                .or_else(|| previous_refresh_token.map(str::to_string)),
            expiry: Utc::now() + chrono::Duration::seconds(token.expires_in),
        })
    }
}

/// Map a non-success token endpoint response to an error kind.
///
/// `invalid_grant` (malformed, expired, or revoked code/token) is the
/// recoverable case the relay resets on; everything else is a generic
/// exchange failure.
fn classify_token_error(status: u16, body: &str) -> TuberelayError {
    match serde_json::from_str::<TokenErrorResponse>(body) {
        Ok(err) if err.error == "invalid_grant" => {
            TuberelayError::InvalidGrant(err.error_description.unwrap_or(err.error))
        }
        Ok(err) => TuberelayError::TokenExchange {
            message: format!(
                "token endpoint returned {status}: {} ({})",
                err.error,
                err.error_description.unwrap_or_default()
            ),
            source: None,
        },
        Err(_) => {
            warn!(status, "unparseable token endpoint error body");
            TuberelayError::TokenExchange {
                message: format!("token endpoint returned {status}"),
                source: None,
            }
        }
    }
}

#[async_trait]
impl PluginAdapter for GoogleOauthClient {
    fn name(&self) -> &str {
        "google-oauth"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, TuberelayError> {
        // The token endpoint has no ping; a constructed client is healthy.
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), TuberelayError> {
        Ok(())
    }
}

#[async_trait]
impl OauthProvider for GoogleOauthClient {
    fn authorization_url(&self) -> String {
        let scope = self.scopes.join(" ");
        reqwest::Url::parse_with_params(
            &self.auth_base_url,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", OOB_REDIRECT_URI),
                ("response_type", "code"),
                ("scope", scope.as_str()),
                ("access_type", "offline"),
                ("prompt", "consent"),
            ],
        )
        .expect("authorization base URL is valid")
        .to_string()
    }

    async fn exchange_code(&self, code: &str) -> Result<Credential, TuberelayError> {
        let params = [
            ("code", code),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("redirect_uri", OOB_REDIRECT_URI),
            ("grant_type", "authorization_code"),
        ];
        self.post_token_request(&params, None).await
    }

    async fn refresh(&self, credential: &Credential) -> Result<Credential, TuberelayError> {
        let Some(refresh_token) = credential.refresh_token.as_deref() else {
            return Err(TuberelayError::TokenExchange {
                message: "credential has no refresh token".to_string(),
                source: None,
            });
        };

        let params = [
            ("refresh_token", refresh_token),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("grant_type", "refresh_token"),
        ];
        self.post_token_request(&params, Some(refresh_token)).await
    }
}
