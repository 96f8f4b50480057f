// SPDX-FileCopyrightText: 2026 Tuberelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OAuth provider trait for the video platform's authorization endpoints.
//!
//! The session core never constructs these network calls itself; it hands a
//! normalized out-of-band code to the provider and receives a [`Credential`]
//! back.

use async_trait::async_trait;

use crate::error::TuberelayError;
use crate::traits::adapter::PluginAdapter;
use crate::types::Credential;

/// Adapter for the external authorization server.
#[async_trait]
pub trait OauthProvider: PluginAdapter {
    /// Builds the authorization URL a human must open to obtain an
    /// out-of-band code.
    fn authorization_url(&self) -> String;

    /// Exchanges an authorization code for a credential.
    ///
    /// A code the server classifies as invalid or expired surfaces as
    /// [`TuberelayError::InvalidGrant`]; any other failure as
    /// [`TuberelayError::TokenExchange`].
    async fn exchange_code(&self, code: &str) -> Result<Credential, TuberelayError>;

    /// Refreshes a credential using its refresh token.
    async fn refresh(&self, credential: &Credential) -> Result<Credential, TuberelayError>;
}
