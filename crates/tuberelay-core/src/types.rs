// SPDX-FileCopyrightText: 2026 Tuberelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the tuberelay crates.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Unique identifier for a delivered chat message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the type of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Channel,
    Provider,
}

/// An inbound text message received from a channel adapter.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Channel-assigned message id.
    pub id: String,
    /// Name of the channel adapter that produced the message.
    pub channel: String,
    /// Opaque external id of the sender, as a string.
    pub sender_id: String,
    /// Chat to route replies back to.
    pub chat_id: String,
    /// Message text.
    pub text: String,
    /// RFC 3339 timestamp of the message.
    pub timestamp: String,
}

/// An outbound text message to be sent via a channel adapter.
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    /// Name of the target channel adapter.
    pub channel: String,
    /// Destination chat.
    pub chat_id: String,
    /// Message text.
    pub text: String,
}

/// An OAuth access/refresh token pair with its expiry.
///
/// Persisted by the credential store; everything else receives read-only
/// clones. `Debug` output omits token contents.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    /// Absent when the provider did not grant offline access.
    pub refresh_token: Option<String>,
    pub expiry: DateTime<Utc>,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("expiry", &self.expiry)
            .finish()
    }
}

impl Credential {
    /// Whether the access token is past its expiry.
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expiry
    }

    /// Whether the access token expires within `threshold` from now.
    pub fn expires_within(&self, threshold: Duration) -> bool {
        Utc::now() + threshold > self.expiry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_credential(expiry: DateTime<Utc>) -> Credential {
        Credential {
            access_token: "ya29.sample-access".to_string(),
            refresh_token: Some("1//refresh-sample".to_string()),
            expiry,
        }
    }

    #[test]
    fn credential_debug_redacts_tokens() {
        let cred = sample_credential(Utc::now());
        let rendered = format!("{cred:?}");
        assert!(!rendered.contains("ya29"), "access token leaked: {rendered}");
        assert!(!rendered.contains("1//"), "refresh token leaked: {rendered}");
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn expiry_checks() {
        let fresh = sample_credential(Utc::now() + Duration::hours(1));
        assert!(!fresh.is_expired());
        assert!(!fresh.expires_within(Duration::minutes(5)));
        assert!(fresh.expires_within(Duration::hours(2)));

        let expired = sample_credential(Utc::now() - Duration::minutes(1));
        assert!(expired.is_expired());
        assert!(expired.expires_within(Duration::seconds(0)));
    }

    #[test]
    fn credential_serde_round_trip() {
        let cred = sample_credential(Utc::now());
        let json = serde_json::to_string(&cred).unwrap();
        let back: Credential = serde_json::from_str(&json).unwrap();
        assert_eq!(cred, back);
    }

    #[test]
    fn adapter_type_round_trip() {
        use std::str::FromStr;
        for variant in [AdapterType::Channel, AdapterType::Provider] {
            let s = variant.to_string();
            assert_eq!(AdapterType::from_str(&s).unwrap(), variant);
        }
    }
}
