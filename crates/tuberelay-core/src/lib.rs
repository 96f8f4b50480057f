// SPDX-FileCopyrightText: 2026 Tuberelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the tuberelay bot.
//!
//! This crate provides the foundational trait definitions, error type, and
//! common types used throughout the tuberelay workspace. The chat channel
//! and the OAuth provider integrations implement traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::TuberelayError;
pub use types::{AdapterType, Credential, HealthStatus, InboundMessage, MessageId, OutboundMessage};

// Re-export the adapter traits at crate root.
pub use traits::{ChannelAdapter, OauthProvider, PluginAdapter};
