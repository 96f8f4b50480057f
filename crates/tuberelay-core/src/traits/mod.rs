// SPDX-FileCopyrightText: 2026 Tuberelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter traits defining the seams between the session core and the
//! external platforms it talks to.

pub mod adapter;
pub mod channel;
pub mod oauth;

pub use adapter::PluginAdapter;
pub use channel::ChannelAdapter;
pub use oauth::OauthProvider;
