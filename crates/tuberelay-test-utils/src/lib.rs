// SPDX-FileCopyrightText: 2026 Tuberelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for tuberelay integration tests.
//!
//! Mock implementations of the channel and OAuth provider seams so the
//! session core can be exercised deterministically, without Telegram or a
//! token endpoint.

pub mod mock_channel;
pub mod mock_oauth;

pub use mock_channel::MockChannel;
pub use mock_oauth::MockOauthProvider;
