// SPDX-FileCopyrightText: 2026 Tuberelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel adapter trait for the messaging platform integration.

use async_trait::async_trait;

use crate::error::TuberelayError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{InboundMessage, MessageId, OutboundMessage};

/// Adapter for a bidirectional text messaging channel.
///
/// The session core treats the channel purely as "send text to a chat" and
/// "receive the next text message"; all platform detail stays behind this
/// trait.
#[async_trait]
pub trait ChannelAdapter: PluginAdapter {
    /// Establishes a connection to the messaging platform.
    async fn connect(&mut self) -> Result<(), TuberelayError>;

    /// Sends a message through the channel.
    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, TuberelayError>;

    /// Receives the next inbound message from the channel.
    async fn receive(&self) -> Result<InboundMessage, TuberelayError>;
}
