// SPDX-FileCopyrightText: 2026 Tuberelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message filtering and conversion for the Telegram channel.
//!
//! Only private-chat text messages enter the bot. Authorization is NOT
//! decided here: `/setadmin` must be reachable before any admin exists, so
//! privileged commands are gated per-command in the serve loop against the
//! admin registry.

use teloxide::prelude::*;
use teloxide::types::ChatKind;

use tuberelay_core::types::InboundMessage;

/// Checks whether the message is from a private (DM) chat.
///
/// Group, supergroup, and channel messages return `false`.
pub fn is_dm(msg: &Message) -> bool {
    matches!(msg.chat.kind, ChatKind::Private(_))
}

/// Extracts the text of a message; media and service messages yield `None`.
pub fn extract_text(msg: &Message) -> Option<String> {
    msg.text().map(str::to_string)
}

/// Converts a Telegram message and its text into an [`InboundMessage`].
pub fn to_inbound_message(msg: &Message, text: String) -> InboundMessage {
    let sender_id = msg
        .from
        .as_ref()
        .map(|u| u.id.0.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    InboundMessage {
        id: msg.id.0.to_string(),
        channel: "telegram".to_string(),
        sender_id,
        chat_id: msg.chat.id.0.to_string(),
        text,
        timestamp: chrono::DateTime::to_rfc3339(&msg.date),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a mock private chat message from JSON, matching Telegram Bot API structure.
    fn make_private_message(user_id: u64, text: &str) -> Message {
        let json = serde_json::json!({
            "message_id": 1,
            "date": 1700000000i64,
            "chat": {
                "id": user_id as i64,
                "type": "private",
                "first_name": "Test",
            },
            "from": {
                "id": user_id,
                "is_bot": false,
                "first_name": "Test",
            },
            "text": text,
        });

        serde_json::from_value(json).expect("failed to deserialize mock message")
    }

    /// Build a mock group chat message.
    fn make_group_message(user_id: u64, text: &str) -> Message {
        let json = serde_json::json!({
            "message_id": 1,
            "date": 1700000000i64,
            "chat": {
                "id": -100123i64,
                "type": "supergroup",
                "title": "Test Group",
            },
            "from": {
                "id": user_id,
                "is_bot": false,
                "first_name": "Test",
            },
            "text": text,
        });

        serde_json::from_value(json).expect("failed to deserialize mock group message")
    }

    #[test]
    fn is_dm_private_chat() {
        let msg = make_private_message(12345, "hello");
        assert!(is_dm(&msg));
    }

    #[test]
    fn is_dm_group_chat() {
        let msg = make_group_message(12345, "hello");
        assert!(!is_dm(&msg));
    }

    #[test]
    fn extract_text_returns_message_text() {
        let msg = make_private_message(12345, "hello world");
        assert_eq!(extract_text(&msg).as_deref(), Some("hello world"));
    }

    #[test]
    fn to_inbound_message_maps_fields() {
        let msg = make_private_message(12345, "/auth");
        let inbound = to_inbound_message(&msg, "/auth".to_string());

        assert_eq!(inbound.id, "1");
        assert_eq!(inbound.channel, "telegram");
        assert_eq!(inbound.sender_id, "12345");
        assert_eq!(inbound.chat_id, "12345");
        assert_eq!(inbound.text, "/auth");
    }
}
