// SPDX-FileCopyrightText: 2026 Tuberelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parsing of chat commands.

/// A parsed inbound chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    /// `/setadmin <password>`; `password` is `None` when the argument is
    /// missing.
    SetAdmin { password: Option<String> },
    Auth,
    CheckAuth,
    Unknown(String),
    /// Non-command text -- a pasted authorization code, when a flow waits.
    Text(String),
}

/// Parse a message into a [`Command`].
///
/// Commands may carry a bot mention (`/auth@MyBot`), which is stripped.
pub fn parse_command(text: &str) -> Command {
    let trimmed = text.trim();
    if !trimmed.starts_with('/') {
        return Command::Text(trimmed.to_string());
    }

    let mut parts = trimmed.split_whitespace();
    let raw_cmd = parts.next().unwrap_or("");
    let cmd = raw_cmd.split('@').next().unwrap_or(raw_cmd);

    match cmd {
        "/start" => Command::Start,
        "/help" => Command::Help,
        "/setadmin" => Command::SetAdmin {
            password: parts.next().map(str::to_string),
        },
        "/auth" => Command::Auth,
        "/checkauth" => Command::CheckAuth,
        other => Command::Unknown(other.to_string()),
    }
}
