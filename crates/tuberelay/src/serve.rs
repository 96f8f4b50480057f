// SPDX-FileCopyrightText: 2026 Tuberelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `tuberelay serve` command implementation.
//!
//! Acquires the single-instance lock, wires the session manager to the
//! Telegram channel and the Google OAuth client, and runs the command loop
//! until a shutdown signal arrives. Lock contention at startup is fatal --
//! the process exits non-zero rather than risk two owners.

use std::sync::Arc;

use tracing::{error, info, warn};

use tuberelay_auth::{AdminRegistry, CredentialStore, SessionManager};
use tuberelay_config::model::TuberelayConfig;
use tuberelay_core::{
    ChannelAdapter, InboundMessage, OauthProvider, OutboundMessage, TuberelayError,
};
use tuberelay_google::GoogleOauthClient;
use tuberelay_lock::LockGuard;
use tuberelay_telegram::TelegramChannel;

use crate::commands::{Command, parse_command};
use crate::shutdown;

const HELP_TEXT: &str = "Tuberelay relays videos from Telegram to YouTube.\n\
\n\
Commands:\n\
/setadmin <password> - register yourself as the bot admin\n\
/auth - authorize the bot with YouTube (admin only)\n\
/checkauth - check the YouTube credential (admin only)\n\
/help - this message\n\
\n\
During /auth, open the link the bot sends, approve access, then paste the\n\
displayed code back into this chat.";

/// Runs the `tuberelay serve` command.
pub async fn run_serve(config: TuberelayConfig) -> Result<(), TuberelayError> {
    init_tracing(&config.bot.log_level);

    info!(name = %config.bot.name, "starting tuberelay serve");

    // Single-instance guard. Held for the lifetime of the loop; released on
    // every exit path by Drop.
    let _lock = if config.lock.enabled {
        let path = config.lock.lock_path(&config.storage.data_dir);
        Some(LockGuard::acquire(path, &config.lock)?)
    } else {
        warn!("single-instance lock disabled by configuration");
        None
    };

    let shared_secret = config.auth.admin_password.clone().ok_or_else(|| {
        TuberelayError::Config("auth.admin_password is required for serve".into())
    })?;

    let provider: Arc<dyn OauthProvider> = Arc::new(GoogleOauthClient::new(&config.youtube)?);
    let registry = AdminRegistry::open(config.storage.admin_record_path(), shared_secret);
    let store = Arc::new(CredentialStore::new(
        config.storage.credential_path(),
        &config.auth,
    ));
    let manager = Arc::new(SessionManager::new(registry, store, provider, &config.auth));

    let mut telegram = TelegramChannel::new(&config.telegram)?;
    telegram.connect().await?;
    let channel: Arc<dyn ChannelAdapter> = Arc::new(telegram);

    let shutdown_token = shutdown::install_signal_handler();

    loop {
        tokio::select! {
            _ = shutdown_token.cancelled() => {
                info!("shutdown requested, leaving the command loop");
                break;
            }
            received = channel.receive() => {
                match received {
                    Ok(msg) => handle_message(&manager, &channel, msg).await,
                    Err(e) => {
                        error!(error = %e, "channel receive failed, shutting down");
                        break;
                    }
                }
            }
        }
    }

    channel.shutdown().await?;
    Ok(())
}

/// Dispatches one inbound message.
///
/// Privileged commands are gated against the admin registry here -- the
/// channel itself admits any DM so `/setadmin` works before an admin exists.
pub async fn handle_message(
    manager: &Arc<SessionManager>,
    channel: &Arc<dyn ChannelAdapter>,
    msg: InboundMessage,
) {
    let chat_id = msg.chat_id.clone();

    match parse_command(&msg.text) {
        Command::Start | Command::Help => {
            send(channel, &msg.channel, &chat_id, HELP_TEXT).await;
        }

        Command::SetAdmin { password: None } => {
            send(channel, &msg.channel, &chat_id, "Usage: /setadmin <password>").await;
        }

        Command::SetAdmin {
            password: Some(password),
        } => match manager.register_admin(&password, &chat_id) {
            Ok(()) => {
                send(
                    channel,
                    &msg.channel,
                    &chat_id,
                    "You are now the bot admin. Authorization links and codes go through this chat.",
                )
                .await;
            }
            Err(TuberelayError::BadPassword) => {
                send(channel, &msg.channel, &chat_id, "Wrong password.").await;
            }
            Err(e) => {
                error!(error = %e, "failed to persist admin record");
                send(
                    channel,
                    &msg.channel,
                    &chat_id,
                    "Could not save the admin record; check the bot logs.",
                )
                .await;
            }
        },

        Command::Auth => match manager.begin_auth(&chat_id).await {
            Ok(request) => {
                send(
                    channel,
                    &msg.channel,
                    &chat_id,
                    &format!(
                        "Open this link to authorize the bot with YouTube:\n{}\n\n\
                         After approving, a code is shown on screen. Paste it here.",
                        request.auth_url
                    ),
                )
                .await;

                // Drive the wait + exchange off the command loop so other
                // messages (the pasted code, above all) keep flowing.
                let manager = manager.clone();
                let channel = channel.clone();
                let channel_name = msg.channel.clone();
                tokio::spawn(async move {
                    let outcome = match manager.complete_auth(request).await {
                        Ok(_) => "Authorized with YouTube successfully!".to_string(),
                        Err(TuberelayError::AuthTimeout(waited)) => format!(
                            "Timed out after {}s waiting for the code. Run /auth to retry.",
                            waited.as_secs()
                        ),
                        Err(TuberelayError::InvalidGrant(detail)) => format!(
                            "The provider rejected the code ({detail}). Run /auth and paste a fresh one."
                        ),
                        Err(e) => {
                            error!(error = %e, "authorization flow failed");
                            format!("Authorization failed: {e}. Run /auth to retry.")
                        }
                    };
                    send(&channel, &channel_name, &chat_id, &outcome).await;
                });
            }
            Err(TuberelayError::NotAdmin { .. }) => {
                send(
                    channel,
                    &msg.channel,
                    &chat_id,
                    "Set an admin first: /setadmin <password>",
                )
                .await;
            }
            Err(TuberelayError::AuthInProgress) => {
                send(
                    channel,
                    &msg.channel,
                    &chat_id,
                    "An authorization flow is already running; paste the code or wait for it to time out.",
                )
                .await;
            }
            Err(e) => {
                error!(error = %e, "could not start authorization flow");
                send(
                    channel,
                    &msg.channel,
                    &chat_id,
                    &format!("Could not start authorization: {e}"),
                )
                .await;
            }
        },

        Command::CheckAuth => {
            if !manager.is_admin(&chat_id) {
                send(channel, &msg.channel, &chat_id, "Admin only.").await;
                return;
            }
            match manager.ensure_fresh_credential().await {
                Ok(credential) => {
                    send(
                        channel,
                        &msg.channel,
                        &chat_id,
                        &format!("YouTube credential is valid until {}.", credential.expiry),
                    )
                    .await;
                }
                Err(TuberelayError::CredentialExpired(detail)) => {
                    send(
                        channel,
                        &msg.channel,
                        &chat_id,
                        &format!("No usable credential: {detail}. Run /auth."),
                    )
                    .await;
                }
                Err(e) => {
                    error!(error = %e, "credential check failed");
                    send(
                        channel,
                        &msg.channel,
                        &chat_id,
                        &format!("Credential check failed: {e}"),
                    )
                    .await;
                }
            }
        }

        Command::Unknown(cmd) => {
            send(
                channel,
                &msg.channel,
                &chat_id,
                &format!("Unknown command {cmd}. Try /help."),
            )
            .await;
        }

        Command::Text(text) => {
            // Plain text only matters while a flow waits for its code.
            if !manager.awaiting_code().await {
                return;
            }
            match manager.submit_code(&text, &chat_id).await {
                Ok(candidate) => {
                    send(
                        channel,
                        &msg.channel,
                        &chat_id,
                        &format!("Code received ({} chars), verifying...", candidate.len()),
                    )
                    .await;
                }
                // A stranger pasting text into their own chat is not an
                // event worth replying to.
                Err(TuberelayError::NotAdmin { .. }) => {}
                // The waiter raced us (timeout or a second paste); the flow
                // outcome message covers it.
                Err(TuberelayError::NotAwaitingCode) => {}
                Err(e) => {
                    error!(error = %e, "code submission failed");
                }
            }
        }
    }
}

async fn send(channel: &Arc<dyn ChannelAdapter>, channel_name: &str, chat_id: &str, text: &str) {
    let msg = OutboundMessage {
        channel: channel_name.to_string(),
        chat_id: chat_id.to_string(),
        text: text.to_string(),
    };
    if let Err(e) = channel.send(msg).await {
        error!(error = %e, chat_id, "failed to send reply");
    }
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("tuberelay={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
