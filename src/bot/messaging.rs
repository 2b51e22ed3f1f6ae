//! Outbound messaging for the bot.
//!
//! The router and the download workers only see the [`ChatSender`] trait,
//! which keeps them independent of teloxide and easy to mock.

use crate::error::TransportError;
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::ChatId;
use tracing::error;

/// Capability to deliver a plain-text message to a chat
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatSender: Send + Sync {
    /// Send `text` to `chat_id`
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), TransportError>;
}

/// [`ChatSender`] backed by the Telegram Bot API
#[derive(Clone)]
pub struct TelegramSender {
    bot: Bot,
}

impl TelegramSender {
    /// Wrap a teloxide bot
    #[must_use]
    pub const fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl ChatSender for TelegramSender {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), TransportError> {
        self.bot
            .send_message(ChatId(chat_id), text.to_string())
            .await
            .map(|_| ())
            .map_err(|e| TransportError(e.to_string()))
    }
}

/// Fire-and-forget send: failures are logged and never retried.
pub async fn notify(sender: &dyn ChatSender, chat_id: i64, text: &str) {
    if let Err(e) = sender.send_text(chat_id, text).await {
        error!(chat_id, error = %e, "Failed to send message");
    }
}
