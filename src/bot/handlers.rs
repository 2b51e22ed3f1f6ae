//! Telegram command and message handlers.

use super::router::{InboundEvent, MessageRouter};
use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tracing::info;

/// Supported commands for the bot
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Поддерживаемые команды:")]
pub enum Command {
    /// Show welcome message
    #[command(description = "Начать работу.")]
    Start,
    /// Show usage help
    #[command(description = "Как пользоваться ботом.")]
    Help,
}

/// Welcome text for `/start`
pub const WELCOME_MESSAGE: &str = "Привет! Пришли ссылку на видео (YouTube, VK, Shorts и др.), \
и я скачаю его в MP4 до 720p и не больше 45 МБ.";

/// Returns the sender's user ID or 0 if the message has no sender
#[must_use]
pub fn get_user_id_safe(msg: &Message) -> i64 {
    msg.from.as_ref().map_or(0, |u| u.id.0.cast_signed())
}

/// Command handler
///
/// # Errors
///
/// Returns an error if the reply cannot be sent.
pub async fn handle_command(bot: Bot, msg: Message, cmd: Command) -> Result<()> {
    info!(
        user_id = get_user_id_safe(&msg),
        chat_id = msg.chat.id.0,
        "Command received"
    );
    let text = match cmd {
        Command::Start => WELCOME_MESSAGE.to_string(),
        Command::Help => format!(
            "{}\n\nОтправь сообщение со ссылкой http/https, бот найдёт первую ссылку в тексте.",
            Command::descriptions()
        ),
    };
    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}

/// Text message handler, forwards the message to the router
pub async fn handle_text(msg: Message, router: Arc<MessageRouter>) {
    let Some(text) = msg.text() else {
        return;
    };
    let event = InboundEvent {
        chat_id: msg.chat.id.0,
        text: text.to_string(),
    };
    router.handle_event(event).await;
}
