//! Telegram runtime entrypoint.

use super::handlers::{self, Command};
use super::messaging::{ChatSender, TelegramSender};
use super::router::MessageRouter;
use crate::config::Settings;
use crate::download::{DownloadInvoker, DownloadPool, TaskSink};
use anyhow::{Context, Result};
use std::sync::Arc;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use tracing::{error, info};

/// Run the bot until Ctrl+C.
///
/// # Errors
///
/// Returns an error if the download directory cannot be created.
pub async fn run_bot(settings: Arc<Settings>) -> Result<()> {
    tokio::fs::create_dir_all(&settings.download_dir)
        .await
        .with_context(|| {
            format!(
                "failed to create download directory {}",
                settings.download_dir.display()
            )
        })?;

    let bot = Bot::new(settings.telegram_token.clone());
    let sender: Arc<dyn ChatSender> = Arc::new(TelegramSender::new(bot.clone()));

    let invoker = Arc::new(DownloadInvoker::new(Arc::clone(&sender), &settings));
    let pool = DownloadPool::new(invoker, settings.download_slots());
    let sink: Arc<dyn TaskSink> = Arc::new(pool.clone());
    let router = Arc::new(MessageRouter::new(sender, sink, &settings));

    info!(
        bot_username = settings.bot_username.as_deref().unwrap_or("<unset>"),
        download_dir = %settings.download_dir.display(),
        ytdlp = %settings.ytdlp_path.display(),
        slots = settings.download_slots(),
        timeout_secs = settings.download_timeout_secs,
        "Bot is running..."
    );

    Dispatcher::builder(bot, setup_handler())
        .dependencies(dptree::deps![router])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    pool.close();
    info!("Bot stopped.");
    Ok(())
}

fn setup_handler() -> UpdateHandler<teloxide::RequestError> {
    Update::filter_message()
        .branch(
            dptree::entry()
                .filter_command::<Command>()
                .endpoint(handle_command),
        )
        .branch(
            dptree::filter(|msg: Message| msg.text().is_some_and(|t| !t.is_empty()))
                .endpoint(handle_text),
        )
}

async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) = handlers::handle_command(bot, msg, cmd).await {
        error!("Command error: {}", e);
    }
    respond(())
}

async fn handle_text(msg: Message, router: Arc<MessageRouter>) -> Result<(), teloxide::RequestError> {
    handlers::handle_text(msg, router).await;
    respond(())
}
