//! Turns one incoming text message into at most one download task.

use super::messaging::{notify, ChatSender};
use crate::config::Settings;
use crate::download::{DownloadTask, TaskId, TaskSink};
use crate::error::DispatchError;
use crate::utils::{extract_url, normalize_text};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Reply sent when a message carries no usable link
pub const REJECTION_MESSAGE: &str = "Не нашёл валидную ссылку! Отправь http/https.";

/// Text message received from a chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    /// Chat the message came from
    pub chat_id: i64,
    /// Raw message text
    pub text: String,
}

/// What the router did with an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// No text at all, nothing sent
    Ignored,
    /// No URL found, rejection sent
    Rejected,
    /// A download task was started
    Dispatched {
        /// Id of the started task
        task_id: TaskId,
        /// Extracted URL
        url: String,
    },
    /// A URL was found but every download slot is taken
    Busy,
    /// A URL was found but the pool no longer accepts work
    ShuttingDown,
}

/// Routes chat messages to the download pool
pub struct MessageRouter {
    sender: Arc<dyn ChatSender>,
    sink: Arc<dyn TaskSink>,
    download_dir: PathBuf,
    echo_messages: bool,
}

impl MessageRouter {
    /// Create a router sending replies through `sender` and tasks to `sink`
    #[must_use]
    pub fn new(sender: Arc<dyn ChatSender>, sink: Arc<dyn TaskSink>, settings: &Settings) -> Self {
        Self {
            sender,
            sink,
            download_dir: settings.download_dir.clone(),
            echo_messages: settings.echo_messages,
        }
    }

    /// Handle one message. Returns as soon as the task is dispatched; the
    /// download itself runs in the background.
    pub async fn handle_event(&self, event: InboundEvent) -> RouteOutcome {
        let InboundEvent { chat_id, text } = event;
        if text.is_empty() {
            return RouteOutcome::Ignored;
        }

        let normalized = normalize_text(&text);
        debug!(chat_id, text = %normalized, "Received message");

        if self.echo_messages {
            self.send(chat_id, &format!("Ты написал: {text}")).await;
        }

        let Some(url) = extract_url(&normalized) else {
            self.send(chat_id, REJECTION_MESSAGE).await;
            return RouteOutcome::Rejected;
        };

        self.send(
            chat_id,
            &format!("🔗 Ссылка найдена! Запускаю скачивание: {url}"),
        )
        .await;

        let task = DownloadTask::new(chat_id, url, &self.download_dir);
        let task_id = task.id;
        match self.sink.submit(task) {
            Ok(()) => {
                info!(chat_id, task_id = %task_id, url, "Download dispatched");
                RouteOutcome::Dispatched {
                    task_id,
                    url: url.to_string(),
                }
            }
            Err(DispatchError::Saturated { limit }) => {
                self.send(
                    chat_id,
                    &format!(
                        "🚦 Сейчас уже идёт {limit} загрузок. Попробуй чуть позже."
                    ),
                )
                .await;
                RouteOutcome::Busy
            }
            Err(DispatchError::Closed) => {
                info!(chat_id, task_id = %task_id, "Pool closed, download not started");
                self.send(chat_id, "Бот останавливается, загрузка не запущена.")
                    .await;
                RouteOutcome::ShuttingDown
            }
        }
    }

    async fn send(&self, chat_id: i64, text: &str) {
        notify(self.sender.as_ref(), chat_id, text).await;
    }
}
