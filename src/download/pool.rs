//! Bounded dispatch of download tasks.
//!
//! Every accepted task runs on its own tokio task while holding one permit of
//! a semaphore. When no permit is free the task is refused instead of queued,
//! so the router can tell the user to retry later.

use super::invoker::{DownloadInvoker, DownloadOutcome};
use super::task::DownloadTask;
use crate::error::DispatchError;
use std::sync::Arc;
use tokio::sync::{Semaphore, TryAcquireError};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Destination for tasks produced by the router
#[cfg_attr(test, mockall::automock)]
pub trait TaskSink: Send + Sync {
    /// Start `task` in the background without waiting for it.
    ///
    /// # Errors
    ///
    /// Returns a [`DispatchError`] when the task cannot be started right now.
    fn submit(&self, task: DownloadTask) -> Result<(), DispatchError>;
}

/// Semaphore-limited set of download workers
#[derive(Clone)]
pub struct DownloadPool {
    invoker: Arc<DownloadInvoker>,
    permits: Arc<Semaphore>,
    limit: usize,
}

impl DownloadPool {
    /// Create a pool running at most `limit` downloads at once
    #[must_use]
    pub fn new(invoker: Arc<DownloadInvoker>, limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            invoker,
            permits: Arc::new(Semaphore::new(limit)),
            limit,
        }
    }

    /// Number of downloads that could start immediately
    #[must_use]
    pub fn available_slots(&self) -> usize {
        self.permits.available_permits()
    }

    /// Start `task` and return a handle resolving to its outcome.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Saturated`] when every slot is busy and
    /// [`DispatchError::Closed`] after [`DownloadPool::close`].
    pub fn spawn(&self, task: DownloadTask) -> Result<JoinHandle<DownloadOutcome>, DispatchError> {
        let permit = match Arc::clone(&self.permits).try_acquire_owned() {
            Ok(permit) => permit,
            Err(TryAcquireError::NoPermits) => {
                warn!(task_id = %task.id, chat_id = task.chat_id, limit = self.limit, "Download pool saturated");
                return Err(DispatchError::Saturated { limit: self.limit });
            }
            Err(TryAcquireError::Closed) => return Err(DispatchError::Closed),
        };

        debug!(
            task_id = %task.id,
            chat_id = task.chat_id,
            free = self.permits.available_permits(),
            "Dispatching download"
        );
        let invoker = Arc::clone(&self.invoker);
        Ok(tokio::spawn(async move {
            let outcome = invoker.run(task).await;
            drop(permit);
            outcome
        }))
    }

    /// Stop accepting new tasks; running downloads are not interrupted.
    pub fn close(&self) {
        self.permits.close();
    }
}

impl TaskSink for DownloadPool {
    fn submit(&self, task: DownloadTask) -> Result<(), DispatchError> {
        self.spawn(task).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::messaging::MockChatSender;
    use crate::config::Settings;
    use std::path::{Path, PathBuf};

    fn pool_with_missing_binary(limit: usize, dir: &Path) -> DownloadPool {
        let mut sender = MockChatSender::new();
        sender.expect_send_text().returning(|_, _| Ok(()));
        let settings = Settings {
            download_dir: dir.to_path_buf(),
            ytdlp_path: PathBuf::from("/nonexistent/yt-dlp-binary"),
            ..Settings::default()
        };
        let invoker = DownloadInvoker::new(Arc::new(sender), &settings);
        DownloadPool::new(Arc::new(invoker), limit)
    }

    #[tokio::test]
    async fn test_permit_released_after_run() {
        let dir = tempfile::tempdir().expect("tempdir");
        let pool = pool_with_missing_binary(1, dir.path());

        let handle = pool
            .spawn(DownloadTask::new(1, "https://example.com/a", dir.path()))
            .expect("first task accepted");
        let outcome = handle.await.expect("join");
        assert_eq!(outcome.label(), "errored");
        assert_eq!(pool.available_slots(), 1);
    }

    #[tokio::test]
    async fn test_closed_pool_refuses_work() {
        let dir = tempfile::tempdir().expect("tempdir");
        let pool = pool_with_missing_binary(2, dir.path());
        pool.close();

        let result = pool.submit(DownloadTask::new(1, "https://example.com/a", dir.path()));
        assert_eq!(result, Err(DispatchError::Closed));
    }

    #[test]
    fn test_zero_limit_is_clamped() {
        let dir = PathBuf::from("/tmp");
        let mut sender = MockChatSender::new();
        sender.expect_send_text().returning(|_, _| Ok(()));
        let settings = Settings {
            download_dir: dir,
            ..Settings::default()
        };
        let invoker = DownloadInvoker::new(Arc::new(sender), &settings);
        let pool = DownloadPool::new(Arc::new(invoker), 0);
        assert_eq!(pool.available_slots(), 1);
    }
}
