//! Runs yt-dlp for one task and reports the result to the chat.
//!
//! Per task the flow is strictly linear:
//! `started -> running -> {non-zero exit | empty output | success | timed out}`,
//! with any spawn or I/O failure ending in `errored`.

use super::command::build_args;
use super::task::{DownloadTask, TaskId};
use crate::bot::messaging::{notify, ChatSender};
use crate::config::Settings;
use crate::error::DownloadError;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{debug, error, info, warn};

/// Bytes in one reported megabyte
pub const BYTES_PER_MB: u64 = 1024 * 1024;

/// Whole megabytes in `bytes`, rounded down.
#[must_use]
pub const fn size_in_mb(bytes: u64) -> u64 {
    bytes / BYTES_PER_MB
}

/// Terminal state of a download task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Exit code zero and a non-empty output file
    Success {
        /// File size in whole megabytes
        size_mb: u64,
        /// Downloaded video
        output_path: PathBuf,
    },
    /// yt-dlp exited unsuccessfully; `code` is `None` when killed by a signal
    NonZeroExit {
        /// Process exit code
        code: Option<i32>,
        /// Captured output
        log_path: PathBuf,
    },
    /// Exit code zero but the output file is missing or empty
    EmptyOutput {
        /// Expected video location
        output_path: PathBuf,
    },
    /// The wall-clock limit expired and the process was killed
    TimedOut {
        /// Limit that was exceeded
        timeout: Duration,
        /// Captured output up to the kill
        log_path: PathBuf,
    },
    /// Spawn, wait or I/O failure
    Errored {
        /// Error description shown to the user
        message: String,
    },
}

impl DownloadOutcome {
    /// Text reported to the chat for this outcome
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Success {
                size_mb,
                output_path,
            } => format!(
                "✅ Видео скачано ({size_mb} МБ). Сохранено: {}",
                output_path.display()
            ),
            Self::NonZeroExit {
                code: Some(code),
                log_path,
            } => format!(
                "❌ yt-dlp завершился с ошибкой (код {code}). Лог: {}",
                log_path.display()
            ),
            Self::NonZeroExit {
                code: None,
                log_path,
            } => format!(
                "❌ yt-dlp был остановлен сигналом. Лог: {}",
                log_path.display()
            ),
            Self::EmptyOutput { output_path } => {
                format!("❌ Файл не найден или пустой: {}", output_path.display())
            }
            Self::TimedOut { timeout, log_path } => format!(
                "⌛ Скачивание не уложилось в {} с и было остановлено. Лог: {}",
                timeout.as_secs(),
                log_path.display()
            ),
            Self::Errored { message } => {
                format!("❌ Ошибка: {message}. Подробности в логах бота.")
            }
        }
    }

    /// Short label for structured logs
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::NonZeroExit { .. } => "exit_nonzero",
            Self::EmptyOutput { .. } => "empty_output",
            Self::TimedOut { .. } => "timed_out",
            Self::Errored { .. } => "errored",
        }
    }
}

/// Executes yt-dlp downloads and relays their progress
pub struct DownloadInvoker {
    sender: Arc<dyn ChatSender>,
    ytdlp_path: PathBuf,
    download_dir: PathBuf,
    cookie_file: PathBuf,
    timeout: Option<Duration>,
}

impl DownloadInvoker {
    /// Create an invoker from application settings
    #[must_use]
    pub fn new(sender: Arc<dyn ChatSender>, settings: &Settings) -> Self {
        Self {
            sender,
            ytdlp_path: settings.ytdlp_path.clone(),
            download_dir: settings.download_dir.clone(),
            cookie_file: settings.cookie_file(),
            timeout: settings.download_timeout(),
        }
    }

    /// Run `task` to completion, reporting each stage to its chat.
    pub async fn run(&self, task: DownloadTask) -> DownloadOutcome {
        let chat_id = task.chat_id;
        notify(self.sender.as_ref(), chat_id, "⏳ Начинаю скачивание...").await;
        notify(
            self.sender.as_ref(),
            chat_id,
            &format!("Скачиваю в: {}", task.output_path.display()),
        )
        .await;

        let outcome = match self.execute(&task).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(task_id = %task.id, chat_id, error = %e, "Download failed");
                DownloadOutcome::Errored {
                    message: e.to_string(),
                }
            }
        };

        info!(
            task_id = %task.id,
            chat_id,
            url = %task.url,
            outcome = outcome.label(),
            "Download finished"
        );
        notify(self.sender.as_ref(), chat_id, &outcome.user_message()).await;
        outcome
    }

    async fn execute(&self, task: &DownloadTask) -> Result<DownloadOutcome, DownloadError> {
        let args = build_args(task, &self.cookie_file);
        debug!(task_id = %task.id, ?args, "Spawning yt-dlp");

        let mut command = Command::new(&self.ytdlp_path);
        command
            .args(&args)
            .current_dir(&self.download_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own group, so a timeout also reaches ffmpeg and other helpers
        #[cfg(unix)]
        command.process_group(0);
        let mut child = command.spawn().map_err(DownloadError::Spawn)?;

        let stdout = child
            .stdout
            .take()
            .ok_or(DownloadError::MissingPipe("stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or(DownloadError::MissingPipe("stderr"))?;

        // Both streams feed one channel so the log keeps arrival order
        let (tx, mut rx) = mpsc::unbounded_channel();
        tokio::spawn(forward_lines(stdout, tx.clone(), task.id));
        tokio::spawn(forward_lines(stderr, tx, task.id));

        let deadline = async {
            match self.timeout {
                Some(limit) => tokio::time::sleep(limit).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(deadline);

        let mut log = String::new();
        let mut streams_open = true;
        let status = loop {
            tokio::select! {
                line = rx.recv(), if streams_open => match line {
                    Some(line) => {
                        log.push_str(&line);
                        log.push('\n');
                    }
                    None => streams_open = false,
                },
                status = child.wait(), if !streams_open => {
                    break Some(status.map_err(DownloadError::Wait)?);
                }
                () = &mut deadline => break None,
            }
        };

        let Some(status) = status else {
            warn!(task_id = %task.id, timeout = ?self.timeout, "yt-dlp timed out, killing");
            #[cfg(unix)]
            kill_process_group(&child, task.id);
            if let Err(e) = child.kill().await {
                warn!(task_id = %task.id, error = %e, "Failed to kill yt-dlp");
            }
            while let Ok(line) = rx.try_recv() {
                log.push_str(&line);
                log.push('\n');
            }
            write_log(&task.log_path, &log).await;
            return Ok(DownloadOutcome::TimedOut {
                timeout: self.timeout.unwrap_or_default(),
                log_path: task.log_path.clone(),
            });
        };

        write_log(&task.log_path, &log).await;

        if !status.success() {
            return Ok(DownloadOutcome::NonZeroExit {
                code: status.code(),
                log_path: task.log_path.clone(),
            });
        }

        let size = match tokio::fs::metadata(&task.output_path).await {
            Ok(meta) if meta.is_file() => meta.len(),
            _ => 0,
        };
        if size == 0 {
            return Ok(DownloadOutcome::EmptyOutput {
                output_path: task.output_path.clone(),
            });
        }

        Ok(DownloadOutcome::Success {
            size_mb: size_in_mb(size),
            output_path: task.output_path.clone(),
        })
    }
}

/// Forward every line of `stream` into `tx` until EOF.
async fn forward_lines<R>(stream: R, tx: UnboundedSender<String>, task_id: TaskId)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf)
                    .trim_end_matches(['\r', '\n'])
                    .to_string();
                debug!(task_id = %task_id, "[yt-dlp] {line}");
                if tx.send(line).is_err() {
                    break;
                }
            }
            Err(e) => {
                warn!(task_id = %task_id, error = %e, "Failed to read yt-dlp output");
                break;
            }
        }
    }
}

/// SIGKILL every process in the child's group.
#[cfg(unix)]
fn kill_process_group(child: &tokio::process::Child, task_id: TaskId) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let Some(pgid) = child.id().and_then(|id| i32::try_from(id).ok()) else {
        return;
    };
    if let Err(e) = killpg(Pid::from_raw(pgid), Signal::SIGKILL) {
        warn!(task_id = %task_id, error = %e, "Failed to kill yt-dlp process group");
    }
}

/// Persist captured output; failures only reach the local log.
async fn write_log(path: &Path, log: &str) {
    if let Err(e) = tokio::fs::write(path, log).await {
        error!(path = %path.display(), error = %e, "Failed to write yt-dlp log");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_in_mb_rounds_down() {
        assert_eq!(size_in_mb(0), 0);
        assert_eq!(size_in_mb(BYTES_PER_MB - 1), 0);
        assert_eq!(size_in_mb(BYTES_PER_MB), 1);
        assert_eq!(size_in_mb(45 * BYTES_PER_MB + 512 * 1024), 45);
    }

    #[test]
    fn test_user_messages_carry_paths() {
        let log_path = PathBuf::from("/app/downloads/yt-dlp-log_1.txt");
        let failed = DownloadOutcome::NonZeroExit {
            code: Some(1),
            log_path: log_path.clone(),
        };
        assert!(failed.user_message().contains("код 1"));
        assert!(failed.user_message().contains("/app/downloads/yt-dlp-log_1.txt"));

        let timed_out = DownloadOutcome::TimedOut {
            timeout: Duration::from_secs(900),
            log_path,
        };
        assert!(timed_out.user_message().contains("900"));

        let ok = DownloadOutcome::Success {
            size_mb: 12,
            output_path: PathBuf::from("/app/downloads/video_1.mp4"),
        };
        assert!(ok.user_message().contains("12 МБ"));
        assert_eq!(ok.label(), "success");
    }

    #[tokio::test]
    async fn test_missing_binary_reports_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut sender = crate::bot::messaging::MockChatSender::new();
        sender.expect_send_text().returning(|_, _| Ok(()));

        let settings = Settings {
            download_dir: dir.path().to_path_buf(),
            ytdlp_path: PathBuf::from("/nonexistent/yt-dlp-binary"),
            ..Settings::default()
        };
        let invoker = DownloadInvoker::new(Arc::new(sender), &settings);
        let task = DownloadTask::new(3, "https://example.com/v", dir.path());

        let outcome = invoker.run(task).await;
        assert!(
            matches!(outcome, DownloadOutcome::Errored { ref message } if message.contains("failed to start yt-dlp")),
            "{outcome:?}"
        );
    }
}
