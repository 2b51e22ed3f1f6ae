//! Download task identity and file naming.

use chrono::Utc;
use std::fmt;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Extension of every produced video file
pub const VIDEO_EXTENSION: &str = "mp4";

/// Random identifier of a single download request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Generate a fresh random id
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// First eight hex digits, used as a file name suffix
    #[must_use]
    pub fn short(&self) -> String {
        let mut simple = self.0.as_simple().to_string();
        simple.truncate(8);
        simple
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One unit of work: download `url` for `chat_id`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    /// Task identity
    pub id: TaskId,
    /// Chat that requested the download
    pub chat_id: i64,
    /// URL passed to yt-dlp
    pub url: String,
    /// Where yt-dlp writes the video
    pub output_path: PathBuf,
    /// Where the captured yt-dlp output is stored
    pub log_path: PathBuf,
}

impl DownloadTask {
    /// Create a task whose files live directly under `download_dir`.
    ///
    /// Names combine the creation time in epoch millis with a random suffix,
    /// so two tasks created in the same millisecond never share a path.
    #[must_use]
    pub fn new(chat_id: i64, url: impl Into<String>, download_dir: &Path) -> Self {
        let id = TaskId::new();
        let millis = Utc::now().timestamp_millis();
        let suffix = id.short();

        Self {
            id,
            chat_id,
            url: url.into(),
            output_path: download_dir.join(format!("video_{millis}_{suffix}.{VIDEO_EXTENSION}")),
            log_path: download_dir.join(format!("yt-dlp-log_{millis}_{suffix}.txt")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_paths_stay_in_download_dir() {
        let dir = Path::new("/app/downloads");
        let task = DownloadTask::new(42, "https://vk.com/video1", dir);

        assert_eq!(task.output_path.parent(), Some(dir));
        assert_eq!(task.log_path.parent(), Some(dir));
        assert_eq!(task.chat_id, 42);
        assert_eq!(task.url, "https://vk.com/video1");
    }

    #[test]
    fn test_file_names() {
        let task = DownloadTask::new(1, "https://example.com", Path::new("/d"));
        let video = task
            .output_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        let log = task
            .log_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();

        assert!(video.starts_with("video_"), "{video}");
        assert!(video.ends_with(".mp4"), "{video}");
        assert!(video.contains(&task.id.short()));
        assert!(log.starts_with("yt-dlp-log_"), "{log}");
        assert!(log.ends_with(".txt"), "{log}");
    }

    #[test]
    fn test_paths_unique_within_same_millisecond() {
        let dir = Path::new("/d");
        let paths: HashSet<PathBuf> = (0..500)
            .map(|_| DownloadTask::new(7, "https://example.com", dir).output_path)
            .collect();
        assert_eq!(paths.len(), 500);
    }
}
