//! Configuration and settings management
//!
//! Loads settings from optional config files and environment variables.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default directory for downloaded videos, logs and `cookies.txt`.
pub const DEFAULT_DOWNLOAD_DIR: &str = "/app/downloads";
/// Default name (or path) of the yt-dlp binary.
pub const DEFAULT_YTDLP_PATH: &str = "yt-dlp";
/// Default number of downloads allowed to run at the same time.
pub const DEFAULT_MAX_CONCURRENT_DOWNLOADS: usize = 4;
/// Default wall-clock limit for a single yt-dlp run, in seconds.
pub const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 900;

/// Application settings loaded from environment variables
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Telegram Bot API token
    pub telegram_token: String,

    /// Bot username, only used for startup logging
    pub bot_username: Option<String>,

    /// Directory where videos and yt-dlp logs are written
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// Path to the yt-dlp executable
    #[serde(default = "default_ytdlp_path")]
    pub ytdlp_path: PathBuf,

    /// Upper bound on simultaneously running downloads
    #[serde(default = "default_max_concurrent_downloads")]
    pub max_concurrent_downloads: usize,

    /// Wall-clock timeout for one download, `0` disables it
    #[serde(default = "default_download_timeout_secs")]
    pub download_timeout_secs: u64,

    /// Echo every incoming message back to its sender
    #[serde(default = "default_echo_messages")]
    pub echo_messages: bool,
}

fn default_download_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DOWNLOAD_DIR)
}

fn default_ytdlp_path() -> PathBuf {
    PathBuf::from(DEFAULT_YTDLP_PATH)
}

const fn default_max_concurrent_downloads() -> usize {
    DEFAULT_MAX_CONCURRENT_DOWNLOADS
}

const fn default_download_timeout_secs() -> u64 {
    DEFAULT_DOWNLOAD_TIMEOUT_SECS
}

const fn default_echo_messages() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            telegram_token: String::new(),
            bot_username: None,
            download_dir: default_download_dir(),
            ytdlp_path: default_ytdlp_path(),
            max_concurrent_downloads: DEFAULT_MAX_CONCURRENT_DOWNLOADS,
            download_timeout_secs: DEFAULT_DOWNLOAD_TIMEOUT_SECS,
            echo_messages: true,
        }
    }
}

impl Settings {
    /// Create new settings by loading from environment and files
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use video_loader_bot::config::Settings;
    ///
    /// let settings = Settings::new().expect("Failed to load configuration");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails.
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
            // Local overrides, not checked into git
            .add_source(File::with_name("config/local").required(false))
            // Eg. `APP__DOWNLOAD_DIR=/tmp ./target/app`
            .add_source(Environment::with_prefix("APP").separator("__"))
            // Plain UPPER_SNAKE_CASE variables, empty ones treated as unset
            .add_source(Environment::default().ignore_empty(true))
            .build()?;

        s.try_deserialize()
    }

    /// Concurrency limit for the download pool, never below one.
    #[must_use]
    pub fn download_slots(&self) -> usize {
        self.max_concurrent_downloads.max(1)
    }

    /// Wall-clock limit for one yt-dlp run, `None` when disabled.
    #[must_use]
    pub const fn download_timeout(&self) -> Option<Duration> {
        if self.download_timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.download_timeout_secs))
        }
    }

    /// Location of the optional cookie file inside the download directory.
    #[must_use]
    pub fn cookie_file(&self) -> PathBuf {
        self.download_dir.join("cookies.txt")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    // Single test touching the process environment to avoid races
    #[test]
    fn test_config_env_loading() -> Result<(), Box<dyn std::error::Error>> {
        env::set_var("TELEGRAM_TOKEN", "dummy_token");
        env::set_var("DOWNLOAD_DIR", "/tmp/videos");
        env::set_var("MAX_CONCURRENT_DOWNLOADS", "");

        let settings = Settings::new()?;
        assert_eq!(settings.telegram_token, "dummy_token");
        assert_eq!(settings.download_dir, PathBuf::from("/tmp/videos"));
        // Empty variable falls back to the default
        assert_eq!(
            settings.max_concurrent_downloads,
            DEFAULT_MAX_CONCURRENT_DOWNLOADS
        );

        env::remove_var("TELEGRAM_TOKEN");
        env::remove_var("DOWNLOAD_DIR");
        env::remove_var("MAX_CONCURRENT_DOWNLOADS");
        Ok(())
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.download_dir, PathBuf::from("/app/downloads"));
        assert_eq!(settings.ytdlp_path, PathBuf::from("yt-dlp"));
        assert!(settings.echo_messages);
        assert_eq!(
            settings.cookie_file(),
            PathBuf::from("/app/downloads/cookies.txt")
        );
    }

    #[test]
    fn test_timeout_zero_disables() {
        let mut settings = Settings::default();
        assert_eq!(
            settings.download_timeout(),
            Some(Duration::from_secs(DEFAULT_DOWNLOAD_TIMEOUT_SECS))
        );
        settings.download_timeout_secs = 0;
        assert_eq!(settings.download_timeout(), None);
    }

    #[test]
    fn test_download_slots_clamped() {
        let settings = Settings {
            max_concurrent_downloads: 0,
            ..Settings::default()
        };
        assert_eq!(settings.download_slots(), 1);
    }
}
