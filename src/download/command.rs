//! yt-dlp argument list for a download task.

use super::task::DownloadTask;
use std::ffi::OsString;
use std::path::Path;
use url::Url;

/// Browser user agent presented to video hosts
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.0.0 Safari/537.36";

/// Referer sent with every request
pub const REFERER: &str = "https://www.youtube.com/";

/// MP4 video up to 720p with M4A audio, falling back to a single MP4 up to 720p
pub const FORMAT_SELECTOR: &str =
    "bestvideo[ext=mp4][height<=720]+bestaudio[ext=m4a]/best[ext=mp4][height<=720]";

/// Hard size cap, leaves headroom under Telegram's ~50 MB upload limit
pub const MAX_FILESIZE: &str = "45m";

const YOUTUBE_HOSTS: &[&str] = &["youtube.com", "www.youtube.com", "m.youtube.com"];

/// Whether `url` points at a site that needs the cookie file.
///
/// Matches `vk.com` and its subdomains, and YouTube Shorts paths. The URL is
/// parsed, so a domain appearing in the query string does not count.
#[must_use]
pub fn needs_cookies(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    let Some(host) = parsed.host_str() else {
        return false;
    };
    let host = host.to_ascii_lowercase();

    if host == "vk.com" || host.ends_with(".vk.com") {
        return true;
    }

    YOUTUBE_HOSTS.contains(&host.as_str())
        && (parsed.path() == "/shorts" || parsed.path().starts_with("/shorts/"))
}

/// Full yt-dlp argument list for `task`.
///
/// `--cookies <cookie_file>` is appended for cookie-protected sites whether
/// or not the file exists; yt-dlp reports a missing file in its own log.
#[must_use]
pub fn build_args(task: &DownloadTask, cookie_file: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "--verbose".into(),
        "--user-agent".into(),
        USER_AGENT.into(),
        "--referer".into(),
        REFERER.into(),
        "-f".into(),
        FORMAT_SELECTOR.into(),
        "--max-filesize".into(),
        MAX_FILESIZE.into(),
        "-o".into(),
        task.output_path.clone().into_os_string(),
        "--no-playlist".into(),
        task.url.clone().into(),
    ];

    if needs_cookies(&task.url) {
        args.push("--cookies".into());
        args.push(cookie_file.as_os_str().to_owned());
    }

    args
}
