//! Text helpers for incoming chat messages.
//!
//! Patterns are declared with `lazy_regex!`, so they are validated at compile
//! time and built on first use.

// lazy_regex! relies on once_cell statics
#![allow(clippy::non_std_lazy_statics)]

use lazy_regex::lazy_regex;

/// Control, format, space-separator and other-symbol characters (emoji included)
static RE_NOISE: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r"[\p{C}\p{Zs}\p{So}]");

/// Runs of whitespace
static RE_WHITESPACE: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r"\s+");

/// `http://` or `https://` followed by a non-whitespace run
static RE_URL: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r"https?://\S+");

/// Best-effort cleanup of user text before URL matching.
///
/// Invisible, separator and symbol characters become spaces, whitespace runs
/// collapse to a single space and the result is trimmed. Applying it twice
/// gives the same result as applying it once.
///
/// # Examples
///
/// ```
/// use video_loader_bot::utils::normalize_text;
/// assert_eq!(normalize_text("  look\u{200B}here 🎬  now "), "look here now");
/// ```
#[must_use]
pub fn normalize_text(text: &str) -> String {
    let replaced = RE_NOISE.replace_all(text.trim(), " ");
    RE_WHITESPACE
        .replace_all(&replaced, " ")
        .trim()
        .to_string()
}

/// Returns the first `http(s)://` URL found in `text`, if any.
///
/// # Examples
///
/// ```
/// use video_loader_bot::utils::extract_url;
/// assert_eq!(
///     extract_url("see https://a.example/x and http://b.example"),
///     Some("https://a.example/x")
/// );
/// assert_eq!(extract_url("no links here"), None);
/// ```
#[must_use]
pub fn extract_url(text: &str) -> Option<&str> {
    RE_URL.find(text).map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize_text("a \t\n  b"), "a b");
        assert_eq!(normalize_text("   "), "");
    }

    #[test]
    fn test_normalize_strips_invisible_chars() {
        // zero-width space (Cf), no-break space (Zs), emoji (So)
        let input = "link:\u{200B}https://vk.com/video1\u{00A0}✅";
        assert_eq!(normalize_text(input), "link: https://vk.com/video1");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let samples = [
            "check this out https://youtube.com/watch?v=abc123 thanks",
            "  \u{FEFF}mixed\u{2003}spaces\r\n and 🎥 emoji ",
            "",
            "\u{0007}bell\u{0000}nul",
            "already normal",
        ];
        for sample in samples {
            let once = normalize_text(sample);
            assert_eq!(normalize_text(&once), once, "input: {sample:?}");
        }
    }

    #[test]
    fn test_extract_first_url() {
        let text = normalize_text("check this out https://youtube.com/watch?v=abc123 thanks");
        assert_eq!(
            extract_url(&text),
            Some("https://youtube.com/watch?v=abc123")
        );
    }

    #[test]
    fn test_extract_takes_first_of_many() {
        assert_eq!(
            extract_url("http://first.example/1 https://second.example/2"),
            Some("http://first.example/1")
        );
    }

    #[test]
    fn test_extract_requires_scheme_and_body() {
        assert_eq!(extract_url("no links here"), None);
        assert_eq!(extract_url("ftp://files.example/x"), None);
        assert_eq!(extract_url("https:// nothing"), None);
        assert_eq!(extract_url("www.example.com"), None);
    }
}
