#![deny(missing_docs)]
//! Telegram bot that downloads videos from links with yt-dlp.

/// Telegram transport, routing and messaging.
pub mod bot;
/// Configuration management.
pub mod config;
/// yt-dlp download tasks, invocation and worker pool.
pub mod download;
/// Error types.
pub mod error;
/// Text normalization and URL extraction.
pub mod utils;
