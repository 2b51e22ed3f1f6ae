//! Error types shared by the router, the pool and the invoker.

use thiserror::Error;

/// Failure to deliver a message through the chat transport
#[derive(Error, Debug)]
#[error("Telegram send error: {0}")]
pub struct TransportError(pub String);

/// Reasons a download task could not be handed to a worker
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DispatchError {
    /// All download slots are busy
    #[error("download pool saturated ({limit} running)")]
    Saturated {
        /// Configured concurrency limit
        limit: usize,
    },
    /// The pool no longer accepts work
    #[error("download pool closed")]
    Closed,
}

/// Errors raised while running the external download tool
#[derive(Error, Debug)]
pub enum DownloadError {
    /// The process could not be started
    #[error("failed to start yt-dlp: {0}")]
    Spawn(#[source] std::io::Error),
    /// Waiting on the process failed
    #[error("failed to wait for yt-dlp: {0}")]
    Wait(#[source] std::io::Error),
    /// A piped stream was not available after spawn
    #[error("yt-dlp {0} pipe unavailable")]
    MissingPipe(&'static str),
}
