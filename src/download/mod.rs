/// yt-dlp argument construction and cookie selection
pub mod command;
/// Runs one download and reports its outcome
pub mod invoker;
/// Bounded worker dispatch
pub mod pool;
/// Task identity and file naming
pub mod task;

pub use invoker::{DownloadInvoker, DownloadOutcome};
pub use pool::{DownloadPool, TaskSink};
pub use task::{DownloadTask, TaskId};
