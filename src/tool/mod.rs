//! Media tool abstraction.
//!
//! The session talks to the downloader through [`MediaTool`] so the queue
//! logic can run against something other than a real yt-dlp process.

mod ytdlp;

pub use ytdlp::{error_message, YtDlp};

use crate::error::Result;
use crate::events::EventSender;
use crate::formats::FormatEntry;
use crate::options::DownloadOptions;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// A downloader that can list formats and fetch a URL.
#[async_trait]
pub trait MediaTool: Send + Sync {
    /// Human-readable tool name for logs.
    fn name(&self) -> &str;

    /// List the formats available for `url`, best first.
    async fn list_formats(&self, url: &str, opts: &DownloadOptions) -> Result<Vec<FormatEntry>>;

    /// Download `url`, streaming log and progress events.
    ///
    /// Returns [`crate::YtdlqError::Canceled`] when `cancel` fires mid-download.
    async fn download(
        &self,
        url: &str,
        opts: &DownloadOptions,
        events: &EventSender,
        cancel: &CancellationToken,
    ) -> Result<()>;
}
