//! ytdlq - a download queue for yt-dlp
//!
//! Keeps a queue of URLs and downloads them one after another by running the
//! `yt-dlp` executable, forwarding format, audio extraction, subtitle and
//! metadata choices as flags and turning its progress output into events.
//!
//! # Architecture
//!
//! - `config` - TOML settings
//! - `options` - mapping of user choices to yt-dlp flags
//! - `queue` - the persisted download queue
//! - `progress` - parsing of yt-dlp progress lines
//! - `formats` - format listings from yt-dlp's info JSON
//! - `tool` - the [`tool::MediaTool`] seam and its yt-dlp implementation
//! - `session` - one-task-at-a-time runner emitting [`events::SessionEvent`]s
//! - `cli` - command-line front end
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ytdlq::config::Settings;
//! use ytdlq::options::DownloadOptions;
//! use ytdlq::queue::DownloadQueue;
//! use ytdlq::session::Session;
//! use ytdlq::tool::YtDlp;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let opts = DownloadOptions::from_settings(&settings);
//!
//!     let mut queue = DownloadQueue::new();
//!     queue.add_text("https://www.youtube.com/watch?v=dQw4w9WgXcQ");
//!
//!     let session = Session::new(Arc::new(YtDlp::default()));
//!     let (tx, mut rx) = ytdlq::events::channel();
//!     tokio::spawn(async move {
//!         while let Some(event) = rx.recv().await {
//!             println!("{:?}", event);
//!         }
//!     });
//!
//!     let summary = session.download_queue(&mut queue, &opts, false, &tx).await?;
//!     println!("{} downloaded, {} failed", summary.done, summary.failed);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod events;
pub mod formats;
pub mod options;
pub mod progress;
pub mod queue;
pub mod session;
pub mod tool;
pub mod units;

pub use error::{Result, YtdlqError};
