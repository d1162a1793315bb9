//! CLI command implementations.

mod config;
mod doctor;
mod download;
mod formats;
mod queue;

pub use config::run_config;
pub use doctor::run_doctor;
pub use download::{run_download, run_get};
pub use formats::run_formats;
pub use queue::{run_add, run_clear, run_list, run_remove};

use crate::config::Settings;
use crate::session::Session;
use crate::tool::YtDlp;
use std::sync::Arc;

/// Session backed by the configured yt-dlp binary.
fn new_session(settings: &Settings) -> Session {
    Session::new(Arc::new(YtDlp::new(settings.tools.ytdlp_path.clone())))
}
