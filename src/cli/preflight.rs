//! Pre-flight checks before spawning yt-dlp.
//!
//! Validates that required tools are available so a queue run does not
//! fail on every item for the same reason.

use crate::config::Settings;
use crate::error::{Result, YtdlqError};
use crate::options::DownloadOptions;
use std::process::Command;
use tracing::warn;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Listing formats only needs yt-dlp.
    ListFormats,
    /// Downloads need yt-dlp, and ffmpeg for post-processing.
    Download,
}

/// Run pre-flight checks for the given operation.
///
/// A missing ffmpeg is only an error when the options need post-processing.
pub fn check(operation: Operation, settings: &Settings, opts: &DownloadOptions) -> Result<()> {
    check_tool(&settings.tools.ytdlp_path)?;

    if let Operation::Download = operation {
        let ffmpeg = ffmpeg_binary(settings);
        if let Err(e) = check_tool(&ffmpeg) {
            if needs_ffmpeg(opts) {
                return Err(e);
            }
            warn!("ffmpeg unavailable, merging separate video/audio streams may fail: {}", e);
        }
    }
    Ok(())
}

/// Whether the chosen options can only be satisfied with ffmpeg.
pub fn needs_ffmpeg(opts: &DownloadOptions) -> bool {
    opts.extract_audio.is_some() || opts.embed_thumbnail || opts.embed_metadata
}

/// ffmpeg binary implied by the configured location, if any.
pub fn ffmpeg_binary(settings: &Settings) -> String {
    match &settings.tools.ffmpeg_location {
        Some(loc) => {
            let path = Settings::expand_path(loc);
            if path.is_dir() {
                path.join("ffmpeg").to_string_lossy().to_string()
            } else {
                path.to_string_lossy().to_string()
            }
        }
        None => "ffmpeg".to_string(),
    }
}

/// Check if an external tool is available.
pub fn check_tool(name: &str) -> Result<()> {
    // ffmpeg/ffprobe use -version (single dash), others use --version
    let version_arg = if name.ends_with("ffmpeg") || name.ends_with("ffprobe") {
        "-version"
    } else {
        "--version"
    };
    match Command::new(name).arg(version_arg).output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(YtdlqError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(YtdlqError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(YtdlqError::ToolNotFound(format!("{}: {}", name, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_ytdlp_fails() {
        let mut settings = Settings::default();
        settings.tools.ytdlp_path = "ytdlq-definitely-missing-binary".to_string();
        let result = check(Operation::ListFormats, &settings, &DownloadOptions::default());
        assert!(matches!(result, Err(YtdlqError::ToolNotFound(_))));
    }

    #[test]
    fn test_needs_ffmpeg() {
        let mut opts = DownloadOptions::default();
        assert!(!needs_ffmpeg(&opts));
        opts.embed_thumbnail = true;
        assert!(needs_ffmpeg(&opts));
    }

    #[test]
    fn test_ffmpeg_binary_from_location() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        assert_eq!(ffmpeg_binary(&settings), "ffmpeg");

        settings.tools.ffmpeg_location = Some(dir.path().to_string_lossy().to_string());
        assert!(ffmpeg_binary(&settings).ends_with("ffmpeg"));
        assert!(ffmpeg_binary(&settings).starts_with(&*dir.path().to_string_lossy()));
    }
}
