//! CLI module for ytdlq.

pub mod commands;
mod output;
pub mod preflight;
mod render;

pub use output::Output;
pub use render::{render_events, with_ctrl_c};

use crate::config::{AUDIO_BITRATES, AUDIO_FORMATS};
use crate::options::{DownloadOptions, SubtitleOptions, BEST_FORMAT};
use crate::units::parse_rate_limit;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// ytdlq - a download queue for yt-dlp
///
/// Collect URLs in a queue, pick formats, and download them one after another
/// with yt-dlp, with audio extraction, subtitles and metadata embedding.
#[derive(Parser, Debug)]
#[command(name = "ytdlq")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add URLs (videos or playlists) to the queue
    Add {
        /// URLs to add; use '-' to read one URL per line from stdin
        urls: Vec<String>,

        /// Read URLs from a file, one per line
        #[arg(short, long)]
        file: Option<String>,
    },

    /// Show the queue
    List,

    /// Remove items from the queue by position (as shown by 'list')
    Remove {
        /// 1-based positions
        #[arg(required = true)]
        positions: Vec<usize>,
    },

    /// Empty the queue
    Clear {
        /// Only remove items that finished downloading
        #[arg(long)]
        finished: bool,
    },

    /// List available formats for a URL (defaults to the first queued URL)
    Formats {
        url: Option<String>,

        #[command(flatten)]
        options: OptionArgs,
    },

    /// Download every queued item
    Download {
        /// Also re-download items already marked done
        #[arg(long)]
        all: bool,

        #[command(flatten)]
        options: OptionArgs,
    },

    /// Download a single URL without touching the queue
    Get {
        url: String,

        #[command(flatten)]
        options: OptionArgs,
    },

    /// Check yt-dlp, ffmpeg and the output folder
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}

/// Per-run overrides of the configured download options.
#[derive(Args, Debug, Default, Clone)]
pub struct OptionArgs {
    /// Output folder
    #[arg(short, long)]
    pub output_dir: Option<String>,

    /// Format id from 'ytdlq formats' ("best" for best video+audio)
    #[arg(short, long)]
    pub format: Option<String>,

    /// Download only the video when a URL points into a playlist
    #[arg(long)]
    pub no_playlist: bool,

    /// Maximum download rate, e.g. 500K or 2M
    #[arg(long)]
    pub rate_limit: Option<String>,

    /// cookies.txt file in Netscape format
    #[arg(long)]
    pub cookies: Option<String>,

    /// Extract audio with ffmpeg
    #[arg(short = 'x', long)]
    pub extract_audio: bool,

    /// Audio format for --extract-audio
    #[arg(long, value_parser = clap::builder::PossibleValuesParser::new(AUDIO_FORMATS))]
    pub audio_format: Option<String>,

    /// Audio bitrate for --extract-audio
    #[arg(long, value_parser = clap::builder::PossibleValuesParser::new(AUDIO_BITRATES))]
    pub audio_bitrate: Option<String>,

    /// Download subtitles
    #[arg(long)]
    pub subs: bool,

    /// Also download automatic subtitles (with --subs)
    #[arg(long)]
    pub auto_subs: bool,

    /// Subtitle languages, comma-separated
    #[arg(long)]
    pub sub_langs: Option<String>,

    /// Embed metadata
    #[arg(long)]
    pub embed_metadata: bool,

    /// Embed thumbnail
    #[arg(long)]
    pub embed_thumbnail: bool,

    /// Write info JSON (chapters/metadata)
    #[arg(long)]
    pub write_info_json: bool,
}

impl OptionArgs {
    /// Layer these flags over options built from the settings.
    pub fn apply(&self, opts: &mut DownloadOptions) -> anyhow::Result<()> {
        if let Some(dir) = &self.output_dir {
            opts.output_dir = PathBuf::from(shellexpand::tilde(dir.trim()).to_string());
        }
        if let Some(format) = &self.format {
            opts.format = Some(format.trim().to_string())
                .filter(|f| !f.is_empty() && f != "best");
        }
        if self.no_playlist {
            opts.allow_playlists = false;
        }
        if let Some(rate) = &self.rate_limit {
            if rate.trim().is_empty() {
                opts.rate_limit = None;
            } else {
                let bytes = parse_rate_limit(rate).ok_or_else(|| {
                    anyhow::anyhow!("Invalid rate limit '{}', use e.g. 500K or 2M", rate)
                })?;
                opts.rate_limit = Some(bytes);
            }
        }
        if let Some(cookies) = &self.cookies {
            let cookies = cookies.trim();
            opts.cookies = (!cookies.is_empty())
                .then(|| PathBuf::from(shellexpand::tilde(cookies).to_string()));
        }

        if let Some(format) = &self.audio_format {
            opts.audio.format = format.clone();
        }
        if let Some(bitrate) = &self.audio_bitrate {
            opts.audio.bitrate = bitrate.clone();
        }
        // --audio-format/--audio-bitrate alone do not switch extraction on
        if self.extract_audio || opts.extract_audio.is_some() {
            opts.extract_audio = Some(opts.audio.clone());
        }

        if self.subs || self.sub_langs.is_some() || self.auto_subs {
            let existing = opts.subtitles.take();
            if self.subs || existing.is_some() {
                let langs = match (&self.sub_langs, &existing) {
                    (Some(l), _) => l.clone(),
                    (None, Some(s)) => s.languages.join(","),
                    (None, None) => "en".to_string(),
                };
                let auto = self.auto_subs || existing.as_ref().is_some_and(|s| s.auto);
                opts.subtitles = Some(SubtitleOptions::from_list(&langs, auto));
            }
        }

        opts.embed_metadata |= self.embed_metadata;
        opts.embed_thumbnail |= self.embed_thumbnail;
        opts.write_info_json |= self.write_info_json;

        Ok(())
    }

    /// Describe the effective format choice for output.
    pub fn describe_format(opts: &DownloadOptions) -> String {
        let selector = opts.format_selector();
        if selector == BEST_FORMAT {
            "best (default)".to_string()
        } else {
            selector
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> DownloadOptions {
        DownloadOptions {
            output_dir: PathBuf::from("/tmp/out"),
            ..DownloadOptions::default()
        }
    }

    #[test]
    fn test_cli_parses_download_flags() {
        let cli = Cli::parse_from([
            "ytdlq", "-v", "download", "--all", "-x", "--audio-format", "opus", "--subs",
            "--sub-langs", "en,fr", "--rate-limit", "2M",
        ]);
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Download { all, options } => {
                assert!(all);
                assert!(options.extract_audio);
                assert_eq!(options.audio_format.as_deref(), Some("opus"));
                assert_eq!(options.sub_langs.as_deref(), Some("en,fr"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_audio_format() {
        assert!(Cli::try_parse_from(["ytdlq", "get", "u", "--audio-format", "aiff"]).is_err());
    }

    #[test]
    fn test_apply_overrides() {
        let args = OptionArgs {
            output_dir: Some("/tmp/elsewhere".into()),
            format: Some("137".into()),
            no_playlist: true,
            rate_limit: Some("500K".into()),
            extract_audio: true,
            audio_bitrate: Some("320K".into()),
            subs: true,
            embed_thumbnail: true,
            ..OptionArgs::default()
        };
        let mut opts = base();
        args.apply(&mut opts).unwrap();

        assert_eq!(opts.output_dir, PathBuf::from("/tmp/elsewhere"));
        assert_eq!(opts.format.as_deref(), Some("137"));
        assert!(!opts.allow_playlists);
        assert_eq!(opts.rate_limit, Some(512_000));
        let audio = opts.extract_audio.as_ref().unwrap();
        assert_eq!(audio.format, "mp3");
        assert_eq!(audio.bitrate, "320K");
        assert_eq!(opts.subtitles.as_ref().unwrap().languages, vec!["en"]);
        assert!(opts.embed_thumbnail);
        assert_eq!(opts.format_selector(), "ba/b");
    }

    #[test]
    fn test_apply_best_format_and_bad_rate() {
        let mut opts = base();
        opts.format = Some("22".into());
        OptionArgs {
            format: Some("best".into()),
            ..OptionArgs::default()
        }
        .apply(&mut opts)
        .unwrap();
        assert_eq!(opts.format, None);
        assert_eq!(OptionArgs::describe_format(&opts), "best (default)");

        let bad = OptionArgs {
            rate_limit: Some("warp".into()),
            ..OptionArgs::default()
        };
        assert!(bad.apply(&mut opts).is_err());
    }

    #[test]
    fn test_auto_subs_need_subtitles() {
        let mut opts = base();
        OptionArgs {
            auto_subs: true,
            ..OptionArgs::default()
        }
        .apply(&mut opts)
        .unwrap();
        assert!(opts.subtitles.is_none());

        opts.subtitles = Some(SubtitleOptions::from_list("de", false));
        OptionArgs {
            auto_subs: true,
            ..OptionArgs::default()
        }
        .apply(&mut opts)
        .unwrap();
        let subs = opts.subtitles.unwrap();
        assert_eq!(subs.languages, vec!["de"]);
        assert!(subs.auto);
    }

    #[test]
    fn test_audio_format_alone_does_not_enable_extraction() {
        let mut opts = base();
        OptionArgs {
            audio_format: Some("flac".into()),
            ..OptionArgs::default()
        }
        .apply(&mut opts)
        .unwrap();
        assert!(opts.extract_audio.is_none());
    }

    #[test]
    fn test_extract_flag_uses_configured_audio() {
        let mut settings = crate::config::Settings::default();
        settings.download.output_dir = "/tmp/out".into();
        settings.audio.format = "flac".into();
        settings.audio.bitrate = "320K".into();
        let mut opts = DownloadOptions::from_settings(&settings);

        OptionArgs {
            extract_audio: true,
            ..OptionArgs::default()
        }
        .apply(&mut opts)
        .unwrap();
        let audio = opts.extract_audio.as_ref().unwrap();
        assert_eq!(audio.format, "flac");
        assert_eq!(audio.bitrate, "320K");

        OptionArgs {
            extract_audio: true,
            audio_bitrate: Some("192K".into()),
            ..OptionArgs::default()
        }
        .apply(&mut opts)
        .unwrap();
        let audio = opts.extract_audio.unwrap();
        assert_eq!(audio.format, "flac");
        assert_eq!(audio.bitrate, "192K");
    }
}
