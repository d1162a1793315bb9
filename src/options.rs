//! Translation of user-chosen download options into yt-dlp flags.

use crate::config::Settings;
use crate::error::{Result, YtdlqError};
use crate::units::parse_rate_limit;
use std::path::PathBuf;

/// Format selector used when no specific format is chosen.
pub const BEST_FORMAT: &str = "bv*+ba/b";

/// Format selector used for audio extraction.
pub const BEST_AUDIO_FORMAT: &str = "ba/b";

/// Audio extraction choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioExtraction {
    /// Target codec (mp3, m4a, wav, flac, opus).
    pub format: String,
    /// Bitrate such as "192K".
    pub bitrate: String,
}

impl AudioExtraction {
    /// Quality value yt-dlp expects, i.e. the bitrate without its `K` suffix.
    pub fn quality(&self) -> String {
        self.bitrate.replace(['K', 'k'], "")
    }
}

/// Subtitle choice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubtitleOptions {
    pub languages: Vec<String>,
    /// Also write automatically generated subtitles.
    pub auto: bool,
}

impl SubtitleOptions {
    /// Build from a comma-separated language list, dropping blank entries.
    pub fn from_list(list: &str, auto: bool) -> Self {
        let languages = list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        Self { languages, auto }
    }
}

/// Everything forwarded to yt-dlp for a download or a format listing.
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    pub output_dir: PathBuf,
    /// Explicit format id; `None` or `best` selects [`BEST_FORMAT`].
    pub format: Option<String>,
    pub allow_playlists: bool,
    /// Bytes per second.
    pub rate_limit: Option<u64>,
    pub cookies: Option<PathBuf>,
    pub retries: u32,
    pub fragment_retries: u32,
    pub subtitles: Option<SubtitleOptions>,
    pub embed_metadata: bool,
    pub embed_thumbnail: bool,
    pub write_info_json: bool,
    /// Audio codec and bitrate from the config, used when extraction is switched on.
    pub audio: AudioExtraction,
    pub extract_audio: Option<AudioExtraction>,
    pub ffmpeg_location: Option<String>,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

impl DownloadOptions {
    /// Build options from the configured defaults.
    pub fn from_settings(settings: &Settings) -> Self {
        let cookies = settings
            .download
            .cookies
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(Settings::expand_path);

        let subtitles = settings.subtitles.enabled.then(|| {
            SubtitleOptions::from_list(&settings.subtitles.languages, settings.subtitles.auto)
        });

        let audio = AudioExtraction {
            format: settings.audio.format.clone(),
            bitrate: settings.audio.bitrate.clone(),
        };
        let extract_audio = settings.audio.extract.then(|| audio.clone());

        Self {
            output_dir: settings.output_dir(),
            format: settings.download.format.clone(),
            allow_playlists: settings.download.allow_playlists,
            rate_limit: parse_rate_limit(&settings.download.rate_limit),
            cookies,
            retries: settings.download.retries,
            fragment_retries: settings.download.fragment_retries,
            subtitles,
            embed_metadata: settings.metadata.embed_metadata,
            embed_thumbnail: settings.metadata.embed_thumbnail,
            write_info_json: settings.metadata.write_info_json,
            audio,
            extract_audio,
            ffmpeg_location: settings.tools.ffmpeg_location.clone(),
        }
    }

    /// Check that the output folder exists before anything is spawned.
    pub fn validate(&self) -> Result<()> {
        if self.output_dir.as_os_str().is_empty() {
            return Err(YtdlqError::InvalidOutputDir(
                "Choose a valid output folder.".to_string(),
            ));
        }
        if !self.output_dir.is_dir() {
            return Err(YtdlqError::InvalidOutputDir(format!(
                "{} is not an existing folder",
                self.output_dir.display()
            )));
        }
        Ok(())
    }

    /// The format selector passed with `-f`.
    pub fn format_selector(&self) -> String {
        if self.extract_audio.is_some() {
            return BEST_AUDIO_FORMAT.to_string();
        }
        match self.format.as_deref().map(str::trim) {
            Some(f) if !f.is_empty() && f != "best" => f.to_string(),
            _ => BEST_FORMAT.to_string(),
        }
    }

    /// Output template rooted at the output folder.
    pub fn output_template(&self) -> String {
        self.output_dir
            .join("%(title)s.%(ext)s")
            .to_string_lossy()
            .to_string()
    }

    /// Flags shared by downloads and format listings.
    pub fn base_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        let playlist_flag = if self.allow_playlists { "--yes-playlist" } else { "--no-playlist" };
        args.push(playlist_flag.to_string());

        if let Some(cookies) = &self.cookies {
            args.push("--cookies".to_string());
            args.push(cookies.to_string_lossy().to_string());
        }

        args
    }

    /// Full flag list for a download, excluding progress flags and the URL.
    pub fn download_args(&self) -> Vec<String> {
        let mut args = self.base_args();

        args.extend([
            "--output".to_string(),
            self.output_template(),
            "--format".to_string(),
            self.format_selector(),
            "--retries".to_string(),
            self.retries.to_string(),
            "--fragment-retries".to_string(),
            self.fragment_retries.to_string(),
            "--continue".to_string(),
            "--no-warnings".to_string(),
        ]);

        if let Some(rate) = self.rate_limit {
            args.push("--limit-rate".to_string());
            args.push(rate.to_string());
        }

        if let Some(subs) = &self.subtitles {
            args.push("--write-subs".to_string());
            if !subs.languages.is_empty() {
                args.push("--sub-langs".to_string());
                args.push(subs.languages.join(","));
            }
            if subs.auto {
                args.push("--write-auto-subs".to_string());
            }
        }

        if self.embed_metadata {
            args.push("--embed-metadata".to_string());
        }
        if self.embed_thumbnail {
            args.push("--write-thumbnail".to_string());
            args.push("--embed-thumbnail".to_string());
        }
        if self.write_info_json {
            args.push("--write-info-json".to_string());
        }

        if let Some(audio) = &self.extract_audio {
            args.extend([
                "--extract-audio".to_string(),
                "--audio-format".to_string(),
                audio.format.clone(),
                "--audio-quality".to_string(),
                audio.quality(),
            ]);
        }

        if let Some(loc) = &self.ffmpeg_location {
            args.push("--ffmpeg-location".to_string());
            args.push(loc.clone());
        }

        args
    }
}
