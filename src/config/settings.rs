//! Configuration settings for ytdlq.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Audio formats yt-dlp can extract to.
pub const AUDIO_FORMATS: [&str; 5] = ["mp3", "m4a", "wav", "flac", "opus"];

/// Audio bitrates offered for extraction.
pub const AUDIO_BITRATES: [&str; 3] = ["192K", "256K", "320K"];

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub tools: ToolSettings,
    pub download: DownloadSettings,
    pub audio: AudioSettings,
    pub subtitles: SubtitleSettings,
    pub metadata: MetadataSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing the queue file.
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.ytdlq".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// Locations of the external tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    /// yt-dlp executable (name on PATH or absolute path).
    pub ytdlp_path: String,
    /// Passed to yt-dlp as --ffmpeg-location when set.
    pub ffmpeg_location: Option<String>,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            ytdlp_path: "yt-dlp".to_string(),
            ffmpeg_location: None,
        }
    }
}

/// Download behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadSettings {
    /// Folder downloaded files are written to.
    pub output_dir: String,
    /// Format id to request; `best` or unset picks the best video+audio.
    pub format: Option<String>,
    /// Whether playlist URLs expand to every entry.
    pub allow_playlists: bool,
    /// Rate limit such as "2M"; empty means unlimited.
    pub rate_limit: String,
    /// Optional cookies.txt in Netscape format.
    pub cookies: Option<String>,
    pub retries: u32,
    pub fragment_retries: u32,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            output_dir: "~/Downloads".to_string(),
            format: None,
            allow_playlists: true,
            rate_limit: String::new(),
            cookies: None,
            retries: 3,
            fragment_retries: 3,
        }
    }
}

/// Audio extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    pub extract: bool,
    /// One of mp3, m4a, wav, flac, opus.
    pub format: String,
    /// One of 192K, 256K, 320K.
    pub bitrate: String,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            extract: false,
            format: "mp3".to_string(),
            bitrate: "192K".to_string(),
        }
    }
}

/// Subtitle settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubtitleSettings {
    pub enabled: bool,
    /// Also fetch automatically generated subtitles.
    pub auto: bool,
    /// Comma-separated language codes.
    pub languages: String,
}

impl Default for SubtitleSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            auto: false,
            languages: "en".to_string(),
        }
    }
}

/// Metadata, thumbnail and info JSON settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MetadataSettings {
    pub embed_metadata: bool,
    pub embed_thumbnail: bool,
    pub write_info_json: bool,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            settings.validate()?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::YtdlqError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values yt-dlp would not understand.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::YtdlqError;

        if !AUDIO_FORMATS.contains(&self.audio.format.as_str()) {
            return Err(YtdlqError::Config(format!(
                "audio.format must be one of {}, got '{}'",
                AUDIO_FORMATS.join(", "),
                self.audio.format
            )));
        }
        if !AUDIO_BITRATES.contains(&self.audio.bitrate.as_str()) {
            return Err(YtdlqError::Config(format!(
                "audio.bitrate must be one of {}, got '{}'",
                AUDIO_BITRATES.join(", "),
                self.audio.bitrate
            )));
        }
        if !self.download.rate_limit.trim().is_empty()
            && crate::units::parse_rate_limit(&self.download.rate_limit).is_none()
        {
            return Err(YtdlqError::Config(format!(
                "download.rate_limit '{}' is not a valid rate (e.g. 500K, 2M)",
                self.download.rate_limit
            )));
        }
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ytdlq")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Path of the persisted download queue.
    pub fn queue_path(&self) -> PathBuf {
        self.data_dir().join("queue.json")
    }

    /// Get the expanded output directory path.
    pub fn output_dir(&self) -> PathBuf {
        Self::expand_path(&self.download.output_dir)
    }
}
