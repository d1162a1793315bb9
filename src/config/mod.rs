//! Configuration module for ytdlq.
//!
//! Handles loading and saving the TOML settings file.

mod settings;

pub use settings::{
    AudioSettings, DownloadSettings, GeneralSettings, MetadataSettings, Settings,
    SubtitleSettings, ToolSettings, AUDIO_BITRATES, AUDIO_FORMATS,
};
