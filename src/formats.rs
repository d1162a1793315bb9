//! Format listings parsed from yt-dlp's info JSON.

use crate::units::human_bytes;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// One downloadable format of a media item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormatEntry {
    pub format_id: String,
    pub ext: String,
    pub resolution: String,
    pub format_note: String,
    pub vcodec: Option<String>,
    pub acodec: Option<String>,
    pub abr: Option<f64>,
    pub tbr: Option<f64>,
    pub fps: Option<f64>,
    /// Exact or approximate size in bytes.
    pub filesize: Option<f64>,
}

fn str_field(f: &serde_json::Value, key: &str) -> String {
    f.get(key).and_then(|v| v.as_str()).unwrap_or("").to_string()
}

/// Numbers that are absent, null or zero are treated as unknown.
fn num_field(f: &serde_json::Value, key: &str) -> Option<f64> {
    f.get(key).and_then(|v| v.as_f64()).filter(|n| *n != 0.0)
}

fn codec(f: &serde_json::Value, key: &str) -> Option<String> {
    f.get(key)
        .and_then(|v| v.as_str())
        .filter(|c| !c.is_empty() && *c != "none")
        .map(str::to_string)
}

/// Renders a float the way yt-dlp's JSON would show it (`128` or `128.5`).
fn number(n: f64) -> String {
    if n.fract() == 0.0 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl FormatEntry {
    /// Build an entry from one element of the info JSON's `formats` array.
    pub fn from_json(f: &serde_json::Value) -> Self {
        Self {
            format_id: str_field(f, "format_id"),
            ext: str_field(f, "ext"),
            resolution: str_field(f, "resolution"),
            format_note: str_field(f, "format_note"),
            vcodec: codec(f, "vcodec"),
            acodec: codec(f, "acodec"),
            abr: num_field(f, "abr"),
            tbr: num_field(f, "tbr"),
            fps: num_field(f, "fps"),
            filesize: num_field(f, "filesize").or_else(|| num_field(f, "filesize_approx")),
        }
    }

    /// Codec, bitrate, fps and size details joined with ` | `.
    pub fn flags(&self) -> String {
        let mut flags = Vec::new();
        if let Some(v) = &self.vcodec {
            flags.push(v.clone());
        }
        if let Some(a) = &self.acodec {
            flags.push(a.clone());
        }
        if let Some(abr) = self.abr {
            flags.push(format!("abr:{}", number(abr)));
        }
        if let Some(tbr) = self.tbr {
            flags.push(format!("tbr:{}", number(tbr)));
        }
        if let Some(fps) = self.fps {
            flags.push(format!("{}fps", number(fps)));
        }
        if let Some(size) = self.filesize {
            flags.push(human_bytes(Some(size)));
        }
        flags.join(" | ")
    }

    /// Single-line, column-aligned description.
    pub fn display(&self) -> String {
        format!(
            "{:>5}  {:<4}  {:<10}  {:<12}  {}",
            self.format_id,
            self.ext,
            self.resolution,
            self.format_note,
            self.flags()
        )
    }
}

fn height_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{3,4})p").expect("valid height regex"))
}

/// Height mentioned in a display line (e.g. `1080p`), or 0.
fn display_height(display: &str) -> u32 {
    height_regex()
        .captures(display)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

/// Parse and sort the formats of an info JSON document.
///
/// Highest resolution first, ties broken by display text. Documents without a
/// `formats` array (e.g. playlists) yield an empty list.
pub fn parse_formats(info: &serde_json::Value) -> Vec<FormatEntry> {
    let Some(formats) = info.get("formats").and_then(|v| v.as_array()) else {
        return Vec::new();
    };

    let mut entries: Vec<(u32, String, FormatEntry)> = formats
        .iter()
        .map(FormatEntry::from_json)
        .map(|e| {
            let display = e.display();
            (display_height(&display), display, e)
        })
        .collect();

    entries.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
    entries.into_iter().map(|(_, _, e)| e).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_info() -> serde_json::Value {
        json!({
            "id": "abc",
            "formats": [
                {"format_id": "140", "ext": "m4a", "resolution": "audio only", "format_note": "medium",
                 "acodec": "mp4a.40.2", "vcodec": "none", "abr": 129.5, "filesize": 3145728},
                {"format_id": "137", "ext": "mp4", "resolution": "1920x1080", "format_note": "1080p",
                 "vcodec": "avc1.640028", "acodec": "none", "tbr": 4500, "fps": 30,
                 "filesize_approx": 104857600},
                {"format_id": "18", "ext": "mp4", "resolution": "640x360", "format_note": "360p",
                 "vcodec": "avc1.42001E", "acodec": "mp4a.40.2", "fps": 30, "filesize": null},
                {"format_id": "22", "ext": "mp4", "resolution": "1280x720", "format_note": "720p",
                 "vcodec": "avc1.64001F", "acodec": "mp4a.40.2"}
            ]
        })
    }

    #[test]
    fn test_parse_and_sort() {
        let formats = parse_formats(&sample_info());
        let ids: Vec<&str> = formats.iter().map(|f| f.format_id.as_str()).collect();
        assert_eq!(ids, vec!["137", "22", "18", "140"]);
    }

    #[test]
    fn test_display_line() {
        let formats = parse_formats(&sample_info());
        let best = &formats[0];
        assert_eq!(
            best.display(),
            "  137  mp4   1920x1080   1080p         avc1.640028 | tbr:4500 | 30fps | 100.00 MB"
        );

        let audio = formats.iter().find(|f| f.format_id == "140").unwrap();
        assert_eq!(audio.vcodec, None);
        assert_eq!(audio.flags(), "mp4a.40.2 | abr:129.5 | 3.00 MB");
    }

    #[test]
    fn test_missing_formats() {
        assert!(parse_formats(&json!({"_type": "playlist", "entries": []})).is_empty());
        assert!(parse_formats(&json!({"formats": null})).is_empty());
    }

    #[test]
    fn test_display_height() {
        assert_eq!(display_height("  137  mp4   1920x1080   1080p"), 1080);
        assert_eq!(display_height("  140  m4a   audio only  medium"), 0);
    }
}
