//! Small text and unit helpers shared by the queue, options and progress code.

use regex::Regex;
use std::sync::OnceLock;

const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Split text into trimmed, non-empty lines.
pub fn split_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Format a byte count with 1024-based units, or `?` when unknown.
pub fn human_bytes(n: Option<f64>) -> String {
    let Some(mut n) = n else {
        return "?".to_string();
    };

    let mut unit = 0;
    while n >= 1024.0 && unit < UNITS.len() - 1 {
        n /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", n, UNITS[unit])
}

/// Whether `s` is an absolute http(s) URL.
///
/// yt-dlp also accepts bare ids and search prefixes such as `ytsearch:`, so a
/// `false` here is a hint, not a rejection.
pub fn looks_like_url(s: &str) -> bool {
    url::Url::parse(s.trim())
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
        .unwrap_or(false)
}

fn rate_limit_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(\d+(?:\.\d+)?)\s*([KMG])?B?$").expect("valid rate limit regex")
    })
}

/// Parse a rate limit such as `500K`, `1.5M` or `3G` into bytes per second.
///
/// Returns `None` for empty or malformed input.
pub fn parse_rate_limit(s: &str) -> Option<u64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let caps = rate_limit_regex().captures(s)?;
    let value: f64 = caps.get(1)?.as_str().parse().ok()?;
    let multiplier: f64 = match caps.get(2).map(|m| m.as_str().to_ascii_uppercase()) {
        Some(u) if u == "K" => 1024.0,
        Some(u) if u == "M" => 1024.0 * 1024.0,
        Some(u) if u == "G" => 1024.0 * 1024.0 * 1024.0,
        _ => 1.0,
    };

    Some((value * multiplier) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_lines() {
        let lines = split_lines("  https://a\n\n \thttps://b  \n   \n");
        assert_eq!(lines, vec!["https://a", "https://b"]);
        assert!(split_lines("   \n\n").is_empty());
    }

    #[test]
    fn test_looks_like_url() {
        assert!(looks_like_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ"));
        assert!(looks_like_url(" http://vimeo.com/123 "));
        assert!(!looks_like_url("ytsearch:lofi"));
        assert!(!looks_like_url("dQw4w9WgXcQ"));
    }

    #[test]
    fn test_human_bytes() {
        assert_eq!(human_bytes(None), "?");
        assert_eq!(human_bytes(Some(512.0)), "512.00 B");
        assert_eq!(human_bytes(Some(1536.0)), "1.50 KB");
        assert_eq!(human_bytes(Some(1024.0 * 1024.0)), "1.00 MB");
        assert_eq!(human_bytes(Some(2.0 * 1024f64.powi(4))), "2.00 TB");
        assert_eq!(human_bytes(Some(2048.0 * 1024f64.powi(4))), "2048.00 TB");
    }

    #[test]
    fn test_parse_rate_limit() {
        assert_eq!(parse_rate_limit(""), None);
        assert_eq!(parse_rate_limit("   "), None);
        assert_eq!(parse_rate_limit("500"), Some(500));
        assert_eq!(parse_rate_limit("500K"), Some(512_000));
        assert_eq!(parse_rate_limit("2M"), Some(2 * 1024 * 1024));
        assert_eq!(parse_rate_limit("1.5m"), Some(1_572_864));
        assert_eq!(parse_rate_limit("3G"), Some(3 * 1024 * 1024 * 1024));
        assert_eq!(parse_rate_limit("2 MB"), Some(2 * 1024 * 1024));
        assert_eq!(parse_rate_limit("fast"), None);
        assert_eq!(parse_rate_limit("2T"), None);
    }
}
