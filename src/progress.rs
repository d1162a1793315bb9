//! Parsing of yt-dlp progress output.
//!
//! yt-dlp is asked to print one machine-readable line per progress tick via
//! `--progress-template`. Fields yt-dlp does not know are printed as `NA`.

use crate::units::human_bytes;
use std::time::{Duration, Instant};

/// Prefix marking our progress lines on stdout.
pub const PROGRESS_PREFIX: &str = "ytdlq:";

/// Minimum gap between two emitted downloading updates.
pub const THROTTLE_INTERVAL: Duration = Duration::from_millis(150);

/// Message shown once a file is fully downloaded.
pub const FINISHED_MESSAGE: &str = "Download finished. Post-processing…";

/// Value for `--progress-template`.
pub fn progress_template() -> String {
    format!(
        "download:{}%(progress.status)s|%(progress.downloaded_bytes)s|%(progress.total_bytes)s|%(progress.total_bytes_estimate)s|%(progress.speed)s|%(progress.eta)s",
        PROGRESS_PREFIX
    )
}

/// Flags that make yt-dlp emit parseable progress.
pub fn progress_args() -> Vec<String> {
    vec![
        "--newline".to_string(),
        "--progress-template".to_string(),
        progress_template(),
    ]
}

/// Raw progress sample as reported by yt-dlp.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressSample {
    Downloading {
        downloaded: f64,
        total: Option<f64>,
        speed: Option<f64>,
        eta: Option<u64>,
    },
    Finished,
    /// Any other status yt-dlp may report (e.g. `error`).
    Other(String),
}

/// A progress update ready for display.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    /// Percentage in `0.0..=100.0`.
    pub percent: f64,
    pub message: String,
}

fn field(raw: Option<&str>) -> Option<f64> {
    let raw = raw?.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("NA") || raw.eq_ignore_ascii_case("None") {
        return None;
    }
    raw.parse::<f64>().ok()
}

/// Parse one stdout line; `None` means it is not a progress line.
pub fn parse_progress_line(line: &str) -> Option<ProgressSample> {
    let body = line.trim().strip_prefix(PROGRESS_PREFIX)?;
    let mut parts = body.split('|');
    let status = parts.next()?.trim();

    match status {
        "downloading" => {
            let downloaded = field(parts.next()).unwrap_or(0.0);
            let total_bytes = field(parts.next());
            let estimate = field(parts.next());
            let speed = field(parts.next());
            let eta = field(parts.next()).map(|e| e.max(0.0) as u64);
            Some(ProgressSample::Downloading {
                downloaded,
                total: total_bytes.filter(|t| *t > 0.0).or(estimate),
                speed,
                eta,
            })
        }
        "finished" => Some(ProgressSample::Finished),
        other => Some(ProgressSample::Other(other.to_string())),
    }
}

impl ProgressSample {
    /// Convert a sample into a percentage and status line.
    pub fn to_update(&self) -> Option<ProgressUpdate> {
        match self {
            ProgressSample::Downloading {
                downloaded,
                total,
                speed,
                eta,
            } => {
                let percent = match total {
                    Some(t) if *t > 0.0 => (downloaded / t * 100.0).clamp(0.0, 100.0),
                    _ => 0.0,
                };
                let eta = eta.map(|e| e.to_string()).unwrap_or_else(|| "?".to_string());
                let message = format!(
                    "{:5.1}%  |  {} / {}  |  {}/s  |  ETA {}s",
                    percent,
                    human_bytes(Some(*downloaded)),
                    human_bytes(*total),
                    human_bytes(*speed),
                    eta
                );
                Some(ProgressUpdate { percent, message })
            }
            ProgressSample::Finished => Some(ProgressUpdate {
                percent: 100.0,
                message: FINISHED_MESSAGE.to_string(),
            }),
            ProgressSample::Other(_) => None,
        }
    }
}

/// Drops downloading updates that arrive faster than [`THROTTLE_INTERVAL`].
#[derive(Debug)]
pub struct ProgressThrottle {
    interval: Duration,
    last: Option<Instant>,
}

impl Default for ProgressThrottle {
    fn default() -> Self {
        Self::new(THROTTLE_INTERVAL)
    }
}

impl ProgressThrottle {
    pub fn new(interval: Duration) -> Self {
        Self { interval, last: None }
    }

    /// Whether the sample observed at `now` should be shown.
    pub fn admit(&mut self, sample: &ProgressSample, now: Instant) -> bool {
        if !matches!(sample, ProgressSample::Downloading { .. }) {
            return true;
        }
        if let Some(last) = self.last {
            if now.duration_since(last) < self.interval {
                return false;
            }
        }
        self.last = Some(now);
        true
    }
}
