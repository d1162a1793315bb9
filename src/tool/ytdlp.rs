//! yt-dlp subprocess implementation of [`MediaTool`].

use super::MediaTool;
use crate::error::{Result, YtdlqError};
use crate::events::{self, EventSender, SessionEvent};
use crate::formats::{parse_formats, FormatEntry};
use crate::options::DownloadOptions;
use crate::progress::{parse_progress_line, progress_args, ProgressThrottle};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Longest raw stderr excerpt used as an error message.
const MAX_ERROR_LEN: usize = 300;

/// How long the output readers may keep draining after the process is gone.
/// Grandchildren such as ffmpeg can hold the pipes open past that.
const READER_GRACE: Duration = Duration::from_millis(500);

/// Runs the yt-dlp executable.
#[derive(Debug, Clone)]
pub struct YtDlp {
    binary: String,
}

impl YtDlp {
    /// Use `binary`, either a name on PATH or an absolute path.
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.stdin(Stdio::null()).kill_on_drop(true);
        cmd
    }

    fn spawn_error(&self, e: std::io::Error) -> YtdlqError {
        if e.kind() == std::io::ErrorKind::NotFound {
            YtdlqError::ToolNotFound(self.binary.clone())
        } else {
            YtdlqError::ToolFailed(format!("Failed to run {}: {}", self.binary, e))
        }
    }
}

impl Default for YtDlp {
    fn default() -> Self {
        Self::new("yt-dlp")
    }
}

/// Read the next line, decoding invalid UTF-8 lossily. `None` at end of stream.
async fn next_line<R: AsyncBufRead + Unpin>(reader: &mut R, buf: &mut Vec<u8>) -> Option<String> {
    buf.clear();
    match reader.read_until(b'\n', buf).await {
        Ok(0) | Err(_) => None,
        Ok(_) => {
            let line = String::from_utf8_lossy(buf);
            Some(line.trim_end_matches(['\n', '\r']).to_string())
        }
    }
}

/// Wait for a reader task, giving up after [`READER_GRACE`].
async fn join_reader<T: Default>(mut handle: JoinHandle<T>) -> T {
    match tokio::time::timeout(READER_GRACE, &mut handle).await {
        Ok(result) => result.unwrap_or_default(),
        Err(_) => {
            warn!("yt-dlp output still open after exit, detaching reader");
            handle.abort();
            T::default()
        }
    }
}

/// Turn yt-dlp's stderr into a short, readable message.
///
/// Prefers the last `ERROR:` line; otherwise the trimmed output, capped at
/// [`MAX_ERROR_LEN`] characters.
pub fn error_message(stderr: &str) -> String {
    let last_error = stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| l.to_ascii_lowercase().starts_with("error:"));

    if let Some(line) = last_error {
        return line[6..].trim().to_string();
    }

    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        return "yt-dlp exited with an error".to_string();
    }
    trimmed.chars().take(MAX_ERROR_LEN).collect()
}

#[async_trait]
impl MediaTool for YtDlp {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    #[instrument(skip(self, opts))]
    async fn list_formats(&self, url: &str, opts: &DownloadOptions) -> Result<Vec<FormatEntry>> {
        let output = self
            .command()
            .args(opts.base_args())
            .args(["--dump-single-json", "--skip-download", "--no-warnings", "--"])
            .arg(url)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(YtdlqError::ToolFailed(error_message(&stderr)));
        }

        let info: serde_json::Value = serde_json::from_slice(&output.stdout)?;
        let formats = parse_formats(&info);
        info!("Found {} formats", formats.len());
        Ok(formats)
    }

    #[instrument(skip(self, opts, events, cancel))]
    async fn download(
        &self,
        url: &str,
        opts: &DownloadOptions,
        events: &EventSender,
        cancel: &CancellationToken,
    ) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(YtdlqError::Canceled);
        }

        let mut args = opts.download_args();
        args.extend(progress_args());
        args.push("--".to_string());
        args.push(url.to_string());
        debug!("yt-dlp args: {:?}", args);

        let mut child = self
            .command()
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| YtdlqError::ToolFailed("yt-dlp stdout unavailable".into()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| YtdlqError::ToolFailed("yt-dlp stderr unavailable".into()))?;

        let stdout_tx = events.clone();
        let stdout_reader = tokio::spawn(async move {
            let mut reader = BufReader::new(stdout);
            let mut raw = Vec::new();
            let mut throttle = ProgressThrottle::default();
            while let Some(line) = next_line(&mut reader, &mut raw).await {
                match parse_progress_line(&line) {
                    Some(sample) => {
                        if !throttle.admit(&sample, Instant::now()) {
                            continue;
                        }
                        if let Some(update) = sample.to_update() {
                            events::emit(&stdout_tx, SessionEvent::Progress(update));
                        }
                    }
                    None if line.trim().is_empty() => {}
                    None => events::log(&stdout_tx, line),
                }
            }
        });

        let stderr_tx = events.clone();
        let stderr_reader = tokio::spawn(async move {
            let mut buf = String::new();
            let mut reader = BufReader::new(stderr);
            let mut raw = Vec::new();
            while let Some(line) = next_line(&mut reader, &mut raw).await {
                buf.push_str(&line);
                buf.push('\n');
                events::log(&stderr_tx, line);
            }
            buf
        });

        let status = tokio::select! {
            s = child.wait() => s.map_err(|e| {
                YtdlqError::ToolFailed(format!("yt-dlp process failed: {e}"))
            })?,
            _ = cancel.cancelled() => {
                warn!("Cancel requested, stopping yt-dlp");
                let _ = child.kill().await;
                join_reader(stdout_reader).await;
                join_reader(stderr_reader).await;
                return Err(YtdlqError::Canceled);
            }
        };

        join_reader(stdout_reader).await;
        let stderr_content = join_reader(stderr_reader).await;

        if status.success() {
            info!("Downloaded {}", url);
            Ok(())
        } else {
            Err(YtdlqError::ToolFailed(error_message(&stderr_content)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[cfg(unix)]
    use crate::progress::ProgressUpdate;

    #[test]
    fn test_error_message_prefers_last_error_line() {
        let stderr =
            "WARNING: something\nERROR: first\nfoo\nERROR: [youtube] abc: Video unavailable\n";
        assert_eq!(error_message(stderr), "[youtube] abc: Video unavailable");
    }

    #[test]
    fn test_error_message_falls_back_to_output() {
        assert_eq!(error_message("  boom  \n"), "boom");
        assert_eq!(error_message(""), "yt-dlp exited with an error");

        let long = "x".repeat(1000);
        assert_eq!(error_message(&long).len(), MAX_ERROR_LEN);
    }

    #[tokio::test]
    async fn test_missing_binary_is_tool_not_found() {
        let tool = YtDlp::new("ytdlq-definitely-missing-binary");
        let err = tool
            .list_formats("https://example.com/v", &DownloadOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, YtdlqError::ToolNotFound(_)));
    }

    #[cfg(unix)]
    fn fake_ytdlp(dir: &tempfile::TempDir, body: &str) -> YtDlp {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.path().join("yt-dlp");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        YtDlp::new(path.to_string_lossy().to_string())
    }

    #[cfg(unix)]
    fn drain(rx: &mut events::EventReceiver) -> (Vec<String>, Vec<ProgressUpdate>) {
        let mut logs = Vec::new();
        let mut progress = Vec::new();
        while let Ok(event) = rx.try_recv() {
            match event {
                SessionEvent::Log(line) => logs.push(line),
                SessionEvent::Progress(update) => progress.push(update),
                _ => {}
            }
        }
        (logs, progress)
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_download_streams_progress_and_logs() {
        let dir = tempfile::tempdir().unwrap();
        let tool = fake_ytdlp(
            &dir,
            "printf 'caf\\351.mp4\\n'\n\
             echo 'ytdlq:downloading|512|1024|NA|256|2'\n\
             echo '[download] Destination: clip.mp4'\n\
             echo 'ytdlq:finished|1024|1024|NA|NA|NA'\n\
             echo 'post-processing done' >&2\n\
             exit 0",
        );
        let (tx, mut rx) = events::channel();

        let cancel = CancellationToken::new();
        tool.download("https://example.com/v", &DownloadOptions::default(), &tx, &cancel)
            .await
            .unwrap();

        let (logs, progress) = drain(&mut rx);
        assert!(logs.iter().any(|l| l.starts_with("caf") && l.ends_with(".mp4")));
        assert!(logs.contains(&"[download] Destination: clip.mp4".to_string()));
        assert!(logs.contains(&"post-processing done".to_string()));
        assert!(!logs.iter().any(|l| l.starts_with("ytdlq:")));

        assert_eq!(progress.len(), 2);
        assert_eq!(progress[0].percent, 50.0);
        assert_eq!(progress[1].percent, 100.0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_download_throttles_rapid_progress() {
        let dir = tempfile::tempdir().unwrap();
        let tool = fake_ytdlp(
            &dir,
            "i=0\n\
             while [ $i -lt 200 ]; do echo \"ytdlq:downloading|$i|1000|NA|NA|NA\"; i=$((i+1)); done\n\
             echo 'ytdlq:finished|1000|1000|NA|NA|NA'",
        );
        let (tx, mut rx) = events::channel();

        let cancel = CancellationToken::new();
        tool.download("https://example.com/v", &DownloadOptions::default(), &tx, &cancel)
            .await
            .unwrap();

        let (_, progress) = drain(&mut rx);
        assert!(progress.len() < 100);
        assert_eq!(progress.last().map(|p| p.percent), Some(100.0));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_download_failure_uses_last_error_line() {
        let dir = tempfile::tempdir().unwrap();
        let tool = fake_ytdlp(
            &dir,
            "echo 'WARNING: falling back' >&2\n\
             echo 'ERROR: [generic] Unsupported URL: https://example.com/v' >&2\n\
             exit 1",
        );
        let (tx, mut rx) = events::channel();

        let cancel = CancellationToken::new();
        let err = tool
            .download("https://example.com/v", &DownloadOptions::default(), &tx, &cancel)
            .await
            .unwrap_err();
        match err {
            YtdlqError::ToolFailed(msg) => {
                assert_eq!(msg, "[generic] Unsupported URL: https://example.com/v")
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let (logs, _) = drain(&mut rx);
        assert!(logs.contains(&"WARNING: falling back".to_string()));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cancel_stops_running_download() {
        let dir = tempfile::tempdir().unwrap();
        // the background sleep keeps the pipes open after the script itself is killed
        let tool = fake_ytdlp(&dir, "sleep 5 &\nsleep 5");
        let (tx, _rx) = events::channel();
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            trigger.cancel();
        });

        let started = Instant::now();
        let err = tool
            .download("https://example.com/v", &DownloadOptions::default(), &tx, &cancel)
            .await
            .unwrap_err();
        assert!(err.is_canceled());
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_download_already_canceled() {
        let tool = YtDlp::new("ytdlq-definitely-missing-binary");
        let (tx, _rx) = events::channel();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = tool
            .download("https://example.com/v", &DownloadOptions::default(), &tx, &cancel)
            .await
            .unwrap_err();
        assert!(err.is_canceled());
    }
}
