//! Doctor command - verify external tools and configuration.

use crate::cli::preflight::ffmpeg_binary;
use crate::cli::Output;
use crate::config::Settings;
use crate::queue::DownloadQueue;
use console::style;
use std::path::Path;
use std::process::Command;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    /// Downgrade an error to a warning for optional tools.
    fn optional(mut self) -> Self {
        if self.status == CheckStatus::Error {
            self.status = CheckStatus::Warning;
        }
        self
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings, config_path: &Path) -> anyhow::Result<()> {
    Output::header("ytdlq Doctor");
    println!();
    println!("Checking external tools and configuration...\n");

    let mut checks = Vec::new();

    println!("{}", style("External Tools").bold());
    let tool_checks = vec![
        check_tool("yt-dlp", &settings.tools.ytdlp_path, "--version", install_hint_ytdlp()),
        check_tool("ffmpeg", &ffmpeg_binary(settings), "-version", install_hint_ffmpeg())
            .optional(),
    ];
    for check in &tool_checks {
        check.print();
    }
    checks.extend(tool_checks);

    println!();

    println!("{}", style("Directories").bold());
    let dir_checks = check_directories(settings);
    for check in &dir_checks {
        check.print();
    }
    checks.extend(dir_checks);

    println!();

    println!("{}", style("Configuration").bold());
    let config_checks = vec![check_config_file(config_path), check_cookies(settings)];
    for check in config_checks.iter().flatten() {
        check.print();
    }
    checks.extend(config_checks.into_iter().flatten());

    println!();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before downloading.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! ytdlq is ready to use.");
    }

    Ok(())
}

/// Check if an external tool is available.
fn check_tool(name: &str, binary: &str, version_arg: &str, hint: &str) -> CheckResult {
    match Command::new(binary).arg(version_arg).output() {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .unwrap_or("installed")
                .trim()
                .to_string();

            // Truncate long version strings
            let version_display = if version.chars().count() > 50 {
                format!("{}...", version.chars().take(50).collect::<String>())
            } else {
                version
            };

            CheckResult::ok(name, &version_display)
        }
        Ok(_) => CheckResult::error(name, "installed but not working", hint),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            CheckResult::error(name, &format!("{} not found", binary), hint)
        }
        Err(e) => CheckResult::error(name, &format!("error: {}", e), hint),
    }
}

/// Check the output folder, data directory and queue file.
fn check_directories(settings: &Settings) -> Vec<CheckResult> {
    let mut results = Vec::new();

    let output_dir = settings.output_dir();
    if output_dir.is_dir() {
        results.push(CheckResult::ok(
            "Output folder",
            &format!("{}", output_dir.display()),
        ));
    } else {
        results.push(CheckResult::error(
            "Output folder",
            &format!("{} does not exist", output_dir.display()),
            "Create it or set download.output_dir in the config",
        ));
    }

    let data_dir = settings.data_dir();
    if data_dir.exists() {
        results.push(CheckResult::ok("Data directory", &format!("{}", data_dir.display())));
    } else {
        results.push(CheckResult::warning(
            "Data directory",
            &format!("{} (will be created)", data_dir.display()),
            "Directory will be created on first use",
        ));
    }

    let queue_path = settings.queue_path();
    match DownloadQueue::load(&queue_path) {
        Ok(queue) if queue_path.exists() => results.push(CheckResult::ok(
            "Queue",
            &format!("{} ({} items)", queue_path.display(), queue.len()),
        )),
        Ok(_) => results.push(CheckResult::ok("Queue", "empty")),
        Err(e) => results.push(CheckResult::error(
            "Queue",
            &format!("{} is unreadable: {}", queue_path.display(), e),
            "Fix or delete the file; 'ytdlq clear' rewrites it",
        )),
    }

    results
}

/// Check if the config file in use exists.
fn check_config_file(config_path: &Path) -> Option<CheckResult> {
    Some(if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: ytdlq config init (or ytdlq config edit)",
        )
    })
}

/// Check the configured cookies file, if any.
fn check_cookies(settings: &Settings) -> Option<CheckResult> {
    let cookies = settings.download.cookies.as_deref()?.trim();
    if cookies.is_empty() {
        return None;
    }
    let path = Settings::expand_path(cookies);
    Some(if path.is_file() {
        CheckResult::ok("Cookies", &format!("{}", path.display()))
    } else {
        CheckResult::error(
            "Cookies",
            &format!("{} not found", path.display()),
            "Export a cookies.txt (Netscape format) or unset download.cookies",
        )
    })
}

/// Platform-specific install hint for yt-dlp.
fn install_hint_ytdlp() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install yt-dlp"
    } else if cfg!(target_os = "linux") {
        "Install with: pip install yt-dlp (or your package manager)"
    } else {
        "Install from: https://github.com/yt-dlp/yt-dlp"
    }
}

/// Platform-specific install hint for ffmpeg.
fn install_hint_ffmpeg() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install ffmpeg (needed for audio extraction and merging)"
    } else if cfg!(target_os = "linux") {
        "Install with: sudo apt install ffmpeg (needed for audio extraction and merging)"
    } else {
        "Install from: https://ffmpeg.org/download.html"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_downgrades_error() {
        let result = CheckResult::error("ffmpeg", "not found", "install it").optional();
        assert_eq!(result.status, CheckStatus::Warning);
        assert_eq!(result.hint, Some("install it".to_string()));

        let ok = CheckResult::ok("ffmpeg", "6.0").optional();
        assert_eq!(ok.status, CheckStatus::Ok);
    }

    #[test]
    fn test_missing_tool_is_error() {
        let result = check_tool("yt-dlp", "ytdlq-definitely-missing-binary", "--version", "hint");
        assert_eq!(result.status, CheckStatus::Error);
    }

    #[test]
    fn test_directories() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.general.data_dir = dir.path().join("data").to_string_lossy().to_string();
        settings.download.output_dir = dir.path().to_string_lossy().to_string();

        let results = check_directories(&settings);
        assert_eq!(results[0].status, CheckStatus::Ok);
        assert_eq!(results[1].status, CheckStatus::Warning);
        assert_eq!(results[2].status, CheckStatus::Ok);

        settings.download.output_dir = dir.path().join("missing").to_string_lossy().to_string();
        assert_eq!(check_directories(&settings)[0].status, CheckStatus::Error);
    }

    #[test]
    fn test_config_file_check_uses_given_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        let missing = check_config_file(&path).unwrap();
        assert_eq!(missing.status, CheckStatus::Warning);

        Settings::default().save_to(&path).unwrap();
        let found = check_config_file(&path).unwrap();
        assert_eq!(found.status, CheckStatus::Ok);
        assert!(found.message.contains("custom.toml"));
    }

    #[test]
    fn test_cookies_check() {
        let mut settings = Settings::default();
        assert!(check_cookies(&settings).is_none());

        settings.download.cookies = Some("/definitely/not/here/cookies.txt".to_string());
        assert_eq!(check_cookies(&settings).unwrap().status, CheckStatus::Error);
    }
}
