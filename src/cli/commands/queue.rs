//! Queue commands: add, list, remove, clear.

use crate::cli::Output;
use crate::config::Settings;
use crate::queue::DownloadQueue;
use crate::units::{looks_like_url, split_lines};
use anyhow::{Context, Result};
use std::io::Read;

/// Collect the text to add from arguments, stdin ('-') and an optional file.
fn gather_input(urls: &[String], file: Option<&str>) -> Result<String> {
    let mut text = String::new();

    for url in urls {
        if url == "-" {
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read URLs from stdin")?;
        } else {
            text.push_str(url);
        }
        text.push('\n');
    }

    if let Some(path) = file {
        let path = Settings::expand_path(path);
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        text.push_str(&content);
    }

    Ok(text)
}

/// Run the add command.
pub fn run_add(urls: &[String], file: Option<&str>, settings: &Settings) -> Result<()> {
    let text = gather_input(urls, file)?;
    for entry in split_lines(&text).iter().filter(|e| !looks_like_url(e)) {
        Output::warning(&format!(
            "'{}' is not an http(s) URL; yt-dlp will try it as given",
            entry
        ));
    }

    let path = settings.queue_path();
    let mut queue = DownloadQueue::load(&path)?;

    let added = queue.add_text(&text);
    if added == 0 {
        Output::warning("Nothing to add. Pass URLs, '-' for stdin, or --file.");
        return Ok(());
    }

    queue.save(&path)?;
    Output::success(&format!("Added {} URL(s), {} in queue", added, queue.len()));
    Ok(())
}

/// Run the list command.
pub fn run_list(settings: &Settings) -> Result<()> {
    let queue = DownloadQueue::load(&settings.queue_path())?;

    if queue.is_empty() {
        Output::info("Queue is empty. Use 'ytdlq add <url>' to add content.");
        return Ok(());
    }

    Output::header(&format!("Queue ({})", queue.len()));
    println!();
    for (i, item) in queue.items().iter().enumerate() {
        Output::queue_item(i + 1, item);
    }

    let (pending, done, failed) = queue.summary();
    println!();
    Output::kv("Pending", &pending.to_string());
    Output::kv("Done", &done.to_string());
    Output::kv("Failed", &failed.to_string());
    Ok(())
}

/// Run the remove command with 1-based positions.
pub fn run_remove(positions: &[usize], settings: &Settings) -> Result<()> {
    if positions.contains(&0) {
        anyhow::bail!("Positions start at 1");
    }

    let path = settings.queue_path();
    let mut queue = DownloadQueue::load(&path)?;
    let indices: Vec<usize> = positions.iter().map(|p| p - 1).collect();

    let removed = match queue.remove(&indices) {
        Ok(r) => r,
        Err(e) => {
            Output::error(&e.to_string());
            return Err(e.into());
        }
    };
    queue.save(&path)?;

    for item in &removed {
        Output::list_item(&format!("Removed {}", item.url));
    }
    Output::success(&format!("{} item(s) left in queue", queue.len()));
    Ok(())
}

/// Run the clear command.
pub fn run_clear(finished: bool, settings: &Settings) -> Result<()> {
    let path = settings.queue_path();
    let mut queue = DownloadQueue::load(&path)?;

    if finished {
        let dropped = queue.clear_finished();
        queue.save(&path)?;
        Output::success(&format!(
            "Removed {} finished item(s), {} left",
            dropped,
            queue.len()
        ));
    } else {
        let count = queue.len();
        queue.clear();
        queue.save(&path)?;
        Output::success(&format!("Cleared {} item(s)", count));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_in(dir: &tempfile::TempDir) -> Settings {
        let mut settings = Settings::default();
        settings.general.data_dir = dir.path().to_string_lossy().to_string();
        settings
    }

    #[test]
    fn test_add_remove_clear() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(&dir);

        let urls = ["https://a", "https://b", "https://c"].map(String::from);
        run_add(&urls, None, &settings).unwrap();
        assert_eq!(DownloadQueue::load(&settings.queue_path()).unwrap().len(), 3);

        run_remove(&[1, 3], &settings).unwrap();
        let queue = DownloadQueue::load(&settings.queue_path()).unwrap();
        assert_eq!(queue.items()[0].url, "https://b");
        assert_eq!(queue.len(), 1);

        assert!(run_remove(&[0], &settings).is_err());
        assert!(run_remove(&[7], &settings).is_err());

        run_clear(false, &settings).unwrap();
        assert!(DownloadQueue::load(&settings.queue_path()).unwrap().is_empty());
    }

    #[test]
    fn test_add_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(&dir);
        let list = dir.path().join("urls.txt");
        std::fs::write(&list, "https://a\n\n  https://b\n").unwrap();

        run_add(&[], Some(&list.to_string_lossy()), &settings).unwrap();
        let queue = DownloadQueue::load(&settings.queue_path()).unwrap();
        let urls: Vec<&str> = queue.items().iter().map(|i| i.url.as_str()).collect();
        assert_eq!(urls, vec!["https://a", "https://b"]);
    }
}
