//! Formats command implementation.

use super::new_session;
use crate::cli::preflight::{self, Operation};
use crate::cli::{render_events, OptionArgs, Output};
use crate::config::Settings;
use crate::events;
use crate::options::DownloadOptions;
use crate::queue::DownloadQueue;
use anyhow::Result;

/// Pick the URL to inspect: the explicit one, else the first queued item.
fn resolve_url(url: Option<&str>, queue: &DownloadQueue) -> Option<String> {
    url.map(str::trim)
        .filter(|u| !u.is_empty())
        .map(str::to_string)
        .or_else(|| queue.first().map(|i| i.url.clone()))
}

/// Run the formats command.
pub async fn run_formats(
    url: Option<&str>,
    options: &OptionArgs,
    settings: &Settings,
) -> Result<()> {
    let queue = DownloadQueue::load(&settings.queue_path())?;
    let Some(url) = resolve_url(url, &queue) else {
        Output::error("No URL. Pass a URL or add something to the queue.");
        anyhow::bail!("No URL to list formats for");
    };

    let mut opts = DownloadOptions::from_settings(settings);
    options.apply(&mut opts)?;

    if let Err(e) = preflight::check(Operation::ListFormats, settings, &opts) {
        Output::error(&format!("{}", e));
        Output::info("Run 'ytdlq doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let session = new_session(settings);
    let (tx, rx) = events::channel();
    let renderer = tokio::spawn(render_events(rx));

    let spinner = Output::spinner("Fetching formats...");
    let result = session.list_formats(&url, &opts, &tx).await;
    spinner.finish_and_clear();

    drop(tx);
    let _ = renderer.await;

    let formats = result?;
    if formats.is_empty() {
        Output::warning("No formats reported (playlists list formats per entry).");
        return Ok(());
    }

    Output::header(&format!("Formats for {}", url));
    println!();
    let best = Output::dim_style().apply_to(format!("{:>5}", "best"));
    println!("  {}  best video+audio (default)", best);
    for format in &formats {
        println!("  {}", format.display());
    }
    println!();
    Output::info("Pick one with: ytdlq download --format <id>");
    Ok(())
}
