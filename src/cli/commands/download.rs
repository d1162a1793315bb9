//! Download and get command implementations.

use super::new_session;
use crate::cli::preflight::{self, Operation};
use crate::cli::{render_events, with_ctrl_c, OptionArgs, Output};
use crate::config::Settings;
use crate::error::YtdlqError;
use crate::events;
use crate::options::DownloadOptions;
use crate::queue::DownloadQueue;
use anyhow::Result;

/// Build options from settings plus flags and make sure they can run.
fn prepare(options: &OptionArgs, settings: &Settings) -> Result<DownloadOptions> {
    let mut opts = DownloadOptions::from_settings(settings);
    options.apply(&mut opts)?;

    if let Err(e) = opts.validate() {
        Output::error(&format!("{}", e));
        Output::info("Choose a valid output folder with --output-dir or download.output_dir.");
        return Err(e.into());
    }

    if let Err(e) = preflight::check(Operation::Download, settings, &opts) {
        Output::error(&format!("{}", e));
        Output::info("Run 'ytdlq doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    Ok(opts)
}

fn print_options(opts: &DownloadOptions) {
    Output::kv("Output folder", &opts.output_dir.display().to_string());
    Output::kv("Format", &OptionArgs::describe_format(opts));
    if let Some(audio) = &opts.extract_audio {
        Output::kv("Audio", &format!("{} @ {}", audio.format, audio.bitrate));
    }
    if let Some(subs) = &opts.subtitles {
        let auto = if subs.auto { " (+auto)" } else { "" };
        Output::kv("Subtitles", &format!("{}{}", subs.languages.join(","), auto));
    }
    println!();
}

/// Run the download command over the whole queue.
pub async fn run_download(all: bool, options: &OptionArgs, settings: &Settings) -> Result<()> {
    let path = settings.queue_path();
    let mut queue = DownloadQueue::load(&path)?;

    if queue.is_empty() {
        Output::error("Queue empty. Add at least one URL to the queue.");
        anyhow::bail!("Queue is empty");
    }

    let opts = prepare(options, settings)?;
    print_options(&opts);

    let session = new_session(settings);
    let (tx, rx) = events::channel();
    let renderer = tokio::spawn(render_events(rx));

    let result = with_ctrl_c(
        &session,
        &tx,
        session.download_queue(&mut queue, &opts, all, &tx),
    )
    .await;

    drop(tx);
    let _ = renderer.await;

    let summary = result?;
    queue.save_merged(&path)?;

    println!();
    Output::info(&format!(
        "Queue complete: {} downloaded, {} failed, {} not attempted",
        summary.done, summary.failed, summary.skipped
    ));
    if summary.failed > 0 {
        Output::info("Failed items stay in the queue; run 'ytdlq list' to see errors.");
    }
    if summary.canceled {
        return Err(YtdlqError::Canceled.into());
    }

    Ok(())
}

/// Run the get command for a single URL.
pub async fn run_get(url: &str, options: &OptionArgs, settings: &Settings) -> Result<()> {
    let opts = prepare(options, settings)?;
    print_options(&opts);

    let session = new_session(settings);
    let (tx, rx) = events::channel();
    let renderer = tokio::spawn(render_events(rx));

    let result = with_ctrl_c(&session, &tx, session.download_url(url, &opts, &tx)).await;

    drop(tx);
    let _ = renderer.await;

    finish_get(url, result)
}

/// Report a one-off download; a cancel is an error so the exit code shows it.
fn finish_get(url: &str, result: crate::Result<()>) -> Result<()> {
    result?;
    Output::success(&format!("Downloaded {}", url));
    Ok(())
}
