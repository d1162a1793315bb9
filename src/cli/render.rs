//! Terminal rendering of session events.

use super::Output;
use crate::events::{EventReceiver, EventSender, SessionEvent};
use crate::session::Session;
use console::style;
use indicatif::ProgressBar;
use std::future::Future;

/// Draw events until every sender is dropped.
///
/// Log lines are printed above the progress bar; the bar shows the status
/// line of the current download.
pub async fn render_events(mut rx: EventReceiver) {
    let mut bar: Option<ProgressBar> = None;

    while let Some(event) = rx.recv().await {
        match event {
            SessionEvent::Log(line) => match &bar {
                Some(pb) => pb.println(line),
                None => println!("{}", line),
            },
            SessionEvent::Progress(update) => {
                let pb = bar.get_or_insert_with(Output::download_bar);
                pb.set_position(update.percent.clamp(0.0, 100.0) as u64);
                pb.set_message(update.message);
            }
            SessionEvent::ItemStarted { url, .. } => {
                let pb = bar.get_or_insert_with(Output::download_bar);
                pb.set_position(0);
                pb.set_message(format!("Downloading: {}", url));
            }
            SessionEvent::ItemDone { .. } => {
                if let Some(pb) = &bar {
                    pb.set_position(100);
                }
            }
            SessionEvent::Error(msg) => {
                let line = format!("{} {}", style("ERROR:").red().bold(), msg);
                match &bar {
                    Some(pb) => pb.println(line),
                    None => eprintln!("{}", line),
                }
            }
            SessionEvent::FormatsReady(_) => {}
            SessionEvent::Finished { canceled } => {
                if let Some(pb) = bar.take() {
                    pb.finish_and_clear();
                }
                if canceled {
                    Output::warning("Canceled");
                } else {
                    Output::info("Idle");
                }
            }
        }
    }

    if let Some(pb) = bar.take() {
        pb.finish_and_clear();
    }
}

/// Run `task`, cancelling the session on Ctrl-C.
pub async fn with_ctrl_c<F, T>(session: &Session, events: &EventSender, task: F) -> T
where
    F: Future<Output = T>,
{
    tokio::pin!(task);
    loop {
        tokio::select! {
            result = &mut task => return result,
            signal = tokio::signal::ctrl_c() => match signal {
                Ok(()) => session.cancel(events),
                // no signal handler available; let the task run to completion
                Err(_) => return (&mut task).await,
            },
        }
    }
}
