//! Runs one task at a time against a [`MediaTool`].
//!
//! A task is either a format listing or a sequential pass over the queue.
//! Everything the user should see is sent as [`SessionEvent`]s.

use crate::error::{Result, YtdlqError};
use crate::events::{self, EventSender, SessionEvent};
use crate::formats::FormatEntry;
use crate::options::DownloadOptions;
use crate::queue::{DownloadQueue, ItemStatus};
use crate::tool::MediaTool;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Outcome of a queue run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub done: usize,
    pub failed: usize,
    /// Items left untouched because of a cancel.
    pub skipped: usize,
    pub canceled: bool,
}

/// Marks the session busy until dropped.
struct TaskGuard<'a> {
    busy: &'a AtomicBool,
    cancel: CancellationToken,
}

impl Drop for TaskGuard<'_> {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::SeqCst);
    }
}

/// Single-task runner shared by the CLI commands.
pub struct Session {
    tool: Arc<dyn MediaTool>,
    busy: AtomicBool,
    cancel: Mutex<CancellationToken>,
}

impl Session {
    pub fn new(tool: Arc<dyn MediaTool>) -> Self {
        Self {
            tool,
            busy: AtomicBool::new(false),
            cancel: Mutex::new(CancellationToken::new()),
        }
    }

    /// Whether a task is currently running.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    fn current_token(&self) -> CancellationToken {
        match self.cancel.lock() {
            Ok(token) => token.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn begin(&self) -> Result<TaskGuard<'_>> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(YtdlqError::Busy);
        }

        let token = CancellationToken::new();
        match self.cancel.lock() {
            Ok(mut current) => *current = token.clone(),
            Err(poisoned) => *poisoned.into_inner() = token.clone(),
        }

        Ok(TaskGuard {
            busy: &self.busy,
            cancel: token,
        })
    }

    /// Ask the running task to stop.
    pub fn cancel(&self, events: &EventSender) {
        events::log(events, "Cancel requested…");
        self.current_token().cancel();
    }

    /// List formats for `url`, emitting [`SessionEvent::FormatsReady`].
    pub async fn list_formats(
        &self,
        url: &str,
        opts: &DownloadOptions,
        events: &EventSender,
    ) -> Result<Vec<FormatEntry>> {
        let guard = self.begin()?;
        events::log(events, format!("Listing formats for: {}", url));

        let result = self.tool.list_formats(url, opts).await;
        match &result {
            Ok(formats) => {
                events::emit(events, SessionEvent::FormatsReady(formats.clone()));
                events::log(events, format!("Loaded {} formats.", formats.len()));
            }
            Err(e) => events::emit(events, SessionEvent::Error(e.to_string())),
        }

        self.finish(&guard, events);
        result
    }

    /// Download a single URL outside the queue.
    pub async fn download_url(
        &self,
        url: &str,
        opts: &DownloadOptions,
        events: &EventSender,
    ) -> Result<()> {
        opts.validate()?;
        let guard = self.begin()?;
        events::log(events, "=== Download started ===");
        events::emit(
            events,
            SessionEvent::ItemStarted {
                index: 1,
                total: 1,
                url: url.to_string(),
            },
        );

        let result = self.tool.download(url, opts, events, &guard.cancel).await;
        match &result {
            Ok(()) => {
                events::emit(events, SessionEvent::ItemDone { url: url.to_string() });
                events::log(events, format!("Done: {}", url));
            }
            Err(e) if e.is_canceled() => events::log(events, "Canceled."),
            Err(e) => events::emit(events, SessionEvent::Error(e.to_string())),
        }

        self.finish(&guard, events);
        result
    }

    /// Download queued items one after another.
    ///
    /// Items already marked done are skipped unless `include_done` is set.
    /// A failed item does not stop the run; a cancel does.
    pub async fn download_queue(
        &self,
        queue: &mut DownloadQueue,
        opts: &DownloadOptions,
        include_done: bool,
        events: &EventSender,
    ) -> Result<RunSummary> {
        if queue.is_empty() {
            return Err(YtdlqError::EmptyQueue);
        }
        opts.validate()?;
        let guard = self.begin()?;

        events::log(events, "=== Download started ===");

        let targets: Vec<(uuid::Uuid, String)> = queue
            .items()
            .iter()
            .filter(|i| include_done || i.status != ItemStatus::Done)
            .map(|i| (i.id, i.url.clone()))
            .collect();
        let total = targets.len();
        info!("Downloading {} of {} queued items with {}", total, queue.len(), self.tool.name());
        if total == 0 {
            events::log(events, "Nothing to download: every item is already done.");
        }

        let mut summary = RunSummary::default();

        for (i, (id, url)) in targets.iter().enumerate() {
            if guard.cancel.is_cancelled() {
                events::log(events, "Canceled before next item.");
                summary.canceled = true;
                summary.skipped = total - i;
                break;
            }

            if let Some(item) = queue.get_mut(*id) {
                item.status = ItemStatus::Downloading;
                item.error = None;
            }
            events::emit(
                events,
                SessionEvent::ItemStarted {
                    index: i + 1,
                    total,
                    url: url.clone(),
                },
            );
            events::log(events, format!("\n--- [{}/{}] {} ---", i + 1, total, url));

            let result = self.tool.download(url, opts, events, &guard.cancel).await;
            let item = queue.get_mut(*id);

            match result {
                Ok(()) => {
                    if let Some(item) = item {
                        item.status = ItemStatus::Done;
                    }
                    summary.done += 1;
                    events::emit(events, SessionEvent::ItemDone { url: url.clone() });
                    events::log(events, format!("Done: {}", url));
                }
                Err(e) if e.is_canceled() => {
                    if let Some(item) = item {
                        item.status = ItemStatus::Canceled;
                    }
                    events::log(events, "Canceled.");
                    summary.canceled = true;
                    summary.skipped = total - i - 1;
                    break;
                }
                Err(e) => {
                    let msg = e.to_string();
                    warn!("Download of {} failed: {}", url, msg);
                    if let Some(item) = item {
                        item.status = ItemStatus::Failed;
                        item.error = Some(msg.clone());
                    }
                    summary.failed += 1;
                    events::log(events, format!("Error: {}", msg));
                }
            }
        }

        info!(
            "Queue run finished: {} done, {} failed, canceled={}",
            summary.done, summary.failed, summary.canceled
        );
        summary.canceled |= guard.cancel.is_cancelled();
        self.finish(&guard, events);
        Ok(summary)
    }

    fn finish(&self, guard: &TaskGuard<'_>, events: &EventSender) {
        events::log(events, "=== Task finished ===");
        events::emit(
            events,
            SessionEvent::Finished {
                canceled: guard.cancel.is_cancelled(),
            },
        );
    }
}
