//! Events flowing from a running task to the front end.

use crate::formats::FormatEntry;
use crate::progress::ProgressUpdate;
use tokio::sync::mpsc;

/// Something the front end should show.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A line for the log view.
    Log(String),
    Progress(ProgressUpdate),
    FormatsReady(Vec<FormatEntry>),
    ItemStarted {
        index: usize,
        total: usize,
        url: String,
    },
    ItemDone {
        url: String,
    },
    Error(String),
    /// The task ended; `canceled` tells whether a cancel was requested.
    Finished {
        canceled: bool,
    },
}

pub type EventSender = mpsc::UnboundedSender<SessionEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<SessionEvent>;

/// Create a channel for session events.
pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Send an event, ignoring a front end that has gone away.
pub fn emit(tx: &EventSender, event: SessionEvent) {
    let _ = tx.send(event);
}

/// Shorthand for [`SessionEvent::Log`].
pub fn log(tx: &EventSender, line: impl Into<String>) {
    emit(tx, SessionEvent::Log(line.into()));
}
