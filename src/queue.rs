//! The download queue and its on-disk form.

use crate::error::{Result, YtdlqError};
use crate::units::split_lines;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use tracing::debug;
use uuid::Uuid;

/// Lifecycle of a queued item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    #[default]
    Pending,
    Downloading,
    Done,
    Failed,
    Canceled,
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemStatus::Pending => write!(f, "pending"),
            ItemStatus::Downloading => write!(f, "downloading"),
            ItemStatus::Done => write!(f, "done"),
            ItemStatus::Failed => write!(f, "failed"),
            ItemStatus::Canceled => write!(f, "canceled"),
        }
    }
}

/// A URL waiting to be downloaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadItem {
    pub id: Uuid,
    pub url: String,
    #[serde(default)]
    pub status: ItemStatus,
    /// Last error reported for this item.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub added_at: DateTime<Utc>,
}

impl DownloadItem {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            url: url.into(),
            status: ItemStatus::Pending,
            error: None,
            added_at: Utc::now(),
        }
    }
}

/// Ordered list of download items.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DownloadQueue {
    items: Vec<DownloadItem>,
}

impl DownloadQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the queue file; a missing file is an empty queue.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Self::new());
        }
        let queue: DownloadQueue = serde_json::from_str(&content)?;
        debug!("Loaded {} queued items from {:?}", queue.len(), path);
        Ok(queue)
    }

    /// Write the queue atomically next to its final location.
    pub fn save(&self, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        let json = serde_json::to_string_pretty(self)?;
        tmp.write_all(json.as_bytes())?;
        tmp.flush()?;
        tmp.persist(path).map_err(|e| YtdlqError::Io(e.error))?;
        Ok(())
    }

    /// Write this copy's statuses into the queue currently on disk.
    ///
    /// Other commands may add or remove items while a run holds its copy, so
    /// only status and error are taken from `self`, matched by id.
    pub fn save_merged(&self, path: &Path) -> Result<()> {
        let mut current = Self::load(path)?;
        for item in &mut current.items {
            if let Some(ours) = self.items.iter().find(|i| i.id == item.id) {
                item.status = ours.status;
                item.error = ours.error.clone();
            }
        }
        current.save(path)
    }

    /// Append one item per non-empty line of `text`; returns how many were added.
    pub fn add_text(&mut self, text: &str) -> usize {
        let urls = split_lines(text);
        let added = urls.len();
        self.items.extend(urls.into_iter().map(DownloadItem::new));
        added
    }

    /// Append a single URL; blank input is ignored.
    pub fn push(&mut self, url: &str) -> bool {
        let url = url.trim();
        if url.is_empty() {
            return false;
        }
        self.items.push(DownloadItem::new(url));
        true
    }

    /// Remove items by zero-based index and return them in queue order.
    ///
    /// Fails without removing anything if any index is out of range.
    pub fn remove(&mut self, indices: &[usize]) -> Result<Vec<DownloadItem>> {
        if let Some(bad) = indices.iter().find(|&&i| i >= self.items.len()) {
            return Err(YtdlqError::InvalidInput(format!(
                "No queue item at position {} (queue has {} items)",
                bad + 1,
                self.items.len()
            )));
        }

        let mut sorted: Vec<usize> = indices.to_vec();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        sorted.dedup();

        let mut removed: Vec<DownloadItem> =
            sorted.into_iter().map(|i| self.items.remove(i)).collect();
        removed.reverse();
        Ok(removed)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Drop items that downloaded successfully; returns how many were dropped.
    pub fn clear_finished(&mut self) -> usize {
        let before = self.items.len();
        self.items.retain(|i| i.status != ItemStatus::Done);
        before - self.items.len()
    }

    pub fn items(&self) -> &[DownloadItem] {
        &self.items
    }

    pub fn first(&self) -> Option<&DownloadItem> {
        self.items.first()
    }

    pub fn get_mut(&mut self, id: Uuid) -> Option<&mut DownloadItem> {
        self.items.iter_mut().find(|i| i.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of items in each state, as (pending, done, failed).
    pub fn summary(&self) -> (usize, usize, usize) {
        self.items.iter().fold((0, 0, 0), |(p, d, f), item| match item.status {
            ItemStatus::Done => (p, d + 1, f),
            ItemStatus::Failed => (p, d, f + 1),
            _ => (p + 1, d, f),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls(queue: &DownloadQueue) -> Vec<&str> {
        queue.items().iter().map(|i| i.url.as_str()).collect()
    }

    #[test]
    fn test_add_text() {
        let mut queue = DownloadQueue::new();
        assert_eq!(queue.add_text("https://a\n\n  https://b  \n"), 2);
        assert_eq!(queue.add_text("   "), 0);
        assert_eq!(urls(&queue), vec!["https://a", "https://b"]);
        assert!(queue.items().iter().all(|i| i.status == ItemStatus::Pending));
    }

    #[test]
    fn test_push_ignores_blank() {
        let mut queue = DownloadQueue::new();
        assert!(!queue.push("  "));
        assert!(queue.push(" https://a "));
        assert_eq!(urls(&queue), vec!["https://a"]);
    }

    #[test]
    fn test_remove_multiple() {
        let mut queue = DownloadQueue::new();
        queue.add_text("a\nb\nc\nd");

        let removed = queue.remove(&[0, 2, 2]).unwrap();
        let removed: Vec<&str> = removed.iter().map(|i| i.url.as_str()).collect();
        assert_eq!(removed, vec!["a", "c"]);
        assert_eq!(urls(&queue), vec!["b", "d"]);
    }

    #[test]
    fn test_remove_out_of_range() {
        let mut queue = DownloadQueue::new();
        queue.add_text("a\nb");
        assert!(queue.remove(&[0, 5]).is_err());
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_clear_finished() {
        let mut queue = DownloadQueue::new();
        queue.add_text("a\nb\nc");
        let id = queue.items()[1].id;
        queue.get_mut(id).unwrap().status = ItemStatus::Done;

        assert_eq!(queue.summary(), (2, 1, 0));
        assert_eq!(queue.clear_finished(), 1);
        assert_eq!(urls(&queue), vec!["a", "c"]);

        queue.clear();
        assert!(queue.is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("queue.json");

        let mut queue = DownloadQueue::new();
        queue.add_text("https://a\nhttps://b");
        let id = queue.items()[0].id;
        {
            let item = queue.get_mut(id).unwrap();
            item.status = ItemStatus::Failed;
            item.error = Some("HTTP Error 404".to_string());
        }
        queue.save(&path).unwrap();

        let loaded = DownloadQueue::load(&path).unwrap();
        assert_eq!(urls(&loaded), vec!["https://a", "https://b"]);
        assert_eq!(loaded.items()[0].id, id);
        assert_eq!(loaded.items()[0].status, ItemStatus::Failed);
        assert_eq!(loaded.items()[0].error.as_deref(), Some("HTTP Error 404"));
        assert_eq!(loaded.items()[1].error, None);
    }

    #[test]
    fn test_save_merged_keeps_items_added_meanwhile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queue.json");

        let mut initial = DownloadQueue::new();
        initial.add_text("https://a\nhttps://b");
        initial.save(&path).unwrap();

        let mut running = DownloadQueue::load(&path).unwrap();

        let mut other = DownloadQueue::load(&path).unwrap();
        other.remove(&[1]).unwrap();
        other.push("https://added-meanwhile");
        other.save(&path).unwrap();

        let id = running.items()[0].id;
        running.get_mut(id).unwrap().status = ItemStatus::Done;
        let id = running.items()[1].id;
        running.get_mut(id).unwrap().status = ItemStatus::Failed;
        running.save_merged(&path).unwrap();

        let loaded = DownloadQueue::load(&path).unwrap();
        assert_eq!(urls(&loaded), vec!["https://a", "https://added-meanwhile"]);
        assert_eq!(loaded.items()[0].status, ItemStatus::Done);
        assert_eq!(loaded.items()[1].status, ItemStatus::Pending);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let queue = DownloadQueue::load(&dir.path().join("queue.json")).unwrap();
        assert!(queue.is_empty());
    }
}
