//! Read-only snapshot of account state for one reclamation pass.
//!
//! The snapshot is rebuilt fresh at the start of every run and owned
//! exclusively by the driver; nothing mutates it afterwards. Candidate
//! selection applies the folder-as-unit rule here so the planner only ever
//! sees atomic items.

use anyhow::{Context, Result};
use chrono::{NaiveDateTime, Utc};

use super::Storage;
use super::retry::{RetryPolicy, with_retry};

/// A deletable candidate under a managed root folder.
///
/// For a folder whose subtree contains video, this is the whole subtree:
/// `size` is the sum of contained file sizes and `created_at` the earliest
/// creation time seen, so one delete action always removes 100% of it.
#[derive(Debug, Clone)]
pub struct Item {
    pub id: u64,
    pub name: String,
    pub size: u64,
    pub created_at: NaiveDateTime,
    pub is_folder: bool,
    /// Name of the managed root this candidate lives under.
    pub folder: String,
}

/// An entry currently in trash.
#[derive(Debug, Clone)]
pub struct TrashItem {
    pub id: u64,
    pub name: String,
    pub size: u64,
    pub trashed_at: NaiveDateTime,
}

/// Account snapshot: usage figures plus the candidate and trash inventories.
#[derive(Debug, Clone)]
pub struct Inventory {
    /// Total quota in bytes.
    pub quota: u64,
    /// Used bytes, trash included (trash occupies quota until purged).
    pub used: u64,
    /// Bytes currently sitting in trash.
    pub trash_size: u64,
    /// Candidates from the managed folders, folder-as-unit applied.
    pub items: Vec<Item>,
    /// Trashed entries, oldest knowledge the remote gives us.
    pub trash: Vec<TrashItem>,
    /// When the snapshot was taken; every age computation uses this.
    pub taken_at: NaiveDateTime,
}

impl Inventory {
    /// Free space right now. Trash does not count as free.
    pub fn free(&self) -> u64 {
        self.quota.saturating_sub(self.used)
    }

    /// Non-trash (active) usage.
    pub fn active_used(&self) -> u64 {
        self.used.saturating_sub(self.trash_size)
    }

    /// Build a fresh snapshot from the remote account.
    ///
    /// Managed folder names that do not exist at the account root are
    /// logged and skipped; they yield no candidates.
    pub fn snapshot(
        storage: &impl Storage,
        managed_folders: &[String],
        retry: &RetryPolicy,
    ) -> Result<Self> {
        let usage = with_retry(retry, || storage.account_usage())
            .context("could not fetch account usage")?;
        log::debug!(
            "account: quota={} used={} trash={}",
            usage.disk.size,
            usage.disk.used,
            usage.trash_size
        );

        let root = with_retry(retry, || storage.list_folder(0))
            .context("could not list account root")?;

        let mut items = Vec::new();
        for name in managed_folders {
            let Some(folder) = root.iter().find(|f| f.is_folder() && &f.name == name) else {
                log::warn!("managed folder {name:?} not found at account root, skipping");
                continue;
            };
            collect_candidates(storage, retry, folder.id, name, &mut items)
                .with_context(|| format!("could not scan managed folder {name:?}"))?;
        }
        for item in &items {
            log::debug!(
                "candidate {} {:?} ({} bytes) under {:?}",
                if item.is_folder { "folder" } else { "file" },
                item.name,
                item.size,
                item.folder
            );
        }

        let trash = with_retry(retry, || storage.list_trash())
            .context("could not list trash")?
            .into_iter()
            .map(|f| TrashItem {
                id: f.id,
                name: f.name,
                size: f.size,
                // put.io reports created_at for trashed entries as the time
                // they entered trash.
                trashed_at: f.created_at,
            })
            .collect();

        Ok(Self {
            quota: usage.disk.size,
            used: usage.disk.used,
            trash_size: usage.trash_size,
            items,
            trash,
            taken_at: Utc::now().naive_utc(),
        })
    }
}

/// Collect deletable candidates among the direct children of a managed root:
/// individual video files, and child folders whose subtree contains video
/// (added as single atomic items).
fn collect_candidates(
    storage: &impl Storage,
    retry: &RetryPolicy,
    folder_id: u64,
    root_name: &str,
    out: &mut Vec<Item>,
) -> Result<()> {
    let children = with_retry(retry, || storage.list_folder(folder_id))?;

    for child in children {
        if child.is_video() {
            out.push(Item {
                id: child.id,
                name: child.name,
                size: child.size,
                created_at: child.created_at,
                is_folder: false,
                folder: root_name.to_string(),
            });
        } else if child.is_folder() {
            let stats = scan_subtree(storage, retry, child.id)?;
            if stats.has_video {
                out.push(Item {
                    id: child.id,
                    name: child.name,
                    size: stats.file_bytes,
                    created_at: stats
                        .earliest
                        .map_or(child.created_at, |e| e.min(child.created_at)),
                    is_folder: true,
                    folder: root_name.to_string(),
                });
            } else {
                log::debug!("folder {:?} has no video content, leaving alone", child.name);
            }
        }
    }
    Ok(())
}

#[derive(Debug, Default)]
struct SubtreeStats {
    has_video: bool,
    file_bytes: u64,
    earliest: Option<NaiveDateTime>,
}

impl SubtreeStats {
    fn note(&mut self, created_at: NaiveDateTime) {
        self.earliest = Some(self.earliest.map_or(created_at, |e| e.min(created_at)));
    }
}

fn scan_subtree(
    storage: &impl Storage,
    retry: &RetryPolicy,
    folder_id: u64,
) -> Result<SubtreeStats> {
    let children = with_retry(retry, || storage.list_folder(folder_id))?;
    let mut stats = SubtreeStats::default();

    for child in children {
        if child.is_folder() {
            let sub = scan_subtree(storage, retry, child.id)?;
            stats.has_video |= sub.has_video;
            stats.file_bytes += sub.file_bytes;
            if let Some(e) = sub.earliest {
                stats.note(e);
            }
        } else {
            stats.has_video |= child.is_video();
            stats.file_bytes += child.size;
            stats.note(child.created_at);
        }
    }
    Ok(stats)
}
