//! Per-PR merge lock stored as files under `<lock_dir>/merge-gate/`.
//!
//! Two runs triggered for the same PR must not race through the
//! status-then-merge sequence. Each merge attempt holds
//! `pr-<number>.lock`, created atomically; a lock older than the staleness
//! window is treated as abandoned by a crashed run and reclaimed.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};
use uuid::Uuid;

/// Directory name for lock files within the configured lock directory
const LOCK_DIR: &str = "merge-gate";

/// Contents of a lock file
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LockRecord {
    /// Unique id of the run holding the lock
    holder: String,
    /// PR the lock protects
    pr_number: u64,
    /// When the lock was taken
    acquired_at: DateTime<Utc>,
}

/// File-backed lock keyed by PR number
#[derive(Debug, Clone)]
pub struct MergeLock {
    dir: PathBuf,
    stale_after: Duration,
}

impl MergeLock {
    /// Create a lock store under `base_dir`
    pub fn new(base_dir: &Path, stale_after: Duration) -> Self {
        Self {
            dir: base_dir.join(LOCK_DIR),
            stale_after,
        }
    }

    /// Path of the lock file for a PR
    pub fn lock_path(&self, pr_number: u64) -> PathBuf {
        self.dir.join(format!("pr-{pr_number}.lock"))
    }

    /// Take the lock for `pr_number`.
    ///
    /// Fails with [`Error::MergeInProgress`] while another run holds a live
    /// lock. The lock is released when the returned guard is dropped.
    pub fn acquire(&self, pr_number: u64) -> Result<MergeLockGuard> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| Error::Lock(format!("failed to create {}: {e}", self.dir.display())))?;

        let path = self.lock_path(pr_number);
        let record = LockRecord {
            holder: Uuid::new_v4().to_string(),
            pr_number,
            acquired_at: Utc::now(),
        };
        let content = toml::to_string_pretty(&record)
            .map_err(|e| Error::Lock(format!("failed to serialize lock record: {e}")))?;

        // second pass only after reclaiming a stale lock
        for reclaimed in [false, true] {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    file.write_all(content.as_bytes()).map_err(|e| {
                        Error::Lock(format!("failed to write {}: {e}", path.display()))
                    })?;
                    debug!(pr_number, path = %path.display(), "acquired merge lock");
                    return Ok(MergeLockGuard {
                        path,
                        holder: record.holder,
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    let stale_holder = match self.inspect(&path) {
                        Existing::Stale { holder } if !reclaimed => holder,
                        _ => return Err(Error::MergeInProgress(pr_number)),
                    };
                    warn!(pr_number, path = %path.display(), "reclaiming stale merge lock");
                    if !reclaim(&path, stale_holder.as_deref())? {
                        return Err(Error::MergeInProgress(pr_number));
                    }
                }
                Err(e) => {
                    return Err(Error::Lock(format!(
                        "failed to create {}: {e}",
                        path.display()
                    )));
                }
            }
        }

        Err(Error::MergeInProgress(pr_number))
    }

    /// Classify an existing lock file by age.
    ///
    /// Unparsable files (e.g. mid-write) fall back to the file's mtime.
    fn inspect(&self, path: &Path) -> Existing {
        let (holder, age) = match read_record(path) {
            Some(record) => (
                Some(record.holder),
                (Utc::now() - record.acquired_at).to_std().unwrap_or_default(),
            ),
            None => match fs::metadata(path).and_then(|m| m.modified()) {
                Ok(modified) => (
                    None,
                    SystemTime::now()
                        .duration_since(modified)
                        .unwrap_or_default(),
                ),
                // released in the meantime
                Err(_) => return Existing::Stale { holder: None },
            },
        };
        if age > self.stale_after {
            Existing::Stale { holder }
        } else {
            Existing::Live
        }
    }
}

/// State of a lock file another run created
enum Existing {
    Live,
    Stale { holder: Option<String> },
}

/// Move a stale lock out of the way.
///
/// The file is renamed to a unique tombstone first so only one run can take
/// it. If the tombstone turns out to hold a different holder than the one
/// judged stale, a fresh lock was taken in between: it is linked back and
/// `false` is returned.
fn reclaim(path: &Path, stale_holder: Option<&str>) -> Result<bool> {
    let tombstone = path.with_extension(format!("lock.{}.stale", Uuid::new_v4()));
    match fs::rename(path, &tombstone) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(true),
        Err(e) => {
            return Err(Error::Lock(format!(
                "failed to move stale {}: {e}",
                path.display()
            )));
        }
    }

    let moved_holder = read_record(&tombstone).map(|r| r.holder);
    let restored = moved_holder.as_deref() != stale_holder;
    if restored {
        debug!(path = %path.display(), "lock was retaken before reclaim, restoring it");
        if let Err(e) = fs::hard_link(&tombstone, path) {
            warn!(path = %path.display(), error = %e, "failed to restore merge lock");
        }
    }
    if let Err(e) = fs::remove_file(&tombstone) {
        warn!(path = %tombstone.display(), error = %e, "failed to remove lock tombstone");
    }
    Ok(!restored)
}

fn read_record(path: &Path) -> Option<LockRecord> {
    let content = fs::read_to_string(path).ok()?;
    toml::from_str(&content).ok()
}

/// Held merge lock, released on drop
#[derive(Debug)]
pub struct MergeLockGuard {
    path: PathBuf,
    holder: String,
}

impl Drop for MergeLockGuard {
    fn drop(&mut self) {
        // a reclaimed lock belongs to someone else now
        let owned = read_record(&self.path).is_some_and(|r| r.holder == self.holder);
        if !owned {
            return;
        }
        if let Err(e) = fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "failed to release merge lock");
        } else {
            debug!(path = %self.path.display(), "released merge lock");
        }
    }
}
