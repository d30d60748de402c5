//! Per-list read/write lock registry.
//!
//! Two levels of locking:
//! - A top-level lock protects the map from list key to per-list lock. It is
//!   taken exclusively to add or remove a list and shared to look up a lock
//!   handle. It is never held while waiting on a list or running an operation.
//! - One read/write lock per list serializes writers on that list and lets
//!   readers share it. Lists never block each other.

use crate::error::{ListError, Result};
use crate::executor::ListDiscovery;
use crate::naming::list_dir;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};
use tracing::{debug, info, warn};

/// Access mode of a [`ListGuard`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardMode {
    /// Shared with other readers, excludes writers.
    Read,
    /// Excludes every other reader and writer.
    Write,
}

/// Lock handle stored for one list.
#[derive(Debug, Clone)]
struct ListLock {
    /// Unique per insertion; a re-added list gets a new id and a new lock.
    id: u64,
    lock: Arc<RwLock<()>>,
}

#[derive(Debug)]
enum HeldLock {
    Read(#[allow(dead_code)] OwnedRwLockReadGuard<()>),
    Write(#[allow(dead_code)] OwnedRwLockWriteGuard<()>),
}

/// A held read or write lock on one list.
///
/// The lock is released exactly once, when the guard is dropped or passed to
/// [`release`](Self::release). A guard stays valid after its list is removed
/// from the registry; it only stops new acquisitions.
#[derive(Debug)]
#[must_use = "the list lock is released as soon as the guard is dropped"]
pub struct ListGuard {
    list: String,
    lock_id: u64,
    held: HeldLock,
}

impl ListGuard {
    /// Registry key of the guarded list.
    pub fn list(&self) -> &str {
        &self.list
    }

    /// Identity of the lock instance this guard holds.
    pub fn lock_id(&self) -> u64 {
        self.lock_id
    }

    pub fn mode(&self) -> GuardMode {
        match self.held {
            HeldLock::Read(_) => GuardMode::Read,
            HeldLock::Write(_) => GuardMode::Write,
        }
    }

    /// Release the lock now rather than at end of scope.
    pub fn release(self) {
        drop(self);
    }
}

/// Counters describing registry activity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// Number of lists currently watched.
    pub lists: usize,
    /// Read guards handed out.
    pub read_acquisitions: u64,
    /// Write guards handed out.
    pub write_acquisitions: u64,
    /// Guard requests refused because the list was not watched.
    pub misses: u64,
}

/// Tracks the watched lists and hands out per-list guards.
#[derive(Debug, Default)]
pub struct ListRegistry {
    lists: RwLock<HashMap<String, ListLock>>,
    next_id: AtomicU64,
    read_acquisitions: AtomicU64,
    write_acquisitions: AtomicU64,
    misses: AtomicU64,
}

impl ListRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start watching a list.
    ///
    /// Returns `false` and leaves the existing lock in place if the list is
    /// already watched.
    pub async fn add(&self, list: &str) -> bool {
        let mut lists = self.lists.write().await;
        if lists.contains_key(list) {
            return false;
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        lists.insert(
            list.to_string(),
            ListLock {
                id,
                lock: Arc::new(RwLock::new(())),
            },
        );
        debug!("Watching list {} (lock {})", list, id);
        true
    }

    /// Stop watching a list.
    ///
    /// Returns `false` if the list was not watched. Guards already held on
    /// the list remain valid until dropped.
    pub async fn remove(&self, list: &str) -> bool {
        let removed = self.lists.write().await.remove(list).is_some();
        if removed {
            debug!("Stopped watching list {}", list);
        }
        removed
    }

    /// Acquire a shared guard on a list.
    ///
    /// Returns `None` without blocking on any list lock if the list is not
    /// watched.
    pub async fn read(&self, list: &str) -> Option<ListGuard> {
        self.acquire(list, GuardMode::Read).await
    }

    /// Acquire an exclusive guard on a list.
    ///
    /// Returns `None` without blocking on any list lock if the list is not
    /// watched.
    pub async fn write(&self, list: &str) -> Option<ListGuard> {
        self.acquire(list, GuardMode::Write).await
    }

    /// Acquire a guard in the given mode.
    ///
    /// If the list is replaced (removed and re-added, or rescanned) while we
    /// are queued, the stale lock is dropped and we queue on the new one.
    /// `None` means the list was not watched when we last looked it up.
    pub async fn acquire(&self, list: &str, mode: GuardMode) -> Option<ListGuard> {
        loop {
            // Clone the handle so the top-level lock is released before we wait.
            let entry = self.lists.read().await.get(list).cloned();
            let Some(entry) = entry else {
                self.misses.fetch_add(1, Ordering::SeqCst);
                debug!("Refused {:?} guard on unwatched list {}", mode, list);
                return None;
            };

            let held = match mode {
                GuardMode::Read => HeldLock::Read(entry.lock.read_owned().await),
                GuardMode::Write => HeldLock::Write(entry.lock.write_owned().await),
            };

            match self.lock_id(list).await {
                Some(id) if id == entry.id => {
                    match mode {
                        GuardMode::Read => self.read_acquisitions.fetch_add(1, Ordering::SeqCst),
                        GuardMode::Write => {
                            self.write_acquisitions.fetch_add(1, Ordering::SeqCst)
                        }
                    };
                    return Some(ListGuard {
                        list: list.to_string(),
                        lock_id: entry.id,
                        held,
                    });
                }
                Some(_) => {
                    debug!(
                        "List {} was replaced while waiting for {:?} guard, requeueing",
                        list, mode
                    );
                    drop(held);
                }
                None => {
                    self.misses.fetch_add(1, Ordering::SeqCst);
                    debug!("List {} was removed while waiting for {:?} guard", list, mode);
                    return None;
                }
            }
        }
    }

    /// Drop every watched list and rediscover lists from `spools`.
    ///
    /// All spools are scanned concurrently and every scan runs to completion.
    /// Lists found in healthy spools are installed even if another spool
    /// fails, in which case the first failure in spool order is returned and
    /// the registry may be partially populated. On success returns the
    /// number of lists now watched.
    pub async fn reinitialize(
        &self,
        spools: &[String],
        discovery: &dyn ListDiscovery,
    ) -> Result<usize> {
        let discarded = {
            let mut lists = self.lists.write().await;
            let count = lists.len();
            lists.clear();
            count
        };
        debug!("Discarded {} list locks before rescan", discarded);

        let scans = spools.iter().map(|spool| self.scan_spool(spool, discovery));
        let results = join_all(scans).await;

        let mut first_error = None;
        for result in results {
            if let Err(err) = result {
                first_error.get_or_insert(err);
            }
        }

        let watched = self.len().await;
        match first_error {
            Some(err) => {
                warn!(
                    "List discovery incomplete, {} lists watched: {}",
                    watched, err
                );
                Err(err)
            }
            None => {
                info!("Watching {} lists across {} spools", watched, spools.len());
                Ok(watched)
            }
        }
    }

    async fn scan_spool(&self, spool: &str, discovery: &dyn ListDiscovery) -> Result<usize> {
        let names = discovery
            .list_names(spool)
            .await
            .map_err(|e| ListError::Discovery {
                spool: spool.to_string(),
                message: e.message,
            })?;

        let mut added = 0;
        for name in &names {
            if self.add(&list_dir(spool, name)).await {
                added += 1;
            }
        }
        debug!("Discovered {} lists in spool {}", added, spool);
        Ok(added)
    }

    /// Check whether a list is watched.
    pub async fn contains(&self, list: &str) -> bool {
        self.lists.read().await.contains_key(list)
    }

    /// Identity of the lock currently installed for a list.
    pub async fn lock_id(&self, list: &str) -> Option<u64> {
        self.lists.read().await.get(list).map(|entry| entry.id)
    }

    /// Number of watched lists.
    pub async fn len(&self) -> usize {
        self.lists.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.lists.read().await.is_empty()
    }

    /// Sorted snapshot of the watched list keys.
    pub async fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lists.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    pub async fn stats(&self) -> RegistryStats {
        RegistryStats {
            lists: self.len().await,
            read_acquisitions: self.read_acquisitions.load(Ordering::SeqCst),
            write_acquisitions: self.write_acquisitions.load(Ordering::SeqCst),
            misses: self.misses.load(Ordering::SeqCst),
        }
    }
}
