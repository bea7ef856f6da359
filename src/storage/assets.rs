//! In-memory references to downloaded images awaiting a host choice.
//!
//! Inline buttons carry at most 64 bytes of callback data, so the menu refers
//! to a downloaded file by a short id instead of its path. The store maps ids
//! to paths for the lifetime of the process.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};

struct AssetEntry {
    location: PathBuf,
    registered_at: Instant,
}

/// Id → downloaded file mapping shared by all chats.
///
/// Every operation takes the same lock, so `claim` and `release` are atomic
/// with respect to concurrent `resolve` calls.
#[derive(Default)]
pub struct AssetStore {
    entries: Mutex<HashMap<String, AssetEntry>>,
}

impl AssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `location` under a fresh id and returns the id.
    ///
    /// Ids are 32 lowercase hex characters (UUID v4, simple form).
    pub async fn register(&self, location: PathBuf) -> String {
        let mut entries = self.entries.lock().await;
        let id = loop {
            let candidate = uuid::Uuid::new_v4().simple().to_string();
            if !entries.contains_key(&candidate) {
                break candidate;
            }
        };
        entries.insert(
            id.clone(),
            AssetEntry {
                location,
                registered_at: Instant::now(),
            },
        );
        id
    }

    /// Stores `location` under a caller-chosen id. Returns `false` and leaves
    /// the store untouched when `id` is already live.
    pub async fn register_with_id(&self, id: impl Into<String>, location: PathBuf) -> bool {
        let mut entries = self.entries.lock().await;
        match entries.entry(id.into()) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(AssetEntry {
                    location,
                    registered_at: Instant::now(),
                });
                true
            }
        }
    }

    /// Returns the location for `id`, or `None` when the id is unknown or the
    /// file is gone from disk. Callers treat both cases as "expired".
    pub async fn resolve(&self, id: &str) -> Option<PathBuf> {
        let location = self.entries.lock().await.get(id).map(|entry| entry.location.clone())?;
        file_exists(&location).await.then_some(location)
    }

    /// Removes the mapping for `id`. Unknown ids are a no-op.
    pub async fn release(&self, id: &str) -> Option<PathBuf> {
        self.entries.lock().await.remove(id).map(|entry| entry.location)
    }

    /// Atomically resolves and releases `id`.
    ///
    /// Of two concurrent claims for the same id at most one gets the asset.
    /// A stale entry (file missing) is dropped and reported as `None`.
    pub async fn claim(&self, id: &str) -> Option<ClaimedAsset> {
        let entry = self.entries.lock().await.remove(id)?;
        if file_exists(&entry.location).await {
            Some(ClaimedAsset::new(entry.location))
        } else {
            log::debug!("Reference {} pointed at a missing file {:?}", id, entry.location);
            None
        }
    }

    /// Drops references registered more than `max_age` ago and returns their
    /// locations. The caller owns the returned files.
    pub async fn evict_stale(&self, max_age: Duration) -> Vec<PathBuf> {
        let mut entries = self.entries.lock().await;
        let stale: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| entry.registered_at.elapsed() >= max_age)
            .map(|(id, _)| id.clone())
            .collect();

        stale
            .into_iter()
            .filter_map(|id| entries.remove(&id).map(|entry| entry.location))
            .collect()
    }

    /// Number of outstanding references
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

/// A downloaded file that no longer has a store entry.
///
/// The holder is the only owner of the file. It is unlinked exactly once,
/// either through [`ClaimedAsset::discard`] or when the value is dropped.
#[derive(Debug)]
pub struct ClaimedAsset {
    location: Option<PathBuf>,
}

impl ClaimedAsset {
    pub fn new(location: PathBuf) -> Self {
        Self {
            location: Some(location),
        }
    }

    pub fn path(&self) -> &Path {
        self.location.as_deref().unwrap_or_else(|| Path::new(""))
    }

    /// Unlinks the file now. Returns `true` if a file was actually removed.
    pub async fn discard(mut self) -> bool {
        match self.location.take() {
            Some(location) => match tokio::fs::remove_file(&location).await {
                Ok(()) => true,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
                Err(e) => {
                    log::warn!("Failed to remove {:?}: {}", location, e);
                    false
                }
            },
            None => false,
        }
    }
}

impl Drop for ClaimedAsset {
    fn drop(&mut self) {
        if let Some(location) = self.location.take() {
            remove_quietly(&location);
        }
    }
}

/// Periodically evicts references older than `ttl` and unlinks their files.
///
/// Runs every `interval` until the returned handle is aborted.
pub fn spawn_sweeper(store: Arc<AssetStore>, ttl: Duration, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let evicted = store.evict_stale(ttl).await;
            if evicted.is_empty() {
                continue;
            }
            log::info!("🧹 Evicting {} abandoned image(s)", evicted.len());
            crate::core::metrics::ASSETS_EVICTED_TOTAL.inc_by(evicted.len() as f64);
            for location in evicted {
                remove_file_quietly(&location).await;
            }
        }
    })
}

async fn file_exists(location: &Path) -> bool {
    tokio::fs::try_exists(location).await.unwrap_or(false)
}

/// Unlinks `location`, ignoring files that are already gone
pub async fn remove_file_quietly(location: &Path) {
    log_removal(location, tokio::fs::remove_file(location).await);
}

/// Blocking variant for `Drop`, where no runtime can be awaited
fn remove_quietly(location: &Path) {
    log_removal(location, std::fs::remove_file(location));
}

fn log_removal(location: &Path, result: std::io::Result<()>) {
    match result {
        Ok(()) => log::debug!("Removed {:?}", location),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => log::warn!("Failed to remove {:?}: {}", location, e),
    }
}
