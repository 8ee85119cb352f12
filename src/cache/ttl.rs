//! TTL cache with a background sweep task
//!
//! Provides a `TtlCache` that stores cloneable values under string keys with a
//! creation timestamp. Expiry is checked on every read, and a tokio task spawned
//! alongside the cache deletes expired entries every TTL interval until the cache
//! is stopped or dropped.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, trace};

/// Errors that can occur when constructing a cache
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CacheError {
    /// A zero TTL would expire every entry on insert and stall the sweep timer
    #[error("cache TTL must be greater than zero")]
    InvalidTtl,
}

/// A cached value together with the instant it was stored
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    created_at: Instant,
    value: V,
}

type EntryMap<V> = Arc<Mutex<HashMap<String, CacheEntry<V>>>>;

/// Returns whether an entry created at `created_at` is older than `ttl` at `now`.
///
/// Shared by the read path and the sweep so both agree on what "expired" means.
pub fn is_expired(created_at: Instant, ttl: Duration, now: Instant) -> bool {
    now.saturating_duration_since(created_at) > ttl
}

/// Handle to a running sweep task
struct Sweeper {
    shutdown_tx: oneshot::Sender<()>,
}

/// In-memory cache whose entries expire after a fixed time-to-live
///
/// The map is shared with a background sweep task behind a single mutex. Reads
/// never return an entry older than the TTL, whether or not the sweep has
/// removed it yet. Must be constructed inside a tokio runtime.
pub struct TtlCache<V> {
    entries: EntryMap<V>,
    ttl: Duration,
    sweeper: Mutex<Option<Sweeper>>,
}

impl<V> std::fmt::Debug for TtlCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache")
            .field("entries", &self.entries.lock().len())
            .field("ttl", &self.ttl)
            .field("sweeping", &self.is_sweeping())
            .finish()
    }
}

impl<V: Clone + Send + 'static> TtlCache<V> {
    /// Creates an empty cache and starts its sweep task
    ///
    /// # Arguments
    /// * `ttl` - Maximum age of a valid entry, also used as the sweep interval
    ///
    /// # Returns
    /// * `Ok(TtlCache)` with the sweep running
    /// * `Err(CacheError::InvalidTtl)` if `ttl` is zero
    pub fn new(ttl: Duration) -> Result<Self, CacheError> {
        if ttl.is_zero() {
            return Err(CacheError::InvalidTtl);
        }

        let entries: EntryMap<V> = Arc::new(Mutex::new(HashMap::new()));
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        tokio::spawn(sweep_loop(Arc::clone(&entries), ttl, shutdown_rx));
        debug!(?ttl, "cache sweep started");

        Ok(Self {
            entries,
            ttl,
            sweeper: Mutex::new(Some(Sweeper { shutdown_tx })),
        })
    }

    /// Inserts or replaces the entry for `key`, resetting its creation time
    pub fn put(&self, key: impl Into<String>, value: V) {
        let key = key.into();
        trace!(%key, "cache put");
        self.entries.lock().insert(
            key,
            CacheEntry {
                created_at: Instant::now(),
                value,
            },
        );
    }

    /// Returns the value for `key` if it exists and has not expired
    ///
    /// A missing key and an expired key both yield `None`. Expired entries are
    /// left in place for the sweep to remove.
    pub fn get(&self, key: &str) -> Option<V> {
        let entries = self.entries.lock();
        let entry = entries.get(key)?;
        if is_expired(entry.created_at, self.ttl, Instant::now()) {
            return None;
        }
        Some(entry.value.clone())
    }
}

impl<V> TtlCache<V> {
    /// Halts the background sweep. Safe to call any number of times.
    ///
    /// Reads keep enforcing expiry after the sweep has stopped.
    pub fn stop(&self) {
        if let Some(sweeper) = self.sweeper.lock().take() {
            // The task may already be gone if the runtime shut down first
            let _ = sweeper.shutdown_tx.send(());
            debug!("cache sweep stopped");
        }
    }

    /// Whether the sweep task is still scheduled
    pub fn is_sweeping(&self) -> bool {
        self.sweeper.lock().is_some()
    }

    /// The configured time-to-live
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of entries physically stored, including expired ones not yet swept
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V> Drop for TtlCache<V> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Removes every expired entry, returning how many were deleted
fn sweep<V>(entries: &Mutex<HashMap<String, CacheEntry<V>>>, ttl: Duration, now: Instant) -> usize {
    let mut entries = entries.lock();
    let before = entries.len();
    entries.retain(|_, entry| !is_expired(entry.created_at, ttl, now));
    before - entries.len()
}

async fn sweep_loop<V>(entries: EntryMap<V>, ttl: Duration, mut shutdown_rx: oneshot::Receiver<()>) {
    let mut interval = tokio::time::interval(ttl);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // Skip the first tick (immediate)
    interval.tick().await;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let removed = sweep(&entries, ttl, Instant::now());
                if removed > 0 {
                    debug!(removed, "swept expired cache entries");
                }
            }
            // Resolves on an explicit stop and when the cache is dropped
            _ = &mut shutdown_rx => {
                break;
            }
        }
    }
}
