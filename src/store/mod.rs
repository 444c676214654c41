//! Shared resource store
//!
//! A single keyed cache between the pollers and the gateway: simultaneous
//! fetches for the same key coalesce into one request, and every view reads
//! the same snapshot through a per-key watch channel instead of holding its
//! own copy. Values are whole-payload replacements; the store never merges.

use crate::error::Result;
use dashmap::DashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

struct Entry<T> {
    tx: Arc<watch::Sender<Option<T>>>,
    /// Serializes fetches for this key so concurrent pollers coalesce.
    fetch_lock: Arc<Mutex<()>>,
    /// Bumped on every stored value; lets a waiter detect that the fetch it
    /// queued behind already produced a fresh snapshot.
    generation: Arc<AtomicU64>,
}

impl<T> Clone for Entry<T> {
    fn clone(&self) -> Self {
        Self {
            tx: Arc::clone(&self.tx),
            fetch_lock: Arc::clone(&self.fetch_lock),
            generation: Arc::clone(&self.generation),
        }
    }
}

impl<T> Default for Entry<T> {
    fn default() -> Self {
        let (tx, _) = watch::channel(None);
        Self {
            tx: Arc::new(tx),
            fetch_lock: Arc::new(Mutex::new(())),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }
}

/// Keyed store of one entity kind (portfolio, quotes, watchlist detail, ...).
pub struct ResourceStore<T> {
    entries: DashMap<String, Entry<T>>,
}

impl<T: Clone> ResourceStore<T> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    // Entry handles are cloned out so no map guard is held across an await.
    fn entry(&self, key: &str) -> Entry<T> {
        self.entries.entry(key.to_string()).or_default().clone()
    }

    /// Fetch through the cache. If another fetch for `key` is already in
    /// flight, wait for it and reuse its snapshot instead of issuing a
    /// duplicate request.
    pub async fn fetch_through<F, Fut>(&self, key: &str, fetch: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let entry = self.entry(key);
        let generation_before = entry.generation.load(Ordering::Acquire);

        let _guard = entry.fetch_lock.lock().await;

        // A concurrent fetch finished while we queued: its snapshot is at
        // least as fresh as ours would be.
        if entry.generation.load(Ordering::Acquire) > generation_before {
            if let Some(value) = entry.tx.borrow().clone() {
                return Ok(value);
            }
        }

        let value = fetch().await?;
        entry.generation.fetch_add(1, Ordering::Release);
        entry.tx.send_replace(Some(value.clone()));
        Ok(value)
    }

    /// Push a value directly (e.g. after a mutation's refetch).
    pub fn publish(&self, key: &str, value: T) {
        let entry = self.entry(key);
        entry.generation.fetch_add(1, Ordering::Release);
        entry.tx.send_replace(Some(value));
    }

    /// Latest snapshot for `key`, if any fetch has completed.
    pub fn get(&self, key: &str) -> Option<T> {
        self.entries
            .get(key)
            .and_then(|entry| entry.tx.borrow().clone())
    }

    /// Subscribe to snapshots for `key`.
    pub fn subscribe(&self, key: &str) -> watch::Receiver<Option<T>> {
        self.entry(key).tx.subscribe()
    }
}

impl<T: Clone> Default for ResourceStore<T> {
    fn default() -> Self {
        Self::new()
    }
}
