//! TTL-bound status cache
//!
//! Advisory snapshot cache keyed by task id: written through on every store
//! mutation, read through on status queries. The durable store remains the
//! only source of truth; losing or expiring an entry only costs a store read.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::types::{TaskId, TaskSnapshot};

#[derive(Clone)]
struct CacheEntry {
    snapshot: TaskSnapshot,
    expires_at: Instant,
}

/// In-process TTL cache of task snapshots
#[derive(Clone)]
pub struct StatusCache {
    ttl: Duration,
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

impl StatusCache {
    /// Create a cache whose entries expire after `ttl`
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Store a snapshot, resetting its TTL deadline
    pub async fn put(&self, snapshot: TaskSnapshot) {
        let entry = CacheEntry {
            expires_at: Instant::now() + self.ttl,
            snapshot,
        };
        let mut entries = self.entries.write().await;
        entries.insert(entry.snapshot.task_id.as_str().to_string(), entry);
    }

    /// Get a snapshot if present and not expired
    pub async fn get(&self, task_id: &TaskId) -> Option<TaskSnapshot> {
        let entries = self.entries.read().await;
        let entry = entries.get(task_id.as_str())?;
        if entry.expires_at <= Instant::now() {
            return None;
        }
        Some(entry.snapshot.clone())
    }

    /// Drop a single entry
    pub async fn invalidate(&self, task_id: &TaskId) {
        let mut entries = self.entries.write().await;
        entries.remove(task_id.as_str());
    }

    /// Drop all expired entries, returning how many were removed
    pub async fn remove_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }

    /// Number of entries currently held, expired or not
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the cache holds no entries
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
