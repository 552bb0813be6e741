// source/cache.rs
// Time-to-live cache in front of a RecordSource, keyed by fetch parameters

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

use super::{RecordSource, SourceBatch};
use tokenflow_common::data::RawRecord;

struct CacheEntry {
    stored_at: Instant,
    records: Arc<Vec<RawRecord>>,
}

/// Shared map of key -> records with a fixed expiry. Entries older than
/// `ttl` are treated as absent and replaced on the next insert.
#[derive(Clone)]
pub struct TtlCache {
    ttl: Duration,
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

impl TtlCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn get(&self, key: &str) -> Option<Arc<Vec<RawRecord>>> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|e| e.stored_at.elapsed() < self.ttl)
            .map(|e| Arc::clone(&e.records))
    }

    pub async fn insert(&self, key: impl Into<String>, records: Vec<RawRecord>) {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.into(),
            CacheEntry {
                stored_at: Instant::now(),
                records: Arc::new(records),
            },
        );
    }

    pub async fn invalidate(&self, key: &str) -> bool {
        self.entries.write().await.remove(key).is_some()
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

/// Serves complete batches from the cache while fresh. Partial batches are
/// passed through and never stored, so a degraded fetch is retried next time.
pub struct CachedSource<S: RecordSource> {
    inner: S,
    cache: TtlCache,
}

impl<S: RecordSource> CachedSource<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self::with_cache(inner, TtlCache::new(ttl))
    }

    pub fn with_cache(inner: S, cache: TtlCache) -> Self {
        Self { inner, cache }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn cache(&self) -> &TtlCache {
        &self.cache
    }
}

#[async_trait]
impl<S: RecordSource> RecordSource for CachedSource<S> {
    fn cache_key(&self) -> String {
        self.inner.cache_key()
    }

    fn describe(&self) -> String {
        format!("{} (cached {}s)", self.inner.describe(), self.cache.ttl().as_secs())
    }

    async fn fetch(&self) -> SourceBatch {
        let key = self.inner.cache_key();
        if let Some(records) = self.cache.get(&key).await {
            debug!("Cache hit for {} ({} records)", key, records.len());
            return SourceBatch::complete(records.as_ref().clone());
        }

        debug!("Cache miss for {}", key);
        let batch = self.inner.fetch().await;
        if batch.status.is_complete() {
            self.cache.insert(key, batch.records.clone()).await;
        }
        batch
    }
}
