// In-memory ResultCache backend — a Mutex<HashMap> cache used for tests and
// for running the detector with no filesystem dependency. Not named in
// spec.md; a natural supplement alongside SqliteResultCache (SPEC_FULL §9).

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::model::CascadeResult;

use super::ResultCache;

struct Entry {
    result: CascadeResult,
    expires_at: Instant,
}

pub struct InMemoryResultCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl InMemoryResultCache {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryResultCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResultCache for InMemoryResultCache {
    async fn lookup(&self, key: &str) -> Option<CascadeResult> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.result.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    async fn store(&self, key: &str, result: &CascadeResult, ttl: Duration) {
        let mut entries = self.entries.lock().await;
        entries.insert(
            key.to_string(),
            Entry {
                result: result.clone(),
                expires_at: Instant::now() + ttl,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CascadeResult {
        CascadeResult::empty()
    }

    #[tokio::test]
    async fn miss_then_hit() {
        let cache = InMemoryResultCache::new();
        assert!(cache.lookup("k").await.is_none());
        cache.store("k", &sample(), Duration::from_secs(60)).await;
        assert!(cache.lookup("k").await.is_some());
    }

    #[tokio::test]
    async fn expired_entry_is_a_miss() {
        let cache = InMemoryResultCache::new();
        cache
            .store("k", &sample(), Duration::from_millis(1))
            .await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(cache.lookup("k").await.is_none());
    }
}
