//! Keyed cache for server resources
//!
//! Read queries go through [`QueryCache::get_or_fetch`]: results are held
//! per [`QueryKey`] and considered fresh for the configured staleness
//! window (5 minutes by default). A stale entry is served immediately while
//! a background task revalidates it; concurrent reads for the same key
//! coalesce onto the single in-flight fetch. Mutations invalidate the keys
//! whose scope they touched, which forces the next read to hit the network
//! regardless of the staleness window.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use log::{debug, warn};
use reqwest::Client;
use serde_json::Value;
use tokio::sync::Mutex as AsyncMutex;

use crate::auth::TokenCell;
use crate::error::Error;
use crate::fetch::Fetch;

/// Identity of a cached server resource
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    /// The signed-in user's project list
    Projects,
    /// The signed-in user's active project
    ActiveProject,
    /// Member list of one project
    ProjectMembers(String),
    /// The signed-in user's role within one project
    UserRole(String),
    /// One sequence, keyed separately for anonymous and authenticated
    /// reads so a public view never masks the richer authenticated one,
    /// and for whether annotations were included so a bare fetch never
    /// masks an annotated one
    Sequence {
        gs_id: String,
        authenticated: bool,
        with_annotations: bool,
    },
    /// The signed-in user's profile
    CurrentUser,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    fetched_at: Instant,
    invalidated: bool,
}

/// Resource cache with per-key request coalescing
#[derive(Clone)]
pub struct QueryCache {
    entries: Arc<Mutex<HashMap<QueryKey, CacheEntry>>>,
    locks: Arc<Mutex<HashMap<QueryKey, Arc<AsyncMutex<()>>>>>,
    stale_after: Duration,
    read_retries: u32,
}

impl QueryCache {
    /// Create a cache with the given staleness window and read retry count
    pub fn new(stale_after: Duration, read_retries: u32) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            locks: Arc::new(Mutex::new(HashMap::new())),
            stale_after,
            read_retries,
        }
    }

    /// Read a resource through the cache.
    ///
    /// `fetcher` is called at most once per network attempt; it must build a
    /// fresh request future each call so transient failures can be retried.
    pub async fn get_or_fetch<F, Fut>(&self, key: QueryKey, fetcher: F) -> Result<Value, Error>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, Error>> + Send + 'static,
    {
        // One fetch in flight per key: a second concurrent reader parks
        // here and then observes the entry the first one wrote.
        let lock = self.key_lock(&key);
        let guard = lock.lock_owned().await;

        let entry = self.entries.lock().unwrap().get(&key).cloned();
        match entry {
            Some(entry) if !entry.invalidated && entry.fetched_at.elapsed() < self.stale_after => {
                Ok(entry.value)
            }
            Some(entry) if !entry.invalidated => {
                // Stale-while-revalidate: hand back the cached value now and
                // refresh in the background, keeping the key lock so readers
                // arriving mid-refresh still coalesce.
                let cache = self.clone();
                let bg_key = key.clone();
                tokio::spawn(async move {
                    let _guard = guard;
                    if let Err(err) = cache.refetch(&bg_key, &fetcher).await {
                        warn!("background revalidation of {:?} failed: {}", bg_key, err);
                    }
                });
                Ok(entry.value)
            }
            _ => {
                let value = self.fetch_with_retry(&fetcher).await?;
                self.insert_entry(key, value.clone());
                drop(guard);
                Ok(value)
            }
        }
    }

    /// Seed a cache entry with an already-fetched value
    pub fn prime(&self, key: QueryKey, value: Value) {
        self.insert_entry(key, value);
    }

    /// Current cached value for a key, ignoring freshness
    pub fn peek(&self, key: &QueryKey) -> Option<Value> {
        self.entries
            .lock()
            .unwrap()
            .get(key)
            .map(|entry| entry.value.clone())
    }

    /// Force the next read of `key` onto the network
    pub fn invalidate(&self, key: &QueryKey) {
        if let Some(entry) = self.entries.lock().unwrap().get_mut(key) {
            entry.invalidated = true;
        }
    }

    /// Invalidate the per-project keys scoped to `project_id`
    pub fn invalidate_project_scope(&self, project_id: &str) {
        self.invalidate(&QueryKey::ProjectMembers(project_id.to_string()));
        self.invalidate(&QueryKey::UserRole(project_id.to_string()));
    }

    /// Invalidate every cached variant of a sequence
    pub fn invalidate_sequence(&self, gs_id: &str) {
        for authenticated in [false, true] {
            for with_annotations in [false, true] {
                self.invalidate(&QueryKey::Sequence {
                    gs_id: gs_id.to_string(),
                    authenticated,
                    with_annotations,
                });
            }
        }
    }

    /// Drop every cached entry (sign-out path)
    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }

    fn key_lock(&self, key: &QueryKey) -> Arc<AsyncMutex<()>> {
        self.locks
            .lock()
            .unwrap()
            .entry(key.clone())
            .or_default()
            .clone()
    }

    fn insert_entry(&self, key: QueryKey, value: Value) {
        self.entries.lock().unwrap().insert(
            key,
            CacheEntry {
                value,
                fetched_at: Instant::now(),
                invalidated: false,
            },
        );
    }

    async fn refetch<F, Fut>(&self, key: &QueryKey, fetcher: &F) -> Result<(), Error>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<Value, Error>>,
    {
        // A failed refetch leaves the previous entry untouched.
        let value = self.fetch_with_retry(fetcher).await?;
        self.insert_entry(key.clone(), value);
        Ok(())
    }

    async fn fetch_with_retry<F, Fut>(&self, fetcher: &F) -> Result<Value, Error>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<Value, Error>>,
    {
        let mut attempt = 0;
        loop {
            match fetcher().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < self.read_retries => {
                    attempt += 1;
                    debug!("retrying read after transient error (attempt {}): {}", attempt, err);
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Bearer-authenticated cached GET returning the raw JSON value; the
/// shared read path for every cacheable resource.
pub(crate) async fn cached_get_json(
    cache: &QueryCache,
    http: &Client,
    token: &TokenCell,
    key: QueryKey,
    url: String,
) -> Result<Value, Error> {
    let http = http.clone();
    let token = token.clone();
    cache
        .get_or_fetch(key, move || {
            let http = http.clone();
            let token = token.clone();
            let url = url.clone();
            async move {
                Fetch::get(&http, &url)
                    .bearer_opt(token.get().as_deref())
                    .execute::<Value>()
                    .await
            }
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn prime_then_read_skips_the_fetcher() {
        let cache = QueryCache::new(Duration::from_secs(300), 2);
        cache.prime(QueryKey::Projects, json!([{"id": "p1"}]));

        let value = cache
            .get_or_fetch(QueryKey::Projects, || async {
                panic!("fresh entry must not refetch")
            })
            .await
            .unwrap();
        assert_eq!(value, json!([{"id": "p1"}]));
    }

    #[tokio::test]
    async fn invalidation_forces_a_fetch() {
        let cache = QueryCache::new(Duration::from_secs(300), 2);
        cache.prime(QueryKey::Projects, json!([]));
        cache.invalidate(&QueryKey::Projects);

        let value = cache
            .get_or_fetch(QueryKey::Projects, || async { Ok(json!([{"id": "p2"}])) })
            .await
            .unwrap();
        assert_eq!(value, json!([{"id": "p2"}]));
        // The successful fetch replaced the invalidated entry.
        assert_eq!(cache.peek(&QueryKey::Projects), Some(json!([{"id": "p2"}])));
    }

    #[tokio::test]
    async fn failed_fetch_does_not_poison_an_existing_entry() {
        let cache = QueryCache::new(Duration::from_secs(300), 0);
        cache.prime(QueryKey::CurrentUser, json!({"id": "u1"}));
        cache.invalidate(&QueryKey::CurrentUser);

        let result = cache
            .get_or_fetch(QueryKey::CurrentUser, || async {
                Err(Error::general("boom"))
            })
            .await;
        assert!(result.is_err());
        assert_eq!(cache.peek(&QueryKey::CurrentUser), Some(json!({"id": "u1"})));
    }

    #[tokio::test]
    async fn sequence_invalidation_covers_every_variant() {
        let cache = QueryCache::new(Duration::from_secs(300), 2);
        let keys = || {
            [false, true].into_iter().flat_map(|authenticated| {
                [false, true].into_iter().map(move |with_annotations| {
                    QueryKey::Sequence {
                        gs_id: "GS1".to_string(),
                        authenticated,
                        with_annotations,
                    }
                })
            })
        };

        for key in keys() {
            cache.prime(key, json!({"gs_id": "GS1"}));
        }
        cache.invalidate_sequence("GS1");

        for key in keys() {
            let value = cache
                .get_or_fetch(key, move || async move { Ok(json!({"refetched": true})) })
                .await
                .unwrap();
            assert_eq!(value, json!({"refetched": true}));
        }
    }
}
