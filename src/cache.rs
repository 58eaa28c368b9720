//! Keyed read-through TTL store with per-key single-flight.

use crate::datasource::DataSourceError;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

type SharedFetch<V> = Shared<BoxFuture<'static, Result<V, DataSourceError>>>;

struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

struct Inner<V> {
    ttl: Duration,
    entries: Mutex<HashMap<String, Entry<V>>>,
    inflight: Mutex<HashMap<String, SharedFetch<V>>>,
}

/// Time-based read-through cache.
///
/// A fresh entry is served in preference to a refetch; on a miss the fetcher
/// runs under per-key single-flight: concurrent callers for the same expired
/// or missing key share one fetch and observe the same resolved value or
/// error. The shared fetch keeps running while any caller still awaits it,
/// so followers can cancel independently without aborting the leader's work.
///
/// Errors are never stored; the next caller after a failed fetch starts a
/// new one. Entries older than twice the TTL are pruned on every miss.
pub struct TtlCache<V> {
    inner: Arc<Inner<V>>,
}

impl<V> Clone for TtlCache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V: Clone + Send + Sync + 'static> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                ttl,
                entries: Mutex::new(HashMap::new()),
                inflight: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Return the cached value for `key` if fresh, otherwise run `fetch`
    /// (at most once across concurrent callers) and store the result.
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, fetch: F) -> Result<V, DataSourceError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, DataSourceError>> + Send + 'static,
    {
        if let Some(hit) = self.inner.fresh_value(key) {
            return Ok(hit);
        }
        self.inner.prune();

        let shared = {
            let mut inflight = self.inner.inflight.lock().unwrap();
            // A concurrent fetch may have landed between the freshness check
            // and taking this lock.
            if let Some(hit) = self.inner.fresh_value(key) {
                return Ok(hit);
            }

            match inflight.get(key) {
                Some(existing) => existing.clone(),
                None => {
                    let inner = Arc::clone(&self.inner);
                    let owned_key = key.to_string();
                    let fut = fetch();
                    let shared: SharedFetch<V> = async move {
                        let result = fut.await;
                        if let Ok(value) = &result {
                            inner.store(&owned_key, value.clone());
                        }
                        inner.inflight.lock().unwrap().remove(&owned_key);
                        result
                    }
                    .boxed()
                    .shared();
                    inflight.insert(key.to_string(), shared.clone());
                    shared
                }
            }
        };

        shared.await
    }

    /// Drop the entry for `key`, if any.
    pub fn invalidate(&self, key: &str) {
        self.inner.entries.lock().unwrap().remove(key);
    }

    /// Drop every entry whose key starts with `prefix`.
    pub fn invalidate_prefix(&self, prefix: &str) {
        self.inner
            .entries
            .lock()
            .unwrap()
            .retain(|key, _| !key.starts_with(prefix));
    }

    #[cfg(test)]
    fn entry_count(&self) -> usize {
        self.inner.entries.lock().unwrap().len()
    }
}

impl<V: Clone> Inner<V> {
    fn fresh_value(&self, key: &str) -> Option<V> {
        let entries = self.entries.lock().unwrap();
        entries.get(key).and_then(|entry| {
            if entry.inserted_at.elapsed() < self.ttl {
                Some(entry.value.clone())
            } else {
                None
            }
        })
    }

    fn store(&self, key: &str, value: V) {
        self.entries.lock().unwrap().insert(
            key.to_string(),
            Entry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    fn prune(&self) {
        let horizon = self.ttl * 2;
        self.entries
            .lock()
            .unwrap()
            .retain(|_, entry| entry.inserted_at.elapsed() < horizon);
    }
}
