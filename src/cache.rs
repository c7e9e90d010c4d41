//! In-memory expiring key-value cache
//!
//! Values cross the cache boundary as JSON text: `set` serializes whatever it is
//! given and `get` hands back a [`serde_json::Value`]. Turning that back into a
//! domain type is the caller's job.

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::{NomadError, Result};

/// Interval between background sweeps unless configured otherwise
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug)]
struct CacheEntry {
    value: String,
    expires_at: Instant,
}

struct Sweeper {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// Snapshot of cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

/// Shared expiring cache. Construct once and pass around as `Arc<ExpiringCache>`.
pub struct ExpiringCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    sweep_interval: Duration,
    sweeper: Mutex<Option<Sweeper>>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl Default for ExpiringCache {
    fn default() -> Self {
        Self::new(DEFAULT_SWEEP_INTERVAL)
    }
}

impl ExpiringCache {
    #[must_use]
    pub fn new(sweep_interval: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            sweep_interval,
            sweeper: Mutex::new(None),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Retrieves a value if it exists and has not expired.
    /// An expired entry is evicted on the way out.
    #[tracing::instrument(name = "query_cache", level = "debug", skip(self))]
    pub fn get(&self, key: &str) -> Option<Value> {
        let raw = {
            let now = Instant::now();
            let mut entries = self.entries.lock();
            match entries.get(key).map(|entry| now < entry.expires_at) {
                Some(true) => entries.get(key).map(|entry| entry.value.clone()),
                Some(false) => {
                    entries.remove(key);
                    self.evictions.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!("Key found but expired");
                    None
                }
                None => None,
            }
        };

        let Some(raw) = raw else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        };

        self.hits.fetch_add(1, Ordering::Relaxed);
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                // Text we wrote ourselves, so this only happens on a bug
                tracing::error!("Error deserializing cache value for {}: {}", key, err);
                Some(Value::String(raw))
            }
        }
    }

    /// Stores a serializable value with a time-to-live, replacing any previous entry.
    #[tracing::instrument(name = "put_cache", level = "debug", skip(self, value))]
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Duration) -> Result<()> {
        let value = serde_json::to_string(value).map_err(|err| {
            tracing::error!("Error serializing cache value for {}: {}", key, err);
            NomadError::cache(format!("Failed to serialize value for {key}: {err}"))
        })?;
        let expires_at = Instant::now()
            .checked_add(ttl)
            .ok_or_else(|| NomadError::cache("TTL overflow"))?;

        self.entries
            .lock()
            .insert(key.to_string(), CacheEntry { value, expires_at });
        Ok(())
    }

    /// Manually removes a key from the cache.
    pub fn delete(&self, key: &str) {
        self.entries.lock().remove(key);
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    /// One sweep pass. Returns how many expired entries were evicted.
    pub fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let removed = {
            let mut entries = self.entries.lock();
            let before = entries.len();
            entries.retain(|_, entry| entry.expires_at > now);
            before - entries.len()
        };

        if removed > 0 {
            self.evictions.fetch_add(removed as u64, Ordering::Relaxed);
            tracing::debug!("Removed {} expired cache entries", removed);
        }
        removed
    }

    /// Starts the background sweeper. Returns `false` if it is already running.
    pub fn start(self: &Arc<Self>) -> bool {
        let mut sweeper = self.sweeper.lock();
        if sweeper.is_some() {
            return false;
        }

        let (shutdown, mut shutdown_rx) = oneshot::channel();
        let cache = Arc::downgrade(self);
        let period = self.sweep_interval;

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {
                        let Some(cache) = cache.upgrade() else { break };
                        cache.sweep_expired();
                    }
                }
            }
            tracing::debug!("Cache sweeper stopped");
        });

        *sweeper = Some(Sweeper { shutdown, task });
        tracing::info!("Cache sweeper started with interval {:?}", period);
        true
    }

    #[must_use]
    pub fn is_sweeping(&self) -> bool {
        self.sweeper.lock().is_some()
    }

    /// Stops the background sweeper and waits for it to exit.
    pub async fn stop(&self) {
        let Some(Sweeper { shutdown, task }) = self.sweeper.lock().take() else {
            return;
        };
        // receiver gone means the task already finished
        let _ = shutdown.send(());
        if let Err(err) = task.await {
            tracing::error!("Cache sweeper ended abnormally: {}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let cache = ExpiringCache::default();
        cache.set("k", &"v", Duration::from_secs(1)).unwrap();
        assert_eq!(cache.get("k"), Some(json!("v")));

        tokio::time::advance(Duration::from_millis(1001)).await;
        assert_eq!(cache.get("k"), None);
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_is_gone_exactly_at_expiry() {
        let cache = ExpiringCache::default();
        cache.set("k", &1, Duration::from_secs(5)).unwrap();
        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn test_overwrite_keeps_latest_value() {
        let cache = ExpiringCache::default();
        cache.set("k", &"first", Duration::from_secs(60)).unwrap();
        cache.set("k", &"second", Duration::from_secs(60)).unwrap();
        assert_eq!(cache.get("k"), Some(json!("second")));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_values_come_back_as_plain_json() {
        #[derive(Serialize)]
        struct Offer {
            airline: String,
            price: f64,
        }

        let cache = ExpiringCache::default();
        let offers = vec![Offer {
            airline: "SQ".into(),
            price: 420.5,
        }];
        cache.set("flights", &offers, Duration::from_secs(60)).unwrap();

        assert_eq!(
            cache.get("flights"),
            Some(json!([{ "airline": "SQ", "price": 420.5 }]))
        );
    }

    #[test]
    fn test_delete_and_clear() {
        let cache = ExpiringCache::default();
        cache.set("a", &1, Duration::from_secs(60)).unwrap();
        cache.set("b", &2, Duration::from_secs(60)).unwrap();

        cache.delete("a");
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), Some(json!(2)));

        cache.clear();
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_does_not_recount_lazily_evicted_entries() {
        let cache = ExpiringCache::default();
        cache.set("lazy", &1, Duration::from_secs(1)).unwrap();
        cache.set("swept", &2, Duration::from_secs(1)).unwrap();
        cache.set("fresh", &3, Duration::from_secs(600)).unwrap();

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.get("lazy"), None);

        assert_eq!(cache.sweep_expired(), 1);
        assert_eq!(cache.sweep_expired(), 0);
        assert_eq!(cache.stats().evictions, 2);
        assert_eq!(cache.get("fresh"), Some(json!(3)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_sweeper_evicts_and_stops() {
        let cache = Arc::new(ExpiringCache::new(Duration::from_secs(60)));
        cache.set("k", &"v", Duration::from_secs(10)).unwrap();

        assert!(cache.start());
        assert!(!cache.start());
        assert!(cache.is_sweeping());

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert!(cache.is_empty());

        cache.stop().await;
        assert!(!cache.is_sweeping());
        // stopping twice is harmless
        cache.stop().await;
    }

    #[test]
    fn test_stats_track_hits_and_misses() {
        let cache = ExpiringCache::default();
        cache.set("k", &true, Duration::from_secs(60)).unwrap();
        let _ = cache.get("k");
        let _ = cache.get("missing");

        let stats = cache.stats();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }
}
