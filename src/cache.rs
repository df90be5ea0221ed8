//! Bounded response cache with pending-fetch de-duplication.
//!
//! Keys are `{lang}:{headword}`. Completed responses are kept up to a fixed
//! capacity and evicted oldest-first; concurrent lookups of a key that is
//! already being fetched await the same in-flight future instead of issuing
//! a second fetch. Failed fetches are not cached.
//!
//! Dropping a caller's future cancels its interest only: the shared fetch
//! keeps going while any other caller still awaits it.

use futures::future::{BoxFuture, FutureExt, Shared};
use indexmap::IndexMap;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::lang::Lang;

pub const DEFAULT_CAPACITY: usize = 300;

/// Cache key for a headword lookup.
pub fn entry_key(lang: Lang, headword: &str) -> String {
    format!("{}:{}", lang.code(), headword.trim())
}

/// Time source for entry expiry.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Which entry goes when the cache is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Eviction {
    /// Oldest write goes first; reads do not refresh.
    #[default]
    InsertionOrder,
    /// Reads move an entry to the back.
    LeastRecentlyUsed,
}

struct Stored<V> {
    value: V,
    stored_at: Instant,
}

type PendingFetch<V, E> = Shared<BoxFuture<'static, Result<V, E>>>;

pub struct ResponseCache<V, E> {
    capacity: usize,
    eviction: Eviction,
    ttl: Option<Duration>,
    clock: Arc<dyn Clock>,
    entries: Mutex<IndexMap<String, Stored<V>>>,
    pending: Mutex<FxHashMap<String, PendingFetch<V, E>>>,
}

impl<V, E> fmt::Debug for ResponseCache<V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseCache")
            .field("capacity", &self.capacity)
            .field("eviction", &self.eviction)
            .field("ttl", &self.ttl)
            .field("len", &self.entries.lock().len())
            .finish()
    }
}

pub struct ResponseCacheBuilder {
    capacity: usize,
    eviction: Eviction,
    ttl: Option<Duration>,
    clock: Arc<dyn Clock>,
}

impl ResponseCacheBuilder {
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn eviction(mut self, eviction: Eviction) -> Self {
        self.eviction = eviction;
        self
    }

    /// Entries older than `ttl` are treated as absent. No expiry by default.
    pub fn time_to_live(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn build<V, E>(self) -> ResponseCache<V, E> {
        ResponseCache {
            capacity: self.capacity.max(1),
            eviction: self.eviction,
            ttl: self.ttl,
            clock: self.clock,
            entries: Mutex::new(IndexMap::new()),
            pending: Mutex::new(FxHashMap::default()),
        }
    }
}

impl<V, E> ResponseCache<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub fn builder() -> ResponseCacheBuilder {
        ResponseCacheBuilder {
            capacity: DEFAULT_CAPACITY,
            eviction: Eviction::default(),
            ttl: None,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let mut entries = self.entries.lock();
        let index = entries.get_index_of(key)?;

        let expired = match (self.ttl, entries.get_index(index)) {
            (Some(ttl), Some((_, stored))) => now.saturating_duration_since(stored.stored_at) >= ttl,
            _ => false,
        };
        if expired {
            entries.shift_remove_index(index);
            return None;
        }

        if self.eviction == Eviction::LeastRecentlyUsed {
            let (k, stored) = entries.shift_remove_index(index)?;
            let value = stored.value.clone();
            entries.insert(k, stored);
            return Some(value);
        }
        entries.get_index(index).map(|(_, stored)| stored.value.clone())
    }

    /// Store `value`, moving an existing key to the back.
    pub fn insert(&self, key: impl Into<String>, value: V) {
        let key = key.into();
        let stored = Stored { value, stored_at: self.clock.now() };
        let mut entries = self.entries.lock();
        entries.shift_remove(&key);
        entries.insert(key, stored);
        while entries.len() > self.capacity {
            if let Some((evicted, _)) = entries.shift_remove_index(0) {
                tracing::debug!(key = %evicted, "response cache eviction");
            }
        }
    }

    pub fn invalidate(&self, key: &str) {
        self.entries.lock().shift_remove(key);
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Cached value for `key`, or the result of `fetch`.
    ///
    /// Callers arriving while a fetch for `key` is in flight share its
    /// result; `fetch` is not invoked for them.
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        if let Some(value) = self.get(key) {
            tracing::debug!(key, "response cache hit");
            return Ok(value);
        }

        let shared = {
            let mut pending = self.pending.lock();
            if let Some(in_flight) = pending.get(key) {
                tracing::debug!(key, "joining in-flight fetch");
                in_flight.clone()
            } else if let Some(value) = self.get(key) {
                // Stored by a fetch that finished after the first check.
                return Ok(value);
            } else {
                let fut = fetch().boxed().shared();
                pending.insert(key.to_string(), fut.clone());
                fut
            }
        };

        let result = shared.clone().await;

        // The first caller to finish records the result, then clears the
        // pending slot; a later caller finds one or the other.
        let mut pending = self.pending.lock();
        if pending.get(key).is_some_and(|p| p.ptr_eq(&shared)) {
            if let Ok(value) = &result {
                self.insert(key, value.clone());
            }
            pending.remove(key);
        }
        drop(pending);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct ManualClock(Mutex<Instant>);

    impl ManualClock {
        fn new() -> Arc<Self> {
            Arc::new(Self(Mutex::new(Instant::now())))
        }

        fn advance(&self, by: Duration) {
            *self.0.lock() += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            *self.0.lock()
        }
    }

    fn cache(capacity: usize) -> ResponseCache<String, String> {
        ResponseCache::<String, String>::builder().capacity(capacity).build()
    }

    #[test]
    fn test_insertion_order_eviction() {
        let cache = cache(2);
        cache.insert("a:一", "1".to_string());
        cache.insert("a:二", "2".to_string());
        // Reads do not refresh under insertion order.
        assert_eq!(cache.get("a:一").as_deref(), Some("1"));
        cache.insert("a:三", "3".to_string());

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a:一"), None);
        assert_eq!(cache.get("a:二").as_deref(), Some("2"));
        assert_eq!(cache.get("a:三").as_deref(), Some("3"));
    }

    #[test]
    fn test_rewrite_moves_key_to_back() {
        let cache = cache(2);
        cache.insert("a:一", "1".to_string());
        cache.insert("a:二", "2".to_string());
        cache.insert("a:一", "1b".to_string());
        cache.insert("a:三", "3".to_string());

        assert_eq!(cache.get("a:二"), None);
        assert_eq!(cache.get("a:一").as_deref(), Some("1b"));
    }

    #[test]
    fn test_lru_eviction() {
        let cache: ResponseCache<String, String> =
            ResponseCache::<String, String>::builder().capacity(2).eviction(Eviction::LeastRecentlyUsed).build();
        cache.insert("a:一", "1".to_string());
        cache.insert("a:二", "2".to_string());
        assert!(cache.get("a:一").is_some());
        cache.insert("a:三", "3".to_string());

        assert_eq!(cache.get("a:二"), None);
        assert!(cache.get("a:一").is_some());
    }

    #[test]
    fn test_ttl_with_injected_clock() {
        let clock = ManualClock::new();
        let cache: ResponseCache<String, String> = ResponseCache::<String, String>::builder()
            .time_to_live(Duration::from_secs(60))
            .clock(clock.clone())
            .build();
        cache.insert("t:食", "tsia̍h".to_string());

        clock.advance(Duration::from_secs(59));
        assert!(cache.get("t:食").is_some());
        clock.advance(Duration::from_secs(1));
        assert_eq!(cache.get("t:食"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_entry_key() {
        assert_eq!(entry_key(Lang::Taiwanese, " 食 "), "t:食");
        assert_eq!(entry_key(Lang::Mandarin, "萌"), "a:萌");
    }

    #[tokio::test]
    async fn test_concurrent_fetches_are_deduplicated() {
        let cache = cache(DEFAULT_CAPACITY);
        let calls = Arc::new(AtomicUsize::new(0));

        let fetch = |calls: Arc<AtomicUsize>| {
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::task::yield_now().await;
                tokio::task::yield_now().await;
                Ok::<_, String>("萌".to_string())
            }
        };

        let (a, b) = tokio::join!(
            cache.get_or_fetch("a:萌", fetch(calls.clone())),
            cache.get_or_fetch("a:萌", fetch(calls.clone())),
        );

        assert_eq!(a.unwrap(), "萌");
        assert_eq!(b.unwrap(), "萌");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.get("a:萌").as_deref(), Some("萌"));
        assert!(cache.pending.lock().is_empty());

        // Served from the cache afterwards.
        let c = cache.get_or_fetch("a:萌", fetch(calls.clone())).await;
        assert_eq!(c.unwrap(), "萌");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dropped_first_caller_does_not_strand_waiters() {
        let cache = cache(DEFAULT_CAPACITY);
        let calls = Arc::new(AtomicUsize::new(0));
        let (release, gate) = tokio::sync::oneshot::channel::<()>();

        let first = {
            let calls = calls.clone();
            cache.get_or_fetch("a:萌", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                let _ = gate.await;
                Ok::<_, String>("萌".to_string())
            })
        };
        let mut first = Box::pin(first);
        assert!(futures::poll!(first.as_mut()).is_pending());
        drop(first);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.pending.lock().len(), 1);

        let second = cache.get_or_fetch("a:萌", || async { Err::<String, _>("refetched".to_string()) });
        release.send(()).unwrap();
        assert_eq!(second.await.as_deref(), Ok("萌"));

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.pending.lock().is_empty());
        assert_eq!(cache.get("a:萌").as_deref(), Some("萌"));
    }

    #[tokio::test]
    async fn test_finished_fetch_is_visible_before_pending_clears() {
        let cache = cache(DEFAULT_CAPACITY);
        let calls = Arc::new(AtomicUsize::new(0));

        let fetch = |calls: Arc<AtomicUsize>| {
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::task::yield_now().await;
                Ok::<_, String>("食".to_string())
            }
        };

        // The third caller starts only after the first two resolved; it must
        // find the stored entry rather than an empty pending map and a miss.
        let (a, b) = tokio::join!(
            cache.get_or_fetch("t:食", fetch(calls.clone())),
            cache.get_or_fetch("t:食", fetch(calls.clone())),
        );
        assert_eq!(a.as_deref(), Ok("食"));
        assert_eq!(b.as_deref(), Ok("食"));
        assert!(cache.pending.lock().is_empty());

        let c = cache.get_or_fetch("t:食", fetch(calls.clone())).await;
        assert_eq!(c.as_deref(), Ok("食"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let cache = cache(DEFAULT_CAPACITY);
        let failed = cache.get_or_fetch("a:萌", || async { Err::<String, _>("offline".to_string()) }).await;
        assert_eq!(failed, Err("offline".to_string()));
        assert!(cache.is_empty());

        let ok = cache.get_or_fetch("a:萌", || async { Ok::<_, String>("萌".to_string()) }).await;
        assert_eq!(ok.as_deref(), Ok("萌"));
    }
}
