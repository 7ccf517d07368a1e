//! Keyed, time-windowed response cache with in-flight request sharing
//!
//! Each cache key holds the most recent successful payload together with its
//! capture timestamp. A payload younger than the freshness window is served
//! directly; anything else runs the caller-supplied fetch. While a fetch for a
//! key is pending, concurrent non-forced callers await the same shared future
//! instead of issuing duplicate network requests.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use thiserror::Error;
use tracing::debug;

/// Errors surfaced by [`ResponseCache::fetch`]
///
/// The cache never retries and never swallows a failure; the underlying error
/// message is carried through so callers can decide on retry/messaging policy.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    /// The underlying fetch operation failed; the cache entry was left as-is
    #[error("fetch failed: {0}")]
    Fetch(String),
}

/// The stored (payload, timestamp) pair for one cache key
#[derive(Debug, Clone)]
struct CacheEntry<T> {
    /// The last successfully fetched payload
    payload: T,
    /// When the payload was stored
    captured_at: DateTime<Utc>,
}

/// Read-only view of a cache entry, including freshness metadata
///
/// Returned by [`ResponseCache::snapshot`] so callers can show last-known-good
/// data (with its age) after a failed refresh.
#[derive(Debug, Clone)]
pub struct CachedSnapshot<T> {
    /// The cached payload
    pub payload: T,
    /// When the payload was stored
    pub captured_at: DateTime<Utc>,
    /// Whether the entry has aged past the freshness window
    pub is_stale: bool,
}

type SharedFetch<T> = Shared<BoxFuture<'static, Result<T, CacheError>>>;

/// Per-key cache slot
struct Slot<T> {
    entry: Option<CacheEntry<T>>,
    /// Pending fetch shared by concurrent callers, if any
    in_flight: Option<SharedFetch<T>>,
    /// Token of the most recently started fetch. Bumped by every new fetch and
    /// by invalidation; a completion whose token is no longer current must not
    /// write the entry, so a slow stale response cannot clobber newer data.
    latest_fetch: u64,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self {
            entry: None,
            in_flight: None,
            latest_fetch: 0,
        }
    }
}

struct CacheState<T> {
    slots: HashMap<String, Slot<T>>,
}

/// In-memory response cache keyed by resource-key strings
///
/// Construct one instance per payload type at application start and hand
/// clones to every consumer; clones share the same underlying state. Keys
/// encode the resource and its parameters (e.g. `detections:recent:50`) so a
/// single cache serves all variants of a resource.
pub struct ResponseCache<T> {
    freshness_window: Duration,
    state: Arc<Mutex<CacheState<T>>>,
}

impl<T> Clone for ResponseCache<T> {
    fn clone(&self) -> Self {
        Self {
            freshness_window: self.freshness_window,
            state: Arc::clone(&self.state),
        }
    }
}

impl<T> fmt::Debug for ResponseCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseCache")
            .field("freshness_window", &self.freshness_window)
            .finish_non_exhaustive()
    }
}

fn lock_state<T>(state: &Mutex<CacheState<T>>) -> MutexGuard<'_, CacheState<T>> {
    // A panic while holding the lock leaves plain data behind; keep serving it.
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T> ResponseCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Creates a cache whose entries are served without refetching for
    /// `freshness_window` after capture
    pub fn new(freshness_window: StdDuration) -> Self {
        Self {
            freshness_window: Duration::from_std(freshness_window).unwrap_or(Duration::MAX),
            state: Arc::new(Mutex::new(CacheState {
                slots: HashMap::new(),
            })),
        }
    }

    /// Returns the payload for `key`, fetching it if needed
    ///
    /// # Arguments
    /// * `key` - Resource key (resource type plus parameters)
    /// * `force_refresh` - When true, bypasses the cache unconditionally
    /// * `fetch_fn` - Produces the fetch future; invoked only on a miss
    ///
    /// # Behavior
    /// - Fresh entry and `force_refresh == false`: returns the stored payload
    ///   without invoking `fetch_fn`.
    /// - Miss or stale entry: invokes `fetch_fn` once; concurrent non-forced
    ///   callers for the same key await that same pending fetch.
    /// - `force_refresh == true`: always invokes `fetch_fn`; the new fetch
    ///   supersedes any pending one, whose late result is then discarded.
    /// - On success the entry is replaced wholesale with a fresh timestamp.
    ///   On failure the entry (if any) is left unmodified and the error is
    ///   returned; use [`snapshot`](Self::snapshot) to fall back to stale data.
    pub async fn fetch<F, Fut, E>(
        &self,
        key: &str,
        force_refresh: bool,
        fetch_fn: F,
    ) -> Result<T, CacheError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: fmt::Display + Send + 'static,
    {
        let pending = {
            let mut state = lock_state(&self.state);
            let window = self.freshness_window;
            let slot = state.slots.entry(key.to_string()).or_default();

            if !force_refresh {
                if let Some(entry) = &slot.entry {
                    if Utc::now().signed_duration_since(entry.captured_at) < window {
                        return Ok(entry.payload.clone());
                    }
                }
                if let Some(pending) = &slot.in_flight {
                    debug!(key = %key, "joining in-flight fetch");
                    pending.clone()
                } else {
                    Self::begin_fetch(&self.state, slot, key, fetch_fn)
                }
            } else {
                Self::begin_fetch(&self.state, slot, key, fetch_fn)
            }
        };

        pending.await
    }

    /// Starts a fetch for `key` and registers it as the slot's pending fetch
    fn begin_fetch<F, Fut, E>(
        state: &Arc<Mutex<CacheState<T>>>,
        slot: &mut Slot<T>,
        key: &str,
        fetch_fn: F,
    ) -> SharedFetch<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: fmt::Display + Send + 'static,
    {
        slot.latest_fetch += 1;
        let token = slot.latest_fetch;
        let state = Arc::clone(state);
        let key = key.to_string();
        let fut = fetch_fn();

        let shared = async move {
            match fut.await {
                Ok(payload) => {
                    let mut guard = lock_state(&state);
                    if let Some(slot) = guard.slots.get_mut(&key) {
                        if slot.latest_fetch == token {
                            slot.entry = Some(CacheEntry {
                                payload: payload.clone(),
                                captured_at: Utc::now(),
                            });
                            slot.in_flight = None;
                        } else {
                            debug!(key = %key, "discarding superseded fetch result");
                        }
                    }
                    Ok(payload)
                }
                Err(err) => {
                    let mut guard = lock_state(&state);
                    if let Some(slot) = guard.slots.get_mut(&key) {
                        if slot.latest_fetch == token {
                            slot.in_flight = None;
                        }
                    }
                    Err(CacheError::Fetch(err.to_string()))
                }
            }
        }
        .boxed()
        .shared();

        slot.in_flight = Some(shared.clone());
        shared
    }

    /// Returns the stored entry for `key` regardless of freshness
    ///
    /// Returns `None` if no successful fetch has been stored for the key.
    pub fn snapshot(&self, key: &str) -> Option<CachedSnapshot<T>> {
        let state = lock_state(&self.state);
        let entry = state.slots.get(key)?.entry.as_ref()?;
        let is_stale =
            Utc::now().signed_duration_since(entry.captured_at) >= self.freshness_window;
        Some(CachedSnapshot {
            payload: entry.payload.clone(),
            captured_at: entry.captured_at,
            is_stale,
        })
    }

    /// Clears the entry for `key`; the next non-forced fetch misses
    ///
    /// Idempotent. Any fetch in flight for the key is superseded: its result
    /// is still delivered to callers already awaiting it, but it does not
    /// repopulate the cleared entry.
    pub fn invalidate(&self, key: &str) {
        let mut state = lock_state(&self.state);
        if let Some(slot) = state.slots.get_mut(key) {
            slot.entry = None;
            slot.in_flight = None;
            slot.latest_fetch += 1;
        }
    }

    /// Clears every entry in the cache
    pub fn invalidate_all(&self) {
        let mut state = lock_state(&self.state);
        for slot in state.slots.values_mut() {
            slot.entry = None;
            slot.in_flight = None;
            slot.latest_fetch += 1;
        }
    }
}

impl<R> ResponseCache<Vec<R>>
where
    R: Clone + Send + 'static,
{
    /// Prepends `item` to the cached sequence for `key`
    ///
    /// Used by real-time flows that observe an event locally before the
    /// backend reflects it: the mutated payload is restamped as current, so
    /// the immediately following non-forced fetch serves it without a network
    /// call. A later forced refresh reconciles with the server. On an empty
    /// slot a single-element entry is created.
    pub fn append(&self, key: &str, item: R) {
        let mut state = lock_state(&self.state);
        let slot = state.slots.entry(key.to_string()).or_default();
        match &mut slot.entry {
            Some(entry) => {
                entry.payload.insert(0, item);
                entry.captured_at = Utc::now();
            }
            None => {
                slot.entry = Some(CacheEntry {
                    payload: vec![item],
                    captured_at: Utc::now(),
                });
            }
        }
    }
}
