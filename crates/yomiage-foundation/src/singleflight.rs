//! Keyed single-flight cache.
//!
//! Guarantees at most one concurrent initialization per logical key (for
//! example per conversation). The first caller for an absent key becomes the
//! initializer and runs the factory; every other concurrent caller for that
//! key waits, bounded, for the initializer's outcome instead of duplicating
//! the work.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::clock::SharedClock;

/// Bounded-wait settings for followers of an in-flight initialization.
///
/// Expressed as retry count x fixed interval rather than a wall-clock
/// deadline so waiting behavior stays deterministic under a virtual clock.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SingleFlightConfig {
    /// Interval between two polls of an `Initializing` entry
    pub poll_interval: Duration,
    /// Maximum number of polls before a follower gives up
    pub max_polls: u32,
}

impl Default for SingleFlightConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(300),
            max_polls: 10,
        }
    }
}

/// Errors surfaced by [`SingleFlightCache::load_or_create`]
#[derive(Debug, Error)]
pub enum SingleFlightError<E> {
    /// The entry was still initializing when the poll bound ran out
    #[error("initialization still pending after {polls} polls of {interval:?}")]
    InitializationTimeout { polls: u32, interval: Duration },

    /// The initialization this caller was waiting on failed; the caller
    /// aborts instead of becoming the new initializer
    #[error("waited-on initialization failed, aborting")]
    Aborted,

    /// This caller was the initializer and its factory failed
    #[error("initialization failed: {0}")]
    Init(E),
}

enum EntryState<V> {
    Initializing,
    Ready(V),
}

enum Claim<V> {
    Ready(V),
    Initializer,
    Follower,
}

/// Keyed cache enforcing the at-most-one-producer, bounded-wait contract.
///
/// Per key the entry moves `Absent -> Initializing -> Ready` on success, or
/// back to `Absent` on failure so a later caller may retry. A `Ready` entry
/// never re-enters `Initializing` while shared; use [`invalidate`] to drop it
/// first. Distinct keys are fully independent.
///
/// [`invalidate`]: SingleFlightCache::invalidate
pub struct SingleFlightCache<K, V> {
    entries: Mutex<HashMap<K, EntryState<V>>>,
    clock: SharedClock,
    config: SingleFlightConfig,
}

impl<K, V> SingleFlightCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(clock: SharedClock) -> Self {
        Self::with_config(clock, SingleFlightConfig::default())
    }

    pub fn with_config(clock: SharedClock, config: SingleFlightConfig) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
            config,
        }
    }

    /// Return the cached value for `key`, initializing it if necessary.
    ///
    /// The factory runs exactly once per initialization, no matter how many
    /// callers arrive concurrently; its error is propagated only to the
    /// initializer. Followers poll until the entry resolves, up to the
    /// configured bound.
    pub async fn load_or_create<F, Fut, E>(
        &self,
        key: K,
        factory: F,
    ) -> Result<V, SingleFlightError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        match self.claim(&key) {
            Claim::Ready(value) => Ok(value),
            Claim::Follower => self.wait_for(&key).await,
            Claim::Initializer => {
                // if this future is dropped before the factory settles, the
                // guard removes the Initializing entry so the key does not
                // stay claimed forever
                let mut guard = InitGuard {
                    entries: &self.entries,
                    key: Some(key),
                };
                match factory().await {
                    Ok(value) => {
                        if let Some(key) = guard.disarm() {
                            self.entries
                                .lock()
                                .insert(key, EntryState::Ready(value.clone()));
                        }
                        Ok(value)
                    }
                    Err(err) => {
                        // back to Absent so a later caller may retry
                        if let Some(key) = guard.disarm() {
                            self.entries.lock().remove(&key);
                        }
                        Err(SingleFlightError::Init(err))
                    }
                }
            }
        }
    }

    /// Drop a `Ready` entry so the next caller re-initializes.
    ///
    /// Returns whether an entry was removed. An `Initializing` entry is left
    /// alone; its initializer still owns the transition.
    pub fn invalidate(&self, key: &K) -> bool {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(EntryState::Ready(_)) => {
                entries.remove(key);
                true
            }
            _ => false,
        }
    }

    /// Number of keys currently `Initializing` or `Ready`
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Single atomic read-or-claim of the entry for `key`.
    fn claim(&self, key: &K) -> Claim<V> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(EntryState::Ready(value)) => Claim::Ready(value.clone()),
            Some(EntryState::Initializing) => Claim::Follower,
            None => {
                entries.insert(key.clone(), EntryState::Initializing);
                Claim::Initializer
            }
        }
    }

    /// Bounded poll loop for a key someone else is initializing.
    async fn wait_for<E>(&self, key: &K) -> Result<V, SingleFlightError<E>> {
        for poll in 0..self.config.max_polls {
            self.clock.sleep(self.config.poll_interval).await;
            match self.entries.lock().get(key) {
                Some(EntryState::Ready(value)) => return Ok(value.clone()),
                Some(EntryState::Initializing) => continue,
                // the initializer failed; never self-promote, that would
                // invite a thundering herd of re-initializations
                None => {
                    debug!(poll, "single-flight wait aborted, initializer failed");
                    return Err(SingleFlightError::Aborted);
                }
            }
        }
        debug!(
            polls = self.config.max_polls,
            "single-flight wait exhausted its poll bound"
        );
        Err(SingleFlightError::InitializationTimeout {
            polls: self.config.max_polls,
            interval: self.config.poll_interval,
        })
    }
}

/// Removes an `Initializing` entry if the initializer is dropped before it
/// settles, so a cancelled initialization never pins its key.
struct InitGuard<'a, K: Eq + Hash, V> {
    entries: &'a Mutex<HashMap<K, EntryState<V>>>,
    key: Option<K>,
}

impl<K: Eq + Hash, V> InitGuard<'_, K, V> {
    /// Take over the transition; the drop handler becomes a no-op
    fn disarm(&mut self) -> Option<K> {
        self.key.take()
    }
}

impl<K: Eq + Hash, V> Drop for InitGuard<'_, K, V> {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            let mut entries = self.entries.lock();
            if let Some(EntryState::Initializing) = entries.get(&key) {
                entries.remove(&key);
            }
        }
    }
}
