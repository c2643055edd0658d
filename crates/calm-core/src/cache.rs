//! A small bounded, time-limited cache driven by an injected [`Clock`].

use std::{hash::Hash, num::NonZeroUsize, sync::Arc, sync::Mutex};

use chrono::{DateTime, TimeDelta, Utc};
use lru::LruCache;

use crate::clock::Clock;

/// Entries expire `ttl` after insertion and are dropped when next read. At
/// most `capacity` entries are held; inserting past that evicts the least
/// recently used one.
pub struct TtlCache<K: Hash + Eq, V> {
  ttl:     TimeDelta,
  clock:   Arc<dyn Clock>,
  entries: Mutex<LruCache<K, (V, DateTime<Utc>)>>,
}

impl<K, V> TtlCache<K, V>
where
  K: Eq + Hash,
  V: Clone,
{
  pub fn new(capacity: NonZeroUsize, ttl: TimeDelta, clock: Arc<dyn Clock>) -> Self {
    Self {
      ttl,
      clock,
      entries: Mutex::new(LruCache::new(capacity)),
    }
  }

  pub fn get(&self, key: &K) -> Option<V> {
    let now = self.clock.now();
    let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
    match entries.get(key) {
      Some((value, expires_at)) if *expires_at > now => Some(value.clone()),
      Some(_) => {
        entries.pop(key);
        None
      }
      None => None,
    }
  }

  pub fn insert(&self, key: K, value: V) {
    let expires_at = self
      .clock
      .now()
      .checked_add_signed(self.ttl)
      .unwrap_or(DateTime::<Utc>::MAX_UTC);
    self
      .entries
      .lock()
      .unwrap_or_else(|e| e.into_inner())
      .put(key, (value, expires_at));
  }

  pub fn len(&self) -> usize { self.entries.lock().unwrap_or_else(|e| e.into_inner()).len() }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}
