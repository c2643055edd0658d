//! Source registry: outlet metadata and credibility lookups.

use std::{num::NonZeroUsize, sync::Arc};

use calm_core::{
  cache::TtlCache,
  clock::Clock,
  source::{Source, SourcePolicy},
  store::NewsStore,
};
use chrono::TimeDelta;

use crate::{Error, Result};

/// Resolves outlet names to their stored [`Source`] rows and credibility.
///
/// Credibility comes from the policy table when the outlet is known there;
/// otherwise from the stored row (memoised for the cache TTL, for a bounded
/// number of outlets), and finally from the policy default.
pub struct SourceRegistry<S> {
  store:  Arc<S>,
  policy: Arc<SourcePolicy>,
  clock:  Arc<dyn Clock>,
  cache:  TtlCache<String, f64>,
}

impl<S: NewsStore> SourceRegistry<S> {
  pub fn new(
    store: Arc<S>,
    policy: Arc<SourcePolicy>,
    clock: Arc<dyn Clock>,
    cache_ttl: TimeDelta,
    cache_capacity: usize,
  ) -> Self {
    let capacity = NonZeroUsize::new(cache_capacity).unwrap_or(NonZeroUsize::MIN);
    let cache = TtlCache::new(capacity, cache_ttl, clock.clone());
    Self {
      store,
      policy,
      clock,
      cache,
    }
  }

  pub fn policy(&self) -> &SourcePolicy { &self.policy }

  /// Record a sighting of `name`, creating its row from the policy profile
  /// the first time the outlet is seen.
  pub async fn get_or_create(&self, name: &str) -> Result<Source> {
    let sighting = Source::first_sighting(name, &self.policy, self.clock.now());
    let source = self
      .store
      .touch_source(sighting)
      .await
      .map_err(Error::store)?;

    if source.total_articles == 1 {
      tracing::debug!(
        source = %source.name,
        source_type = %source.source_type,
        credibility = source.credibility_score,
        "registered new source"
      );
    }
    self
      .cache
      .insert(source.name.clone(), source.credibility_score);
    Ok(source)
  }

  pub async fn get_credibility(&self, name: &str) -> Result<f64> {
    if let Some(known) = self.policy.lookup(name) {
      return Ok(known.credibility);
    }

    let key = name.to_owned();
    if let Some(credibility) = self.cache.get(&key) {
      return Ok(credibility);
    }

    let credibility = match self.store.get_source(name).await.map_err(Error::store)? {
      Some(source) => source.credibility_score,
      None => self.policy.default.credibility,
    };
    self.cache.insert(key, credibility);
    Ok(credibility)
  }
}
