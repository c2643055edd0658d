//! The [`Engine`] facade shared by every service module.

use std::sync::Arc;

use calm_core::{
  clock::{Clock, SystemClock},
  source::SourcePolicy,
  store::NewsStore,
};
use chrono::{DateTime, TimeDelta, Utc};

use crate::{EngineSettings, registry::SourceRegistry};

/// Clustering, ranking and timeline services over one store.
///
/// The service operations live in the sibling modules as separate `impl`
/// blocks: [`crate::cluster`], [`crate::ranking`], [`crate::stories`] and
/// [`crate::timeline`].
pub struct Engine<S> {
  pub(crate) store:    Arc<S>,
  pub(crate) clock:    Arc<dyn Clock>,
  pub(crate) registry: SourceRegistry<S>,
  pub(crate) settings: EngineSettings,
}

impl<S: NewsStore> Engine<S> {
  pub fn new(
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    policy: SourcePolicy,
    settings: EngineSettings,
  ) -> Self {
    let ttl = i64::try_from(settings.credibility_cache_secs)
      .ok()
      .and_then(TimeDelta::try_seconds)
      .unwrap_or(TimeDelta::MAX);
    let registry = SourceRegistry::new(
      store.clone(),
      Arc::new(policy),
      clock.clone(),
      ttl,
      settings.credibility_cache_capacity,
    );
    Self {
      store,
      clock,
      registry,
      settings,
    }
  }

  /// An engine on the wall clock with the built-in source table.
  pub fn with_defaults(store: Arc<S>) -> Self {
    Self::new(
      store,
      Arc::new(SystemClock),
      SourcePolicy::builtin(),
      EngineSettings::default(),
    )
  }

  pub fn store(&self) -> &S { &self.store }

  pub fn registry(&self) -> &SourceRegistry<S> { &self.registry }

  pub fn settings(&self) -> &EngineSettings { &self.settings }

  pub fn policy(&self) -> &SourcePolicy { self.registry.policy() }
}

/// Start of a look-back window of `span` ending at `now`.
///
/// `None` (no lower bound) when the span is unrepresentable or reaches past
/// the earliest representable date.
pub(crate) fn window_start(now: DateTime<Utc>, span: Option<TimeDelta>) -> Option<DateTime<Utc>> {
  span.and_then(|span| now.checked_sub_signed(span))
}
