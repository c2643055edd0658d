//! Tunables for the engine services. Every field has a serde default so a
//! config file only needs to name what it changes.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
  pub cluster:                    ClusterSettings,
  pub ranking:                    RankingSettings,
  /// How long store-backed credibility lookups are memoised.
  pub credibility_cache_secs:     u64,
  /// Most outlets whose credibility is memoised at once.
  pub credibility_cache_capacity: usize,
}

impl Default for EngineSettings {
  fn default() -> Self {
    Self {
      cluster:                    ClusterSettings::default(),
      ranking:                    RankingSettings::default(),
      credibility_cache_secs:     600,
      credibility_cache_capacity: 1024,
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterSettings {
  /// A candidate must score strictly above this title similarity to match.
  pub similarity_threshold:   f64,
  /// Only stories first seen this recently are match candidates.
  pub candidate_window_hours: i64,
  /// Optimistic write attempts before a story update gives up.
  pub max_write_attempts:     u32,
}

impl Default for ClusterSettings {
  fn default() -> Self {
    Self {
      similarity_threshold:   0.65,
      candidate_window_hours: 48,
      max_write_attempts:     5,
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingSettings {
  /// Stories older than this are neither refreshed nor listed by default.
  pub max_age_hours:     u32,
  /// Score drift below which a refresh does not write.
  pub min_score_delta:   f64,
  pub default_page_size: usize,
  pub max_page_size:     usize,
}

impl Default for RankingSettings {
  fn default() -> Self {
    Self {
      max_age_hours:     72,
      min_score_delta:   0.01,
      default_page_size: 20,
      max_page_size:     100,
    }
  }
}
