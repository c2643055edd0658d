//! Context timelines: the earlier stories a reader needs to follow this one.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  similarity::{jaccard, significant_words},
  story::Story,
};

/// Related stories must share more than this fraction of title words.
pub const MIN_RELEVANCE: f64 = 0.3;
pub const MAX_ENTRIES: usize = 5;
pub const DEFAULT_LOOKBACK_DAYS: u32 = 30;

/// How a related story sits in time relative to the current one.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Relationship {
  Precedes,
  Follows,
  Related,
}

pub fn relationship(current: &Story, related: &Story) -> Relationship {
  match related.first_seen.cmp(&current.first_seen) {
    Ordering::Less => Relationship::Precedes,
    Ordering::Greater => Relationship::Follows,
    Ordering::Equal => Relationship::Related,
  }
}

/// Shared-word overlap between two headlines (Jaccard over significant words).
pub fn title_relevance(a: &str, b: &str) -> f64 {
  jaccard(&significant_words(a), &significant_words(b))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEntry {
  pub story_id:         Uuid,
  pub title:            String,
  pub first_seen:       DateTime<Utc>,
  pub source_count:     u32,
  pub importance_score: f64,
  pub relevance:        f64,
  pub relationship:     Relationship,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timeline {
  pub story_id:      Uuid,
  pub category:      String,
  pub lookback_days: u32,
  /// The most recent related stories, newest first.
  pub entries:       Vec<TimelineEntry>,
  /// Every related story found, before truncation.
  pub total_related: usize,
}

/// Build the timeline of `current` from the stories found in its lookback
/// window.
///
/// Candidates from other categories, the story itself, and anything not
/// strictly earlier are discarded here as well, so callers may pass a loose
/// candidate set.
pub fn assemble(current: &Story, candidates: Vec<Story>, lookback_days: u32) -> Timeline {
  let current_words = significant_words(&current.canonical_title);

  let mut related: Vec<TimelineEntry> = candidates
    .into_iter()
    .filter(|c| c.story_id != current.story_id)
    .filter(|c| c.category == current.category)
    .filter(|c| c.first_seen < current.first_seen)
    .filter_map(|c| {
      let relevance = jaccard(&current_words, &significant_words(&c.canonical_title));
      if relevance <= MIN_RELEVANCE {
        return None;
      }
      Some(TimelineEntry {
        story_id: c.story_id,
        relationship: relationship(current, &c),
        title: c.canonical_title,
        first_seen: c.first_seen,
        source_count: c.source_count,
        importance_score: c.importance_score,
        relevance,
      })
    })
    .collect();

  related.sort_by(|a, b| {
    b.first_seen
      .cmp(&a.first_seen)
      .then_with(|| a.story_id.cmp(&b.story_id))
  });

  let total_related = related.len();
  related.truncate(MAX_ENTRIES);

  Timeline {
    story_id: current.story_id,
    category: current.category.clone(),
    lookback_days,
    entries: related,
    total_related,
  }
}
