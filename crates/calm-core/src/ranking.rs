//! The calm importance score.
//!
//! A weighted average of corroboration (source count), diversity, credibility
//! and capped recency. The weights sum to 1, so the score stays in `[0, 1]`.
//! The model has no click, view or like inputs at all.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::story::Story;

pub const SOURCE_WEIGHT: f64 = 0.30;
pub const DIVERSITY_WEIGHT: f64 = 0.25;
pub const CREDIBILITY_WEIGHT: f64 = 0.25;
pub const RECENCY_WEIGHT: f64 = 0.20;

/// Source count at which corroboration saturates.
pub const SOURCE_SATURATION: f64 = 10.0;
/// Age after which recency contributes nothing.
pub const RECENCY_HORIZON_HOURS: f64 = 24.0;
/// Multiplier for the score of a story that has only its primary source.
pub const PLACEHOLDER_FACTOR: f64 = 0.25;

// Explanation thresholds.
const WIDELY_COVERED: u32 = 5;
const MULTIPLE_SOURCES: u32 = 3;
const DIVERSE: f64 = 0.5;
const CREDIBLE: f64 = 0.8;
const BREAKING_HOURS: f64 = 6.0;

pub fn age_hours(first_seen: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
  (now - first_seen).num_milliseconds() as f64 / 3_600_000.0
}

/// 1 at age zero, falling linearly to 0 at the horizon and staying there.
pub fn recency_score(age_hours: f64) -> f64 {
  (1.0 - age_hours / RECENCY_HORIZON_HOURS).clamp(0.0, 1.0)
}

pub fn round3(x: f64) -> f64 { (x * 1000.0).round() / 1000.0 }

pub fn placeholder_score(credibility: f64) -> f64 { credibility * PLACEHOLDER_FACTOR }

/// The weighted terms of a story's score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
  pub sources:     f64,
  pub diversity:   f64,
  pub credibility: f64,
  pub recency:     f64,
}

impl ScoreBreakdown {
  pub fn of(story: &Story, now: DateTime<Utc>) -> Self {
    let source_score = (story.source_count as f64 / SOURCE_SATURATION).min(1.0);
    let recency = recency_score(age_hours(story.first_seen, now));

    Self {
      sources:     SOURCE_WEIGHT * source_score,
      diversity:   DIVERSITY_WEIGHT * story.source_diversity,
      credibility: CREDIBILITY_WEIGHT * story.average_credibility,
      recency:     RECENCY_WEIGHT * recency,
    }
  }

  pub fn total(&self) -> f64 {
    self.sources + self.diversity + self.credibility + self.recency
  }
}

/// The importance score of `story` at `now`, rounded to three decimals.
pub fn score(story: &Story, now: DateTime<Utc>) -> f64 {
  round3(ScoreBreakdown::of(story, now).total())
}

/// A transparency view of a story's score for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Explanation {
  pub story_id:   Uuid,
  pub score:      f64,
  pub components: ScoreBreakdown,
  pub age_hours:  f64,
  pub tags:       Vec<String>,
}

/// Break down the score of `story` and derive human-readable tags from the
/// same inputs.
pub fn explain(story: &Story, now: DateTime<Utc>) -> Explanation {
  let components = ScoreBreakdown::of(story, now);
  let age = age_hours(story.first_seen, now);
  let mut tags = Vec::new();

  if story.source_count >= WIDELY_COVERED {
    tags.push(format!("Widely covered ({} sources)", story.source_count));
  } else if story.source_count >= MULTIPLE_SOURCES {
    tags.push(format!("Multiple sources ({})", story.source_count));
  }
  if story.source_diversity >= DIVERSE {
    tags.push("Diverse perspectives".to_owned());
  }
  if story.average_credibility >= CREDIBLE {
    tags.push("Highly credible sources".to_owned());
  }
  if age < BREAKING_HOURS {
    tags.push("Breaking story".to_owned());
  } else if age < RECENCY_HORIZON_HOURS {
    tags.push("Recent".to_owned());
  }

  Explanation {
    story_id: story.story_id,
    score: round3(components.total()),
    components,
    age_hours: age,
    tags,
  }
}
