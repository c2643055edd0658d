//! Stories (clusters of articles from different outlets reporting the same
//! event) and the join rows linking articles into them.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  article::Article,
  source::{DiversityBucket, SourcePolicy},
};

// ─── ContentType ─────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::AsRefStr,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum ContentType {
  #[default]
  News,
  Analysis,
  Opinion,
}

// ─── Story ───────────────────────────────────────────────────────────────────

/// The clustering unit.
///
/// `source_count`, `source_diversity` and `average_credibility` are owned by
/// the clustering engine; `importance_score` is derived from them. `summary`,
/// `why_this_matters` and `mood` are filled later by enrichment and may be
/// empty at any point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Story {
  pub story_id:            Uuid,
  pub canonical_title:     String,
  pub summary:             Option<String>,
  pub why_this_matters:    Option<String>,
  pub category:            String,
  pub mood:                Option<String>,
  pub content_type:        ContentType,
  pub primary_source:      String,
  pub primary_url:         String,
  pub source_count:        u32,
  pub source_diversity:    f64,
  pub average_credibility: f64,
  pub importance_score:    f64,
  pub first_seen:          DateTime<Utc>,
  pub last_updated:        DateTime<Utc>,
  /// Optimistic-concurrency token; bumped by the store on every write.
  pub version:             u64,
}

impl Story {
  /// A new single-source story created from its primary article.
  ///
  /// Diversity starts at zero and the score is a credibility-only placeholder
  /// until a second source arrives or the next ranking refresh.
  pub fn from_primary(article: &Article, credibility: f64, now: DateTime<Utc>) -> Self {
    Self {
      story_id:            Uuid::new_v4(),
      canonical_title:     article.title.clone(),
      summary:             None,
      why_this_matters:    None,
      category:            article.category.clone(),
      mood:                None,
      content_type:        ContentType::default(),
      primary_source:      article.source.clone(),
      primary_url:         article.url.clone(),
      source_count:        1,
      source_diversity:    0.0,
      average_credibility: credibility,
      importance_score:    crate::ranking::placeholder_score(credibility),
      first_seen:          now,
      last_updated:        now,
      version:             0,
    }
  }

  /// Overwrite the enrichment fields that are present in `e`.
  pub fn apply_enrichment(&mut self, e: Enrichment) {
    if let Some(summary) = e.summary {
      self.summary = Some(summary);
    }
    if let Some(why) = e.why_this_matters {
      self.why_this_matters = Some(why);
    }
    if let Some(mood) = e.mood {
      self.mood = Some(mood);
    }
    if let Some(ct) = e.content_type {
      self.content_type = ct;
    }
  }
}

/// Annotations produced by the external enrichment service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Enrichment {
  pub summary:          Option<String>,
  pub why_this_matters: Option<String>,
  pub mood:             Option<String>,
  pub content_type:     Option<ContentType>,
}

// ─── StorySource ─────────────────────────────────────────────────────────────

/// One article's membership in a story. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorySource {
  pub story_id:          Uuid,
  pub article_id:        Uuid,
  pub source_name:       String,
  pub original_headline: String,
  pub url:               String,
  pub published_at:      DateTime<Utc>,
  /// Source credibility at link time.
  pub credibility_score: f64,
  /// True only for the article that created the story.
  pub is_primary:        bool,
  /// The match score that caused the link; 1.0 for primaries.
  pub similarity_score:  f64,
  pub linked_at:         DateTime<Utc>,
}

impl StorySource {
  pub fn primary(story_id: Uuid, article: &Article, credibility: f64, at: DateTime<Utc>) -> Self {
    Self::link(story_id, article, credibility, 1.0, true, at)
  }

  pub fn secondary(
    story_id: Uuid,
    article: &Article,
    credibility: f64,
    similarity: f64,
    at: DateTime<Utc>,
  ) -> Self {
    Self::link(story_id, article, credibility, similarity, false, at)
  }

  fn link(
    story_id: Uuid,
    article: &Article,
    credibility_score: f64,
    similarity_score: f64,
    is_primary: bool,
    linked_at: DateTime<Utc>,
  ) -> Self {
    Self {
      story_id,
      article_id: article.article_id,
      source_name: article.source.clone(),
      original_headline: article.title.clone(),
      url: article.url.clone(),
      published_at: article.published_at,
      credibility_score,
      is_primary,
      similarity_score,
      linked_at,
    }
  }
}

// ─── Aggregates ──────────────────────────────────────────────────────────────

/// The aggregate statistics a story carries, recomputed from its links.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoryStats {
  pub source_count:        u32,
  pub source_diversity:    f64,
  pub average_credibility: f64,
}

impl StoryStats {
  /// Re-scan every link of a story.
  pub fn from_links(links: &[StorySource], policy: &SourcePolicy) -> Self {
    let buckets: BTreeSet<DiversityBucket> = links
      .iter()
      .map(|l| policy.bucket_of(&l.source_name))
      .collect();

    let average_credibility = if links.is_empty() {
      0.0
    } else {
      links.iter().map(|l| l.credibility_score).sum::<f64>() / links.len() as f64
    };

    Self {
      source_count: links.len() as u32,
      source_diversity: source_diversity(buckets.len()),
      average_credibility,
    }
  }

  pub fn apply_to(self, story: &mut Story) {
    story.source_count = self.source_count;
    story.source_diversity = self.source_diversity;
    story.average_credibility = self.average_credibility;
  }
}

/// Fraction of the diversity buckets represented, capped at 1.
pub fn source_diversity(distinct_buckets: usize) -> f64 {
  (distinct_buckets as f64 / DiversityBucket::COUNT as f64).min(1.0)
}

/// A story together with its links, primary first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryDetail {
  pub story:   Story,
  pub sources: Vec<StorySource>,
}
