//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings (microsecond
//! precision, `Z` suffix) so that lexical order equals chronological order.
//! UUIDs are stored as hyphenated lowercase strings; enums by their string
//! names.

use chrono::{DateTime, SecondsFormat, Utc};
use calm_core::{
  article::Article,
  source::{Source, SourceType},
  story::{ContentType, Story, StorySource},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Enums ───────────────────────────────────────────────────────────────────

pub fn decode_source_type(s: &str) -> Result<SourceType> {
  s.parse().map_err(|_| Error::UnknownDiscriminant {
    kind:  "source type",
    value: s.to_owned(),
  })
}

pub fn decode_content_type(s: &str) -> Result<ContentType> {
  s.parse().map_err(|_| Error::UnknownDiscriminant {
    kind:  "content type",
    value: s.to_owned(),
  })
}

// ─── Counters ────────────────────────────────────────────────────────────────

// SQLite integers are signed; counters never approach the limit.
pub fn encode_count(n: u64) -> i64 { n as i64 }

pub fn decode_count(n: i64) -> u64 { n.max(0) as u64 }

// ─── Articles ────────────────────────────────────────────────────────────────

pub const ARTICLE_COLUMNS: &str = "article_id, url, title, description, content, source,
  published_at, category, ingested_at, content_hash, revision";

/// Raw values read directly from an `articles` row.
pub struct RawArticle {
  pub article_id:   String,
  pub url:          String,
  pub title:        String,
  pub description:  String,
  pub content:      String,
  pub source:       String,
  pub published_at: String,
  pub category:     String,
  pub ingested_at:  String,
  pub content_hash: String,
  pub revision:     i64,
}

impl RawArticle {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      article_id:   row.get(0)?,
      url:          row.get(1)?,
      title:        row.get(2)?,
      description:  row.get(3)?,
      content:      row.get(4)?,
      source:       row.get(5)?,
      published_at: row.get(6)?,
      category:     row.get(7)?,
      ingested_at:  row.get(8)?,
      content_hash: row.get(9)?,
      revision:     row.get(10)?,
    })
  }

  pub fn into_article(self) -> Result<Article> {
    Ok(Article {
      article_id:   decode_uuid(&self.article_id)?,
      title:        self.title,
      description:  self.description,
      content:      self.content,
      url:          self.url,
      source:       self.source,
      published_at: decode_dt(&self.published_at)?,
      category:     self.category,
      ingested_at:  decode_dt(&self.ingested_at)?,
      content_hash: self.content_hash,
      revision:     self.revision.max(0) as u32,
    })
  }
}

// ─── Sources ─────────────────────────────────────────────────────────────────

pub const SOURCE_COLUMNS: &str = "name, credibility_score, source_type, bias,
  category_affinity, first_seen_at, last_seen_at, total_articles";

pub struct RawSource {
  pub name:              String,
  pub credibility_score: f64,
  pub source_type:       String,
  pub bias:              String,
  pub category_affinity: Option<String>,
  pub first_seen_at:     String,
  pub last_seen_at:      String,
  pub total_articles:    i64,
}

impl RawSource {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      name:              row.get(0)?,
      credibility_score: row.get(1)?,
      source_type:       row.get(2)?,
      bias:              row.get(3)?,
      category_affinity: row.get(4)?,
      first_seen_at:     row.get(5)?,
      last_seen_at:      row.get(6)?,
      total_articles:    row.get(7)?,
    })
  }

  pub fn into_source(self) -> Result<Source> {
    Ok(Source {
      name:              self.name,
      credibility_score: self.credibility_score,
      source_type:       decode_source_type(&self.source_type)?,
      bias:              self.bias,
      category_affinity: self.category_affinity,
      first_seen_at:     decode_dt(&self.first_seen_at)?,
      last_seen_at:      decode_dt(&self.last_seen_at)?,
      total_articles:    decode_count(self.total_articles),
    })
  }
}

// ─── Stories ─────────────────────────────────────────────────────────────────

pub const STORY_COLUMNS: &str = "story_id, canonical_title, summary, why_this_matters,
  category, mood, content_type, primary_source, primary_url, source_count,
  source_diversity, average_credibility, importance_score, first_seen,
  last_updated, version";

pub struct RawStory {
  pub story_id:            String,
  pub canonical_title:     String,
  pub summary:             Option<String>,
  pub why_this_matters:    Option<String>,
  pub category:            String,
  pub mood:                Option<String>,
  pub content_type:        String,
  pub primary_source:      String,
  pub primary_url:         String,
  pub source_count:        i64,
  pub source_diversity:    f64,
  pub average_credibility: f64,
  pub importance_score:    f64,
  pub first_seen:          String,
  pub last_updated:        String,
  pub version:             i64,
}

impl RawStory {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      story_id:            row.get(0)?,
      canonical_title:     row.get(1)?,
      summary:             row.get(2)?,
      why_this_matters:    row.get(3)?,
      category:            row.get(4)?,
      mood:                row.get(5)?,
      content_type:        row.get(6)?,
      primary_source:      row.get(7)?,
      primary_url:         row.get(8)?,
      source_count:        row.get(9)?,
      source_diversity:    row.get(10)?,
      average_credibility: row.get(11)?,
      importance_score:    row.get(12)?,
      first_seen:          row.get(13)?,
      last_updated:        row.get(14)?,
      version:             row.get(15)?,
    })
  }

  pub fn into_story(self) -> Result<Story> {
    Ok(Story {
      story_id:            decode_uuid(&self.story_id)?,
      canonical_title:     self.canonical_title,
      summary:             self.summary,
      why_this_matters:    self.why_this_matters,
      category:            self.category,
      mood:                self.mood,
      content_type:        decode_content_type(&self.content_type)?,
      primary_source:      self.primary_source,
      primary_url:         self.primary_url,
      source_count:        self.source_count.max(0) as u32,
      source_diversity:    self.source_diversity,
      average_credibility: self.average_credibility,
      importance_score:    self.importance_score,
      first_seen:          decode_dt(&self.first_seen)?,
      last_updated:        decode_dt(&self.last_updated)?,
      version:             decode_count(self.version),
    })
  }
}

// ─── Story links ─────────────────────────────────────────────────────────────

pub const LINK_COLUMNS: &str = "story_id, article_id, source_name, original_headline,
  url, published_at, credibility_score, is_primary, similarity_score, linked_at";

pub struct RawStorySource {
  pub story_id:          String,
  pub article_id:        String,
  pub source_name:       String,
  pub original_headline: String,
  pub url:               String,
  pub published_at:      String,
  pub credibility_score: f64,
  pub is_primary:        bool,
  pub similarity_score:  f64,
  pub linked_at:         String,
}

impl RawStorySource {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      story_id:          row.get(0)?,
      article_id:        row.get(1)?,
      source_name:       row.get(2)?,
      original_headline: row.get(3)?,
      url:               row.get(4)?,
      published_at:      row.get(5)?,
      credibility_score: row.get(6)?,
      is_primary:        row.get(7)?,
      similarity_score:  row.get(8)?,
      linked_at:         row.get(9)?,
    })
  }

  pub fn into_link(self) -> Result<StorySource> {
    Ok(StorySource {
      story_id:          decode_uuid(&self.story_id)?,
      article_id:        decode_uuid(&self.article_id)?,
      source_name:       self.source_name,
      original_headline: self.original_headline,
      url:               self.url,
      published_at:      decode_dt(&self.published_at)?,
      credibility_score: self.credibility_score,
      is_primary:        self.is_primary,
      similarity_score:  self.similarity_score,
      linked_at:         decode_dt(&self.linked_at)?,
    })
  }
}
