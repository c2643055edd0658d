//! Articles: the raw unit handed over by the ingestion pipeline.
//!
//! An article is immutable once stored. The only fields that move are the
//! delta-tracking pair (`content_hash`, `revision`), which record that the
//! upstream copy of the same URL changed after it was first ingested.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{Error, Result};

// ─── NewArticle ──────────────────────────────────────────────────────────────

/// A normalised article as supplied by the ingestion pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewArticle {
  pub title:        String,
  #[serde(default)]
  pub description:  String,
  #[serde(default)]
  pub content:      String,
  /// Unique key; two records with the same URL are the same article.
  pub url:          String,
  /// Outlet name, e.g. "Reuters".
  pub source:       String,
  pub published_at: DateTime<Utc>,
  pub category:     String,
}

impl NewArticle {
  /// Trim the identifying fields and reject records that cannot be clustered.
  ///
  /// Categories are compared by equality everywhere, so they are lower-cased
  /// here once.
  pub fn normalized(mut self) -> Result<Self> {
    self.title = self.title.trim().to_owned();
    self.url = self.url.trim().to_owned();
    self.source = self.source.trim().to_owned();
    self.category = self.category.trim().to_ascii_lowercase();

    if self.title.is_empty() {
      return Err(Error::InvalidArticle(format!("empty title for {:?}", self.url)));
    }
    if self.url.is_empty() {
      return Err(Error::InvalidArticle(format!("empty url for {:?}", self.title)));
    }
    if self.source.is_empty() {
      return Err(Error::InvalidArticle(format!("empty source for {:?}", self.url)));
    }
    if self.category.is_empty() {
      return Err(Error::InvalidArticle(format!("empty category for {:?}", self.url)));
    }
    Ok(self)
  }

  pub fn content_hash(&self) -> String {
    content_hash(&self.title, &self.description, &self.content)
  }

  /// Build the stored form. The id and `ingested_at` are assigned here; the
  /// store decides whether the URL already exists.
  pub fn into_article(self, ingested_at: DateTime<Utc>) -> Article {
    let content_hash = self.content_hash();
    Article {
      article_id: Uuid::new_v4(),
      title: self.title,
      description: self.description,
      content: self.content,
      url: self.url,
      source: self.source,
      published_at: self.published_at,
      category: self.category,
      ingested_at,
      content_hash,
      revision: 0,
    }
  }
}

// ─── Article ─────────────────────────────────────────────────────────────────

/// A stored article.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
  pub article_id:   Uuid,
  pub title:        String,
  pub description:  String,
  pub content:      String,
  pub url:          String,
  pub source:       String,
  pub published_at: DateTime<Utc>,
  pub category:     String,
  pub ingested_at:  DateTime<Utc>,
  /// Hex SHA-256 over title, description and content.
  pub content_hash: String,
  /// Number of times the upstream content changed after first ingestion.
  pub revision:     u32,
}

impl Article {
  /// Description and content joined, as compared by content similarity.
  pub fn body(&self) -> String {
    format!("{} {}", self.description, self.content)
  }
}

/// Stable digest of the mutable text of an article.
pub fn content_hash(title: &str, description: &str, content: &str) -> String {
  let mut hasher = Sha256::new();
  hasher.update(title.as_bytes());
  hasher.update([0x1f]);
  hasher.update(description.as_bytes());
  hasher.update([0x1f]);
  hasher.update(content.as_bytes());
  hex::encode(hasher.finalize())
}
