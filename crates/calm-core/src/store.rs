//! The `NewsStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `calm-store-sqlite`).
//! The engine services depend on this abstraction, not on any concrete
//! backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  article::{Article, NewArticle},
  source::Source,
  story::{Story, StorySource},
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// Sort order for [`NewsStore::find_stories`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoryOrder {
  /// `importance_score` desc, then `last_updated` desc, then id.
  #[default]
  Importance,
  /// `first_seen` desc, then id.
  Newest,
}

/// Parameters for [`NewsStore::find_stories`] and
/// [`NewsStore::count_stories`]. Unset fields do not filter.
#[derive(Debug, Clone, Default)]
pub struct StoryQuery {
  pub category:          Option<String>,
  pub mood:              Option<String>,
  /// Inclusive lower bound on `first_seen`.
  pub first_seen_from:   Option<DateTime<Utc>>,
  /// Exclusive upper bound on `first_seen`.
  pub first_seen_before: Option<DateTime<Utc>>,
  pub order:             StoryOrder,
  pub limit:             Option<usize>,
  pub offset:            Option<usize>,
}

/// One row of [`NewsStore::count_by_category`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
  pub category: String,
  pub stories:  u64,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Calm store backend.
///
/// Articles and story links are append-only. Sources only have their
/// counters bumped. Stories are updated with compare-and-swap on their
/// `version`, so concurrent writers never silently overwrite each other.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait NewsStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Articles ──────────────────────────────────────────────────────────

  /// Store an article keyed by URL and return the stored row.
  ///
  /// If the URL is already present the existing row is returned; when the
  /// content hash differs, the stored hash is replaced and `revision` bumped.
  fn record_article(
    &self,
    input: NewArticle,
  ) -> impl Future<Output = Result<Article, Self::Error>> + Send + '_;

  fn get_article(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Article>, Self::Error>> + Send + '_;

  // ── Sources ───────────────────────────────────────────────────────────

  /// Register a sighting of `first_sighting.name`.
  ///
  /// Inserts `first_sighting` if the name is new; otherwise bumps
  /// `last_seen_at` to `first_sighting.last_seen_at` and increments
  /// `total_articles`. Returns the stored row either way.
  fn touch_source(
    &self,
    first_sighting: Source,
  ) -> impl Future<Output = Result<Source, Self::Error>> + Send + '_;

  fn get_source<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Option<Source>, Self::Error>> + Send + 'a;

  // ── Stories ───────────────────────────────────────────────────────────

  /// Insert a new story together with its primary link, in one write.
  ///
  /// Returns `None` and writes nothing when the primary article is already
  /// linked to a story.
  fn insert_story(
    &self,
    story: Story,
    primary: StorySource,
  ) -> impl Future<Output = Result<Option<Story>, Self::Error>> + Send + '_;

  /// Retrieve a story by UUID. Returns `None` if not found.
  fn get_story(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Story>, Self::Error>> + Send + '_;

  /// Overwrite `story` if its stored version is still `expected_version`.
  ///
  /// Returns the written story (with `version` bumped) or `None` when the
  /// version moved on (or the story vanished); the caller decides whether to
  /// reload and retry.
  fn update_story(
    &self,
    story: Story,
    expected_version: u64,
  ) -> impl Future<Output = Result<Option<Story>, Self::Error>> + Send + '_;

  fn find_stories<'a>(
    &'a self,
    query: &'a StoryQuery,
  ) -> impl Future<Output = Result<Vec<Story>, Self::Error>> + Send + 'a;

  /// Number of stories matching `query`, ignoring `order`, `limit` and
  /// `offset`.
  fn count_stories<'a>(
    &'a self,
    query: &'a StoryQuery,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  /// Stories first seen at or after `since`, counted per category, largest
  /// first.
  fn count_by_category(
    &self,
    since: DateTime<Utc>,
  ) -> impl Future<Output = Result<Vec<CategoryCount>, Self::Error>> + Send + '_;

  // ── Story links ───────────────────────────────────────────────────────

  /// Insert a link. Returns `false` without writing when the story already
  /// has a link from the same source, or the article is already linked.
  fn link_source(
    &self,
    link: StorySource,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn link_for_article(
    &self,
    article_id: Uuid,
  ) -> impl Future<Output = Result<Option<StorySource>, Self::Error>> + Send + '_;

  /// All links of a story, primary first, then by `published_at`.
  fn story_sources(
    &self,
    story_id: Uuid,
  ) -> impl Future<Output = Result<Vec<StorySource>, Self::Error>> + Send + '_;
}
