//! [`SqliteStore`]: the SQLite implementation of [`NewsStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use calm_core::{
  article::{Article, NewArticle},
  source::Source,
  store::{CategoryCount, NewsStore, StoryOrder, StoryQuery},
  story::{Story, StorySource},
};

use crate::{
  encode::{
    ARTICLE_COLUMNS, LINK_COLUMNS, RawArticle, RawSource, RawStory, RawStorySource,
    SOURCE_COLUMNS, STORY_COLUMNS, decode_count, encode_count, encode_dt, encode_uuid,
  },
  schema::SCHEMA,
  Result,
};

/// Filter shared by `find_stories` and `count_stories`. Unset parameters are
/// bound as NULL and disable their condition.
const STORY_FILTER: &str = "(?1 IS NULL OR category = ?1)
  AND (?2 IS NULL OR mood = ?2)
  AND (?3 IS NULL OR first_seen >= ?3)
  AND (?4 IS NULL OR first_seen < ?4)";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Calm news store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

/// Positional parameters for [`STORY_FILTER`].
fn filter_params(query: &StoryQuery) -> [Option<String>; 4] {
  [
    query.category.clone(),
    query.mood.clone(),
    query.first_seen_from.map(encode_dt),
    query.first_seen_before.map(encode_dt),
  ]
}

/// `INSERT OR IGNORE` one link; `false` when a uniqueness constraint
/// rejected it.
fn insert_link(conn: &rusqlite::Connection, link: &StorySource) -> rusqlite::Result<bool> {
  let inserted = conn.execute(
    &format!(
      "INSERT OR IGNORE INTO story_sources ({LINK_COLUMNS})
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
    ),
    rusqlite::params![
      encode_uuid(link.story_id),
      encode_uuid(link.article_id),
      link.source_name,
      link.original_headline,
      link.url,
      encode_dt(link.published_at),
      link.credibility_score,
      link.is_primary,
      link.similarity_score,
      encode_dt(link.linked_at),
    ],
  )?;
  Ok(inserted == 1)
}

fn order_clause(order: StoryOrder) -> &'static str {
  match order {
    StoryOrder::Importance => "importance_score DESC, last_updated DESC, story_id ASC",
    StoryOrder::Newest => "first_seen DESC, story_id ASC",
  }
}

// ─── NewsStore impl ──────────────────────────────────────────────────────────

impl NewsStore for SqliteStore {
  type Error = crate::Error;

  // ── Articles ──────────────────────────────────────────────────────────────

  async fn record_article(&self, input: NewArticle) -> Result<Article> {
    let incoming = input.normalized()?.into_article(Utc::now());

    let id_str        = encode_uuid(incoming.article_id);
    let url           = incoming.url.clone();
    let title         = incoming.title.clone();
    let description   = incoming.description.clone();
    let content       = incoming.content.clone();
    let source        = incoming.source.clone();
    let published_str = encode_dt(incoming.published_at);
    let category      = incoming.category.clone();
    let ingested_str  = encode_dt(incoming.ingested_at);
    let hash          = incoming.content_hash.clone();

    let (raw, revised): (RawArticle, bool) = self
      .conn
      .call(move |conn| {
        let select = format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE url = ?1");
        let existing = conn
          .query_row(&select, rusqlite::params![url], RawArticle::from_row)
          .optional()?;

        match existing {
          Some(row) if row.content_hash == hash => Ok((row, false)),
          Some(_) => {
            conn.execute(
              "UPDATE articles SET content_hash = ?2, revision = revision + 1 WHERE url = ?1",
              rusqlite::params![url, hash],
            )?;
            let row = conn.query_row(&select, rusqlite::params![url], RawArticle::from_row)?;
            Ok((row, true))
          }
          None => {
            conn.execute(
              "INSERT INTO articles (
                 article_id, url, title, description, content, source,
                 published_at, category, ingested_at, content_hash, revision
               ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 0)",
              rusqlite::params![
                id_str,
                url,
                title,
                description,
                content,
                source,
                published_str,
                category,
                ingested_str,
                hash,
              ],
            )?;
            let row = conn.query_row(&select, rusqlite::params![url], RawArticle::from_row)?;
            Ok((row, false))
          }
        }
      })
      .await?;

    let article = raw.into_article()?;
    if revised {
      tracing::debug!(url = %article.url, revision = article.revision, "article content changed");
    }
    Ok(article)
  }

  async fn get_article(&self, id: Uuid) -> Result<Option<Article>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawArticle> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE article_id = ?1"),
            rusqlite::params![id_str],
            RawArticle::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawArticle::into_article).transpose()
  }

  // ── Sources ───────────────────────────────────────────────────────────────

  async fn touch_source(&self, first_sighting: Source) -> Result<Source> {
    let name          = first_sighting.name.clone();
    let credibility   = first_sighting.credibility_score;
    let source_type   = first_sighting.source_type.to_string();
    let bias          = first_sighting.bias.clone();
    let affinity      = first_sighting.category_affinity.clone();
    let first_str     = encode_dt(first_sighting.first_seen_at);
    let last_str      = encode_dt(first_sighting.last_seen_at);
    let total         = encode_count(first_sighting.total_articles);

    let raw: RawSource = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO sources (
             name, credibility_score, source_type, bias, category_affinity,
             first_seen_at, last_seen_at, total_articles
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
           ON CONFLICT(name) DO UPDATE SET
             last_seen_at   = excluded.last_seen_at,
             total_articles = total_articles + 1",
          rusqlite::params![
            name, credibility, source_type, bias, affinity, first_str, last_str, total,
          ],
        )?;
        Ok(conn.query_row(
          &format!("SELECT {SOURCE_COLUMNS} FROM sources WHERE name = ?1"),
          rusqlite::params![name],
          RawSource::from_row,
        )?)
      })
      .await?;

    raw.into_source()
  }

  async fn get_source(&self, name: &str) -> Result<Option<Source>> {
    let name = name.to_owned();

    let raw: Option<RawSource> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {SOURCE_COLUMNS} FROM sources WHERE name = ?1"),
            rusqlite::params![name],
            RawSource::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawSource::into_source).transpose()
  }

  // ── Stories ───────────────────────────────────────────────────────────────

  async fn insert_story(&self, story: Story, primary: StorySource) -> Result<Option<Story>> {
    let s = story.clone();

    let inserted: bool = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          &format!(
            "INSERT INTO stories ({STORY_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)"
          ),
          rusqlite::params![
            encode_uuid(s.story_id),
            s.canonical_title,
            s.summary,
            s.why_this_matters,
            s.category,
            s.mood,
            s.content_type.to_string(),
            s.primary_source,
            s.primary_url,
            s.source_count,
            s.source_diversity,
            s.average_credibility,
            s.importance_score,
            encode_dt(s.first_seen),
            encode_dt(s.last_updated),
            encode_count(s.version),
          ],
        )?;
        let linked = insert_link(&tx, &primary)?;
        if linked {
          tx.commit()?;
        }
        Ok(linked)
      })
      .await?;

    Ok(inserted.then_some(story))
  }

  async fn get_story(&self, id: Uuid) -> Result<Option<Story>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawStory> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {STORY_COLUMNS} FROM stories WHERE story_id = ?1"),
            rusqlite::params![id_str],
            RawStory::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawStory::into_story).transpose()
  }

  async fn update_story(&self, story: Story, expected_version: u64) -> Result<Option<Story>> {
    let s = story.clone();

    let changed: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE stories SET
             canonical_title     = ?2,
             summary             = ?3,
             why_this_matters    = ?4,
             category            = ?5,
             mood                = ?6,
             content_type        = ?7,
             source_count        = ?8,
             source_diversity    = ?9,
             average_credibility = ?10,
             importance_score    = ?11,
             last_updated        = ?12,
             version             = version + 1
           WHERE story_id = ?1 AND version = ?13",
          rusqlite::params![
            encode_uuid(s.story_id),
            s.canonical_title,
            s.summary,
            s.why_this_matters,
            s.category,
            s.mood,
            s.content_type.to_string(),
            s.source_count,
            s.source_diversity,
            s.average_credibility,
            s.importance_score,
            encode_dt(s.last_updated),
            encode_count(expected_version),
          ],
        )?)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    Ok(Some(Story { version: expected_version + 1, ..story }))
  }

  async fn find_stories(&self, query: &StoryQuery) -> Result<Vec<Story>> {
    let params = filter_params(query);
    let order = order_clause(query.order);
    let limit_val = query.limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));
    let offset_val = i64::try_from(query.offset.unwrap_or(0)).unwrap_or(i64::MAX);

    let raws: Vec<RawStory> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {STORY_COLUMNS} FROM stories
           WHERE {STORY_FILTER}
           ORDER BY {order}
           LIMIT ?5 OFFSET ?6"
        );
        let [category, mood, from, before] = params;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params![category, mood, from, before, limit_val, offset_val],
            RawStory::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawStory::into_story).collect()
  }

  async fn count_stories(&self, query: &StoryQuery) -> Result<u64> {
    let params = filter_params(query);

    let count: i64 = self
      .conn
      .call(move |conn| {
        let [category, mood, from, before] = params;
        Ok(conn.query_row(
          &format!("SELECT COUNT(*) FROM stories WHERE {STORY_FILTER}"),
          rusqlite::params![category, mood, from, before],
          |r| r.get(0),
        )?)
      })
      .await?;

    Ok(decode_count(count))
  }

  async fn count_by_category(&self, since: DateTime<Utc>) -> Result<Vec<CategoryCount>> {
    let since_str = encode_dt(since);

    let rows: Vec<(String, i64)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT category, COUNT(*) AS n FROM stories
           WHERE first_seen >= ?1
           GROUP BY category
           ORDER BY n DESC, category ASC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![since_str], |r| Ok((r.get(0)?, r.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(
      rows
        .into_iter()
        .map(|(category, n)| CategoryCount { category, stories: decode_count(n) })
        .collect(),
    )
  }

  // ── Story links ───────────────────────────────────────────────────────────

  async fn link_source(&self, link: StorySource) -> Result<bool> {
    let inserted = self
      .conn
      .call(move |conn| Ok(insert_link(conn, &link)?))
      .await?;

    Ok(inserted)
  }

  async fn link_for_article(&self, article_id: Uuid) -> Result<Option<StorySource>> {
    let id_str = encode_uuid(article_id);

    let raw: Option<RawStorySource> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {LINK_COLUMNS} FROM story_sources WHERE article_id = ?1"),
            rusqlite::params![id_str],
            RawStorySource::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawStorySource::into_link).transpose()
  }

  async fn story_sources(&self, story_id: Uuid) -> Result<Vec<StorySource>> {
    let id_str = encode_uuid(story_id);

    let raws: Vec<RawStorySource> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {LINK_COLUMNS} FROM story_sources
           WHERE story_id = ?1
           ORDER BY is_primary DESC, published_at ASC, source_name ASC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawStorySource::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawStorySource::into_link).collect()
  }
}
