//! SQL schema for the Calm SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS articles (
    article_id    TEXT PRIMARY KEY,
    url           TEXT NOT NULL UNIQUE,
    title         TEXT NOT NULL,
    description   TEXT NOT NULL DEFAULT '',
    content       TEXT NOT NULL DEFAULT '',
    source        TEXT NOT NULL,
    published_at  TEXT NOT NULL,
    category      TEXT NOT NULL,
    ingested_at   TEXT NOT NULL,
    content_hash  TEXT NOT NULL,
    revision      INTEGER NOT NULL DEFAULT 0
);

-- Append-only reference data; only the counters move.
CREATE TABLE IF NOT EXISTS sources (
    name              TEXT PRIMARY KEY,
    credibility_score REAL NOT NULL,
    source_type       TEXT NOT NULL,   -- 'wire' | 'public' | 'cable' | ...
    bias              TEXT NOT NULL,
    category_affinity TEXT,
    first_seen_at     TEXT NOT NULL,
    last_seen_at      TEXT NOT NULL,
    total_articles    INTEGER NOT NULL DEFAULT 1
);

-- Every write bumps `version`; updates are compare-and-swap on it.
CREATE TABLE IF NOT EXISTS stories (
    story_id            TEXT PRIMARY KEY,
    canonical_title     TEXT NOT NULL,
    summary             TEXT,
    why_this_matters    TEXT,
    category            TEXT NOT NULL,
    mood                TEXT,
    content_type        TEXT NOT NULL DEFAULT 'NEWS',
    primary_source      TEXT NOT NULL,
    primary_url         TEXT NOT NULL,
    source_count        INTEGER NOT NULL,
    source_diversity    REAL NOT NULL,
    average_credibility REAL NOT NULL,
    importance_score    REAL NOT NULL,
    first_seen          TEXT NOT NULL,   -- fixed-width RFC 3339 UTC
    last_updated        TEXT NOT NULL,
    version             INTEGER NOT NULL DEFAULT 0
);

-- Immutable once written. One row per (story, outlet); one story per article.
CREATE TABLE IF NOT EXISTS story_sources (
    story_id          TEXT NOT NULL REFERENCES stories(story_id),
    article_id        TEXT NOT NULL REFERENCES articles(article_id),
    source_name       TEXT NOT NULL,
    original_headline TEXT NOT NULL,
    url               TEXT NOT NULL,
    published_at      TEXT NOT NULL,
    credibility_score REAL NOT NULL,
    is_primary        INTEGER NOT NULL,
    similarity_score  REAL NOT NULL,
    linked_at         TEXT NOT NULL,
    PRIMARY KEY (story_id, source_name),
    UNIQUE (article_id)
);

CREATE INDEX IF NOT EXISTS stories_category_seen_idx ON stories(category, first_seen);
CREATE INDEX IF NOT EXISTS stories_seen_idx          ON stories(first_seen);
CREATE INDEX IF NOT EXISTS stories_rank_idx          ON stories(importance_score DESC, last_updated DESC);

PRAGMA user_version = 1;
";
