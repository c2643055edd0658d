//! Integration tests for `SqliteStore` against an in-memory database.

use calm_core::{
  article::{Article, NewArticle},
  source::{Source, SourcePolicy, SourceType},
  store::{NewsStore, StoryOrder, StoryQuery},
  story::{Story, StorySource},
};
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn t0() -> DateTime<Utc> { Utc.with_ymd_and_hms(2024, 5, 10, 8, 0, 0).unwrap() }

fn new_article(url: &str, source: &str, title: &str) -> NewArticle {
  NewArticle {
    title:        title.into(),
    description:  "A short description".into(),
    content:      "Body text".into(),
    url:          url.into(),
    source:       source.into(),
    published_at: t0(),
    category:     "business".into(),
  }
}

async fn story_with_primary(s: &SqliteStore, article: &Article, first_seen: DateTime<Utc>) -> Story {
  insert(s, Story::from_primary(article, 0.95, first_seen), article).await
}

/// Insert `story` with `article` as its primary link.
async fn insert(s: &SqliteStore, story: Story, article: &Article) -> Story {
  let primary = StorySource::primary(story.story_id, article, 0.95, story.first_seen);
  s.insert_story(story, primary).await.unwrap().expect("article not yet linked")
}

// ─── Articles ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn record_and_get_article() {
  let s = store().await;
  let a = s
    .record_article(new_article("https://n.test/1", "Reuters", "Markets rally"))
    .await
    .unwrap();
  assert_eq!(a.revision, 0);

  let fetched = s.get_article(a.article_id).await.unwrap().unwrap();
  assert_eq!(fetched.url, "https://n.test/1");
  assert_eq!(fetched.published_at, t0());
  assert_eq!(fetched.content_hash, a.content_hash);
}

#[tokio::test]
async fn get_article_missing_returns_none() {
  let s = store().await;
  assert!(s.get_article(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn record_article_is_idempotent_by_url() {
  let s = store().await;
  let first = s
    .record_article(new_article("https://n.test/1", "Reuters", "Markets rally"))
    .await
    .unwrap();
  let second = s
    .record_article(new_article(" https://n.test/1 ", "Reuters", "Markets rally"))
    .await
    .unwrap();
  assert_eq!(first.article_id, second.article_id);
  assert_eq!(second.revision, 0);
}

#[tokio::test]
async fn changed_content_bumps_revision_only() {
  let s = store().await;
  let first = s
    .record_article(new_article("https://n.test/1", "Reuters", "Markets rally"))
    .await
    .unwrap();

  let mut edited = new_article("https://n.test/1", "Reuters", "Markets rally");
  edited.content = "Updated body text with corrections".into();
  let second = s.record_article(edited).await.unwrap();

  assert_eq!(second.article_id, first.article_id);
  assert_eq!(second.revision, 1);
  assert_ne!(second.content_hash, first.content_hash);
  assert_eq!(second.content, first.content);
}

#[tokio::test]
async fn record_article_rejects_blank_title() {
  let s = store().await;
  let err = s
    .record_article(new_article("https://n.test/1", "Reuters", "  "))
    .await;
  assert!(matches!(err, Err(crate::Error::Core(_))));
}

// ─── Sources ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn touch_source_inserts_then_bumps() {
  let s = store().await;
  let policy = SourcePolicy::builtin();

  let first = s
    .touch_source(Source::first_sighting("Reuters", &policy, t0()))
    .await
    .unwrap();
  assert_eq!(first.total_articles, 1);
  assert_eq!(first.source_type, SourceType::Wire);

  let later = t0() + TimeDelta::hours(3);
  let again = s
    .touch_source(Source::first_sighting("Reuters", &policy, later))
    .await
    .unwrap();
  assert_eq!(again.total_articles, 2);
  assert_eq!(again.first_seen_at, t0());
  assert_eq!(again.last_seen_at, later);
  assert_eq!(again.credibility_score, 0.95);
}

#[tokio::test]
async fn get_source_by_exact_name() {
  let s = store().await;
  let policy = SourcePolicy::builtin();
  s.touch_source(Source::first_sighting("Some Blog", &policy, t0()))
    .await
    .unwrap();

  let found = s.get_source("Some Blog").await.unwrap().unwrap();
  assert_eq!(found.credibility_score, 0.5);
  assert_eq!(found.bias, "unknown");
  assert!(s.get_source("some blog").await.unwrap().is_none());
}

// ─── Stories ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_and_get_story() {
  let s = store().await;
  let a = s
    .record_article(new_article("https://n.test/1", "Reuters", "Markets rally"))
    .await
    .unwrap();
  let story = story_with_primary(&s, &a, t0()).await;

  let fetched = s.get_story(story.story_id).await.unwrap().unwrap();
  assert_eq!(fetched.canonical_title, "Markets rally");
  assert_eq!(fetched.version, 0);
  assert_eq!(fetched.first_seen, t0());
  assert!(fetched.summary.is_none());
}

#[tokio::test]
async fn update_story_is_compare_and_swap() {
  let s = store().await;
  let a = s
    .record_article(new_article("https://n.test/1", "Reuters", "Markets rally"))
    .await
    .unwrap();
  let story = story_with_primary(&s, &a, t0()).await;

  let mut edit = story.clone();
  edit.source_count = 2;
  let written = s.update_story(edit.clone(), 0).await.unwrap().unwrap();
  assert_eq!(written.version, 1);

  // A writer still holding version 0 loses.
  edit.source_count = 7;
  assert!(s.update_story(edit, 0).await.unwrap().is_none());

  let stored = s.get_story(story.story_id).await.unwrap().unwrap();
  assert_eq!(stored.source_count, 2);
  assert_eq!(stored.version, 1);
}

#[tokio::test]
async fn update_missing_story_returns_none() {
  let s = store().await;
  let a = new_article("https://n.test/1", "Reuters", "Markets rally").into_article(t0());
  let ghost = Story::from_primary(&a, 0.9, t0());
  assert!(s.update_story(ghost, 0).await.unwrap().is_none());
}

#[tokio::test]
async fn find_stories_filters_and_orders() {
  let s = store().await;

  let mut ids = vec![];
  for (i, (cat, score)) in [("business", 0.4), ("business", 0.9), ("sports", 0.99), ("business", 0.1)]
    .into_iter()
    .enumerate()
  {
    let mut raw = new_article(&format!("https://n.test/{i}"), "Reuters", &format!("Story {i}"));
    raw.category = cat.into();
    let a = s.record_article(raw).await.unwrap();
    let mut story = Story::from_primary(&a, 0.9, t0() - TimeDelta::hours(i as i64));
    story.importance_score = score;
    let story = insert(&s, story, &a).await;
    ids.push(story.story_id);
  }

  let q = StoryQuery { category: Some("business".into()), ..StoryQuery::default() };
  let found = s.find_stories(&q).await.unwrap();
  let scores: Vec<f64> = found.iter().map(|s| s.importance_score).collect();
  assert_eq!(scores, vec![0.9, 0.4, 0.1]);
  assert_eq!(s.count_stories(&q).await.unwrap(), 3);

  let recent = StoryQuery {
    first_seen_from: Some(t0() - TimeDelta::minutes(90)),
    order: StoryOrder::Newest,
    ..StoryQuery::default()
  };
  let found = s.find_stories(&recent).await.unwrap();
  assert_eq!(found.iter().map(|s| s.story_id).collect::<Vec<_>>(), vec![ids[0], ids[1]]);

  let before = StoryQuery {
    first_seen_before: Some(t0() - TimeDelta::hours(1)),
    ..StoryQuery::default()
  };
  assert_eq!(s.count_stories(&before).await.unwrap(), 2);

  let paged = StoryQuery { limit: Some(1), offset: Some(1), ..StoryQuery::default() };
  let page = s.find_stories(&paged).await.unwrap();
  assert_eq!(page.len(), 1);
  assert_eq!(page[0].importance_score, 0.9);

  let far = StoryQuery { limit: Some(usize::MAX), offset: Some(usize::MAX), ..StoryQuery::default() };
  assert!(s.find_stories(&far).await.unwrap().is_empty());
}

#[tokio::test]
async fn importance_ties_break_on_last_updated() {
  let s = store().await;
  let a1 = s.record_article(new_article("https://n.test/1", "Reuters", "One")).await.unwrap();
  let a2 = s.record_article(new_article("https://n.test/2", "Reuters", "Two")).await.unwrap();

  let mut older = Story::from_primary(&a1, 0.9, t0());
  older.importance_score = 0.5;
  let mut newer = Story::from_primary(&a2, 0.9, t0());
  newer.importance_score = 0.5;
  newer.last_updated = t0() + TimeDelta::minutes(5);
  insert(&s, older, &a1).await;
  let newer = insert(&s, newer, &a2).await;

  let found = s.find_stories(&StoryQuery::default()).await.unwrap();
  assert_eq!(found[0].story_id, newer.story_id);
}

#[tokio::test]
async fn mood_filter_matches_enriched_stories() {
  let s = store().await;
  let a = s.record_article(new_article("https://n.test/1", "Reuters", "One")).await.unwrap();
  let story = story_with_primary(&s, &a, t0()).await;

  let mut enriched = story.clone();
  enriched.mood = Some("hopeful".into());
  s.update_story(enriched, story.version).await.unwrap().unwrap();

  let q = StoryQuery { mood: Some("hopeful".into()), ..StoryQuery::default() };
  assert_eq!(s.count_stories(&q).await.unwrap(), 1);
  let q = StoryQuery { mood: Some("tense".into()), ..StoryQuery::default() };
  assert_eq!(s.count_stories(&q).await.unwrap(), 0);
}

#[tokio::test]
async fn count_by_category_groups_within_window() {
  let s = store().await;
  for (i, (cat, age_h)) in [("business", 1), ("business", 2), ("world", 3), ("world", 100)]
    .into_iter()
    .enumerate()
  {
    let mut raw = new_article(&format!("https://n.test/{i}"), "Reuters", &format!("Story {i}"));
    raw.category = cat.into();
    let a = s.record_article(raw).await.unwrap();
    insert(&s, Story::from_primary(&a, 0.9, t0() - TimeDelta::hours(age_h)), &a).await;
  }

  let counts = s.count_by_category(t0() - TimeDelta::hours(72)).await.unwrap();
  assert_eq!(counts.len(), 2);
  assert_eq!((counts[0].category.as_str(), counts[0].stories), ("business", 2));
  assert_eq!((counts[1].category.as_str(), counts[1].stories), ("world", 1));
}

// ─── Story links ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn second_link_from_same_source_is_ignored() {
  let s = store().await;
  let a1 = s.record_article(new_article("https://n.test/1", "Reuters", "One")).await.unwrap();
  let a2 = s.record_article(new_article("https://n.test/2", "Reuters", "One again")).await.unwrap();
  let story = story_with_primary(&s, &a1, t0()).await;

  let linked = s
    .link_source(StorySource::secondary(story.story_id, &a2, 0.95, 0.9, t0()))
    .await
    .unwrap();
  assert!(!linked);
  assert_eq!(s.story_sources(story.story_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn article_links_to_at_most_one_story() {
  let s = store().await;
  let a1 = s.record_article(new_article("https://n.test/1", "Reuters", "One")).await.unwrap();
  let a2 = s.record_article(new_article("https://n.test/2", "BBC", "Two")).await.unwrap();
  let first = story_with_primary(&s, &a1, t0()).await;
  let second = story_with_primary(&s, &a2, t0()).await;

  let linked = s
    .link_source(StorySource::secondary(second.story_id, &a1, 0.95, 0.9, t0()))
    .await
    .unwrap();
  assert!(!linked);

  let link = s.link_for_article(a1.article_id).await.unwrap().unwrap();
  assert_eq!(link.story_id, first.story_id);
  assert!(link.is_primary);
  assert_eq!(link.similarity_score, 1.0);
}

#[tokio::test]
async fn story_for_linked_article_is_not_inserted() {
  let s = store().await;
  let a = s.record_article(new_article("https://n.test/1", "Reuters", "One")).await.unwrap();
  let first = story_with_primary(&s, &a, t0()).await;

  let twin = Story::from_primary(&a, 0.95, t0());
  let twin_id = twin.story_id;
  let primary = StorySource::primary(twin_id, &a, 0.95, t0());
  assert!(s.insert_story(twin, primary).await.unwrap().is_none());

  assert!(s.get_story(twin_id).await.unwrap().is_none());
  assert_eq!(s.count_stories(&StoryQuery::default()).await.unwrap(), 1);
  let link = s.link_for_article(a.article_id).await.unwrap().unwrap();
  assert_eq!(link.story_id, first.story_id);
}

#[tokio::test]
async fn story_sources_lists_primary_first() {
  let s = store().await;
  let a1 = s.record_article(new_article("https://n.test/1", "Reuters", "One")).await.unwrap();
  let mut early = new_article("https://n.test/2", "BBC", "One");
  early.published_at = t0() - TimeDelta::hours(2);
  let a2 = s.record_article(early).await.unwrap();
  let story = story_with_primary(&s, &a1, t0()).await;
  s.link_source(StorySource::secondary(story.story_id, &a2, 0.9, 0.8, t0()))
    .await
    .unwrap();

  let links = s.story_sources(story.story_id).await.unwrap();
  assert_eq!(links.len(), 2);
  assert!(links[0].is_primary);
  assert_eq!(links[1].source_name, "BBC");
  assert_eq!(links[1].similarity_score, 0.8);
}
