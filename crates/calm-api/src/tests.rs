use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use calm_engine::Engine;
use calm_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;
use uuid::Uuid;

use crate::api_router;

async fn app() -> Router {
  let store = SqliteStore::open_in_memory().await.unwrap();
  api_router(Arc::new(Engine::with_defaults(Arc::new(store))))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  let body = match body {
    Some(v) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(v.to_string())
    }
    None => Body::empty(),
  };
  let resp = app
    .clone()
    .oneshot(builder.body(body).unwrap())
    .await
    .unwrap();

  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
    .await
    .unwrap();
  let json = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, json)
}

fn article(url: &str, source: &str, title: &str, category: &str) -> Value {
  json!({
    "title": title,
    "url": url,
    "source": source,
    "published_at": "2024-09-02T14:00:00Z",
    "category": category,
  })
}

/// Cluster two matching articles and one unrelated one; returns the id of
/// the two-source story.
async fn seed(app: &Router) -> String {
  let title = "Senate passes infrastructure bill";
  let (status, report) = send(
    app,
    "POST",
    "/cluster",
    Some(json!([
      article("https://reuters.test/1", "Reuters", title, "business"),
      article("https://bbc.test/1", "BBC", title, "business"),
      article("https://wired.test/1", "Wired", "Robot vacuums get smarter", "technology"),
    ])),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(report["new_stories"], 2);
  assert_eq!(report["merged_articles"], 1);

  let (_, page) = send(app, "GET", "/stories?category=business", None).await;
  page["stories"][0]["story_id"].as_str().unwrap().to_owned()
}

// ─── Stories ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn ranked_feed_lists_clustered_stories() {
  let app = app().await;
  seed(&app).await;

  let (status, page) = send(&app, "GET", "/stories?limit=1", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(page["stories"].as_array().unwrap().len(), 1);
  assert_eq!(page["stories"][0]["source_count"], 2);
  assert_eq!(page["pagination"]["total"], 2);
  assert_eq!(page["pagination"]["total_pages"], 2);
  assert_eq!(page["pagination"]["has_more"], true);
}

#[tokio::test]
async fn category_filter_is_case_insensitive() {
  let app = app().await;
  let id = seed(&app).await;

  let (status, page) = send(&app, "GET", "/stories?category=Business", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(page["pagination"]["total"], 1);
  assert_eq!(page["stories"][0]["story_id"], id.as_str());
}

#[tokio::test]
async fn extreme_paging_and_windows_are_answered() {
  let app = app().await;
  let id = seed(&app).await;

  let max_u32 = u32::MAX;
  let max_usize = usize::MAX;
  let requests = [
    ("GET", format!("/stories?page={max_usize}&limit=100")),
    ("GET", format!("/stories?max_age_hours={max_u32}")),
    ("GET", format!("/stories/{id}/timeline?days={max_u32}")),
    ("GET", format!("/categories?max_age_hours={max_u32}")),
    ("POST", format!("/rankings/refresh?max_age_hours={max_u32}")),
  ];
  for (method, uri) in requests {
    let (status, _) = send(&app, method, &uri, None).await;
    assert_eq!(status, StatusCode::OK, "{method} {uri}");
  }

  let (_, far) = send(&app, "GET", &format!("/stories?page={max_usize}"), None).await;
  assert_eq!(far["stories"], json!([]));
  assert_eq!(far["pagination"]["has_more"], false);
}

#[tokio::test]
async fn story_detail_includes_sources() {
  let app = app().await;
  let id = seed(&app).await;

  let (status, detail) = send(&app, "GET", &format!("/stories/{id}"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(detail["story"]["canonical_title"], "Senate passes infrastructure bill");
  let sources = detail["sources"].as_array().unwrap();
  assert_eq!(sources.len(), 2);
  assert_eq!(sources[0]["source_name"], "Reuters");
  assert_eq!(sources[0]["is_primary"], true);
}

#[tokio::test]
async fn unknown_story_is_404_json() {
  let app = app().await;
  let id = Uuid::new_v4();

  for path in ["", "/explain", "/timeline"] {
    let (status, body) = send(&app, "GET", &format!("/stories/{id}{path}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND, "path {path:?}");
    assert!(body["error"].as_str().unwrap().contains(&id.to_string()));
  }
}

#[tokio::test]
async fn malformed_story_id_is_400() {
  let app = app().await;
  let (status, _) = send(&app, "GET", "/stories/not-a-uuid", None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn explain_returns_components_and_tags() {
  let app = app().await;
  let id = seed(&app).await;

  let (status, body) = send(&app, "GET", &format!("/stories/{id}/explain"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["story_id"], id.as_str());
  assert!(body["components"]["credibility"].as_f64().unwrap() > 0.0);
  let tags: Vec<&str> = body["tags"]
    .as_array()
    .unwrap()
    .iter()
    .filter_map(Value::as_str)
    .collect();
  assert!(tags.contains(&"Highly credible sources"));
  assert!(tags.contains(&"Breaking story"));
}

#[tokio::test]
async fn timeline_of_new_story_is_empty() {
  let app = app().await;
  let id = seed(&app).await;

  let (status, body) = send(&app, "GET", &format!("/stories/{id}/timeline?days=7"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["lookback_days"], 7);
  assert_eq!(body["total_related"], 0);

  let (status, _) = send(&app, "GET", &format!("/stories/{id}/timeline?days=0"), None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn enrichment_is_stored_and_filterable() {
  let app = app().await;
  let id = seed(&app).await;

  let (status, story) = send(
    &app,
    "PUT",
    &format!("/stories/{id}/enrichment"),
    Some(json!({
      "summary": "Funding for roads and bridges.",
      "mood": "hopeful",
      "content_type": "ANALYSIS",
    })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(story["summary"], "Funding for roads and bridges.");
  assert_eq!(story["content_type"], "ANALYSIS");
  assert_eq!(story["source_count"], 2);

  let (_, page) = send(&app, "GET", "/stories?mood=hopeful", None).await;
  let stories = page["stories"].as_array().unwrap();
  assert_eq!(stories.len(), 1);
  assert_eq!(stories[0]["story_id"], id.as_str());

  let missing = Uuid::new_v4();
  let (status, _) = send(
    &app,
    "PUT",
    &format!("/stories/{missing}/enrichment"),
    Some(json!({ "mood": "calm" })),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ─── Categories ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn categories_count_stories() {
  let app = app().await;
  seed(&app).await;

  let (status, body) = send(&app, "GET", "/categories", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(
    body,
    json!([
      { "category": "business", "stories": 1 },
      { "category": "technology", "stories": 1 },
    ])
  );
}

// ─── Pipeline ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn cluster_reports_rejected_articles() {
  let app = app().await;
  let (status, report) = send(
    &app,
    "POST",
    "/cluster",
    Some(json!([
      article("https://ap.test/1", "AP", "  ", "world"),
      article("https://ap.test/2", "AP", "Ceasefire talks resume", "world"),
    ])),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(report, json!({
    "new_stories": 1,
    "merged_articles": 0,
    "skipped": 0,
    "errors": 1,
  }));
}

#[tokio::test]
async fn refresh_rescores_stories() {
  let app = app().await;
  seed(&app).await;

  let (status, report) = send(&app, "POST", "/rankings/refresh", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(report["scanned"], 2);
  assert_eq!(report["failed"], 0);

  let (_, again) = send(&app, "POST", "/rankings/refresh?max_age_hours=1", None).await;
  assert_eq!(again["scanned"], 2);
  assert_eq!(again["updated"], 0);
}
