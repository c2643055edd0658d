//! Handlers for `/stories` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/stories` | `?page=&limit=&category=&mood=&max_age_hours=` |
//! | `GET`  | `/stories/:id` | Story with its sources; 404 if not found |
//! | `GET`  | `/stories/:id/explain` | Score breakdown and tags |
//! | `GET`  | `/stories/:id/timeline` | Optional `?days=` (default 30) |
//! | `PUT`  | `/stories/:id/enrichment` | Body: any subset of the enrichment fields |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use calm_core::{
  ranking::Explanation,
  store::NewsStore,
  story::{Enrichment, Story, StoryDetail},
  timeline::Timeline,
};
use calm_engine::{
  Engine,
  ranking::{RankedPage, RankedQuery},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

fn not_found(id: Uuid) -> ApiError { ApiError::NotFound(format!("story {id} not found")) }

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /stories`: the ranked feed.
pub async fn list<S>(
  State(engine): State<Arc<Engine<S>>>,
  Query(params): Query<RankedQuery>,
) -> Result<Json<RankedPage>, ApiError>
where
  S: NewsStore,
{
  let page = engine.get_ranked(params).await?;
  Ok(Json(page))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /stories/:id`
pub async fn get_one<S>(
  State(engine): State<Arc<Engine<S>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<StoryDetail>, ApiError>
where
  S: NewsStore,
{
  let detail = engine.get_story(id).await?.ok_or_else(|| not_found(id))?;
  Ok(Json(detail))
}

/// `GET /stories/:id/explain`
pub async fn explain<S>(
  State(engine): State<Arc<Engine<S>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Explanation>, ApiError>
where
  S: NewsStore,
{
  let explanation = engine.explain(id).await?.ok_or_else(|| not_found(id))?;
  Ok(Json(explanation))
}

// ─── Timeline ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct TimelineParams {
  pub days: Option<u32>,
}

/// `GET /stories/:id/timeline[?days=...]`
pub async fn timeline<S>(
  State(engine): State<Arc<Engine<S>>>,
  Path(id): Path<Uuid>,
  Query(params): Query<TimelineParams>,
) -> Result<Json<Timeline>, ApiError>
where
  S: NewsStore,
{
  if params.days == Some(0) {
    return Err(ApiError::BadRequest("days must be at least 1".into()));
  }
  let timeline = engine
    .build_timeline(id, params.days)
    .await?
    .ok_or_else(|| not_found(id))?;
  Ok(Json(timeline))
}

// ─── Enrichment ───────────────────────────────────────────────────────────────

/// `PUT /stories/:id/enrichment`: body `{"summary": "...", "mood": "..."}`
pub async fn enrich<S>(
  State(engine): State<Arc<Engine<S>>>,
  Path(id): Path<Uuid>,
  Json(body): Json<Enrichment>,
) -> Result<Json<Story>, ApiError>
where
  S: NewsStore,
{
  let story = engine
    .apply_enrichment(id, body)
    .await?
    .ok_or_else(|| not_found(id))?;
  Ok(Json(story))
}
