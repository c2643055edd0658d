//! Pipeline triggers: batch clustering and ranking refresh.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/cluster` | Body: JSON array of articles |
//! | `POST` | `/rankings/refresh` | Optional `?max_age_hours=` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use calm_core::{article::NewArticle, store::NewsStore};
use calm_engine::{Engine, cluster::ClusterReport, ranking::RefreshReport};
use serde::Deserialize;

use crate::error::ApiError;

/// `POST /cluster`
///
/// Per-article failures are counted in the report, so the response is `200`
/// even when some articles were rejected.
pub async fn ingest<S>(
  State(engine): State<Arc<Engine<S>>>,
  Json(articles): Json<Vec<NewArticle>>,
) -> Json<ClusterReport>
where
  S: NewsStore,
{
  Json(engine.cluster_articles(articles).await)
}

#[derive(Debug, Deserialize, Default)]
pub struct RefreshParams {
  pub max_age_hours: Option<u32>,
}

/// `POST /rankings/refresh[?max_age_hours=...]`
pub async fn refresh<S>(
  State(engine): State<Arc<Engine<S>>>,
  Query(params): Query<RefreshParams>,
) -> Result<Json<RefreshReport>, ApiError>
where
  S: NewsStore,
{
  let report = engine.refresh_all(params.max_age_hours).await?;
  Ok(Json(report))
}
