//! Handler for `GET /categories`.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use calm_core::store::{CategoryCount, NewsStore};
use calm_engine::Engine;
use serde::Deserialize;

use crate::error::ApiError;

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
  pub max_age_hours: Option<u32>,
}

/// `GET /categories[?max_age_hours=...]`: story counts per category, largest
/// first.
pub async fn list<S>(
  State(engine): State<Arc<Engine<S>>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<CategoryCount>>, ApiError>
where
  S: NewsStore,
{
  let counts = engine.category_counts(params.max_age_hours).await?;
  Ok(Json(counts))
}
