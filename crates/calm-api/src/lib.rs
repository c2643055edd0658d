//! JSON REST API for Calm.
//!
//! Exposes an axum [`Router`] over a [`calm_engine::Engine`] backed by any
//! [`calm_core::store::NewsStore`]. Auth, TLS and request tracing are the
//! caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", calm_api::api_router(engine.clone()))
//! ```

pub mod categories;
pub mod cluster;
pub mod error;
pub mod stories;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use calm_core::store::NewsStore;
use calm_engine::Engine;

pub use error::ApiError;

/// Build a fully-materialised API router for `engine`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(engine: Arc<Engine<S>>) -> Router<()>
where
  S: NewsStore + 'static,
{
  Router::new()
    // Stories
    .route("/stories", get(stories::list::<S>))
    .route("/stories/{id}", get(stories::get_one::<S>))
    .route("/stories/{id}/explain", get(stories::explain::<S>))
    .route("/stories/{id}/timeline", get(stories::timeline::<S>))
    .route("/stories/{id}/enrichment", put(stories::enrich::<S>))
    // Categories
    .route("/categories", get(categories::list::<S>))
    // Pipeline
    .route("/cluster", post(cluster::ingest::<S>))
    .route("/rankings/refresh", post(cluster::refresh::<S>))
    .with_state(engine)
}

#[cfg(test)]
mod tests;
