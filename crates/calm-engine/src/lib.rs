//! The Calm story pipeline services.
//!
//! [`Engine`] composes the pure logic in `calm-core` with any
//! [`calm_core::store::NewsStore`] backend: it clusters incoming articles into
//! stories, keeps their aggregates and scores current, and answers the
//! read-time ranking, explanation and timeline queries.

pub mod cluster;
pub mod engine;
pub mod error;
pub mod ranking;
pub mod registry;
pub mod settings;
pub mod stories;
pub mod timeline;

pub use engine::Engine;
pub use error::{Error, Result};
pub use settings::{ClusterSettings, EngineSettings, RankingSettings};
