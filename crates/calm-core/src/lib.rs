//! Core types and pure logic for the Calm story pipeline.
//!
//! Holds the domain model, the [`store::NewsStore`] abstraction that backends
//! implement, and the deterministic similarity, ranking and timeline math
//! that the engine services compose. No HTTP or database dependencies.

pub mod article;
pub mod cache;
pub mod clock;
pub mod error;
pub mod ranking;
pub mod similarity;
pub mod source;
pub mod store;
pub mod story;
pub mod timeline;

pub use error::{Error, Result};
