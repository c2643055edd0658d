//! Error type for `calm-engine`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] calm_core::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("story not found: {0}")]
  StoryNotFound(Uuid),

  /// Every optimistic write attempt lost to a concurrent writer.
  #[error("story {story_id} kept changing; gave up after {attempts} attempts")]
  Conflict { story_id: Uuid, attempts: u32 },
}

impl Error {
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
