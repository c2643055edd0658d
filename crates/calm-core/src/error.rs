//! Error types for `calm-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid article: {0}")]
  InvalidArticle(String),

  #[error("invalid source policy: {0}")]
  InvalidPolicy(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
