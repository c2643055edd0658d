//! Runtime configuration for the server binary.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use calm_core::source::SourcePolicy;
use calm_engine::{ClusterSettings, EngineSettings, RankingSettings};
use serde::Deserialize;

/// Runtime server configuration, deserialised from `config.toml` and
/// `CALM_*` environment variables. Missing keys take the defaults below.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:                       String,
  pub port:                       u16,
  pub store_path:                 PathBuf,
  pub refresh_interval_secs:      u64,
  /// Outlet table replacing the built-in one.
  pub source_policy:              Option<PathBuf>,
  pub credibility_cache_secs:     u64,
  pub credibility_cache_capacity: usize,
  pub cluster:                    ClusterSettings,
  pub ranking:                    RankingSettings,
}

impl Default for ServerConfig {
  fn default() -> Self {
    let engine = EngineSettings::default();
    Self {
      host:                       "127.0.0.1".to_string(),
      port:                       8080,
      store_path:                 PathBuf::from("~/.local/share/calm/calm.db"),
      refresh_interval_secs:      15 * 60,
      source_policy:              None,
      credibility_cache_secs:     engine.credibility_cache_secs,
      credibility_cache_capacity: engine.credibility_cache_capacity,
      cluster:                    engine.cluster,
      ranking:                    engine.ranking,
    }
  }
}

impl ServerConfig {
  /// Layer the optional file at `path` under `CALM_`-prefixed environment
  /// variables (`__` separates nested keys).
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("CALM")
          .prefix_separator("_")
          .separator("__"),
      )
      .build()
      .context("failed to read config file")?;

    settings
      .try_deserialize()
      .context("failed to deserialise ServerConfig")
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn engine_settings(&self) -> EngineSettings {
    EngineSettings {
      cluster:                    self.cluster.clone(),
      ranking:                    self.ranking.clone(),
      credibility_cache_secs:     self.credibility_cache_secs,
      credibility_cache_capacity: self.credibility_cache_capacity,
    }
  }

  /// The configured outlet table, or the built-in one.
  pub fn load_source_policy(&self) -> anyhow::Result<SourcePolicy> {
    let Some(path) = &self.source_policy else {
      return Ok(SourcePolicy::builtin());
    };
    let path = expand_tilde(path);

    let policy: SourcePolicy = config::Config::builder()
      .add_source(config::File::from(path.as_path()))
      .build()
      .and_then(config::Config::try_deserialize)
      .with_context(|| format!("failed to read source policy {path:?}"))?;
    policy
      .validate()
      .with_context(|| format!("invalid source policy {path:?}"))?;
    Ok(policy)
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
