//! calm-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the SQLite
//! store, refreshes importance scores on a fixed interval and serves the JSON
//! API over HTTP.

mod settings;

use std::{sync::Arc, time::Duration};

use anyhow::Context as _;
use calm_core::clock::SystemClock;
use calm_engine::Engine;
use calm_store_sqlite::SqliteStore;
use clap::Parser;
use tokio::{net::TcpListener, task::JoinHandle, time::MissedTickBehavior};
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::settings::{ServerConfig, expand_tilde};

#[derive(Parser)]
#[command(author, version, about = "Calm story clustering and ranking server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: std::path::PathBuf,

  /// Run one ranking refresh, print its report and exit.
  #[arg(long)]
  refresh_once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let server_cfg = ServerConfig::load(&cli.config)?;
  let policy = server_cfg.load_source_policy()?;

  // Expand `~` in store path.
  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let engine = Arc::new(Engine::new(
    Arc::new(store),
    Arc::new(SystemClock),
    policy,
    server_cfg.engine_settings(),
  ));

  // Helper mode: refresh once and exit.
  if cli.refresh_once {
    let report = engine.refresh_all(None).await.context("ranking refresh failed")?;
    println!(
      "scanned {} updated {} failed {}",
      report.scanned, report.updated, report.failed
    );
    return Ok(());
  }

  let refresher = spawn_refresh(
    engine.clone(),
    Duration::from_secs(server_cfg.refresh_interval_secs.max(1)),
  );

  let app = calm_api::api_router(engine).layer(TraceLayer::new_for_http());
  let address = server_cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  refresher.abort();
  Ok(())
}

/// Re-score recent stories every `every`, starting immediately.
fn spawn_refresh(engine: Arc<Engine<SqliteStore>>, every: Duration) -> JoinHandle<()> {
  tokio::spawn(async move {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
      ticker.tick().await;
      if let Err(e) = engine.refresh_all(None).await {
        tracing::warn!(error = %e, "scheduled ranking refresh failed");
      }
    }
  })
}
