//! junkmap server binary.
//!
//! Reads `junkmap.json` (or the path given with `--config`), opens the SQLite
//! address ledger, and answers lookups on the configured TCP address.
//!
//! # Promoting an address
//!
//! To mark an address as permanently trusted and exit:
//!
//! ```sh
//! junkmap --config /etc/junkmap.json --promote alice@example.org
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use junkmap_core::Ledger as _;
use junkmap_server::{AppState, ServerConfig};
use junkmap_store_sqlite::SqliteLedger;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "junkmap greylisting lookup server")]
struct Cli {
  /// Path to the configuration file (JSON, TOML or YAML by extension).
  #[arg(short, long, default_value = "junkmap.json")]
  config: PathBuf,

  /// Mark ADDRESS as permanently trusted and exit.
  #[arg(long, value_name = "ADDRESS")]
  promote: Option<String>,
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

  // Load configuration.
  let settings = ServerConfig::load(&cli.config)
    .with_context(|| format!("failed to read config {:?}", cli.config))?
    .validate()
    .context("invalid configuration")?;

  // Expand `~` in the database path.
  let db_path = expand_tilde(&settings.database);

  // Open the ledger; this also creates or checks the schema.
  let ledger = SqliteLedger::open_pooled(&db_path, settings.pool_size)
    .await
    .with_context(|| format!("failed to open ledger at {db_path:?}"))?;

  // Admin mode: promote an address and exit.
  if let Some(address) = cli.promote {
    let address = address.trim();
    if !ledger.promote(address).await.context("promote failed")? {
      anyhow::bail!("{address:?} is not in the ledger");
    }
    tracing::info!(address, "address promoted to permanent");
    return Ok(());
  }

  tracing::info!(
    addresses = ledger.count().await.context("failed to read ledger")?,
    expiry_hours = settings.expiry.num_hours(),
    "ledger ready"
  );

  let service = settings.service.clone();
  let state = AppState::new(Arc::new(ledger), Arc::new(settings));

  let listener = TcpListener::bind(&service)
    .await
    .with_context(|| format!("failed to bind {service}"))?;
  tracing::info!("Listening on {}", listener.local_addr().context("no local address")?);

  junkmap_server::serve(listener, state, shutdown_signal())
    .await
    .context("server error")?;

  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::warn!(error = %e, "cannot listen for ctrl-c");
    std::future::pending::<()>().await;
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
