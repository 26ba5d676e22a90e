//! loca server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens the
//! SQLite store, creates the tables of every configured record type, and
//! serves the JSON API over HTTP.
//!
//! ```toml
//! host = "127.0.0.1"
//! port = 8080
//! store_path = "~/.local/share/loca/loca.db"
//!
//! [[record_types]]
//! table = "articles"
//! columns = ["slug"]
//! translatable = ["title", "body"]
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use loca_api::{AppState, Registry, ServerConfig};
use loca_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Localized record server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("LOCA"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let registry = Registry::from_configs(&server_cfg.record_types)
    .context("invalid record type configuration")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  for kind in registry.iter() {
    store
      .ensure_record_type(kind)
      .await
      .with_context(|| format!("failed to create tables for {:?}", kind.table_name()))?;
  }

  let state = AppState {
    store:    Arc::new(store),
    registry: Arc::new(registry),
  };

  let app = loca_api::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
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
