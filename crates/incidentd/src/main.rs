//! incidentd server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the SQLite
//! store and serves the incident API over HTTP.
//!
//! # Token generation
//!
//! To mint an API token and the config entry that accepts it:
//!
//! ```text
//! incidentd --generate-token ci-bot
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use incident_store_sqlite::SqliteStore;
use incidentd::{ServerConfig, auth};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Incident timeline and postmortem server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print a new API token for NAME with its config entry, then exit.
  #[arg(long, value_name = "NAME")]
  generate_token: Option<String>,
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

  if let Some(name) = cli.generate_token {
    let (token, digest) = auth::generate_token();
    println!("token: {token}");
    println!();
    println!("[[tokens]]");
    println!("name   = {name:?}");
    println!("sha256 = {digest:?}");
    return Ok(());
  }

  let server_cfg = load_config(&cli.config)?;
  let store_path = expand_tilde(&server_cfg.store_path);

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let app = incidentd::router(Arc::new(store), &server_cfg)
    .context("invalid server configuration")?;
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!(store = %store_path.display(), "Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Defaults, then the TOML file if present, then `INCIDENTD_*` variables.
fn load_config(path: &Path) -> anyhow::Result<ServerConfig> {
  let defaults = ServerConfig::default();
  let settings = config::Config::builder()
    .set_default("host", defaults.host)?
    .set_default("port", i64::from(defaults.port))?
    .set_default("store_path", defaults.store_path.to_string_lossy().into_owned())?
    .add_source(config::File::from(path.to_path_buf()).required(false))
    .add_source(
      config::Environment::with_prefix("INCIDENTD")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("cors_origins"),
    )
    .build()
    .context("failed to read config file")?;

  settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")
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
