//! prospect-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) layered with
//! `PROSPECT_*` environment variables, opens an in-process SQLite store, and
//! serves the dashboard API over HTTP.
//!
//! ```toml
//! port              = 8080
//! store_path        = "~/.local/share/prospect/leads.db"
//! session_idle_secs = 1800
//!
//! [webhooks]
//! lead_generation_url  = "https://hooks.example.com/lead-generation"
//! email_generation_url = "https://hooks.example.com/email-generation"
//! send_email_url       = "https://hooks.example.com/send-email"
//! ```
//!
//! Nested keys can be overridden with a double underscore, e.g.
//! `PROSPECT_WEBHOOKS__SEND_EMAIL_URL`.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use anyhow::Context as _;
use clap::Parser;
use prospect_api::{ServerConfig, SessionRegistry};
use prospect_gateway::WebhookGateway;
use prospect_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Prospect dashboard API server")]
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
    .add_source(
      config::Environment::with_prefix("PROSPECT")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true),
    )
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let gateway =
    WebhookGateway::new(&server_cfg.webhooks).context("invalid webhook configuration")?;

  let registry = Arc::new(SessionRegistry::new(
    Arc::new(store),
    Arc::new(gateway),
    server_cfg.session_idle(),
  ));
  tokio::spawn(evict_idle_sessions(Arc::clone(&registry)));
  let app = prospect_api::api_router(Arc::clone(&registry));
  let address = server_cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  // Pending remote calls are cancelled as soon as the signal arrives.
  axum::serve(listener, app)
    .with_graceful_shutdown(async move {
      shutdown_signal().await;
      registry.close_all();
    })
    .await
    .context("server error")?;

  tracing::info!("shut down");
  Ok(())
}

async fn evict_idle_sessions(registry: Arc<SessionRegistry<SqliteStore, WebhookGateway>>) {
  let mut ticker = tokio::time::interval(Duration::from_secs(60));
  loop {
    ticker.tick().await;
    let dropped = registry.evict_idle();
    if dropped > 0 {
      tracing::debug!(dropped, open = registry.open_sessions(), "idle sessions dropped");
    }
  }
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::warn!(error = %e, "could not listen for ctrl-c");
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
