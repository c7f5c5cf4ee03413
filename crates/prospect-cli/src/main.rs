//! `prospect`: terminal dashboard for lead generation and outreach.
//!
//! # Usage
//!
//! ```
//! prospect --user alice --config ~/.config/prospect/config.toml
//! prospect --user alice --store leads.db \
//!   --lead-generation-url https://hooks.example.com/lead-generation \
//!   --email-generation-url https://hooks.example.com/email-generation \
//!   --send-email-url https://hooks.example.com/send-email
//! ```

mod app;
mod ui;

use std::{
  fs::OpenOptions,
  io,
  path::{Path, PathBuf},
  sync::{Arc, Mutex},
  time::Duration,
};

use anyhow::{Context, Result, bail};
use app::App;
use clap::Parser;
use crossterm::{
  event::{self, Event, KeyEventKind},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use prospect_core::lead::UserId;
use prospect_gateway::{WebhookConfig, WebhookGateway};
use prospect_session::LeadSession;
use prospect_store_sqlite::SqliteStore;
use ratatui::{Terminal, backend::CrosstermBackend};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "prospect", about = "Terminal dashboard for lead generation and outreach")]
struct Args {
  /// Path to a TOML config file.
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// The user whose leads to work on.
  #[arg(long, env = "PROSPECT_USER")]
  user: Option<String>,

  /// SQLite database file (default: prospect.db).
  #[arg(long, value_name = "FILE", env = "PROSPECT_STORE")]
  store: Option<PathBuf>,

  #[arg(long, env = "PROSPECT_LEAD_GENERATION_URL")]
  lead_generation_url: Option<String>,

  #[arg(long, env = "PROSPECT_EMAIL_GENERATION_URL")]
  email_generation_url: Option<String>,

  #[arg(long, env = "PROSPECT_SEND_EMAIL_URL")]
  send_email_url: Option<String>,

  /// Per-request webhook timeout in seconds (default: 60).
  #[arg(long, env = "PROSPECT_TIMEOUT_SECS")]
  timeout_secs: Option<u64>,

  /// Write logs to this file. Nothing is logged otherwise.
  #[arg(long, value_name = "FILE", env = "PROSPECT_LOG_FILE")]
  log_file: Option<PathBuf>,
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  user:       String,
  store_path: Option<PathBuf>,
  log_file:   Option<PathBuf>,
  #[serde(default)]
  webhooks:   WebhookSection,
}

#[derive(Deserialize, Default)]
struct WebhookSection {
  #[serde(default)]
  lead_generation_url:  String,
  #[serde(default)]
  email_generation_url: String,
  #[serde(default)]
  send_email_url:       String,
  timeout_secs:         Option<u64>,
}

/// A flag wins over a non-empty config value.
fn pick(flag: Option<String>, file: String) -> Option<String> {
  flag.or_else(|| (!file.trim().is_empty()).then_some(file))
}

fn require(value: Option<String>, flag: &str) -> Result<String> {
  match value {
    Some(v) => Ok(v),
    None => bail!("missing --{flag} (or set it in the config file)"),
  }
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  // Load config file if provided.
  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  let log_file = args.log_file.or(file_cfg.log_file);
  init_logging(log_file.as_deref())?;

  let user = require(pick(args.user, file_cfg.user), "user")?;
  let store_path = args
    .store
    .or(file_cfg.store_path)
    .unwrap_or_else(|| PathBuf::from("prospect.db"));
  let hooks = file_cfg.webhooks;
  let webhooks = WebhookConfig {
    lead_generation_url:  require(
      pick(args.lead_generation_url, hooks.lead_generation_url),
      "lead-generation-url",
    )?,
    email_generation_url: require(
      pick(args.email_generation_url, hooks.email_generation_url),
      "email-generation-url",
    )?,
    send_email_url:       require(pick(args.send_email_url, hooks.send_email_url), "send-email-url")?,
    timeout_secs:         args.timeout_secs.or(hooks.timeout_secs).unwrap_or(60),
  };

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("opening store at {}", store_path.display()))?;
  let gateway = WebhookGateway::new(&webhooks).context("invalid webhook configuration")?;
  let session = Arc::new(LeadSession::new(UserId::new(user), Arc::new(store), Arc::new(gateway)));
  session.load().await.context("loading leads")?;

  let mut app = App::new(Arc::clone(&session));

  // Set up the terminal.
  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
  let backend = CrosstermBackend::new(stdout);
  let mut terminal = Terminal::new(backend).context("creating terminal")?;

  // Run the event loop; restore terminal even on error.
  let run_result = run_event_loop(&mut terminal, &mut app);

  // Anything still in flight is abandoned unchanged.
  session.close();

  // Restore terminal regardless of result.
  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
  terminal.show_cursor().ok();

  run_result
}

/// Log to `path` if given; the terminal itself belongs to the UI.
fn init_logging(path: Option<&Path>) -> Result<()> {
  let Some(path) = path else {
    return Ok(());
  };
  let file = OpenOptions::new()
    .create(true)
    .append(true)
    .open(path)
    .with_context(|| format!("opening log file {}", path.display()))?;

  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_ansi(false)
    .with_writer(Mutex::new(file))
    .init();
  Ok(())
}

// ─── Event loop ───────────────────────────────────────────────────────────────

fn run_event_loop(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  app: &mut App,
) -> Result<()> {
  loop {
    app.drain_events();
    terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;

    // Poll for an event, yielding control to tokio while waiting.
    let maybe_event = tokio::task::block_in_place(|| {
      if event::poll(Duration::from_millis(50))? {
        Ok::<_, io::Error>(Some(event::read()?))
      } else {
        Ok(None)
      }
    })?;

    if let Some(Event::Key(key)) = maybe_event
      && key.kind == KeyEventKind::Press
      && !app.handle_key(key)
    {
      break;
    }
  }

  Ok(())
}
