//! Server configuration.

use std::{path::PathBuf, time::Duration};

use prospect_gateway::WebhookConfig;
use serde::Deserialize;

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("prospect.db") }

fn default_session_idle_secs() -> u64 { 1800 }

/// Runtime server configuration, deserialised from `config.toml` layered
/// with `PROSPECT_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:              String,
  #[serde(default = "default_port")]
  pub port:              u16,
  #[serde(default = "default_store_path")]
  pub store_path:        PathBuf,
  /// A user's cached session is dropped after this long without requests.
  #[serde(default = "default_session_idle_secs")]
  pub session_idle_secs: u64,
  pub webhooks:          WebhookConfig,
}

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn session_idle(&self) -> Duration { Duration::from_secs(self.session_idle_secs) }
}
