//! Webhook endpoint configuration.

use serde::Deserialize;

fn default_timeout_secs() -> u64 { 60 }

/// Where the three remote actions live.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookConfig {
  pub lead_generation_url:  String,
  pub email_generation_url: String,
  pub send_email_url:       String,
  /// Per-request timeout. Generation calls are slow; keep this generous.
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs:         u64,
}
