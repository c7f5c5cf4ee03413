//! Error type for `prospect-gateway`.
//!
//! `Transport` and `Status` are the remote-action failures a user sees; their
//! `Display` output is meant to be shown as-is.

use std::fmt;

use thiserror::Error;

/// The remote action a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
  GenerateLeads,
  GenerateEmail,
  SendEmail,
}

impl fmt::Display for Action {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::GenerateLeads => "lead generation",
      Self::GenerateEmail => "email generation",
      Self::SendEmail => "sending the email",
    })
  }
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("{action} failed: {source}")]
  Transport {
    action: Action,
    #[source]
    source: reqwest::Error,
  },

  #[error("{action} failed (HTTP {status}): {message}")]
  Status {
    action:  Action,
    status:  u16,
    message: String,
  },

  #[error("lead generation returned an unexpected response: {0}")]
  UnexpectedLeads(#[source] serde_json::Error),

  #[error("invalid webhook URL {url:?}: {reason}")]
  InvalidUrl { url: String, reason: String },

  #[error("failed to build HTTP client: {0}")]
  Client(#[source] reqwest::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
