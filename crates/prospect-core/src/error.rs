//! Error types for `prospect-core`.

use thiserror::Error;

use crate::{lead::LeadId, lifecycle::LeadStatus};

#[derive(Debug, Error)]
pub enum Error {
  /// Missing or out-of-range local input. Never reaches the network.
  #[error("invalid input: {0}")]
  Validation(String),

  #[error("cannot {action} lead {lead} while it is {status}")]
  InvalidTransition {
    lead:   LeadId,
    status: LeadStatus,
    action: &'static str,
  },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
