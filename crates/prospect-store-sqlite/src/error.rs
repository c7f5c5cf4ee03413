//! Error type for `prospect-store-sqlite`.

use prospect_core::lead::LeadId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] prospect_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown tone: {0:?}")]
  UnknownTone(String),

  #[error("lead not found: {0}")]
  LeadNotFound(LeadId),

  #[error("lead {0} was already sent")]
  AlreadySent(LeadId),

  #[error("lead {0} has no draft to send")]
  NoDraft(LeadId),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
