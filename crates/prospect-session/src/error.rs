//! Error type for `prospect-session`.

use prospect_core::{lead::LeadId, lifecycle::LeadStatus};
use thiserror::Error;

use crate::session::Pending;

#[derive(Debug, Error)]
pub enum SessionError {
  /// Local input was rejected; no remote call was made.
  #[error("{0}")]
  Validation(String),

  /// The remote service failed or could not be reached. Nothing changed;
  /// the action can be retried by the user.
  #[error("{0}")]
  RemoteActionFailed(String),

  #[error("lead not found: {0}")]
  LeadNotFound(LeadId),

  #[error("lead {id} is busy {pending}")]
  InFlight { id: LeadId, pending: Pending },

  #[error("the email to lead {0} was already sent")]
  AlreadySent(LeadId),

  #[error("lead {0} has no email draft yet")]
  NoDraft(LeadId),

  /// A newer change to the same lead landed first; this result was dropped.
  #[error("a newer change to lead {0} replaced this result")]
  Superseded(LeadId),

  #[error("the session closed before the action completed")]
  Cancelled,

  #[error("storage error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl SessionError {
  pub(crate) fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

impl From<prospect_core::Error> for SessionError {
  fn from(e: prospect_core::Error) -> Self {
    match e {
      prospect_core::Error::Validation(msg) => Self::Validation(msg),
      prospect_core::Error::InvalidTransition { lead, status: LeadStatus::EmailSent, .. } => {
        Self::AlreadySent(lead)
      }
      prospect_core::Error::InvalidTransition { lead, status: LeadStatus::NoEmail, .. } => {
        Self::NoDraft(lead)
      }
      other @ prospect_core::Error::InvalidTransition { .. } => Self::Validation(other.to_string()),
      other @ prospect_core::Error::Serialization(_) => Self::store(other),
    }
  }
}

pub type Result<T, E = SessionError> = std::result::Result<T, E>;
