//! Change notifications published by a session.
//!
//! Subscribers get every event emitted after they subscribed. A subscriber
//! that falls too far behind sees `RecvError::Lagged` and should re-read the
//! session's snapshot.

use prospect_core::lead::LeadId;
use serde::Serialize;

/// Buffered events per subscriber before the oldest are dropped.
pub const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
  /// The cache was replaced from the store.
  Reloaded { count: usize },
  LeadsGenerated { ids: Vec<LeadId> },
  DraftUpdated { id: LeadId },
  EmailSent { id: LeadId },
  LeadDeleted { id: LeadId },
  /// A user action failed; nothing changed.
  ActionFailed { id: Option<LeadId>, message: String },
}
