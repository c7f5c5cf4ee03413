//! The `LeadStore` trait.
//!
//! Implemented by storage backends (e.g. `prospect-store-sqlite`). Every
//! method is scoped by the calling user; a user can never read or modify
//! another user's rows through this trait.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{
  draft::EmailDraft,
  lead::{Lead, LeadId, UserId},
  lifecycle::LeadRecord,
};

/// Abstraction over a lead persistence backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait LeadStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// All of `owner`'s leads, oldest first.
  fn list_leads<'a>(
    &'a self,
    owner: &'a UserId,
  ) -> impl Future<Output = Result<Vec<LeadRecord>, Self::Error>> + Send + 'a;

  /// A single lead. Returns `None` if `owner` has no lead with that id.
  fn get_lead<'a>(
    &'a self,
    owner: &'a UserId,
    id: &'a LeadId,
  ) -> impl Future<Output = Result<Option<LeadRecord>, Self::Error>> + Send + 'a;

  /// Persist a batch of freshly generated leads.
  ///
  /// Leads whose id already exists for `owner` are skipped. Returns the
  /// records that were actually inserted, in input order.
  fn insert_leads<'a>(
    &'a self,
    owner: &'a UserId,
    leads: Vec<Lead>,
  ) -> impl Future<Output = Result<Vec<LeadRecord>, Self::Error>> + Send + 'a;

  /// Replace the draft of an unsent lead.
  ///
  /// Fails if the lead does not exist or has already been sent.
  fn save_draft<'a>(
    &'a self,
    owner: &'a UserId,
    id: &'a LeadId,
    draft: &'a EmailDraft,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Set the sent flag and timestamp together.
  ///
  /// Fails if the lead does not exist, has no draft, or was already sent.
  fn mark_sent<'a>(
    &'a self,
    owner: &'a UserId,
    id: &'a LeadId,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Delete a lead and its draft. Returns `false` if there was nothing to
  /// delete.
  fn delete_lead<'a>(
    &'a self,
    owner: &'a UserId,
    id: &'a LeadId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;
}
