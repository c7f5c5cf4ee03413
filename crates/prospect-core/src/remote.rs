//! The `RemoteActions` trait and its request types.
//!
//! Lead search, email generation and email delivery all happen in an external
//! service. This module describes the contract; `prospect-gateway` implements
//! it over HTTP. None of the calls are assumed idempotent.

use std::future::Future;

use serde::Serialize;

use crate::{
  Error,
  Result,
  draft::{EmailContent, Tone},
  lead::{Lead, LeadId, UserId},
};

/// Inclusive bounds on the number of leads one search may request.
pub const LEAD_COUNT_RANGE: std::ops::RangeInclusive<u32> = 1..=100;

// ─── Requests ────────────────────────────────────────────────────────────────

/// A validated lead-search request. Construct with [`LeadSearch::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadSearch {
  criteria:   String,
  lead_count: u32,
  user:       UserId,
}

impl LeadSearch {
  /// Validate locally; an invalid search never reaches the network.
  pub fn new(criteria: impl Into<String>, lead_count: u32, user: UserId) -> Result<Self> {
    let criteria = criteria.into().trim().to_owned();
    if criteria.is_empty() {
      return Err(Error::Validation("describe the leads you are looking for".into()));
    }
    if !LEAD_COUNT_RANGE.contains(&lead_count) {
      return Err(Error::Validation(format!(
        "lead count must be between {} and {}",
        LEAD_COUNT_RANGE.start(),
        LEAD_COUNT_RANGE.end()
      )));
    }
    Ok(Self { criteria, lead_count, user })
  }

  pub fn criteria(&self) -> &str { &self.criteria }

  pub fn lead_count(&self) -> u32 { self.lead_count }

  pub fn user(&self) -> &UserId { &self.user }
}

/// The lead fields the generation service writes copy from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeadBrief {
  pub name:     String,
  pub title:    String,
  pub company:  String,
  pub location: Option<String>,
  pub snippet:  Option<String>,
}

impl From<&Lead> for LeadBrief {
  fn from(lead: &Lead) -> Self {
    Self {
      name:     lead.name.clone(),
      title:    lead.title.clone(),
      company:  lead.company.clone(),
      location: lead.location.clone(),
      snippet:  lead.snippet.clone(),
    }
  }
}

/// Ask the generation service for an email to one lead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailRequest {
  pub lead: LeadBrief,
  pub tone: Tone,
  pub user: UserId,
}

/// Deliver an email to one lead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendRequest {
  pub lead_id:  LeadId,
  pub to_email: String,
  pub to_name:  String,
  pub content:  EmailContent,
  pub user:     UserId,
}

impl SendRequest {
  pub fn new(lead: &Lead, content: EmailContent, user: UserId) -> Result<Self> {
    if !lead.has_email() {
      return Err(Error::Validation(format!("lead {} has no email address", lead.id)));
    }
    Ok(Self {
      lead_id: lead.id.clone(),
      to_email: lead.email.trim().to_owned(),
      to_name: lead.name.clone(),
      content,
      user,
    })
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// The three outbound calls. Failures carry a human-readable message; no
/// implementation retries on its own.
pub trait RemoteActions: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Run a lead search. Leads without an email address are not returned.
  fn generate_leads<'a>(
    &'a self,
    search: &'a LeadSearch,
  ) -> impl Future<Output = Result<Vec<Lead>, Self::Error>> + Send + 'a;

  /// Generate an email. The payload is returned untouched for
  /// [`crate::codec::decode`].
  fn generate_email<'a>(
    &'a self,
    request: &'a EmailRequest,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'a;

  /// Send an email. Success means any 2xx acknowledgement.
  fn send_email<'a>(
    &'a self,
    request: &'a SendRequest,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn blank_criteria_is_rejected() {
    let err = LeadSearch::new("   ", 10, UserId::new("u")).unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
  }

  #[test]
  fn lead_count_is_bounded() {
    assert!(LeadSearch::new("CTOs in Berlin", 0, UserId::new("u")).is_err());
    assert!(LeadSearch::new("CTOs in Berlin", 101, UserId::new("u")).is_err());
    let search = LeadSearch::new("  CTOs in Berlin ", 25, UserId::new("u")).unwrap();
    assert_eq!(search.criteria(), "CTOs in Berlin");
    assert_eq!(search.lead_count(), 25);
  }

  #[test]
  fn send_requires_an_address() {
    let lead = Lead::new("l".into(), "Ann", "", "", " ");
    assert!(SendRequest::new(&lead, EmailContent::default(), UserId::new("u")).is_err());
  }
}
