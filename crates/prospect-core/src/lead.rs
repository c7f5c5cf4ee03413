//! Lead: a prospect returned by the lead-generation service.
//!
//! Identity fields never change after creation. Everything that evolves over
//! a lead's life (its draft, whether it was sent) lives on
//! [`crate::lifecycle::LeadRecord`].

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Identifiers ─────────────────────────────────────────────────────────────

/// Opaque lead identifier; unique within one user's collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeadId(String);

impl LeadId {
  pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

  /// A fresh random identifier for leads the upstream did not label.
  pub fn generate() -> Self { Self(Uuid::new_v4().hyphenated().to_string()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for LeadId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl From<&str> for LeadId {
  fn from(s: &str) -> Self { Self(s.to_owned()) }
}

/// The acting user. Supplied by the authentication provider; every lead is
/// owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
  pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for UserId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

// ─── Lead ────────────────────────────────────────────────────────────────────

/// A prospect. Accepts both the snake_case keys used in storage and the
/// camelCase keys the generation service emits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
  pub id:             LeadId,
  #[serde(default)]
  pub name:           String,
  #[serde(default)]
  pub title:          String,
  #[serde(default)]
  pub company:        String,
  #[serde(default)]
  pub location:       Option<String>,
  #[serde(default)]
  pub email:          String,
  #[serde(default, alias = "linkedinUrl")]
  pub linkedin_url:   Option<String>,
  #[serde(default)]
  pub snippet:        Option<String>,
  #[serde(default, alias = "companyDomain")]
  pub company_domain: Option<String>,
  #[serde(default, alias = "imageUrl")]
  pub image_url:      Option<String>,
}

impl Lead {
  /// Convenience constructor with all optional fields unset.
  pub fn new(
    id: LeadId,
    name: impl Into<String>,
    title: impl Into<String>,
    company: impl Into<String>,
    email: impl Into<String>,
  ) -> Self {
    Self {
      id,
      name: name.into(),
      title: title.into(),
      company: company.into(),
      location: None,
      email: email.into(),
      linkedin_url: None,
      snippet: None,
      company_domain: None,
      image_url: None,
    }
  }

  /// The company name, if the upstream provided a non-blank one.
  pub fn company_name(&self) -> Option<&str> {
    let company = self.company.trim();
    (!company.is_empty()).then_some(company)
  }

  /// Whether this lead can be contacted at all.
  pub fn has_email(&self) -> bool { !self.email.trim().is_empty() }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn deserializes_camel_case_upstream_keys() {
    let json = serde_json::json!({
      "id": "l-1",
      "name": "Alice",
      "company": "Acme",
      "email": "alice@acme.test",
      "linkedinUrl": "https://linkedin.example/alice",
      "companyDomain": "acme.test",
    });
    let lead: Lead = serde_json::from_value(json).unwrap();
    assert_eq!(lead.id.as_str(), "l-1");
    assert_eq!(lead.title, "");
    assert_eq!(lead.linkedin_url.as_deref(), Some("https://linkedin.example/alice"));
    assert_eq!(lead.company_domain.as_deref(), Some("acme.test"));
  }

  #[test]
  fn blank_company_is_unknown() {
    let lead = Lead::new("x".into(), "Bob", "CTO", "   ", "bob@b.test");
    assert_eq!(lead.company_name(), None);
    assert!(lead.has_email());
  }
}
