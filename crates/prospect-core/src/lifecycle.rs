//! Lead lifecycle: `NoEmail → EmailGenerated → EmailSent`.
//!
//! Status is never stored. It is derived from the record's draft and sent
//! timestamp, so it cannot drift from the fields it summarises. Transitions
//! return a new record and leave the original untouched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::{
  Error,
  Result,
  draft::{EmailContent, EmailDraft},
  lead::{Lead, UserId},
};

// ─── Status ──────────────────────────────────────────────────────────────────

/// Where a lead is in its outreach lifecycle.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LeadStatus {
  NoEmail,
  EmailGenerated,
  /// Terminal.
  EmailSent,
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// A lead together with everything that changes over its life.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadRecord {
  pub lead:       Lead,
  pub owner:      UserId,
  pub draft:      Option<EmailDraft>,
  /// Set exactly when the email was sent. The persisted sent flag is derived
  /// from this, so flag and timestamp cannot disagree.
  pub sent_at:    Option<DateTime<Utc>>,
  pub created_at: DateTime<Utc>,
}

impl LeadRecord {
  /// A freshly generated lead with no draft.
  pub fn new(lead: Lead, owner: UserId, created_at: DateTime<Utc>) -> Self {
    Self { lead, owner, draft: None, sent_at: None, created_at }
  }

  pub fn status(&self) -> LeadStatus {
    if self.sent_at.is_some() {
      LeadStatus::EmailSent
    } else if self.draft.is_some() {
      LeadStatus::EmailGenerated
    } else {
      LeadStatus::NoEmail
    }
  }

  pub fn is_sent(&self) -> bool { self.sent_at.is_some() }

  fn invalid(&self, action: &'static str) -> Error {
    Error::InvalidTransition { lead: self.lead.id.clone(), status: self.status(), action }
  }

  /// `NoEmail → EmailGenerated` or `EmailGenerated → EmailGenerated`: the
  /// draft is replaced wholesale.
  pub fn with_draft(&self, draft: EmailDraft) -> Result<Self> {
    if self.is_sent() {
      return Err(self.invalid("replace the draft of"));
    }
    Ok(Self { draft: Some(draft), ..self.clone() })
  }

  /// Save user edits over the current draft. Only valid in `EmailGenerated`.
  pub fn with_edit(&self, content: EmailContent) -> Result<Self> {
    match (&self.draft, self.is_sent()) {
      (Some(draft), false) => Ok(Self { draft: Some(draft.edited(content)), ..self.clone() }),
      _ => Err(self.invalid("edit")),
    }
  }

  /// `EmailGenerated → EmailSent`.
  pub fn mark_sent(&self, at: DateTime<Utc>) -> Result<Self> {
    if self.status() != LeadStatus::EmailGenerated {
      return Err(self.invalid("send"));
    }
    Ok(Self { sent_at: Some(at), ..self.clone() })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::draft::Tone;

  fn record() -> LeadRecord {
    LeadRecord::new(
      Lead::new("l1".into(), "Alice", "CEO", "Acme", "alice@acme.test"),
      UserId::new("u1"),
      Utc::now(),
    )
  }

  fn draft(subject: &str) -> EmailDraft {
    EmailDraft::generated(EmailContent::new(subject, "body"), Tone::Casual, "raw".into())
  }

  #[test]
  fn walks_the_whole_lifecycle() {
    let fresh = record();
    assert_eq!(fresh.status(), LeadStatus::NoEmail);

    let generated = fresh.with_draft(draft("one")).unwrap();
    assert_eq!(generated.status(), LeadStatus::EmailGenerated);
    assert_eq!(fresh.status(), LeadStatus::NoEmail, "original is untouched");

    let regenerated = generated.with_draft(draft("two")).unwrap();
    assert_eq!(regenerated.status(), LeadStatus::EmailGenerated);
    assert_eq!(regenerated.draft.as_ref().unwrap().content.subject, "two");

    let sent = regenerated.mark_sent(Utc::now()).unwrap();
    assert_eq!(sent.status(), LeadStatus::EmailSent);
    assert_eq!(sent.status(), LeadStatus::EmailSent);
  }

  #[test]
  fn sent_is_terminal() {
    let sent = record().with_draft(draft("x")).unwrap().mark_sent(Utc::now()).unwrap();
    assert!(matches!(
      sent.with_draft(draft("y")),
      Err(Error::InvalidTransition { status: LeadStatus::EmailSent, .. })
    ));
    assert!(sent.with_edit(EmailContent::new("a", "b")).is_err());
    assert!(sent.mark_sent(Utc::now()).is_err());
  }

  #[test]
  fn cannot_send_or_edit_without_a_draft() {
    let fresh = record();
    assert!(fresh.mark_sent(Utc::now()).is_err());
    assert!(fresh.with_edit(EmailContent::new("a", "b")).is_err());
  }

  #[test]
  fn status_names() {
    assert_eq!(LeadStatus::EmailGenerated.to_string(), "email_generated");
    assert_eq!(serde_json::to_string(&LeadStatus::NoEmail).unwrap(), "\"no_email\"");
  }
}
