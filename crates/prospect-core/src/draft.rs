//! Email drafts attached 1:1 to a lead.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

// ─── Tone ────────────────────────────────────────────────────────────────────

/// Style selector passed through to the email-generation service. Never
/// interpreted locally.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
  IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Tone {
  #[default]
  Professional,
  Casual,
  Friendly,
  Funny,
  Formal,
  Enthusiastic,
}

// ─── Content ─────────────────────────────────────────────────────────────────

/// The canonical subject/body pair. Both fields are always present, possibly
/// empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailContent {
  pub subject: String,
  pub body:    String,
}

impl EmailContent {
  pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
    Self { subject: subject.into(), body: body.into() }
  }

  /// The "no draft yet" state.
  pub fn is_empty(&self) -> bool { self.subject.is_empty() && self.body.is_empty() }
}

// ─── Draft ───────────────────────────────────────────────────────────────────

/// A generated (and possibly user-edited) outreach email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailDraft {
  pub content: EmailContent,
  /// Tone requested at generation time; `None` for drafts loaded from rows
  /// written before tones were recorded.
  pub tone:    Option<Tone>,
  /// The upstream payload exactly as received, kept for audit and
  /// re-parsing. Replaced on regeneration, preserved across edits.
  pub raw:     Option<String>,
}

impl EmailDraft {
  /// A draft freshly decoded from a generation response.
  pub fn generated(content: EmailContent, tone: Tone, raw: String) -> Self {
    Self { content, tone: Some(tone), raw: Some(raw) }
  }

  /// The same draft with user-edited content.
  pub fn edited(&self, content: EmailContent) -> Self {
    Self { content, tone: self.tone, raw: self.raw.clone() }
  }
}

#[cfg(test)]
mod tests {
  use std::str::FromStr as _;

  use strum::IntoEnumIterator as _;

  use super::*;

  #[test]
  fn tone_parses_case_insensitively() {
    assert_eq!(Tone::from_str("Friendly").unwrap(), Tone::Friendly);
    assert_eq!(Tone::from_str("FORMAL").unwrap(), Tone::Formal);
    assert!(Tone::from_str("sarcastic").is_err());
  }

  #[test]
  fn tone_prints_wire_name() {
    let names: Vec<String> = Tone::iter().map(|t| t.to_string()).collect();
    assert_eq!(
      names,
      ["professional", "casual", "friendly", "funny", "formal", "enthusiastic"]
    );
    assert_eq!(serde_json::to_string(&Tone::Casual).unwrap(), "\"casual\"");
  }

  #[test]
  fn edit_keeps_raw_and_tone() {
    let draft = EmailDraft::generated(
      EmailContent::new("Hi", "Body"),
      Tone::Funny,
      "{\"x\":1}".into(),
    );
    let edited = draft.edited(EmailContent::new("Hello", "New body"));
    assert_eq!(edited.tone, Some(Tone::Funny));
    assert_eq!(edited.raw.as_deref(), Some("{\"x\":1}"));
    assert_eq!(edited.content.subject, "Hello");
  }
}
