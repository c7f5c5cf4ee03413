//! Email content codec.
//!
//! The email-generation service is not stable in its response envelope. This
//! module turns whatever it returned into an [`EmailContent`] and writes edits
//! back in exactly one canonical shape:
//!
//! ```json
//! {"Subject Line": "...", "Email Body": "..."}
//! ```
//!
//! Decoding tries an ordered list of matchers and takes the first hit. The
//! JSON matchers are, in order:
//!
//! 1. `[{"output": {"Subject Line": .., "Email Body": ..}}, ..]`
//! 2. `{"Subject Line": .., "Email Body": ..}`
//! 3. `{"subject": .., "body": ..}` (legacy)
//! 4. `[{"Subject Line": .., "Email Body": ..}, ..]`
//!
//! Anything else falls through to labeled-text extraction, and finally to a
//! synthesized subject with the whole text as body. Decoding never fails.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::{Result, draft::EmailContent};

/// Subject key of the canonical persisted shape.
pub const SUBJECT_KEY: &str = "Subject Line";
/// Body key of the canonical persisted shape.
pub const BODY_KEY: &str = "Email Body";
/// Subject used for unlabeled text when the lead's company is unknown.
pub const FALLBACK_SUBJECT: &str = "Following up";

// ─── Shapes ──────────────────────────────────────────────────────────────────

/// Which matcher produced a decoded result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodedShape {
  /// Array whose first element wraps the canonical keys in `output`.
  OutputWrapped,
  /// Bare object with the canonical keys.
  Canonical,
  /// Bare object with `subject`/`body` keys.
  Legacy,
  /// Array whose first element has the canonical keys.
  BareArray,
  /// Plain text with both a subject label and a body label.
  Labeled,
  /// Plain text with a subject label only; the rest is the body.
  SubjectOnly,
  /// No recognisable structure; subject synthesized, whole text is the body.
  Unlabeled,
  /// Empty input: no draft yet.
  Empty,
}

impl DecodedShape {
  /// `true` when the payload matched none of the known envelopes and the
  /// result was reconstructed from loose text.
  pub fn is_degraded(self) -> bool { matches!(self, Self::SubjectOnly | Self::Unlabeled) }
}

/// A decoded payload together with the shape it was recognised as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedEmail {
  pub content: EmailContent,
  pub shape:   DecodedShape,
}

type Matcher = fn(&Value) -> Option<EmailContent>;

/// JSON matchers in priority order. Each is total and side-effect free.
const JSON_MATCHERS: [(DecodedShape, Matcher); 4] = [
  (DecodedShape::OutputWrapped, match_output_wrapped),
  (DecodedShape::Canonical, match_canonical),
  (DecodedShape::Legacy, match_legacy),
  (DecodedShape::BareArray, match_bare_array),
];

fn text_field(obj: &Value, key: &str) -> Option<String> {
  match obj.get(key)? {
    Value::String(s) => Some(s.clone()),
    Value::Number(n) => Some(n.to_string()),
    Value::Bool(b) => Some(b.to_string()),
    _ => None,
  }
}

fn pair(obj: &Value, subject_key: &str, body_key: &str) -> Option<EmailContent> {
  Some(EmailContent {
    subject: text_field(obj, subject_key)?,
    body:    text_field(obj, body_key)?,
  })
}

fn match_output_wrapped(value: &Value) -> Option<EmailContent> {
  let output = value.as_array()?.first()?.get("output")?;
  pair(output, SUBJECT_KEY, BODY_KEY)
}

fn match_canonical(value: &Value) -> Option<EmailContent> {
  pair(value, SUBJECT_KEY, BODY_KEY)
}

fn match_legacy(value: &Value) -> Option<EmailContent> { pair(value, "subject", "body") }

fn match_bare_array(value: &Value) -> Option<EmailContent> {
  pair(value.as_array()?.first()?, SUBJECT_KEY, BODY_KEY)
}

// ─── Text extraction ─────────────────────────────────────────────────────────

static SUBJECT_LINE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?im)^[ \t]*(?:subject line|subject)[ \t]*:[ \t]*(.*)$")
    .expect("subject pattern is valid")
});

static BODY_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(
    r"(?is)(?:\A|\n)[ \t]*(?:email body|body)[ \t]*:[ \t]*(.*?)(?:\r?\n[ \t]*\r?\n|\z)",
  )
  .expect("body pattern is valid")
});

fn decode_text(text: &str, company: Option<&str>) -> DecodedEmail {
  let text = text.trim();

  let Some(subject_match) = SUBJECT_LINE.captures(text) else {
    let subject = match company.map(str::trim).filter(|c| !c.is_empty()) {
      Some(company) => format!("Regarding {company}"),
      None => FALLBACK_SUBJECT.to_owned(),
    };
    return DecodedEmail {
      content: EmailContent { subject, body: text.to_owned() },
      shape:   DecodedShape::Unlabeled,
    };
  };

  let subject = subject_match
    .get(1)
    .map(|m| m.as_str().trim().to_owned())
    .unwrap_or_default();

  if let Some(body) = BODY_BLOCK.captures(text).and_then(|c| c.get(1)) {
    return DecodedEmail {
      content: EmailContent { subject, body: body.as_str().trim().to_owned() },
      shape:   DecodedShape::Labeled,
    };
  }

  // Whole match ends at the end of the subject line.
  let line_end = subject_match.get(0).map_or(text.len(), |m| m.end());
  DecodedEmail {
    content: EmailContent { subject, body: text[line_end..].trim().to_owned() },
    shape:   DecodedShape::SubjectOnly,
  }
}

// ─── Public API ──────────────────────────────────────────────────────────────

/// Decode an upstream or persisted payload into canonical content.
///
/// `company` feeds the synthesized subject when the payload carries no
/// subject at all. Empty input yields empty content with
/// [`DecodedShape::Empty`].
pub fn decode(raw: &str, company: Option<&str>) -> DecodedEmail {
  if raw.trim().is_empty() {
    return DecodedEmail { content: EmailContent::default(), shape: DecodedShape::Empty };
  }

  match serde_json::from_str::<Value>(raw) {
    Ok(Value::String(inner)) => decode_text(&inner, company),
    Ok(value) => JSON_MATCHERS
      .iter()
      .find_map(|(shape, matcher)| {
        matcher(&value).map(|content| DecodedEmail { content, shape: *shape })
      })
      .unwrap_or_else(|| decode_text(raw, company)),
    Err(_) => decode_text(raw, company),
  }
}

#[derive(Serialize)]
struct CanonicalDraft<'a> {
  #[serde(rename = "Subject Line")]
  subject: &'a str,
  #[serde(rename = "Email Body")]
  body:    &'a str,
}

/// Serialise content into the canonical two-key JSON object.
pub fn encode(content: &EmailContent) -> Result<String> {
  Ok(serde_json::to_string(&CanonicalDraft {
    subject: &content.subject,
    body:    &content.body,
  })?)
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn content(subject: &str, body: &str) -> EmailContent { EmailContent::new(subject, body) }

  #[test]
  fn output_wrapped_array() {
    let raw = json!([{ "output": { "Subject Line": "Hi Alice", "Email Body": "Let's talk." } }])
      .to_string();
    let decoded = decode(&raw, Some("Acme"));
    assert_eq!(decoded.shape, DecodedShape::OutputWrapped);
    assert_eq!(decoded.content, content("Hi Alice", "Let's talk."));
  }

  #[test]
  fn canonical_object() {
    let raw = json!({ "Subject Line": "Quick idea", "Email Body": "Line one\n\nLine two" })
      .to_string();
    let decoded = decode(&raw, None);
    assert_eq!(decoded.shape, DecodedShape::Canonical);
    assert_eq!(decoded.content, content("Quick idea", "Line one\n\nLine two"));
  }

  #[test]
  fn legacy_object() {
    let raw = json!({ "subject": "Old shape", "body": "Still works" }).to_string();
    let decoded = decode(&raw, None);
    assert_eq!(decoded.shape, DecodedShape::Legacy);
    assert_eq!(decoded.content, content("Old shape", "Still works"));
  }

  #[test]
  fn bare_array() {
    let raw = json!([{ "Subject Line": "From a list", "Email Body": "First element" }]).to_string();
    let decoded = decode(&raw, None);
    assert_eq!(decoded.shape, DecodedShape::BareArray);
    assert_eq!(decoded.content, content("From a list", "First element"));
  }

  #[test]
  fn canonical_keys_win_over_legacy_keys() {
    let raw = json!({
      "Subject Line": "new", "Email Body": "new body",
      "subject": "old", "body": "old body",
    })
    .to_string();
    assert_eq!(decode(&raw, None).content, content("new", "new body"));
  }

  #[test]
  fn labeled_text() {
    let raw = "Subject Line: Partnership with Acme\nEmail Body: Hi Alice,\nI saw your post.\n\nSent from my phone";
    let decoded = decode(raw, Some("Acme"));
    assert_eq!(decoded.shape, DecodedShape::Labeled);
    assert_eq!(
      decoded.content,
      content("Partnership with Acme", "Hi Alice,\nI saw your post.")
    );
  }

  #[test]
  fn labeled_text_is_case_insensitive() {
    let decoded = decode("SUBJECT: hello\nbody: world", None);
    assert_eq!(decoded.shape, DecodedShape::Labeled);
    assert_eq!(decoded.content, content("hello", "world"));
  }

  #[test]
  fn subject_without_body_label_takes_the_rest() {
    let decoded = decode("Intro text\nSubject: Coffee?\nHi Bob,\n\nAre you free Friday?", None);
    assert_eq!(decoded.shape, DecodedShape::SubjectOnly);
    assert!(decoded.shape.is_degraded());
    assert_eq!(decoded.content, content("Coffee?", "Hi Bob,\n\nAre you free Friday?"));
  }

  #[test]
  fn free_text_uses_company_subject() {
    let decoded = decode("Just free text, no labels", Some("Acme"));
    assert_eq!(decoded.shape, DecodedShape::Unlabeled);
    assert_eq!(decoded.content, content("Regarding Acme", "Just free text, no labels"));
  }

  #[test]
  fn free_text_without_company_uses_fallback_subject() {
    let decoded = decode("Hello there", Some("  "));
    assert_eq!(decoded.content, content(FALLBACK_SUBJECT, "Hello there"));
  }

  #[test]
  fn unmatched_json_object_degrades_to_whole_text() {
    let raw = r#"{"error":"quota"}"#;
    let decoded = decode(raw, Some("Beta"));
    assert_eq!(decoded.shape, DecodedShape::Unlabeled);
    assert_eq!(decoded.content, content("Regarding Beta", raw));
  }

  #[test]
  fn json_string_payload_is_unwrapped() {
    let raw = json!("Subject: Hey\nBody: There").to_string();
    assert_eq!(decode(&raw, None).content, content("Hey", "There"));
  }

  #[test]
  fn empty_input_is_no_draft() {
    for raw in ["", "   \n"] {
      let decoded = decode(raw, Some("Acme"));
      assert_eq!(decoded.shape, DecodedShape::Empty);
      assert!(decoded.content.is_empty());
    }
  }

  #[test]
  fn encode_uses_canonical_keys_only() {
    let encoded = encode(&content("S", "B")).unwrap();
    let value: Value = serde_json::from_str(&encoded).unwrap();
    assert_eq!(value, json!({ "Subject Line": "S", "Email Body": "B" }));
  }

  #[test]
  fn reencoding_is_idempotent_for_every_known_shape() {
    let payloads = [
      json!([{ "output": { "Subject Line": "a", "Email Body": "b" } }]).to_string(),
      json!({ "Subject Line": "c", "Email Body": "d" }).to_string(),
      json!({ "subject": "e", "body": "f" }).to_string(),
      json!([{ "Subject Line": "g", "Email Body": "h" }]).to_string(),
      "Subject: i\nBody: j".to_owned(),
    ];
    for raw in payloads {
      let first = decode(&raw, Some("Acme")).content;
      let again = decode(&encode(&first).unwrap(), Some("Acme"));
      assert_eq!(again.shape, DecodedShape::Canonical, "payload {raw}");
      assert_eq!(again.content, first, "payload {raw}");
    }
  }
}
