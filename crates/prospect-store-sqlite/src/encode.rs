//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings. Draft content is the canonical JSON
//! object produced by [`prospect_core::codec::encode`].

use std::str::FromStr as _;

use chrono::{DateTime, Utc};
use prospect_core::{
  codec,
  draft::{EmailDraft, Tone},
  lead::{Lead, LeadId, UserId},
  lifecycle::LeadRecord,
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Tone ────────────────────────────────────────────────────────────────────

pub fn encode_tone(tone: Tone) -> &'static str { tone.into() }

pub fn decode_tone(s: &str) -> Result<Tone> {
  Tone::from_str(s).map_err(|_| Error::UnknownTone(s.to_owned()))
}

// ─── Draft columns ───────────────────────────────────────────────────────────

/// `(email_content, email_raw, email_tone)` for a draft.
pub struct DraftColumns {
  pub content: String,
  pub raw:     Option<String>,
  pub tone:    Option<&'static str>,
}

pub fn encode_draft(draft: &EmailDraft) -> Result<DraftColumns> {
  Ok(DraftColumns {
    content: codec::encode(&draft.content)?,
    raw:     draft.raw.clone(),
    tone:    draft.tone.map(encode_tone),
  })
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list shared by every `SELECT` that produces a [`RawLead`].
pub const LEAD_COLUMNS: &str = "id, user_id, name, title, company, location, email, \
   linkedin_url, snippet, company_domain, image_url, email_content, email_raw, \
   email_tone, email_sent, sent_at, created_at";

/// Raw values read directly from a `leads` row.
pub struct RawLead {
  pub id:             String,
  pub user_id:        String,
  pub name:           String,
  pub title:          String,
  pub company:        String,
  pub location:       Option<String>,
  pub email:          String,
  pub linkedin_url:   Option<String>,
  pub snippet:        Option<String>,
  pub company_domain: Option<String>,
  pub image_url:      Option<String>,
  pub email_content:  Option<String>,
  pub email_raw:      Option<String>,
  pub email_tone:     Option<String>,
  pub email_sent:     bool,
  pub sent_at:        Option<String>,
  pub created_at:     String,
}

impl RawLead {
  /// Map a row selected with [`LEAD_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:             row.get(0)?,
      user_id:        row.get(1)?,
      name:           row.get(2)?,
      title:          row.get(3)?,
      company:        row.get(4)?,
      location:       row.get(5)?,
      email:          row.get(6)?,
      linkedin_url:   row.get(7)?,
      snippet:        row.get(8)?,
      company_domain: row.get(9)?,
      image_url:      row.get(10)?,
      email_content:  row.get(11)?,
      email_raw:      row.get(12)?,
      email_tone:     row.get(13)?,
      email_sent:     row.get(14)?,
      sent_at:        row.get(15)?,
      created_at:     row.get(16)?,
    })
  }

  pub fn into_record(self) -> Result<LeadRecord> {
    let lead = Lead {
      id:             LeadId::new(self.id),
      name:           self.name,
      title:          self.title,
      company:        self.company,
      location:       self.location,
      email:          self.email,
      linkedin_url:   self.linkedin_url,
      snippet:        self.snippet,
      company_domain: self.company_domain,
      image_url:      self.image_url,
    };

    // Rows written by older clients may hold any upstream shape; the codec
    // normalises them on read.
    let draft = match self.email_content.as_deref().filter(|c| !c.trim().is_empty()) {
      Some(stored) => {
        let decoded = codec::decode(stored, lead.company_name());
        if decoded.shape.is_degraded() {
          tracing::warn!(lead = %lead.id, shape = ?decoded.shape, "stored draft is not canonical");
        }
        Some(EmailDraft {
          content: decoded.content,
          tone:    self.email_tone.as_deref().map(decode_tone).transpose()?,
          raw:     self.email_raw,
        })
      }
      None => None,
    };

    let sent_at = match (self.email_sent, self.sent_at.as_deref()) {
      (true, Some(at)) => Some(decode_dt(at)?),
      _ => None,
    };

    Ok(LeadRecord {
      lead,
      owner: UserId::new(self.user_id),
      draft,
      sent_at,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn tone_roundtrips_through_column_text() {
    assert_eq!(encode_tone(Tone::Enthusiastic), "enthusiastic");
    assert_eq!(decode_tone("enthusiastic").unwrap(), Tone::Enthusiastic);
    assert!(matches!(decode_tone("grumpy"), Err(Error::UnknownTone(_))));
  }

  #[test]
  fn bad_timestamp_is_reported() {
    assert!(matches!(decode_dt("yesterday"), Err(Error::DateParse(_))));
  }
}
