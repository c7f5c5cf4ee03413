//! [`SqliteStore`]: the SQLite implementation of [`LeadStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;

use prospect_core::{
  draft::EmailDraft,
  lead::{Lead, LeadId, UserId},
  lifecycle::LeadRecord,
  store::LeadStore,
};

use crate::{
  Error,
  Result,
  encode::{LEAD_COLUMNS, RawLead, encode_draft, encode_dt},
  schema::SCHEMA,
};

/// Result of a guarded `UPDATE`, resolved inside the connection thread.
enum WriteOutcome {
  Written,
  Missing,
  AlreadySent,
  NoDraft,
}

impl WriteOutcome {
  fn into_result(self, id: &LeadId) -> Result<()> {
    match self {
      Self::Written => Ok(()),
      Self::Missing => Err(Error::LeadNotFound(id.clone())),
      Self::AlreadySent => Err(Error::AlreadySent(id.clone())),
      Self::NoDraft => Err(Error::NoDraft(id.clone())),
    }
  }
}

/// Explain why a guarded `UPDATE` touched no rows.
fn explain_no_update(
  conn: &rusqlite::Connection,
  id: &str,
  owner: &str,
) -> rusqlite::Result<WriteOutcome> {
  let row: Option<(bool, bool)> = conn
    .query_row(
      "SELECT email_sent, email_content IS NOT NULL FROM leads WHERE id = ?1 AND user_id = ?2",
      rusqlite::params![id, owner],
      |r| Ok((r.get(0)?, r.get(1)?)),
    )
    .optional()?;

  Ok(match row {
    None => WriteOutcome::Missing,
    Some((true, _)) => WriteOutcome::AlreadySent,
    Some((false, false)) => WriteOutcome::NoDraft,
    // Unreachable for a single writer; report as sent so the caller refetches.
    Some((false, true)) => WriteOutcome::AlreadySent,
  })
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A lead store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── LeadStore impl ──────────────────────────────────────────────────────────

impl LeadStore for SqliteStore {
  type Error = Error;

  async fn list_leads(&self, owner: &UserId) -> Result<Vec<LeadRecord>> {
    let owner_str = owner.as_str().to_owned();

    let raws: Vec<RawLead> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {LEAD_COLUMNS} FROM leads WHERE user_id = ?1 ORDER BY created_at, rowid"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![owner_str], RawLead::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawLead::into_record).collect()
  }

  async fn get_lead(&self, owner: &UserId, id: &LeadId) -> Result<Option<LeadRecord>> {
    let owner_str = owner.as_str().to_owned();
    let id_str    = id.as_str().to_owned();

    let raw: Option<RawLead> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {LEAD_COLUMNS} FROM leads WHERE id = ?1 AND user_id = ?2"),
            rusqlite::params![id_str, owner_str],
            RawLead::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawLead::into_record).transpose()
  }

  async fn insert_leads(&self, owner: &UserId, leads: Vec<Lead>) -> Result<Vec<LeadRecord>> {
    let owner_str  = owner.as_str().to_owned();
    let created_at = Utc::now();
    let at_str     = encode_dt(created_at);

    let inserted: Vec<Lead> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut inserted = Vec::with_capacity(leads.len());
        {
          let mut stmt = tx.prepare(
            "INSERT INTO leads (
               id, user_id, name, title, company, location, email,
               linkedin_url, snippet, company_domain, image_url,
               created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)
             ON CONFLICT (id, user_id) DO NOTHING",
          )?;
          for lead in leads {
            let changed = stmt.execute(rusqlite::params![
              lead.id.as_str(),
              owner_str,
              lead.name,
              lead.title,
              lead.company,
              lead.location,
              lead.email,
              lead.linkedin_url,
              lead.snippet,
              lead.company_domain,
              lead.image_url,
              at_str,
            ])?;
            if changed == 1 {
              inserted.push(lead);
            }
          }
        }
        tx.commit()?;
        Ok(inserted)
      })
      .await?;

    Ok(
      inserted
        .into_iter()
        .map(|lead| LeadRecord::new(lead, owner.clone(), created_at))
        .collect(),
    )
  }

  async fn save_draft(&self, owner: &UserId, id: &LeadId, draft: &EmailDraft) -> Result<()> {
    let columns   = encode_draft(draft)?;
    let owner_str = owner.as_str().to_owned();
    let id_str    = id.as_str().to_owned();
    let at_str    = encode_dt(Utc::now());

    let outcome = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE leads
           SET email_content = ?1, email_raw = ?2, email_tone = ?3, updated_at = ?4
           WHERE id = ?5 AND user_id = ?6 AND email_sent = 0",
          rusqlite::params![
            columns.content,
            columns.raw,
            columns.tone,
            at_str,
            id_str,
            owner_str,
          ],
        )?;
        if changed == 1 {
          return Ok(WriteOutcome::Written);
        }
        Ok(explain_no_update(conn, &id_str, &owner_str)?)
      })
      .await?;

    outcome.into_result(id)
  }

  async fn mark_sent(&self, owner: &UserId, id: &LeadId, at: DateTime<Utc>) -> Result<()> {
    let owner_str = owner.as_str().to_owned();
    let id_str    = id.as_str().to_owned();
    let at_str    = encode_dt(at);

    // Flag and timestamp change in one statement; the table's CHECK
    // constraint rejects any row where they disagree.
    let outcome = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE leads
           SET email_sent = 1, sent_at = ?1, updated_at = ?1
           WHERE id = ?2 AND user_id = ?3
             AND email_sent = 0 AND email_content IS NOT NULL",
          rusqlite::params![at_str, id_str, owner_str],
        )?;
        if changed == 1 {
          return Ok(WriteOutcome::Written);
        }
        Ok(explain_no_update(conn, &id_str, &owner_str)?)
      })
      .await?;

    outcome.into_result(id)
  }

  async fn delete_lead(&self, owner: &UserId, id: &LeadId) -> Result<bool> {
    let owner_str = owner.as_str().to_owned();
    let id_str    = id.as_str().to_owned();

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM leads WHERE id = ?1 AND user_id = ?2",
          rusqlite::params![id_str, owner_str],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }
}
