//! [`LeadSession`]: the owner-scoped lead cache and its lifecycle actions.
//!
//! The cache holds `Arc<LeadRecord>`s. A transition never mutates a record in
//! place: it builds the next record and swaps the `Arc`, so a snapshot taken
//! by a view stays internally consistent.
//!
//! Concurrency rules, per lead:
//! - at most one action (generate, save or send) is in flight;
//! - an edit may supersede a generation that is still waiting on the remote;
//!   every generate, edit and send bumps a version counter, and a generation
//!   result is only applied if its version is still current;
//! - once a draft write has started, nothing else may touch the lead until it
//!   lands in both the store and the cache;
//! - edits and regenerations are refused while a send is in flight or after
//!   the email was sent.

use std::{
  collections::HashMap,
  future::Future,
  sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use chrono::{DateTime, Utc};
use prospect_core::{
  codec,
  draft::{EmailContent, EmailDraft, Tone},
  lead::{LeadId, UserId},
  lifecycle::LeadRecord,
  remote::{EmailRequest, LeadBrief, LeadSearch, RemoteActions, SendRequest},
  store::LeadStore,
};
use serde::Serialize;
use strum::Display;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::{
  error::{Result, SessionError},
  events::{EVENT_CAPACITY, SessionEvent},
};

// ─── Supporting types ────────────────────────────────────────────────────────

/// The action currently running for a lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum Pending {
  #[strum(to_string = "generating an email")]
  Generating,
  #[strum(to_string = "saving the draft")]
  Saving,
  #[strum(to_string = "sending")]
  Sending,
}

/// Proof that the user explicitly confirmed one send. A send is never
/// repeated without a fresh confirmation.
#[derive(Debug)]
pub struct SendConfirmation(());

impl SendConfirmation {
  pub fn user_confirmed() -> Self { Self(()) }
}

/// An in-flight marker, owned by the action that started at `version`.
#[derive(Debug, Clone, Copy)]
struct Flight {
  pending: Pending,
  version: u64,
}

#[derive(Default)]
struct SessionState {
  leads:      Vec<Arc<LeadRecord>>,
  in_flight:  HashMap<LeadId, Flight>,
  versions:   HashMap<LeadId, u64>,
  /// Sends the remote accepted but the store failed to record.
  unrecorded: HashMap<LeadId, DateTime<Utc>>,
}

impl SessionState {
  fn find(&self, id: &LeadId) -> Result<Arc<LeadRecord>> {
    self
      .leads
      .iter()
      .find(|r| &r.lead.id == id)
      .cloned()
      .ok_or_else(|| SessionError::LeadNotFound(id.clone()))
  }

  /// Swap in the next version of a record, keeping its position.
  fn replace(&mut self, record: LeadRecord) -> Arc<LeadRecord> {
    let record = Arc::new(record);
    match self.leads.iter_mut().find(|r| r.lead.id == record.lead.id) {
      Some(slot) => *slot = Arc::clone(&record),
      None => self.leads.push(Arc::clone(&record)),
    }
    record
  }

  fn version(&self, id: &LeadId) -> u64 { self.versions.get(id).copied().unwrap_or(0) }

  fn bump(&mut self, id: &LeadId) -> u64 {
    let v = self.versions.entry(id.clone()).or_insert(0);
    *v += 1;
    *v
  }

  fn ensure_idle(&self, id: &LeadId) -> Result<()> {
    match self.in_flight.get(id) {
      Some(flight) => Err(SessionError::InFlight { id: id.clone(), pending: flight.pending }),
      None => Ok(()),
    }
  }

  fn start(&mut self, id: &LeadId, pending: Pending, version: u64) {
    self.in_flight.insert(id.clone(), Flight { pending, version });
  }
}

/// Clears a lead's in-flight marker when the action finishes, however it
/// finishes. A marker taken over by a newer action is left alone.
struct FlightGuard<'a> {
  state:   &'a Mutex<SessionState>,
  id:      LeadId,
  version: u64,
}

impl Drop for FlightGuard<'_> {
  fn drop(&mut self) {
    let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
    if state.in_flight.get(&self.id).is_some_and(|f| f.version == self.version) {
      state.in_flight.remove(&self.id);
    }
  }
}

// ─── Session ─────────────────────────────────────────────────────────────────

/// One user's leads and the actions available on them.
///
/// Share it behind an `Arc`; every method takes `&self`.
pub struct LeadSession<S, G> {
  user:   UserId,
  store:  Arc<S>,
  remote: Arc<G>,
  state:  Mutex<SessionState>,
  events: broadcast::Sender<SessionEvent>,
  cancel: CancellationToken,
}

impl<S, G> LeadSession<S, G>
where
  S: LeadStore,
  G: RemoteActions,
{
  /// An empty session. Call [`load`](Self::load) to fill the cache.
  pub fn new(user: UserId, store: Arc<S>, remote: Arc<G>) -> Self {
    let (events, _) = broadcast::channel(EVENT_CAPACITY);
    Self {
      user,
      store,
      remote,
      state: Mutex::new(SessionState::default()),
      events,
      cancel: CancellationToken::new(),
    }
  }

  pub fn user(&self) -> &UserId { &self.user }

  fn state(&self) -> MutexGuard<'_, SessionState> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn emit(&self, event: SessionEvent) {
    // No subscribers is fine.
    let _ = self.events.send(event);
  }

  /// Publish a failure so views that did not trigger the action hear about it.
  fn report<T>(&self, id: Option<&LeadId>, result: Result<T>) -> Result<T> {
    if let Err(e) = &result {
      tracing::warn!(user = %self.user, lead = ?id.map(LeadId::as_str), error = %e, "action failed");
      self.emit(SessionEvent::ActionFailed { id: id.cloned(), message: e.to_string() });
    }
    result
  }

  /// Run a remote call unless the session is torn down first.
  async fn remote_call<T, E, F>(&self, call: F) -> Result<T>
  where
    F: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
  {
    tokio::select! {
      biased;
      () = self.cancel.cancelled() => Err(SessionError::Cancelled),
      result = call => result.map_err(|e| SessionError::RemoteActionFailed(e.to_string())),
    }
  }

  // ── Observation ───────────────────────────────────────────────────────────

  pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> { self.events.subscribe() }

  /// Snapshot of the cache, oldest first.
  pub fn leads(&self) -> Vec<Arc<LeadRecord>> { self.state().leads.clone() }

  pub fn lead(&self, id: &LeadId) -> Option<Arc<LeadRecord>> { self.state().find(id).ok() }

  /// The action currently in flight for `id`, if any. Views disable the
  /// matching controls while this is `Some`.
  pub fn pending(&self, id: &LeadId) -> Option<Pending> {
    self.state().in_flight.get(id).map(|f| f.pending)
  }

  /// Nothing is running and every send has been recorded, so the session
  /// can be dropped and rebuilt from the store without losing anything.
  pub fn is_idle(&self) -> bool {
    let state = self.state();
    state.in_flight.is_empty() && state.unrecorded.is_empty()
  }

  // ── Teardown ──────────────────────────────────────────────────────────────

  /// Cancel every in-flight remote call. Cancelled actions change nothing.
  pub fn close(&self) { self.cancel.cancel(); }

  pub fn is_closed(&self) -> bool { self.cancel.is_cancelled() }

  // ── Loading ───────────────────────────────────────────────────────────────

  /// Replace the cache with the store's current rows.
  ///
  /// A lead whose send the store failed to record stays sent in the cache,
  /// and the write is retried first.
  pub async fn load(&self) -> Result<usize> {
    self.record_missed_sends().await;
    let records = self.store.list_leads(&self.user).await.map_err(SessionError::store)?;
    let count = records.len();
    {
      let mut state = self.state();
      let mut leads = Vec::with_capacity(count);
      for record in records {
        let id = record.lead.id.clone();
        if record.is_sent() {
          state.unrecorded.remove(&id);
        }
        match state.find(&id) {
          Ok(cached) if state.unrecorded.contains_key(&id) => leads.push(cached),
          _ => leads.push(Arc::new(record)),
        }
      }
      state.leads = leads;
    }
    self.emit(SessionEvent::Reloaded { count });
    Ok(count)
  }

  async fn record_missed_sends(&self) {
    let missed: Vec<(LeadId, DateTime<Utc>)> =
      self.state().unrecorded.iter().map(|(id, at)| (id.clone(), *at)).collect();
    for (id, at) in missed {
      match self.store.mark_sent(&self.user, &id, at).await {
        Ok(()) => {
          self.state().unrecorded.remove(&id);
          tracing::info!(user = %self.user, lead = %id, "earlier send recorded");
        }
        Err(e) => {
          tracing::warn!(user = %self.user, lead = %id, error = %e, "send still not recorded");
        }
      }
    }
  }

  // ── Lead generation ───────────────────────────────────────────────────────

  /// Search for new leads and add them to the collection.
  ///
  /// On success the cache is reconciled with the store on a best-effort
  /// basis; a failed reload is logged, not returned.
  pub async fn generate_leads(&self, criteria: &str, lead_count: u32) -> Result<Vec<LeadId>> {
    let result = self.try_generate_leads(criteria, lead_count).await;
    self.report(None, result)
  }

  async fn try_generate_leads(&self, criteria: &str, lead_count: u32) -> Result<Vec<LeadId>> {
    let search = LeadSearch::new(criteria, lead_count, self.user.clone())?;
    let leads = self.remote_call(self.remote.generate_leads(&search)).await?;
    let inserted = self
      .store
      .insert_leads(&self.user, leads)
      .await
      .map_err(SessionError::store)?;

    let ids: Vec<LeadId> = inserted.iter().map(|r| r.lead.id.clone()).collect();
    {
      let mut state = self.state();
      for record in inserted {
        state.replace(record);
      }
    }
    tracing::info!(user = %self.user, added = ids.len(), "leads added");
    self.emit(SessionEvent::LeadsGenerated { ids: ids.clone() });

    if let Err(e) = self.load().await {
      tracing::warn!(user = %self.user, error = %e, "reload after lead generation failed");
    }
    Ok(ids)
  }

  // ── Email generation ──────────────────────────────────────────────────────

  /// Generate (or regenerate) the draft for a lead.
  pub async fn generate_email(&self, id: &LeadId, tone: Tone) -> Result<Arc<LeadRecord>> {
    let result = self.try_generate_email(id, tone).await;
    self.report(Some(id), result)
  }

  async fn try_generate_email(&self, id: &LeadId, tone: Tone) -> Result<Arc<LeadRecord>> {
    let (record, version, _guard) = {
      let mut state = self.state();
      let record = state.find(id)?;
      if record.is_sent() {
        return Err(SessionError::AlreadySent(id.clone()));
      }
      state.ensure_idle(id)?;
      let version = state.bump(id);
      state.start(id, Pending::Generating, version);
      (record, version, FlightGuard { state: &self.state, id: id.clone(), version })
    };

    let request = EmailRequest {
      lead: LeadBrief::from(&record.lead),
      tone,
      user: self.user.clone(),
    };
    let raw = self.remote_call(self.remote.generate_email(&request)).await?;

    let decoded = codec::decode(&raw, record.lead.company_name());
    if decoded.content.is_empty() {
      return Err(SessionError::RemoteActionFailed(
        "email generation returned an empty response".into(),
      ));
    }
    if decoded.shape.is_degraded() {
      tracing::warn!(lead = %id, shape = ?decoded.shape, "email response matched no known shape");
    }

    let next = {
      let mut state = self.state();
      if state.version(id) != version {
        return Err(SessionError::Superseded(id.clone()));
      }
      let next = state.find(id)?.with_draft(EmailDraft::generated(decoded.content, tone, raw))?;
      // From here on an edit can no longer supersede this result.
      state.start(id, Pending::Saving, version);
      next
    };
    self.persist_draft(next).await
  }

  /// Save user edits over the current draft.
  pub async fn save_edit(&self, id: &LeadId, content: EmailContent) -> Result<Arc<LeadRecord>> {
    let result = self.try_save_edit(id, content).await;
    self.report(Some(id), result)
  }

  async fn try_save_edit(&self, id: &LeadId, content: EmailContent) -> Result<Arc<LeadRecord>> {
    let (next, _guard) = {
      let mut state = self.state();
      let record = state.find(id)?;
      // Supersedes a generation still waiting on the remote, nothing else.
      if let Some(flight) = state.in_flight.get(id)
        && flight.pending != Pending::Generating
      {
        return Err(SessionError::InFlight { id: id.clone(), pending: flight.pending });
      }
      let next = record.with_edit(content)?;
      let version = state.bump(id);
      state.start(id, Pending::Saving, version);
      (next, FlightGuard { state: &self.state, id: id.clone(), version })
    };
    self.persist_draft(next).await
  }

  /// Write a record's draft through to the store, then publish it.
  ///
  /// The caller holds the lead's `Saving` marker, so no other action can
  /// change the lead between the two writes.
  async fn persist_draft(&self, next: LeadRecord) -> Result<Arc<LeadRecord>> {
    let id = next.lead.id.clone();
    let Some(draft) = &next.draft else {
      return Err(SessionError::NoDraft(id));
    };
    self
      .store
      .save_draft(&self.user, &id, draft)
      .await
      .map_err(SessionError::store)?;

    let published = self.state().replace(next);
    tracing::info!(user = %self.user, lead = %id, "draft saved");
    self.emit(SessionEvent::DraftUpdated { id });
    Ok(published)
  }

  // ── Sending ───────────────────────────────────────────────────────────────

  /// Send the current draft. Terminal on success; on failure the lead stays
  /// in `EmailGenerated` and a new confirmed send may be attempted.
  pub async fn send_email(
    &self,
    id: &LeadId,
    confirmation: SendConfirmation,
  ) -> Result<Arc<LeadRecord>> {
    let result = self.try_send_email(id, confirmation).await;
    self.report(Some(id), result)
  }

  async fn try_send_email(
    &self,
    id: &LeadId,
    SendConfirmation(()): SendConfirmation,
  ) -> Result<Arc<LeadRecord>> {
    let (request, _guard) = {
      let mut state = self.state();
      let record = state.find(id)?;
      if record.is_sent() {
        return Err(SessionError::AlreadySent(id.clone()));
      }
      let Some(draft) = &record.draft else {
        return Err(SessionError::NoDraft(id.clone()));
      };
      state.ensure_idle(id)?;
      let request = SendRequest::new(&record.lead, draft.content.clone(), self.user.clone())?;
      let version = state.bump(id);
      state.start(id, Pending::Sending, version);
      (request, FlightGuard { state: &self.state, id: id.clone(), version })
    };

    self.remote_call(self.remote.send_email(&request)).await?;

    let at = Utc::now();
    // The email is out; the cache must say so even if the write fails, or
    // the user could send it twice.
    let published = {
      let mut state = self.state();
      let next = state.find(id)?.mark_sent(at)?;
      state.replace(next)
    };
    self.emit(SessionEvent::EmailSent { id: id.clone() });

    if let Err(e) = self.store.mark_sent(&self.user, id, at).await {
      tracing::error!(user = %self.user, lead = %id, error = %e, "email sent but not recorded");
      self.state().unrecorded.insert(id.clone(), at);
      return Err(SessionError::store(e));
    }
    Ok(published)
  }

  // ── Deletion ──────────────────────────────────────────────────────────────

  /// Delete a lead and its draft.
  pub async fn delete_lead(&self, id: &LeadId) -> Result<()> {
    let result = self.try_delete_lead(id).await;
    self.report(Some(id), result)
  }

  async fn try_delete_lead(&self, id: &LeadId) -> Result<()> {
    {
      let state = self.state();
      state.find(id)?;
      state.ensure_idle(id)?;
    }
    if !self
      .store
      .delete_lead(&self.user, id)
      .await
      .map_err(SessionError::store)?
    {
      return Err(SessionError::LeadNotFound(id.clone()));
    }
    {
      let mut state = self.state();
      state.leads.retain(|r| &r.lead.id != id);
      state.versions.remove(id);
      state.unrecorded.remove(id);
    }
    self.emit(SessionEvent::LeadDeleted { id: id.clone() });
    Ok(())
  }
}
