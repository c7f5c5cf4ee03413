//! One [`LeadSession`] per user, created on first use and dropped again once
//! it has sat idle for the configured time.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex, MutexGuard, PoisonError},
  time::{Duration, Instant},
};

use prospect_core::{lead::UserId, remote::RemoteActions, store::LeadStore};
use prospect_session::{LeadSession, SessionError};

struct Entry<S, G> {
  session:   Arc<LeadSession<S, G>>,
  last_used: Instant,
}

pub struct SessionRegistry<S, G> {
  store:      Arc<S>,
  remote:     Arc<G>,
  idle_after: Duration,
  sessions:   Mutex<HashMap<UserId, Entry<S, G>>>,
}

impl<S, G> SessionRegistry<S, G>
where
  S: LeadStore,
  G: RemoteActions,
{
  pub fn new(store: Arc<S>, remote: Arc<G>, idle_after: Duration) -> Self {
    Self { store, remote, idle_after, sessions: Mutex::new(HashMap::new()) }
  }

  fn sessions(&self) -> MutexGuard<'_, HashMap<UserId, Entry<S, G>>> {
    self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// The session for `user`, loading it from the store the first time.
  pub async fn session(&self, user: &UserId) -> Result<Arc<LeadSession<S, G>>, SessionError> {
    if let Some(entry) = self.sessions().get_mut(user) {
      entry.last_used = Instant::now();
      return Ok(Arc::clone(&entry.session));
    }

    let session = Arc::new(LeadSession::new(
      user.clone(),
      Arc::clone(&self.store),
      Arc::clone(&self.remote),
    ));
    let count = session.load().await?;
    tracing::debug!(%user, count, "session opened");

    // A concurrent first request may have won the race; keep its session.
    let mut sessions = self.sessions();
    let entry = sessions
      .entry(user.clone())
      .or_insert(Entry { session, last_used: Instant::now() });
    Ok(Arc::clone(&entry.session))
  }

  pub fn open_sessions(&self) -> usize { self.sessions().len() }

  /// Drop sessions unused for longer than the idle timeout. A session stays
  /// while a request still holds it, an action is running, or one of its
  /// sends has not reached the store yet. Returns how many were dropped.
  pub fn evict_idle(&self) -> usize {
    let mut sessions = self.sessions();
    let before = sessions.len();
    sessions.retain(|user, entry| {
      let evict = entry.last_used.elapsed() >= self.idle_after
        && Arc::strong_count(&entry.session) == 1
        && entry.session.is_idle();
      if evict {
        tracing::debug!(%user, "idle session dropped");
      }
      !evict
    });
    before - sessions.len()
  }

  /// Cancel in-flight remote calls for every user. Used on shutdown.
  pub fn close_all(&self) {
    for entry in self.sessions().values() {
      entry.session.close();
    }
  }
}

#[cfg(test)]
mod tests {
  use prospect_gateway::{WebhookConfig, WebhookGateway};
  use prospect_store_sqlite::SqliteStore;

  use super::*;

  async fn registry(idle_after: Duration) -> SessionRegistry<SqliteStore, WebhookGateway> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let gateway = WebhookGateway::new(&WebhookConfig {
      lead_generation_url:  "http://127.0.0.1:9/lead-generation".into(),
      email_generation_url: "http://127.0.0.1:9/email-generation".into(),
      send_email_url:       "http://127.0.0.1:9/send-email".into(),
      timeout_secs:         5,
    })
    .unwrap();
    SessionRegistry::new(Arc::new(store), Arc::new(gateway), idle_after)
  }

  #[tokio::test]
  async fn same_user_gets_the_same_session() {
    let registry = registry(Duration::from_secs(60)).await;
    let user = UserId::new("user-1");
    let first = registry.session(&user).await.unwrap();
    let second = registry.session(&user).await.unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(registry.open_sessions(), 1);
  }

  #[tokio::test]
  async fn idle_sessions_are_dropped_and_reopened_on_demand() {
    let registry = registry(Duration::ZERO).await;
    let user = UserId::new("user-1");

    let held = registry.session(&user).await.unwrap();
    assert_eq!(registry.evict_idle(), 0, "a request still holds it");

    drop(held);
    assert_eq!(registry.evict_idle(), 1);
    assert_eq!(registry.open_sessions(), 0);

    registry.session(&user).await.unwrap();
    assert_eq!(registry.open_sessions(), 1);
  }

  #[tokio::test]
  async fn recently_used_sessions_stay() {
    let registry = registry(Duration::from_secs(3600)).await;
    drop(registry.session(&UserId::new("user-1")).await.unwrap());
    assert_eq!(registry.evict_idle(), 0);
    assert_eq!(registry.open_sessions(), 1);
  }
}
