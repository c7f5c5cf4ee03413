//! Application state machine and event dispatcher.
//!
//! Remote actions never block the key loop: each one is spawned onto the
//! runtime and its outcome comes back through the session's event channel,
//! which [`App::drain_events`] polls once per frame.

use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use prospect_core::{
  draft::{EmailContent, Tone},
  lead::LeadId,
  lifecycle::LeadRecord,
  view::{LeadPage, ListView},
};
use prospect_gateway::WebhookGateway;
use prospect_session::{LeadSession, SendConfirmation, SessionEvent};
use prospect_store_sqlite::SqliteStore;
use strum::IntoEnumIterator;
use tokio::sync::broadcast::{self, error::TryRecvError};

pub type Session = LeadSession<SqliteStore, WebhookGateway>;

/// Leads requested when the count field is left untouched.
const DEFAULT_LEAD_COUNT: &str = "10";

// ─── Screen & modes ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
  /// Focus on the lead list; right pane shows a hint.
  LeadList,
  /// Focus on one lead and its draft.
  LeadDetail,
}

/// Which of a two-field form has the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
  First,
  Second,
}

impl Field {
  fn toggle(self) -> Self {
    match self {
      Field::First => Field::Second,
      Field::Second => Field::First,
    }
  }
}

/// The "find leads" form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CriteriaForm {
  pub criteria: String,
  pub count:    String,
  pub field:    Field,
}

impl Default for CriteriaForm {
  fn default() -> Self {
    Self { criteria: String::new(), count: DEFAULT_LEAD_COUNT.into(), field: Field::First }
  }
}

/// The draft editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditForm {
  pub subject: String,
  pub body:    String,
  pub field:   Field,
}

impl EditForm {
  fn input_mut(&mut self) -> &mut String {
    match self.field {
      Field::First => &mut self.subject,
      Field::Second => &mut self.body,
    }
  }
}

/// What the keyboard is currently talking to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
  Normal,
  /// Typing into the list's search box.
  Search,
  Criteria(CriteriaForm),
  Edit(EditForm),
  ConfirmSend(LeadId),
  ConfirmDelete(LeadId),
}

/// The value after `current` in declaration order, wrapping around.
fn cycle<T>(current: T) -> T
where
  T: IntoEnumIterator + PartialEq + Copy,
{
  let all: Vec<T> = T::iter().collect();
  let at = all.iter().position(|v| *v == current).unwrap_or(0);
  all[(at + 1) % all.len()]
}

// ─── App ──────────────────────────────────────────────────────────────────────

/// Top-level application state.
pub struct App {
  /// Current screen / keyboard focus.
  pub screen: Screen,

  pub mode: Mode,

  /// Snapshot of the session cache, refreshed whenever an event arrives.
  pub records: Vec<Arc<LeadRecord>>,

  /// Search text, status filter and page of the list pane.
  pub view: ListView,

  /// Cursor position within the current page.
  pub list_cursor: usize,

  /// Lead shown in the detail pane.
  pub selected: Option<LeadId>,

  /// Tone used for the next generation.
  pub tone: Tone,

  /// Scroll offset within the detail pane.
  pub detail_scroll: usize,

  /// A lead search is running.
  pub searching: bool,

  /// One-line status message shown in the status bar.
  pub status_msg: String,

  pub session: Arc<Session>,

  events: broadcast::Receiver<SessionEvent>,
}

impl App {
  pub fn new(session: Arc<Session>) -> Self {
    let events = session.subscribe();
    let mut app = Self {
      screen: Screen::LeadList,
      mode: Mode::Normal,
      records: session.leads(),
      view: ListView::default(),
      list_cursor: 0,
      selected: None,
      tone: Tone::default(),
      detail_scroll: 0,
      searching: false,
      status_msg: String::new(),
      session,
      events,
    };
    app.clamp();
    app
  }

  // ── Snapshot ──────────────────────────────────────────────────────────────

  /// Re-read the session cache.
  pub fn refresh(&mut self) {
    self.records = self.session.leads();
    self.clamp();
  }

  /// Pull the page and cursor back into range after the collection or the
  /// query changed.
  fn clamp(&mut self) {
    let len = self.view.apply(&self.records).items.len();
    self.list_cursor = self.list_cursor.min(len.saturating_sub(1));
  }

  /// The page the list pane shows.
  pub fn current_page(&self) -> LeadPage<'_, Arc<LeadRecord>> {
    let mut view = self.view.clone();
    view.apply(&self.records)
  }

  /// The lead under the list cursor, if any.
  pub fn cursor_lead(&self) -> Option<Arc<LeadRecord>> {
    self.current_page().items.get(self.list_cursor).map(|r| Arc::clone(r))
  }

  /// The lead open in the detail pane, if it still exists.
  pub fn selected_lead(&self) -> Option<Arc<LeadRecord>> {
    let id = self.selected.as_ref()?;
    self.records.iter().find(|r| &r.lead.id == id).cloned()
  }

  fn lead_name(&self, id: &LeadId) -> String {
    self
      .records
      .iter()
      .find(|r| &r.lead.id == id)
      .map(|r| r.lead.name.clone())
      .unwrap_or_else(|| id.to_string())
  }

  // ── Session events ────────────────────────────────────────────────────────

  /// Apply every event published since the last frame.
  pub fn drain_events(&mut self) {
    let mut changed = false;
    loop {
      match self.events.try_recv() {
        Ok(event) => {
          self.on_event(event);
          changed = true;
        }
        Err(TryRecvError::Lagged(skipped)) => {
          tracing::debug!(skipped, "event receiver lagged; re-reading snapshot");
          changed = true;
        }
        Err(TryRecvError::Empty | TryRecvError::Closed) => break,
      }
    }
    if changed {
      self.refresh();
    }
  }

  fn on_event(&mut self, event: SessionEvent) {
    match event {
      SessionEvent::Reloaded { .. } => {}
      SessionEvent::LeadsGenerated { ids } => {
        self.searching = false;
        self.status_msg = format!("Added {} new leads", ids.len());
      }
      SessionEvent::DraftUpdated { id } => {
        self.status_msg = format!("Draft saved for {}", self.lead_name(&id));
      }
      SessionEvent::EmailSent { id } => {
        self.status_msg = format!("Email sent to {}", self.lead_name(&id));
      }
      SessionEvent::LeadDeleted { id } => {
        if self.selected.as_ref() == Some(&id) {
          self.close_detail();
        }
        self.status_msg = "Lead deleted".into();
      }
      SessionEvent::ActionFailed { id, message } => {
        if id.is_none() {
          self.searching = false;
        }
        self.status_msg = format!("Error: {message}");
      }
    }
  }

  // ── Key handling ──────────────────────────────────────────────────────────

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub fn handle_key(&mut self, key: KeyEvent) -> bool {
    // Global: Ctrl-C quits from anywhere.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
      return false;
    }

    match self.mode {
      Mode::Normal => {
        return match self.screen {
          Screen::LeadList => self.handle_list_key(key),
          Screen::LeadDetail => self.handle_detail_key(key),
        };
      }
      Mode::Search => self.handle_search_key(key),
      Mode::Criteria(_) => self.handle_criteria_key(key),
      Mode::Edit(_) => self.handle_edit_key(key),
      Mode::ConfirmSend(_) | Mode::ConfirmDelete(_) => self.handle_confirm_key(key),
    }
    true
  }

  fn handle_list_key(&mut self, key: KeyEvent) -> bool {
    match key.code {
      // Quit
      KeyCode::Char('q') => return false,

      // Navigation within the page
      KeyCode::Down | KeyCode::Char('j') => {
        let len = self.current_page().items.len();
        if self.list_cursor + 1 < len {
          self.list_cursor += 1;
        }
      }
      KeyCode::Up | KeyCode::Char('k') => {
        self.list_cursor = self.list_cursor.saturating_sub(1);
      }

      // Pages
      KeyCode::Right | KeyCode::PageDown | KeyCode::Char('n') => {
        self.view.next_page();
        self.list_cursor = 0;
        self.clamp();
      }
      KeyCode::Left | KeyCode::PageUp | KeyCode::Char('p') => {
        self.view.prev_page();
        self.list_cursor = 0;
        self.clamp();
      }

      // Open detail
      KeyCode::Enter | KeyCode::Char('l') => {
        if let Some(record) = self.cursor_lead() {
          self.open_detail(record.lead.id.clone());
        }
      }

      // Search & filter
      KeyCode::Char('/') => self.mode = Mode::Search,
      KeyCode::Char('f') => {
        self.view.set_status(cycle(self.view.status()));
        self.list_cursor = 0;
        self.clamp();
      }

      // Find new leads
      KeyCode::Char('g') => {
        if self.searching {
          self.status_msg = "A lead search is already running".into();
        } else {
          self.mode = Mode::Criteria(CriteriaForm::default());
        }
      }

      _ => {}
    }
    true
  }

  fn handle_detail_key(&mut self, key: KeyEvent) -> bool {
    let Some(record) = self.selected_lead() else {
      self.close_detail();
      return true;
    };

    match key.code {
      // Quit
      KeyCode::Char('q') => return false,

      // Back to list
      KeyCode::Esc | KeyCode::Left | KeyCode::Char('h') => self.close_detail(),

      // Scroll detail
      KeyCode::Down | KeyCode::Char('j') => self.detail_scroll += 1,
      KeyCode::Up | KeyCode::Char('k') => {
        self.detail_scroll = self.detail_scroll.saturating_sub(1);
      }

      // Navigate the page from detail (for quick switching)
      KeyCode::Char(']') | KeyCode::PageDown => {
        if self.list_cursor + 1 < self.current_page().items.len() {
          self.list_cursor += 1;
          if let Some(next) = self.cursor_lead() {
            self.open_detail(next.lead.id.clone());
          }
        }
      }
      KeyCode::Char('[') | KeyCode::PageUp => {
        if self.list_cursor > 0 {
          self.list_cursor -= 1;
          if let Some(prev) = self.cursor_lead() {
            self.open_detail(prev.lead.id.clone());
          }
        }
      }

      // Actions
      KeyCode::Char('t') => self.tone = cycle(self.tone),
      KeyCode::Char('g') => self.start_generate_email(&record),
      KeyCode::Char('e') => self.open_edit(&record),
      KeyCode::Char('s') => self.confirm_send(&record),
      KeyCode::Char('d') => {
        if !self.busy(&record) {
          self.mode = Mode::ConfirmDelete(record.lead.id.clone());
        }
      }

      _ => {}
    }
    true
  }

  fn handle_search_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Esc => {
        self.view.set_search("");
        self.mode = Mode::Normal;
      }
      KeyCode::Enter => self.mode = Mode::Normal,
      KeyCode::Backspace => {
        let mut search = self.view.search().to_owned();
        search.pop();
        self.view.set_search(search);
      }
      KeyCode::Char(c) => {
        let mut search = self.view.search().to_owned();
        search.push(c);
        self.view.set_search(search);
      }
      _ => return,
    }
    self.list_cursor = 0;
    self.clamp();
  }

  fn handle_criteria_key(&mut self, key: KeyEvent) {
    let Mode::Criteria(form) = &mut self.mode else {
      return;
    };
    match key.code {
      KeyCode::Esc => self.mode = Mode::Normal,
      KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
        form.field = form.field.toggle();
      }
      KeyCode::Enter if form.field == Field::First => form.field = Field::Second,
      KeyCode::Enter => {
        let criteria = form.criteria.clone();
        let count = form.count.trim().parse::<u32>();
        self.mode = Mode::Normal;
        match count {
          Ok(count) => self.start_generate_leads(criteria, count),
          Err(_) => self.status_msg = "Lead count must be a whole number".into(),
        }
      }
      KeyCode::Backspace => match form.field {
        Field::First => {
          form.criteria.pop();
        }
        Field::Second => {
          form.count.pop();
        }
      },
      KeyCode::Char(c) => match form.field {
        Field::First => form.criteria.push(c),
        Field::Second if c.is_ascii_digit() => form.count.push(c),
        Field::Second => {}
      },
      _ => {}
    }
  }

  fn handle_edit_key(&mut self, key: KeyEvent) {
    let Mode::Edit(form) = &mut self.mode else {
      return;
    };
    match key.code {
      KeyCode::Esc => {
        self.mode = Mode::Normal;
        self.status_msg = "Edit discarded".into();
      }
      KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
        let content = EmailContent::new(form.subject.trim(), form.body.clone());
        self.mode = Mode::Normal;
        if let Some(id) = self.selected.clone() {
          self.start_save_edit(id, content);
        }
      }
      KeyCode::Tab | KeyCode::BackTab => form.field = form.field.toggle(),
      KeyCode::Enter => match form.field {
        Field::First => form.field = Field::Second,
        Field::Second => form.body.push('\n'),
      },
      KeyCode::Backspace => {
        form.input_mut().pop();
      }
      KeyCode::Char(c) => form.input_mut().push(c),
      _ => {}
    }
  }

  fn handle_confirm_key(&mut self, key: KeyEvent) {
    let confirmed = matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y'));
    match (std::mem::replace(&mut self.mode, Mode::Normal), confirmed) {
      (Mode::ConfirmSend(id), true) => self.start_send(id),
      (Mode::ConfirmDelete(id), true) => self.start_delete(id),
      _ => self.status_msg = "Cancelled".into(),
    }
  }

  // ── Transitions ───────────────────────────────────────────────────────────

  fn open_detail(&mut self, id: LeadId) {
    self.selected = Some(id);
    self.detail_scroll = 0;
    self.screen = Screen::LeadDetail;
  }

  fn close_detail(&mut self) {
    self.screen = Screen::LeadList;
    self.selected = None;
    self.mode = Mode::Normal;
  }

  /// Refuse an action while another one for the same lead is running.
  fn busy(&mut self, record: &LeadRecord) -> bool {
    match self.session.pending(&record.lead.id) {
      Some(pending) => {
        self.status_msg = format!("Please wait, {pending}…");
        true
      }
      None => false,
    }
  }

  fn open_edit(&mut self, record: &LeadRecord) {
    if record.is_sent() {
      self.status_msg = "This email was already sent".into();
      return;
    }
    if self.busy(record) {
      return;
    }
    match &record.draft {
      Some(draft) => {
        self.mode = Mode::Edit(EditForm {
          subject: draft.content.subject.clone(),
          body:    draft.content.body.clone(),
          field:   Field::First,
        });
      }
      None => self.status_msg = "Generate an email first (g)".into(),
    }
  }

  fn confirm_send(&mut self, record: &LeadRecord) {
    if record.is_sent() {
      self.status_msg = "This email was already sent".into();
      return;
    }
    if self.busy(record) {
      return;
    }
    if record.draft.is_none() {
      self.status_msg = "Generate an email first (g)".into();
      return;
    }
    self.mode = Mode::ConfirmSend(record.lead.id.clone());
  }

  // ── Spawned actions ───────────────────────────────────────────────────────
  //
  // Results are ignored here: success and failure both reach the UI as
  // session events.

  fn start_generate_leads(&mut self, criteria: String, count: u32) {
    let session = Arc::clone(&self.session);
    tokio::spawn(async move {
      let _ = session.generate_leads(&criteria, count).await;
    });
    self.searching = true;
    self.status_msg = "Searching for leads…".into();
  }

  fn start_generate_email(&mut self, record: &LeadRecord) {
    if record.is_sent() {
      self.status_msg = "This email was already sent".into();
      return;
    }
    if self.busy(record) {
      return;
    }
    let session = Arc::clone(&self.session);
    let id = record.lead.id.clone();
    let tone = self.tone;
    tokio::spawn(async move {
      let _ = session.generate_email(&id, tone).await;
    });
    self.status_msg = format!("Writing the email ({tone})…");
  }

  fn start_save_edit(&mut self, id: LeadId, content: EmailContent) {
    let session = Arc::clone(&self.session);
    tokio::spawn(async move {
      let _ = session.save_edit(&id, content).await;
    });
    self.status_msg = "Saving…".into();
  }

  fn start_send(&mut self, id: LeadId) {
    let session = Arc::clone(&self.session);
    tokio::spawn(async move {
      let _ = session.send_email(&id, SendConfirmation::user_confirmed()).await;
    });
    self.status_msg = "Sending…".into();
  }

  fn start_delete(&mut self, id: LeadId) {
    let session = Arc::clone(&self.session);
    tokio::spawn(async move {
      let _ = session.delete_lead(&id).await;
    });
  }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;
  use prospect_core::{
    draft::EmailDraft,
    lead::{Lead, UserId},
    lifecycle::LeadStatus,
    store::LeadStore,
    view::StatusFilter,
  };
  use prospect_gateway::WebhookConfig;

  use super::*;

  fn user() -> UserId { UserId::new("user-1") }

  fn press(app: &mut App, code: KeyCode) -> bool { app.handle_key(KeyEvent::from(code)) }

  fn type_str(app: &mut App, text: &str) {
    for c in text.chars() {
      press(app, KeyCode::Char(c));
    }
  }

  /// An app over `n` leads, alternating between Acme and Beta. The gateway
  /// points at a closed port; these tests never reach it.
  async fn app_with(n: usize) -> (App, Arc<SqliteStore>) {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let leads = (0..n)
      .map(|i| {
        let company = if i % 2 == 0 { "Acme" } else { "Beta" };
        Lead::new(LeadId::new(format!("l{i:02}")), format!("Lead {i}"), "CEO", company, "x@y.test")
      })
      .collect();
    store.insert_leads(&user(), leads).await.unwrap();

    let gateway = WebhookGateway::new(&WebhookConfig {
      lead_generation_url:  "http://127.0.0.1:9/lead-generation".into(),
      email_generation_url: "http://127.0.0.1:9/email-generation".into(),
      send_email_url:       "http://127.0.0.1:9/send-email".into(),
      timeout_secs:         1,
    })
    .unwrap();
    let session = Arc::new(LeadSession::new(user(), Arc::clone(&store), Arc::new(gateway)));
    session.load().await.unwrap();
    (App::new(session), store)
  }

  async fn with_draft(app: &mut App, store: &SqliteStore, id: &str) {
    let draft = EmailDraft::generated(EmailContent::new("Hi", "Body"), Tone::Casual, "raw".into());
    store.save_draft(&user(), &LeadId::from(id), &draft).await.unwrap();
    app.session.load().await.unwrap();
    app.drain_events();
  }

  #[tokio::test]
  async fn pages_clamp_at_both_ends() {
    let (mut app, _) = app_with(25).await;
    assert_eq!(app.current_page().items.len(), 10);

    press(&mut app, KeyCode::Char('n'));
    press(&mut app, KeyCode::Char('n'));
    assert_eq!(app.view.page(), 3);
    assert_eq!(app.current_page().items.len(), 5);

    press(&mut app, KeyCode::Char('n'));
    assert_eq!(app.view.page(), 3);

    press(&mut app, KeyCode::Char('p'));
    press(&mut app, KeyCode::Char('p'));
    press(&mut app, KeyCode::Char('p'));
    assert_eq!(app.view.page(), 1);
  }

  #[tokio::test]
  async fn typing_a_search_resets_to_first_page() {
    let (mut app, _) = app_with(25).await;
    press(&mut app, KeyCode::Char('n'));
    press(&mut app, KeyCode::Down);

    press(&mut app, KeyCode::Char('/'));
    assert_eq!(app.mode, Mode::Search);
    type_str(&mut app, "beta");
    assert_eq!(app.view.page(), 1);
    assert_eq!(app.list_cursor, 0);
    assert_eq!(app.current_page().total, 12);

    press(&mut app, KeyCode::Esc);
    assert_eq!(app.mode, Mode::Normal);
    assert_eq!(app.current_page().total, 25);
  }

  #[tokio::test]
  async fn filter_cycles_through_statuses() {
    let (mut app, _) = app_with(3).await;
    press(&mut app, KeyCode::Char('f'));
    assert_eq!(app.view.status(), StatusFilter::Sent);
    assert!(app.current_page().is_empty());

    press(&mut app, KeyCode::Char('f'));
    press(&mut app, KeyCode::Char('f'));
    assert_eq!(app.view.status(), StatusFilter::NoEmail);
    assert_eq!(app.current_page().total, 3);

    press(&mut app, KeyCode::Char('f'));
    assert_eq!(app.view.status(), StatusFilter::All);
  }

  #[tokio::test]
  async fn send_needs_a_draft_and_a_yes() {
    let (mut app, store) = app_with(2).await;
    press(&mut app, KeyCode::Enter);
    assert_eq!(app.screen, Screen::LeadDetail);

    press(&mut app, KeyCode::Char('s'));
    assert_eq!(app.mode, Mode::Normal);
    assert!(app.status_msg.contains("Generate an email first"));

    with_draft(&mut app, &store, "l00").await;
    press(&mut app, KeyCode::Char('s'));
    assert_eq!(app.mode, Mode::ConfirmSend(LeadId::from("l00")));

    press(&mut app, KeyCode::Char('n'));
    assert_eq!(app.mode, Mode::Normal);
    assert_eq!(app.status_msg, "Cancelled");
    assert_eq!(app.selected_lead().unwrap().status(), LeadStatus::EmailGenerated);
  }

  #[tokio::test]
  async fn edit_form_starts_from_the_draft() {
    let (mut app, store) = app_with(1).await;
    with_draft(&mut app, &store, "l00").await;
    press(&mut app, KeyCode::Enter);
    press(&mut app, KeyCode::Char('e'));

    type_str(&mut app, " there");
    press(&mut app, KeyCode::Enter);
    type_str(&mut app, "!");
    match &app.mode {
      Mode::Edit(form) => {
        assert_eq!(form.subject, "Hi there");
        assert_eq!(form.body, "Body!");
      }
      other => panic!("unexpected mode {other:?}"),
    }

    press(&mut app, KeyCode::Esc);
    assert_eq!(app.mode, Mode::Normal);
  }

  #[tokio::test]
  async fn sent_lead_refuses_edits() {
    let (mut app, store) = app_with(1).await;
    with_draft(&mut app, &store, "l00").await;
    store.mark_sent(&user(), &LeadId::from("l00"), Utc::now()).await.unwrap();
    app.session.load().await.unwrap();
    app.drain_events();

    press(&mut app, KeyCode::Enter);
    press(&mut app, KeyCode::Char('e'));
    assert_eq!(app.mode, Mode::Normal);
    press(&mut app, KeyCode::Char('s'));
    assert_eq!(app.mode, Mode::Normal);
    assert_eq!(app.status_msg, "This email was already sent");
  }

  #[tokio::test]
  async fn deletion_event_returns_to_the_list() {
    let (mut app, _) = app_with(2).await;
    press(&mut app, KeyCode::Enter);
    let id = app.selected.clone().unwrap();

    app.session.delete_lead(&id).await.unwrap();
    app.drain_events();
    assert_eq!(app.screen, Screen::LeadList);
    assert_eq!(app.records.len(), 1);
    assert_eq!(app.status_msg, "Lead deleted");
  }

  #[tokio::test]
  async fn criteria_form_only_accepts_digits_for_count() {
    let (mut app, _) = app_with(0).await;
    press(&mut app, KeyCode::Char('g'));
    type_str(&mut app, "fintech CFOs");
    press(&mut app, KeyCode::Tab);
    press(&mut app, KeyCode::Backspace);
    press(&mut app, KeyCode::Backspace);
    type_str(&mut app, "2x5");
    match &app.mode {
      Mode::Criteria(form) => {
        assert_eq!(form.criteria, "fintech CFOs");
        assert_eq!(form.count, "25");
      }
      other => panic!("unexpected mode {other:?}"),
    }
  }
}
