//! Handlers for `/leads` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/leads` | Optional `?search=`, `?status=all\|sent\|generated\|no-email`, `?page=` |
//! | `POST`   | `/leads/generate` | Body: `{"criteria":"...","lead_count":10}`; returns 201 |
//! | `GET`    | `/leads/:id` | 404 if not found |
//! | `DELETE` | `/leads/:id` | 204 |
//! | `POST`   | `/leads/:id/email` | Body: `{"tone":"casual"}`; generate or regenerate |
//! | `PUT`    | `/leads/:id/email` | Body: `{"subject":"...","body":"..."}` |
//! | `POST`   | `/leads/:id/send` | Body: `{"confirm":true}` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use prospect_core::{
  draft::{EmailContent, Tone},
  lead::{Lead, LeadId},
  lifecycle::{LeadRecord, LeadStatus},
  remote::RemoteActions,
  store::LeadStore,
  view::{ListView, StatusFilter},
};
use prospect_session::{Pending, SendConfirmation};
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, registry::SessionRegistry, scope::UserScope};

type Registry<S, G> = State<Arc<SessionRegistry<S, G>>>;

// ─── Response bodies ──────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct DraftView {
  pub subject: String,
  pub body:    String,
  pub tone:    Option<Tone>,
}

/// A lead as the dashboard shows it.
#[derive(Debug, Serialize)]
pub struct LeadView {
  #[serde(flatten)]
  pub lead:       Lead,
  pub status:     LeadStatus,
  pub draft:      Option<DraftView>,
  pub sent_at:    Option<DateTime<Utc>>,
  pub created_at: DateTime<Utc>,
  /// Set while a remote action for this lead is running.
  pub pending:    Option<Pending>,
}

impl LeadView {
  fn new(record: &LeadRecord, pending: Option<Pending>) -> Self {
    Self {
      lead: record.lead.clone(),
      status: record.status(),
      draft: record.draft.as_ref().map(|d| DraftView {
        subject: d.content.subject.clone(),
        body:    d.content.body.clone(),
        tone:    d.tone,
      }),
      sent_at: record.sent_at,
      created_at: record.created_at,
      pending,
    }
  }
}

#[derive(Debug, Serialize)]
pub struct PageView {
  pub items:       Vec<LeadView>,
  pub page:        usize,
  pub total_pages: usize,
  pub total:       usize,
  pub search:      String,
  pub status:      StatusFilter,
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  #[serde(default)]
  pub search: String,
  #[serde(default)]
  pub status: StatusFilter,
  pub page:   Option<usize>,
}

/// `GET /leads[?search=...][&status=...][&page=...]`
pub async fn list<S, G>(
  State(registry): Registry<S, G>,
  UserScope(user): UserScope,
  Query(params): Query<ListParams>,
) -> Result<Json<PageView>, ApiError>
where
  S: LeadStore,
  G: RemoteActions,
{
  let session = registry.session(&user).await?;
  let records = session.leads();
  let mut view = ListView::new(params.search, params.status, params.page.unwrap_or(1));
  let page = view.apply(&records);

  let items = page
    .items
    .iter()
    .map(|r| LeadView::new(r, session.pending(&r.lead.id)))
    .collect();
  Ok(Json(PageView {
    items,
    page: page.page,
    total_pages: page.total_pages,
    total: page.total,
    search: view.search().to_owned(),
    status: view.status(),
  }))
}

// ─── Generate leads ───────────────────────────────────────────────────────────

fn default_lead_count() -> u32 { 10 }

#[derive(Debug, Deserialize)]
pub struct GenerateBody {
  pub criteria:   String,
  #[serde(default = "default_lead_count")]
  pub lead_count: u32,
}

#[derive(Debug, Serialize)]
pub struct Generated {
  pub ids: Vec<LeadId>,
}

/// `POST /leads/generate`: returns 201 + the ids that were added.
pub async fn generate<S, G>(
  State(registry): Registry<S, G>,
  UserScope(user): UserScope,
  Json(body): Json<GenerateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: LeadStore,
  G: RemoteActions,
{
  let session = registry.session(&user).await?;
  let ids = session.generate_leads(&body.criteria, body.lead_count).await?;
  Ok((StatusCode::CREATED, Json(Generated { ids })))
}

// ─── Single lead ──────────────────────────────────────────────────────────────

/// `GET /leads/:id`
pub async fn get_one<S, G>(
  State(registry): Registry<S, G>,
  UserScope(user): UserScope,
  Path(id): Path<String>,
) -> Result<Json<LeadView>, ApiError>
where
  S: LeadStore,
  G: RemoteActions,
{
  let session = registry.session(&user).await?;
  let id = LeadId::new(id);
  let record = session
    .lead(&id)
    .ok_or_else(|| ApiError::NotFound(format!("lead {id} not found")))?;
  Ok(Json(LeadView::new(&record, session.pending(&id))))
}

/// `DELETE /leads/:id`
pub async fn delete_one<S, G>(
  State(registry): Registry<S, G>,
  UserScope(user): UserScope,
  Path(id): Path<String>,
) -> Result<StatusCode, ApiError>
where
  S: LeadStore,
  G: RemoteActions,
{
  let session = registry.session(&user).await?;
  session.delete_lead(&LeadId::new(id)).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Draft ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct GenerateEmailBody {
  #[serde(default)]
  pub tone: Tone,
}

/// `POST /leads/:id/email`: generate, or regenerate over an unsent draft.
pub async fn generate_email<S, G>(
  State(registry): Registry<S, G>,
  UserScope(user): UserScope,
  Path(id): Path<String>,
  Json(body): Json<GenerateEmailBody>,
) -> Result<Json<LeadView>, ApiError>
where
  S: LeadStore,
  G: RemoteActions,
{
  let session = registry.session(&user).await?;
  let record = session.generate_email(&LeadId::new(id), body.tone).await?;
  Ok(Json(LeadView::new(&record, None)))
}

/// `PUT /leads/:id/email`
pub async fn save_edit<S, G>(
  State(registry): Registry<S, G>,
  UserScope(user): UserScope,
  Path(id): Path<String>,
  Json(content): Json<EmailContent>,
) -> Result<Json<LeadView>, ApiError>
where
  S: LeadStore,
  G: RemoteActions,
{
  let session = registry.session(&user).await?;
  let id = LeadId::new(id);
  let record = session.save_edit(&id, content).await?;
  Ok(Json(LeadView::new(&record, session.pending(&id))))
}

// ─── Send ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SendBody {
  #[serde(default)]
  pub confirm: bool,
}

/// `POST /leads/:id/send`: requires `{"confirm": true}`.
pub async fn send<S, G>(
  State(registry): Registry<S, G>,
  UserScope(user): UserScope,
  Path(id): Path<String>,
  Json(body): Json<SendBody>,
) -> Result<Json<LeadView>, ApiError>
where
  S: LeadStore,
  G: RemoteActions,
{
  if !body.confirm {
    return Err(ApiError::BadRequest("sending an email requires \"confirm\": true".into()));
  }
  let session = registry.session(&user).await?;
  let record = session
    .send_email(&LeadId::new(id), SendConfirmation::user_confirmed())
    .await?;
  Ok(Json(LeadView::new(&record, None)))
}
