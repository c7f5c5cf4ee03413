//! JSON REST API for the prospect dashboard.
//!
//! Exposes an axum [`Router`] backed by any [`LeadStore`] and
//! [`RemoteActions`] pair. Every lead route is scoped to the user named in
//! the `x-user-id` header, which the upstream auth provider sets; auth, TLS
//! and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", prospect_api::api_router(registry.clone()))
//! ```

pub mod config;
pub mod error;
pub mod leads;
pub mod registry;
pub mod scope;

use std::sync::Arc;

use axum::{
  Json,
  Router,
  routing::{get, post},
};
use prospect_core::{remote::RemoteActions, store::LeadStore};
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

pub use config::ServerConfig;
pub use error::ApiError;
pub use registry::SessionRegistry;

/// Build a fully-materialised API router over `registry`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, G>(registry: Arc<SessionRegistry<S, G>>) -> Router<()>
where
  S: LeadStore + 'static,
  G: RemoteActions + 'static,
{
  Router::new()
    .route("/health", get(health))
    // Collection
    .route("/leads", get(leads::list::<S, G>))
    .route("/leads/generate", post(leads::generate::<S, G>))
    // Single lead
    .route("/leads/{id}", get(leads::get_one::<S, G>).delete(leads::delete_one::<S, G>))
    .route(
      "/leads/{id}/email",
      post(leads::generate_email::<S, G>).put(leads::save_edit::<S, G>),
    )
    .route("/leads/{id}/send", post(leads::send::<S, G>))
    .layer(TraceLayer::new_for_http())
    .with_state(registry)
}

/// `GET /health`
async fn health() -> Json<Value> { Json(json!({ "status": "ok" })) }
