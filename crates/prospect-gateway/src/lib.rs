//! HTTP implementation of [`prospect_core::remote::RemoteActions`].
//!
//! Talks to three webhook endpoints (lead generation, email generation,
//! email sending). Every call is a single JSON `POST`; any 2xx is success.
//! Nothing is retried here.

mod client;
mod wire;

pub mod config;
pub mod error;

pub use client::WebhookGateway;
pub use config::WebhookConfig;
pub use error::{Action, Error, Result};
