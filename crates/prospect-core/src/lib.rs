//! Core types and trait definitions for the Prospect lead dashboard.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends implement [`store::LeadStore`]; the webhook client
//! implements [`remote::RemoteActions`].

pub mod codec;
pub mod draft;
pub mod error;
pub mod lead;
pub mod lifecycle;
pub mod remote;
pub mod store;
pub mod view;

pub use error::{Error, Result};
