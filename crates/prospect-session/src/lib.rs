//! Lead lifecycle manager.
//!
//! A [`LeadSession`] is one user's working set: an in-memory cache of their
//! leads kept in step with a [`LeadStore`](prospect_core::store::LeadStore),
//! plus the remote actions that move leads through their lifecycle. Views
//! observe it through [`LeadSession::subscribe`].

mod session;

pub mod error;
pub mod events;

pub use error::{Result, SessionError};
pub use events::SessionEvent;
pub use session::{LeadSession, Pending, SendConfirmation};
