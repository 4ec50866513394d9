//! Service layer.
//!
//! The admin-mutation protocol and its collaborators: credential issuance
//! and notification delivery. Services re-enter the authorization engine for
//! every gate; no service re-implements a check the engine owns.

pub mod admins;
pub mod credentials;
pub mod notify;

pub use admins::{AdminService, CreatedAdmin, NewAdminRequest};
pub use notify::{Notifier, NullNotifier, WebhookNotifier};
