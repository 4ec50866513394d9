//! classgate - organization-scoped authorization service.
//!
//! The service around the [`classgate_authz`] decision core: the SQLite
//! record store, the store-aware authorization engine, the admin-mutation
//! protocol, and the thin HTTP boundary. The `classgated` binary wires these
//! together from configuration.

pub mod authz;
pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod metrics;
pub mod services;
pub mod state;
pub mod telemetry;
