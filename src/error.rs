//! Unified error handling for classgate.
//!
//! Two layers, kept deliberately distinct:
//!
//! - [`ServiceError::Denied`] - the expected, structured outcomes of the
//!   authorization taxonomy. Returned to the caller, rendered with a stable
//!   reason code, counted in metrics.
//! - [`ServiceError::Fault`] - unexpected request-fatal conditions: store
//!   corruption, aggregate invariant breaches. Logged with full context and
//!   surfaced as an internal fault so a data-integrity bug is never masked
//!   as a normal deny.

use crate::db::DbError;
use classgate_authz::{AggregateViolation, DenyReason};
use thiserror::Error;

// ============================================================================
// Internal faults (request-fatal, never part of the deny taxonomy)
// ============================================================================

/// Unexpected request-fatal failures.
#[derive(Debug, Error)]
pub enum Fault {
    #[error("store fault: {0}")]
    Store(#[from] DbError),

    #[error("aggregate integrity fault: {0}")]
    Integrity(#[from] AggregateViolation),

    #[error("credential generation failed: {0}")]
    Credential(String),
}

// ============================================================================
// Service errors (what operations return)
// ============================================================================

/// Failure outcome of a service operation.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A structured denial from the authorization taxonomy.
    #[error("denied: {0}")]
    Denied(DenyReason),

    /// An internal fault, distinct from every deny.
    #[error("internal fault: {0}")]
    Fault(Fault),
}

impl ServiceError {
    /// Stable code string for metrics labeling and boundary payloads.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Denied(reason) => reason.code(),
            ServiceError::Fault(_) => "internal_fault",
        }
    }

    /// Classify a store error.
    ///
    /// A store that did not answer in time is a retryable
    /// `StoreUnavailable` denial; everything else the store reports
    /// unexpectedly is a fault.
    pub fn from_store(err: DbError) -> Self {
        if err.is_unavailable() {
            ServiceError::Denied(DenyReason::StoreUnavailable)
        } else {
            ServiceError::Fault(Fault::Store(err))
        }
    }
}

impl From<DenyReason> for ServiceError {
    fn from(reason: DenyReason) -> Self {
        ServiceError::Denied(reason)
    }
}

impl From<AggregateViolation> for ServiceError {
    fn from(violation: AggregateViolation) -> Self {
        ServiceError::Fault(Fault::Integrity(violation))
    }
}

impl From<Fault> for ServiceError {
    fn from(fault: Fault) -> Self {
        ServiceError::Fault(fault)
    }
}
