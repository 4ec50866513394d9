//! Authenticated principals.

use crate::role::Role;
use serde::{Deserialize, Serialize};

/// An authenticated actor.
///
/// Credential and session handling happen upstream; by the time the
/// authorization core runs, the caller has already been resolved into one of
/// these. `global_role` and `organization_id` only change through the
/// admin-mutation and account-lifecycle paths, never at a principal's own
/// request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Store identifier.
    pub id: i64,
    /// Unique login address (uniqueness enforced by the store).
    pub email: String,
    /// Human-readable name.
    pub display_name: String,
    /// Global role on the platform.
    pub global_role: Role,
    /// The organization this principal belongs to, if any. Admin sub-role
    /// and permissions live on the organization's membership record, not
    /// here; the membership set is the single source of truth.
    pub organization_id: Option<i64>,
}

impl Principal {
    /// Whether this principal holds the universal-override role.
    pub fn is_super_admin(&self) -> bool {
        self.global_role == Role::SuperAdmin
    }
}
