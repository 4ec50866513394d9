//! Decisions and deny reasons.
//!
//! Every authorization outcome is a structured value: an allow carrying the
//! context the caller needs to proceed without re-fetching, or a deny with a
//! machine-checkable reason code. Reason codes are stable strings used for
//! metric labels and boundary payloads.

use crate::capability::{Capability, PermissionSet};
use crate::org::{AdminMembership, AdminSubRole};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Context handed back on an allow, so callers reuse the looked-up state.
///
/// Populated only when the organization path actually ran; a pure role
/// allow (including the superAdmin override) carries an empty context and
/// never fabricates a membership.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationContext {
    /// Organization the checks ran against, if any.
    pub organization_id: Option<i64>,
    /// The principal's sub-role in that organization.
    pub sub_role: Option<AdminSubRole>,
    /// The principal's permission set in that organization.
    pub permissions: Option<PermissionSet>,
}

impl AuthorizationContext {
    /// Context for an allow that consulted no organization state.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Context for an allow backed by a membership lookup.
    pub fn for_membership(organization_id: i64, membership: &AdminMembership) -> Self {
        AuthorizationContext {
            organization_id: Some(organization_id),
            sub_role: Some(membership.sub_role),
            permissions: Some(membership.permissions),
        }
    }
}

/// Why a request was denied.
///
/// This is the complete expected-outcome taxonomy: every variant is a
/// locally recoverable result returned to the caller, never an internal
/// fault. [`DenyReason::code`] is the stable wire/metrics label.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DenyReason {
    /// No authenticated principal was supplied.
    #[error("authentication required")]
    Unauthenticated,
    /// The principal's role is outside the required exact-role set.
    #[error("role not permitted for this action")]
    WrongRole,
    /// The principal's role sits below the required minimum level.
    #[error("role level too low for this action")]
    InsufficientRoleLevel,
    /// The principal belongs to no organization.
    #[error("principal belongs to no organization")]
    NoOrganization,
    /// The principal references an organization the store no longer has.
    #[error("organization not found")]
    OrganizationNotFound,
    /// The principal holds no admin membership in its organization.
    #[error("not an admin of this organization")]
    NotAnAdminOfOrganization,
    /// The action is reserved for the primary admin.
    #[error("primary admin required")]
    PrimaryAdminRequired,
    /// The membership lacks one or more required capabilities.
    #[error("missing required capabilities")]
    MissingCapabilities(Vec<Capability>),
    /// The email already identifies an existing principal.
    #[error("email already registered")]
    DuplicateEmail,
    /// The target principal holds no admin membership here.
    #[error("admin not found in this organization")]
    AdminNotFound,
    /// Admins cannot update their own membership.
    #[error("cannot modify own membership")]
    CannotModifySelf,
    /// The primary admin's membership is never an update target.
    #[error("cannot modify the primary admin")]
    CannotModifyPrimaryAdmin,
    /// Admins cannot remove themselves.
    #[error("cannot remove own membership")]
    CannotRemoveSelf,
    /// The primary admin's membership is never a removal target.
    #[error("cannot remove the primary admin")]
    CannotRemovePrimaryAdmin,
    /// The record store did not answer within its deadline.
    #[error("record store unavailable")]
    StoreUnavailable,
    /// The request payload failed validation.
    #[error("request validation failed")]
    ValidationFailure,
}

impl DenyReason {
    /// Stable reason code for metrics labels and boundary payloads.
    pub fn code(&self) -> &'static str {
        match self {
            DenyReason::Unauthenticated => "unauthenticated",
            DenyReason::WrongRole => "wrong_role",
            DenyReason::InsufficientRoleLevel => "insufficient_role_level",
            DenyReason::NoOrganization => "no_organization",
            DenyReason::OrganizationNotFound => "organization_not_found",
            DenyReason::NotAnAdminOfOrganization => "not_an_admin_of_organization",
            DenyReason::PrimaryAdminRequired => "primary_admin_required",
            DenyReason::MissingCapabilities(_) => "missing_capabilities",
            DenyReason::DuplicateEmail => "duplicate_email",
            DenyReason::AdminNotFound => "admin_not_found",
            DenyReason::CannotModifySelf => "cannot_modify_self",
            DenyReason::CannotModifyPrimaryAdmin => "cannot_modify_primary_admin",
            DenyReason::CannotRemoveSelf => "cannot_remove_self",
            DenyReason::CannotRemovePrimaryAdmin => "cannot_remove_primary_admin",
            DenyReason::StoreUnavailable => "store_unavailable",
            DenyReason::ValidationFailure => "validation_failure",
        }
    }
}

/// The outcome of an authorization check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// The action may proceed; context carries the looked-up state.
    Allow(AuthorizationContext),
    /// The action is refused for the given reason.
    Deny(DenyReason),
}

impl Decision {
    /// Whether this decision permits the action.
    pub fn is_allow(&self) -> bool {
        matches!(self, Decision::Allow(_))
    }

    /// The deny reason, if this is a deny.
    pub fn deny_reason(&self) -> Option<&DenyReason> {
        match self {
            Decision::Allow(_) => None,
            Decision::Deny(reason) => Some(reason),
        }
    }

    /// Label for metrics and audit logs: `"allow"` or the deny code.
    pub fn label(&self) -> &'static str {
        match self {
            Decision::Allow(_) => "allow",
            Decision::Deny(reason) => reason.code(),
        }
    }
}
