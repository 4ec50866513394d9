//! Organizations and admin memberships.
//!
//! An organization owns its admin membership set exclusively; membership
//! entries are created and destroyed only through the admin-mutation
//! protocol. The aggregate is loaded whole and re-validated before every
//! persist, so no call site has to remember the invariants individually.

use crate::capability::PermissionSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// An admin's sub-role within one organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminSubRole {
    /// The organization's one owning admin. Never a mutation target.
    PrimaryAdmin,
    /// A delegated admin with a clamped permission set.
    SecondaryAdmin,
}

/// Error returned when parsing an unknown sub-role string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown admin sub-role: {0}")]
pub struct ParseSubRoleError(pub String);

impl AdminSubRole {
    /// Canonical storage form (matches the serde representation).
    pub fn as_str(self) -> &'static str {
        match self {
            AdminSubRole::PrimaryAdmin => "primary_admin",
            AdminSubRole::SecondaryAdmin => "secondary_admin",
        }
    }
}

impl fmt::Display for AdminSubRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdminSubRole {
    type Err = ParseSubRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "primary_admin" => Ok(AdminSubRole::PrimaryAdmin),
            "secondary_admin" => Ok(AdminSubRole::SecondaryAdmin),
            other => Err(ParseSubRoleError(other.to_string())),
        }
    }
}

/// One principal's admin standing within one organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminMembership {
    /// The member principal.
    pub principal_id: i64,
    /// Primary or secondary.
    pub sub_role: AdminSubRole,
    /// Fine-grained permission flags.
    pub permissions: PermissionSet,
    /// Principal that created this entry.
    pub added_by: i64,
    /// Creation time, unix seconds.
    pub added_at: i64,
}

impl AdminMembership {
    /// Whether this entry is the organization's primary admin.
    pub fn is_primary(&self) -> bool {
        self.sub_role == AdminSubRole::PrimaryAdmin
    }
}

/// An organization aggregate: the tenant record plus its full admin set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    /// Store identifier.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// The complete admin membership set.
    pub admins: Vec<AdminMembership>,
}

/// A structural invariant breach inside an organization aggregate.
///
/// These are data-integrity faults, not authorization denials: a request
/// that trips one fails as an internal error so the breach is never masked
/// as a normal deny.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregateViolation {
    /// More than one primary_admin membership.
    #[error("organization {organization_id} has {count} primary admins")]
    MultiplePrimaryAdmins {
        /// Offending organization.
        organization_id: i64,
        /// How many primaries were found.
        count: usize,
    },
    /// The same principal appears twice in the membership set.
    #[error("organization {organization_id} has duplicate membership for principal {principal_id}")]
    DuplicateMembership {
        /// Offending organization.
        organization_id: i64,
        /// Duplicated member.
        principal_id: i64,
    },
    /// A secondary admin holds a capability the clamp forbids.
    #[error(
        "organization {organization_id}: secondary admin {principal_id} escapes the permission clamp"
    )]
    UnclampedSecondary {
        /// Offending organization.
        organization_id: i64,
        /// Offending member.
        principal_id: i64,
    },
}

impl Organization {
    /// Look up the membership entry for `principal_id`, if any.
    pub fn membership_of(&self, principal_id: i64) -> Option<&AdminMembership> {
        self.admins.iter().find(|m| m.principal_id == principal_id)
    }

    /// The primary admin entry, if present.
    pub fn primary_admin(&self) -> Option<&AdminMembership> {
        self.admins.iter().find(|m| m.is_primary())
    }

    /// Check the aggregate's structural invariants.
    ///
    /// Run on every load and before every persist: at most one primary
    /// admin, unique member principals, and the secondary-admin permission
    /// clamp on every secondary entry.
    pub fn validate(&self) -> Result<(), AggregateViolation> {
        let primaries = self.admins.iter().filter(|m| m.is_primary()).count();
        if primaries > 1 {
            return Err(AggregateViolation::MultiplePrimaryAdmins {
                organization_id: self.id,
                count: primaries,
            });
        }

        for (i, m) in self.admins.iter().enumerate() {
            if self.admins[..i].iter().any(|p| p.principal_id == m.principal_id) {
                return Err(AggregateViolation::DuplicateMembership {
                    organization_id: self.id,
                    principal_id: m.principal_id,
                });
            }
            if !m.is_primary() && !m.permissions.secondary_clamped() {
                return Err(AggregateViolation::UnclampedSecondary {
                    organization_id: self.id,
                    principal_id: m.principal_id,
                });
            }
        }

        Ok(())
    }
}
