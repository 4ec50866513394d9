//! Global role hierarchy.
//!
//! Every principal carries exactly one global role. Roles form a total order
//! through [`Role::level`]; minimum-role checks compare levels, they never
//! enumerate roles at call sites.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A principal's global role on the platform.
///
/// The set is closed: an unrecognized role string can fail parsing at the
/// storage or transport boundary, but it can never construct a `Role`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    /// Enrolled learner.
    Student,
    /// Teaching staff.
    Teacher,
    /// Organization administrator (sub-role and permissions live on the
    /// organization's membership record, not here).
    Admin,
    /// Platform operator; bypasses every authorization requirement.
    SuperAdmin,
    /// Demoted or otherwise out-of-band account (e.g. a removed admin).
    SpecialUser,
}

/// Error returned when parsing an unknown role string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown role: {0}")]
pub struct ParseRoleError(pub String);

impl Role {
    /// All roles, in hierarchy order (lowest level first).
    pub const ALL: [Role; 5] = [
        Role::Student,
        Role::SpecialUser,
        Role::Teacher,
        Role::Admin,
        Role::SuperAdmin,
    ];

    /// The role's position in the hierarchy.
    ///
    /// Fixed table: student and specialUser share the bottom rung, then
    /// teacher, admin, superAdmin.
    pub fn level(self) -> u8 {
        match self {
            Role::Student | Role::SpecialUser => 1,
            Role::Teacher => 2,
            Role::Admin => 3,
            Role::SuperAdmin => 4,
        }
    }

    /// Minimum-role check: does `self` sit at or above `min`?
    pub fn at_least(self, min: Role) -> bool {
        self.level() >= min.level()
    }

    /// Canonical storage/wire form (matches the serde representation).
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
            Role::Admin => "admin",
            Role::SuperAdmin => "superAdmin",
            Role::SpecialUser => "specialUser",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "teacher" => Ok(Role::Teacher),
            "admin" => Ok(Role::Admin),
            "superAdmin" => Ok(Role::SuperAdmin),
            "specialUser" => Ok(Role::SpecialUser),
            other => Err(ParseRoleError(other.to_string())),
        }
    }
}
