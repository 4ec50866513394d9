//! # classgate-authz
//!
//! The pure authorization core of the Classgate platform: who may do what,
//! decided over values, with no I/O.
//!
//! ## What lives here
//!
//! - Global role hierarchy and minimum-role comparisons
//! - The closed capability catalog and per-admin permission sets
//! - Organization / admin-membership aggregates and their invariants
//! - [`Requirement`] values describing what an action demands
//! - [`Decision`] / [`DenyReason`] - structured allow/deny outcomes
//!
//! Everything in this crate is a total function over closed enumerations.
//! Fetching organizations, persisting memberships, and running the decision
//! loop against the store belong to the `classgate` service crate; this
//! crate only defines the vocabulary and the pure checks.
//!
//! ## Quick start
//!
//! ```rust
//! use classgate_authz::{Capability, PermissionSet, Requirement, Role};
//!
//! assert!(Role::Admin.at_least(Role::Teacher));
//!
//! let mut perms = PermissionSet::default();
//! perms.set(Capability::CanEnrollStudents, true);
//! assert!(perms.missing(&[Capability::CanManageClasses]).len() == 1);
//!
//! let req = Requirement::primary_admin()
//!     .and(Requirement::admin_capabilities([Capability::CanManageAdmins]));
//! assert!(req.primary_admin_only);
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod capability;
pub mod decision;
pub mod org;
pub mod principal;
pub mod requirement;
pub mod role;

pub use capability::{Capability, PermissionSet, PermissionUpdate, ResourceKind};
pub use decision::{AuthorizationContext, Decision, DenyReason};
pub use org::{AdminMembership, AdminSubRole, AggregateViolation, Organization};
pub use principal::Principal;
pub use requirement::Requirement;
pub use role::Role;
