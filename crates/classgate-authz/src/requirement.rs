//! Authorization requirements.
//!
//! A [`Requirement`] is the value an action hands to the engine: a
//! conjunction of role, membership, and capability constraints. Constructors
//! build the common shapes; [`Requirement::and`] merges conjunctions, so
//! call sites compose checks instead of open-coding them.

use crate::capability::Capability;
use crate::role::Role;

/// A conjunction of authorization constraints.
///
/// Empty fields mean "no constraint of that form". The engine evaluates the
/// populated constraints in its fixed order; all must pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Requirement {
    /// Minimum role by hierarchy level.
    pub min_role: Option<Role>,
    /// The principal's role must be one of these exactly.
    pub exact_roles: Option<Vec<Role>>,
    /// The principal must hold an admin membership in its organization.
    pub organization_member: bool,
    /// Capabilities the membership must grant, all of them.
    pub capabilities: Vec<Capability>,
    /// The membership must be the primary admin.
    pub primary_admin_only: bool,
}

impl Requirement {
    /// Require at least `role` by hierarchy level.
    pub fn min_role(role: Role) -> Self {
        Requirement {
            min_role: Some(role),
            ..Default::default()
        }
    }

    /// Require the principal's role to be exactly one of `roles`.
    pub fn exact_roles(roles: impl Into<Vec<Role>>) -> Self {
        Requirement {
            exact_roles: Some(roles.into()),
            ..Default::default()
        }
    }

    /// Require an admin membership in the principal's organization.
    pub fn organization_member() -> Self {
        Requirement {
            organization_member: true,
            ..Default::default()
        }
    }

    /// Require an admin membership granting every capability in `caps`.
    ///
    /// Implies the admin global role: a non-admin fails the role gate before
    /// the store is ever consulted.
    pub fn admin_capabilities(caps: impl Into<Vec<Capability>>) -> Self {
        Requirement {
            exact_roles: Some(vec![Role::Admin]),
            organization_member: true,
            capabilities: caps.into(),
            ..Default::default()
        }
    }

    /// Require the primary-admin membership. Implies the admin global role.
    pub fn primary_admin() -> Self {
        Requirement {
            exact_roles: Some(vec![Role::Admin]),
            organization_member: true,
            primary_admin_only: true,
            ..Default::default()
        }
    }

    /// Conjoin two requirements.
    ///
    /// Role constraints combine to the stricter form: the higher minimum
    /// level, the intersection of exact-role sets. Capability lists union.
    pub fn and(mut self, other: Requirement) -> Self {
        self.min_role = match (self.min_role, other.min_role) {
            (Some(a), Some(b)) => Some(if a.level() >= b.level() { a } else { b }),
            (a, b) => a.or(b),
        };
        self.exact_roles = match (self.exact_roles.take(), other.exact_roles) {
            (Some(a), Some(b)) => Some(a.into_iter().filter(|r| b.contains(r)).collect()),
            (a, b) => a.or(b),
        };
        self.organization_member |= other.organization_member;
        for cap in other.capabilities {
            if !self.capabilities.contains(&cap) {
                self.capabilities.push(cap);
            }
        }
        self.primary_admin_only |= other.primary_admin_only;
        self
    }

    /// Whether evaluating this requirement needs the organization aggregate.
    pub fn needs_organization(&self) -> bool {
        self.organization_member || self.primary_admin_only || !self.capabilities.is_empty()
    }

    /// Short human-readable summary for audit logs.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if let Some(min) = self.min_role {
            parts.push(format!("min_role={min}"));
        }
        if let Some(roles) = &self.exact_roles {
            let names: Vec<&str> = roles.iter().map(|r| r.as_str()).collect();
            parts.push(format!("roles={}", names.join("|")));
        }
        if self.organization_member {
            parts.push("org_member".to_string());
        }
        if self.primary_admin_only {
            parts.push("primary_admin".to_string());
        }
        if !self.capabilities.is_empty() {
            let names: Vec<&str> = self.capabilities.iter().map(|c| c.as_str()).collect();
            parts.push(format!("caps={}", names.join("+")));
        }
        if parts.is_empty() {
            parts.push("none".to_string());
        }
        parts.join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_capabilities_implies_role_gate() {
        let req = Requirement::admin_capabilities([Capability::CanEnrollStudents]);
        assert_eq!(req.exact_roles, Some(vec![Role::Admin]));
        assert!(req.organization_member);
        assert!(req.needs_organization());
        assert!(!req.primary_admin_only);
    }

    #[test]
    fn and_takes_the_stricter_min_role() {
        let req = Requirement::min_role(Role::Teacher).and(Requirement::min_role(Role::Admin));
        assert_eq!(req.min_role, Some(Role::Admin));
    }

    #[test]
    fn and_intersects_exact_roles() {
        let req = Requirement::exact_roles([Role::Admin, Role::Teacher])
            .and(Requirement::exact_roles([Role::Admin]));
        assert_eq!(req.exact_roles, Some(vec![Role::Admin]));
    }

    #[test]
    fn and_unions_capabilities_without_duplicates() {
        let req = Requirement::admin_capabilities([Capability::CanManageAdmins])
            .and(Requirement::admin_capabilities([
                Capability::CanManageAdmins,
                Capability::CanViewAnalytics,
            ]));
        assert_eq!(
            req.capabilities,
            vec![Capability::CanManageAdmins, Capability::CanViewAnalytics]
        );
    }

    #[test]
    fn primary_admin_gate_composes_with_capabilities() {
        let req = Requirement::primary_admin()
            .and(Requirement::admin_capabilities([Capability::CanManageAdmins]));
        assert!(req.primary_admin_only);
        assert_eq!(req.capabilities, vec![Capability::CanManageAdmins]);
        assert_eq!(req.exact_roles, Some(vec![Role::Admin]));
    }

    #[test]
    fn plain_role_checks_do_not_need_the_store() {
        assert!(!Requirement::min_role(Role::Teacher).needs_organization());
        assert!(!Requirement::exact_roles([Role::Admin]).needs_organization());
        assert!(Requirement::organization_member().needs_organization());
    }
}
