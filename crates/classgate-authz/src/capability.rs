//! The capability catalog.
//!
//! Capabilities are the fine-grained permission flags an organization admin
//! can hold. The set is closed and known at compile time; resource kinds map
//! onto required capabilities through an exhaustive match, so an unknown
//! kind is unrepresentable rather than a runtime string miss.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One fine-grained admin permission flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Capability {
    /// Enroll and manage student accounts.
    CanEnrollStudents,
    /// Enroll and manage teacher accounts.
    CanEnrollTeachers,
    /// Create and manage classes and sections.
    CanManageClasses,
    /// View organization analytics.
    CanViewAnalytics,
    /// Manage organization content. Never grantable to secondary admins.
    CanManageContent,
    /// Manage the admin roster itself. Never grantable to secondary admins.
    CanManageAdmins,
}

impl Capability {
    /// Every capability, in catalog order.
    pub const ALL: [Capability; 6] = [
        Capability::CanEnrollStudents,
        Capability::CanEnrollTeachers,
        Capability::CanManageClasses,
        Capability::CanViewAnalytics,
        Capability::CanManageContent,
        Capability::CanManageAdmins,
    ];

    /// Canonical wire form (matches the serde representation).
    pub fn as_str(self) -> &'static str {
        match self {
            Capability::CanEnrollStudents => "canEnrollStudents",
            Capability::CanEnrollTeachers => "canEnrollTeachers",
            Capability::CanManageClasses => "canManageClasses",
            Capability::CanViewAnalytics => "canViewAnalytics",
            Capability::CanManageContent => "canManageContent",
            Capability::CanManageAdmins => "canManageAdmins",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An abstract resource kind an action wants to manage.
///
/// Used to derive the required capability for "manage this kind of thing"
/// checks. Closed enum: a bad kind string fails at the boundary, never
/// inside the decision loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceKind {
    /// Student accounts.
    Student,
    /// Teacher accounts.
    Teacher,
    /// Classes.
    Class,
    /// Class sections (managed under the same capability as classes).
    Section,
    /// The admin roster.
    Admin,
    /// Organization content.
    Content,
    /// Analytics dashboards.
    Analytics,
}

impl ResourceKind {
    /// The capability required to manage this resource kind.
    pub fn required_capability(self) -> Capability {
        match self {
            ResourceKind::Student => Capability::CanEnrollStudents,
            ResourceKind::Teacher => Capability::CanEnrollTeachers,
            ResourceKind::Class | ResourceKind::Section => Capability::CanManageClasses,
            ResourceKind::Admin => Capability::CanManageAdmins,
            ResourceKind::Content => Capability::CanManageContent,
            ResourceKind::Analytics => Capability::CanViewAnalytics,
        }
    }
}

/// A full capability→bool mapping, one flag per catalog entry.
///
/// Mirrors the six boolean columns on the membership record in the store.
/// Defaults to everything denied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PermissionSet {
    /// Enroll and manage students.
    pub can_enroll_students: bool,
    /// Enroll and manage teachers.
    pub can_enroll_teachers: bool,
    /// Create and manage classes/sections.
    pub can_manage_classes: bool,
    /// View analytics.
    pub can_view_analytics: bool,
    /// Manage content (primary admins only).
    pub can_manage_content: bool,
    /// Manage the admin roster (primary admins only).
    pub can_manage_admins: bool,
}

impl PermissionSet {
    /// Whether this set grants `cap`.
    pub fn allows(&self, cap: Capability) -> bool {
        match cap {
            Capability::CanEnrollStudents => self.can_enroll_students,
            Capability::CanEnrollTeachers => self.can_enroll_teachers,
            Capability::CanManageClasses => self.can_manage_classes,
            Capability::CanViewAnalytics => self.can_view_analytics,
            Capability::CanManageContent => self.can_manage_content,
            Capability::CanManageAdmins => self.can_manage_admins,
        }
    }

    /// Set one flag.
    pub fn set(&mut self, cap: Capability, granted: bool) {
        match cap {
            Capability::CanEnrollStudents => self.can_enroll_students = granted,
            Capability::CanEnrollTeachers => self.can_enroll_teachers = granted,
            Capability::CanManageClasses => self.can_manage_classes = granted,
            Capability::CanViewAnalytics => self.can_view_analytics = granted,
            Capability::CanManageContent => self.can_manage_content = granted,
            Capability::CanManageAdmins => self.can_manage_admins = granted,
        }
    }

    /// Apply a partial update: flags the update leaves `None` keep their
    /// current value.
    pub fn merge(&mut self, update: &PermissionUpdate) {
        for cap in Capability::ALL {
            if let Some(granted) = update.get(cap) {
                self.set(cap, granted);
            }
        }
    }

    /// Force the secondary-admin floor: content and admin management off.
    ///
    /// Applied after every merge, so caller-supplied values for these two
    /// flags never survive a write.
    pub fn clamp_secondary(&mut self) {
        self.can_manage_content = false;
        self.can_manage_admins = false;
    }

    /// Whether the secondary-admin floor holds.
    pub fn secondary_clamped(&self) -> bool {
        !self.can_manage_content && !self.can_manage_admins
    }

    /// The subset of `required` this set does not grant, in catalog order.
    pub fn missing(&self, required: &[Capability]) -> Vec<Capability> {
        required
            .iter()
            .copied()
            .filter(|cap| !self.allows(*cap))
            .collect()
    }
}

/// A partial capability→bool mapping, used for requested/updated
/// permissions. Absent fields mean "leave unchanged".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PermissionUpdate {
    /// Requested value for `canEnrollStudents`, if any.
    pub can_enroll_students: Option<bool>,
    /// Requested value for `canEnrollTeachers`, if any.
    pub can_enroll_teachers: Option<bool>,
    /// Requested value for `canManageClasses`, if any.
    pub can_manage_classes: Option<bool>,
    /// Requested value for `canViewAnalytics`, if any.
    pub can_view_analytics: Option<bool>,
    /// Requested value for `canManageContent`, if any. Ignored for
    /// secondary admins by the forced clamp.
    pub can_manage_content: Option<bool>,
    /// Requested value for `canManageAdmins`, if any. Ignored for
    /// secondary admins by the forced clamp.
    pub can_manage_admins: Option<bool>,
}

impl PermissionUpdate {
    /// The requested value for `cap`, if the update carries one.
    pub fn get(&self, cap: Capability) -> Option<bool> {
        match cap {
            Capability::CanEnrollStudents => self.can_enroll_students,
            Capability::CanEnrollTeachers => self.can_enroll_teachers,
            Capability::CanManageClasses => self.can_manage_classes,
            Capability::CanViewAnalytics => self.can_view_analytics,
            Capability::CanManageContent => self.can_manage_content,
            Capability::CanManageAdmins => self.can_manage_admins,
        }
    }

    /// Set the requested value for `cap`.
    pub fn set(&mut self, cap: Capability, granted: bool) {
        match cap {
            Capability::CanEnrollStudents => self.can_enroll_students = Some(granted),
            Capability::CanEnrollTeachers => self.can_enroll_teachers = Some(granted),
            Capability::CanManageClasses => self.can_manage_classes = Some(granted),
            Capability::CanViewAnalytics => self.can_view_analytics = Some(granted),
            Capability::CanManageContent => self.can_manage_content = Some(granted),
            Capability::CanManageAdmins => self.can_manage_admins = Some(granted),
        }
    }
}
