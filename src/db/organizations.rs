//! Organization repository.
//!
//! Loads organizations as whole aggregates (tenant row plus the full admin
//! membership set) and applies membership mutations transactionally. The
//! secondary-admin guards live in the SQL itself: update and delete
//! statements match only `sub_role = 'secondary_admin'`, so a primary-admin
//! row can never be the target of either, whatever the caller got wrong.

use super::DbError;
use classgate_authz::{AdminMembership, AdminSubRole, Organization, PermissionSet, Principal, Role};
use sqlx::SqlitePool;

/// Repository for organization operations.
pub struct OrganizationRepository<'a> {
    pool: &'a SqlitePool,
}

type MembershipRow = (i64, String, bool, bool, bool, bool, bool, bool, i64, i64);

fn decode_membership(row: MembershipRow) -> Result<AdminMembership, DbError> {
    let (
        principal_id,
        sub_role,
        can_enroll_students,
        can_enroll_teachers,
        can_manage_classes,
        can_view_analytics,
        can_manage_content,
        can_manage_admins,
        added_by,
        added_at,
    ) = row;
    let sub_role: AdminSubRole = sub_role.parse().map_err(|_| {
        DbError::InvalidRow(format!(
            "membership for principal {principal_id} has unknown sub-role {sub_role:?}"
        ))
    })?;
    Ok(AdminMembership {
        principal_id,
        sub_role,
        permissions: PermissionSet {
            can_enroll_students,
            can_enroll_teachers,
            can_manage_classes,
            can_view_analytics,
            can_manage_content,
            can_manage_admins,
        },
        added_by,
        added_at,
    })
}

impl<'a> OrganizationRepository<'a> {
    /// Create a new organization repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create an organization owned by an existing principal.
    ///
    /// One transaction: the tenant row, the primary-admin membership with
    /// every capability granted, and the owner's promotion to the admin role
    /// inside the new organization. This is the only code path that writes a
    /// `primary_admin` row.
    pub async fn create_with_primary(
        &self,
        name: &str,
        owner_principal_id: i64,
    ) -> Result<Organization, DbError> {
        let now = chrono::Utc::now().timestamp();
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO organizations (name, created_at)
            VALUES (?, ?)
            "#,
        )
        .bind(name)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let organization_id = result.last_insert_rowid();

        sqlx::query(
            r#"
            INSERT INTO organization_admins (
                organization_id, principal_id, sub_role,
                can_enroll_students, can_enroll_teachers, can_manage_classes,
                can_view_analytics, can_manage_content, can_manage_admins,
                added_by, added_at
            )
            VALUES (?, ?, 'primary_admin', 1, 1, 1, 1, 1, 1, ?, ?)
            "#,
        )
        .bind(organization_id)
        .bind(owner_principal_id)
        .bind(owner_principal_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let updated = sqlx::query(
            r#"
            UPDATE principals SET global_role = ?, organization_id = ?
            WHERE id = ?
            "#,
        )
        .bind(Role::Admin.as_str())
        .bind(organization_id)
        .bind(owner_principal_id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(DbError::PrincipalNotFound(owner_principal_id));
        }

        tx.commit().await?;

        Ok(Organization {
            id: organization_id,
            name: name.to_string(),
            admins: vec![AdminMembership {
                principal_id: owner_principal_id,
                sub_role: AdminSubRole::PrimaryAdmin,
                permissions: PermissionSet {
                    can_enroll_students: true,
                    can_enroll_teachers: true,
                    can_manage_classes: true,
                    can_view_analytics: true,
                    can_manage_content: true,
                    can_manage_admins: true,
                },
                added_by: owner_principal_id,
                added_at: now,
            }],
        })
    }

    /// Load an organization aggregate: the tenant row and its full admin set.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Organization>, DbError> {
        let org = sqlx::query_as::<_, (i64, String)>(
            r#"
            SELECT id, name
            FROM organizations
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        let Some((id, name)) = org else {
            return Ok(None);
        };

        let rows = sqlx::query_as::<_, MembershipRow>(
            r#"
            SELECT principal_id, sub_role,
                   can_enroll_students, can_enroll_teachers, can_manage_classes,
                   can_view_analytics, can_manage_content, can_manage_admins,
                   added_by, added_at
            FROM organization_admins
            WHERE organization_id = ?
            ORDER BY added_at ASC, principal_id ASC
            "#,
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        let admins = rows
            .into_iter()
            .map(decode_membership)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(Organization { id, name, admins }))
    }

    /// Create a secondary admin: a new principal plus its membership, in one
    /// transaction.
    ///
    /// The caller has already merged and clamped `permissions`; this only
    /// persists. A duplicate email surfaces as [`DbError::EmailExists`], a
    /// duplicate membership as [`DbError::MembershipExists`].
    #[allow(clippy::too_many_arguments)]
    pub async fn add_secondary_admin(
        &self,
        organization_id: i64,
        email: &str,
        display_name: &str,
        password_hash: &str,
        permissions: PermissionSet,
        added_by: i64,
    ) -> Result<(Principal, AdminMembership), DbError> {
        let now = chrono::Utc::now().timestamp();
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO principals (email, display_name, password_hash, global_role, organization_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(email)
        .bind(display_name)
        .bind(password_hash)
        .bind(Role::Admin.as_str())
        .bind(organization_id)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return DbError::EmailExists(email.to_string());
            }
            DbError::from(e)
        })?;

        let principal_id = result.last_insert_rowid();

        sqlx::query(
            r#"
            INSERT INTO organization_admins (
                organization_id, principal_id, sub_role,
                can_enroll_students, can_enroll_teachers, can_manage_classes,
                can_view_analytics, can_manage_content, can_manage_admins,
                added_by, added_at
            )
            VALUES (?, ?, 'secondary_admin', ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(organization_id)
        .bind(principal_id)
        .bind(permissions.can_enroll_students)
        .bind(permissions.can_enroll_teachers)
        .bind(permissions.can_manage_classes)
        .bind(permissions.can_view_analytics)
        .bind(permissions.can_manage_content)
        .bind(permissions.can_manage_admins)
        .bind(added_by)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return DbError::MembershipExists(principal_id);
            }
            DbError::from(e)
        })?;

        tx.commit().await?;

        let principal = Principal {
            id: principal_id,
            email: email.to_string(),
            display_name: display_name.to_string(),
            global_role: Role::Admin,
            organization_id: Some(organization_id),
        };
        let membership = AdminMembership {
            principal_id,
            sub_role: AdminSubRole::SecondaryAdmin,
            permissions,
            added_by,
            added_at: now,
        };
        Ok((principal, membership))
    }

    /// Replace a secondary admin's permission flags.
    ///
    /// Returns `false` when no secondary-admin row matched; the guard on
    /// `sub_role` means a primary admin row is simply not a match.
    pub async fn update_admin_permissions(
        &self,
        organization_id: i64,
        principal_id: i64,
        permissions: &PermissionSet,
    ) -> Result<bool, DbError> {
        let result = sqlx::query(
            r#"
            UPDATE organization_admins
            SET can_enroll_students = ?, can_enroll_teachers = ?, can_manage_classes = ?,
                can_view_analytics = ?, can_manage_content = ?, can_manage_admins = ?
            WHERE organization_id = ? AND principal_id = ? AND sub_role = 'secondary_admin'
            "#,
        )
        .bind(permissions.can_enroll_students)
        .bind(permissions.can_enroll_teachers)
        .bind(permissions.can_manage_classes)
        .bind(permissions.can_view_analytics)
        .bind(permissions.can_manage_content)
        .bind(permissions.can_manage_admins)
        .bind(organization_id)
        .bind(principal_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove a secondary admin and demote the principal, as one logical
    /// unit.
    ///
    /// The membership delete and the principal's demotion to `specialUser`
    /// (with its organization reference cleared) commit or roll back
    /// together, so the store can never hold an orphaned membership or an
    /// admin-role principal with no membership.
    pub async fn remove_admin(
        &self,
        organization_id: i64,
        principal_id: i64,
    ) -> Result<bool, DbError> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query(
            r#"
            DELETE FROM organization_admins
            WHERE organization_id = ? AND principal_id = ? AND sub_role = 'secondary_admin'
            "#,
        )
        .bind(organization_id)
        .bind(principal_id)
        .execute(&mut *tx)
        .await?;

        if deleted.rows_affected() == 0 {
            // Nothing matched; leave the transaction to roll back on drop.
            return Ok(false);
        }

        sqlx::query(
            r#"
            UPDATE principals SET global_role = ?, organization_id = NULL
            WHERE id = ?
            "#,
        )
        .bind(Role::SpecialUser.as_str())
        .bind(principal_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use crate::db::{Database, DbError, NewPrincipal};
    use classgate_authz::{AdminSubRole, PermissionSet, Role};

    async fn seeded_org(db: &Database) -> (i64, i64) {
        let owner = db
            .principals()
            .create(NewPrincipal {
                email: "owner@northside.edu",
                display_name: "Owner",
                password_hash: None,
                global_role: Role::Teacher,
                organization_id: None,
            })
            .await
            .unwrap();
        let org = db
            .organizations()
            .create_with_primary("Northside", owner.id)
            .await
            .unwrap();
        (org.id, owner.id)
    }

    #[tokio::test]
    async fn bootstrap_creates_primary_aggregate() {
        let db = Database::new(":memory:").await.unwrap();
        let (org_id, owner_id) = seeded_org(&db).await;

        let org = db.organizations().find_by_id(org_id).await.unwrap().unwrap();
        assert_eq!(org.admins.len(), 1);
        let primary = org.primary_admin().unwrap();
        assert_eq!(primary.principal_id, owner_id);
        assert!(primary.permissions.can_manage_admins);

        let owner = db.principals().find_by_id(owner_id).await.unwrap().unwrap();
        assert_eq!(owner.global_role, Role::Admin);
        assert_eq!(owner.organization_id, Some(org_id));
    }

    #[tokio::test]
    async fn duplicate_email_maps_to_email_exists() {
        let db = Database::new(":memory:").await.unwrap();
        let (org_id, owner_id) = seeded_org(&db).await;

        let perms = PermissionSet::default();
        db.organizations()
            .add_secondary_admin(org_id, "sec@northside.edu", "Sec", "hash", perms, owner_id)
            .await
            .unwrap();

        let err = db
            .organizations()
            .add_secondary_admin(org_id, "sec@northside.edu", "Again", "hash", perms, owner_id)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::EmailExists(_)));
    }

    #[tokio::test]
    async fn update_and_remove_only_match_secondary_rows() {
        let db = Database::new(":memory:").await.unwrap();
        let (org_id, owner_id) = seeded_org(&db).await;

        // The primary-admin row is invisible to both mutations.
        let perms = PermissionSet::default();
        assert!(
            !db.organizations()
                .update_admin_permissions(org_id, owner_id, &perms)
                .await
                .unwrap()
        );
        assert!(!db.organizations().remove_admin(org_id, owner_id).await.unwrap());

        let (sec, _) = db
            .organizations()
            .add_secondary_admin(org_id, "sec@northside.edu", "Sec", "hash", perms, owner_id)
            .await
            .unwrap();

        assert!(
            db.organizations()
                .update_admin_permissions(org_id, sec.id, &perms)
                .await
                .unwrap()
        );
        assert!(db.organizations().remove_admin(org_id, sec.id).await.unwrap());

        // Removal demoted and detached the principal in the same unit.
        let demoted = db.principals().find_by_id(sec.id).await.unwrap().unwrap();
        assert_eq!(demoted.global_role, Role::SpecialUser);
        assert_eq!(demoted.organization_id, None);

        let org = db.organizations().find_by_id(org_id).await.unwrap().unwrap();
        assert_eq!(org.admins.len(), 1);
        assert_eq!(org.admins[0].sub_role, AdminSubRole::PrimaryAdmin);
    }
}
