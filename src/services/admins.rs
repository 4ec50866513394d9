//! Admin-mutation protocol.
//!
//! Handles:
//! - Creating a secondary admin (principal + membership + credential +
//!   welcome notification)
//! - Updating a secondary admin's permission flags
//! - Removing a secondary admin (membership removal + principal demotion)
//!
//! Every operation gates through the authorization engine first, then runs
//! its read-validate-write cycle under the organization's mutation lock.
//! The permission merge order is fixed: defaults, then the caller's request,
//! then the forced secondary clamp - forced overrides always win.

use crate::authz::AuthorizationEngine;
use crate::db::Database;
use crate::error::ServiceError;
use crate::metrics;
use crate::services::credentials;
use crate::services::notify::Notifier;
use crate::state::OrgLocks;
use crate::telemetry::{OperationTimer, spans};
use classgate_authz::{
    AdminMembership, AuthorizationContext, Capability, Decision, DenyReason, Organization,
    PermissionSet, PermissionUpdate, Principal, Requirement,
};
use std::sync::Arc;
use tracing::{Instrument, info, warn};

/// Request payload for creating a secondary admin.
#[derive(Debug, Clone)]
pub struct NewAdminRequest {
    /// Login address for the new admin; must not identify an existing
    /// principal.
    pub email: String,
    /// Human-readable name.
    pub display_name: String,
    /// Requested permission flags, merged over the configured defaults.
    pub requested: PermissionUpdate,
}

/// Outcome of a successful secondary-admin creation.
#[derive(Debug, Clone)]
pub struct CreatedAdmin {
    /// The newly created principal.
    pub principal: Principal,
    /// Its membership record.
    pub membership: AdminMembership,
}

/// The admin-mutation service.
///
/// Holds the configured secondary-admin permission defaults as a plain
/// value, so tests substitute alternate default sets without touching
/// global state.
#[derive(Clone)]
pub struct AdminService {
    db: Database,
    engine: AuthorizationEngine,
    locks: OrgLocks,
    defaults: PermissionSet,
    notifier: Arc<dyn Notifier>,
}

impl AdminService {
    /// Create the service.
    pub fn new(
        db: Database,
        engine: AuthorizationEngine,
        defaults: PermissionSet,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            db,
            engine,
            locks: OrgLocks::new(),
            defaults,
            notifier,
        }
    }

    /// Create a secondary admin in the actor's organization.
    pub async fn create_secondary_admin(
        &self,
        actor: &Principal,
        request: NewAdminRequest,
    ) -> Result<CreatedAdmin, ServiceError> {
        let _timer = OperationTimer::new("create_secondary_admin");
        let result = self.create_inner(actor, request).await;
        metrics::record_mutation(
            "create_secondary_admin",
            result.as_ref().map(|_| "ok").unwrap_or_else(|e| e.code()),
        );
        result
    }

    async fn create_inner(
        &self,
        actor: &Principal,
        request: NewAdminRequest,
    ) -> Result<CreatedAdmin, ServiceError> {
        let gate = Requirement::primary_admin()
            .and(Requirement::admin_capabilities([Capability::CanManageAdmins]));
        let ctx = self.gate(actor, &gate).await?;
        let organization_id = actor_organization(&ctx, actor)?;

        let span = spans::mutation("create_secondary_admin", actor.id, organization_id);
        async {
            if !valid_email(&request.email) || request.display_name.trim().is_empty() {
                return Err(DenyReason::ValidationFailure.into());
            }

            // Friendly pre-check; the store's UNIQUE index stays the
            // authority if a racing insert slips past it.
            let existing = self
                .db
                .principals()
                .find_by_email(&request.email)
                .await
                .map_err(ServiceError::from_store)?;
            if existing.is_some() {
                return Err(DenyReason::DuplicateEmail.into());
            }

            // Merge order: defaults, then the request, then the clamp.
            let mut permissions = self.defaults;
            permissions.merge(&request.requested);
            permissions.clamp_secondary();

            let _guard = self.locks.acquire(organization_id).await;

            let organization = self.load_organization(organization_id).await?;
            rehearse_create(&organization, permissions)?;

            let secret = credentials::generate_secret();
            let password_hash = credentials::hash_secret(secret.expose())?;

            let (principal, membership) = self
                .db
                .organizations()
                .add_secondary_admin(
                    organization_id,
                    &request.email,
                    request.display_name.trim(),
                    &password_hash,
                    permissions,
                    actor.id,
                )
                .await
                .map_err(|e| match e {
                    crate::db::DbError::EmailExists(_) => {
                        ServiceError::Denied(DenyReason::DuplicateEmail)
                    }
                    other => ServiceError::from_store(other),
                })?;

            info!(
                organization = organization_id,
                principal = principal.id,
                added_by = actor.id,
                "Secondary admin created"
            );

            // Credential delivery is best-effort: a failed notification is
            // logged, never rolled back into the creation.
            let notifier = Arc::clone(&self.notifier);
            let email = principal.email.clone();
            let payload = serde_json::json!({
                "organizationId": organization_id,
                "displayName": principal.display_name,
                "credential": secret.expose(),
            });
            tokio::spawn(async move {
                if !notifier.notify(&email, "secondary_admin_welcome", &payload).await {
                    warn!(email = %email, "Welcome notification was not delivered");
                }
            });

            Ok(CreatedAdmin {
                principal,
                membership,
            })
        }
        .instrument(span)
        .await
    }

    /// Update a secondary admin's permission flags.
    pub async fn update_admin_permissions(
        &self,
        actor: &Principal,
        target_id: i64,
        update: &PermissionUpdate,
    ) -> Result<AdminMembership, ServiceError> {
        let _timer = OperationTimer::new("update_admin_permissions");
        let result = self.update_inner(actor, target_id, update).await;
        metrics::record_mutation(
            "update_admin_permissions",
            result.as_ref().map(|_| "ok").unwrap_or_else(|e| e.code()),
        );
        result
    }

    async fn update_inner(
        &self,
        actor: &Principal,
        target_id: i64,
        update: &PermissionUpdate,
    ) -> Result<AdminMembership, ServiceError> {
        let ctx = self.gate(actor, &Requirement::primary_admin()).await?;
        let organization_id = actor_organization(&ctx, actor)?;

        if target_id == actor.id {
            return Err(DenyReason::CannotModifySelf.into());
        }

        let span = spans::mutation("update_admin_permissions", actor.id, organization_id);
        async {
            let _guard = self.locks.acquire(organization_id).await;

            let organization = self.load_organization(organization_id).await?;
            let Some(target) = organization.membership_of(target_id) else {
                return Err(DenyReason::AdminNotFound.into());
            };
            if target.is_primary() {
                return Err(DenyReason::CannotModifyPrimaryAdmin.into());
            }

            // Merge over the current flags, clamp last.
            let mut permissions = target.permissions;
            permissions.merge(update);
            permissions.clamp_secondary();

            let mut updated = target.clone();
            updated.permissions = permissions;
            rehearse_replace(&organization, &updated)?;

            let applied = self
                .db
                .organizations()
                .update_admin_permissions(organization_id, target_id, &permissions)
                .await
                .map_err(ServiceError::from_store)?;
            if !applied {
                return Err(DenyReason::AdminNotFound.into());
            }

            info!(
                organization = organization_id,
                principal = target_id,
                updated_by = actor.id,
                "Admin permissions updated"
            );

            Ok(updated)
        }
        .instrument(span)
        .await
    }

    /// Remove a secondary admin and demote the principal.
    pub async fn remove_admin(
        &self,
        actor: &Principal,
        target_id: i64,
    ) -> Result<(), ServiceError> {
        let _timer = OperationTimer::new("remove_admin");
        let result = self.remove_inner(actor, target_id).await;
        metrics::record_mutation(
            "remove_admin",
            result.as_ref().map(|_| "ok").unwrap_or_else(|e| e.code()),
        );
        result
    }

    async fn remove_inner(&self, actor: &Principal, target_id: i64) -> Result<(), ServiceError> {
        let ctx = self.gate(actor, &Requirement::primary_admin()).await?;
        let organization_id = actor_organization(&ctx, actor)?;

        if target_id == actor.id {
            return Err(DenyReason::CannotRemoveSelf.into());
        }

        let span = spans::mutation("remove_admin", actor.id, organization_id);
        async {
            let _guard = self.locks.acquire(organization_id).await;

            let organization = self.load_organization(organization_id).await?;
            let Some(target) = organization.membership_of(target_id) else {
                return Err(DenyReason::AdminNotFound.into());
            };
            if target.is_primary() {
                return Err(DenyReason::CannotRemovePrimaryAdmin.into());
            }

            // Membership removal and principal demotion commit as one unit
            // inside the repository transaction.
            let removed = self
                .db
                .organizations()
                .remove_admin(organization_id, target_id)
                .await
                .map_err(ServiceError::from_store)?;
            if !removed {
                return Err(DenyReason::AdminNotFound.into());
            }

            info!(
                organization = organization_id,
                principal = target_id,
                removed_by = actor.id,
                "Admin removed"
            );

            Ok(())
        }
        .instrument(span)
        .await
    }

    /// List the organization's admin roster.
    pub async fn list_admins(
        &self,
        actor: &Principal,
    ) -> Result<Vec<AdminMembership>, ServiceError> {
        let ctx = self.gate(actor, &Requirement::primary_admin()).await?;
        let organization_id = actor_organization(&ctx, actor)?;
        let organization = self.load_organization(organization_id).await?;
        Ok(organization.admins)
    }

    /// Run an engine gate, converting a deny into the operation's error.
    async fn gate(
        &self,
        actor: &Principal,
        requirement: &Requirement,
    ) -> Result<AuthorizationContext, ServiceError> {
        match self.engine.authorize(Some(actor), requirement).await? {
            Decision::Allow(ctx) => Ok(ctx),
            Decision::Deny(reason) => Err(ServiceError::Denied(reason)),
        }
    }

    /// Load and structurally validate the organization aggregate.
    async fn load_organization(&self, organization_id: i64) -> Result<Organization, ServiceError> {
        let organization = self
            .db
            .organizations()
            .find_by_id(organization_id)
            .await
            .map_err(ServiceError::from_store)?
            .ok_or(ServiceError::Denied(DenyReason::OrganizationNotFound))?;
        organization.validate()?;
        Ok(organization)
    }
}

/// Resolve which organization a mutation acts on.
///
/// A primary admin's gate context carries it; a superAdmin actor passes the
/// gate without one and falls back to its own organization reference.
fn actor_organization(
    ctx: &AuthorizationContext,
    actor: &Principal,
) -> Result<i64, ServiceError> {
    ctx.organization_id
        .or(actor.organization_id)
        .ok_or(ServiceError::Denied(DenyReason::NoOrganization))
}

/// Minimal syntactic email check; the store's UNIQUE index handles the rest.
fn valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    }
}

/// Validate the aggregate as it would look after inserting a new secondary
/// membership. Invariants are re-checked before every persist rather than
/// trusted to the call site.
fn rehearse_create(
    organization: &Organization,
    permissions: PermissionSet,
) -> Result<(), ServiceError> {
    let mut candidate = organization.clone();
    candidate.admins.push(AdminMembership {
        // The real id is assigned by the store; any unused id validates
        // uniqueness of the existing set.
        principal_id: i64::MAX,
        sub_role: classgate_authz::AdminSubRole::SecondaryAdmin,
        permissions,
        added_by: 0,
        added_at: 0,
    });
    candidate.validate()?;
    Ok(())
}

/// Validate the aggregate as it would look after replacing one membership.
fn rehearse_replace(
    organization: &Organization,
    updated: &AdminMembership,
) -> Result<(), ServiceError> {
    let mut candidate = organization.clone();
    for member in &mut candidate.admins {
        if member.principal_id == updated.principal_id {
            *member = updated.clone();
        }
    }
    candidate.validate()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation_is_syntactic_only() {
        assert!(valid_email("admin@school.edu"));
        assert!(!valid_email("admin"));
        assert!(!valid_email("@school.edu"));
        assert!(!valid_email("admin@nodot"));
        assert!(!valid_email("admin@.edu"));
    }
}
