//! Integration test common infrastructure.
//!
//! Stands up the service in-process against an in-memory database and seeds
//! one organization with its primary admin.

use classgate::authz::AuthorizationEngine;
use classgate::db::{Database, NewPrincipal};
use classgate::services::admins::AdminService;
use classgate::services::notify::{Notifier, NullNotifier};
use classgate_authz::{PermissionSet, Principal, Role};
use std::sync::Arc;

/// An in-process service instance over a seeded organization.
#[allow(dead_code)] // Not every suite touches every handle
pub struct TestHarness {
    pub db: Database,
    pub engine: AuthorizationEngine,
    pub admins: AdminService,
    pub organization_id: i64,
    /// The seeded organization's primary admin.
    pub primary: Principal,
}

/// Build a harness with all-denied secondary-admin defaults.
#[allow(dead_code)]
pub async fn harness() -> TestHarness {
    harness_with(PermissionSet::default(), Arc::new(NullNotifier)).await
}

/// Build a harness with explicit defaults and notifier.
#[allow(dead_code)]
pub async fn harness_with(
    defaults: PermissionSet,
    notifier: Arc<dyn Notifier>,
) -> TestHarness {
    let db = Database::new(":memory:").await.expect("in-memory database");

    let owner = db
        .principals()
        .create(NewPrincipal {
            email: "principal@northside.edu",
            display_name: "Pat Principal",
            password_hash: None,
            global_role: Role::Teacher,
            organization_id: None,
        })
        .await
        .expect("seed owner");

    let organization = db
        .organizations()
        .create_with_primary("Northside Academy", owner.id)
        .await
        .expect("seed organization");

    // Reload: the bootstrap promoted the owner into the organization.
    let primary = db
        .principals()
        .find_by_id(owner.id)
        .await
        .expect("reload owner")
        .expect("owner exists");

    let engine = AuthorizationEngine::new(db.clone());
    let admins = AdminService::new(db.clone(), engine.clone(), defaults, notifier);

    TestHarness {
        db,
        engine,
        admins,
        organization_id: organization.id,
        primary,
    }
}

/// Create a standalone principal with the given role, outside any
/// organization.
#[allow(dead_code)]
pub async fn create_principal(db: &Database, email: &str, role: Role) -> Principal {
    db.principals()
        .create(NewPrincipal {
            email,
            display_name: email,
            password_hash: None,
            global_role: role,
            organization_id: None,
        })
        .await
        .expect("create principal")
}
