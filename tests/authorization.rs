//! Engine behavior over seeded organization state.

mod common;

use classgate_authz::{
    Capability, Decision, DenyReason, PermissionUpdate, Principal, Requirement, ResourceKind, Role,
};
use common::harness;

#[tokio::test]
async fn super_admin_passes_requirements_on_a_foreign_organization() {
    let h = harness().await;

    // The superAdmin is not on the seeded organization's roster, and does
    // not even reference it.
    let root = Principal {
        id: 9000,
        email: "root@classgate.example".into(),
        display_name: "Root".into(),
        global_role: Role::SuperAdmin,
        organization_id: None,
    };

    for requirement in [
        Requirement::min_role(Role::SuperAdmin),
        Requirement::exact_roles([Role::Admin]),
        Requirement::organization_member(),
        Requirement::admin_capabilities([Capability::CanManageAdmins]),
        Requirement::primary_admin(),
    ] {
        let decision = h.engine.authorize(Some(&root), &requirement).await.unwrap();
        assert!(
            decision.is_allow(),
            "superAdmin should pass {requirement:?}"
        );
    }
}

#[tokio::test]
async fn role_gates_never_consult_the_organization_store() {
    let h = harness().await;

    // Teacher with a dangling organization reference: if the store were
    // consulted this would surface as OrganizationNotFound.
    let teacher = Principal {
        id: 9001,
        email: "teacher@northside.edu".into(),
        display_name: "Terry".into(),
        global_role: Role::Teacher,
        organization_id: Some(40_404),
    };

    let decision = h
        .engine
        .authorize(
            Some(&teacher),
            &Requirement::admin_capabilities([Capability::CanEnrollStudents]),
        )
        .await
        .unwrap();
    assert_eq!(decision.deny_reason(), Some(&DenyReason::WrongRole));
}

#[tokio::test]
async fn secondary_admin_capability_checks_use_the_membership() {
    let h = harness().await;

    let mut requested = PermissionUpdate::default();
    requested.set(Capability::CanEnrollStudents, true);
    let created = h
        .admins
        .create_secondary_admin(
            &h.primary,
            classgate::services::admins::NewAdminRequest {
                email: "sam@northside.edu".into(),
                display_name: "Sam".into(),
                requested,
            },
        )
        .await
        .unwrap();
    let sam = created.principal;

    // Granted capability: allow, with the membership in the context.
    let decision = h
        .engine
        .can_manage_resource(Some(&sam), ResourceKind::Student)
        .await
        .unwrap();
    match decision {
        Decision::Allow(ctx) => {
            assert_eq!(ctx.organization_id, Some(h.organization_id));
            assert!(ctx.permissions.unwrap().can_enroll_students);
        }
        Decision::Deny(reason) => panic!("unexpected deny: {reason}"),
    }

    // Missing capabilities come back as the exact gap, not a bare
    // forbidden.
    let decision = h
        .engine
        .authorize(
            Some(&sam),
            &Requirement::admin_capabilities([
                Capability::CanEnrollStudents,
                Capability::CanManageClasses,
                Capability::CanViewAnalytics,
            ]),
        )
        .await
        .unwrap();
    assert_eq!(
        decision.deny_reason(),
        Some(&DenyReason::MissingCapabilities(vec![
            Capability::CanManageClasses,
            Capability::CanViewAnalytics,
        ]))
    );

    // Resource kinds the membership cannot manage deny the same way.
    let decision = h
        .engine
        .can_manage_resource(Some(&sam), ResourceKind::Content)
        .await
        .unwrap();
    assert_eq!(
        decision.deny_reason(),
        Some(&DenyReason::MissingCapabilities(vec![
            Capability::CanManageContent
        ]))
    );
}

#[tokio::test]
async fn primary_admin_manages_every_resource_kind() {
    let h = harness().await;

    for kind in [
        ResourceKind::Student,
        ResourceKind::Teacher,
        ResourceKind::Class,
        ResourceKind::Section,
        ResourceKind::Admin,
        ResourceKind::Content,
        ResourceKind::Analytics,
    ] {
        let decision = h
            .engine
            .can_manage_resource(Some(&h.primary), kind)
            .await
            .unwrap();
        assert!(decision.is_allow(), "primary should manage {kind:?}");
    }
}
