//! Admin-mutation protocol flows: creation, permission updates, removal,
//! and the per-organization serialization guarantee.

mod common;

use async_trait::async_trait;
use classgate::services::admins::NewAdminRequest;
use classgate::services::notify::Notifier;
use classgate_authz::{
    AdminSubRole, Capability, DenyReason, PermissionSet, PermissionUpdate, Principal, Role,
};
use classgate::error::ServiceError;
use common::{harness, harness_with};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn new_admin(email: &str, requested: PermissionUpdate) -> NewAdminRequest {
    NewAdminRequest {
        email: email.into(),
        display_name: email.split('@').next().unwrap().into(),
        requested,
    }
}

fn deny_reason(err: ServiceError) -> DenyReason {
    match err {
        ServiceError::Denied(reason) => reason,
        ServiceError::Fault(fault) => panic!("expected a denial, got fault: {fault}"),
    }
}

/// Notifier that records deliveries and reports a configurable outcome.
struct RecordingNotifier {
    delivered: bool,
    seen: Arc<Mutex<Vec<(String, String, serde_json::Value)>>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, address: &str, template: &str, payload: &serde_json::Value) -> bool {
        self.seen
            .lock()
            .unwrap()
            .push((address.to_string(), template.to_string(), payload.clone()));
        self.delivered
    }
}

#[tokio::test]
async fn create_clamps_forced_flags_whatever_the_request_says() {
    let h = harness().await;

    let mut requested = PermissionUpdate::default();
    requested.set(Capability::CanEnrollStudents, true);
    requested.set(Capability::CanManageContent, true);
    requested.set(Capability::CanManageAdmins, true);

    let created = h
        .admins
        .create_secondary_admin(&h.primary, new_admin("casey@northside.edu", requested))
        .await
        .unwrap();

    assert_eq!(created.membership.sub_role, AdminSubRole::SecondaryAdmin);
    assert!(created.membership.permissions.can_enroll_students);
    assert!(!created.membership.permissions.can_manage_content);
    assert!(!created.membership.permissions.can_manage_admins);
    assert_eq!(created.principal.global_role, Role::Admin);
    assert_eq!(created.principal.organization_id, Some(h.organization_id));

    // Admin count grew by exactly one, and the persisted row is clamped
    // too.
    let org = h
        .db
        .organizations()
        .find_by_id(h.organization_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(org.admins.len(), 2);
    let stored = org.membership_of(created.principal.id).unwrap();
    assert!(stored.permissions.secondary_clamped());
    assert_eq!(stored.added_by, h.primary.id);
}

#[tokio::test]
async fn configured_defaults_seed_new_secondary_admins() {
    let mut defaults = PermissionSet::default();
    defaults.set(Capability::CanViewAnalytics, true);
    // A poisoned default cannot leak through the clamp either.
    defaults.set(Capability::CanManageAdmins, true);
    let h = harness_with(
        defaults,
        Arc::new(classgate::services::notify::NullNotifier),
    )
    .await;

    let created = h
        .admins
        .create_secondary_admin(
            &h.primary,
            new_admin("dana@northside.edu", PermissionUpdate::default()),
        )
        .await
        .unwrap();

    assert!(created.membership.permissions.can_view_analytics);
    assert!(!created.membership.permissions.can_manage_admins);
}

#[tokio::test]
async fn duplicate_email_and_bad_input_are_denied() {
    let h = harness().await;

    let err = h
        .admins
        .create_secondary_admin(
            &h.primary,
            new_admin("principal@northside.edu", PermissionUpdate::default()),
        )
        .await
        .unwrap_err();
    assert_eq!(deny_reason(err), DenyReason::DuplicateEmail);

    let err = h
        .admins
        .create_secondary_admin(
            &h.primary,
            new_admin("not-an-email", PermissionUpdate::default()),
        )
        .await
        .unwrap_err();
    assert_eq!(deny_reason(err), DenyReason::ValidationFailure);
}

#[tokio::test]
async fn creation_notifies_with_a_credential_and_survives_delivery_failure() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let h = harness_with(
        PermissionSet::default(),
        Arc::new(RecordingNotifier {
            delivered: false,
            seen: Arc::clone(&seen),
        }),
    )
    .await;

    // Delivery reports failure; the creation still commits.
    let created = h
        .admins
        .create_secondary_admin(
            &h.primary,
            new_admin("lee@northside.edu", PermissionUpdate::default()),
        )
        .await
        .unwrap();

    // The notification task is fire-and-forget; give it a moment.
    let mut waited = Duration::ZERO;
    loop {
        if !seen.lock().unwrap().is_empty() {
            break;
        }
        assert!(waited < Duration::from_secs(2), "notification never fired");
        tokio::time::sleep(Duration::from_millis(10)).await;
        waited += Duration::from_millis(10);
    }

    let deliveries = seen.lock().unwrap();
    let (address, template, payload) = &deliveries[0];
    assert_eq!(address, "lee@northside.edu");
    assert_eq!(template, "secondary_admin_welcome");
    assert!(
        payload["credential"].as_str().is_some_and(|s| !s.is_empty()),
        "welcome payload carries the one-time credential"
    );

    // And the membership exists despite the failed delivery.
    let org = h
        .db
        .organizations()
        .find_by_id(h.organization_id)
        .await
        .unwrap()
        .unwrap();
    assert!(org.membership_of(created.principal.id).is_some());
}

#[tokio::test]
async fn update_merges_over_current_flags_and_clamps_last() {
    let h = harness().await;

    // S starts with exactly canEnrollStudents.
    let mut requested = PermissionUpdate::default();
    requested.set(Capability::CanEnrollStudents, true);
    let s = h
        .admins
        .create_secondary_admin(&h.primary, new_admin("s@northside.edu", requested))
        .await
        .unwrap()
        .principal;

    // P grants canEnrollTeachers and tries to grant canManageAdmins.
    let mut update = PermissionUpdate::default();
    update.set(Capability::CanEnrollTeachers, true);
    update.set(Capability::CanManageAdmins, true);

    let membership = h
        .admins
        .update_admin_permissions(&h.primary, s.id, &update)
        .await
        .unwrap();

    assert_eq!(
        membership.permissions,
        PermissionSet {
            can_enroll_students: true,
            can_enroll_teachers: true,
            can_manage_classes: false,
            can_view_analytics: false,
            can_manage_content: false,
            can_manage_admins: false,
        }
    );
}

#[tokio::test]
async fn self_and_primary_targets_are_rejected() {
    let h = harness().await;

    let s = h
        .admins
        .create_secondary_admin(
            &h.primary,
            new_admin("s@northside.edu", PermissionUpdate::default()),
        )
        .await
        .unwrap()
        .principal;

    // Self-modification is refused before anything else is looked at.
    let err = h
        .admins
        .update_admin_permissions(&h.primary, h.primary.id, &PermissionUpdate::default())
        .await
        .unwrap_err();
    assert_eq!(deny_reason(err), DenyReason::CannotModifySelf);

    let err = h.admins.remove_admin(&h.primary, h.primary.id).await.unwrap_err();
    assert_eq!(deny_reason(err), DenyReason::CannotRemoveSelf);

    // A superAdmin inside the organization passes the gate, but the
    // primary admin is never a valid target.
    let root = Principal {
        id: 9000,
        email: "root@classgate.example".into(),
        display_name: "Root".into(),
        global_role: Role::SuperAdmin,
        organization_id: Some(h.organization_id),
    };
    let err = h
        .admins
        .update_admin_permissions(&root, h.primary.id, &PermissionUpdate::default())
        .await
        .unwrap_err();
    assert_eq!(deny_reason(err), DenyReason::CannotModifyPrimaryAdmin);

    let err = h.admins.remove_admin(&root, h.primary.id).await.unwrap_err();
    assert_eq!(deny_reason(err), DenyReason::CannotRemovePrimaryAdmin);

    // A secondary admin never even reaches the target checks.
    let err = h.admins.remove_admin(&s, h.primary.id).await.unwrap_err();
    assert_eq!(deny_reason(err), DenyReason::PrimaryAdminRequired);

    // Unknown targets are their own reason.
    let err = h
        .admins
        .update_admin_permissions(&h.primary, 777_777, &PermissionUpdate::default())
        .await
        .unwrap_err();
    assert_eq!(deny_reason(err), DenyReason::AdminNotFound);
}

#[tokio::test]
async fn removal_demotes_and_detaches_in_one_unit() {
    let h = harness().await;

    let s = h
        .admins
        .create_secondary_admin(
            &h.primary,
            new_admin("s@northside.edu", PermissionUpdate::default()),
        )
        .await
        .unwrap()
        .principal;

    h.admins.remove_admin(&h.primary, s.id).await.unwrap();

    let demoted = h.db.principals().find_by_id(s.id).await.unwrap().unwrap();
    assert_eq!(demoted.global_role, Role::SpecialUser);
    assert_eq!(demoted.organization_id, None);

    let org = h
        .db
        .organizations()
        .find_by_id(h.organization_id)
        .await
        .unwrap()
        .unwrap();
    assert!(org.membership_of(s.id).is_none());
    assert_eq!(org.admins.len(), 1);

    // Removing again reports the target as gone, not as an error.
    let err = h.admins.remove_admin(&h.primary, s.id).await.unwrap_err();
    assert_eq!(deny_reason(err), DenyReason::AdminNotFound);
}

#[tokio::test]
async fn concurrent_updates_serialize_instead_of_losing_one() {
    let h = harness().await;

    let mut requested = PermissionUpdate::default();
    requested.set(Capability::CanEnrollStudents, true);
    let s = h
        .admins
        .create_secondary_admin(&h.primary, new_admin("s@northside.edu", requested))
        .await
        .unwrap()
        .principal;

    // Two writers touch distinct capabilities on the same membership. With
    // a lost update one flag would come back false; serialization keeps
    // both.
    let mut grant_teachers = PermissionUpdate::default();
    grant_teachers.set(Capability::CanEnrollTeachers, true);
    let mut grant_classes = PermissionUpdate::default();
    grant_classes.set(Capability::CanManageClasses, true);

    let (a, b) = tokio::join!(
        h.admins.update_admin_permissions(&h.primary, s.id, &grant_teachers),
        h.admins.update_admin_permissions(&h.primary, s.id, &grant_classes),
    );
    a.unwrap();
    b.unwrap();

    let org = h
        .db
        .organizations()
        .find_by_id(h.organization_id)
        .await
        .unwrap()
        .unwrap();
    let final_perms = org.membership_of(s.id).unwrap().permissions;
    assert!(final_perms.can_enroll_students, "original flag kept");
    assert!(final_perms.can_enroll_teachers, "first writer applied");
    assert!(final_perms.can_manage_classes, "second writer applied");
}

#[tokio::test]
async fn roster_listing_is_gated_on_the_primary_admin() {
    let h = harness().await;

    let s = h
        .admins
        .create_secondary_admin(
            &h.primary,
            new_admin("s@northside.edu", PermissionUpdate::default()),
        )
        .await
        .unwrap()
        .principal;

    let roster = h.admins.list_admins(&h.primary).await.unwrap();
    assert_eq!(roster.len(), 2);
    assert!(roster.iter().any(|m| m.is_primary()));

    let err = h.admins.list_admins(&s).await.unwrap_err();
    assert_eq!(deny_reason(err), DenyReason::PrimaryAdminRequired);
}
