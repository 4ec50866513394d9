//! The authorization engine.
//!
//! One central decision function evaluates every request; handlers and
//! services never re-implement role or capability checks. Each call:
//!
//! 1. Evaluates the fixed short-circuit check order
//! 2. Logs the grant (or denial) with its reason code for audit
//! 3. Records the decision in metrics
//!
//! The order matters: later checks assume earlier ones passed, and a given
//! failure class always produces the same reason code. A store that does not
//! answer in time yields `Deny(StoreUnavailable)`, never an implicit allow
//! or an ordinary deny. Aggregate integrity breaches abort the request as a
//! fault instead of leaking into the deny taxonomy.

use crate::db::Database;
use crate::error::Fault;
use crate::metrics;
use crate::telemetry::OperationTimer;
use classgate_authz::{
    AuthorizationContext, Decision, DenyReason, Principal, Requirement, ResourceKind,
};
use tracing::debug;

/// Central authorization decision engine.
///
/// Stateless and reentrant: every call is independent, reads the
/// organization aggregate at most once, and takes no locks.
#[derive(Clone)]
pub struct AuthorizationEngine {
    db: Database,
}

impl AuthorizationEngine {
    /// Create an engine over the record store.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Decide whether `principal` satisfies `requirement`.
    ///
    /// `None` means the caller was never authenticated. The returned
    /// [`Decision`] is always structured; `Err` is reserved for internal
    /// faults that must not read as denials.
    pub async fn authorize(
        &self,
        principal: Option<&Principal>,
        requirement: &Requirement,
    ) -> Result<Decision, Fault> {
        let _timer = OperationTimer::new("authorize");
        let decision = self.evaluate(principal, requirement).await?;

        let principal_id = principal.map(|p| p.id).unwrap_or(-1);
        match &decision {
            Decision::Allow(_) => {
                debug!(
                    principal = principal_id,
                    requirement = %requirement.summary(),
                    "authorization granted"
                );
            }
            Decision::Deny(reason) => {
                debug!(
                    principal = principal_id,
                    requirement = %requirement.summary(),
                    reason = reason.code(),
                    "authorization denied"
                );
            }
        }
        metrics::record_decision(decision.label());

        Ok(decision)
    }

    /// Resource-kind shorthand: authorize managing `kind`.
    ///
    /// The kind→capability table is a closed, exhaustive mapping; there is
    /// no unknown-kind case to deny at request time.
    pub async fn can_manage_resource(
        &self,
        principal: Option<&Principal>,
        kind: ResourceKind,
    ) -> Result<Decision, Fault> {
        self.authorize(
            principal,
            &Requirement::admin_capabilities([kind.required_capability()]),
        )
        .await
    }

    async fn evaluate(
        &self,
        principal: Option<&Principal>,
        requirement: &Requirement,
    ) -> Result<Decision, Fault> {
        // 1. Authentication is the precondition for everything else.
        let Some(principal) = principal else {
            return Ok(Decision::Deny(DenyReason::Unauthenticated));
        };

        // 2. superAdmin overrides every requirement, including
        // organization-scoped ones. The context stays empty: no membership
        // was consulted, so none is fabricated.
        if principal.is_super_admin() {
            return Ok(Decision::Allow(AuthorizationContext::empty()));
        }

        // 3. Exact-role gate.
        if let Some(roles) = &requirement.exact_roles
            && !roles.contains(&principal.global_role)
        {
            return Ok(Decision::Deny(DenyReason::WrongRole));
        }

        // 4. Minimum-role gate.
        if let Some(min) = requirement.min_role
            && !principal.global_role.at_least(min)
        {
            return Ok(Decision::Deny(DenyReason::InsufficientRoleLevel));
        }

        // 5. Organization-scoped checks; the store is consulted only past
        // the role gates.
        if !requirement.needs_organization() {
            return Ok(Decision::Allow(AuthorizationContext::empty()));
        }

        let Some(organization_id) = principal.organization_id else {
            return Ok(Decision::Deny(DenyReason::NoOrganization));
        };

        let organization = match self.db.organizations().find_by_id(organization_id).await {
            Ok(Some(org)) => org,
            // The principal references a now-missing organization: a
            // consistency fault for that reference, reported as its own
            // reason so the boundary can distinguish it.
            Ok(None) => return Ok(Decision::Deny(DenyReason::OrganizationNotFound)),
            Err(e) if e.is_unavailable() => {
                return Ok(Decision::Deny(DenyReason::StoreUnavailable));
            }
            Err(e) => return Err(Fault::Store(e)),
        };

        organization.validate()?;

        let Some(membership) = organization.membership_of(principal.id) else {
            return Ok(Decision::Deny(DenyReason::NotAnAdminOfOrganization));
        };

        if requirement.primary_admin_only && !membership.is_primary() {
            return Ok(Decision::Deny(DenyReason::PrimaryAdminRequired));
        }

        let missing = membership.permissions.missing(&requirement.capabilities);
        if !missing.is_empty() {
            return Ok(Decision::Deny(DenyReason::MissingCapabilities(missing)));
        }

        // 6. Everything passed; hand back the looked-up state.
        Ok(Decision::Allow(AuthorizationContext::for_membership(
            organization.id,
            membership,
        )))
    }
}
