//! HTTP boundary.
//!
//! Serves `/healthz` and `/metrics` plus a thin JSON surface over the
//! authorization engine and the admin-mutation protocol. No decision logic
//! lives here: handlers resolve the already-authenticated principal from
//! the `x-principal-id` header (session handling happens upstream), call
//! the core, and map reason codes onto status codes.

use crate::authz::AuthorizationEngine;
use crate::db::Database;
use crate::error::ServiceError;
use crate::services::admins::{AdminService, NewAdminRequest};
use crate::telemetry::spans;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use classgate_authz::{Decision, DenyReason, PermissionUpdate, Principal, ResourceKind};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use tracing::{Instrument, error};
use uuid::Uuid;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub engine: AuthorizationEngine,
    pub admins: AdminService,
}

/// Build the service router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics_handler))
        .route("/v1/authorize/resource", post(authorize_resource))
        .route(
            "/v1/organizations/:org/admins",
            get(list_admins).post(create_admin),
        )
        .route(
            "/v1/organizations/:org/admins/:principal",
            patch(update_admin).delete(remove_admin),
        )
        .with_state(state)
}

/// Run the HTTP server.
pub async fn serve(state: AppState, addr: SocketAddr) -> std::io::Result<()> {
    tracing::info!("HTTP server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router(state)).await
}

async fn healthz() -> &'static str {
    "ok"
}

/// Handler for GET /metrics - returns Prometheus metrics in text format.
async fn metrics_handler() -> String {
    crate::metrics::gather_metrics()
}

// ============================================================================
// Error mapping
// ============================================================================

struct ApiError(ServiceError);

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        ApiError(err)
    }
}

fn status_for(reason: &DenyReason) -> StatusCode {
    match reason {
        DenyReason::Unauthenticated => StatusCode::UNAUTHORIZED,
        DenyReason::OrganizationNotFound | DenyReason::AdminNotFound => StatusCode::NOT_FOUND,
        DenyReason::DuplicateEmail => StatusCode::CONFLICT,
        DenyReason::ValidationFailure => StatusCode::UNPROCESSABLE_ENTITY,
        DenyReason::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::FORBIDDEN,
    }
}

fn deny_body(reason: &DenyReason) -> serde_json::Value {
    let mut body = json!({
        "code": reason.code(),
        "message": reason.to_string(),
    });
    if let DenyReason::MissingCapabilities(missing) = reason {
        body["missing"] = json!(missing);
    }
    body
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            ServiceError::Denied(reason) => {
                (status_for(&reason), Json(deny_body(&reason))).into_response()
            }
            ServiceError::Fault(fault) => {
                // Internal faults are logged in full and never rendered as
                // authorization denials.
                error!(error = %fault, "Request failed on an internal fault");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "code": "internal_fault" })),
                )
                    .into_response()
            }
        }
    }
}

// ============================================================================
// Principal resolution
// ============================================================================

/// Resolve the authenticated principal from the `x-principal-id` header.
///
/// A missing or unparsable header resolves to `None`, which the core denies
/// as unauthenticated; this layer never invents a decision of its own.
async fn resolve_principal(
    db: &Database,
    headers: &HeaderMap,
) -> Result<Option<Principal>, ApiError> {
    let Some(raw) = headers.get("x-principal-id").and_then(|v| v.to_str().ok()) else {
        return Ok(None);
    };
    let Ok(id) = raw.parse::<i64>() else {
        return Ok(None);
    };
    db.principals()
        .find_by_id(id)
        .await
        .map_err(|e| ApiError(ServiceError::from_store(e)))
}

fn require_principal(principal: Option<Principal>) -> Result<Principal, ApiError> {
    principal.ok_or(ApiError(ServiceError::Denied(DenyReason::Unauthenticated)))
}

/// The mutation endpoints act on the actor's own organization; a path that
/// names a different one is a malformed request.
fn check_org_path(actor: &Principal, org: i64) -> Result<(), ApiError> {
    if actor.is_super_admin() || actor.organization_id == Some(org) {
        Ok(())
    } else {
        Err(ApiError(ServiceError::Denied(DenyReason::ValidationFailure)))
    }
}

// ============================================================================
// Handlers
// ============================================================================

#[derive(Debug, Deserialize)]
struct AuthorizeResourceBody {
    kind: ResourceKind,
}

async fn authorize_resource(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<AuthorizeResourceBody>,
) -> Result<Response, ApiError> {
    let span = spans::request(&Uuid::new_v4().to_string(), "authorize_resource");
    async {
        let principal = resolve_principal(&state.db, &headers).await?;
        let decision = state
            .engine
            .can_manage_resource(principal.as_ref(), body.kind)
            .await
            .map_err(|f| ApiError(ServiceError::Fault(f)))?;
        match decision {
            Decision::Allow(ctx) => {
                Ok(Json(json!({ "outcome": "allow", "context": ctx })).into_response())
            }
            Decision::Deny(reason) => Ok(ApiError(ServiceError::Denied(reason)).into_response()),
        }
    }
    .instrument(span)
    .await
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateAdminBody {
    email: String,
    display_name: String,
    #[serde(default)]
    permissions: PermissionUpdate,
}

async fn create_admin(
    State(state): State<AppState>,
    Path(org): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<CreateAdminBody>,
) -> Result<Response, ApiError> {
    let span = spans::request(&Uuid::new_v4().to_string(), "create_admin");
    async {
        let actor = require_principal(resolve_principal(&state.db, &headers).await?)?;
        check_org_path(&actor, org)?;

        let created = state
            .admins
            .create_secondary_admin(
                &actor,
                NewAdminRequest {
                    email: body.email,
                    display_name: body.display_name,
                    requested: body.permissions,
                },
            )
            .await?;

        Ok((
            StatusCode::CREATED,
            Json(json!({
                "principal": created.principal,
                "membership": created.membership,
            })),
        )
            .into_response())
    }
    .instrument(span)
    .await
}

async fn list_admins(
    State(state): State<AppState>,
    Path(org): Path<i64>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let actor = require_principal(resolve_principal(&state.db, &headers).await?)?;
    check_org_path(&actor, org)?;
    let admins = state.admins.list_admins(&actor).await?;
    Ok(Json(json!({ "admins": admins })).into_response())
}

async fn update_admin(
    State(state): State<AppState>,
    Path((org, principal)): Path<(i64, i64)>,
    headers: HeaderMap,
    Json(body): Json<PermissionUpdate>,
) -> Result<Response, ApiError> {
    let span = spans::request(&Uuid::new_v4().to_string(), "update_admin");
    async {
        let actor = require_principal(resolve_principal(&state.db, &headers).await?)?;
        check_org_path(&actor, org)?;
        let membership = state
            .admins
            .update_admin_permissions(&actor, principal, &body)
            .await?;
        Ok(Json(json!({ "membership": membership })).into_response())
    }
    .instrument(span)
    .await
}

async fn remove_admin(
    State(state): State<AppState>,
    Path((org, principal)): Path<(i64, i64)>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let span = spans::request(&Uuid::new_v4().to_string(), "remove_admin");
    async {
        let actor = require_principal(resolve_principal(&state.db, &headers).await?)?;
        check_org_path(&actor, org)?;
        state.admins.remove_admin(&actor, principal).await?;
        Ok(StatusCode::NO_CONTENT.into_response())
    }
    .instrument(span)
    .await
}
