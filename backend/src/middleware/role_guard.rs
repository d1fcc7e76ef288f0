//! Request guards: `authenticate` checks the bearer token, the `require_*`
//! guards resolve the caller's role and apply the access gate.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::auth::{self, GateDecision, Role, RoleResolution};
use crate::core::{self, ApiError};
use crate::db;
use crate::services::audit::{self, AuditEvent};

/// Authenticated user, set by `authenticate`. The role is not known yet.
#[derive(Clone, Debug)]
pub struct Identity {
    pub user_id: i64,
    pub email: String,
}

/// Authenticated user whose role passed the gate of the route group.
#[derive(Clone, Debug)]
pub struct Caller {
    pub user_id: i64,
    pub email: String,
    pub role: Role,
}

pub async fn authenticate(
    State(context): State<core::ArcContext>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = identify(&context, &req).map_err(|e| {
        tracing::warn!("Unauthorized access attempt: {}", e);
        ApiError::Unauthenticated
    })?;
    tracing::debug!(user_id = identity.user_id, email = identity.email, "Authenticated user accessing API");
    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

fn identify(context: &core::Context, req: &Request) -> Result<Identity, auth::JwtError> {
    let claims = auth::decode_access_token_from_req(&context.jwt, req)?;
    Ok(Identity {
        user_id: claims.user_id()?,
        email: claims.email,
    })
}

pub async fn require_owner(
    State(context): State<core::ArcContext>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    guard(&context, req, next, &[Role::Owner]).await
}

pub async fn require_tenant(
    State(context): State<core::ArcContext>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    guard(&context, req, next, &[Role::Tenant]).await
}

pub async fn require_admin(
    State(context): State<core::ArcContext>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    guard(&context, req, next, &[Role::Admin]).await
}

/// Any resolved role passes; only a pending role is held back.
pub async fn require_resolved_role(
    State(context): State<core::ArcContext>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    guard(&context, req, next, &Role::ALL).await
}

async fn guard(context: &core::Context, mut req: Request, next: Next, allowed: &[Role]) -> Result<Response, ApiError> {
    let identity = req.extensions().get::<Identity>().cloned();
    let resolution = match &identity {
        Some(identity) => db::resolve_role(&context.db, identity.user_id).await?,
        None => RoleResolution::Anonymous,
    };

    match auth::evaluate(resolution, allowed) {
        GateDecision::Render => {
            let (Some(identity), Some(role)) = (identity, resolution.role()) else {
                return Err(ApiError::Unauthenticated);
            };
            req.extensions_mut().insert(Caller {
                user_id: identity.user_id,
                email: identity.email,
                role,
            });
            Ok(next.run(req).await)
        }
        GateDecision::Loading => Err(ApiError::RolePending),
        GateDecision::Redirect { notice: None, .. } => Err(ApiError::Unauthenticated),
        GateDecision::Redirect { to, notice: Some(_) } => {
            if let (Some(identity), Some(role)) = (identity, resolution.role()) {
                audit::log_event(&AuditEvent::AccessDenied {
                    user_id: identity.user_id,
                    role,
                    path: req.uri().path().to_string(),
                });
            }
            Err(ApiError::Forbidden { redirect: to })
        }
    }
}
