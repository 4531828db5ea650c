//! Role-based authorization middleware.
//!
//! Router-level guards for route groups that are staff- or admin-only.
//! The guard authenticates the request and stashes the resulting
//! [`Identity`] in request extensions, so downstream `AuthUser` extractors
//! reuse it instead of re-verifying the token.

use axum::{
    extract::{FromRequestParts, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use civicpulse_core::AppError;

use crate::middleware::auth::AuthUser;
use crate::modules::users::model::UserRole;
use crate::state::AppState;

pub async fn require_roles(
    State(state): State<AppState>,
    req: Request,
    next: Next,
    allowed_roles: Vec<UserRole>,
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    let auth_user = AuthUser::from_request_parts(&mut parts, &state).await?;

    if !allowed_roles.contains(&auth_user.role()) {
        return Err(AppError::forbidden(anyhow::anyhow!(
            "Insufficient permissions"
        )));
    }

    let req = Request::from_parts(parts, body);
    Ok(next.run(req).await)
}

/// Guard for ADMIN-only route groups (municipality and subscription
/// management).
pub async fn require_admin(State(state): State<AppState>, req: Request, next: Next) -> Response {
    match require_roles(State(state), req, next, vec![UserRole::Admin]).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

/// Guard for staff route groups (user administration): ADMIN or
/// MUNICIPALITY_ADMIN. Tenant scoping happens inside the handlers.
pub async fn require_staff(State(state): State<AppState>, req: Request, next: Next) -> Response {
    match require_roles(
        State(state),
        req,
        next,
        vec![UserRole::Admin, UserRole::MunicipalityAdmin],
    )
    .await
    {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

/// In-handler check for a single required role.
pub fn check_role(auth_user: &AuthUser, required_role: UserRole) -> Result<(), AppError> {
    if auth_user.role() != required_role {
        return Err(AppError::forbidden(anyhow::anyhow!(
            "Insufficient permissions"
        )));
    }
    Ok(())
}

/// In-handler check for any of the allowed roles.
pub fn check_any_role(auth_user: &AuthUser, allowed_roles: &[UserRole]) -> Result<(), AppError> {
    if !allowed_roles.contains(&auth_user.role()) {
        return Err(AppError::forbidden(anyhow::anyhow!(
            "Insufficient permissions"
        )));
    }
    Ok(())
}
