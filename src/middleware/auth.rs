use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

use civicpulse_auth::verify_token;
use civicpulse_core::AppError;

use crate::modules::users::model::UserRole;
use crate::state::AppState;

/// The authenticated caller, as established for this request.
///
/// Produced only after the bearer token verified and the user row was
/// re-fetched, so `role` and `municipality_id` reflect current database
/// state, not what the token claimed at issuance.
#[derive(Debug, Clone)]
pub struct Identity {
    pub id: Uuid,
    pub role: UserRole,
    pub municipality_id: Option<Uuid>,
}

#[derive(FromRow)]
struct IdentityRow {
    id: Uuid,
    role: UserRole,
    municipality_id: Option<Uuid>,
}

/// Extractor that validates the bearer token and yields the caller's
/// [`Identity`].
///
/// Failure modes, all 401: missing header, malformed header, invalid or
/// expired token, user no longer present, or a persisted role that diverged
/// from the token's role (stale-role detection).
#[derive(Debug, Clone)]
pub struct AuthUser(pub Identity);

impl AuthUser {
    pub fn user_id(&self) -> Uuid {
        self.0.id
    }

    pub fn role(&self) -> UserRole {
        self.0.role
    }

    pub fn municipality_id(&self) -> Option<Uuid> {
        self.0.municipality_id
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // A role-guard layer may already have authenticated this request.
        if let Some(identity) = parts.extensions.get::<Identity>() {
            return Ok(AuthUser(identity.clone()));
        }

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                AppError::unauthorized(anyhow::anyhow!("Missing authorization header"))
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::unauthorized(anyhow::anyhow!("Invalid authorization header format"))
        })?;

        let claims = verify_token(token, &state.jwt_config)?;

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::unauthorized(anyhow::anyhow!("Invalid subject in token")))?;

        let token_role = UserRole::from_str(&claims.role)
            .map_err(|_| AppError::unauthorized(anyhow::anyhow!("Invalid role in token")))?;

        // Re-fetch the user so deleted accounts and role changes invalidate
        // outstanding tokens.
        let row = sqlx::query_as::<_, IdentityRow>(
            "SELECT id, role, municipality_id FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&state.db)
        .await
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::unauthorized(anyhow::anyhow!("Invalid token")))?;

        if row.role != token_role {
            return Err(AppError::unauthorized(anyhow::anyhow!(
                "Role has changed, please log in again"
            )));
        }

        let identity = Identity {
            id: row.id,
            role: row.role,
            municipality_id: row.municipality_id,
        };

        parts.extensions.insert(identity.clone());

        Ok(AuthUser(identity))
    }
}
