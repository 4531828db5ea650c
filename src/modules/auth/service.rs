use chrono::{Duration, Utc};
use sqlx::PgPool;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use civicpulse_auth::{create_access_token, create_refresh_token, verify_refresh_token};
use civicpulse_config::JwtConfig;
use civicpulse_core::{AppError, verify_password};

use crate::metrics;
use crate::modules::users::model::{USER_COLUMNS, User, UserRole};

use super::model::{AccessTokenResponse, LoginRequest, LoginResponse, StoredRefreshToken};

pub struct AuthService;

impl AuthService {
    /// Verifies credentials, issues an access/refresh token pair and
    /// persists the refresh token for later revocation.
    ///
    /// Unknown email and wrong password are indistinguishable to the
    /// caller; neither issues nor persists anything.
    #[instrument(skip(db, dto, jwt_config), fields(user.email = %dto.email))]
    pub async fn login(
        db: &PgPool,
        dto: LoginRequest,
        jwt_config: &JwtConfig,
    ) -> Result<LoginResponse, AppError> {
        #[derive(sqlx::FromRow)]
        struct UserWithPassword {
            id: Uuid,
            email: String,
            password: String,
            name: String,
            phone: Option<String>,
            role: UserRole,
            municipality_id: Option<Uuid>,
            language: String,
            created_at: chrono::DateTime<Utc>,
            updated_at: chrono::DateTime<Utc>,
        }

        let row = sqlx::query_as::<_, UserWithPassword>(
            "SELECT id, email, password, name, phone, role, municipality_id, language, \
             created_at, updated_at FROM users WHERE email = $1",
        )
        .bind(&dto.email)
        .fetch_optional(db)
        .await
        .map_err(AppError::database)?
        .ok_or_else(|| {
            warn!(user.email = %dto.email, "Login attempt for unknown email");
            metrics::track_login_failure("unknown_email");
            AppError::unauthorized(anyhow::anyhow!("Invalid credentials"))
        })?;

        if !verify_password(&dto.password, &row.password)? {
            warn!(user.email = %dto.email, "Login attempt with wrong password");
            metrics::track_login_failure("wrong_password");
            return Err(AppError::unauthorized(anyhow::anyhow!("Invalid credentials")));
        }

        let access_token = create_access_token(row.id, row.role.as_str(), jwt_config)?;
        let refresh_token = create_refresh_token(row.id, jwt_config)?;

        let expires_at = Utc::now() + Duration::seconds(jwt_config.refresh_token_expiry);
        sqlx::query("INSERT INTO refresh_tokens (token, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(&refresh_token)
            .bind(row.id)
            .bind(expires_at)
            .execute(db)
            .await
            .map_err(AppError::database)?;

        metrics::track_login_success(row.role.as_str());
        metrics::track_jwt_issued();
        info!(user.id = %row.id, user.role = %row.role.as_str(), "Login successful");

        Ok(LoginResponse {
            access_token,
            refresh_token,
            user: User {
                id: row.id,
                email: row.email,
                name: row.name,
                phone: row.phone,
                role: row.role,
                municipality_id: row.municipality_id,
                language: row.language,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
        })
    }

    /// Exchanges a persisted refresh token for a new access token.
    ///
    /// The refresh token itself is not rotated. A stored row past its
    /// expiry is deleted on sight.
    #[instrument(skip_all)]
    pub async fn refresh(
        db: &PgPool,
        refresh_token: &str,
        jwt_config: &JwtConfig,
    ) -> Result<AccessTokenResponse, AppError> {
        verify_refresh_token(refresh_token, jwt_config)?;

        let stored = sqlx::query_as::<_, StoredRefreshToken>(
            "SELECT token, user_id, expires_at FROM refresh_tokens WHERE token = $1",
        )
        .bind(refresh_token)
        .fetch_optional(db)
        .await
        .map_err(AppError::database)?
        .ok_or_else(|| {
            AppError::unauthorized(anyhow::anyhow!("Invalid or expired refresh token"))
        })?;

        if stored.expires_at < Utc::now() {
            debug!(user.id = %stored.user_id, "Deleting expired refresh token");
            sqlx::query("DELETE FROM refresh_tokens WHERE token = $1")
                .bind(refresh_token)
                .execute(db)
                .await
                .map_err(AppError::database)?;
            return Err(AppError::unauthorized(anyhow::anyhow!(
                "Invalid or expired refresh token"
            )));
        }

        let role = sqlx::query_scalar::<_, UserRole>("SELECT role FROM users WHERE id = $1")
            .bind(stored.user_id)
            .fetch_optional(db)
            .await
            .map_err(AppError::database)?
            .ok_or_else(|| {
                AppError::unauthorized(anyhow::anyhow!("Invalid or expired refresh token"))
            })?;

        let access_token = create_access_token(stored.user_id, role.as_str(), jwt_config)?;
        metrics::track_jwt_issued();

        Ok(AccessTokenResponse { access_token })
    }

    /// Revokes a refresh token. Revoking a token that is already gone is
    /// a success: logout is idempotent.
    #[instrument(skip_all)]
    pub async fn logout(db: &PgPool, refresh_token: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE token = $1")
            .bind(refresh_token)
            .execute(db)
            .await
            .map_err(AppError::database)?;

        if result.rows_affected() == 0 {
            debug!("Logout with already-revoked refresh token");
        }

        Ok(())
    }

    /// Returns the authenticated user's current record.
    #[instrument(skip(db))]
    pub async fn me(db: &PgPool, user_id: Uuid) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(db)
        .await
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::unauthorized(anyhow::anyhow!("User not found")))
    }
}
