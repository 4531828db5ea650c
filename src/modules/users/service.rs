use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use civicpulse_core::{AppError, PaginationMeta, hash_password};

use crate::metrics;
use crate::middleware::auth::Identity;
use crate::modules::users::model::{
    CreateUserDto, PaginatedUsersResponse, USER_COLUMNS, UpdateUserDto, User, UserFilterParams,
    UserRole,
};

pub struct UserService;

impl UserService {
    /// Creates a user. A MUNICIPALITY_ADMIN must be created with a
    /// municipality assignment; duplicate emails are a conflict.
    #[instrument(skip(db, dto), fields(user.email = %dto.email, user.role = ?dto.role))]
    pub async fn create_user(db: &PgPool, dto: CreateUserDto) -> Result<User, AppError> {
        if dto.role == UserRole::MunicipalityAdmin && dto.municipality_id.is_none() {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "A municipality admin requires a municipality"
            )));
        }

        let hashed_password = hash_password(&dto.password)?;
        let language = dto.language.unwrap_or_else(|| "en".to_string());

        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, password, name, phone, role, municipality_id, language) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(&dto.email)
        .bind(&hashed_password)
        .bind(&dto.name)
        .bind(&dto.phone)
        .bind(dto.role)
        .bind(dto.municipality_id)
        .bind(&language)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e
                && db_err.is_unique_violation()
            {
                warn!(user.email = %dto.email, "Attempted to create user with existing email");
                return AppError::conflict(anyhow::anyhow!("Email already exists"));
            }
            error!(error = %e, "Database error creating user");
            AppError::database(e)
        })?;

        metrics::track_user_created(user.role.as_str());
        info!(user.id = %user.id, user.role = %user.role.as_str(), "User created");

        Ok(user)
    }

    /// Lists users. A MUNICIPALITY_ADMIN only ever sees users of their own
    /// municipality.
    #[instrument(skip(db, identity, filters), fields(user.id = %identity.id))]
    pub async fn get_users(
        db: &PgPool,
        identity: &Identity,
        filters: UserFilterParams,
    ) -> Result<PaginatedUsersResponse, AppError> {
        let limit = filters.pagination.limit();
        let offset = filters.pagination.offset();

        let municipality_filter = match identity.role {
            UserRole::Admin => filters.municipality_id,
            _ => {
                // Staff-guarded route; non-admin callers are municipality
                // admins pinned to their own tenant.
                Some(identity.municipality_id.ok_or_else(|| {
                    AppError::bad_request(anyhow::anyhow!("Municipality ID is required"))
                })?)
            }
        };

        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users WHERE 1=1");
        let mut data_qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM users WHERE 1=1",
            USER_COLUMNS
        ));

        for qb in [&mut count_qb, &mut data_qb] {
            if let Some(municipality_id) = municipality_filter {
                qb.push(" AND municipality_id = ").push_bind(municipality_id);
            }
            if let Some(role) = filters.role {
                qb.push(" AND role = ").push_bind(role);
            }
        }

        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Database error counting users");
                AppError::database(e)
            })?;

        data_qb.push(" ORDER BY created_at DESC");
        data_qb.push(" LIMIT ").push_bind(limit);
        data_qb.push(" OFFSET ").push_bind(offset);

        let users = data_qb
            .build_query_as::<User>()
            .fetch_all(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Database error fetching users");
                AppError::database(e)
            })?;

        debug!(total = %total, returned = %users.len(), "Users fetched");

        Ok(PaginatedUsersResponse {
            meta: PaginationMeta {
                total,
                limit,
                offset: Some(offset),
                page: filters.pagination.page(),
                has_more: offset + limit < total,
            },
            data: users,
        })
    }

    #[instrument(skip(db, identity), fields(user.id = %id))]
    pub async fn get_user(db: &PgPool, identity: &Identity, id: Uuid) -> Result<User, AppError> {
        let user = Self::fetch(db, id).await?;
        Self::ensure_tenant_access(identity, &user)?;
        Ok(user)
    }

    /// Applies a partial update.
    ///
    /// Role and municipality assignments are ADMIN-only. A role change to
    /// MUNICIPALITY_ADMIN still requires a municipality.
    #[instrument(skip(db, identity, dto), fields(user.id = %id))]
    pub async fn update_user(
        db: &PgPool,
        identity: &Identity,
        id: Uuid,
        dto: UpdateUserDto,
    ) -> Result<User, AppError> {
        let current = Self::fetch(db, id).await?;
        Self::ensure_tenant_access(identity, &current)?;

        if dto.touches_privileged_fields() && identity.role != UserRole::Admin {
            return Err(AppError::forbidden(anyhow::anyhow!(
                "Only administrators can change roles or municipality assignments"
            )));
        }

        if dto.role == Some(UserRole::MunicipalityAdmin)
            && dto.municipality_id.or(current.municipality_id).is_none()
        {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "A municipality admin requires a municipality"
            )));
        }

        let hashed_password = dto.password.as_deref().map(hash_password).transpose()?;

        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET \
             email = COALESCE($1, email), \
             password = COALESCE($2, password), \
             name = COALESCE($3, name), \
             phone = COALESCE($4, phone), \
             role = COALESCE($5, role), \
             municipality_id = COALESCE($6, municipality_id), \
             language = COALESCE($7, language), \
             updated_at = NOW() \
             WHERE id = $8 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(&dto.email)
        .bind(&hashed_password)
        .bind(&dto.name)
        .bind(&dto.phone)
        .bind(dto.role)
        .bind(dto.municipality_id)
        .bind(&dto.language)
        .bind(id)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e
                && db_err.is_unique_violation()
            {
                return AppError::conflict(anyhow::anyhow!("Email already exists"));
            }
            error!(error = %e, user.id = %id, "Database error updating user");
            AppError::database(e)
        })?;

        info!(user.id = %id, "User updated");

        Ok(user)
    }

    #[instrument(skip(db), fields(user.id = %id))]
    pub async fn delete_user(db: &PgPool, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .map_err(AppError::database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("User not found")));
        }

        info!(user.id = %id, "User deleted");

        Ok(())
    }

    async fn fetch(db: &PgPool, id: Uuid) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(db)
            .await
            .map_err(AppError::database)?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("User not found")))
    }

    /// An ADMIN reaches every user; a MUNICIPALITY_ADMIN only users of
    /// their own municipality.
    fn ensure_tenant_access(identity: &Identity, target: &User) -> Result<(), AppError> {
        if identity.role == UserRole::Admin {
            return Ok(());
        }

        if target.municipality_id.is_some()
            && target.municipality_id == identity.municipality_id
        {
            return Ok(());
        }

        Err(AppError::forbidden(anyhow::anyhow!(
            "Insufficient permissions for this municipality"
        )))
    }
}
