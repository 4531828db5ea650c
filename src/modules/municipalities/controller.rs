use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use tracing::instrument;
use uuid::Uuid;

use civicpulse_core::AppError;

use crate::middleware::auth::AuthUser;
use crate::middleware::role::check_role;
use crate::modules::auth::controller::ErrorResponse;
use crate::modules::users::model::UserRole;
use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::model::{
    CreateMunicipalityDto, DateRange, Municipality, MunicipalityFilterParams,
    MunicipalityStatistics, MunicipalityWithCounts, PaginatedMunicipalitiesResponse,
    UpdateMunicipalityDto,
};
use super::service::MunicipalityService;

/// List municipalities
#[utoipa::path(
    get,
    path = "/api/v1/municipalities",
    responses(
        (status = 200, description = "Paginated municipality list", body = PaginatedMunicipalitiesResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Municipalities"
)]
#[instrument(skip(state, _auth_user, filters))]
pub async fn get_municipalities(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Query(filters): Query<MunicipalityFilterParams>,
) -> Result<Json<PaginatedMunicipalitiesResponse>, AppError> {
    let response = MunicipalityService::get_all(&state.db, filters).await?;
    Ok(Json(response))
}

/// Get a municipality with its feedback and user counts
#[utoipa::path(
    get,
    path = "/api/v1/municipalities/{id}",
    responses(
        (status = 200, description = "Municipality detail", body = MunicipalityWithCounts),
        (status = 404, description = "Municipality not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Municipalities"
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_municipality(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MunicipalityWithCounts>, AppError> {
    let municipality = MunicipalityService::get_by_id(&state.db, id).await?;
    Ok(Json(municipality))
}

/// Create a municipality (ADMIN only)
#[utoipa::path(
    post,
    path = "/api/v1/municipalities",
    request_body = CreateMunicipalityDto,
    responses(
        (status = 201, description = "Municipality created", body = Municipality),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 403, description = "Not an administrator", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Municipalities"
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn create_municipality(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<CreateMunicipalityDto>,
) -> Result<(StatusCode, Json<Municipality>), AppError> {
    check_role(&auth_user, UserRole::Admin)?;
    let municipality = MunicipalityService::create(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(municipality)))
}

/// Update a municipality (ADMIN only)
#[utoipa::path(
    patch,
    path = "/api/v1/municipalities/{id}",
    request_body = UpdateMunicipalityDto,
    responses(
        (status = 200, description = "Municipality updated", body = Municipality),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 403, description = "Not an administrator", body = ErrorResponse),
        (status = 404, description = "Municipality not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Municipalities"
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn update_municipality(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateMunicipalityDto>,
) -> Result<Json<Municipality>, AppError> {
    check_role(&auth_user, UserRole::Admin)?;
    let municipality = MunicipalityService::update(&state.db, id, dto).await?;
    Ok(Json(municipality))
}

/// Delete a municipality (ADMIN only)
#[utoipa::path(
    delete,
    path = "/api/v1/municipalities/{id}",
    responses(
        (status = 204, description = "Municipality deleted"),
        (status = 403, description = "Not an administrator", body = ErrorResponse),
        (status = 404, description = "Municipality not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Municipalities"
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_municipality(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    check_role(&auth_user, UserRole::Admin)?;
    MunicipalityService::delete(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Feedback statistics for a municipality (tenant-scoped)
#[utoipa::path(
    get,
    path = "/api/v1/municipalities/{id}/statistics",
    responses(
        (status = 200, description = "Municipality statistics", body = MunicipalityStatistics),
        (status = 403, description = "Out of scope", body = ErrorResponse),
        (status = 404, description = "Municipality not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Municipalities"
)]
#[instrument(skip(state, auth_user, range))]
pub async fn get_municipality_statistics(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Query(range): Query<DateRange>,
) -> Result<Json<MunicipalityStatistics>, AppError> {
    let statistics = MunicipalityService::statistics(&state.db, &auth_user.0, id, range).await?;
    Ok(Json(statistics))
}
