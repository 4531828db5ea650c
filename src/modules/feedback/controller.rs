use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::instrument;
use uuid::Uuid;

use civicpulse_core::AppError;

use crate::middleware::auth::AuthUser;
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::model::{
    CommentWithAuthor, CreateCommentDto, CreateFeedbackDto, Feedback, FeedbackDetail,
    FeedbackFilterParams, PaginatedFeedbackResponse, UpdateFeedbackDto, UpdateStatusDto,
};
use super::service::FeedbackService;

/// List feedback visible to the caller
#[utoipa::path(
    get,
    path = "/api/v1/feedback",
    responses(
        (status = 200, description = "Paginated feedback list", body = PaginatedFeedbackResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Feedback"
)]
#[instrument(skip(state, auth_user, filters))]
pub async fn get_feedback(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(filters): Query<FeedbackFilterParams>,
) -> Result<Json<PaginatedFeedbackResponse>, AppError> {
    let response = FeedbackService::get_all(&state.db, &auth_user.0, filters).await?;
    Ok(Json(response))
}

/// Get one feedback record with comments
#[utoipa::path(
    get,
    path = "/api/v1/feedback/{id}",
    responses(
        (status = 200, description = "Feedback detail", body = FeedbackDetail),
        (status = 403, description = "Out of scope", body = ErrorResponse),
        (status = 404, description = "Feedback not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Feedback"
)]
#[instrument(skip(state, auth_user))]
pub async fn get_feedback_by_id(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<FeedbackDetail>, AppError> {
    let detail = FeedbackService::get_by_id(&state.db, &auth_user.0, id).await?;
    Ok(Json(detail))
}

/// Submit a feedback report
#[utoipa::path(
    post,
    path = "/api/v1/feedback",
    request_body = CreateFeedbackDto,
    responses(
        (status = 201, description = "Feedback created", body = Feedback),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 403, description = "Out of scope", body = ErrorResponse),
        (status = 404, description = "Municipality not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Feedback"
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn create_feedback(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<CreateFeedbackDto>,
) -> Result<(StatusCode, Json<Feedback>), AppError> {
    let feedback = FeedbackService::create(&state.db, &auth_user.0, dto).await?;
    Ok((StatusCode::CREATED, Json(feedback)))
}

/// Update a feedback report
#[utoipa::path(
    patch,
    path = "/api/v1/feedback/{id}",
    request_body = UpdateFeedbackDto,
    responses(
        (status = 200, description = "Feedback updated", body = Feedback),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 403, description = "Out of scope or not the author", body = ErrorResponse),
        (status = 404, description = "Feedback not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Feedback"
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn update_feedback(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateFeedbackDto>,
) -> Result<Json<Feedback>, AppError> {
    let feedback = FeedbackService::update(&state.db, &auth_user.0, id, dto).await?;
    Ok(Json(feedback))
}

/// Change a feedback report's lifecycle status (staff only)
#[utoipa::path(
    patch,
    path = "/api/v1/feedback/{id}/status",
    request_body = UpdateStatusDto,
    responses(
        (status = 200, description = "Status changed", body = Feedback),
        (status = 403, description = "Not municipal staff", body = ErrorResponse),
        (status = 404, description = "Feedback not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Feedback"
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn update_feedback_status(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateStatusDto>,
) -> Result<Json<Feedback>, AppError> {
    let feedback = FeedbackService::update_status(&state.db, &auth_user.0, id, dto).await?;
    Ok(Json(feedback))
}

/// Delete a feedback report
#[utoipa::path(
    delete,
    path = "/api/v1/feedback/{id}",
    responses(
        (status = 204, description = "Feedback deleted"),
        (status = 403, description = "Out of scope or not the author", body = ErrorResponse),
        (status = 404, description = "Feedback not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Feedback"
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_feedback(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    FeedbackService::delete(&state.db, &auth_user.0, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Comment on a feedback report
#[utoipa::path(
    post,
    path = "/api/v1/feedback/{id}/comments",
    request_body = CreateCommentDto,
    responses(
        (status = 201, description = "Comment added", body = CommentWithAuthor),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 403, description = "Out of scope or not the author", body = ErrorResponse),
        (status = 404, description = "Feedback not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Feedback"
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn add_comment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<CreateCommentDto>,
) -> Result<(StatusCode, Json<CommentWithAuthor>), AppError> {
    let comment = FeedbackService::add_comment(&state.db, &auth_user.0, id, dto).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}
