use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use tracing::instrument;
use uuid::Uuid;

use civicpulse_core::AppError;

use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::model::{
    CreateSubscriptionDto, PaginatedSubscriptionsResponse, Subscription,
    SubscriptionFilterParams, SubscriptionWithMunicipality, UpdateSubscriptionDto,
};
use super::service::SubscriptionService;

// The whole subscription router sits behind the ADMIN guard.

/// Create a subscription
#[utoipa::path(
    post,
    path = "/api/v1/subscriptions",
    request_body = CreateSubscriptionDto,
    responses(
        (status = 201, description = "Subscription created", body = Subscription),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 403, description = "Not an administrator", body = ErrorResponse),
        (status = 404, description = "Municipality not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Subscriptions"
)]
#[instrument(skip(state, dto))]
pub async fn create_subscription(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<CreateSubscriptionDto>,
) -> Result<(StatusCode, Json<Subscription>), AppError> {
    let subscription = SubscriptionService::create(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(subscription)))
}

/// List subscriptions
#[utoipa::path(
    get,
    path = "/api/v1/subscriptions",
    responses(
        (status = 200, description = "Paginated subscription list", body = PaginatedSubscriptionsResponse),
        (status = 403, description = "Not an administrator", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Subscriptions"
)]
#[instrument(skip(state, filters))]
pub async fn get_subscriptions(
    State(state): State<AppState>,
    Query(filters): Query<SubscriptionFilterParams>,
) -> Result<Json<PaginatedSubscriptionsResponse>, AppError> {
    let response = SubscriptionService::get_all(&state.db, filters).await?;
    Ok(Json(response))
}

/// Get a subscription
#[utoipa::path(
    get,
    path = "/api/v1/subscriptions/{id}",
    responses(
        (status = 200, description = "Subscription detail", body = SubscriptionWithMunicipality),
        (status = 403, description = "Not an administrator", body = ErrorResponse),
        (status = 404, description = "Subscription not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Subscriptions"
)]
#[instrument(skip(state))]
pub async fn get_subscription(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SubscriptionWithMunicipality>, AppError> {
    let subscription = SubscriptionService::get_by_id(&state.db, id).await?;
    Ok(Json(subscription))
}

/// Update a subscription
#[utoipa::path(
    patch,
    path = "/api/v1/subscriptions/{id}",
    request_body = UpdateSubscriptionDto,
    responses(
        (status = 200, description = "Subscription updated", body = Subscription),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 403, description = "Not an administrator", body = ErrorResponse),
        (status = 404, description = "Subscription not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Subscriptions"
)]
#[instrument(skip(state, dto))]
pub async fn update_subscription(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateSubscriptionDto>,
) -> Result<Json<Subscription>, AppError> {
    let subscription = SubscriptionService::update(&state.db, id, dto).await?;
    Ok(Json(subscription))
}
