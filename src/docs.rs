use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use civicpulse_core::{PaginationMeta, PaginationParams};

use crate::modules::auth::controller::ErrorResponse;
use crate::modules::auth::model::{
    AccessTokenResponse, LoginRequest, LoginResponse, MessageResponse, RefreshTokenRequest,
};
use crate::modules::feedback::model::{
    AuthorInfo, CommentWithAuthor, CreateCommentDto, CreateFeedbackDto, Feedback,
    FeedbackCategory, FeedbackDetail, FeedbackFilterParams, FeedbackStatus, MunicipalityInfo,
    PaginatedFeedbackResponse, UpdateFeedbackDto, UpdateStatusDto,
};
use crate::modules::municipalities::model::{
    CreateMunicipalityDto, DateRange, Municipality, MunicipalityFilterParams, MunicipalityHeader,
    MunicipalityStatistics, MunicipalityWithCounts, PaginatedMunicipalitiesResponse,
    SubscriptionStatus, UpdateMunicipalityDto,
};
use crate::modules::notifications::model::{
    Notification, NotificationFilterParams, PaginatedNotificationsResponse,
};
use crate::modules::subscriptions::model::{
    CreateSubscriptionDto, PaginatedSubscriptionsResponse, PaymentStatus, Subscription,
    SubscriptionFilterParams, SubscriptionPlan, SubscriptionWithMunicipality,
    UpdateSubscriptionDto,
};
use crate::modules::users::model::{
    CreateUserDto, PaginatedUsersResponse, UpdateUserDto, User, UserFilterParams, UserRole,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::auth::controller::login,
        crate::modules::auth::controller::refresh_token,
        crate::modules::auth::controller::logout,
        crate::modules::auth::controller::me,
        crate::modules::feedback::controller::get_feedback,
        crate::modules::feedback::controller::get_feedback_by_id,
        crate::modules::feedback::controller::create_feedback,
        crate::modules::feedback::controller::update_feedback,
        crate::modules::feedback::controller::update_feedback_status,
        crate::modules::feedback::controller::delete_feedback,
        crate::modules::feedback::controller::add_comment,
        crate::modules::municipalities::controller::get_municipalities,
        crate::modules::municipalities::controller::get_municipality,
        crate::modules::municipalities::controller::create_municipality,
        crate::modules::municipalities::controller::update_municipality,
        crate::modules::municipalities::controller::delete_municipality,
        crate::modules::municipalities::controller::get_municipality_statistics,
        crate::modules::users::controller::create_user,
        crate::modules::users::controller::get_users,
        crate::modules::users::controller::get_user,
        crate::modules::users::controller::update_user,
        crate::modules::users::controller::delete_user,
        crate::modules::subscriptions::controller::create_subscription,
        crate::modules::subscriptions::controller::get_subscriptions,
        crate::modules::subscriptions::controller::get_subscription,
        crate::modules::subscriptions::controller::update_subscription,
        crate::modules::notifications::controller::get_notifications,
        crate::modules::notifications::controller::mark_notification_read,
    ),
    components(
        schemas(
            ErrorResponse,
            MessageResponse,
            LoginRequest,
            LoginResponse,
            RefreshTokenRequest,
            AccessTokenResponse,
            User,
            UserRole,
            CreateUserDto,
            UpdateUserDto,
            UserFilterParams,
            PaginatedUsersResponse,
            Feedback,
            FeedbackCategory,
            FeedbackStatus,
            FeedbackDetail,
            AuthorInfo,
            MunicipalityInfo,
            CommentWithAuthor,
            CreateFeedbackDto,
            UpdateFeedbackDto,
            UpdateStatusDto,
            CreateCommentDto,
            FeedbackFilterParams,
            PaginatedFeedbackResponse,
            Municipality,
            MunicipalityWithCounts,
            MunicipalityHeader,
            MunicipalityStatistics,
            DateRange,
            SubscriptionStatus,
            CreateMunicipalityDto,
            UpdateMunicipalityDto,
            MunicipalityFilterParams,
            PaginatedMunicipalitiesResponse,
            Subscription,
            SubscriptionPlan,
            PaymentStatus,
            SubscriptionWithMunicipality,
            CreateSubscriptionDto,
            UpdateSubscriptionDto,
            SubscriptionFilterParams,
            PaginatedSubscriptionsResponse,
            Notification,
            NotificationFilterParams,
            PaginatedNotificationsResponse,
            PaginationMeta,
            PaginationParams,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Login, token refresh and logout"),
        (name = "Feedback", description = "Citizen feedback reports and comments"),
        (name = "Municipalities", description = "Municipality management and statistics"),
        (name = "Users", description = "User administration"),
        (name = "Subscriptions", description = "Municipality billing records"),
        (name = "Notifications", description = "In-app notifications")
    ),
    info(
        title = "CivicPulse API",
        version = "0.1.0",
        description = "A municipal citizen-feedback REST API built with Rust, Axum, and PostgreSQL. \
            Citizens submit location-tagged reports, municipal staff triage and resolve them, \
            administrators manage municipalities, users and subscriptions."
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
