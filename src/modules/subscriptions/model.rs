use chrono::{DateTime, Utc};
use civicpulse_core::serde::deserialize_optional_uuid;
use civicpulse_core::{PaginationMeta, PaginationParams};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::modules::municipalities::model::SubscriptionStatus;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "subscription_plan", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionPlan {
    Basic,
    Premium,
    Enterprise,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "payment_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Paid,
    Pending,
    Failed,
}

/// A municipality's billing record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: Uuid,
    pub municipality_id: Uuid,
    pub plan: SubscriptionPlan,
    pub status: SubscriptionStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: Option<String>,
    pub amount: f64,
    pub valid_until: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Columns selected for [`Subscription`] rows.
pub const SUBSCRIPTION_COLUMNS: &str = "id, municipality_id, plan, status, payment_status, \
     payment_method, amount, valid_until, created_at, updated_at";

/// A subscription joined with its municipality's name and city.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionWithMunicipality {
    pub id: Uuid,
    pub municipality_id: Uuid,
    pub plan: SubscriptionPlan,
    pub status: SubscriptionStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: Option<String>,
    pub amount: f64,
    pub valid_until: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub municipality_name: String,
    pub municipality_city: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubscriptionDto {
    pub municipality_id: Uuid,
    pub plan: SubscriptionPlan,
    pub status: Option<SubscriptionStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub payment_method: Option<String>,
    #[validate(range(exclusive_min = 0.0))]
    pub amount: f64,
    pub valid_until: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSubscriptionDto {
    pub plan: Option<SubscriptionPlan>,
    pub status: Option<SubscriptionStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub payment_method: Option<String>,
    #[validate(range(exclusive_min = 0.0))]
    pub amount: Option<f64>,
    pub valid_until: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionFilterParams {
    pub status: Option<SubscriptionStatus>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub municipality_id: Option<Uuid>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedSubscriptionsResponse {
    pub data: Vec<SubscriptionWithMunicipality>,
    pub meta: PaginationMeta,
}
