//! Municipality models, DTOs and the resolution-time aggregation rule.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use civicpulse_core::{PaginationMeta, PaginationParams};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::modules::feedback::model::{FeedbackCategory, FeedbackStatus};

/// Subscription lifecycle state, shared between subscriptions and the
/// municipality's mirrored `subscription_status` column.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "subscription_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionStatus {
    Active,
    Inactive,
    Pending,
    Cancelled,
}

/// A municipality: the tenant boundary of the system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Municipality {
    pub id: Uuid,
    pub name: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub subscription_status: SubscriptionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Columns selected for [`Municipality`] rows.
pub const MUNICIPALITY_COLUMNS: &str = "id, name, city, state, country, contact_email, \
     contact_phone, subscription_status, created_at, updated_at";

/// A municipality joined with its feedback and user counts.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MunicipalityWithCounts {
    pub id: Uuid,
    pub name: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub subscription_status: SubscriptionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub feedback_count: i64,
    pub user_count: i64,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateMunicipalityDto {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1))]
    pub city: String,
    #[validate(length(min = 1))]
    pub state: String,
    #[validate(length(min = 1))]
    pub country: String,
    #[validate(email)]
    pub contact_email: String,
    pub contact_phone: Option<String>,
}

/// Partial update. The mirrored subscription status is deliberately not
/// settable here; it only changes through the subscription routes.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMunicipalityDto {
    #[validate(length(min = 1))]
    pub name: Option<String>,
    #[validate(length(min = 1))]
    pub city: Option<String>,
    #[validate(length(min = 1))]
    pub state: Option<String>,
    #[validate(length(min = 1))]
    pub country: Option<String>,
    #[validate(email)]
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MunicipalityFilterParams {
    pub city: Option<String>,
    pub subscription_status: Option<SubscriptionStatus>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedMunicipalitiesResponse {
    pub data: Vec<MunicipalityWithCounts>,
    pub meta: PaginationMeta,
}

/// Optional reporting window for statistics, matched against `created_at`.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

/// Name/city header on the statistics response.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MunicipalityHeader {
    pub name: String,
    pub city: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MunicipalityStatistics {
    pub municipality: MunicipalityHeader,
    pub total_feedback: i64,
    pub open_issues: i64,
    pub resolved_issues: i64,
    /// Mean resolution time in days, rounded to two decimals; 0 when no
    /// feedback qualifies.
    pub average_resolution_days: f64,
    pub status_distribution: HashMap<FeedbackStatus, i64>,
    pub category_distribution: HashMap<FeedbackCategory, i64>,
    pub date_range: DateRange,
}

/// Mean resolution time in days over `(created_at, resolved_at)` pairs.
///
/// Rows with a timestamp in the future or a negative duration are bad data
/// and are excluded. An empty qualifying set yields exactly 0, never NaN.
pub fn average_resolution_days(
    pairs: &[(DateTime<Utc>, DateTime<Utc>)],
    now: DateTime<Utc>,
) -> f64 {
    let durations: Vec<f64> = pairs
        .iter()
        .filter(|(created, resolved)| created <= &now && resolved <= &now && resolved >= created)
        .map(|(created, resolved)| (*resolved - *created).num_seconds() as f64 / 86_400.0)
        .collect();

    if durations.is_empty() {
        return 0.0;
    }

    let mean = durations.iter().sum::<f64>() / durations.len() as f64;
    (mean * 100.0).round() / 100.0
}
