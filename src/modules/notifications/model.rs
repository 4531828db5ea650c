use chrono::{DateTime, Utc};
use civicpulse_core::{PaginationMeta, PaginationParams};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// An in-app notification. Created server-side (e.g. on feedback status
/// changes); push delivery is out of scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub body: String,
    pub read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Columns selected for [`Notification`] rows.
pub const NOTIFICATION_COLUMNS: &str = "id, user_id, title, body, read, read_at, created_at";

#[derive(Debug, Deserialize, ToSchema)]
pub struct NotificationFilterParams {
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedNotificationsResponse {
    pub data: Vec<Notification>,
    pub meta: PaginationMeta,
}
