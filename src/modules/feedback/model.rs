//! Feedback data models, DTOs and the status lifecycle rule.

use chrono::{DateTime, Utc};
use civicpulse_core::serde::deserialize_optional_uuid;
use civicpulse_core::{PaginationMeta, PaginationParams};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "feedback_category", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeedbackCategory {
    Infrastructure,
    Safety,
    Cleanliness,
    Other,
}

impl FeedbackCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackCategory::Infrastructure => "INFRASTRUCTURE",
            FeedbackCategory::Safety => "SAFETY",
            FeedbackCategory::Cleanliness => "CLEANLINESS",
            FeedbackCategory::Other => "OTHER",
        }
    }
}

/// Report lifecycle states. PENDING is the initial state; every
/// staff-permitted transition is allowed in any direction.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "feedback_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeedbackStatus {
    Pending,
    InProgress,
    Resolved,
    Rejected,
}

impl FeedbackStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackStatus::Pending => "PENDING",
            FeedbackStatus::InProgress => "IN_PROGRESS",
            FeedbackStatus::Resolved => "RESOLVED",
            FeedbackStatus::Rejected => "REJECTED",
        }
    }
}

/// Computes the `resolved_at` value after a status change.
///
/// Entering RESOLVED stamps the transition time; leaving RESOLVED clears
/// it; staying RESOLVED keeps the original stamp. This is the whole of the
/// `resolved_at IS NOT NULL ⟺ status = RESOLVED` invariant.
pub fn next_resolved_at(
    current_status: FeedbackStatus,
    current_resolved_at: Option<DateTime<Utc>>,
    new_status: FeedbackStatus,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    match (current_status, new_status) {
        (FeedbackStatus::Resolved, FeedbackStatus::Resolved) => current_resolved_at.or(Some(now)),
        (_, FeedbackStatus::Resolved) => Some(now),
        _ => None,
    }
}

/// A citizen report as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub id: Uuid,
    pub description: String,
    pub category: FeedbackCategory,
    pub status: FeedbackStatus,
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
    pub images: Vec<String>,
    pub user_id: Uuid,
    pub municipality_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Columns selected for [`Feedback`] rows.
pub const FEEDBACK_COLUMNS: &str = "id, description, category, status, latitude, longitude, \
     address, images, user_id, municipality_id, created_at, updated_at, resolved_at";

/// Author summary embedded in detail responses.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthorInfo {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// Municipality summary embedded in detail responses.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MunicipalityInfo {
    pub id: Uuid,
    pub name: String,
    pub city: String,
}

/// A comment joined with its author's name. Comments are append-only.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentWithAuthor {
    pub id: Uuid,
    pub feedback_id: Uuid,
    pub user_id: Uuid,
    pub author_name: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Full feedback detail: record plus author, municipality and discussion.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackDetail {
    #[serde(flatten)]
    pub feedback: Feedback,
    pub user: AuthorInfo,
    pub municipality: MunicipalityInfo,
    pub comments: Vec<CommentWithAuthor>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateFeedbackDto {
    #[validate(length(min = 1))]
    pub description: String,
    pub category: FeedbackCategory,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
    pub address: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    pub municipality_id: Uuid,
}

/// Partial update. Category is staff-only; the rest is author-editable.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFeedbackDto {
    #[validate(length(min = 1))]
    pub description: Option<String>,
    pub category: Option<FeedbackCategory>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
    pub address: Option<String>,
    pub images: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateStatusDto {
    pub status: FeedbackStatus,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateCommentDto {
    #[validate(length(min = 1))]
    pub text: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackFilterParams {
    pub status: Option<FeedbackStatus>,
    pub category: Option<FeedbackCategory>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub municipality_id: Option<Uuid>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedFeedbackResponse {
    pub data: Vec<Feedback>,
    pub meta: PaginationMeta,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn entering_resolved_stamps_now() {
        let now = at(1_000);
        assert_eq!(
            next_resolved_at(FeedbackStatus::Pending, None, FeedbackStatus::Resolved, now),
            Some(now)
        );
        assert_eq!(
            next_resolved_at(
                FeedbackStatus::InProgress,
                None,
                FeedbackStatus::Resolved,
                now
            ),
            Some(now)
        );
        assert_eq!(
            next_resolved_at(FeedbackStatus::Rejected, None, FeedbackStatus::Resolved, now),
            Some(now)
        );
    }

    #[test]
    fn leaving_resolved_clears_the_stamp() {
        let resolved = at(500);
        for target in [
            FeedbackStatus::Pending,
            FeedbackStatus::InProgress,
            FeedbackStatus::Rejected,
        ] {
            assert_eq!(
                next_resolved_at(FeedbackStatus::Resolved, Some(resolved), target, at(1_000)),
                None
            );
        }
    }

    #[test]
    fn staying_resolved_keeps_the_original_stamp() {
        let resolved = at(500);
        assert_eq!(
            next_resolved_at(
                FeedbackStatus::Resolved,
                Some(resolved),
                FeedbackStatus::Resolved,
                at(1_000)
            ),
            Some(resolved)
        );
    }

    #[test]
    fn non_resolved_transitions_have_no_stamp() {
        assert_eq!(
            next_resolved_at(
                FeedbackStatus::Pending,
                None,
                FeedbackStatus::InProgress,
                at(1_000)
            ),
            None
        );
        assert_eq!(
            next_resolved_at(
                FeedbackStatus::InProgress,
                None,
                FeedbackStatus::Rejected,
                at(1_000)
            ),
            None
        );
    }

    #[test]
    fn invariant_holds_for_every_transition() {
        // resolved_at is Some exactly when the new status is RESOLVED.
        let all = [
            FeedbackStatus::Pending,
            FeedbackStatus::InProgress,
            FeedbackStatus::Resolved,
            FeedbackStatus::Rejected,
        ];
        for from in all {
            for to in all {
                let current = (from == FeedbackStatus::Resolved).then(|| at(500));
                let next = next_resolved_at(from, current, to, at(1_000));
                assert_eq!(next.is_some(), to == FeedbackStatus::Resolved);
            }
        }
    }
}
