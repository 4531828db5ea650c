use sqlx::PgPool;
use tracing::{debug, instrument};
use uuid::Uuid;

use civicpulse_core::{AppError, PaginationMeta};

use super::model::{NOTIFICATION_COLUMNS, Notification, NotificationFilterParams,
    PaginatedNotificationsResponse};

pub struct NotificationService;

impl NotificationService {
    /// Records a notification for a user. Called from other services.
    #[instrument(skip(db, title, body), fields(user.id = %user_id))]
    pub async fn notify(
        db: &PgPool,
        user_id: Uuid,
        title: &str,
        body: &str,
    ) -> Result<(), AppError> {
        sqlx::query("INSERT INTO notifications (user_id, title, body) VALUES ($1, $2, $3)")
            .bind(user_id)
            .bind(title)
            .bind(body)
            .execute(db)
            .await
            .map_err(AppError::database)?;

        debug!(user.id = %user_id, "Notification recorded");

        Ok(())
    }

    /// Lists the caller's own notifications, newest first.
    #[instrument(skip(db, filters), fields(user.id = %user_id))]
    pub async fn get_for_user(
        db: &PgPool,
        user_id: Uuid,
        filters: NotificationFilterParams,
    ) -> Result<PaginatedNotificationsResponse, AppError> {
        let limit = filters.pagination.limit();
        let offset = filters.pagination.offset();

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(db)
                .await
                .map_err(AppError::database)?;

        let notifications = sqlx::query_as::<_, Notification>(&format!(
            "SELECT {} FROM notifications WHERE user_id = $1 \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3",
            NOTIFICATION_COLUMNS
        ))
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await
        .map_err(AppError::database)?;

        Ok(PaginatedNotificationsResponse {
            meta: PaginationMeta {
                total,
                limit,
                offset: Some(offset),
                page: filters.pagination.page(),
                has_more: offset + limit < total,
            },
            data: notifications,
        })
    }

    /// Marks one of the caller's notifications as read. Reading someone
    /// else's notification is forbidden.
    #[instrument(skip(db), fields(notification.id = %id, user.id = %user_id))]
    pub async fn mark_read(db: &PgPool, user_id: Uuid, id: Uuid) -> Result<Notification, AppError> {
        let notification = sqlx::query_as::<_, Notification>(&format!(
            "SELECT {} FROM notifications WHERE id = $1",
            NOTIFICATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(db)
        .await
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Notification not found")))?;

        if notification.user_id != user_id {
            return Err(AppError::forbidden(anyhow::anyhow!("Access denied")));
        }

        let notification = sqlx::query_as::<_, Notification>(&format!(
            "UPDATE notifications SET read = TRUE, read_at = NOW() WHERE id = $1 RETURNING {}",
            NOTIFICATION_COLUMNS
        ))
        .bind(id)
        .fetch_one(db)
        .await
        .map_err(AppError::database)?;

        Ok(notification)
    }
}
