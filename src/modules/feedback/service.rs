use chrono::Utc;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use civicpulse_core::{AppError, PaginationMeta};

use crate::metrics;
use crate::middleware::auth::Identity;
use crate::middleware::scope;
use crate::modules::notifications::service::NotificationService;
use crate::modules::users::model::UserRole;

use super::model::{
    AuthorInfo, CommentWithAuthor, CreateCommentDto, CreateFeedbackDto, FEEDBACK_COLUMNS,
    Feedback, FeedbackDetail, FeedbackFilterParams, MunicipalityInfo, PaginatedFeedbackResponse,
    UpdateFeedbackDto, UpdateStatusDto, next_resolved_at,
};

pub struct FeedbackService;

impl FeedbackService {
    /// Lists feedback visible to the caller.
    ///
    /// ADMIN sees everything (optionally filtered), MUNICIPALITY_ADMIN is
    /// pinned to their own municipality, and a plain USER only ever sees
    /// records they authored — the ownership filter applied at the query
    /// layer.
    #[instrument(skip(db, identity, filters), fields(user.id = %identity.id))]
    pub async fn get_all(
        db: &PgPool,
        identity: &Identity,
        filters: FeedbackFilterParams,
    ) -> Result<PaginatedFeedbackResponse, AppError> {
        let limit = filters.pagination.limit();
        let offset = filters.pagination.offset();

        let (municipality_filter, author_filter) = match identity.role {
            UserRole::Admin => (filters.municipality_id, None),
            UserRole::MunicipalityAdmin => {
                if let Some(requested) = filters.municipality_id {
                    scope::ensure_municipality_scope(identity, Some(requested))?;
                }
                let own = identity.municipality_id.ok_or_else(|| {
                    AppError::bad_request(anyhow::anyhow!("Municipality ID is required"))
                })?;
                (Some(own), None)
            }
            UserRole::User => (filters.municipality_id, Some(identity.id)),
        };

        let mut count_qb =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM feedback WHERE 1=1");
        let mut data_qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM feedback WHERE 1=1",
            FEEDBACK_COLUMNS
        ));

        for qb in [&mut count_qb, &mut data_qb] {
            if let Some(municipality_id) = municipality_filter {
                qb.push(" AND municipality_id = ").push_bind(municipality_id);
            }
            if let Some(author_id) = author_filter {
                qb.push(" AND user_id = ").push_bind(author_id);
            }
            if let Some(status) = filters.status {
                qb.push(" AND status = ").push_bind(status);
            }
            if let Some(category) = filters.category {
                qb.push(" AND category = ").push_bind(category);
            }
        }

        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Database error counting feedback");
                AppError::database(e)
            })?;

        data_qb.push(" ORDER BY created_at DESC");
        data_qb.push(" LIMIT ").push_bind(limit);
        data_qb.push(" OFFSET ").push_bind(offset);

        let feedback = data_qb
            .build_query_as::<Feedback>()
            .fetch_all(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Database error fetching feedback");
                AppError::database(e)
            })?;

        debug!(total = %total, returned = %feedback.len(), "Feedback listed");

        Ok(PaginatedFeedbackResponse {
            meta: PaginationMeta {
                total,
                limit,
                offset: Some(offset),
                page: filters.pagination.page(),
                has_more: offset + limit < total,
            },
            data: feedback,
        })
    }

    /// Fetches one feedback record with author, municipality and comments.
    /// Tenant-scoped: the caller must have access to the owning
    /// municipality.
    #[instrument(skip(db, identity), fields(feedback.id = %id, user.id = %identity.id))]
    pub async fn get_by_id(
        db: &PgPool,
        identity: &Identity,
        id: Uuid,
    ) -> Result<FeedbackDetail, AppError> {
        let feedback = Self::fetch(db, id).await?;

        scope::ensure_municipality_scope(identity, Some(feedback.municipality_id))?;

        let user = sqlx::query_as::<_, AuthorInfo>(
            "SELECT id, name, email FROM users WHERE id = $1",
        )
        .bind(feedback.user_id)
        .fetch_one(db)
        .await
        .map_err(AppError::database)?;

        let municipality = sqlx::query_as::<_, MunicipalityInfo>(
            "SELECT id, name, city FROM municipalities WHERE id = $1",
        )
        .bind(feedback.municipality_id)
        .fetch_one(db)
        .await
        .map_err(AppError::database)?;

        let comments = sqlx::query_as::<_, CommentWithAuthor>(
            "SELECT c.id, c.feedback_id, c.user_id, u.name AS author_name, c.text, c.created_at \
             FROM feedback_comments c \
             INNER JOIN users u ON u.id = c.user_id \
             WHERE c.feedback_id = $1 \
             ORDER BY c.created_at ASC",
        )
        .bind(id)
        .fetch_all(db)
        .await
        .map_err(AppError::database)?;

        Ok(FeedbackDetail {
            feedback,
            user,
            municipality,
            comments,
        })
    }

    /// Creates a feedback record authored by the caller.
    ///
    /// The record starts PENDING with no resolution timestamp; the caller
    /// must be in scope for the target municipality.
    #[instrument(skip(db, identity, dto), fields(user.id = %identity.id, municipality.id = %dto.municipality_id))]
    pub async fn create(
        db: &PgPool,
        identity: &Identity,
        dto: CreateFeedbackDto,
    ) -> Result<Feedback, AppError> {
        scope::ensure_municipality_scope(identity, Some(dto.municipality_id))?;

        let municipality_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM municipalities WHERE id = $1)")
                .bind(dto.municipality_id)
                .fetch_one(db)
                .await
                .map_err(AppError::database)?;

        if !municipality_exists {
            return Err(AppError::not_found(anyhow::anyhow!("Municipality not found")));
        }

        let feedback = sqlx::query_as::<_, Feedback>(&format!(
            "INSERT INTO feedback \
             (description, category, latitude, longitude, address, images, user_id, municipality_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {}",
            FEEDBACK_COLUMNS
        ))
        .bind(&dto.description)
        .bind(dto.category)
        .bind(dto.latitude)
        .bind(dto.longitude)
        .bind(&dto.address)
        .bind(&dto.images)
        .bind(identity.id)
        .bind(dto.municipality_id)
        .fetch_one(db)
        .await
        .map_err(|e| {
            error!(error = %e, "Database error creating feedback");
            AppError::database(e)
        })?;

        metrics::track_feedback_created(feedback.category);
        info!(
            feedback.id = %feedback.id,
            feedback.category = ?feedback.category,
            "Feedback created"
        );

        Ok(feedback)
    }

    /// Applies a partial update to a feedback record.
    ///
    /// Tenant scope plus ownership: a plain USER may only edit their own
    /// report, and never its category — that is a staff attribute.
    #[instrument(skip(db, identity, dto), fields(feedback.id = %id, user.id = %identity.id))]
    pub async fn update(
        db: &PgPool,
        identity: &Identity,
        id: Uuid,
        dto: UpdateFeedbackDto,
    ) -> Result<Feedback, AppError> {
        let current = Self::fetch(db, id).await?;

        scope::ensure_record_mutation(identity, current.municipality_id, current.user_id)?;

        if dto.category.is_some() {
            scope::ensure_staff(identity, current.municipality_id)?;
        }

        let feedback = sqlx::query_as::<_, Feedback>(&format!(
            "UPDATE feedback SET \
             description = COALESCE($1, description), \
             category = COALESCE($2, category), \
             latitude = COALESCE($3, latitude), \
             longitude = COALESCE($4, longitude), \
             address = COALESCE($5, address), \
             images = COALESCE($6, images), \
             updated_at = NOW() \
             WHERE id = $7 \
             RETURNING {}",
            FEEDBACK_COLUMNS
        ))
        .bind(&dto.description)
        .bind(dto.category)
        .bind(dto.latitude)
        .bind(dto.longitude)
        .bind(&dto.address)
        .bind(&dto.images)
        .bind(id)
        .fetch_one(db)
        .await
        .map_err(AppError::database)?;

        info!(feedback.id = %id, "Feedback updated");

        Ok(feedback)
    }

    /// Changes the lifecycle status. Staff only.
    ///
    /// The resolution timestamp follows the status: set on entering
    /// RESOLVED, cleared on leaving it. The report's author is notified
    /// unless they made the change themselves.
    #[instrument(skip(db, identity, dto), fields(feedback.id = %id, user.id = %identity.id))]
    pub async fn update_status(
        db: &PgPool,
        identity: &Identity,
        id: Uuid,
        dto: UpdateStatusDto,
    ) -> Result<Feedback, AppError> {
        let current = Self::fetch(db, id).await?;

        scope::ensure_staff(identity, current.municipality_id)?;

        let resolved_at =
            next_resolved_at(current.status, current.resolved_at, dto.status, Utc::now());

        let feedback = sqlx::query_as::<_, Feedback>(&format!(
            "UPDATE feedback SET status = $1, resolved_at = $2, updated_at = NOW() \
             WHERE id = $3 RETURNING {}",
            FEEDBACK_COLUMNS
        ))
        .bind(dto.status)
        .bind(resolved_at)
        .bind(id)
        .fetch_one(db)
        .await
        .map_err(AppError::database)?;

        metrics::track_feedback_status_change(feedback.status);
        info!(
            feedback.id = %id,
            from = %current.status.as_str(),
            to = %feedback.status.as_str(),
            "Feedback status changed"
        );

        if current.user_id != identity.id {
            // A notification failure should not fail the status change.
            if let Err(e) = NotificationService::notify(
                db,
                current.user_id,
                "Feedback status updated",
                &format!("Your report is now {}", feedback.status.as_str()),
            )
            .await
            {
                warn!(error = %e.error, feedback.id = %id, "Failed to notify feedback author");
            }
        }

        Ok(feedback)
    }

    /// Deletes a feedback record under the same rules as mutation.
    #[instrument(skip(db, identity), fields(feedback.id = %id, user.id = %identity.id))]
    pub async fn delete(db: &PgPool, identity: &Identity, id: Uuid) -> Result<(), AppError> {
        let current = Self::fetch(db, id).await?;

        scope::ensure_record_mutation(identity, current.municipality_id, current.user_id)?;

        sqlx::query("DELETE FROM feedback WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .map_err(AppError::database)?;

        info!(feedback.id = %id, "Feedback deleted");

        Ok(())
    }

    /// Appends a comment. Staff may comment on anything in scope; a plain
    /// USER only on their own report.
    #[instrument(skip(db, identity, dto), fields(feedback.id = %id, user.id = %identity.id))]
    pub async fn add_comment(
        db: &PgPool,
        identity: &Identity,
        id: Uuid,
        dto: CreateCommentDto,
    ) -> Result<CommentWithAuthor, AppError> {
        let current = Self::fetch(db, id).await?;

        scope::ensure_record_mutation(identity, current.municipality_id, current.user_id)?;

        let comment = sqlx::query_as::<_, CommentWithAuthor>(
            "WITH inserted AS ( \
                 INSERT INTO feedback_comments (feedback_id, user_id, text) \
                 VALUES ($1, $2, $3) \
                 RETURNING id, feedback_id, user_id, text, created_at \
             ) \
             SELECT i.id, i.feedback_id, i.user_id, u.name AS author_name, i.text, i.created_at \
             FROM inserted i INNER JOIN users u ON u.id = i.user_id",
        )
        .bind(id)
        .bind(identity.id)
        .bind(&dto.text)
        .fetch_one(db)
        .await
        .map_err(AppError::database)?;

        info!(feedback.id = %id, comment.id = %comment.id, "Comment added");

        Ok(comment)
    }

    async fn fetch(db: &PgPool, id: Uuid) -> Result<Feedback, AppError> {
        sqlx::query_as::<_, Feedback>(&format!(
            "SELECT {} FROM feedback WHERE id = $1",
            FEEDBACK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(db)
        .await
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Feedback not found")))
    }
}
