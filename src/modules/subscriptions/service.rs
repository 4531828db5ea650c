use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use civicpulse_core::{AppError, PaginationMeta};

use crate::modules::municipalities::model::SubscriptionStatus;

use super::model::{
    CreateSubscriptionDto, PaginatedSubscriptionsResponse, PaymentStatus, SUBSCRIPTION_COLUMNS,
    Subscription, SubscriptionFilterParams, SubscriptionWithMunicipality, UpdateSubscriptionDto,
};

const SUBSCRIPTION_WITH_MUNICIPALITY: &str = "s.id, s.municipality_id, s.plan, s.status, \
     s.payment_status, s.payment_method, s.amount, s.valid_until, s.created_at, s.updated_at, \
     m.name AS municipality_name, m.city AS municipality_city";

pub struct SubscriptionService;

impl SubscriptionService {
    /// Creates a subscription and mirrors its status onto the
    /// municipality's `subscription_status` in the same transaction, so the
    /// two can never diverge.
    #[instrument(skip(db, dto), fields(municipality.id = %dto.municipality_id, plan = ?dto.plan))]
    pub async fn create(
        db: &PgPool,
        dto: CreateSubscriptionDto,
    ) -> Result<Subscription, AppError> {
        let municipality_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM municipalities WHERE id = $1)")
                .bind(dto.municipality_id)
                .fetch_one(db)
                .await
                .map_err(AppError::database)?;

        if !municipality_exists {
            return Err(AppError::not_found(anyhow::anyhow!("Municipality not found")));
        }

        let status = dto.status.unwrap_or(SubscriptionStatus::Pending);
        let payment_status = dto.payment_status.unwrap_or(PaymentStatus::Pending);

        let mut tx = db.begin().await.map_err(AppError::database)?;

        let subscription = sqlx::query_as::<_, Subscription>(&format!(
            "INSERT INTO subscriptions \
             (municipality_id, plan, status, payment_status, payment_method, amount, valid_until) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
            SUBSCRIPTION_COLUMNS
        ))
        .bind(dto.municipality_id)
        .bind(dto.plan)
        .bind(status)
        .bind(payment_status)
        .bind(&dto.payment_method)
        .bind(dto.amount)
        .bind(dto.valid_until)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            error!(error = %e, "Database error creating subscription");
            AppError::database(e)
        })?;

        sqlx::query(
            "UPDATE municipalities SET subscription_status = $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(subscription.status)
        .bind(subscription.municipality_id)
        .execute(&mut *tx)
        .await
        .map_err(AppError::database)?;

        tx.commit().await.map_err(AppError::database)?;

        info!(
            subscription.id = %subscription.id,
            municipality.id = %subscription.municipality_id,
            "Subscription created"
        );

        Ok(subscription)
    }

    #[instrument(skip(db, filters))]
    pub async fn get_all(
        db: &PgPool,
        filters: SubscriptionFilterParams,
    ) -> Result<PaginatedSubscriptionsResponse, AppError> {
        let limit = filters.pagination.limit();
        let offset = filters.pagination.offset();

        let mut count_qb = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM subscriptions s WHERE 1=1",
        );
        let mut data_qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM subscriptions s \
             INNER JOIN municipalities m ON m.id = s.municipality_id WHERE 1=1",
            SUBSCRIPTION_WITH_MUNICIPALITY
        ));

        for qb in [&mut count_qb, &mut data_qb] {
            if let Some(status) = filters.status {
                qb.push(" AND s.status = ").push_bind(status);
            }
            if let Some(municipality_id) = filters.municipality_id {
                qb.push(" AND s.municipality_id = ").push_bind(municipality_id);
            }
        }

        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Database error counting subscriptions");
                AppError::database(e)
            })?;

        data_qb.push(" ORDER BY s.created_at DESC");
        data_qb.push(" LIMIT ").push_bind(limit);
        data_qb.push(" OFFSET ").push_bind(offset);

        let subscriptions = data_qb
            .build_query_as::<SubscriptionWithMunicipality>()
            .fetch_all(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Database error fetching subscriptions");
                AppError::database(e)
            })?;

        debug!(total = %total, returned = %subscriptions.len(), "Subscriptions fetched");

        Ok(PaginatedSubscriptionsResponse {
            meta: PaginationMeta {
                total,
                limit,
                offset: Some(offset),
                page: filters.pagination.page(),
                has_more: offset + limit < total,
            },
            data: subscriptions,
        })
    }

    #[instrument(skip(db), fields(subscription.id = %id))]
    pub async fn get_by_id(
        db: &PgPool,
        id: Uuid,
    ) -> Result<SubscriptionWithMunicipality, AppError> {
        sqlx::query_as::<_, SubscriptionWithMunicipality>(&format!(
            "SELECT {} FROM subscriptions s \
             INNER JOIN municipalities m ON m.id = s.municipality_id WHERE s.id = $1",
            SUBSCRIPTION_WITH_MUNICIPALITY
        ))
        .bind(id)
        .fetch_optional(db)
        .await
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Subscription not found")))
    }

    /// Applies a partial update. A status change updates the municipality
    /// mirror inside the same transaction.
    #[instrument(skip(db, dto), fields(subscription.id = %id))]
    pub async fn update(
        db: &PgPool,
        id: Uuid,
        dto: UpdateSubscriptionDto,
    ) -> Result<Subscription, AppError> {
        let mut tx = db.begin().await.map_err(AppError::database)?;

        let subscription = sqlx::query_as::<_, Subscription>(&format!(
            "UPDATE subscriptions SET \
             plan = COALESCE($1, plan), \
             status = COALESCE($2, status), \
             payment_status = COALESCE($3, payment_status), \
             payment_method = COALESCE($4, payment_method), \
             amount = COALESCE($5, amount), \
             valid_until = COALESCE($6, valid_until), \
             updated_at = NOW() \
             WHERE id = $7 RETURNING {}",
            SUBSCRIPTION_COLUMNS
        ))
        .bind(dto.plan)
        .bind(dto.status)
        .bind(dto.payment_status)
        .bind(&dto.payment_method)
        .bind(dto.amount)
        .bind(dto.valid_until)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Subscription not found")))?;

        if dto.status.is_some() {
            sqlx::query(
                "UPDATE municipalities SET subscription_status = $1, updated_at = NOW() \
                 WHERE id = $2",
            )
            .bind(subscription.status)
            .bind(subscription.municipality_id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::database)?;
        }

        tx.commit().await.map_err(AppError::database)?;

        info!(subscription.id = %id, "Subscription updated");

        Ok(subscription)
    }
}
