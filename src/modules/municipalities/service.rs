use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use civicpulse_core::{AppError, PaginationMeta};

use crate::metrics;
use crate::middleware::auth::Identity;
use crate::middleware::scope;
use crate::modules::feedback::model::{FeedbackCategory, FeedbackStatus};

use super::model::{
    CreateMunicipalityDto, DateRange, MUNICIPALITY_COLUMNS, Municipality, MunicipalityFilterParams,
    MunicipalityHeader, MunicipalityStatistics, MunicipalityWithCounts,
    PaginatedMunicipalitiesResponse, UpdateMunicipalityDto, average_resolution_days,
};

const MUNICIPALITY_WITH_COUNTS: &str = "m.id, m.name, m.city, m.state, m.country, \
     m.contact_email, m.contact_phone, m.subscription_status, m.created_at, m.updated_at, \
     (SELECT COUNT(*) FROM feedback f WHERE f.municipality_id = m.id) AS feedback_count, \
     (SELECT COUNT(*) FROM users u WHERE u.municipality_id = m.id) AS user_count";

pub struct MunicipalityService;

impl MunicipalityService {
    #[instrument(skip(db, filters), fields(db.table = "municipalities"))]
    pub async fn get_all(
        db: &PgPool,
        filters: MunicipalityFilterParams,
    ) -> Result<PaginatedMunicipalitiesResponse, AppError> {
        let limit = filters.pagination.limit();
        let offset = filters.pagination.offset();

        let mut count_qb =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM municipalities m WHERE 1=1");
        let mut data_qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM municipalities m WHERE 1=1",
            MUNICIPALITY_WITH_COUNTS
        ));

        for qb in [&mut count_qb, &mut data_qb] {
            if let Some(city) = &filters.city {
                qb.push(" AND m.city ILIKE ").push_bind(format!("%{}%", city));
            }
            if let Some(status) = filters.subscription_status {
                qb.push(" AND m.subscription_status = ").push_bind(status);
            }
        }

        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Database error counting municipalities");
                AppError::database(e)
            })?;

        data_qb.push(" ORDER BY m.name ASC");
        data_qb.push(" LIMIT ").push_bind(limit);
        data_qb.push(" OFFSET ").push_bind(offset);

        let municipalities = data_qb
            .build_query_as::<MunicipalityWithCounts>()
            .fetch_all(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Database error fetching municipalities");
                AppError::database(e)
            })?;

        debug!(total = %total, returned = %municipalities.len(), "Municipalities fetched");

        Ok(PaginatedMunicipalitiesResponse {
            meta: PaginationMeta {
                total,
                limit,
                offset: Some(offset),
                page: filters.pagination.page(),
                has_more: offset + limit < total,
            },
            data: municipalities,
        })
    }

    #[instrument(skip(db), fields(municipality.id = %id))]
    pub async fn get_by_id(db: &PgPool, id: Uuid) -> Result<MunicipalityWithCounts, AppError> {
        sqlx::query_as::<_, MunicipalityWithCounts>(&format!(
            "SELECT {} FROM municipalities m WHERE m.id = $1",
            MUNICIPALITY_WITH_COUNTS
        ))
        .bind(id)
        .fetch_optional(db)
        .await
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Municipality not found")))
    }

    #[instrument(skip(db, dto), fields(municipality.name = %dto.name))]
    pub async fn create(db: &PgPool, dto: CreateMunicipalityDto) -> Result<Municipality, AppError> {
        let municipality = sqlx::query_as::<_, Municipality>(&format!(
            "INSERT INTO municipalities (name, city, state, country, contact_email, contact_phone) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            MUNICIPALITY_COLUMNS
        ))
        .bind(&dto.name)
        .bind(&dto.city)
        .bind(&dto.state)
        .bind(&dto.country)
        .bind(&dto.contact_email)
        .bind(&dto.contact_phone)
        .fetch_one(db)
        .await
        .map_err(|e| {
            error!(error = %e, municipality.name = %dto.name, "Database error creating municipality");
            AppError::database(e)
        })?;

        metrics::track_municipality_created();
        info!(
            municipality.id = %municipality.id,
            municipality.name = %municipality.name,
            "Municipality created"
        );

        Ok(municipality)
    }

    #[instrument(skip(db, dto), fields(municipality.id = %id))]
    pub async fn update(
        db: &PgPool,
        id: Uuid,
        dto: UpdateMunicipalityDto,
    ) -> Result<Municipality, AppError> {
        let municipality = sqlx::query_as::<_, Municipality>(&format!(
            "UPDATE municipalities SET \
             name = COALESCE($1, name), \
             city = COALESCE($2, city), \
             state = COALESCE($3, state), \
             country = COALESCE($4, country), \
             contact_email = COALESCE($5, contact_email), \
             contact_phone = COALESCE($6, contact_phone), \
             updated_at = NOW() \
             WHERE id = $7 RETURNING {}",
            MUNICIPALITY_COLUMNS
        ))
        .bind(&dto.name)
        .bind(&dto.city)
        .bind(&dto.state)
        .bind(&dto.country)
        .bind(&dto.contact_email)
        .bind(&dto.contact_phone)
        .bind(id)
        .fetch_optional(db)
        .await
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Municipality not found")))?;

        info!(municipality.id = %id, "Municipality updated");

        Ok(municipality)
    }

    #[instrument(skip(db), fields(municipality.id = %id))]
    pub async fn delete(db: &PgPool, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM municipalities WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .map_err(AppError::database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Municipality not found")));
        }

        info!(municipality.id = %id, "Municipality deleted");

        Ok(())
    }

    /// Per-municipality feedback statistics over an optional reporting
    /// window. Tenant-scoped: staff and citizens of other municipalities
    /// get 403.
    #[instrument(skip(db, identity, range), fields(municipality.id = %id, user.id = %identity.id))]
    pub async fn statistics(
        db: &PgPool,
        identity: &Identity,
        id: Uuid,
        range: DateRange,
    ) -> Result<MunicipalityStatistics, AppError> {
        scope::ensure_municipality_scope(identity, Some(id))?;

        let municipality = sqlx::query_as::<_, MunicipalityHeader>(
            "SELECT name, city FROM municipalities WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(db)
        .await
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Municipality not found")))?;

        let push_window = |qb: &mut QueryBuilder<Postgres>| {
            if let Some(start) = range.start_date {
                qb.push(" AND created_at >= ").push_bind(start);
            }
            if let Some(end) = range.end_date {
                qb.push(" AND created_at <= ").push_bind(end);
            }
        };

        let mut total_qb = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM feedback WHERE municipality_id = ",
        );
        total_qb.push_bind(id);
        push_window(&mut total_qb);
        let total_feedback: i64 = total_qb
            .build_query_scalar()
            .fetch_one(db)
            .await
            .map_err(AppError::database)?;

        let mut open_qb = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM feedback WHERE status IN ('PENDING', 'IN_PROGRESS') \
             AND municipality_id = ",
        );
        open_qb.push_bind(id);
        push_window(&mut open_qb);
        let open_issues: i64 = open_qb
            .build_query_scalar()
            .fetch_one(db)
            .await
            .map_err(AppError::database)?;

        let mut resolved_qb = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM feedback WHERE status = 'RESOLVED' AND municipality_id = ",
        );
        resolved_qb.push_bind(id);
        push_window(&mut resolved_qb);
        let resolved_issues: i64 = resolved_qb
            .build_query_scalar()
            .fetch_one(db)
            .await
            .map_err(AppError::database)?;

        #[derive(sqlx::FromRow)]
        struct StatusCount {
            status: FeedbackStatus,
            count: i64,
        }

        let mut status_qb = QueryBuilder::<Postgres>::new(
            "SELECT status, COUNT(*) AS count FROM feedback WHERE municipality_id = ",
        );
        status_qb.push_bind(id);
        push_window(&mut status_qb);
        status_qb.push(" GROUP BY status");
        let status_distribution: HashMap<FeedbackStatus, i64> = status_qb
            .build_query_as::<StatusCount>()
            .fetch_all(db)
            .await
            .map_err(AppError::database)?
            .into_iter()
            .map(|row| (row.status, row.count))
            .collect();

        #[derive(sqlx::FromRow)]
        struct CategoryCount {
            category: FeedbackCategory,
            count: i64,
        }

        let mut category_qb = QueryBuilder::<Postgres>::new(
            "SELECT category, COUNT(*) AS count FROM feedback WHERE municipality_id = ",
        );
        category_qb.push_bind(id);
        push_window(&mut category_qb);
        category_qb.push(" GROUP BY category");
        let category_distribution: HashMap<FeedbackCategory, i64> = category_qb
            .build_query_as::<CategoryCount>()
            .fetch_all(db)
            .await
            .map_err(AppError::database)?
            .into_iter()
            .map(|row| (row.category, row.count))
            .collect();

        #[derive(sqlx::FromRow)]
        struct ResolvedPair {
            created_at: DateTime<Utc>,
            resolved_at: DateTime<Utc>,
        }

        let mut pairs_qb = QueryBuilder::<Postgres>::new(
            "SELECT created_at, resolved_at FROM feedback \
             WHERE status = 'RESOLVED' AND resolved_at IS NOT NULL AND municipality_id = ",
        );
        pairs_qb.push_bind(id);
        push_window(&mut pairs_qb);
        let pairs: Vec<(DateTime<Utc>, DateTime<Utc>)> = pairs_qb
            .build_query_as::<ResolvedPair>()
            .fetch_all(db)
            .await
            .map_err(AppError::database)?
            .into_iter()
            .map(|row| (row.created_at, row.resolved_at))
            .collect();

        let avg = average_resolution_days(&pairs, Utc::now());

        debug!(
            municipality.id = %id,
            total = %total_feedback,
            open = %open_issues,
            resolved = %resolved_issues,
            "Statistics computed"
        );

        Ok(MunicipalityStatistics {
            municipality,
            total_feedback,
            open_issues,
            resolved_issues,
            average_resolution_days: avg,
            status_distribution,
            category_distribution,
            date_range: range,
        })
    }
}
