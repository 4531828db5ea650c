mod common;

use axum::http::StatusCode;
use serde_json::json;
use sqlx::PgPool;
use tower::ServiceExt;

use civicpulse::modules::users::model::UserRole;
use common::{
    bearer, create_test_municipality, create_test_user, get_request, json_request, response_json,
    setup_test_app,
};

#[sqlx::test(migrations = "./migrations")]
async fn statistics_of_a_foreign_municipality_are_forbidden(pool: PgPool) {
    let municipality_a = create_test_municipality(&pool, "Town A").await;
    let municipality_b = create_test_municipality(&pool, "Town B").await;
    let staff_a =
        create_test_user(&pool, UserRole::MunicipalityAdmin, Some(municipality_a), "pw-123456")
            .await;
    let app = setup_test_app(pool);

    let response = app
        .oneshot(get_request(
            &format!("/api/v1/municipalities/{}/statistics", municipality_b),
            Some(&bearer(&staff_a)),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = response_json(response).await;
    assert_eq!(body["error"], "Insufficient permissions for this municipality");
}

#[sqlx::test(migrations = "./migrations")]
async fn statistics_over_no_feedback_are_all_zero(pool: PgPool) {
    let municipality = create_test_municipality(&pool, "Quiet Town").await;
    let admin = create_test_user(&pool, UserRole::Admin, None, "pw-123456").await;
    let app = setup_test_app(pool);

    let response = app
        .oneshot(get_request(
            &format!("/api/v1/municipalities/{}/statistics", municipality),
            Some(&bearer(&admin)),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["totalFeedback"], 0);
    assert_eq!(body["openIssues"], 0);
    assert_eq!(body["resolvedIssues"], 0);
    // Exactly zero, never null or NaN.
    assert_eq!(body["averageResolutionDays"], 0.0);
}

#[sqlx::test(migrations = "./migrations")]
async fn statistics_count_by_status_and_category(pool: PgPool) {
    let municipality = create_test_municipality(&pool, "Busy Town").await;
    let citizen = create_test_user(&pool, UserRole::User, Some(municipality), "pw-123456").await;
    let admin = create_test_user(&pool, UserRole::Admin, None, "pw-123456").await;

    // Two pending, one in progress, one resolved after exactly two days.
    for category in ["INFRASTRUCTURE", "SAFETY"] {
        sqlx::query(
            "INSERT INTO feedback (description, category, latitude, longitude, user_id, municipality_id) \
             VALUES ('seeded', $1::feedback_category, 0, 0, $2, $3)",
        )
        .bind(category)
        .bind(citizen.id)
        .bind(municipality)
        .execute(&pool)
        .await
        .unwrap();
    }
    sqlx::query(
        "INSERT INTO feedback (description, category, status, latitude, longitude, user_id, municipality_id) \
         VALUES ('seeded', 'CLEANLINESS', 'IN_PROGRESS', 0, 0, $1, $2)",
    )
    .bind(citizen.id)
    .bind(municipality)
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query(
        "INSERT INTO feedback (description, category, status, latitude, longitude, user_id, \
         municipality_id, created_at, resolved_at) \
         VALUES ('seeded', 'OTHER', 'RESOLVED', 0, 0, $1, $2, NOW() - INTERVAL '3 days', \
         NOW() - INTERVAL '1 day')",
    )
    .bind(citizen.id)
    .bind(municipality)
    .execute(&pool)
    .await
    .unwrap();

    let app = setup_test_app(pool);

    let response = app
        .oneshot(get_request(
            &format!("/api/v1/municipalities/{}/statistics", municipality),
            Some(&bearer(&admin)),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["totalFeedback"], 4);
    assert_eq!(body["openIssues"], 3);
    assert_eq!(body["resolvedIssues"], 1);
    assert_eq!(body["statusDistribution"]["PENDING"], 2);
    assert_eq!(body["statusDistribution"]["IN_PROGRESS"], 1);
    assert_eq!(body["statusDistribution"]["RESOLVED"], 1);
    assert_eq!(body["categoryDistribution"]["INFRASTRUCTURE"], 1);
    assert_eq!(body["categoryDistribution"]["OTHER"], 1);
    assert_eq!(body["averageResolutionDays"], 2.0);
}

#[sqlx::test(migrations = "./migrations")]
async fn citizens_can_see_their_own_municipalitys_statistics(pool: PgPool) {
    let municipality = create_test_municipality(&pool, "Open Town").await;
    let citizen = create_test_user(&pool, UserRole::User, Some(municipality), "pw-123456").await;
    let app = setup_test_app(pool);

    let response = app
        .oneshot(get_request(
            &format!("/api/v1/municipalities/{}/statistics", municipality),
            Some(&bearer(&citizen)),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "./migrations")]
async fn only_admins_create_municipalities(pool: PgPool) {
    let municipality = create_test_municipality(&pool, "Seed Town").await;
    let citizen = create_test_user(&pool, UserRole::User, Some(municipality), "pw-123456").await;
    let admin = create_test_user(&pool, UserRole::Admin, None, "pw-123456").await;
    let app = setup_test_app(pool);

    let payload = json!({
        "name": "New Town",
        "city": "New City",
        "state": "New State",
        "country": "New Country",
        "contactEmail": "contact@newtown.example",
    });

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/municipalities",
            Some(&bearer(&citizen)),
            payload.clone(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/municipalities",
            Some(&bearer(&admin)),
            payload,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    assert_eq!(body["subscriptionStatus"], "PENDING");
}

#[sqlx::test(migrations = "./migrations")]
async fn subscription_status_mirrors_onto_the_municipality(pool: PgPool) {
    let municipality = create_test_municipality(&pool, "Billing Town").await;
    let admin = create_test_user(&pool, UserRole::Admin, None, "pw-123456").await;
    let app = setup_test_app(pool.clone());

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/subscriptions",
            Some(&bearer(&admin)),
            json!({
                "municipalityId": municipality.to_string(),
                "plan": "PREMIUM",
                "status": "ACTIVE",
                "amount": 499.0,
                "validUntil": "2027-01-01T00:00:00Z",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);

    let mirrored: String = sqlx::query_scalar(
        "SELECT subscription_status::TEXT FROM municipalities WHERE id = $1",
    )
    .bind(municipality)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(mirrored, "ACTIVE");
}

#[sqlx::test(migrations = "./migrations")]
async fn subscriptions_are_admin_only(pool: PgPool) {
    let municipality = create_test_municipality(&pool, "Gated Town").await;
    let staff =
        create_test_user(&pool, UserRole::MunicipalityAdmin, Some(municipality), "pw-123456")
            .await;
    let app = setup_test_app(pool);

    let response = app
        .oneshot(get_request("/api/v1/subscriptions", Some(&bearer(&staff))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
