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
async fn plain_users_cannot_reach_user_administration(pool: PgPool) {
    let municipality = create_test_municipality(&pool, "Gate Town").await;
    let citizen = create_test_user(&pool, UserRole::User, Some(municipality), "pw-123456").await;
    let app = setup_test_app(pool);

    let response = app
        .oneshot(get_request("/api/v1/users", Some(&bearer(&citizen))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
async fn municipality_admins_list_only_their_tenant(pool: PgPool) {
    let municipality = create_test_municipality(&pool, "Own Town").await;
    let other = create_test_municipality(&pool, "Other Town").await;
    let staff =
        create_test_user(&pool, UserRole::MunicipalityAdmin, Some(municipality), "pw-123456")
            .await;
    create_test_user(&pool, UserRole::User, Some(municipality), "pw-123456").await;
    create_test_user(&pool, UserRole::User, Some(other), "pw-123456").await;
    let app = setup_test_app(pool);

    let response = app
        .oneshot(get_request("/api/v1/users", Some(&bearer(&staff))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    let data = body["data"].as_array().unwrap();
    // The staff member and their one citizen; the other tenant is invisible.
    assert_eq!(data.len(), 2);
    for user in data {
        assert_eq!(user["municipalityId"], municipality.to_string());
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn creating_a_user_requires_admin(pool: PgPool) {
    let municipality = create_test_municipality(&pool, "Create Town").await;
    let staff =
        create_test_user(&pool, UserRole::MunicipalityAdmin, Some(municipality), "pw-123456")
            .await;
    let admin = create_test_user(&pool, UserRole::Admin, None, "pw-123456").await;
    let app = setup_test_app(pool);

    let payload = json!({
        "email": "new-user@test.com",
        "password": "secret-pass",
        "name": "New User",
        "role": "USER",
        "municipalityId": municipality.to_string(),
    });

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/users",
            Some(&bearer(&staff)),
            payload.clone(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/users",
            Some(&bearer(&admin)),
            payload,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    assert_eq!(body["email"], "new-user@test.com");
    assert_eq!(body["role"], "USER");
}

#[sqlx::test(migrations = "./migrations")]
async fn duplicate_email_is_a_conflict(pool: PgPool) {
    let admin = create_test_user(&pool, UserRole::Admin, None, "pw-123456").await;
    let existing = create_test_user(&pool, UserRole::User, None, "pw-123456").await;
    let app = setup_test_app(pool);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/users",
            Some(&bearer(&admin)),
            json!({
                "email": existing.email,
                "password": "secret-pass",
                "name": "Duplicate",
                "role": "USER",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = response_json(response).await;
    assert_eq!(body["error"], "Email already exists");
}

#[sqlx::test(migrations = "./migrations")]
async fn municipality_admins_need_a_municipality(pool: PgPool) {
    let admin = create_test_user(&pool, UserRole::Admin, None, "pw-123456").await;
    let app = setup_test_app(pool);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/users",
            Some(&bearer(&admin)),
            json!({
                "email": "orphan-admin@test.com",
                "password": "secret-pass",
                "name": "Orphan Admin",
                "role": "MUNICIPALITY_ADMIN",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn only_admins_change_roles(pool: PgPool) {
    let municipality = create_test_municipality(&pool, "Promote Town").await;
    let staff =
        create_test_user(&pool, UserRole::MunicipalityAdmin, Some(municipality), "pw-123456")
            .await;
    let citizen = create_test_user(&pool, UserRole::User, Some(municipality), "pw-123456").await;
    let app = setup_test_app(pool);

    let response = app
        .oneshot(json_request(
            "PATCH",
            &format!("/api/v1/users/{}", citizen.id),
            Some(&bearer(&staff)),
            json!({"role": "ADMIN"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
