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
async fn login_success_returns_both_tokens(pool: PgPool) {
    let municipality = create_test_municipality(&pool, "Login Town").await;
    let user = create_test_user(&pool, UserRole::User, Some(municipality), "testpass123").await;

    let app = setup_test_app(pool.clone());

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/auth/login",
            None,
            json!({"email": user.email, "password": "testpass123"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert!(body.get("accessToken").is_some());
    assert!(body.get("refreshToken").is_some());
    assert_eq!(body["user"]["email"], user.email.as_str());
    // The password hash must never appear in a response.
    assert!(body["user"].get("password").is_none());

    // The refresh token is persisted for revocation.
    let stored: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM refresh_tokens WHERE user_id = $1")
            .bind(user.id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(stored, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn login_wrong_password_issues_nothing(pool: PgPool) {
    let user = create_test_user(&pool, UserRole::User, None, "correct-pass").await;

    let app = setup_test_app(pool.clone());

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/auth/login",
            None,
            json!({"email": user.email, "password": "wrong-pass"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = response_json(response).await;
    assert_eq!(body["error"], "Invalid credentials");

    let stored: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM refresh_tokens")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(stored, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn login_unknown_email_is_unauthorized(pool: PgPool) {
    let app = setup_test_app(pool);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/auth/login",
            None,
            json!({"email": "nobody@test.com", "password": "whatever"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "./migrations")]
async fn refresh_issues_new_access_token(pool: PgPool) {
    let user = create_test_user(&pool, UserRole::User, None, "testpass123").await;
    let app = setup_test_app(pool.clone());

    let login = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/auth/login",
            None,
            json!({"email": user.email, "password": "testpass123"}),
        ))
        .await
        .unwrap();
    let login_body = response_json(login).await;
    let refresh_token = login_body["refreshToken"].as_str().unwrap().to_string();

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/auth/refresh-token",
            None,
            json!({"refreshToken": refresh_token}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert!(body.get("accessToken").is_some());
    // The refresh token is not rotated.
    assert!(body.get("refreshToken").is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn refresh_with_unknown_token_is_unauthorized(pool: PgPool) {
    let app = setup_test_app(pool);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/auth/refresh-token",
            None,
            json!({"refreshToken": "not-a-real-token"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "./migrations")]
async fn logout_twice_with_same_token_is_safe(pool: PgPool) {
    let user = create_test_user(&pool, UserRole::User, None, "testpass123").await;
    let app = setup_test_app(pool.clone());

    let login = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/auth/login",
            None,
            json!({"email": user.email, "password": "testpass123"}),
        ))
        .await
        .unwrap();
    let login_body = response_json(login).await;
    let refresh_token = login_body["refreshToken"].as_str().unwrap().to_string();

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/auth/logout",
                None,
                json!({"refreshToken": refresh_token}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let stored: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM refresh_tokens")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(stored, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn me_returns_the_current_user(pool: PgPool) {
    let municipality = create_test_municipality(&pool, "Me Town").await;
    let user = create_test_user(&pool, UserRole::MunicipalityAdmin, Some(municipality), "pw-123456")
        .await;
    let app = setup_test_app(pool);

    let response = app
        .oneshot(get_request("/api/v1/auth/me", Some(&bearer(&user))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["email"], user.email.as_str());
    assert_eq!(body["role"], "MUNICIPALITY_ADMIN");
    assert_eq!(body["municipalityId"], municipality.to_string());
}

#[sqlx::test(migrations = "./migrations")]
async fn me_without_bearer_is_unauthorized(pool: PgPool) {
    let app = setup_test_app(pool);

    let response = app
        .oneshot(get_request("/api/v1/auth/me", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "./migrations")]
async fn token_with_stale_role_is_rejected(pool: PgPool) {
    let user = create_test_user(&pool, UserRole::User, None, "testpass123").await;
    // Token minted for USER, then the role changes server-side.
    let header = bearer(&user);
    sqlx::query("UPDATE users SET role = 'ADMIN' WHERE id = $1")
        .bind(user.id)
        .execute(&pool)
        .await
        .unwrap();

    let app = setup_test_app(pool);

    let response = app
        .oneshot(get_request("/api/v1/auth/me", Some(&header)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "./migrations")]
async fn token_for_deleted_user_is_rejected(pool: PgPool) {
    let user = create_test_user(&pool, UserRole::User, None, "testpass123").await;
    let header = bearer(&user);
    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user.id)
        .execute(&pool)
        .await
        .unwrap();

    let app = setup_test_app(pool);

    let response = app
        .oneshot(get_request("/api/v1/auth/me", Some(&header)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
