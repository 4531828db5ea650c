use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use http_body_util::BodyExt;
use sqlx::PgPool;
use uuid::Uuid;

use civicpulse::router::init_router;
use civicpulse::state::AppState;
use civicpulse_auth::create_access_token;
use civicpulse_config::{CorsConfig, JwtConfig, RateLimitConfig};
use civicpulse_core::hash_password;

use civicpulse::modules::users::model::UserRole;

pub fn test_jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "test-secret-key-for-testing-purposes".to_string(),
        access_token_expiry: 3600,
        refresh_token_expiry: 604800,
    }
}

pub fn setup_test_app(pool: PgPool) -> Router {
    let state = AppState {
        db: pool,
        jwt_config: test_jwt_config(),
        cors_config: CorsConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
        },
        rate_limit_config: RateLimitConfig::default(),
    };
    init_router(state)
}

pub fn generate_unique_email() -> String {
    format!("test-{}@test.com", Uuid::new_v4())
}

#[allow(dead_code)]
pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub password: String,
    pub role: UserRole,
    pub municipality_id: Option<Uuid>,
}

pub async fn create_test_municipality(pool: &PgPool, name: &str) -> Uuid {
    sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO municipalities (name, city, state, country, contact_email) \
         VALUES ($1, 'Test City', 'Test State', 'Test Country', 'contact@test.example') \
         RETURNING id",
    )
    .bind(name)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn create_test_user(
    pool: &PgPool,
    role: UserRole,
    municipality_id: Option<Uuid>,
    password: &str,
) -> TestUser {
    let email = generate_unique_email();
    let hashed = hash_password(password).unwrap();

    let id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO users (email, password, name, role, municipality_id) \
         VALUES ($1, $2, 'Test User', $3, $4) RETURNING id",
    )
    .bind(&email)
    .bind(&hashed)
    .bind(role)
    .bind(municipality_id)
    .fetch_one(pool)
    .await
    .unwrap();

    TestUser {
        id,
        email,
        password: password.to_string(),
        role,
        municipality_id,
    }
}

/// Mints a valid bearer header for the user without going through login.
pub fn bearer(user: &TestUser) -> String {
    let token = create_access_token(user.id, user.role.as_str(), &test_jwt_config()).unwrap();
    format!("Bearer {}", token)
}

#[allow(dead_code)]
pub async fn create_test_feedback(pool: &PgPool, user_id: Uuid, municipality_id: Uuid) -> Uuid {
    sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO feedback \
         (description, category, latitude, longitude, user_id, municipality_id) \
         VALUES ('Broken streetlight', 'INFRASTRUCTURE', 52.52, 13.405, $1, $2) RETURNING id",
    )
    .bind(user_id)
    .bind(municipality_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub fn json_request(method: &str, uri: &str, auth: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(auth) = auth {
        builder = builder.header("authorization", auth);
    }
    builder
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

pub fn get_request(uri: &str, auth: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(auth) = auth {
        builder = builder.header("authorization", auth);
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn response_json(response: Response<Body>) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}
