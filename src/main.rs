use dotenvy::dotenv;

use civicpulse::logging::init_tracing;
use civicpulse::metrics::{init_metrics, metrics_app};
use civicpulse::router::init_router;
use civicpulse::state::init_app_state;

#[tokio::main]
async fn main() {
    dotenv().ok();

    init_tracing();

    let state = init_app_state().await;

    sqlx::migrate!("./migrations")
        .run(&state.db)
        .await
        .expect("Failed to run database migrations");

    if let Some(handle) = init_metrics() {
        let metrics_port: u16 = std::env::var("METRICS_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(9100);
        tokio::spawn(async move {
            let listener =
                tokio::net::TcpListener::bind(("0.0.0.0", metrics_port))
                    .await
                    .expect("Failed to bind metrics listener");
            axum::serve(listener, metrics_app(handle))
                .await
                .expect("Metrics server failed");
        });
        tracing::info!(port = %metrics_port, "Metrics exporter listening");
    }

    let app = init_router(state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .expect("Failed to bind listener");
    tracing::info!(port = %port, "CivicPulse API listening");
    println!("🚀 Server running on http://localhost:{}", port);
    println!("📚 Swagger UI available at http://localhost:{}/swagger-ui", port);
    axum::serve(listener, app).await.expect("Server failed");
}
