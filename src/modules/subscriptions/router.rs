use axum::{Router, routing::get};

use crate::state::AppState;

use super::controller::{
    create_subscription, get_subscription, get_subscriptions, update_subscription,
};

pub fn init_subscriptions_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_subscriptions).post(create_subscription))
        .route("/{id}", get(get_subscription).patch(update_subscription))
}
