use axum::{Router, routing::get};

use crate::state::AppState;

use super::controller::{
    create_municipality, delete_municipality, get_municipalities, get_municipality,
    get_municipality_statistics, update_municipality,
};

pub fn init_municipalities_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_municipalities).post(create_municipality))
        .route(
            "/{id}",
            get(get_municipality)
                .patch(update_municipality)
                .delete(delete_municipality),
        )
        .route("/{id}/statistics", get(get_municipality_statistics))
}
