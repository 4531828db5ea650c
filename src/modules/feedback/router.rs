use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::state::AppState;

use super::controller::{
    add_comment, create_feedback, delete_feedback, get_feedback, get_feedback_by_id,
    update_feedback, update_feedback_status,
};

pub fn init_feedback_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_feedback).post(create_feedback))
        .route(
            "/{id}",
            get(get_feedback_by_id)
                .put(update_feedback)
                .patch(update_feedback)
                .delete(delete_feedback),
        )
        .route("/{id}/status", patch(update_feedback_status))
        .route("/{id}/comments", post(add_comment))
}
