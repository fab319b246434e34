pub mod candidates;
pub mod health;
pub mod matching;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};

use crate::protocol::{HEALTH_PATH, MATCH_PATH, VERIFY_INVITATION_PATH};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_body_bytes;

    Router::new()
        .route("/", get(health::index_handler))
        .route(HEALTH_PATH, get(health::health_handler))
        // Recommendation API
        .route(
            VERIFY_INVITATION_PATH,
            post(matching::handle_verify_invitation),
        )
        .route(MATCH_PATH, post(matching::handle_match))
        // Candidate pool
        .route(
            "/api/candidates",
            get(candidates::handle_list_candidates)
                .post(candidates::handle_add_candidates)
                .delete(candidates::handle_clear_candidates),
        )
        .route(
            "/api/candidates/upload",
            post(candidates::handle_upload_candidates),
        )
        .route(
            "/api/candidates/:id",
            delete(candidates::handle_delete_candidate),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
