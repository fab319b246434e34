use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::protocol::HealthResponse;
use crate::state::AppState;

/// GET /
/// Service banner listing the public endpoints.
pub async fn index_handler() -> Json<Value> {
    Json(json!({
        "service": "talentmatch-api",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "GET /api/health",
            "POST /api/verify-invitation",
            "POST /api/match",
            "GET|POST|DELETE /api/candidates",
            "POST /api/candidates/upload",
            "DELETE /api/candidates/:id"
        ]
    }))
}

/// GET /api/health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        message: Some(format!(
            "Recommendation engine ready (scorer: {}, summaries: {})",
            state.engine.scorer_name(),
            state.engine.summarizer_name()
        )),
    })
}
