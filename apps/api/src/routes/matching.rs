use axum::{body::Bytes, extract::rejection::JsonRejection, extract::State, Json};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::protocol::{
    MatchOptions, MatchRequest, MatchResponse, VerifyInvitationRequest, VerifyInvitationResponse,
};
use crate::state::AppState;

const INVALID_INVITATION: &str = "Invalid or missing invitation code";

/// POST /api/verify-invitation
///
/// An empty or non-JSON body is treated as "no code supplied".
pub async fn handle_verify_invitation(
    State(state): State<AppState>,
    body: Bytes,
) -> Json<VerifyInvitationResponse> {
    let request: VerifyInvitationRequest = serde_json::from_slice(&body).unwrap_or_default();
    let valid = state
        .config
        .accepts_invitation(request.invitation_code.as_deref());

    if !valid {
        warn!("Invitation code rejected");
    }
    Json(VerifyInvitationResponse { valid })
}

/// POST /api/match
pub async fn handle_match(
    State(state): State<AppState>,
    payload: Result<Json<MatchRequest>, JsonRejection>,
) -> Result<Json<MatchResponse>, AppError> {
    let Json(request) = payload?;

    if !state
        .config
        .accepts_invitation(request.invitation_code.as_deref())
    {
        return Err(AppError::Forbidden(INVALID_INVITATION.to_string()));
    }

    let candidates = if request.candidates.is_empty() {
        let stored = state.store.all().await;
        if !stored.is_empty() {
            info!(count = stored.len(), "Request has no candidates, using stored pool");
        }
        stored
    } else {
        request.candidates
    };

    let options = MatchOptions {
        top_k: request.options.top_k.or(Some(state.config.max_candidates)),
        min_similarity: request.options.min_similarity.or(state.config.min_similarity),
    };

    info!(
        candidates = candidates.len(),
        job_description_len = request.job_description.len(),
        top_k = options.effective_top_k(),
        "Match requested"
    );

    let response = state
        .engine
        .match_candidates(&request.job_description, candidates, &options)
        .await?;

    Ok(Json(response))
}
