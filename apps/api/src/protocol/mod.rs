//! Wire contract between the submission client and the recommendation backend.
//!
//! The canonical schema is snake_case. camelCase spellings seen from older
//! clients are accepted on input only and are never emitted.

mod candidate;

use serde::{Deserialize, Serialize};

pub use candidate::{RankedCandidate, SubmittedCandidate};

/// Result cap applied when a request does not name one.
pub const DEFAULT_TOP_K: usize = 5;

pub const HEALTH_PATH: &str = "/api/health";
pub const VERIFY_INVITATION_PATH: &str = "/api/verify-invitation";
pub const MATCH_PATH: &str = "/api/match";

/// Optional ranking knobs carried by a match request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_similarity: Option<f64>,
}

impl MatchOptions {
    pub fn effective_top_k(&self) -> usize {
        self.top_k.unwrap_or(DEFAULT_TOP_K)
    }
}

/// POST /api/match request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRequest {
    #[serde(default)]
    pub job_description: String,
    #[serde(default)]
    pub candidates: Vec<SubmittedCandidate>,
    #[serde(flatten)]
    pub options: MatchOptions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invitation_code: Option<String>,
}

/// One ranked entry as the backend emits it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub id: String,
    pub name: String,
    #[serde(alias = "similarityScore")]
    pub similarity_score: f64,
    pub rank: u32,
    #[serde(default, alias = "aiSummary", skip_serializing_if = "Option::is_none")]
    pub ai_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_name: Option<String>,
}

/// POST /api/match success body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResponse {
    pub job_id: String,
    /// Candidates considered before filtering and truncation.
    pub total_candidates: usize,
    pub top_candidates: Vec<RankedEntry>,
    pub processing_time_ms: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerifyInvitationRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invitation_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifyInvitationResponse {
    pub valid: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Body of every non-2xx response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
