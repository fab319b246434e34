//! Submission orchestrator: drives one end-to-end recommendation request.
//!
//! Steps run strictly in order, each one a remote round trip:
//!   verify access (gated deployments only) → health → match → normalize
//!
//! Progress is reported at 20 (healthy), 80 (envelope received) and 100
//! (normalized), followed by exactly one terminal event. Any failure aborts
//! the attempt with no partial result.

pub mod backend;
pub mod error;
pub mod events;
pub mod fake;
pub mod normalize;
pub mod retry;

use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::protocol::{MatchOptions, MatchRequest, RankedCandidate, SubmittedCandidate};

pub use backend::{ClientConfig, HttpBackend, RecommendationBackend};
pub use error::SubmissionError;
pub use events::{NoopObserver, SubmissionEvent, SubmissionObserver};
pub use retry::{submit_with_retry, RetryPolicy};

use events::{PROGRESS_DONE, PROGRESS_HEALTHY, PROGRESS_RESPONSE_RECEIVED};

/// Inputs of one submission attempt. Built once, never modified afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionRequest {
    job_description: String,
    candidates: Vec<SubmittedCandidate>,
    access_token: Option<String>,
    options: MatchOptions,
}

impl SubmissionRequest {
    pub fn new(job_description: impl Into<String>, candidates: Vec<SubmittedCandidate>) -> Self {
        Self {
            job_description: job_description.into(),
            candidates,
            access_token: None,
            options: MatchOptions::default(),
        }
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn with_options(mut self, options: MatchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn job_description(&self) -> &str {
        &self.job_description
    }

    pub fn candidates(&self) -> &[SubmittedCandidate] {
        &self.candidates
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn options(&self) -> MatchOptions {
        self.options
    }

    pub fn to_match_request(&self) -> MatchRequest {
        MatchRequest {
            job_description: self.job_description.clone(),
            candidates: self.candidates.clone(),
            options: self.options,
            invitation_code: self.access_token.clone(),
        }
    }
}

pub struct SubmissionOrchestrator {
    backend: Arc<dyn RecommendationBackend>,
    verify_access: bool,
}

impl SubmissionOrchestrator {
    /// `verify_access` enables the invitation check for gated deployments.
    pub fn new(backend: Arc<dyn RecommendationBackend>, verify_access: bool) -> Self {
        Self {
            backend,
            verify_access,
        }
    }

    /// HTTP orchestrator for `config`. The invitation check follows
    /// `config.verify_access`.
    pub fn from_config(config: &ClientConfig) -> Result<Self, reqwest::Error> {
        let backend = HttpBackend::new(config)?;
        Ok(Self::new(Arc::new(backend), config.verify_access))
    }

    pub fn verifies_access(&self) -> bool {
        self.verify_access
    }

    /// Runs one attempt. Preconditions (non-blank job description, at least
    /// one candidate) are the caller's to check.
    pub async fn submit(
        &self,
        request: &SubmissionRequest,
        observer: &dyn SubmissionObserver,
        cancel: &CancellationToken,
    ) -> Result<Vec<RankedCandidate>, SubmissionError> {
        let outcome = self.run(request, observer, cancel).await;

        match &outcome {
            Ok(ranked) => {
                info!(returned = ranked.len(), "Submission succeeded");
                observer.on_event(SubmissionEvent::Succeeded {
                    count: ranked.len(),
                });
            }
            Err(e) => {
                info!(error = %e, "Submission failed");
                observer.on_event(SubmissionEvent::Failed(e.clone()));
            }
        }
        outcome
    }

    async fn run(
        &self,
        request: &SubmissionRequest,
        observer: &dyn SubmissionObserver,
        cancel: &CancellationToken,
    ) -> Result<Vec<RankedCandidate>, SubmissionError> {
        if self.verify_access {
            debug!("Verifying invitation code");
            guarded(cancel, self.backend.verify_invitation(request.access_token())).await?;
        }

        debug!("Probing backend health");
        guarded(cancel, self.backend.health()).await?;
        observer.on_event(SubmissionEvent::Progress(PROGRESS_HEALTHY));

        debug!(
            candidates = request.candidates().len(),
            "Requesting recommendations"
        );
        let match_request = request.to_match_request();
        let envelope = guarded(cancel, self.backend.request_match(&match_request)).await?;

        if !envelope.is_object() {
            return Err(SubmissionError::EmptyResponse);
        }
        if let Some(message) = backend::error_message(&envelope) {
            return Err(SubmissionError::RequestFailed(message));
        }
        observer.on_event(SubmissionEvent::Progress(PROGRESS_RESPONSE_RECEIVED));

        let ranked = normalize::normalize_response(&envelope, request.candidates());
        observer.on_event(SubmissionEvent::Progress(PROGRESS_DONE));

        Ok(ranked)
    }
}

/// Races one remote step against cancellation. A cancelled step drops its in-flight request.
async fn guarded<T, F>(cancel: &CancellationToken, step: F) -> Result<T, SubmissionError>
where
    F: Future<Output = Result<T, SubmissionError>>,
{
    if cancel.is_cancelled() {
        return Err(SubmissionError::Cancelled);
    }

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(SubmissionError::Cancelled),
        result = step => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    use serde_json::json;

    use crate::config::Config;
    use crate::orchestrator::fake::{FakeBackend, InProcessBackend};
    use crate::ranking::scorer::HashEmbeddingScorer;
    use crate::ranking::summary::ExtractiveSummarizer;
    use crate::ranking::RecommendationEngine;

    fn three_candidates() -> Vec<SubmittedCandidate> {
        vec![
            SubmittedCandidate::from_text(1, "Rust and Postgres"),
            SubmittedCandidate::from_text(2, "Go and Kafka"),
            SubmittedCandidate::from_text(3, "Painter"),
        ]
    }

    fn recorder() -> (Arc<Mutex<Vec<SubmissionEvent>>>, impl Fn(SubmissionEvent) + Send + Sync) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        (events, move |event: SubmissionEvent| sink.lock().unwrap().push(event))
    }

    #[test]
    fn test_from_config_takes_access_check_from_config() {
        let gated = ClientConfig {
            verify_access: true,
            ..ClientConfig::default()
        };
        assert!(SubmissionOrchestrator::from_config(&gated)
            .unwrap()
            .verifies_access());
        assert!(!SubmissionOrchestrator::from_config(&ClientConfig::default())
            .unwrap()
            .verifies_access());
    }

    #[tokio::test]
    async fn test_two_ranked_entries_come_back_in_order() {
        let candidates = three_candidates();
        let envelope = json!({
            "job_id": "j1",
            "total_candidates": 3,
            "top_candidates": [
                {"id": candidates[1].id, "name": "Candidate 2", "similarity_score": 0.91, "rank": 1},
                {"id": candidates[0].id, "name": "Candidate 1", "similarity_score": 0.77, "rank": 2}
            ],
            "processing_time_ms": 12
        });
        let backend = Arc::new(FakeBackend::new().with_match_response(envelope));
        let orchestrator = SubmissionOrchestrator::new(backend, false);
        let request = SubmissionRequest::new("Senior backend engineer", candidates.clone());

        let ranked = orchestrator
            .submit(&request, &NoopObserver, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].id, candidates[1].id);
        assert_eq!(ranked[0].similarity_score, Some(0.91));
        assert_eq!(ranked[1].similarity_score, Some(0.77));
        assert_eq!(ranked[1].info, "Rust and Postgres");
    }

    #[tokio::test]
    async fn test_health_failure_never_reaches_match() {
        let backend = Arc::new(
            FakeBackend::new()
                .with_health_error(SubmissionError::BackendUnavailable("refused".into())),
        );
        let orchestrator = SubmissionOrchestrator::new(backend.clone(), false);
        let (events, observer) = recorder();

        let err = orchestrator
            .submit(
                &SubmissionRequest::new("JD", three_candidates()),
                &observer,
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, SubmissionError::BackendUnavailable(_)));
        assert_eq!(backend.match_calls(), 0);
        assert_eq!(*events.lock().unwrap(), vec![SubmissionEvent::Failed(err)]);
    }

    #[tokio::test]
    async fn test_missing_ranked_array_is_empty_success() {
        let backend = Arc::new(
            FakeBackend::new().with_match_response(json!({"job_id": "j", "total_candidates": 3})),
        );
        let orchestrator = SubmissionOrchestrator::new(backend, false);

        let ranked = orchestrator
            .submit(
                &SubmissionRequest::new("JD", three_candidates()),
                &NoopObserver,
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert!(ranked.is_empty());
    }

    #[tokio::test]
    async fn test_rejected_code_stops_before_health() {
        let backend = Arc::new(
            FakeBackend::new()
                .with_invitation_error(SubmissionError::AccessDenied("Invalid invitation code".into())),
        );
        let orchestrator = SubmissionOrchestrator::new(backend.clone(), true);

        let err = orchestrator
            .submit(
                &SubmissionRequest::new("JD", three_candidates()).with_access_token("wrong"),
                &NoopObserver,
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, SubmissionError::AccessDenied(_)));
        assert_eq!(backend.verify_calls(), 1);
        assert_eq!(backend.health_calls(), 0);
        assert_eq!(backend.match_calls(), 0);
        assert_eq!(backend.last_invitation().await.as_deref(), Some("wrong"));
    }

    #[tokio::test]
    async fn test_verification_skipped_for_open_deployment() {
        let backend = Arc::new(FakeBackend::new());
        let orchestrator = SubmissionOrchestrator::new(backend.clone(), false);

        orchestrator
            .submit(
                &SubmissionRequest::new("JD", three_candidates()),
                &NoopObserver,
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(backend.verify_calls(), 0);
        assert_eq!(backend.health_calls(), 1);
    }

    #[tokio::test]
    async fn test_progress_is_exactly_20_80_100_then_success() {
        let backend = Arc::new(FakeBackend::new());
        let orchestrator = SubmissionOrchestrator::new(backend, true);
        let (events, observer) = recorder();

        orchestrator
            .submit(
                &SubmissionRequest::new("JD", three_candidates()),
                &observer,
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(
            *events.lock().unwrap(),
            vec![
                SubmissionEvent::Progress(20),
                SubmissionEvent::Progress(80),
                SubmissionEvent::Progress(100),
                SubmissionEvent::Succeeded { count: 0 },
            ]
        );
    }

    #[tokio::test]
    async fn test_request_is_forwarded_unchanged() {
        let backend = Arc::new(FakeBackend::new());
        let orchestrator = SubmissionOrchestrator::new(backend.clone(), false);
        let options = MatchOptions {
            top_k: Some(2),
            min_similarity: Some(0.3),
        };
        let request = SubmissionRequest::new("JD", three_candidates())
            .with_access_token("code")
            .with_options(options);

        orchestrator
            .submit(&request, &NoopObserver, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(backend.last_request().await, Some(request.to_match_request()));
    }

    #[tokio::test]
    async fn test_error_envelope_is_request_failed() {
        let backend = Arc::new(
            FakeBackend::new().with_match_response(json!({"error": "Candidates data is required"})),
        );
        let orchestrator = SubmissionOrchestrator::new(backend, false);
        let (events, observer) = recorder();

        let err = orchestrator
            .submit(
                &SubmissionRequest::new("JD", three_candidates()),
                &observer,
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert_eq!(
            err,
            SubmissionError::RequestFailed("Candidates data is required".into())
        );
        // progress stops at 20; no 80 for a failed call
        assert_eq!(
            *events.lock().unwrap(),
            vec![SubmissionEvent::Progress(20), SubmissionEvent::Failed(err)]
        );
    }

    #[tokio::test]
    async fn test_null_envelope_is_empty_response() {
        let backend = Arc::new(FakeBackend::new().with_match_response(serde_json::Value::Null));
        let orchestrator = SubmissionOrchestrator::new(backend, false);

        let err = orchestrator
            .submit(
                &SubmissionRequest::new("JD", three_candidates()),
                &NoopObserver,
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert_eq!(err, SubmissionError::EmptyResponse);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_match_call() {
        let backend = Arc::new(FakeBackend::new().with_latency(Duration::from_secs(30)));
        let orchestrator = SubmissionOrchestrator::new(backend.clone(), false);
        let cancel = CancellationToken::new();

        let canceller = cancel.clone();
        tokio::spawn(async move {
            // health takes 30s, the match call starts right after
            tokio::time::sleep(Duration::from_secs(45)).await;
            canceller.cancel();
        });

        let err = orchestrator
            .submit(
                &SubmissionRequest::new("JD", three_candidates()),
                &NoopObserver,
                &cancel,
            )
            .await
            .unwrap_err();

        assert_eq!(err, SubmissionError::Cancelled);
        assert_eq!(backend.match_calls(), 1);
    }

    #[tokio::test]
    async fn test_already_cancelled_token_makes_no_calls() {
        let backend = Arc::new(FakeBackend::new());
        let orchestrator = SubmissionOrchestrator::new(backend.clone(), true);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = orchestrator
            .submit(
                &SubmissionRequest::new("JD", three_candidates()),
                &NoopObserver,
                &cancel,
            )
            .await
            .unwrap_err();

        assert_eq!(err, SubmissionError::Cancelled);
        assert_eq!(backend.verify_calls(), 0);
        assert_eq!(backend.health_calls(), 0);
    }

    #[tokio::test]
    async fn test_text_candidate_is_ranked_on_info_end_to_end() {
        let engine = Arc::new(RecommendationEngine::new(
            Arc::new(HashEmbeddingScorer::new(512)),
            Arc::new(ExtractiveSummarizer),
        ));
        let backend = Arc::new(InProcessBackend::new(engine, Config::default()));
        let orchestrator = SubmissionOrchestrator::new(backend, true);

        let candidates = vec![
            SubmittedCandidate::from_text(1, "Pastry chef, laminated doughs"),
            SubmittedCandidate::from_text(2, "Rust backend engineer, PostgreSQL, Kubernetes"),
        ];
        let ranked = orchestrator
            .submit(
                &SubmissionRequest::new("Rust backend engineer with PostgreSQL", candidates),
                &NoopObserver,
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(ranked[0].name, "Candidate 2");
        assert!(ranked[0].display_score() > ranked[1].display_score());
        assert!(ranked.iter().all(|c| c.ai_summary.is_some()));
        assert_eq!(ranked[0].rank, Some(1));
    }
}
