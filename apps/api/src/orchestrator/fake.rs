//! Test doubles implementing `RecommendationBackend` without a network.
//!
//! `FakeBackend` replays scripted outcomes and counts calls per endpoint.
//! `InProcessBackend` runs the real ranking engine in the same process.

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use super::backend::RecommendationBackend;
use super::error::SubmissionError;
use crate::config::Config;
use crate::protocol::MatchRequest;
use crate::ranking::RecommendationEngine;

pub struct FakeBackend {
    invitation: Result<(), SubmissionError>,
    health: Result<(), SubmissionError>,
    transient_health_failures: AtomicU32,
    match_outcome: Result<Value, SubmissionError>,
    latency: Option<Duration>,
    verify_calls: AtomicUsize,
    health_calls: AtomicUsize,
    match_calls: AtomicUsize,
    last_request: Mutex<Option<MatchRequest>>,
    last_invitation: Mutex<Option<String>>,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeBackend {
    /// Healthy backend that accepts any code and ranks nothing.
    pub fn new() -> Self {
        Self {
            invitation: Ok(()),
            health: Ok(()),
            transient_health_failures: AtomicU32::new(0),
            match_outcome: Ok(json!({
                "job_id": "fake-job",
                "total_candidates": 0,
                "top_candidates": [],
                "processing_time_ms": 0
            })),
            latency: None,
            verify_calls: AtomicUsize::new(0),
            health_calls: AtomicUsize::new(0),
            match_calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
            last_invitation: Mutex::new(None),
        }
    }

    pub fn with_invitation_error(mut self, error: SubmissionError) -> Self {
        self.invitation = Err(error);
        self
    }

    pub fn with_health_error(mut self, error: SubmissionError) -> Self {
        self.health = Err(error);
        self
    }

    /// The first `count` health checks fail as unavailable, later ones succeed.
    pub fn with_transient_health_failures(self, count: u32) -> Self {
        self.transient_health_failures.store(count, Ordering::SeqCst);
        self
    }

    pub fn with_match_response(mut self, envelope: Value) -> Self {
        self.match_outcome = Ok(envelope);
        self
    }

    pub fn with_match_error(mut self, error: SubmissionError) -> Self {
        self.match_outcome = Err(error);
        self
    }

    /// Every call sleeps this long before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn verify_calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }

    pub fn health_calls(&self) -> usize {
        self.health_calls.load(Ordering::SeqCst)
    }

    pub fn match_calls(&self) -> usize {
        self.match_calls.load(Ordering::SeqCst)
    }

    pub async fn last_request(&self) -> Option<MatchRequest> {
        self.last_request.lock().await.clone()
    }

    pub async fn last_invitation(&self) -> Option<String> {
        self.last_invitation.lock().await.clone()
    }

    async fn delay(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl RecommendationBackend for FakeBackend {
    async fn verify_invitation(&self, invitation_code: Option<&str>) -> Result<(), SubmissionError> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_invitation.lock().await = invitation_code.map(str::to_string);
        self.delay().await;
        self.invitation.clone()
    }

    async fn health(&self) -> Result<(), SubmissionError> {
        self.health_calls.fetch_add(1, Ordering::SeqCst);
        self.delay().await;

        let transient = self
            .transient_health_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if transient {
            return Err(SubmissionError::BackendUnavailable(
                "backend warming up".to_string(),
            ));
        }
        self.health.clone()
    }

    async fn request_match(&self, request: &MatchRequest) -> Result<Value, SubmissionError> {
        self.match_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().await = Some(request.clone());
        self.delay().await;
        self.match_outcome.clone()
    }
}

/// Serves the ranking contract from a local `RecommendationEngine`, applying
/// the same access policy and defaults as the HTTP server.
pub struct InProcessBackend {
    engine: Arc<RecommendationEngine>,
    config: Config,
}

impl InProcessBackend {
    pub fn new(engine: Arc<RecommendationEngine>, config: Config) -> Self {
        Self { engine, config }
    }
}

#[async_trait]
impl RecommendationBackend for InProcessBackend {
    async fn verify_invitation(&self, invitation_code: Option<&str>) -> Result<(), SubmissionError> {
        if self.config.accepts_invitation(invitation_code) {
            Ok(())
        } else {
            Err(SubmissionError::AccessDenied(
                "Invalid invitation code".to_string(),
            ))
        }
    }

    async fn health(&self) -> Result<(), SubmissionError> {
        Ok(())
    }

    async fn request_match(&self, request: &MatchRequest) -> Result<Value, SubmissionError> {
        if !self
            .config
            .accepts_invitation(request.invitation_code.as_deref())
        {
            return Err(SubmissionError::RequestFailed(
                "Invalid or missing invitation code".to_string(),
            ));
        }

        let mut options = request.options;
        options.top_k = options.top_k.or(Some(self.config.max_candidates));
        options.min_similarity = options.min_similarity.or(self.config.min_similarity);

        let response = self
            .engine
            .match_candidates(&request.job_description, request.candidates.clone(), &options)
            .await
            .map_err(|e| SubmissionError::RequestFailed(e.public_message()))?;

        serde_json::to_value(response)
            .map_err(|e| SubmissionError::RequestFailed(format!("Malformed response: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{MatchOptions, SubmittedCandidate};

    fn match_request() -> MatchRequest {
        MatchRequest {
            job_description: "JD".to_string(),
            candidates: vec![SubmittedCandidate::from_text(1, "text")],
            options: MatchOptions::default(),
            invitation_code: Some("code".to_string()),
        }
    }

    #[tokio::test]
    async fn test_counts_calls_and_records_request() {
        let fake = FakeBackend::new();
        fake.verify_invitation(Some("code")).await.unwrap();
        fake.health().await.unwrap();
        fake.request_match(&match_request()).await.unwrap();

        assert_eq!(
            (fake.verify_calls(), fake.health_calls(), fake.match_calls()),
            (1, 1, 1)
        );
        assert_eq!(fake.last_invitation().await.as_deref(), Some("code"));
        assert_eq!(fake.last_request().await.unwrap().job_description, "JD");
    }

    #[tokio::test]
    async fn test_transient_health_failures_run_out() {
        let fake = FakeBackend::new().with_transient_health_failures(1);
        assert!(fake.health().await.is_err());
        assert!(fake.health().await.is_ok());
    }
}
