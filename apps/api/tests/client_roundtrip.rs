use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{routing::get, routing::post, Json, Router};
use serde_json::json;
use tokio_util::sync::CancellationToken;

use talentmatch::config::Config;
use talentmatch::orchestrator::{
    ClientConfig, HttpBackend, NoopObserver, RecommendationBackend, SubmissionError,
    SubmissionEvent, SubmissionOrchestrator, SubmissionRequest,
};
use talentmatch::protocol::{MatchOptions, SubmittedCandidate};
use talentmatch::ranking::scorer::HashEmbeddingScorer;
use talentmatch::ranking::summary::ExtractiveSummarizer;
use talentmatch::ranking::RecommendationEngine;
use talentmatch::routes::build_router;
use talentmatch::state::AppState;

async fn spawn_server(config: Config) -> SocketAddr {
    let engine = RecommendationEngine::new(
        Arc::new(HashEmbeddingScorer::new(512)),
        Arc::new(ExtractiveSummarizer),
    );
    let app = build_router(AppState::new(config, engine));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn client_config(addr: SocketAddr, verify_access: bool) -> ClientConfig {
    ClientConfig {
        base_url: format!("http://{addr}"),
        timeout: Duration::from_secs(10),
        verify_access,
    }
}

fn client(addr: SocketAddr, verify_access: bool) -> (HttpBackend, SubmissionOrchestrator) {
    let config = client_config(addr, verify_access);
    let backend = HttpBackend::new(&config).unwrap();
    let orchestrator = SubmissionOrchestrator::from_config(&config).unwrap();
    (backend, orchestrator)
}

fn candidates() -> Vec<SubmittedCandidate> {
    vec![
        SubmittedCandidate::from_text(1, "Florist with ten years of wedding work"),
        SubmittedCandidate::from_text(2, "Rust backend engineer, PostgreSQL, Kubernetes"),
        SubmittedCandidate::from_document("go_dev.pdf", b"not a real pdf"),
    ]
}

#[tokio::test]
async fn submission_round_trip() {
    let addr = spawn_server(Config::default()).await;
    let (_, orchestrator) = client(addr, true);

    let events = Mutex::new(Vec::new());
    let observer = |event: SubmissionEvent| events.lock().unwrap().push(event);

    let request = SubmissionRequest::new("Senior Rust backend engineer", candidates()).with_options(
        MatchOptions {
            top_k: Some(2),
            min_similarity: None,
        },
    );
    let ranked = orchestrator
        .submit(&request, &observer, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0].name, "Candidate 2");
    assert_eq!(ranked[0].info, "Rust backend engineer, PostgreSQL, Kubernetes");
    assert!(ranked[0].display_score() >= ranked[1].display_score());
    assert_eq!(ranked[0].rank, Some(1));
    assert_eq!(
        *events.lock().unwrap(),
        vec![
            SubmissionEvent::Progress(20),
            SubmissionEvent::Progress(80),
            SubmissionEvent::Progress(100),
            SubmissionEvent::Succeeded { count: 2 },
        ]
    );
}

#[tokio::test]
async fn wrong_code_is_access_denied() {
    let addr = spawn_server(Config {
        invitation_codes: vec!["letmein".to_string()],
        ..Config::default()
    })
    .await;
    let (backend, orchestrator) = client(addr, true);

    let err = orchestrator
        .submit(
            &SubmissionRequest::new("JD", candidates()).with_access_token("wrong"),
            &NoopObserver,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, SubmissionError::AccessDenied(_)));

    assert!(backend.verify_invitation(Some("letmein")).await.is_ok());
}

#[tokio::test]
async fn gated_match_without_verification_is_request_failed() {
    let addr = spawn_server(Config {
        invitation_codes: vec!["letmein".to_string()],
        ..Config::default()
    })
    .await;
    let (_, orchestrator) = client(addr, false);

    let err = orchestrator
        .submit(
            &SubmissionRequest::new("JD", candidates()),
            &NoopObserver,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        SubmissionError::RequestFailed("Invalid or missing invitation code".to_string())
    );
}

#[tokio::test]
async fn blank_job_description_is_reported_verbatim() {
    let addr = spawn_server(Config::default()).await;
    let (_, orchestrator) = client(addr, false);

    let err = orchestrator
        .submit(
            &SubmissionRequest::new("   ", candidates()),
            &NoopObserver,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        SubmissionError::RequestFailed("Job description is required".to_string())
    );
}

#[tokio::test]
async fn unreachable_backend_is_unavailable() {
    // bind then drop to get a port nothing listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let (backend, orchestrator) = client(addr, false);
    assert!(matches!(
        backend.health().await,
        Err(SubmissionError::BackendUnavailable(_))
    ));

    let err = orchestrator
        .submit(
            &SubmissionRequest::new("JD", candidates()),
            &NoopObserver,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, SubmissionError::BackendUnavailable(_)));
}

#[tokio::test]
async fn slow_backend_times_out_as_unavailable() {
    let app = Router::new()
        .route("/api/health", get(|| async { Json(json!({"status": "healthy"})) }))
        .route(
            "/api/match",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({"top_candidates": []}))
            }),
        );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let config = ClientConfig {
        timeout: Duration::from_millis(300),
        ..client_config(addr, false)
    };
    let orchestrator = SubmissionOrchestrator::from_config(&config).unwrap();

    let err = orchestrator
        .submit(
            &SubmissionRequest::new("JD", candidates()),
            &NoopObserver,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
    assert!(
        matches!(err, SubmissionError::BackendUnavailable(_)),
        "got {err:?}"
    );
}
