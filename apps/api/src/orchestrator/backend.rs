//! Remote recommendation backend, as seen by the submission orchestrator.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::debug;

use super::error::SubmissionError;
use crate::protocol::{
    MatchRequest, VerifyInvitationRequest, HEALTH_PATH, MATCH_PATH, VERIFY_INVITATION_PATH,
};

pub const DEFAULT_SERVER_URL: &str = "http://localhost:5000";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

const INVALID_INVITATION: &str = "Invalid invitation code";
const REQUEST_FAILED: &str = "Request failed";

/// The three remote steps of a submission.
///
/// `request_match` hands back the raw envelope so normalization can tolerate
/// whatever shape the backend sends.
#[async_trait]
pub trait RecommendationBackend: Send + Sync {
    async fn verify_invitation(&self, invitation_code: Option<&str>) -> Result<(), SubmissionError>;

    async fn health(&self) -> Result<(), SubmissionError>;

    async fn request_match(&self, request: &MatchRequest) -> Result<Value, SubmissionError>;
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    /// Applied to every remote call.
    pub timeout: Duration,
    /// Whether the deployment gates submissions behind an invitation code.
    pub verify_access: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SERVER_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            verify_access: false,
        }
    }
}

/// JSON-over-HTTP backend.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(config: &ClientConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl RecommendationBackend for HttpBackend {
    async fn verify_invitation(&self, invitation_code: Option<&str>) -> Result<(), SubmissionError> {
        let body = VerifyInvitationRequest {
            invitation_code: invitation_code.map(str::to_string),
        };

        let response = self
            .client
            .post(self.url(VERIFY_INVITATION_PATH))
            .json(&body)
            .send()
            .await
            .map_err(unavailable)?;

        let status = response.status();
        if status.is_server_error() {
            return Err(SubmissionError::BackendUnavailable(format!(
                "invitation check returned {status}"
            )));
        }

        let envelope = response.json::<Value>().await.unwrap_or(Value::Null);
        if let Some(message) = error_message(&envelope) {
            return Err(SubmissionError::AccessDenied(message));
        }
        if !status.is_success() {
            return Err(SubmissionError::AccessDenied(INVALID_INVITATION.to_string()));
        }

        match envelope.get("valid").and_then(Value::as_bool) {
            Some(true) => Ok(()),
            _ => Err(SubmissionError::AccessDenied(INVALID_INVITATION.to_string())),
        }
    }

    async fn health(&self) -> Result<(), SubmissionError> {
        let response = self
            .client
            .get(self.url(HEALTH_PATH))
            .send()
            .await
            .map_err(unavailable)?;

        let status = response.status();
        let envelope = response.json::<Value>().await.unwrap_or(Value::Null);

        if let Some(message) = error_message(&envelope) {
            return Err(SubmissionError::BackendUnavailable(message));
        }
        if !status.is_success() {
            return Err(SubmissionError::BackendUnavailable(format!(
                "health check returned {status}"
            )));
        }

        debug!(status = ?envelope.get("status"), "Backend healthy");
        Ok(())
    }

    async fn request_match(&self, request: &MatchRequest) -> Result<Value, SubmissionError> {
        let response = self
            .client
            .post(self.url(MATCH_PATH))
            .json(request)
            .send()
            .await
            .map_err(transport_failure)?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(transport_failure)?;

        if !status.is_success() {
            let envelope: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
            return Err(SubmissionError::RequestFailed(
                error_message(&envelope).unwrap_or_else(|| describe_status(status)),
            ));
        }

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(SubmissionError::EmptyResponse);
        }

        serde_json::from_slice(&bytes)
            .map_err(|e| SubmissionError::RequestFailed(format!("Malformed response: {e}")))
    }
}

/// The backend's `{error}` message, when the envelope carries one.
pub(crate) fn error_message(envelope: &Value) -> Option<String> {
    envelope
        .get("error")
        .and_then(Value::as_str)
        .filter(|m| !m.trim().is_empty())
        .map(str::to_string)
}

fn describe_status(status: StatusCode) -> String {
    format!("{REQUEST_FAILED} ({status})")
}

fn unavailable(e: reqwest::Error) -> SubmissionError {
    SubmissionError::BackendUnavailable(e.to_string())
}

/// Timeouts and refused connections mean the backend is unavailable; anything
/// else is a failure of the request itself.
fn transport_failure(e: reqwest::Error) -> SubmissionError {
    if e.is_timeout() || e.is_connect() {
        SubmissionError::BackendUnavailable(e.to_string())
    } else {
        SubmissionError::RequestFailed(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(
            error_message(&json!({"error": "Job description is required"})).as_deref(),
            Some("Job description is required")
        );
        assert_eq!(error_message(&json!({"error": "  "})), None);
        assert_eq!(error_message(&json!({"status": "healthy"})), None);
        assert_eq!(error_message(&Value::Null), None);
    }

    #[test]
    fn test_base_url_trailing_slash_is_dropped() {
        let backend = HttpBackend::new(&ClientConfig {
            base_url: "http://example.test/".to_string(),
            ..ClientConfig::default()
        })
        .unwrap();
        assert_eq!(backend.url(MATCH_PATH), "http://example.test/api/match");
    }

    #[test]
    fn test_status_description() {
        assert_eq!(
            describe_status(StatusCode::BAD_GATEWAY),
            "Request failed (502 Bad Gateway)"
        );
    }
}
