use thiserror::Error;

/// Why a submission attempt was aborted. No partial results accompany any variant.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SubmissionError {
    /// Invitation code explicitly rejected. The user must supply a valid one.
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Health check failed, the backend was unreachable, or a call timed out.
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The recommendation call returned an application error, carried verbatim.
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Backend returned an empty response")]
    EmptyResponse,

    #[error("Submission cancelled")]
    Cancelled,
}

impl SubmissionError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, SubmissionError::BackendUnavailable(_))
    }
}
