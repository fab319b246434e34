use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A candidate as submitted for ranking.
///
/// `resume` carries base64-encoded document bytes; when it is empty, `info`
/// holds pasted plain text and is the content that gets scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmittedCandidate {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub info: String,
    #[serde(default)]
    pub resume: String,
}

impl SubmittedCandidate {
    /// Candidate built from pasted text. `position` is 1-based and only used for the label.
    pub fn from_text(position: usize, text: impl Into<String>) -> Self {
        Self {
            id: format!("candidate-{}", Uuid::new_v4()),
            name: format!("Candidate {position}"),
            info: text.into(),
            resume: String::new(),
        }
    }

    /// Candidate built from an uploaded document. The label is the file name without its extension.
    pub fn from_document(file_name: &str, bytes: &[u8]) -> Self {
        let name = Path::new(file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .unwrap_or(file_name)
            .to_string();

        Self {
            id: format!("candidate-{}", Uuid::new_v4()),
            name,
            info: String::new(),
            resume: STANDARD.encode(bytes),
        }
    }

    pub fn has_document(&self) -> bool {
        !self.resume.trim().is_empty()
    }
}

/// Canonical ranked candidate handed back to callers after a submission.
///
/// Replaced wholesale by the next submission; never merged or mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate {
    pub id: String,
    pub name: String,
    pub info: String,
    pub resume: String,
    /// Exactly what the backend sent; `None` when the field was missing.
    pub similarity_score: Option<f64>,
    pub ai_summary: Option<String>,
    pub resume_name: Option<String>,
    pub rank: Option<u32>,
}

impl RankedCandidate {
    /// Score for display. A missing score shows as 0.
    pub fn display_score(&self) -> f64 {
        self.similarity_score.unwrap_or(0.0)
    }
}
