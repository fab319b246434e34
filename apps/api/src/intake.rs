//! Turns files on disk into submitted candidates and checks submission preconditions.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::protocol::SubmittedCandidate;

const PDF_MAGIC: &[u8] = b"%PDF";

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("Please enter a job description")]
    MissingJobDescription,

    #[error("Please upload at least one resume or paste resume text")]
    NoCandidates,

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A file that was not accepted as a resume, with the reason.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedFile {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct Intake {
    pub candidates: Vec<SubmittedCandidate>,
    pub rejected: Vec<RejectedFile>,
}

/// Loads PDF resumes and pasted-text files, in that order.
///
/// Non-PDF resumes are rejected and reported, not fatal. Unreadable text files
/// are an error. Empty text files are skipped.
pub fn load_candidates(resumes: &[PathBuf], texts: &[PathBuf]) -> Result<Intake, IntakeError> {
    let mut intake = Intake::default();

    for path in resumes {
        match read_pdf(path) {
            Ok(bytes) => {
                let file_name = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("resume.pdf");
                debug!(file = %path.display(), bytes = bytes.len(), "Resume accepted");
                intake
                    .candidates
                    .push(SubmittedCandidate::from_document(file_name, &bytes));
            }
            Err(reason) => {
                warn!(file = %path.display(), %reason, "Resume rejected");
                intake.rejected.push(RejectedFile {
                    path: path.clone(),
                    reason,
                });
            }
        }
    }

    let mut text_position = 0;
    for path in texts {
        let text = std::fs::read_to_string(path).map_err(|source| IntakeError::Read {
            path: path.clone(),
            source,
        })?;
        if text.trim().is_empty() {
            warn!(file = %path.display(), "Text file is empty, skipped");
            continue;
        }
        text_position += 1;
        intake
            .candidates
            .push(SubmittedCandidate::from_text(text_position, text));
    }

    Ok(intake)
}

/// Reads a file that must be a PDF by both extension and content.
fn read_pdf(path: &Path) -> Result<Vec<u8>, String> {
    let is_pdf_name = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
    if !is_pdf_name {
        return Err("only PDF files are supported".to_string());
    }

    let bytes = std::fs::read(path).map_err(|e| format!("unreadable: {e}"))?;
    if !bytes.starts_with(PDF_MAGIC) {
        return Err("file is not a valid PDF".to_string());
    }
    Ok(bytes)
}

/// Submission preconditions: a non-blank job description and at least one candidate.
pub fn check_preconditions(
    job_description: &str,
    candidates: &[SubmittedCandidate],
) -> Result<(), IntakeError> {
    if job_description.trim().is_empty() {
        return Err(IntakeError::MissingJobDescription);
    }
    if candidates.is_empty() {
        return Err(IntakeError::NoCandidates);
    }
    Ok(())
}
