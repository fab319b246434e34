//! Content resolution: decides which text of a candidate gets scored.
//!
//! A non-empty `resume` is authoritative. `info` is used when there is no
//! document or the document yields no text.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;
use tracing::{debug, warn};

use crate::protocol::SubmittedCandidate;

const PDF_MAGIC: &[u8] = b"%PDF";
/// Punctuation kept by `clean_text`.
const KEPT_PUNCTUATION: &str = ".,!?;:-()";

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("Candidate '{id}': resume is not valid base64")]
    InvalidEncoding { id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentSource {
    Document,
    Info,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedContent {
    pub text: String,
    pub source: ContentSource,
}

pub fn resolve_content(candidate: &SubmittedCandidate) -> Result<ResolvedContent, ContentError> {
    let encoded = candidate.resume.trim();
    if encoded.is_empty() {
        return Ok(info_content(candidate));
    }

    let bytes = STANDARD
        .decode(encoded)
        .map_err(|_| ContentError::InvalidEncoding {
            id: candidate.id.clone(),
        })?;

    let text = document_text(&candidate.id, &bytes);
    if text.trim().is_empty() {
        debug!(candidate_id = %candidate.id, "Document yielded no text, using info");
        return Ok(info_content(candidate));
    }

    Ok(ResolvedContent {
        text,
        source: ContentSource::Document,
    })
}

fn info_content(candidate: &SubmittedCandidate) -> ResolvedContent {
    ResolvedContent {
        text: candidate.info.clone(),
        source: ContentSource::Info,
    }
}

/// PDFs are text-extracted; anything else is pasted text that was base64-encoded.
fn document_text(candidate_id: &str, bytes: &[u8]) -> String {
    if !bytes.starts_with(PDF_MAGIC) {
        return String::from_utf8_lossy(bytes).into_owned();
    }

    // pdf-extract panics on some malformed inputs
    match std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes)) {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => {
            warn!(candidate_id, error = ?e, "PDF text extraction failed");
            String::new()
        }
        Err(_) => {
            warn!(candidate_id, "PDF text extraction panicked");
            String::new()
        }
    }
}

/// Normalizes text before scoring: strips HTML tags, drops symbols other than
/// basic punctuation, and collapses whitespace.
pub fn clean_text(text: &str) -> String {
    let mut stripped = String::with_capacity(text.len());
    let mut in_tag = false;
    let mut tag = String::new();

    for ch in text.chars() {
        if in_tag {
            if ch == '>' {
                in_tag = false;
                tag.clear();
            } else {
                tag.push(ch);
            }
        } else if ch == '<' {
            in_tag = true;
        } else {
            stripped.push(ch);
        }
    }
    // an unclosed '<' is not a tag
    if in_tag {
        stripped.push_str(&tag);
    }

    stripped
        .chars()
        .filter(|&c| {
            c.is_alphanumeric() || c == '_' || c.is_whitespace() || KEPT_PUNCTUATION.contains(c)
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
