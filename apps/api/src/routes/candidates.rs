use std::path::Path as FilePath;

use anyhow::anyhow;
use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::JsonRejection,
        Multipart, Path, State,
    },
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::AppError;
use crate::protocol::SubmittedCandidate;
use crate::ranking::content::resolve_content;
use crate::store::CandidatePreview;
use crate::state::AppState;

/// Multipart field carrying resume files.
pub const UPLOAD_FIELD: &str = "files";
const ALLOWED_EXTENSIONS: [&str; 2] = ["txt", "pdf"];

#[derive(Deserialize)]
pub struct AddCandidatesRequest {
    #[serde(default)]
    pub candidates: Vec<SubmittedCandidate>,
}

#[derive(Serialize)]
pub struct AddCandidatesResponse {
    pub message: String,
    pub added_count: usize,
    pub total_candidates: usize,
}

#[derive(Serialize)]
pub struct UploadCandidatesResponse {
    pub message: String,
    pub uploaded_count: usize,
    pub total_candidates: usize,
}

#[derive(Serialize)]
pub struct CandidateListResponse {
    pub total_candidates: usize,
    pub candidates: Vec<CandidatePreview>,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// POST /api/candidates
pub async fn handle_add_candidates(
    State(state): State<AppState>,
    payload: Result<Json<AddCandidatesRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AddCandidatesResponse>), AppError> {
    let Json(request) = payload?;
    if request.candidates.is_empty() {
        return Err(AppError::Validation(
            "Candidates data is required".to_string(),
        ));
    }
    if request.candidates.iter().any(|c| c.id.trim().is_empty()) {
        return Err(AppError::Validation(
            "Every candidate needs an id".to_string(),
        ));
    }

    let (added_count, total_candidates) = state.store.add(request.candidates).await?;
    info!(added_count, total_candidates, "Candidates stored");

    Ok((
        StatusCode::CREATED,
        Json(AddCandidatesResponse {
            message: format!("Added {added_count} candidates"),
            added_count,
            total_candidates,
        }),
    ))
}

/// POST /api/candidates/upload
/// Each `.txt` or `.pdf` file in the `files` field becomes one candidate named
/// after the file stem. Files that yield no text are skipped.
pub async fn handle_upload_candidates(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<UploadCandidatesResponse>), AppError> {
    let mut multipart = multipart?;
    let mut saw_files = false;
    let mut uploads = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        saw_files = true;

        let file_name = field.file_name().unwrap_or_default().to_string();
        if !is_allowed_upload(&file_name) {
            debug!(file_name = %file_name, "Skipping upload with unsupported extension");
            continue;
        }
        let bytes = field.bytes().await?;
        uploads.push(SubmittedCandidate::from_document(&file_name, &bytes));
    }

    if !saw_files {
        return Err(AppError::Validation("No files provided".to_string()));
    }

    let candidates = extract_uploads(uploads).await?;
    if candidates.is_empty() {
        return Err(AppError::Validation(
            "No valid candidates found in uploaded files".to_string(),
        ));
    }

    let (uploaded_count, total_candidates) = state.store.add(candidates).await?;
    info!(uploaded_count, total_candidates, "Uploaded candidates stored");

    Ok((
        StatusCode::CREATED,
        Json(UploadCandidatesResponse {
            message: format!("Successfully uploaded {uploaded_count} candidates"),
            uploaded_count,
            total_candidates,
        }),
    ))
}

fn is_allowed_upload(file_name: &str) -> bool {
    FilePath::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            ALLOWED_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
}

/// Extracts text on the blocking pool. The pool keeps the extracted text as
/// `info`, not the uploaded bytes.
async fn extract_uploads(
    uploads: Vec<SubmittedCandidate>,
) -> Result<Vec<SubmittedCandidate>, AppError> {
    tokio::task::spawn_blocking(move || {
        uploads
            .into_iter()
            .filter_map(|mut candidate| {
                let text = resolve_content(&candidate).ok()?.text;
                if text.trim().is_empty() {
                    debug!(name = %candidate.name, "Upload yielded no text");
                    return None;
                }
                candidate.info = text;
                candidate.resume.clear();
                Some(candidate)
            })
            .collect()
    })
    .await
    .map_err(|e| AppError::Internal(anyhow!("upload extraction task failed: {e}")))
}

/// GET /api/candidates
pub async fn handle_list_candidates(State(state): State<AppState>) -> Json<CandidateListResponse> {
    let candidates = state.store.previews().await;
    Json(CandidateListResponse {
        total_candidates: candidates.len(),
        candidates,
    })
}

/// DELETE /api/candidates
pub async fn handle_clear_candidates(State(state): State<AppState>) -> Json<MessageResponse> {
    state.store.clear().await;
    Json(MessageResponse {
        message: "All candidates cleared".to_string(),
    })
}

/// DELETE /api/candidates/:id
pub async fn handle_delete_candidate(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    if !state.store.remove(&id).await {
        return Err(AppError::NotFound("Candidate not found".to_string()));
    }
    Ok(Json(MessageResponse {
        message: format!("Candidate {id} deleted"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_text_and_pdf_uploads_are_allowed() {
        assert!(is_allowed_upload("jane.txt"));
        assert!(is_allowed_upload("JANE.PDF"));
        assert!(!is_allowed_upload("jane.docx"));
        assert!(!is_allowed_upload("txt"));
        assert!(!is_allowed_upload(""));
    }

    #[tokio::test]
    async fn test_empty_uploads_are_skipped() {
        let uploads = vec![
            SubmittedCandidate::from_document("jane.txt", b"Rust engineer"),
            SubmittedCandidate::from_document("blank.txt", b"   "),
        ];
        let extracted = extract_uploads(uploads).await.unwrap();

        assert_eq!(extracted.len(), 1);
        assert_eq!(extracted[0].name, "jane");
        assert_eq!(extracted[0].info, "Rust engineer");
        assert!(!extracted[0].has_document());
    }
}
