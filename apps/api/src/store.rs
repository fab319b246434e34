use std::sync::Arc;

use anyhow::anyhow;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::errors::AppError;
use crate::protocol::SubmittedCandidate;
use crate::ranking::content::resolve_content;

const PREVIEW_CHARS: usize = 200;

/// Listing view of a stored candidate. Never carries the document itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidatePreview {
    pub id: String,
    pub name: String,
    pub resume_preview: String,
}

/// Candidate plus its listing text, resolved once when it is added.
#[derive(Clone)]
struct StoredCandidate {
    candidate: SubmittedCandidate,
    resume_preview: String,
}

/// In-memory pool of candidates that `POST /api/match` falls back to when a
/// request carries none. Process-local; lost on restart.
#[derive(Clone, Default)]
pub struct CandidateStore {
    inner: Arc<RwLock<Vec<StoredCandidate>>>,
}

impl CandidateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds candidates, replacing any stored candidate with the same id.
    /// Returns the number added and the new total.
    ///
    /// Previews are built on the blocking pool before the write lock is taken.
    pub async fn add(
        &self,
        candidates: Vec<SubmittedCandidate>,
    ) -> Result<(usize, usize), AppError> {
        let stored = build_previews(candidates).await?;

        let mut guard = self.inner.write().await;
        let added = stored.len();
        for entry in stored {
            match guard
                .iter_mut()
                .find(|c| c.candidate.id == entry.candidate.id)
            {
                Some(existing) => *existing = entry,
                None => guard.push(entry),
            }
        }
        Ok((added, guard.len()))
    }

    pub async fn all(&self) -> Vec<SubmittedCandidate> {
        self.inner
            .read()
            .await
            .iter()
            .map(|c| c.candidate.clone())
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Removes one candidate. Returns false when the id is unknown.
    pub async fn remove(&self, id: &str) -> bool {
        let mut guard = self.inner.write().await;
        let before = guard.len();
        guard.retain(|c| c.candidate.id != id);
        guard.len() != before
    }

    pub async fn clear(&self) {
        self.inner.write().await.clear();
    }

    pub async fn previews(&self) -> Vec<CandidatePreview> {
        self.inner
            .read()
            .await
            .iter()
            .map(|c| CandidatePreview {
                id: c.candidate.id.clone(),
                name: c.candidate.name.clone(),
                resume_preview: c.resume_preview.clone(),
            })
            .collect()
    }
}

async fn build_previews(
    candidates: Vec<SubmittedCandidate>,
) -> Result<Vec<StoredCandidate>, AppError> {
    tokio::task::spawn_blocking(move || {
        candidates
            .into_iter()
            .map(|candidate| StoredCandidate {
                resume_preview: preview_text(&candidate),
                candidate,
            })
            .collect()
    })
    .await
    .map_err(|e| AppError::Internal(anyhow!("preview task failed: {e}")))
}

fn preview_text(candidate: &SubmittedCandidate) -> String {
    let text = resolve_content(candidate)
        .map(|resolved| resolved.text)
        .unwrap_or_else(|_| candidate.info.clone());
    truncate_preview(text)
}

fn truncate_preview(text: String) -> String {
    if text.chars().count() > PREVIEW_CHARS {
        let head: String = text.chars().take(PREVIEW_CHARS).collect();
        format!("{head}...")
    } else {
        text
    }
}
