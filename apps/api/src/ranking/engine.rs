//! Recommendation engine: runs the ranking contract for one match request.
//!
//! Flow: validate → dedupe ids → resolve content → clean → score → rank →
//!       summarize survivors → assemble `MatchResponse`.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use anyhow::anyhow;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::protocol::{MatchOptions, MatchResponse, RankedEntry, SubmittedCandidate};
use crate::ranking::content::{clean_text, resolve_content, ResolvedContent};
use crate::ranking::scorer::SimilarityScorer;
use crate::ranking::summary::Summarizer;
use crate::ranking::{rank, ScoredSlot};

pub struct RecommendationEngine {
    scorer: Arc<dyn SimilarityScorer>,
    summarizer: Arc<dyn Summarizer>,
}

impl RecommendationEngine {
    pub fn new(scorer: Arc<dyn SimilarityScorer>, summarizer: Arc<dyn Summarizer>) -> Self {
        Self { scorer, summarizer }
    }

    pub fn scorer_name(&self) -> &'static str {
        self.scorer.name()
    }

    pub fn summarizer_name(&self) -> &'static str {
        self.summarizer.name()
    }

    /// Scores, filters, orders, caps and annotates `candidates` against `job_description`.
    pub async fn match_candidates(
        &self,
        job_description: &str,
        candidates: Vec<SubmittedCandidate>,
        options: &MatchOptions,
    ) -> Result<MatchResponse, AppError> {
        let started = Instant::now();

        let job_description = job_description.trim();
        if job_description.is_empty() {
            return Err(AppError::Validation(
                "Job description is required".to_string(),
            ));
        }
        if candidates.is_empty() {
            return Err(AppError::Validation(
                "Candidates data is required".to_string(),
            ));
        }

        let candidates = prepare_candidates(candidates);
        let (candidates, contents) = resolve_all(candidates).await?;

        let job_description = clean_text(job_description);
        let documents: Vec<String> = contents.iter().map(|c| clean_text(&c.text)).collect();
        let scores = self.scorer.score(&job_description, &documents).await?;
        if scores.len() != candidates.len() {
            return Err(AppError::Internal(anyhow!(
                "scorer '{}' returned {} scores for {} candidates",
                self.scorer.name(),
                scores.len(),
                candidates.len()
            )));
        }

        let scored: Vec<ScoredSlot> = scores
            .iter()
            .enumerate()
            .map(|(index, &score)| ScoredSlot { index, score })
            .collect();
        let ranked = rank(&scored, options);

        let mut top_candidates = Vec::with_capacity(ranked.len());
        for slot in &ranked {
            let candidate = &candidates[slot.index];
            // raw text: the extractive summary works line by line
            let resume_text = &contents[slot.index].text;
            let summary = self
                .summarizer
                .summarize(&job_description, &candidate.name, resume_text)
                .await;

            top_candidates.push(RankedEntry {
                id: candidate.id.clone(),
                name: candidate.name.clone(),
                similarity_score: slot.score,
                rank: slot.rank,
                ai_summary: Some(summary),
                resume_text: Some(resume_text.clone()),
                resume_name: None,
            });
        }

        let processing_time_ms = started.elapsed().as_millis() as u64;
        let job_id = Uuid::new_v4().to_string();

        info!(
            job_id = %job_id,
            total_candidates = candidates.len(),
            returned = top_candidates.len(),
            scorer = self.scorer.name(),
            processing_time_ms,
            "Match completed"
        );

        Ok(MatchResponse {
            job_id,
            total_candidates: candidates.len(),
            top_candidates,
            processing_time_ms,
        })
    }
}

/// Fills missing ids and names, and keeps only the first candidate per id.
fn prepare_candidates(candidates: Vec<SubmittedCandidate>) -> Vec<SubmittedCandidate> {
    let mut seen = HashSet::new();
    let mut prepared = Vec::with_capacity(candidates.len());

    for mut candidate in candidates {
        if candidate.id.trim().is_empty() {
            candidate.id = Uuid::new_v4().to_string();
        }
        if candidate.name.trim().is_empty() {
            let short: String = candidate.id.chars().take(8).collect();
            candidate.name = format!("Candidate_{short}");
        }
        if !seen.insert(candidate.id.clone()) {
            warn!(candidate_id = %candidate.id, "Duplicate candidate id dropped");
            continue;
        }
        prepared.push(candidate);
    }

    prepared
}

/// Resolves every candidate's content off the async runtime (PDF extraction is CPU-bound).
async fn resolve_all(
    candidates: Vec<SubmittedCandidate>,
) -> Result<(Vec<SubmittedCandidate>, Vec<ResolvedContent>), AppError> {
    let (candidates, resolved) = tokio::task::spawn_blocking(move || {
        let resolved: Vec<_> = candidates.iter().map(resolve_content).collect();
        (candidates, resolved)
    })
    .await
    .map_err(|e| AppError::Internal(anyhow!("content resolution task failed: {e}")))?;

    let contents = resolved
        .into_iter()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    Ok((candidates, contents))
}
