//! Ranking, the backend half of the recommendation contract.
//!
//! Flow: resolve content → clean → score → filter → stable sort → cap → rank → summarize.
//! `rank` is the pure ordering core; `RecommendationEngine` drives the whole flow.

pub mod content;
pub mod engine;
pub mod prompts;
pub mod scorer;
pub mod summary;

use crate::protocol::MatchOptions;

pub use engine::RecommendationEngine;

/// A candidate position in submission order, paired with its relevance score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredSlot {
    pub index: usize,
    pub score: f64,
}

/// A surviving candidate after filtering and truncation. `rank` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedSlot {
    pub index: usize,
    pub score: f64,
    pub rank: u32,
}

/// Filters, orders and caps scored candidates.
///
/// 1. Scores are clamped to [0, 1]; NaN counts as 0
/// 2. Drop scores below `min_similarity` (when given)
/// 3. Sort descending by score; ties keep submission order
/// 4. Keep the first `effective_top_k` and number them from 1
pub fn rank(scored: &[ScoredSlot], options: &MatchOptions) -> Vec<RankedSlot> {
    let mut survivors: Vec<ScoredSlot> = scored
        .iter()
        .map(|s| ScoredSlot {
            index: s.index,
            score: sanitize_score(s.score),
        })
        .filter(|s| options.min_similarity.map_or(true, |min| s.score >= min))
        .collect();

    survivors.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.index.cmp(&b.index)));

    survivors
        .into_iter()
        .take(options.effective_top_k())
        .enumerate()
        .map(|(position, s)| RankedSlot {
            index: s.index,
            score: s.score,
            rank: position as u32 + 1,
        })
        .collect()
}

fn sanitize_score(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}
