//! Similarity scoring: pluggable, trait-based scorer comparing a job description
//! against candidate documents.
//!
//! Default: `HashEmbeddingScorer` (pure Rust, deterministic, no model download).
//! `RecommendationEngine` holds an `Arc<dyn SimilarityScorer>`, swapped at startup.

use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use siphasher::sip::SipHasher13;

use crate::errors::AppError;

/// Fixed keys so embeddings are stable across processes and Rust versions.
const HASH_SEED_K0: u64 = 0x7461_6c65_6e74_6d61;
const HASH_SEED_K1: u64 = 0x7463_685f_6869_6e67;
const UNIGRAM_WEIGHT: f32 = 1.0;
const BIGRAM_WEIGHT: f32 = 0.5;

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// Scores every document against one job description.
///
/// Must return one score in [0, 1] per document, in the same order.
#[async_trait]
pub trait SimilarityScorer: Send + Sync {
    fn name(&self) -> &'static str;

    async fn score(&self, job_description: &str, documents: &[String])
        -> Result<Vec<f64>, AppError>;
}

// ────────────────────────────────────────────────────────────────────────────
// HashEmbeddingScorer
// ────────────────────────────────────────────────────────────────────────────

/// Feature-hashed bag-of-words embeddings compared by cosine similarity.
///
/// - Tokens are lowercase alphanumeric runs of two or more characters
/// - Adjacent token pairs are added as bigrams at half weight
/// - Signed hashing keeps collisions from only ever adding up
/// - Vectors are L2-normalized, so the dot product is the cosine
pub struct HashEmbeddingScorer {
    dimension: usize,
}

impl HashEmbeddingScorer {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn hash(&self, token: &str) -> u64 {
        let mut hasher = SipHasher13::new_with_keys(HASH_SEED_K0, HASH_SEED_K1);
        token.hash(&mut hasher);
        hasher.finish()
    }

    pub fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        let tokens = tokenize(text);

        let mut add = |feature: &str, weight: f32| {
            let h = self.hash(feature);
            let idx = (h % self.dimension as u64) as usize;
            // top bit decides the sign so it is independent of the bucket
            let sign = if h >> 63 == 0 { 1.0 } else { -1.0 };
            vector[idx] += sign * weight;
        };

        for token in &tokens {
            add(token, UNIGRAM_WEIGHT);
        }
        for pair in tokens.windows(2) {
            add(&format!("{} {}", pair[0], pair[1]), BIGRAM_WEIGHT);
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

#[async_trait]
impl SimilarityScorer for HashEmbeddingScorer {
    fn name(&self) -> &'static str {
        "hash-embedding"
    }

    async fn score(
        &self,
        job_description: &str,
        documents: &[String],
    ) -> Result<Vec<f64>, AppError> {
        let job = self.embed(job_description);
        Ok(documents
            .iter()
            .map(|doc| cosine_similarity(&job, &self.embed(doc)) as f64)
            .collect())
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= 2)
        .map(str::to_lowercase)
        .collect()
}

/// Cosine similarity clamped to [0, 1]. Zero vectors and mismatched dimensions score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        tracing::warn!(
            a_len = a.len(),
            b_len = b.len(),
            "embedding dimension mismatch; returning zero similarity"
        );
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a * norm_b)).clamp(0.0, 1.0)
}
