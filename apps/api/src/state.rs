use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::config::Config;
use crate::llm_client::{self, LlmClient};
use crate::ranking::scorer::{HashEmbeddingScorer, SimilarityScorer};
use crate::ranking::summary::{ExtractiveSummarizer, LlmSummarizer, Summarizer};
use crate::ranking::RecommendationEngine;
use crate::store::CandidateStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub engine: Arc<RecommendationEngine>,
    /// Fallback pool for match requests that carry no candidates.
    pub store: CandidateStore,
}

impl AppState {
    /// Wires the engine from config. Summaries come from the LLM only when an API key is set.
    pub fn from_config(config: Config) -> Result<Self> {
        let scorer: Arc<dyn SimilarityScorer> =
            Arc::new(HashEmbeddingScorer::new(config.embedding_dimension));

        let summarizer: Arc<dyn Summarizer> = match &config.anthropic_api_key {
            Some(key) => {
                let llm = LlmClient::new(key.clone())?;
                info!("LLM client initialized (model: {})", llm_client::MODEL);
                Arc::new(LlmSummarizer::new(llm))
            }
            None => {
                info!("ANTHROPIC_API_KEY not set, using extractive summaries");
                Arc::new(ExtractiveSummarizer)
            }
        };

        Ok(Self::new(config, RecommendationEngine::new(scorer, summarizer)))
    }

    pub fn new(config: Config, engine: RecommendationEngine) -> Self {
        Self {
            config,
            engine: Arc::new(engine),
            store: CandidateStore::new(),
        }
    }
}
