use std::str::FromStr;

use anyhow::{Context, Result};

use crate::protocol::DEFAULT_TOP_K;

/// 16 MiB, large enough for a batch of base64-encoded PDFs.
const DEFAULT_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;
const DEFAULT_EMBEDDING_DIMENSION: usize = 512;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Accepted invitation codes. Empty means the deployment is not gated.
    pub invitation_codes: Vec<String>,
    /// Result cap used when a request does not carry `top_k`.
    pub max_candidates: usize,
    /// Threshold used when a request does not carry `min_similarity`.
    pub min_similarity: Option<f64>,
    pub embedding_dimension: usize,
    /// Enables model-written candidate summaries when present.
    pub anthropic_api_key: Option<String>,
    pub max_body_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5000,
            rust_log: "info".to_string(),
            invitation_codes: Vec::new(),
            max_candidates: DEFAULT_TOP_K,
            min_similarity: None,
            embedding_dimension: DEFAULT_EMBEDDING_DIMENSION,
            anthropic_api_key: None,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = Config::default();

        Ok(Config {
            port: parse_env("PORT")?.unwrap_or(defaults.port),
            rust_log: std::env::var("RUST_LOG").unwrap_or(defaults.rust_log),
            invitation_codes: std::env::var("INVITATION_CODES")
                .map(|raw| parse_codes(&raw))
                .unwrap_or_default(),
            max_candidates: parse_env("MAX_CANDIDATES")?.unwrap_or(defaults.max_candidates),
            min_similarity: parse_env("MIN_SIMILARITY_THRESHOLD")?,
            embedding_dimension: parse_env("EMBEDDING_DIMENSION")?
                .unwrap_or(defaults.embedding_dimension),
            anthropic_api_key: std::env::var("ANTHROPIC_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            max_body_bytes: parse_env("MAX_BODY_BYTES")?.unwrap_or(defaults.max_body_bytes),
        })
    }

    pub fn access_gated(&self) -> bool {
        !self.invitation_codes.is_empty()
    }

    /// Whether `code` grants access. Always true for an ungated deployment.
    pub fn accepts_invitation(&self, code: Option<&str>) -> bool {
        if !self.access_gated() {
            return true;
        }
        let provided = code.unwrap_or("").trim();
        !provided.is_empty() && self.invitation_codes.iter().any(|c| c == provided)
    }
}

fn parse_codes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_env<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("Environment variable '{key}' has an invalid value")),
        _ => Ok(None),
    }
}
