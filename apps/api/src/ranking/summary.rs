//! Candidate summaries. Every ranked candidate gets one, so the LLM path
//! always falls back to the extractive summary instead of failing.

use async_trait::async_trait;
use tracing::warn;

use crate::llm_client::prompts::GROUNDING_INSTRUCTION;
use crate::llm_client::LlmClient;
use crate::ranking::prompts::{SUMMARY_PROMPT_TEMPLATE, SUMMARY_SYSTEM};

/// Keeps prompts bounded for very long resumes.
const MAX_PROMPT_RESUME_CHARS: usize = 12_000;
const SUMMARY_KEYWORDS: [&str; 6] = ["experience", "skills", "education", "project", "work", "job"];
const MAX_KEY_LINES: usize = 3;
const MIN_KEY_LINE_CHARS: usize = 10;

#[async_trait]
pub trait Summarizer: Send + Sync {
    fn name(&self) -> &'static str;

    async fn summarize(&self, job_description: &str, candidate_name: &str, resume_text: &str)
        -> String;
}

/// Heuristic summary built from lines that mention experience, skills and the like.
pub struct ExtractiveSummarizer;

#[async_trait]
impl Summarizer for ExtractiveSummarizer {
    fn name(&self) -> &'static str {
        "extractive"
    }

    async fn summarize(
        &self,
        _job_description: &str,
        candidate_name: &str,
        resume_text: &str,
    ) -> String {
        extractive_summary(candidate_name, resume_text)
    }
}

pub fn extractive_summary(candidate_name: &str, resume_text: &str) -> String {
    let key_lines: Vec<&str> = resume_text
        .lines()
        .map(str::trim)
        .filter(|line| line.chars().count() > MIN_KEY_LINE_CHARS)
        .filter(|line| {
            let lower = line.to_lowercase();
            SUMMARY_KEYWORDS.iter().any(|k| lower.contains(k))
        })
        .take(MAX_KEY_LINES)
        .collect();

    if key_lines.is_empty() {
        format!("{candidate_name} is a qualified candidate with relevant background.")
    } else {
        format!(
            "{candidate_name} has relevant experience in: {}",
            key_lines.join("; ")
        )
    }
}

/// Model-written summary via the shared LLM client.
pub struct LlmSummarizer {
    llm: LlmClient,
}

impl LlmSummarizer {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Summarizer for LlmSummarizer {
    fn name(&self) -> &'static str {
        "llm"
    }

    async fn summarize(
        &self,
        job_description: &str,
        candidate_name: &str,
        resume_text: &str,
    ) -> String {
        let prompt = build_summary_prompt(job_description, candidate_name, resume_text);

        match self.llm.complete(&prompt, SUMMARY_SYSTEM).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!(error = %e, "LLM summary failed, using extractive summary");
                extractive_summary(candidate_name, resume_text)
            }
        }
    }
}

fn build_summary_prompt(job_description: &str, candidate_name: &str, resume_text: &str) -> String {
    let resume_excerpt: String = resume_text.chars().take(MAX_PROMPT_RESUME_CHARS).collect();

    fill_template(
        SUMMARY_PROMPT_TEMPLATE,
        &[
            ("grounding_instruction", GROUNDING_INSTRUCTION),
            ("job_description", job_description),
            ("candidate_name", candidate_name),
            ("resume_text", &resume_excerpt),
        ],
    )
}

/// Replaces `{key}` placeholders in one pass over `template`. Substituted
/// values are never rescanned; unknown keys are left as written.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let filled = after.find('}').and_then(|close| {
            let key = &after[..close];
            values
                .iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (close, *value))
        });
        match filled {
            Some((close, value)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
