use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use talentmatch::intake::{check_preconditions, load_candidates};
use talentmatch::orchestrator::{
    submit_with_retry, ClientConfig, RetryPolicy, SubmissionEvent, SubmissionOrchestrator,
    SubmissionRequest,
};
use talentmatch::protocol::{MatchOptions, RankedCandidate};

#[derive(Parser)]
#[command(name = "talentmatch-submit")]
#[command(about = "Submit a job description and resumes to a TalentMatch backend", long_about = None)]
struct Cli {
    /// Backend base URL
    #[arg(long, env = "TALENTMATCH_SERVER_URL", default_value = "http://localhost:5000")]
    server: String,

    /// Job description text
    #[arg(long, conflicts_with = "job_file")]
    job: Option<String>,

    /// File holding the job description
    #[arg(long)]
    job_file: Option<PathBuf>,

    /// PDF resume (repeatable)
    #[arg(long = "resume")]
    resumes: Vec<PathBuf>,

    /// Plain-text resume file (repeatable)
    #[arg(long = "text")]
    texts: Vec<PathBuf>,

    /// Invitation code for gated deployments
    #[arg(long, env = "TALENTMATCH_INVITATION_CODE")]
    invitation_code: Option<String>,

    /// Verify the invitation code before submitting
    #[arg(long)]
    verify_access: bool,

    /// Maximum number of candidates to return
    #[arg(long)]
    top_k: Option<usize>,

    /// Drop candidates scoring below this threshold
    #[arg(long)]
    min_similarity: Option<f64>,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 120)]
    timeout_secs: u64,

    /// Attempts when the backend is unavailable
    #[arg(long, default_value_t = 3)]
    retries: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("{}=warn", env!("CARGO_PKG_NAME")))),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let job_description = match (&cli.job, &cli.job_file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read job description from {}", path.display()))?,
        (None, None) => String::new(),
    };

    let intake = load_candidates(&cli.resumes, &cli.texts)?;
    for rejected in &intake.rejected {
        eprintln!("Skipped {}: {}", rejected.path.display(), rejected.reason);
    }
    check_preconditions(&job_description, &intake.candidates)?;

    let client_config = ClientConfig {
        base_url: cli.server.clone(),
        timeout: Duration::from_secs(cli.timeout_secs),
        verify_access: cli.verify_access,
    };
    let orchestrator =
        SubmissionOrchestrator::from_config(&client_config).context("Failed to build HTTP client")?;

    let mut request = SubmissionRequest::new(job_description, intake.candidates).with_options(
        MatchOptions {
            top_k: cli.top_k,
            min_similarity: cli.min_similarity,
        },
    );
    if let Some(code) = &cli.invitation_code {
        request = request.with_access_token(code.clone());
    }

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_ctrl_c.cancel();
        }
    });

    info!(
        server = %client_config.base_url,
        candidates = request.candidates().len(),
        "Submitting"
    );

    let observer = |event: SubmissionEvent| match event {
        SubmissionEvent::Progress(pct) => eprintln!("Processing... {pct}%"),
        SubmissionEvent::Succeeded { count } => eprintln!("Done: {count} candidates ranked"),
        SubmissionEvent::Failed(e) => eprintln!("Attempt failed: {e}"),
    };
    let policy = RetryPolicy {
        max_attempts: cli.retries,
        ..RetryPolicy::default()
    };

    let ranked = submit_with_retry(&orchestrator, &request, &observer, &cancel, policy).await?;
    print!("{}", render_ranked(&ranked));
    Ok(())
}

/// An empty result is a successful submission, so it renders as a notice.
fn render_ranked(ranked: &[RankedCandidate]) -> String {
    if ranked.is_empty() {
        return "No candidates matched the job description\n".to_string();
    }

    let mut out = format!("{:<5} {:<32} {:>7}\n", "RANK", "CANDIDATE", "MATCH");
    for (position, candidate) in ranked.iter().enumerate() {
        let rank = candidate.rank.unwrap_or(position as u32 + 1);
        out.push_str(&format!(
            "{:<5} {:<32} {:>6.1}%\n",
            rank,
            candidate.name,
            candidate.display_score() * 100.0
        ));
        if let Some(summary) = &candidate.ai_summary {
            out.push_str(&format!("      {summary}\n"));
        }
    }
    out
}
