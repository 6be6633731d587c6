use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cvats_client::HttpApi;
use cvats_core::{ClientConfig, Result, TracingProgress};
use cvats_pipeline::{CvFile, JobPoller, ScreeningFlow};

mod report;

/// Upload a CV, extract and parse it, and score it against a job description.
#[derive(Debug, Parser)]
#[command(name = "cvats", version)]
struct Cli {
    /// CV to screen (.pdf, .docx or .doc)
    cv: PathBuf,

    /// Job description text
    #[arg(long, conflicts_with = "job_file", required_unless_present = "job_file")]
    job: Option<String>,

    /// Read the job description from a file
    #[arg(long)]
    job_file: Option<PathBuf>,

    /// Stop after parsing, without requesting an ATS score
    #[arg(long)]
    no_score: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, cancelling in-flight requests");
            on_interrupt.cancel();
        }
    });

    match run(cli, &cancel).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Screening failed");
            eprintln!("error: {e}");
            if e.is_retryable() {
                eprintln!(
                    "The backend is still processing this CV. Run the command again in a moment."
                );
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, cancel: &CancellationToken) -> Result<()> {
    let config = ClientConfig::from_env()?;
    info!(
        "cvats v{} using API at {}",
        env!("CARGO_PKG_VERSION"),
        config.api_base
    );

    let api = Arc::new(HttpApi::new(config)?);
    let flow = ScreeningFlow::new(api.clone(), JobPoller::new(api.clone()), api);

    let job_description = match (cli.job, cli.job_file) {
        (Some(text), _) => text,
        (None, Some(path)) => tokio::fs::read_to_string(path).await?,
        // clap requires one of the two; an empty description fails validation anyway
        (None, None) => String::new(),
    };
    let cv = CvFile::from_path(&cli.cv).await?;

    let mut session = flow
        .submit(cv, &job_description, &TracingProgress, cancel)
        .await?;

    println!("{}", report::upload_summary(&session));
    match &session.parsed {
        Some(parsed) => println!("{}", report::parsed_profile(parsed)),
        None => println!("{}", report::NO_PREVIEW),
    }

    if cli.no_score || !session.ready_for_scoring() {
        return Ok(());
    }

    let score = flow.score(&mut session, cancel).await?;
    println!("{}", report::score_report(score));
    Ok(())
}
