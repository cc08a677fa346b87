//! news-clipper — CLI entrypoint.
//! One `run` fetches every configured feed, builds the digest and hands it to
//! the email sink (or stdout with `--dry-run`).

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use news_clipper::config::{FileSettingsProvider, DEFAULT_CONFIG_PATH, ENV_CONFIG_PATH};
use news_clipper::notify::EmailSink;
use news_clipper::runner::{DeliveryStatus, RunOutcome, Runner};
use news_clipper::{telemetry, OutputFormat};

const EXIT_CONFIG: u8 = 1;
const EXIT_INTERRUPTED: u8 = 130;

#[derive(Debug, Parser)]
#[command(name = "news-clipper", version, about = "Keyword news clipping digest")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch all sources once and deliver the digest.
    Run(RunArgs),
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Settings file.
    #[arg(long, env = ENV_CONFIG_PATH, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// html, text or json; overrides `[digest] format`.
    #[arg(long)]
    format: Option<OutputFormat>,

    /// Skip delivery and print the artifact to stdout.
    #[arg(long)]
    dry_run: bool,

    /// Also write the artifact to this file.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    telemetry::init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => run(args).await,
    }
}

async fn run(args: RunArgs) -> ExitCode {
    let provider = Arc::new(FileSettingsProvider::new(args.config.clone()));
    let mut runner = Runner::new(provider).with_format(args.format);

    if !args.dry_run {
        match EmailSink::from_env() {
            Ok(sink) => runner = runner.with_sink(Arc::new(sink)),
            Err(e) => {
                tracing::error!(error = %format!("{e:#}"), "email delivery not configured");
                eprintln!("error: email delivery not configured: {e:#}");
                eprintln!("hint: --dry-run skips delivery");
                return ExitCode::from(EXIT_CONFIG);
            }
        }
    }

    // Dropping the run future abandons every in-flight fetch.
    let result = tokio::select! {
        res = runner.run() => res,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("interrupted; no digest emitted");
            return ExitCode::from(EXIT_INTERRUPTED);
        }
    };

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(error = %e, "run aborted");
            eprintln!("error: {e}");
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    if args.dry_run {
        println!("{}", outcome.rendered.body);
    }
    if let Some(path) = &args.output {
        if let Err(e) = write_artifact(path, &outcome) {
            tracing::error!(error = %format!("{e:#}"), "writing artifact failed");
        }
    }

    eprintln!("{}", summary(&outcome));
    ExitCode::SUCCESS
}

fn write_artifact(path: &Path, outcome: &RunOutcome) -> anyhow::Result<()> {
    std::fs::write(path, &outcome.rendered.body)
        .with_context(|| format!("writing {}", path.display()))?;
    tracing::info!(path = %path.display(), "artifact written");
    Ok(())
}

fn summary(outcome: &RunOutcome) -> String {
    let report = &outcome.digest.report;
    let delivery = match &outcome.delivery {
        DeliveryStatus::Delivered { .. } => "delivered".to_string(),
        DeliveryStatus::Skipped => "skipped".to_string(),
        DeliveryStatus::Failed { error, .. } => format!("failed ({error})"),
    };
    format!(
        "digest: {} items, sources ok {}/{}, delivery {}",
        outcome.digest.total_items(),
        report.succeeded(),
        report.succeeded() + report.failed(),
        delivery
    )
}
