//! `atta`: automated helpdesk ticket attribution. Config-driven via AttaConfig.

mod pipeline;

use anyhow::Context;
use atta_connectors::{
    example_requests, save_excel, GeminiClassifier, HelpdeskClient, ServiceCatalogClient,
    SmtpSender,
};
use atta_core::{AttaConfig, ReportLog, TracingObserver};
use clap::Parser;
use pipeline::{run_pipeline, PipelineDeps, PipelineOutcome, PipelineSettings};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Sub-directory of the output dir for example workbooks, so they are never picked up as
/// pending reports.
const EXAMPLE_SUBDIR: &str = "examples";

#[derive(Parser, Debug)]
#[command(name = "atta", version, about = "Classify helpdesk requests against the Service Catalog and email the report")]
struct Cli {
    /// Send an existing Excel report instead of classifying (skipped if already sent)
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,

    /// Write a two-row example workbook and exit
    #[arg(long, conflicts_with = "report")]
    example_report: bool,
}

fn build_deps(config: &AttaConfig) -> anyhow::Result<PipelineDeps> {
    let report_log = ReportLog::open_path(&config.storage.report_log_path).with_context(|| {
        format!(
            "Failed to open report log at {}",
            config.storage.report_log_path.display()
        )
    })?;

    Ok(PipelineDeps {
        requests: Box::new(HelpdeskClient::new(&config.helpdesk)?),
        catalog: Box::new(ServiceCatalogClient::new(&config.catalog)?),
        classifier: Box::new(GeminiClassifier::new(&config.llm)?),
        sender: Box::new(SmtpSender::new(&config.email)?),
        report_log: Box::new(report_log),
        observer: Box::new(TracingObserver::new()),
        settings: PipelineSettings {
            output_dir: config.storage.output_dir.clone(),
            batch_size: config.llm.batch_size,
            examples_to_log: config.llm.examples_to_log,
            candidate_name: config.email.candidate_name.clone(),
            codebase_url: config.email.codebase_url.clone(),
        },
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[atta] .env not loaded: {} (using system environment)", e);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = AttaConfig::load().context("Config load failed")?;

    if cli.example_report {
        let dir = config.storage.output_dir.join(EXAMPLE_SUBDIR);
        let path = save_excel(&example_requests(), &dir, "example_")?;
        tracing::info!("Example report written to {}", path.display());
        return Ok(());
    }

    let deps = build_deps(&config)?;
    match run_pipeline(&deps, cli.report.as_deref()).await? {
        PipelineOutcome::SentPending(paths) => {
            tracing::info!("Sent {} pending report(s); classification skipped", paths.len())
        }
        PipelineOutcome::AlreadySent(path) => {
            tracing::info!("Report {} was already sent; nothing to do", path.display())
        }
        PipelineOutcome::Classified(path) => {
            tracing::info!("Pipeline finished; report {} sent", path.display())
        }
    }
    Ok(())
}
