//! End-to-end run: resend pending reports, or fetch → classify → derive SLA → report → email.

use anyhow::{bail, Context};
use atta_connectors::{report_body, report_subject, save_excel, ReportSender};
use atta_core::{
    classify, derive_sla, resolve_report_path, CatalogSource, HelpdeskRequest, PipelineObserver,
    RequestClassifier, RequestSource, SentReportLog,
};
use std::path::{Path, PathBuf};

const SAMPLE_LOG_LIMIT: usize = 5;

/// Plain settings the pipeline needs besides its collaborators.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub output_dir: PathBuf,
    pub batch_size: usize,
    pub examples_to_log: usize,
    pub candidate_name: String,
    pub codebase_url: String,
}

/// Every collaborator of a pipeline run.
pub struct PipelineDeps {
    pub requests: Box<dyn RequestSource>,
    pub catalog: Box<dyn CatalogSource>,
    pub classifier: Box<dyn RequestClassifier>,
    pub sender: Box<dyn ReportSender>,
    pub report_log: Box<dyn SentReportLog>,
    pub observer: Box<dyn PipelineObserver>,
    pub settings: PipelineSettings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// Previously generated reports were emailed; nothing was classified.
    SentPending(Vec<PathBuf>),
    /// The explicitly requested report had already been sent.
    AlreadySent(PathBuf),
    /// A fresh report was generated and emailed.
    Classified(PathBuf),
}

fn absolute(path: &Path) -> anyhow::Result<PathBuf> {
    resolve_report_path(path).with_context(|| format!("cannot resolve {}", path.display()))
}

/// `*.xlsx` files directly inside `dir`, oldest first. A missing directory yields nothing.
fn report_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("cannot read {}", dir.display()))? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|e| e.eq_ignore_ascii_case("xlsx")) {
            let modified = std::fs::metadata(&path)?.modified()?;
            files.push((modified, absolute(&path)?));
        }
    }
    files.sort();
    Ok(files.into_iter().map(|(_, path)| path).collect())
}

/// Reports without a sent record, plus the resolved explicit path if one was given.
fn collect_unsent_reports(
    output_dir: &Path,
    report_log: &dyn SentReportLog,
    explicit_report: Option<&Path>,
) -> anyhow::Result<(Vec<PathBuf>, Option<PathBuf>)> {
    let (candidates, explicit) = match explicit_report {
        Some(path) => {
            let path = absolute(path)?;
            (vec![path.clone()], Some(path))
        }
        None => (report_files(output_dir)?, None),
    };

    let mut unsent = Vec::new();
    for candidate in candidates {
        match report_log.get_record(&candidate)? {
            None => unsent.push(candidate),
            Some(record) => tracing::info!(
                "Classified report {} was already sent at {}",
                candidate.display(),
                chrono::DateTime::from_timestamp_millis(record.sent_at_ms)
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_else(|| record.sent_at_ms.to_string())
            ),
        }
    }
    Ok((unsent, explicit))
}

/// Emails all `reports` in one message and marks each as sent.
async fn send_reports(deps: &PipelineDeps, reports: &[PathBuf]) -> anyhow::Result<()> {
    for report in reports {
        if !report.is_file() {
            bail!("Report file does not exist: {}", report.display());
        }
    }

    let subject = report_subject(&deps.settings.candidate_name);
    let body = report_body(&deps.settings.codebase_url, &deps.settings.candidate_name);
    tracing::info!("Sending {} classified report(s): {:?}", reports.len(), subject);
    deps.sender
        .send_report(&subject, &body, reports)
        .await
        .context("Failed to send report email")?;

    let now = chrono::Utc::now().timestamp_millis();
    for report in reports {
        deps.report_log.mark_sent(report, now)?;
        tracing::info!("Classified report {} marked as sent", report.display());
    }
    Ok(())
}

fn log_sample_requests(requests: &[HelpdeskRequest]) {
    for req in requests.iter().take(SAMPLE_LOG_LIMIT) {
        tracing::info!(
            "Request ID={} category={:?} type={:?} sla={:?} {:?} short_description={:?}",
            req.id.as_deref().unwrap_or("<no id>"),
            req.request_category,
            req.request_type,
            req.sla_value,
            req.sla_unit,
            req.short_description
        );
    }
}

/// Runs the pipeline once.
///
/// Pending (unsent) reports take priority: they are emailed and nothing is classified.
/// Otherwise requests and catalog are loaded (failures are fatal), classified, SLA-enriched,
/// written to a new Excel report and emailed.
pub async fn run_pipeline(
    deps: &PipelineDeps,
    explicit_report: Option<&Path>,
) -> anyhow::Result<PipelineOutcome> {
    let (unsent, explicit) = collect_unsent_reports(
        &deps.settings.output_dir,
        deps.report_log.as_ref(),
        explicit_report,
    )?;

    if !unsent.is_empty() {
        tracing::info!("Found {} unsent report(s); sending before classifying", unsent.len());
        send_reports(deps, &unsent).await?;
        return Ok(PipelineOutcome::SentPending(unsent));
    }
    if let Some(path) = explicit {
        tracing::info!("Nothing to send: {} was already sent", path.display());
        return Ok(PipelineOutcome::AlreadySent(path));
    }

    let requests = deps
        .requests
        .fetch_requests()
        .await
        .context("Failed to load helpdesk requests")?;
    tracing::info!("Successfully loaded {} requests", requests.len());

    let catalog = deps
        .catalog
        .fetch_catalog()
        .await
        .context("Failed to load Service Catalog")?;
    tracing::info!("Service Catalog loaded: {} categories", catalog.categories.len());

    let classified = classify(
        deps.classifier.as_ref(),
        &catalog,
        requests,
        deps.settings.batch_size,
        deps.settings.examples_to_log,
        deps.observer.as_ref(),
    )
    .await?;
    let (enriched, _) = derive_sla(classified, &catalog, deps.observer.as_ref());

    let report = absolute(&save_excel(&enriched, &deps.settings.output_dir, "")?)?;
    log_sample_requests(&enriched);

    send_reports(deps, std::slice::from_ref(&report)).await?;
    Ok(PipelineOutcome::Classified(report))
}
