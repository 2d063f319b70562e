//! Progress and audit notifications emitted by the pipeline stages.
//!
//! Partitioning, classification and SLA derivation report to a [`PipelineObserver`]
//! instead of logging.
//! [`TracingObserver`] is what the CLI installs, [`NoopObserver`] is for tests and
//! embedding.

use crate::catalog::SlaSummary;
use crate::error::ClassificationError;
use crate::orchestrator::BatchInfo;
use crate::shared::{CatalogMatch, HelpdeskRequest};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Per-batch counters produced by the orchestrator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchCounts {
    pub categories_set: usize,
    pub types_set: usize,
    pub missing_results: usize,
    pub rejected_pairs: usize,
}

/// Raw classifier output next to the resolved canonical pair, for audit logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationExample {
    pub request_id: Option<String>,
    pub raw_category: Option<String>,
    pub raw_type: Option<String>,
    pub resolved: Option<CatalogMatch>,
}

/// Receives pipeline progress. All methods default to no-ops.
pub trait PipelineObserver: Send + Sync {
    /// Called by the partitioner before a batch is handed to the caller.
    fn on_batch_start(&self, _batch: &BatchInfo) {}

    fn on_batch_failed(&self, _batch: &BatchInfo, _error: &ClassificationError) {}

    fn on_batch_classified(&self, _batch: &BatchInfo, _counts: &BatchCounts) {}

    fn on_example(&self, _example: &ClassificationExample) {}

    /// Catalog entries that collide after normalization and will never resolve.
    fn on_catalog_collisions(&self, _collisions: &[Vec<CatalogMatch>]) {}

    fn on_sla_filled(&self, _request: &HelpdeskRequest) {}

    fn on_sla_summary(&self, _summary: &SlaSummary) {}
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}

const SLA_SAMPLE_LIMIT: usize = 5;

/// Logs pipeline progress through `tracing`.
#[derive(Debug, Default)]
pub struct TracingObserver {
    sla_samples_logged: AtomicUsize,
}

impl TracingObserver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PipelineObserver for TracingObserver {
    fn on_batch_start(&self, batch: &BatchInfo) {
        tracing::info!(
            "Sending batch {}/{} to classifier ({} requests, index {}..{})...",
            batch.index + 1,
            batch.total,
            batch.len(),
            batch.start,
            batch.end
        );
    }

    fn on_batch_failed(&self, batch: &BatchInfo, error: &ClassificationError) {
        tracing::error!(
            "Batch classification failed for requests {}..{}: {}",
            batch.start,
            batch.end,
            error
        );
    }

    fn on_batch_classified(&self, batch: &BatchInfo, counts: &BatchCounts) {
        tracing::info!(
            categories_set = counts.categories_set,
            types_set = counts.types_set,
            missing_results = counts.missing_results,
            rejected_pairs = counts.rejected_pairs,
            "Applied classification (batch {}..{})",
            batch.start,
            batch.end
        );
    }

    fn on_example(&self, example: &ClassificationExample) {
        tracing::info!(
            "Classifier result for {}: raw_category={:?} raw_type={:?} resolved={:?}",
            example.request_id.as_deref().unwrap_or("<no id>"),
            example.raw_category,
            example.raw_type,
            example
                .resolved
                .as_ref()
                .map(|m| (m.request_category.as_str(), m.request_type.as_str()))
        );
    }

    fn on_catalog_collisions(&self, collisions: &[Vec<CatalogMatch>]) {
        for group in collisions {
            let names: Vec<String> = group
                .iter()
                .map(|m| format!("{:?}/{:?}", m.request_category, m.request_type))
                .collect();
            tracing::warn!(
                "Service Catalog entries collide after normalization and will never match: {}",
                names.join(", ")
            );
        }
    }

    fn on_sla_filled(&self, request: &HelpdeskRequest) {
        let logged = self.sla_samples_logged.fetch_add(1, Ordering::Relaxed);
        if logged < SLA_SAMPLE_LIMIT {
            tracing::info!(
                "SLA derived from Service Catalog for request {}: category={:?} type={:?} -> {:?} {:?}",
                request.id.as_deref().unwrap_or("<no id>"),
                request.request_category,
                request.request_type,
                request.sla_value,
                request.sla_unit
            );
        } else {
            tracing::debug!(
                "Derived SLA for request {}: unit={:?} value={:?}",
                request.id.as_deref().unwrap_or("<no id>"),
                request.sla_unit,
                request.sla_value
            );
        }
    }

    fn on_sla_summary(&self, summary: &SlaSummary) {
        tracing::info!(
            filled_requests = summary.filled_requests,
            filled_unit = summary.filled_unit,
            filled_value = summary.filled_value,
            unknown_pairs = summary.unknown_pairs,
            skipped_already_has_sla = summary.skipped_already_has_sla,
            "SLA derivation summary"
        );
        if summary.unknown_pairs > 0 {
            tracing::warn!(
                "SLA could not be derived for {} request(s) due to unknown (category, type) pairs",
                summary.unknown_pairs
            );
        }
    }
}
