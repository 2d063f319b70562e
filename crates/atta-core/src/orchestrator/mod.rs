//! Classification orchestrator: batches requests, calls the classifier and writes back
//! canonical catalog values.

mod batch;

pub use batch::{partition, Batch, BatchInfo, Batches};

use crate::catalog::CatalogMatcher;
use crate::error::{ClassificationError, PipelineError};
use crate::observer::{BatchCounts, ClassificationExample, PipelineObserver};
use crate::shared::{ClassificationResult, HelpdeskRequest, ServiceCatalog};
use std::collections::HashMap;

/// Classifier results for one batch, keyed by request id.
pub type BatchResults = HashMap<String, ClassificationResult>;

/// Trait implemented by every classification backend (LLM-backed, cached, mock).
#[async_trait::async_trait]
pub trait RequestClassifier: Send + Sync {
    /// Classifies a batch. Results must be keyed by the (non-empty) ids of the input
    /// requests; unknown keys are ignored by the orchestrator.
    async fn classify_batch(
        &self,
        requests: &[HelpdeskRequest],
        catalog: &ServiceCatalog,
    ) -> Result<BatchResults, ClassificationError>;

    /// Classifies a single request through [`classify_batch`](Self::classify_batch).
    ///
    /// A request with an id must get its own entry back. A request without an id
    /// falls back to whichever single result the classifier returned.
    async fn classify_one(
        &self,
        request: &HelpdeskRequest,
        catalog: &ServiceCatalog,
    ) -> Result<ClassificationResult, ClassificationError> {
        let mut results = self
            .classify_batch(std::slice::from_ref(request), catalog)
            .await?;
        if results.is_empty() {
            return Err(ClassificationError::EmptyResult(
                "no valid items for single helpdesk request".into(),
            ));
        }
        match request.id.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(id) => results.remove(id).ok_or_else(|| {
                ClassificationError::EmptyResult(format!(
                    "response missing entry for id={:?} in single-request call",
                    id
                ))
            }),
            None => results.into_values().next().ok_or_else(|| {
                ClassificationError::EmptyResult("no valid items for single helpdesk request".into())
            }),
        }
    }
}

/// Classifies `requests` batch by batch and returns them in input order.
///
/// For each request with a classifier result, the existing category/type win over the
/// suggestion; the resulting pair is resolved against the catalog and only canonical
/// strings are written, and only into fields that were unset. A failing batch is
/// reported to the observer and passed through unmodified. Only a batch size of zero
/// is an error.
pub async fn classify(
    classifier: &dyn RequestClassifier,
    catalog: &ServiceCatalog,
    mut requests: Vec<HelpdeskRequest>,
    batch_size: usize,
    examples_to_log: usize,
    observer: &dyn PipelineObserver,
) -> Result<Vec<HelpdeskRequest>, PipelineError> {
    let matcher = CatalogMatcher::new(catalog);
    let collisions = matcher.collisions();
    if !collisions.is_empty() {
        observer.on_catalog_collisions(&collisions);
    }

    let mut examples_logged = 0usize;

    for batch in partition(&mut requests, batch_size, observer)? {
        let results = match classifier.classify_batch(&*batch.items, catalog).await {
            Ok(results) => results,
            Err(e) => {
                observer.on_batch_failed(&batch.info, &e);
                continue;
            }
        };

        let mut counts = BatchCounts::default();
        for req in batch.items.iter_mut() {
            let Some(result) = req.lookup_id().and_then(|id| results.get(id)) else {
                counts.missing_results += 1;
                continue;
            };

            let candidate_category = req.category().or(result.request_category.as_deref());
            let candidate_type = req.request_type().or(result.request_type.as_deref());
            let resolved = matcher.resolve(candidate_category, candidate_type);

            match &resolved {
                None => counts.rejected_pairs += 1,
                Some(canonical) => {
                    if req.category().is_none() {
                        req.request_category = Some(canonical.request_category.clone());
                        counts.categories_set += 1;
                    }
                    if req.request_type().is_none() {
                        req.request_type = Some(canonical.request_type.clone());
                        counts.types_set += 1;
                    }
                }
            }

            if examples_logged < examples_to_log {
                observer.on_example(&ClassificationExample {
                    request_id: req.id.clone(),
                    raw_category: result.request_category.clone(),
                    raw_type: result.request_type.clone(),
                    resolved,
                });
                examples_logged += 1;
            }
        }

        observer.on_batch_classified(&batch.info, &counts);
    }

    Ok(requests)
}
