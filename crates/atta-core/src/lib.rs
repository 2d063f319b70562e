//! atta-core: helpdesk ticket attribution core (domain types, catalog matching, SLA
//! derivation, batch classification orchestrator, sent-report log, configuration).
//!
//! I/O collaborators live in `atta-connectors`; the `atta` binary wires everything up.

mod catalog;
mod config;
mod error;
mod observer;
mod orchestrator;
mod report_log;
mod shared;
mod sources;

// Domain types
pub use shared::{
    normalize_optional_int, normalize_optional_str, CatalogMatch, ClassificationResult,
    HelpdeskRequest, ServiceCatalog, ServiceCategory, ServiceRequestType, Sla,
};

// Catalog matcher and SLA deriver
pub use catalog::{derive_sla, normalize_key, CatalogMatcher, SlaSummary};

// Orchestrator
pub use orchestrator::{
    classify, partition, Batch, BatchInfo, BatchResults, Batches, RequestClassifier,
};

pub use observer::{
    BatchCounts, ClassificationExample, NoopObserver, PipelineObserver, TracingObserver,
};

pub use config::{
    require, AttaConfig, CatalogSettings, EmailSettings, HelpdeskSettings, LlmSettings,
    StorageSettings, DEFAULT_CONFIG_PATH,
};
pub use error::{
    CatalogError, ClassificationError, ConfigError, HelpdeskError, PipelineError, ReportLogError,
};
pub use report_log::{resolve_report_path, ReportLog, SentRecord, SentReportLog};
pub use sources::{CatalogSource, RequestSource};
