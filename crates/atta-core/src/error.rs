//! Error types for the attribution core.

use thiserror::Error;

/// Non-recoverable failure of one classifier batch call.
///
/// Recoverable at batch granularity: the orchestrator logs it and passes the
/// batch through unmodified.
#[derive(Debug, Error)]
pub enum ClassificationError {
    #[error("classifier is not configured: {0}")]
    NotConfigured(String),
    #[error("classifier call failed: {0}")]
    Transport(String),
    #[error("classifier returned malformed output: {0}")]
    MalformedOutput(String),
    #[error("classifier returned no usable results: {0}")]
    EmptyResult(String),
}

/// Systemic misuse of the pipeline. These propagate instead of being absorbed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("batch size must be at least 1")]
    InvalidBatchSize,
}

/// Configuration loading or validation failure.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] config::ConfigError),
    #[error("required setting `{0}` is not set")]
    Missing(&'static str),
    #[error("invalid setting `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Failure of the sent-report log.
#[derive(Debug, Error)]
pub enum ReportLogError {
    #[error("report log storage error: {0}")]
    Storage(#[from] sled::Error),
    #[error("report log record is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("cannot resolve report path: {0}")]
    Path(#[from] std::io::Error),
}

/// Failure to fetch or parse helpdesk requests. Fatal for a pipeline run.
#[derive(Debug, Error)]
pub enum HelpdeskError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("helpdesk request failed after {attempts} attempt(s): {reason}")]
    Transport { attempts: u32, reason: String },
    #[error("helpdesk API returned invalid JSON: {0}")]
    InvalidJson(String),
    #[error("unexpected helpdesk response shape: {0}")]
    UnexpectedShape(String),
}

/// Failure to fetch or parse the Service Catalog. Fatal for a pipeline run.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to fetch Service Catalog: {0}")]
    Fetch(String),
    #[error("failed to parse Service Catalog YAML: {0}")]
    Parse(String),
    #[error("invalid Service Catalog: {0}")]
    Invalid(String),
}
