use atta_core::ConfigError;
use std::path::PathBuf;
use thiserror::Error;

/// Excel report generation or write failure.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to build Excel report: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
    #[error("failed to write Excel report: {0}")]
    Io(#[from] std::io::Error),
}

/// Report email could not be composed or delivered.
#[derive(Debug, Error)]
pub enum EmailError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("attachment does not exist: {}", .0.display())]
    MissingAttachment(PathBuf),
    #[error("failed to read attachment: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid email address: {0}")]
    Address(String),
    #[error("failed to build report email: {0}")]
    Build(String),
    #[error("failed to send report email via SMTP: {0}")]
    Smtp(String),
}
