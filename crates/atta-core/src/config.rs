//! Layered configuration: defaults, optional TOML file, then `ATTA__*` environment.

use crate::error::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default config file location (overridden by `ATTA_CONFIG`).
pub const DEFAULT_CONFIG_PATH: &str = "config/atta.toml";

/// Helpdesk API connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct HelpdeskSettings {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub api_secret: String,
    pub timeout_secs: u64,
    /// Total number of attempts, including the first one.
    pub max_retries: u32,
    pub backoff_factor_secs: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogSettings {
    #[serde(default)]
    pub url: String,
    pub timeout_secs: u64,
}

/// Gemini classifier settings.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmSettings {
    #[serde(default)]
    pub api_key: String,
    pub model: String,
    pub api_base: String,
    pub batch_size: usize,
    pub delay_between_batches_ms: u64,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub timeout_secs: u64,
    /// How many raw-vs-resolved classification examples to log per run.
    pub examples_to_log: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailSettings {
    #[serde(default)]
    pub smtp_host: String,
    pub smtp_port: u16,
    pub use_tls: bool,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub recipient: String,
    #[serde(default)]
    pub candidate_name: String,
    #[serde(default)]
    pub codebase_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Directory where Excel reports are written.
    pub output_dir: PathBuf,
    /// Sled directory of the sent-report log.
    pub report_log_path: PathBuf,
}

/// Complete runtime configuration of the attribution pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct AttaConfig {
    pub helpdesk: HelpdeskSettings,
    pub catalog: CatalogSettings,
    pub llm: LlmSettings,
    pub email: EmailSettings,
    pub storage: StorageSettings,
}

impl AttaConfig {
    /// Load config from file and environment. Precedence: env `ATTA__*` > file at
    /// `ATTA_CONFIG` (default `config/atta.toml`) > defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("ATTA_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(Path::new(&config_path))
    }

    /// Same as [`load`](Self::load) with an explicit file path. A missing file is skipped.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let builder = config::Config::builder()
            .set_default("helpdesk.timeout_secs", 10_i64)?
            .set_default("helpdesk.max_retries", 3_i64)?
            .set_default("helpdesk.backoff_factor_secs", 0.5_f64)?
            .set_default("catalog.timeout_secs", 10_i64)?
            .set_default("llm.model", "gemini-2.0-flash")?
            .set_default("llm.api_base", "https://generativelanguage.googleapis.com/v1beta")?
            .set_default("llm.batch_size", 30_i64)?
            .set_default("llm.delay_between_batches_ms", 0_i64)?
            .set_default("llm.temperature", 0.0_f64)?
            .set_default("llm.top_p", 1.0_f64)?
            .set_default("llm.top_k", 1_i64)?
            .set_default("llm.timeout_secs", 60_i64)?
            .set_default("llm.examples_to_log", 3_i64)?
            .set_default("email.smtp_port", 587_i64)?
            .set_default("email.use_tls", true)?
            .set_default("storage.output_dir", "output")?
            .set_default("storage.report_log_path", "data/atta_report_log")?;

        let builder = if path.exists() {
            builder.add_source(config::File::from(path))
        } else {
            builder
        };

        let built = builder
            .add_source(config::Environment::with_prefix("ATTA").separator("__"))
            .build()?;

        let cfg: Self = built.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.llm.batch_size == 0 {
            return Err(ConfigError::Invalid {
                key: "llm.batch_size",
                reason: "must be at least 1".into(),
            });
        }
        if self.helpdesk.max_retries == 0 {
            return Err(ConfigError::Invalid {
                key: "helpdesk.max_retries",
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}

/// Returns the trimmed value of a required setting or `ConfigError::Missing(key)`.
pub fn require<'a>(key: &'static str, value: &'a str) -> Result<&'a str, ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ConfigError::Missing(key))
    } else {
        Ok(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_apply_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = AttaConfig::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.helpdesk.timeout_secs, 10);
        assert_eq!(cfg.helpdesk.max_retries, 3);
        assert!((cfg.helpdesk.backoff_factor_secs - 0.5).abs() < f64::EPSILON);
        assert_eq!(cfg.llm.model, "gemini-2.0-flash");
        assert_eq!(cfg.llm.batch_size, 30);
        assert_eq!(cfg.llm.examples_to_log, 3);
        assert_eq!(cfg.email.smtp_port, 587);
        assert!(cfg.email.use_tls);
        assert_eq!(cfg.storage.output_dir, PathBuf::from("output"));
    }

    #[test]
    fn test_file_overrides_defaults() {
        let file = write_config(
            r#"
[helpdesk]
url = "https://helpdesk.example.com/api/requests"
max_retries = 5

[llm]
batch_size = 7
top_k = 4

[storage]
output_dir = "reports"
"#,
        );
        let cfg = AttaConfig::load_from(file.path()).unwrap();
        assert_eq!(cfg.helpdesk.url, "https://helpdesk.example.com/api/requests");
        assert_eq!(cfg.helpdesk.max_retries, 5);
        assert_eq!(cfg.helpdesk.timeout_secs, 10);
        assert_eq!(cfg.llm.batch_size, 7);
        assert_eq!(cfg.llm.top_k, 4);
        assert_eq!(cfg.storage.output_dir, PathBuf::from("reports"));
    }

    #[test]
    fn test_zero_batch_size_is_rejected() {
        let file = write_config("[llm]\nbatch_size = 0\n");
        let err = AttaConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "llm.batch_size", .. }));
    }

    #[test]
    fn test_require_trims_and_rejects_blank() {
        assert_eq!(require("llm.api_key", "  abc ").unwrap(), "abc");
        assert!(matches!(require("llm.api_key", "   "), Err(ConfigError::Missing("llm.api_key"))));
    }
}
