//! Report email delivery over SMTP.

use crate::error::EmailError;
use atta_core::{require, EmailSettings};
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::path::{Path, PathBuf};

const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Delivers a report email with file attachments.
#[async_trait::async_trait]
pub trait ReportSender: Send + Sync {
    async fn send_report(
        &self,
        subject: &str,
        body: &str,
        attachments: &[PathBuf],
    ) -> Result<(), EmailError>;
}

pub fn report_subject(candidate_name: &str) -> String {
    format!("Automation Engineer interview - technical task - {}", candidate_name)
}

pub fn report_body(codebase_url: &str, candidate_name: &str) -> String {
    format!(
        "Hi,\n\nPlease find attached the classified helpdesk requests report.\n\nCodebase: {}\n\nBest regards,\n{}\n",
        codebase_url, candidate_name
    )
}

fn content_type_for(path: &Path) -> ContentType {
    let parsed = match path.extension().and_then(|e| e.to_str()) {
        Some("xlsx") => ContentType::parse(XLSX_CONTENT_TYPE),
        Some("csv") => ContentType::parse("text/csv"),
        _ => ContentType::parse("application/octet-stream"),
    };
    parsed.unwrap_or(ContentType::TEXT_PLAIN)
}

/// Composes the report email. Fails if any attachment is not an existing file.
pub fn build_message(
    sender: &str,
    recipient: &str,
    subject: &str,
    body: &str,
    attachments: &[PathBuf],
) -> Result<Message, EmailError> {
    let from: Mailbox = sender
        .parse()
        .map_err(|e| EmailError::Address(format!("{}: {}", sender, e)))?;
    let to: Mailbox = recipient
        .parse()
        .map_err(|e| EmailError::Address(format!("{}: {}", recipient, e)))?;

    let mut parts = MultiPart::mixed().singlepart(SinglePart::plain(body.to_string()));
    for path in attachments {
        if !path.is_file() {
            return Err(EmailError::MissingAttachment(path.clone()));
        }
        let bytes = std::fs::read(path)?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "report.xlsx".to_string());
        tracing::info!(
            "Attaching {} ({} bytes) for {}",
            path.display(),
            bytes.len(),
            recipient
        );
        parts = parts.singlepart(Attachment::new(filename).body(bytes, content_type_for(path)));
    }

    Message::builder()
        .from(from)
        .to(to)
        .subject(subject)
        .multipart(parts)
        .map_err(|e| EmailError::Build(e.to_string()))
}

/// SMTP sender with STARTTLS (when enabled) and credential login.
pub struct SmtpSender {
    host: String,
    port: u16,
    use_tls: bool,
    username: String,
    password: String,
    sender: String,
    recipient: String,
}

impl SmtpSender {
    pub fn new(settings: &EmailSettings) -> Result<Self, EmailError> {
        Ok(Self {
            host: require("email.smtp_host", &settings.smtp_host)?.to_string(),
            port: settings.smtp_port,
            use_tls: settings.use_tls,
            username: require("email.username", &settings.username)?.to_string(),
            password: require("email.password", &settings.password)?.to_string(),
            sender: require("email.sender", &settings.sender)?.to_string(),
            recipient: require("email.recipient", &settings.recipient)?.to_string(),
        })
    }

    fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, EmailError> {
        let credentials = Credentials::new(self.username.clone(), self.password.clone());
        let builder = if self.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.host)
                .map_err(|e| EmailError::Smtp(e.to_string()))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&self.host)
        };
        Ok(builder.port(self.port).credentials(credentials).build())
    }
}

#[async_trait::async_trait]
impl ReportSender for SmtpSender {
    async fn send_report(
        &self,
        subject: &str,
        body: &str,
        attachments: &[PathBuf],
    ) -> Result<(), EmailError> {
        let message = build_message(&self.sender, &self.recipient, subject, body, attachments)?;

        tracing::info!(
            "Connecting to SMTP server {}:{} (TLS={})...",
            self.host,
            self.port,
            self.use_tls
        );
        self.transport()?.send(message).await.map_err(|e| {
            tracing::error!("Failed to send report email via SMTP: {}", e);
            EmailError::Smtp(e.to_string())
        })?;

        tracing::info!("Report email successfully sent to {}", self.recipient);
        Ok(())
    }
}
