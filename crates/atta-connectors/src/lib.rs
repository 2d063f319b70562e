//! I/O collaborators for the attribution pipeline: Helpdesk API, Service Catalog,
//! Gemini classifier, Excel report and SMTP delivery.

mod catalog;
mod email;
mod error;
mod excel;
mod helpdesk;
mod llm;

pub use catalog::{parse_catalog, ServiceCatalogClient};
pub use email::{build_message, report_body, report_subject, ReportSender, SmtpSender};
pub use error::{EmailError, ReportError};
pub use excel::{build_excel, example_requests, save_excel, HEADERS, SHEET_NAME};
pub use helpdesk::HelpdeskClient;
pub use llm::{catalog_fragment, parse_items, render_prompt, requests_block, GeminiClassifier};
