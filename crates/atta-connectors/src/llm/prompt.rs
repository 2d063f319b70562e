//! Batch classification prompt for the Gemini classifier.

use atta_core::{HelpdeskRequest, ServiceCatalog};

const PROMPT_HEADER: &str = r#"You classify internal IT helpdesk tickets against a Service Catalog.

For EVERY request below pick the best matching request_category and request_type.
- Copy request_category and request_type verbatim from the Service Catalog lines.
- Prefer the most specific request type; use a generic "Other ..." type only when nothing specific fits.
- When a request names a product that appears in a catalog request type (for example Jira or Salesforce), use that request type even for outages or generic errors.
- If nothing fits, use "Other/Uncategorized" and "General Inquiry/Undefined".
- Keep a request's current category or type when it is already set.
- Do not return SLA fields; SLA is looked up from the catalog afterwards.

Respond with STRICT JSON only, matching:
{
  "items": [
    {"id": "<request id as string>", "request_category": "<category or null>", "request_type": "<request type or null>"}
  ]
}
"#;

/// One line per catalog entry: `- Category: X | Request Type: Y | SLA: V unit`.
pub fn catalog_fragment(catalog: &ServiceCatalog) -> String {
    catalog
        .entries()
        .map(|(category, request_type)| {
            format!(
                "- Category: {} | Request Type: {} | SLA: {} {}",
                category.name, request_type.name, request_type.sla.value, request_type.sla.unit
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Request blocks separated by `---`.
pub fn requests_block(requests: &[HelpdeskRequest]) -> String {
    requests
        .iter()
        .map(|req| {
            format!(
                "ID: {}\nShort description: {}\nLong description: {}\nCurrent request_category: {}\nCurrent request_type: {}\n",
                req.id.as_deref().unwrap_or(""),
                req.short_description.as_deref().unwrap_or(""),
                req.long_description.as_deref().unwrap_or(""),
                req.request_category.as_deref().unwrap_or(""),
                req.request_type.as_deref().unwrap_or(""),
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

pub fn render(catalog: &ServiceCatalog, requests: &[HelpdeskRequest]) -> String {
    format!(
        "{}\nService Catalog:\n{}\n\nHelpdesk requests:\n{}\n",
        PROMPT_HEADER,
        catalog_fragment(catalog),
        requests_block(requests)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use atta_core::{ServiceCategory, ServiceRequestType, Sla};

    fn catalog() -> ServiceCatalog {
        ServiceCatalog::new(vec![ServiceCategory {
            name: "Access Management".into(),
            requests: vec![
                ServiceRequestType {
                    name: "Reset forgotten password".into(),
                    sla: Sla { unit: "hours".into(), value: 4 },
                },
                ServiceRequestType {
                    name: "Grant VPN access".into(),
                    sla: Sla { unit: "days".into(), value: 1 },
                },
            ],
        }])
    }

    #[test]
    fn test_catalog_fragment_lines() {
        assert_eq!(
            catalog_fragment(&catalog()),
            "- Category: Access Management | Request Type: Reset forgotten password | SLA: 4 hours\n\
             - Category: Access Management | Request Type: Grant VPN access | SLA: 1 days"
        );
    }

    #[test]
    fn test_requests_block_separates_requests() {
        let requests = vec![
            HelpdeskRequest::new("req_1", "Forgot password"),
            HelpdeskRequest::new("req_2", "VPN").with_category("Access Management"),
        ];
        let block = requests_block(&requests);
        let parts: Vec<&str> = block.split("\n\n---\n\n").collect();
        assert_eq!(parts.len(), 2);
        assert!(parts[0].starts_with("ID: req_1\nShort description: Forgot password\n"));
        assert!(parts[1].contains("Current request_category: Access Management\n"));
        assert!(parts[1].contains("Current request_type: \n"));
    }

    #[test]
    fn test_render_contains_both_sections() {
        let prompt = render(&catalog(), &[HelpdeskRequest::new("r", "x")]);
        assert!(prompt.contains("Service Catalog:\n- Category: Access Management"));
        assert!(prompt.contains("Helpdesk requests:\nID: r\n"));
        assert!(prompt.contains("\"items\""));
    }
}
