//! Fills missing SLA fields from exact catalog lookups.

use crate::observer::PipelineObserver;
use crate::shared::{HelpdeskRequest, ServiceCatalog};
use std::collections::HashMap;

/// Aggregate counters for one SLA derivation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlaSummary {
    pub filled_requests: usize,
    pub filled_unit: usize,
    pub filled_value: usize,
    /// Requests with both category and type set whose pair is not in the catalog.
    pub unknown_pairs: usize,
    pub skipped_already_has_sla: usize,
}

/// Fills `sla_unit` / `sla_value` from the catalog for every request that has both
/// category and type set and whose pair matches a catalog entry exactly.
///
/// Only missing parts are written: a unit is missing when absent or blank, a value
/// when absent or zero. Present values are never overwritten, so running this twice
/// changes nothing the second time.
pub fn derive_sla(
    mut requests: Vec<HelpdeskRequest>,
    catalog: &ServiceCatalog,
    observer: &dyn PipelineObserver,
) -> (Vec<HelpdeskRequest>, SlaSummary) {
    let index: HashMap<(&str, &str), (&str, u32)> = catalog
        .entries()
        .map(|(c, r)| ((c.name.as_str(), r.name.as_str()), (r.sla.unit.as_str(), r.sla.value)))
        .collect();

    let mut summary = SlaSummary::default();

    for req in requests.iter_mut() {
        let (Some(category), Some(request_type)) = (req.category(), req.request_type()) else {
            continue;
        };
        let Some(&(unit, value)) = index.get(&(category, request_type)) else {
            summary.unknown_pairs += 1;
            continue;
        };

        let missing_unit = req.sla_unit.as_deref().map_or(true, |u| u.trim().is_empty());
        let missing_value = req.sla_value.map_or(true, |v| v == 0);

        if !missing_unit && !missing_value {
            summary.skipped_already_has_sla += 1;
            continue;
        }

        if missing_unit {
            req.sla_unit = Some(unit.to_string());
            summary.filled_unit += 1;
        }
        if missing_value {
            req.sla_value = Some(value);
            summary.filled_value += 1;
        }
        summary.filled_requests += 1;
        observer.on_sla_filled(req);
    }

    observer.on_sla_summary(&summary);
    (requests, summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::NoopObserver;
    use crate::shared::{ServiceCategory, ServiceRequestType, Sla};

    fn catalog() -> ServiceCatalog {
        ServiceCatalog::new(vec![
            ServiceCategory {
                name: "Access Management".into(),
                requests: vec![ServiceRequestType {
                    name: "Reset forgotten password".into(),
                    sla: Sla { unit: "hours".into(), value: 4 },
                }],
            },
            ServiceCategory {
                name: "Other/Uncategorized".into(),
                requests: vec![ServiceRequestType {
                    name: "General Inquiry/Undefined".into(),
                    sla: Sla { unit: "hours".into(), value: 0 },
                }],
            },
        ])
    }

    fn password_request() -> HelpdeskRequest {
        HelpdeskRequest::new("req_1", "Forgot my password")
            .with_category("Access Management")
            .with_type("Reset forgotten password")
    }

    #[test]
    fn test_fills_both_fields_when_missing() {
        let (out, summary) = derive_sla(vec![password_request()], &catalog(), &NoopObserver);
        assert_eq!(out[0].sla_unit.as_deref(), Some("hours"));
        assert_eq!(out[0].sla_value, Some(4));
        assert_eq!(summary.filled_requests, 1);
        assert_eq!(summary.filled_unit, 1);
        assert_eq!(summary.filled_value, 1);
    }

    #[test]
    fn test_zero_value_counts_as_missing() {
        let mut req = password_request();
        req.sla_unit = Some("hours".into());
        req.sla_value = Some(0);
        let (out, summary) = derive_sla(vec![req], &catalog(), &NoopObserver);
        assert_eq!(out[0].sla_value, Some(4));
        assert_eq!(summary.filled_value, 1);
        assert_eq!(summary.filled_unit, 0);
    }

    #[test]
    fn test_blank_unit_counts_as_missing_and_value_is_kept() {
        let mut req = password_request();
        req.sla_unit = Some("   ".into());
        req.sla_value = Some(8);
        let (out, summary) = derive_sla(vec![req], &catalog(), &NoopObserver);
        assert_eq!(out[0].sla_unit.as_deref(), Some("hours"));
        assert_eq!(out[0].sla_value, Some(8));
        assert_eq!(summary.filled_unit, 1);
        assert_eq!(summary.filled_value, 0);
    }

    #[test]
    fn test_does_not_overwrite_existing_sla() {
        let req = password_request().with_sla("days", 8);
        let (out, summary) = derive_sla(vec![req], &catalog(), &NoopObserver);
        assert_eq!(out[0].sla_unit.as_deref(), Some("days"));
        assert_eq!(out[0].sla_value, Some(8));
        assert_eq!(summary.skipped_already_has_sla, 1);
        assert_eq!(summary.filled_requests, 0);
    }

    #[test]
    fn test_catalog_zero_value_is_copied_when_request_has_none() {
        let req = HelpdeskRequest::new("req_1", "Question")
            .with_category("Other/Uncategorized")
            .with_type("General Inquiry/Undefined");
        let (out, _) = derive_sla(vec![req], &catalog(), &NoopObserver);
        assert_eq!(out[0].sla_unit.as_deref(), Some("hours"));
        assert_eq!(out[0].sla_value, Some(0));
    }

    #[test]
    fn test_lookup_is_exact_not_normalized() {
        let req = HelpdeskRequest::new("req_1", "x")
            .with_category("access management")
            .with_type("Reset forgotten password");
        let (out, summary) = derive_sla(vec![req], &catalog(), &NoopObserver);
        assert_eq!(out[0].sla_unit, None);
        assert_eq!(out[0].sla_value, None);
        assert_eq!(summary.unknown_pairs, 1);
    }

    #[test]
    fn test_skips_requests_missing_category_or_type() {
        let only_category = HelpdeskRequest::new("a", "x").with_category("Access Management");
        let only_type = HelpdeskRequest::new("b", "y").with_type("Reset forgotten password");
        let (out, summary) = derive_sla(vec![only_category, only_type], &catalog(), &NoopObserver);
        assert!(out.iter().all(|r| r.sla_unit.is_none() && r.sla_value.is_none()));
        assert_eq!(summary, SlaSummary::default());
    }

    #[test]
    fn test_second_pass_is_a_no_op() {
        let requests = vec![
            password_request(),
            HelpdeskRequest::new("req_2", "unknown").with_category("X").with_type("Y"),
            HelpdeskRequest::new("req_3", "partial").with_category("Access Management"),
        ];
        let (first, _) = derive_sla(requests, &catalog(), &NoopObserver);
        let snapshot = first.clone();
        let (second, summary) = derive_sla(first, &catalog(), &NoopObserver);
        assert_eq!(second, snapshot);
        assert_eq!(summary.filled_requests, 0);
        assert_eq!(summary.skipped_already_has_sla, 1);
    }
}
