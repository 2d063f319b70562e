//! Shared domain types used across all ATTA crates.

use serde::{Deserialize, Serialize};

/// One helpdesk ticket as it flows through the pipeline.
///
/// Created by the request source, enriched by the classification orchestrator
/// (category/type) and by the SLA deriver (sla_unit/sla_value). Requests are never
/// dropped: a request that cannot be classified leaves the pipeline unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelpdeskRequest {
    /// External ticket identifier. `None` or empty never matches a classifier result.
    pub id: Option<String>,
    pub short_description: Option<String>,
    #[serde(default)]
    pub long_description: Option<String>,
    #[serde(default)]
    pub request_category: Option<String>,
    #[serde(default)]
    pub request_type: Option<String>,
    /// SLA unit such as "hours" or "days".
    #[serde(default)]
    pub sla_unit: Option<String>,
    /// SLA value. `None` and `Some(0)` both mean "missing".
    #[serde(default)]
    pub sla_value: Option<u32>,
}

impl HelpdeskRequest {
    pub fn new(id: impl Into<String>, short_description: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            short_description: Some(short_description.into()),
            ..Self::default()
        }
    }

    pub fn with_long_description(mut self, text: impl Into<String>) -> Self {
        self.long_description = Some(text.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.request_category = Some(category.into());
        self
    }

    pub fn with_type(mut self, request_type: impl Into<String>) -> Self {
        self.request_type = Some(request_type.into());
        self
    }

    pub fn with_sla(mut self, unit: impl Into<String>, value: u32) -> Self {
        self.sla_unit = Some(unit.into());
        self.sla_value = Some(value);
        self
    }

    /// Id usable as a lookup key (never empty).
    pub fn lookup_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|s| !s.is_empty())
    }

    /// Category if set and non-empty.
    pub fn category(&self) -> Option<&str> {
        self.request_category.as_deref().filter(|s| !s.is_empty())
    }

    /// Request type if set and non-empty.
    pub fn request_type(&self) -> Option<&str> {
        self.request_type.as_deref().filter(|s| !s.is_empty())
    }
}

/// SLA target attached to every catalog request type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sla {
    pub unit: String,
    pub value: u32,
}

/// A request type inside a catalog category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRequestType {
    pub name: String,
    pub sla: Sla,
}

/// A catalog category with its request types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCategory {
    pub name: String,
    pub requests: Vec<ServiceRequestType>,
}

/// Canonical taxonomy of (category, request type) pairs. Read-only once built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCatalog {
    pub categories: Vec<ServiceCategory>,
}

impl ServiceCatalog {
    pub fn new(categories: Vec<ServiceCategory>) -> Self {
        Self { categories }
    }

    /// Iterates over every (category, request type) entry in catalog order.
    pub fn entries(&self) -> impl Iterator<Item = (&ServiceCategory, &ServiceRequestType)> {
        self.categories
            .iter()
            .flat_map(|c| c.requests.iter().map(move |r| (c, r)))
    }

    /// Total number of request types across all categories.
    pub fn request_type_count(&self) -> usize {
        self.categories.iter().map(|c| c.requests.len()).sum()
    }
}

/// Classifier suggestion for one request. Either field may be absent ("no suggestion").
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassificationResult {
    pub request_category: Option<String>,
    pub request_type: Option<String>,
}

impl ClassificationResult {
    pub fn new(category: impl Into<String>, request_type: impl Into<String>) -> Self {
        Self {
            request_category: Some(category.into()),
            request_type: Some(request_type.into()),
        }
    }
}

/// Canonical (category, request type) pair exactly as the catalog stores it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CatalogMatch {
    pub request_category: String,
    pub request_type: String,
}

/// Trims a loosely typed value into a string; blank becomes `None`.
pub fn normalize_optional_str(value: &serde_json::Value) -> Option<String> {
    let text = match value {
        serde_json::Value::Null => return None,
        serde_json::Value::String(s) => s.trim().to_string(),
        other => other.to_string().trim().to_string(),
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Parses integers, floats (truncated) and integer strings. Float strings such as `"3.0"`,
/// invalid, negative or zero values become `None`.
pub fn normalize_optional_int(value: &serde_json::Value) -> Option<u32> {
    let number = match value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        serde_json::Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }?;
    u32::try_from(number).ok().filter(|&n| n != 0)
}
