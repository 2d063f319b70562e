//! Gemini-backed [`RequestClassifier`] using the `generateContent` REST endpoint.

mod prompt;

pub use prompt::{catalog_fragment, render as render_prompt, requests_block};

use atta_core::{
    normalize_optional_str, require, BatchResults, ClassificationError, ClassificationResult,
    HelpdeskRequest, LlmSettings, RequestClassifier, ServiceCatalog,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    temperature: f32,
    top_p: f32,
    top_k: u32,
}

#[derive(Deserialize, Default)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Default)]
struct Candidate {
    #[serde(default)]
    content: CandidateContent,
}

#[derive(Deserialize, Default)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize, Default)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate.
    fn text(&self) -> Option<String> {
        let candidate = self.candidates.first()?;
        let text: String = candidate
            .content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// Classifies helpdesk requests in batches with a Gemini model.
pub struct GeminiClassifier {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    temperature: f32,
    top_p: f32,
    top_k: u32,
    delay_between_batches: Duration,
}

impl GeminiClassifier {
    pub fn new(settings: &LlmSettings) -> Result<Self, ClassificationError> {
        let api_key = require("llm.api_key", &settings.api_key)
            .map_err(|e| ClassificationError::NotConfigured(e.to_string()))?
            .to_string();
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| ClassificationError::NotConfigured(e.to_string()))?;
        let endpoint = format!(
            "{}/models/{}:generateContent",
            settings.api_base.trim_end_matches('/'),
            settings.model
        );
        tracing::info!("Gemini classifier ready (model: {})", settings.model);
        Ok(Self {
            http,
            endpoint,
            api_key,
            temperature: settings.temperature,
            top_p: settings.top_p,
            top_k: settings.top_k,
            delay_between_batches: Duration::from_millis(settings.delay_between_batches_ms),
        })
    }

    async fn generate(&self, prompt: &str) -> Result<String, ClassificationError> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                temperature: self.temperature,
                top_p: self.top_p,
                top_k: self.top_k,
            },
        };

        let response = self
            .http
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                tracing::error!("LLM batch classification call failed: {}", e);
                ClassificationError::Transport(e.to_string())
            })?;

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ClassificationError::Transport(format!("unreadable response: {}", e)))?;

        parsed
            .text()
            .ok_or_else(|| ClassificationError::EmptyResult("LLM response contained no text".into()))
    }
}

#[async_trait::async_trait]
impl RequestClassifier for GeminiClassifier {
    async fn classify_batch(
        &self,
        requests: &[HelpdeskRequest],
        catalog: &ServiceCatalog,
    ) -> Result<BatchResults, ClassificationError> {
        if requests.is_empty() {
            return Ok(BatchResults::new());
        }

        let without_id = requests.iter().filter(|r| r.lookup_id().is_none()).count();
        if without_id > 0 {
            tracing::warn!(
                "{} helpdesk request(s) without id in LLM batch; their results cannot be matched by id",
                without_id
            );
        }

        let prompt = render_prompt(catalog, requests);
        let text = self.generate(&prompt).await?;
        let results = parse_items(&text)?;
        tracing::debug!("LLM batch classification produced {} items", results.len());

        if !self.delay_between_batches.is_zero() {
            tracing::debug!("Sleeping {:?} between LLM batches", self.delay_between_batches);
            tokio::time::sleep(self.delay_between_batches).await;
        }
        Ok(results)
    }
}

/// Maps the model's JSON text into results keyed by id.
///
/// Items that are not objects or have no usable `id` (or `raw_id`) are skipped.
/// SLA fields are ignored. Fails if nothing valid remains.
pub fn parse_items(text: &str) -> Result<BatchResults, ClassificationError> {
    let data: Value = serde_json::from_str(text).map_err(|e| {
        let preview: String = text.chars().take(300).collect();
        tracing::error!("LLM batch returned non-JSON output: {:?}", preview);
        ClassificationError::MalformedOutput(format!("output was not valid JSON: {}", e))
    })?;

    let items = data
        .get("items")
        .and_then(Value::as_array)
        .ok_or_else(|| ClassificationError::MalformedOutput("JSON missing 'items' list".into()))?;
    if items.is_empty() {
        return Err(ClassificationError::EmptyResult("'items' list is empty".into()));
    }

    let mut results = BatchResults::new();
    for (index, item) in items.iter().enumerate() {
        let Some(obj) = item.as_object() else {
            tracing::warn!("Skipping non-object item at index {} in LLM batch JSON: {}", index, item);
            continue;
        };
        let id = ["id", "raw_id"]
            .iter()
            .filter_map(|k| obj.get(*k))
            .find_map(normalize_optional_str);
        let Some(id) = id else {
            tracing::warn!("Skipping LLM item without valid 'id' at index {}: {}", index, item);
            continue;
        };

        let sla_unit = obj.get("sla_unit").filter(|v| !v.is_null());
        let sla_value = obj.get("sla_value").filter(|v| !v.is_null());
        if sla_unit.is_some() || sla_value.is_some() {
            tracing::warn!(
                "LLM returned SLA fields for request {} (sla_unit={:?}, sla_value={:?}); ignoring, SLA comes from the Service Catalog",
                id,
                sla_unit,
                sla_value
            );
        }

        results.insert(
            id,
            ClassificationResult {
                request_category: obj.get("request_category").and_then(normalize_optional_str),
                request_type: obj.get("request_type").and_then(normalize_optional_str),
            },
        );
    }

    if results.is_empty() {
        tracing::error!("LLM batch JSON contained {} item(s) but none were valid", items.len());
        return Err(ClassificationError::EmptyResult(
            "no valid items (all missing or invalid 'id')".into(),
        ));
    }
    Ok(results)
}
