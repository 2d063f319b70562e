//! Helpdesk API client: POSTs credentials, retries with exponential backoff and maps
//! the loosely shaped JSON payload into [`HelpdeskRequest`]s.

use atta_core::{
    normalize_optional_int, normalize_optional_str, require, HelpdeskError, HelpdeskRequest,
    HelpdeskSettings, RequestSource,
};
use backoff::{backoff::Backoff, ExponentialBackoff, ExponentialBackoffBuilder};
use serde_json::{Map, Value};
use std::time::Duration;

type JsonObject = Map<String, Value>;

/// HTTP client for fetching helpdesk requests.
pub struct HelpdeskClient {
    http: reqwest::Client,
    url: String,
    api_key: String,
    api_secret: String,
    max_retries: u32,
    backoff_factor: Duration,
}

impl HelpdeskClient {
    pub fn new(settings: &HelpdeskSettings) -> Result<Self, HelpdeskError> {
        let url = require("helpdesk.url", &settings.url)?.to_string();
        let api_key = require("helpdesk.api_key", &settings.api_key)?.to_string();
        let api_secret = require("helpdesk.api_secret", &settings.api_secret)?.to_string();
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| HelpdeskError::Transport { attempts: 0, reason: e.to_string() })?;
        Ok(Self {
            http,
            url,
            api_key,
            api_secret,
            max_retries: settings.max_retries.max(1),
            backoff_factor: Duration::from_secs_f64(settings.backoff_factor_secs.max(0.0)),
        })
    }

    /// Delay before retry `n` is `backoff_factor * 2^(n-1)`.
    fn create_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(self.backoff_factor)
            .with_multiplier(2.0)
            .with_randomization_factor(0.0)
            .with_max_interval(Duration::from_secs(60))
            .with_max_elapsed_time(None)
            .build()
    }

    async fn post_once(&self, payload: &Value) -> Result<String, reqwest::Error> {
        self.http
            .post(&self.url)
            .json(payload)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }

    /// Calls the API and returns the parsed JSON body.
    pub async fn fetch_raw(&self) -> Result<Value, HelpdeskError> {
        let payload = serde_json::json!({
            "api_key": self.api_key,
            "api_secret": self.api_secret,
        });
        let mut backoff = self.create_backoff();
        let mut attempt = 0;

        let body = loop {
            attempt += 1;
            match self.post_once(&payload).await {
                Ok(body) => break body,
                Err(err) => {
                    if attempt >= self.max_retries {
                        tracing::error!(
                            "Error calling Helpdesk API after {} attempts: {}",
                            attempt,
                            err
                        );
                        return Err(HelpdeskError::Transport {
                            attempts: attempt,
                            reason: err.to_string(),
                        });
                    }
                    let delay = backoff.next_backoff().unwrap_or(self.backoff_factor);
                    tracing::warn!(
                        "Helpdesk API call failed on attempt {}/{}: {}; retrying in {:?}",
                        attempt,
                        self.max_retries,
                        err,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        };

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse Helpdesk API response as JSON");
            HelpdeskError::InvalidJson(e.to_string())
        })
    }

    /// Fetches and maps all requests in the response.
    pub async fn fetch(&self) -> Result<Vec<HelpdeskRequest>, HelpdeskError> {
        let data = self.fetch_raw().await?;
        match &data {
            Value::Object(map) => tracing::info!(
                "Raw Helpdesk API response keys: {:?}",
                map.keys().collect::<Vec<_>>()
            ),
            other => tracing::info!("Raw Helpdesk API response is a {}", json_type(other)),
        }

        let requests: Vec<HelpdeskRequest> =
            extract_items(&data)?.into_iter().map(map_request).collect();
        tracing::info!("Fetched {} helpdesk requests", requests.len());
        Ok(requests)
    }
}

#[async_trait::async_trait]
impl RequestSource for HelpdeskClient {
    async fn fetch_requests(&self) -> Result<Vec<HelpdeskRequest>, HelpdeskError> {
        self.fetch().await
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

fn objects(items: &[Value]) -> Vec<&JsonObject> {
    items.iter().filter_map(Value::as_object).collect()
}

/// Accepts a top-level list, `{data: [...]}`, or `{data: {requests: [...]}}`.
/// A top-level object without `data` is treated as the payload itself.
fn extract_items(data: &Value) -> Result<Vec<&JsonObject>, HelpdeskError> {
    let root = match data {
        Value::Array(items) => return Ok(objects(items)),
        Value::Object(root) => root,
        other => {
            return Err(HelpdeskError::UnexpectedShape(format!(
                "top-level value is a {}",
                json_type(other)
            )))
        }
    };

    match root.get("data").unwrap_or(data) {
        Value::Array(items) => Ok(objects(items)),
        Value::Object(payload) => match payload.get("requests") {
            Some(Value::Array(items)) => Ok(objects(items)),
            _ => {
                tracing::error!(
                    "Helpdesk API 'data' has no 'requests' list. payload keys={:?}",
                    payload.keys().collect::<Vec<_>>()
                );
                Err(HelpdeskError::UnexpectedShape(
                    "'data.requests' key missing or not a list".into(),
                ))
            }
        },
        other => Err(HelpdeskError::UnexpectedShape(format!(
            "'data' is a {}, expected object or list",
            json_type(other)
        ))),
    }
}

/// Null, `false`, `0`, `""` and empty containers do not count as a supplied alias.
fn is_supplied(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Normalizes the first supplied alias. A supplied but blank value still wins.
fn first_str(item: &JsonObject, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| item.get(*k))
        .find(|v| is_supplied(v))
        .and_then(normalize_optional_str)
}

fn map_request(item: &JsonObject) -> HelpdeskRequest {
    let sla = item.get("sla").and_then(Value::as_object);
    HelpdeskRequest {
        id: first_str(item, &["id", "ticket_id"]),
        short_description: first_str(item, &["short_description", "subject"]),
        long_description: first_str(item, &["long_description", "description", "body"]),
        request_category: first_str(item, &["request_category"]),
        request_type: first_str(item, &["request_type"]),
        sla_unit: sla.and_then(|s| first_str(s, &["unit"])),
        sla_value: sla
            .and_then(|s| s.get("value"))
            .and_then(normalize_optional_int),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(url: String) -> HelpdeskSettings {
        HelpdeskSettings {
            url,
            api_key: "key".into(),
            api_secret: "secret".into(),
            timeout_secs: 5,
            max_retries: 3,
            backoff_factor_secs: 0.01,
        }
    }

    #[tokio::test]
    async fn test_fetches_nested_requests_with_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/requests"))
            .and(body_json(json!({"api_key": "key", "api_secret": "secret"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"requests": [
                    {"id": "req_1", "short_description": " VPN down ", "sla": {"unit": "hours", "value": "4"}},
                    {"ticket_id": 17, "subject": "Laptop broken", "body": "Screen cracked"},
                    "not an object"
                ]}
            })))
            .mount(&server)
            .await;

        let client = HelpdeskClient::new(&settings(format!("{}/requests", server.uri()))).unwrap();
        let requests = client.fetch_requests().await.unwrap();

        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].id.as_deref(), Some("req_1"));
        assert_eq!(requests[0].short_description.as_deref(), Some("VPN down"));
        assert_eq!(requests[0].sla_unit.as_deref(), Some("hours"));
        assert_eq!(requests[0].sla_value, Some(4));
        assert_eq!(requests[1].id.as_deref(), Some("17"));
        assert_eq!(requests[1].short_description.as_deref(), Some("Laptop broken"));
        assert_eq!(requests[1].long_description.as_deref(), Some("Screen cracked"));
        assert_eq!(requests[1].request_category, None);
    }

    #[tokio::test]
    async fn test_retries_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "a"}])))
            .mount(&server)
            .await;

        let client = HelpdeskClient::new(&settings(server.uri())).unwrap();
        let requests = client.fetch().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(server.received_requests().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = HelpdeskClient::new(&settings(server.uri())).unwrap();
        let err = client.fetch().await.unwrap_err();
        assert!(matches!(err, HelpdeskError::Transport { attempts: 3, .. }));
        assert_eq!(server.received_requests().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_invalid_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = HelpdeskClient::new(&settings(server.uri())).unwrap();
        assert!(matches!(client.fetch().await, Err(HelpdeskError::InvalidJson(_))));
    }

    #[test]
    fn test_missing_credentials_fail_construction() {
        let mut s = settings("http://localhost".into());
        s.api_secret = "  ".into();
        assert!(matches!(
            HelpdeskClient::new(&s),
            Err(HelpdeskError::Config(atta_core::ConfigError::Missing("helpdesk.api_secret")))
        ));
    }

    #[test]
    fn test_extract_items_shapes() {
        let list = json!([{"id": "a"}, 3]);
        assert_eq!(extract_items(&list).unwrap().len(), 1);

        let data_list = json!({"data": [{"id": "a"}, {"id": "b"}]});
        assert_eq!(extract_items(&data_list).unwrap().len(), 2);

        let bare = json!({"requests": [{"id": "a"}]});
        assert_eq!(extract_items(&bare).unwrap().len(), 1);

        assert!(matches!(
            extract_items(&json!({"data": {"items": []}})),
            Err(HelpdeskError::UnexpectedShape(_))
        ));
        assert!(matches!(
            extract_items(&json!({"data": "nope"})),
            Err(HelpdeskError::UnexpectedShape(_))
        ));
        assert!(matches!(extract_items(&json!("text")), Err(HelpdeskError::UnexpectedShape(_))));
    }

    #[test]
    fn test_map_request_aliases_and_blank_values() {
        let item = json!({
            "id": 0,
            "ticket_id": "T-9",
            "short_description": "",
            "subject": "Printer jam",
            "description": "Floor 3",
            "request_category": "Hardware Support",
            "sla": {"unit": " ", "value": "3.0"}
        });
        let req = map_request(item.as_object().unwrap());
        assert_eq!(req.id.as_deref(), Some("T-9"));
        assert_eq!(req.short_description.as_deref(), Some("Printer jam"));
        assert_eq!(req.long_description.as_deref(), Some("Floor 3"));
        assert_eq!(req.request_category.as_deref(), Some("Hardware Support"));
        assert_eq!(req.sla_unit, None);
        assert_eq!(req.sla_value, None);
    }

    #[test]
    fn test_blank_primary_alias_is_not_replaced() {
        let item = json!({"id": "  ", "ticket_id": "T-9", "subject": "VPN"});
        let req = map_request(item.as_object().unwrap());
        assert_eq!(req.id, None);
        assert_eq!(req.short_description.as_deref(), Some("VPN"));

        let item = json!({"id": null, "ticket_id": 12});
        assert_eq!(map_request(item.as_object().unwrap()).id.as_deref(), Some("12"));
    }
}
