//! Service Catalog client: downloads the YAML document and maps it into domain types.

use atta_core::{require, CatalogError, CatalogSettings, CatalogSource, ServiceCatalog, ServiceCategory};
use serde::Deserialize;
use std::time::Duration;

#[derive(Deserialize)]
struct CatalogDocument {
    service_catalog: CatalogRoot,
}

#[derive(Deserialize)]
struct CatalogRoot {
    catalog: CatalogBody,
}

#[derive(Deserialize)]
struct CatalogBody {
    categories: Vec<ServiceCategory>,
}

/// Parses `service_catalog.catalog.categories` from YAML text.
pub fn parse_catalog(text: &str) -> Result<ServiceCatalog, CatalogError> {
    let value: serde_yaml::Value = serde_yaml::from_str(text).map_err(|e| {
        tracing::error!("Failed to parse Service Catalog YAML: {}", e);
        CatalogError::Parse(e.to_string())
    })?;
    let document: CatalogDocument = serde_yaml::from_value(value).map_err(|e| {
        tracing::error!("Failed to map Service Catalog to domain models: {}", e);
        CatalogError::Invalid(e.to_string())
    })?;
    Ok(ServiceCatalog::new(document.service_catalog.catalog.categories))
}

pub struct ServiceCatalogClient {
    http: reqwest::Client,
    url: String,
}

impl ServiceCatalogClient {
    pub fn new(settings: &CatalogSettings) -> Result<Self, CatalogError> {
        let url = require("catalog.url", &settings.url)?.to_string();
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| CatalogError::Fetch(e.to_string()))?;
        Ok(Self { http, url })
    }

    async fn download_text(&self) -> Result<String, reqwest::Error> {
        self.http
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }
}

#[async_trait::async_trait]
impl CatalogSource for ServiceCatalogClient {
    async fn fetch_catalog(&self) -> Result<ServiceCatalog, CatalogError> {
        let text = self.download_text().await.map_err(|e| {
            tracing::error!("Error calling Service Catalog endpoint: {}", e);
            CatalogError::Fetch(e.to_string())
        })?;
        tracing::debug!("Raw Service Catalog response length={}", text.len());

        let catalog = parse_catalog(&text)?;
        tracing::info!(
            "Loaded Service Catalog: {} categories, {} total request types",
            catalog.categories.len(),
            catalog.request_type_count()
        );
        Ok(catalog)
    }
}
