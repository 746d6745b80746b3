use std::collections::HashMap;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use shared_config::AppConfig;

use crate::models::DirectoryError;

const OVERPASS_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Deserialize)]
pub struct OverpassResponse {
    #[serde(default)]
    pub elements: Vec<OverpassElement>,
}

/// One raw tagged entity. Nodes carry `lat`/`lon` directly; ways and
/// relations only carry an aggregate `center`.
#[derive(Debug, Deserialize)]
pub struct OverpassElement {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub id: Option<i64>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub center: Option<OverpassCenter>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct OverpassCenter {
    pub lat: f64,
    pub lon: f64,
}

/// Thin client for an Overpass-style query endpoint.
pub struct OverpassClient {
    client: Client,
    base_url: String,
    user_agent: String,
}

impl OverpassClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.overpass_base_url.clone(),
            user_agent: config.http_user_agent.clone(),
        }
    }

    pub async fn query(&self, query: &str) -> Result<Vec<OverpassElement>, DirectoryError> {
        debug!("Querying geo provider at {}", self.base_url);

        let response = self
            .client
            .post(&self.base_url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .form(&[("data", query)])
            .timeout(OVERPASS_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DirectoryError::Provider(format!("HTTP {}: {}", status, body)));
        }

        let parsed: OverpassResponse = response
            .json()
            .await
            .map_err(|e| DirectoryError::Shape(e.to_string()))?;

        debug!("Geo provider returned {} elements", parsed.elements.len());
        Ok(parsed.elements)
    }
}
