use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use shared_config::AppConfig;

use crate::models::GeocodeResult;

const GEOCODE_TIMEOUT: Duration = Duration::from_secs(10);
const GEOCODE_LIMIT: u32 = 5;

// Nominatim serializes coordinates as strings.
#[derive(Debug, Deserialize)]
struct NominatimHit {
    display_name: String,
    lat: String,
    lon: String,
}

/// Best-effort free-text geocoder backed by a Nominatim-style endpoint.
pub struct NominatimClient {
    client: Client,
    base_url: String,
    user_agent: String,
}

impl NominatimClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.geocoder_base_url.clone(),
            user_agent: config.http_user_agent.clone(),
        }
    }

    /// Resolves a free-text query to candidate coordinates. Any provider
    /// failure yields an empty list; geocoding is never load-bearing.
    pub async fn search(&self, query: &str, country: Option<&str>) -> Vec<GeocodeResult> {
        let url = format!("{}/search", self.base_url);
        let mut params = vec![
            ("format", "json".to_string()),
            ("limit", GEOCODE_LIMIT.to_string()),
            ("q", query.to_string()),
        ];
        if let Some(cc) = country.filter(|c| !c.trim().is_empty()) {
            params.push(("countrycodes", cc.trim().to_string()));
        }

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .query(&params)
            .timeout(GEOCODE_TIMEOUT)
            .send()
            .await;

        let hits: Vec<NominatimHit> = match response {
            Ok(r) if r.status().is_success() => r.json().await.unwrap_or_default(),
            Ok(r) => {
                warn!("Geocoder returned HTTP {}", r.status());
                return Vec::new();
            }
            Err(e) => {
                warn!("Geocoder unavailable: {}", e);
                return Vec::new();
            }
        };

        debug!("Geocoder returned {} hits for {:?}", hits.len(), query);
        hits.into_iter()
            .filter_map(|h| {
                let lat = h.lat.parse().ok()?;
                let lng = h.lon.parse().ok()?;
                Some(GeocodeResult {
                    name: h.display_name,
                    lat,
                    lng,
                })
            })
            .collect()
    }
}
