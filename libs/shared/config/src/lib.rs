use std::env;
use tracing::warn;

pub const DEFAULT_OVERPASS_BASE_URL: &str = "https://overpass-api.de/api/interpreter";
pub const DEFAULT_OSRM_BASE_URL: &str = "http://router.project-osrm.org/route/v1";
pub const DEFAULT_GEOCODER_BASE_URL: &str = "https://nominatim.openstreetmap.org";
pub const DEFAULT_USER_AGENT: &str = "care-map-backend/1.0 (care map demo)";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub overpass_base_url: String,
    pub osrm_base_url: String,
    pub geocoder_base_url: String,
    /// Public OSM providers expect a descriptive User-Agent.
    pub http_user_agent: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or_else(|| {
                    warn!("PORT not set or invalid, using 3000");
                    3000
                }),
            overpass_base_url: env::var("OVERPASS_BASE_URL").unwrap_or_else(|_| {
                warn!("OVERPASS_BASE_URL not set, using public default");
                DEFAULT_OVERPASS_BASE_URL.to_string()
            }),
            osrm_base_url: env::var("OSRM_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| {
                    warn!("OSRM_BASE_URL not set, using public default");
                    DEFAULT_OSRM_BASE_URL.to_string()
                }),
            geocoder_base_url: env::var("GEOCODER_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_GEOCODER_BASE_URL.to_string()),
            http_user_agent: env::var("HTTP_USER_AGENT")
                .unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string()),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            overpass_base_url: DEFAULT_OVERPASS_BASE_URL.to_string(),
            osrm_base_url: DEFAULT_OSRM_BASE_URL.to_string(),
            geocoder_base_url: DEFAULT_GEOCODER_BASE_URL.to_string(),
            http_user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}
