use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use shared_config::AppConfig;
use shared_models::Coordinates;

use crate::models::{DetailedRoute, RouteError, RouteStep, RouteSummary, TravelMode};
use crate::services::cache::{Cache, InMemoryTtlCache};

const SUMMARY_TTL: Duration = Duration::from_secs(30);
const DETAILED_TTL: Duration = Duration::from_secs(120);
const SUMMARY_TIMEOUT: Duration = Duration::from_secs(8);
const DETAILED_TIMEOUT: Duration = Duration::from_secs(12);

const DRIVING_SPEED_KMH: f64 = 50.0;
const WALKING_SPEED_KMH: f64 = 5.0;

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    #[serde(default)]
    distance: f64,
    #[serde(default)]
    duration: f64,
    geometry: Option<Value>,
    #[serde(default)]
    legs: Vec<OsrmLeg>,
}

#[derive(Debug, Deserialize)]
struct OsrmLeg {
    #[serde(default)]
    steps: Vec<OsrmStep>,
}

#[derive(Debug, Deserialize)]
struct OsrmStep {
    name: Option<String>,
    #[serde(default)]
    distance: f64,
    #[serde(default)]
    duration: f64,
    maneuver: Option<OsrmManeuver>,
}

#[derive(Debug, Deserialize)]
struct OsrmManeuver {
    #[serde(rename = "type")]
    kind: Option<String>,
    modifier: Option<String>,
}

/// Travel distance/duration estimation against an OSRM-style routing
/// provider, with two-tier TTL caching and a great-circle fallback.
///
/// The contract of this service is that it never fails: every call
/// resolves to a usable estimate, real or approximate. Fallbacks are
/// cached like real answers so a degraded provider is not hammered.
pub struct TravelEstimator {
    client: Client,
    base_url: String,
    summary_cache: Arc<dyn Cache<RouteSummary>>,
    detailed_cache: Arc<dyn Cache<DetailedRoute>>,
    summary_ttl: Duration,
    detailed_ttl: Duration,
}

impl TravelEstimator {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_ttls(config, SUMMARY_TTL, DETAILED_TTL)
    }

    pub fn with_ttls(config: &AppConfig, summary_ttl: Duration, detailed_ttl: Duration) -> Self {
        Self {
            client: Client::new(),
            base_url: config.osrm_base_url.clone(),
            summary_cache: Arc::new(InMemoryTtlCache::new()),
            detailed_cache: Arc::new(InMemoryTtlCache::new()),
            summary_ttl,
            detailed_ttl,
        }
    }

    /// Distance and duration between two points.
    pub async fn summary(&self, from: Coordinates, to: Coordinates, mode: TravelMode) -> RouteSummary {
        let key = cache_key(mode, from, to);
        if let Some(cached) = self.summary_cache.get(&key) {
            return cached;
        }

        let result = match self.fetch_summary(from, to, mode).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!("Route summary fell back to great-circle estimate: {}", e);
                fallback_summary(from, to, mode, &e)
            }
        };

        self.summary_cache.set(key, result.clone(), self.summary_ttl);
        result
    }

    /// Full route with geometry and turn-by-turn steps.
    pub async fn detailed(&self, from: Coordinates, to: Coordinates, mode: TravelMode) -> DetailedRoute {
        let key = cache_key(mode, from, to);
        if let Some(cached) = self.detailed_cache.get(&key) {
            return cached;
        }

        let result = match self.fetch_detailed(from, to, mode).await {
            Ok(route) => route,
            Err(e) => {
                warn!("Detailed route fell back to great-circle estimate: {}", e);
                fallback_detailed(from, to, mode, &e)
            }
        };

        self.detailed_cache.set(key, result.clone(), self.detailed_ttl);
        result
    }

    async fn fetch_summary(
        &self,
        from: Coordinates,
        to: Coordinates,
        mode: TravelMode,
    ) -> Result<RouteSummary, RouteError> {
        let url = format!(
            "{}/{}/{},{};{},{}?overview=false",
            self.base_url,
            mode.profile(),
            from.lng,
            from.lat,
            to.lng,
            to.lat
        );
        let route = self.fetch_route(&url, SUMMARY_TIMEOUT).await?;

        Ok(RouteSummary {
            distance_meters: route.distance,
            duration_seconds: route.duration,
            fallback: false,
            note: None,
        })
    }

    async fn fetch_detailed(
        &self,
        from: Coordinates,
        to: Coordinates,
        mode: TravelMode,
    ) -> Result<DetailedRoute, RouteError> {
        let url = format!(
            "{}/{}/{},{};{},{}?overview=full&geometries=geojson&steps=true",
            self.base_url,
            mode.profile(),
            from.lng,
            from.lat,
            to.lng,
            to.lat
        );
        let route = self.fetch_route(&url, DETAILED_TIMEOUT).await?;

        let steps = route
            .legs
            .first()
            .map(|leg| {
                leg.steps
                    .iter()
                    .map(|s| RouteStep {
                        instruction: step_instruction(s),
                        distance_meters: s.distance,
                        duration_seconds: s.duration,
                    })
                    .collect()
            })
            .unwrap_or_default();

        let geometry = route
            .geometry
            .clone()
            .ok_or_else(|| RouteError::Shape("route has no geometry".to_string()))?;

        Ok(DetailedRoute {
            geometry,
            distance_meters: route.distance,
            duration_seconds: route.duration,
            steps,
            fallback: false,
            note: None,
        })
    }

    async fn fetch_route(&self, url: &str, timeout: Duration) -> Result<OsrmRoute, RouteError> {
        debug!("Fetching route from {}", url);

        let response = self.client.get(url).timeout(timeout).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RouteError::Provider(format!("HTTP {}: {}", status, body)));
        }

        let mut parsed: OsrmResponse = response
            .json()
            .await
            .map_err(|e| RouteError::Shape(e.to_string()))?;

        if parsed.code.as_deref() != Some("Ok") {
            return Err(RouteError::Provider(format!(
                "routing code {:?}",
                parsed.code
            )));
        }
        if parsed.routes.is_empty() {
            return Err(RouteError::Shape("no routes in response".to_string()));
        }
        Ok(parsed.routes.remove(0))
    }
}

/// Cache key: mode plus both endpoints rounded to ~1m precision, so jitter
/// in caller-supplied GPS coordinates still hits the same entry.
fn cache_key(mode: TravelMode, from: Coordinates, to: Coordinates) -> String {
    format!(
        "{}:{:.5},{:.5}->{:.5},{:.5}",
        mode.as_str(),
        from.lat,
        from.lng,
        to.lat,
        to.lng
    )
}

/// Human-readable instruction from maneuver type + modifier + road name.
fn step_instruction(step: &OsrmStep) -> String {
    let kind = step
        .maneuver
        .as_ref()
        .and_then(|m| m.kind.as_deref())
        .unwrap_or("");
    let modifier = step
        .maneuver
        .as_ref()
        .and_then(|m| m.modifier.as_deref())
        .unwrap_or("");
    let name = step.name.as_deref().unwrap_or("");

    let parts: Vec<&str> = [kind, modifier].into_iter().filter(|s| !s.is_empty()).collect();
    let mut text = if parts.is_empty() {
        "Continue".to_string()
    } else {
        parts.join(" ")
    };
    if !name.is_empty() {
        text.push_str(" onto ");
        text.push_str(name);
    }
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn approximate(from: Coordinates, to: Coordinates, mode: TravelMode) -> (f64, f64) {
    let km = from.haversine_meters(&to) / 1000.0;
    let speed_kmh = match mode {
        TravelMode::Walking => WALKING_SPEED_KMH,
        TravelMode::Driving => DRIVING_SPEED_KMH,
    };
    let seconds = km / speed_kmh * 3600.0;
    ((km * 1000.0).round(), seconds)
}

fn fallback_summary(
    from: Coordinates,
    to: Coordinates,
    mode: TravelMode,
    error: &RouteError,
) -> RouteSummary {
    let (distance_meters, seconds) = approximate(from, to, mode);
    RouteSummary {
        distance_meters,
        duration_seconds: seconds.round(),
        fallback: true,
        note: Some(format!("routing provider unavailable: {}", error)),
    }
}

fn fallback_detailed(
    from: Coordinates,
    to: Coordinates,
    mode: TravelMode,
    error: &RouteError,
) -> DetailedRoute {
    let (distance_meters, seconds) = approximate(from, to, mode);
    // Floor at a minute so the UI never shows a zero-length emergency trip.
    let duration_seconds = seconds.round().max(60.0);
    let geometry = json!({
        "type": "LineString",
        "coordinates": [[from.lng, from.lat], [to.lng, to.lat]],
    });

    DetailedRoute {
        geometry,
        distance_meters,
        duration_seconds,
        steps: vec![RouteStep {
            instruction: "Head toward the destination (approximate route; routing server unavailable)."
                .to_string(),
            distance_meters,
            duration_seconds,
        }],
        fallback: true,
        note: Some(format!("routing provider unavailable: {}", error)),
    }
}
