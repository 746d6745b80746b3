use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    Driving,
    Walking,
}

impl TravelMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TravelMode::Driving => "driving",
            TravelMode::Walking => "walking",
        }
    }

    /// Routing-provider profile name; happens to coincide with `as_str`.
    pub fn profile(&self) -> &'static str {
        self.as_str()
    }

    /// Lenient parse: anything that is not explicitly walking is driving.
    pub fn from_param(s: Option<&str>) -> TravelMode {
        match s {
            Some("walking") => TravelMode::Walking,
            _ => TravelMode::Driving,
        }
    }
}

/// Distance and duration only; the cheap estimate used for ranking fan-out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteSummary {
    pub distance_meters: f64,
    pub duration_seconds: f64,
    #[serde(default)]
    pub fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteStep {
    pub instruction: String,
    pub distance_meters: f64,
    pub duration_seconds: f64,
}

/// Full route with path geometry (GeoJSON LineString) and turn-by-turn
/// steps, for map rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailedRoute {
    pub geometry: Value,
    pub distance_meters: f64,
    pub duration_seconds: f64,
    pub steps: Vec<RouteStep>,
    #[serde(default)]
    pub fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

// Internal routing-provider failures; always absorbed into a synthesized
// great-circle estimate before leaving the cell.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("routing provider timed out")]
    Timeout,
    #[error("routing provider error: {0}")]
    Provider(String),
    #[error("malformed routing response: {0}")]
    Shape(String),
}

impl From<reqwest::Error> for RouteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RouteError::Timeout
        } else {
            RouteError::Provider(e.to_string())
        }
    }
}
