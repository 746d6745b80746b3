use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use shared_models::{AppError, Coordinates};

use crate::models::PlaceCategory;
use crate::services::directory::PlaceDirectoryService;

const DEFAULT_RADIUS_METERS: u32 = 8_000;

#[derive(Debug, Deserialize)]
pub struct NearbyQuery {
    pub lat: f64,
    pub lng: f64,
    pub radius_m: Option<u32>,
    /// Comma-separated category names; unknown tokens are ignored.
    pub categories: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GeocodeQuery {
    pub q: String,
    pub country: Option<String>,
}

/// Splits a comma-separated category list, dropping anything unknown.
/// Empty input means the five clinical categories.
pub fn parse_categories(raw: Option<&str>) -> Vec<PlaceCategory> {
    let raw = raw.unwrap_or("").trim();
    if raw.is_empty() {
        return PlaceCategory::clinical();
    }
    raw.split(',')
        .filter_map(|t| t.trim().parse().ok())
        .collect()
}

#[axum::debug_handler]
pub async fn nearby(
    State(service): State<Arc<PlaceDirectoryService>>,
    Query(query): Query<NearbyQuery>,
) -> Result<Json<Value>, AppError> {
    let center = Coordinates::new(query.lat, query.lng);
    if !center.is_finite() {
        return Err(AppError::BadRequest("lat and lng required".to_string()));
    }

    let categories = parse_categories(query.categories.as_deref());
    let radius = query.radius_m.unwrap_or(DEFAULT_RADIUS_METERS);
    let places = service.nearby(center, radius, &categories).await;

    Ok(Json(json!({ "places": places })))
}

#[axum::debug_handler]
pub async fn geocode(
    State(service): State<Arc<PlaceDirectoryService>>,
    Query(query): Query<GeocodeQuery>,
) -> Result<Json<Value>, AppError> {
    let q = query.q.trim();
    if q.is_empty() {
        return Err(AppError::BadRequest("q required".to_string()));
    }

    let results = service.geocode(q, query.country.as_deref()).await;
    Ok(Json(json!({ "results": results })))
}
