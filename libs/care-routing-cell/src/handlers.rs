use std::sync::Arc;

use axum::{extract::State, Json};

use place_directory_cell::models::PlaceCategory;
use shared_models::{AppError, Coordinates};

use crate::models::{Recommendation, RecommendRequest};
use crate::services::routing::CareRoutingService;

const DEFAULT_RADIUS_METERS: u32 = 8_000;

#[axum::debug_handler]
pub async fn recommend(
    State(service): State<Arc<CareRoutingService>>,
    Json(request): Json<RecommendRequest>,
) -> Result<Json<Recommendation>, AppError> {
    let origin = Coordinates::new(request.lat, request.lng);
    if !origin.is_finite() {
        return Err(AppError::BadRequest("lat and lng required".to_string()));
    }

    // Unknown category tokens are ignored; an empty set defaults to the
    // clinical categories inside the service.
    let categories: Vec<PlaceCategory> = request
        .categories
        .iter()
        .filter_map(|t| t.trim().parse().ok())
        .collect();

    let radius = request.radius_m.unwrap_or(DEFAULT_RADIUS_METERS);
    let recommendation = service
        .recommend(origin, radius, &categories, &request.patient_needs)
        .await;

    Ok(Json(recommendation))
}
