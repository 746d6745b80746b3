use std::sync::Arc;

use axum::{routing::get, Router};

use care_routing_cell::router::care_routes;
use care_routing_cell::services::routing::CareRoutingService;
use place_directory_cell::router::place_routes;
use place_directory_cell::services::directory::PlaceDirectoryService;
use shared_config::AppConfig;
use travel_cell::router::route_routes;
use travel_cell::services::estimator::TravelEstimator;

/// Builds the service graph once so every route shares the same travel
/// caches and HTTP clients, then mounts all cells under /api/geo.
pub fn create_router(config: &AppConfig) -> Router {
    let directory = Arc::new(PlaceDirectoryService::new(config));
    let estimator = Arc::new(TravelEstimator::new(config));
    let care = Arc::new(CareRoutingService::new(directory.clone(), estimator.clone()));

    let geo = place_routes(directory)
        .merge(route_routes(estimator))
        .merge(care_routes(care));

    Router::new()
        .route("/", get(|| async { "Care Map API is running!" }))
        .nest("/api/geo", geo)
}
