use std::sync::Arc;

use axum::{routing::get, Router};

use crate::handlers;
use crate::services::directory::PlaceDirectoryService;

pub fn place_routes(service: Arc<PlaceDirectoryService>) -> Router {
    Router::new()
        .route("/nearby", get(handlers::nearby))
        .route("/geocode", get(handlers::geocode))
        .with_state(service)
}
