use std::sync::Arc;

use axum::{routing::get, Router};

use crate::handlers;
use crate::services::estimator::TravelEstimator;

pub fn route_routes(estimator: Arc<TravelEstimator>) -> Router {
    Router::new()
        .route("/route", get(handlers::route_detailed))
        .route("/route/summary", get(handlers::route_summary))
        .with_state(estimator)
}
