use std::sync::Arc;

use axum::{routing::post, Router};

use crate::handlers;
use crate::services::routing::CareRoutingService;

pub fn care_routes(service: Arc<CareRoutingService>) -> Router {
    Router::new()
        .route("/recommend", post(handlers::recommend))
        .with_state(service)
}
