use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use shared_models::{AppError, Coordinates};

use crate::models::{DetailedRoute, TravelMode};
use crate::services::estimator::TravelEstimator;

#[derive(Debug, Deserialize)]
pub struct RouteQuery {
    pub from_lat: f64,
    pub from_lng: f64,
    pub to_lat: f64,
    pub to_lng: f64,
    pub mode: Option<String>,
}

impl RouteQuery {
    fn endpoints(&self) -> Result<(Coordinates, Coordinates), AppError> {
        let from = Coordinates::new(self.from_lat, self.from_lng);
        let to = Coordinates::new(self.to_lat, self.to_lng);
        if !from.is_finite() || !to.is_finite() {
            return Err(AppError::BadRequest(
                "from_lat, from_lng, to_lat, to_lng required".to_string(),
            ));
        }
        Ok((from, to))
    }
}

#[axum::debug_handler]
pub async fn route_detailed(
    State(estimator): State<Arc<TravelEstimator>>,
    Query(query): Query<RouteQuery>,
) -> Result<Json<DetailedRoute>, AppError> {
    let (from, to) = query.endpoints()?;
    let mode = TravelMode::from_param(query.mode.as_deref());
    Ok(Json(estimator.detailed(from, to, mode).await))
}

#[axum::debug_handler]
pub async fn route_summary(
    State(estimator): State<Arc<TravelEstimator>>,
    Query(query): Query<RouteQuery>,
) -> Result<Json<Value>, AppError> {
    let (from, to) = query.endpoints()?;
    let mode = TravelMode::from_param(query.mode.as_deref());
    let summary = estimator.summary(from, to, mode).await;
    Ok(Json(json!({
        "distance_meters": summary.distance_meters,
        "duration_seconds": summary.duration_seconds,
    })))
}
