use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info};

use place_directory_cell::models::{uniq_lower, PlaceCategory};
use place_directory_cell::services::directory::PlaceDirectoryService;
use shared_models::Coordinates;
use travel_cell::models::TravelMode;
use travel_cell::services::estimator::TravelEstimator;

use crate::models::{PatientNeeds, RankedPlace, Recommendation, Severity};
use crate::services::capacity::{capacity_score, CapacityTable};

/// Cap on how many candidates get a travel estimate; the routing provider
/// is a shared public resource and per-candidate estimation is the most
/// expensive step.
const MAX_ESTIMATED_CANDIDATES: usize = 25;

const SPECIALTY_WEIGHT: f64 = 0.45;
const CAPACITY_WEIGHT: f64 = 0.30;
const ETA_WEIGHT: f64 = 0.20;
const DISTANCE_WEIGHT: f64 = 0.05;

// Missing ETA/distance degrade to large sentinels so the inverse terms
// approach zero instead of dividing by zero or inflating the score.
const ETA_SENTINEL_SECONDS: f64 = 99_999.0;
const DISTANCE_SENTINEL_METERS: f64 = 9e9;

/// Orchestrates directory resolution, capacity enrichment, bounded travel
/// estimation, and multi-criteria ranking into a single recommendation.
pub struct CareRoutingService {
    directory: Arc<PlaceDirectoryService>,
    estimator: Arc<TravelEstimator>,
    capacity: CapacityTable,
}

impl CareRoutingService {
    pub fn new(directory: Arc<PlaceDirectoryService>, estimator: Arc<TravelEstimator>) -> Self {
        Self {
            directory,
            estimator,
            capacity: CapacityTable::new(),
        }
    }

    /// Ranks nearby care options and picks one. Never fails: partial
    /// external failure degrades individual signals, an empty directory
    /// yields an empty ranking with no recommendation.
    pub async fn recommend(
        &self,
        origin: Coordinates,
        radius_m: u32,
        categories: &[PlaceCategory],
        needs: &PatientNeeds,
    ) -> Recommendation {
        let required = uniq_lower(needs.required_specialties.iter().map(String::as_str));
        let flags = uniq_lower(needs.flags.iter().map(String::as_str));
        let emergency =
            needs.severity == Severity::Emergency || flags.iter().any(|f| f == "emergency");

        let categories = if categories.is_empty() {
            PlaceCategory::clinical()
        } else {
            categories.to_vec()
        };

        let mut places = self.directory.nearby(origin, radius_m, &categories).await;
        for place in &mut places {
            self.capacity.enrich(place);
        }

        // Emergency patients only get routed to hospitals.
        let candidates: Vec<_> = places
            .into_iter()
            .filter(|p| !emergency || p.category == PlaceCategory::Hospital)
            .take(MAX_ESTIMATED_CANDIDATES)
            .collect();

        debug!(
            "Estimating travel for {} candidates (emergency: {})",
            candidates.len(),
            emergency
        );

        // Concurrent fan-out; results pair with candidates by index, so
        // completion order is irrelevant.
        let estimates = join_all(candidates.iter().map(|p| {
            self.estimator
                .summary(origin, p.coordinates, TravelMode::Driving)
        }))
        .await;

        let mut ranked: Vec<RankedPlace> = candidates
            .into_iter()
            .zip(estimates)
            .map(|(place, estimate)| {
                let cap = match (&place.category, &place.capacity) {
                    (PlaceCategory::Hospital, Some(c)) => {
                        capacity_score(c.status, c.accepting_patients)
                    }
                    _ => 0.5,
                };
                let sm = specialty_match(&required, &place.specialties);
                let eta_seconds = Some(estimate.duration_seconds);
                let distance_meters = Some(estimate.distance_meters);
                let composite_score = composite(sm, cap, eta_seconds, distance_meters);
                RankedPlace {
                    place,
                    distance_meters,
                    eta_seconds,
                    specialty_match_score: sm,
                    capacity_score: cap,
                    composite_score,
                }
            })
            .collect();

        // Stable sort: equal composites keep directory order, so output is
        // deterministic for a given input order.
        ranked.sort_by(|a, b| b.composite_score.total_cmp(&a.composite_score));

        let recommended = if emergency {
            emergency_override(&ranked).or_else(|| ranked.first())
        } else {
            ranked.first()
        }
        .cloned();

        let reasoning = match &recommended {
            Some(best) => build_reasoning(best, emergency, &required),
            None => Vec::new(),
        };

        info!(
            "Ranked {} places, recommended: {:?}",
            ranked.len(),
            recommended.as_ref().map(|r| r.place.name.as_str())
        );

        Recommendation {
            recommended_place: recommended,
            ranked_places: ranked,
            reasoning,
        }
    }
}

/// Fraction of required specialties the candidate covers. Neutral 0.5 when
/// nothing is required; pessimistic 0.2 when the candidate has no
/// specialty data at all.
fn specialty_match(required: &[String], have: &[String]) -> f64 {
    if required.is_empty() {
        return 0.5;
    }
    if have.is_empty() {
        return 0.2;
    }
    let hits = required.iter().filter(|r| have.contains(r)).count();
    hits as f64 / required.len() as f64
}

fn composite(
    specialty_match_score: f64,
    capacity_score: f64,
    eta_seconds: Option<f64>,
    distance_meters: Option<f64>,
) -> f64 {
    let eta = eta_seconds.unwrap_or(ETA_SENTINEL_SECONDS) + 1.0;
    let dist = distance_meters.unwrap_or(DISTANCE_SENTINEL_METERS) + 1.0;

    SPECIALTY_WEIGHT * specialty_match_score
        + CAPACITY_WEIGHT * capacity_score
        + ETA_WEIGHT * (1.0 / eta)
        + DISTANCE_WEIGHT * (1.0 / dist)
}

/// Emergency tie-break: nearest-by-ETA hospital that is accepting and not
/// red, then nearest-by-ETA among all hospitals. Hospitals without
/// capacity data count as accepting. Returns `None` when no hospital is
/// in range at all; the caller then falls back to the top of the ranked
/// list (which under the emergency filter means no recommendation).
fn emergency_override(ranked: &[RankedPlace]) -> Option<&RankedPlace> {
    use place_directory_cell::models::CapacityStatus;

    let hospitals: Vec<&RankedPlace> = ranked
        .iter()
        .filter(|p| p.place.category == PlaceCategory::Hospital)
        .collect();
    let accepting: Vec<&RankedPlace> = hospitals
        .iter()
        .copied()
        .filter(|h| {
            h.place
                .capacity
                .as_ref()
                .map(|c| c.accepting_patients && c.status != CapacityStatus::Red)
                .unwrap_or(true)
        })
        .collect();

    nearest_by_eta(&accepting).or_else(|| nearest_by_eta(&hospitals))
}

fn nearest_by_eta<'a>(places: &[&'a RankedPlace]) -> Option<&'a RankedPlace> {
    places.iter().copied().min_by(|a, b| {
        a.eta_seconds
            .unwrap_or(ETA_SENTINEL_SECONDS)
            .total_cmp(&b.eta_seconds.unwrap_or(ETA_SENTINEL_SECONDS))
    })
}

/// Ordered human-readable justification for the pick.
fn build_reasoning(best: &RankedPlace, emergency: bool, required: &[String]) -> Vec<String> {
    let mut reasoning = Vec::new();

    if emergency {
        reasoning.push("Emergency override: routing to an ER/hospital first.".to_string());
    }

    let eta = best.eta_seconds.unwrap_or(0.0);
    if eta > 0.0 {
        reasoning.push(format!(
            "Short travel time (ETA ~{} min).",
            (eta / 60.0).round() as i64
        ));
    }

    if !required.is_empty() {
        let hits: Vec<&str> = required
            .iter()
            .filter(|r| best.place.specialties.contains(r))
            .map(String::as_str)
            .collect();
        if !hits.is_empty() {
            reasoning.push(format!("Specialty match: {}.", hits.join(", ")));
        } else {
            reasoning
                .push("Limited specialty match found nearby; consider calling ahead.".to_string());
        }
    }

    if let Some(capacity) = &best.place.capacity {
        reasoning.push(format!(
            "Capacity: {} ({}).",
            capacity.status.as_str().to_uppercase(),
            if capacity.accepting_patients {
                "accepting"
            } else {
                "not accepting"
            }
        ));
    } else if best.place.category == PlaceCategory::Hospital {
        reasoning.push("Capacity data not available for this hospital.".to_string());
    }

    reasoning
}
