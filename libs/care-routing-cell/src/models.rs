use serde::{Deserialize, Serialize};

use place_directory_cell::models::Place;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Routine,
    Soon,
    Emergency,
}

/// What the triage subsystem says the patient needs. Every field is
/// defaulted so a bare `{}` body is a valid routine request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientNeeds {
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub required_specialties: Vec<String>,
    #[serde(default)]
    pub flags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complaint: Option<String>,
}

/// A place with its per-request scoring attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedPlace {
    #[serde(flatten)]
    pub place: Place,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_meters: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta_seconds: Option<f64>,
    pub specialty_match_score: f64,
    pub capacity_score: f64,
    pub composite_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub recommended_place: Option<RankedPlace>,
    pub ranked_places: Vec<RankedPlace>,
    pub reasoning: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecommendRequest {
    pub lat: f64,
    pub lng: f64,
    pub radius_m: Option<u32>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub patient_needs: PatientNeeds,
}
