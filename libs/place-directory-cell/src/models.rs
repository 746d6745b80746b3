use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shared_models::Coordinates;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceCategory {
    Hospital,
    UrgentCare,
    PrimaryCare,
    Specialist,
    Pharmacy,
    Transit,
}

impl PlaceCategory {
    /// The categories a patient can actually be treated at; transit is
    /// directory-only and never part of a default search.
    pub fn clinical() -> Vec<PlaceCategory> {
        vec![
            PlaceCategory::Hospital,
            PlaceCategory::UrgentCare,
            PlaceCategory::PrimaryCare,
            PlaceCategory::Specialist,
            PlaceCategory::Pharmacy,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlaceCategory::Hospital => "hospital",
            PlaceCategory::UrgentCare => "urgent_care",
            PlaceCategory::PrimaryCare => "primary_care",
            PlaceCategory::Specialist => "specialist",
            PlaceCategory::Pharmacy => "pharmacy",
            PlaceCategory::Transit => "transit",
        }
    }
}

impl std::str::FromStr for PlaceCategory {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hospital" => Ok(PlaceCategory::Hospital),
            "urgent_care" => Ok(PlaceCategory::UrgentCare),
            "primary_care" => Ok(PlaceCategory::PrimaryCare),
            "specialist" => Ok(PlaceCategory::Specialist),
            "pharmacy" => Ok(PlaceCategory::Pharmacy),
            "transit" => Ok(PlaceCategory::Transit),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapacityStatus {
    Green,
    Yellow,
    Red,
}

impl CapacityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CapacityStatus::Green => "green",
            CapacityStatus::Yellow => "yellow",
            CapacityStatus::Red => "red",
        }
    }
}

/// Operational snapshot for a hospital, sourced from the curated seed table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capacity {
    pub status: CapacityStatus,
    pub beds_open: i32,
    pub accepting_patients: bool,
    pub updated_at: DateTime<Utc>,
}

/// A single care-seeking destination discovered from the geo provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Place {
    pub id: String,
    pub name: String,
    pub category: PlaceCategory,
    pub coordinates: Coordinates,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default)]
    pub specialties: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<Capacity>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodeResult {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

/// Lowercase, trim, drop empties, dedup keeping first occurrence order.
pub fn uniq_lower<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for v in values {
        let v = v.as_ref().trim().to_lowercase();
        if v.is_empty() {
            continue;
        }
        if seen.insert(v.clone()) {
            out.push(v);
        }
    }
    out
}

// Internal failure modes of the directory provider. These never escape the
// cell: the resolver degrades to an empty result instead.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("geo provider timed out")]
    Timeout,
    #[error("geo provider error: {0}")]
    Provider(String),
    #[error("malformed geo provider response: {0}")]
    Shape(String),
}

impl From<reqwest::Error> for DirectoryError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            DirectoryError::Timeout
        } else {
            DirectoryError::Provider(e.to_string())
        }
    }
}
