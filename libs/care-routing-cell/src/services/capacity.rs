use std::collections::HashMap;

use chrono::Utc;
use tracing::debug;

use place_directory_cell::models::{
    uniq_lower, Capacity, CapacityStatus, Place, PlaceCategory,
};

/// Curated capacity/specialty record for one hospital. Built once at
/// startup, immutable for the process lifetime. Stands in for a real
/// hospital capacity feed.
#[derive(Debug, Clone)]
pub struct HospitalSeed {
    pub id: String,
    pub name: String,
    pub specialties: Vec<String>,
    pub capacity: Capacity,
    pub phone: Option<String>,
    pub website: Option<String>,
}

/// In-memory seed table with exact-then-fuzzy name lookup.
pub struct CapacityTable {
    seeds: Vec<HospitalSeed>,
    index: HashMap<String, usize>,
}

impl CapacityTable {
    pub fn new() -> Self {
        Self::with_seeds(default_seeds())
    }

    pub fn with_seeds(seeds: Vec<HospitalSeed>) -> Self {
        let index = seeds
            .iter()
            .enumerate()
            .map(|(i, s)| (normalize_name(&s.name), i))
            .collect();
        Self { seeds, index }
    }

    /// Exact normalized-name match first; otherwise bidirectional substring
    /// containment, checked in fixed table order. First match wins even if
    /// a later seed would match more precisely: changing that policy would
    /// change observable ranking behavior.
    pub fn lookup(&self, name: &str) -> Option<&HospitalSeed> {
        let n = normalize_name(name);
        if n.is_empty() {
            return None;
        }
        if let Some(&i) = self.index.get(&n) {
            return Some(&self.seeds[i]);
        }
        self.seeds.iter().find(|s| {
            let sn = normalize_name(&s.name);
            n.contains(&sn) || sn.contains(&n)
        })
    }

    /// Attaches seed capacity and specialties to a hospital record. The
    /// seed never overwrites contact data the directory already has; a
    /// lookup miss leaves the record untouched (capacity-neutral).
    pub fn enrich(&self, place: &mut Place) {
        if place.category != PlaceCategory::Hospital {
            return;
        }
        let Some(seed) = self.lookup(&place.name) else {
            return;
        };
        debug!("Enriching hospital {:?} from seed {}", place.name, seed.id);

        place.capacity = Some(seed.capacity.clone());
        place.specialties = uniq_lower(
            place
                .specialties
                .iter()
                .map(String::as_str)
                .chain(seed.specialties.iter().map(String::as_str)),
        );
        if place.phone.is_none() {
            place.phone = seed.phone.clone();
        }
        if place.website.is_none() {
            place.website = seed.website.clone();
        }
    }
}

impl Default for CapacityTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Lowercase, expand `&`, strip punctuation, collapse whitespace; makes
/// directory names comparable with curated ones.
pub fn normalize_name(name: &str) -> String {
    let expanded = name.to_lowercase().replace('&', " and ");
    let cleaned: String = expanded
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == ' ' { c } else { ' ' })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn capacity_score(status: CapacityStatus, accepting_patients: bool) -> f64 {
    if !accepting_patients {
        return 0.05;
    }
    match status {
        CapacityStatus::Green => 1.0,
        CapacityStatus::Yellow => 0.6,
        CapacityStatus::Red => 0.2,
    }
}

fn seed(
    id: &str,
    name: &str,
    specialties: &[&str],
    status: CapacityStatus,
    beds_open: i32,
    accepting_patients: bool,
    website: &str,
) -> HospitalSeed {
    HospitalSeed {
        id: id.to_string(),
        name: name.to_string(),
        specialties: specialties.iter().map(|s| s.to_string()).collect(),
        capacity: Capacity {
            status,
            beds_open,
            accepting_patients,
            updated_at: Utc::now(),
        },
        phone: None,
        website: Some(website.to_string()),
    }
}

// Demo capacity/specialty table seeded for Pittsburgh. Real capacity data
// requires hospital feeds.
fn default_seeds() -> Vec<HospitalSeed> {
    vec![
        seed(
            "upmc-presbyterian",
            "UPMC Presbyterian",
            &["emergency", "cardiology", "orthopedics", "neurology", "pulmonology", "gastroenterology"],
            CapacityStatus::Yellow,
            12,
            true,
            "https://www.upmc.com/locations/hospitals/presbyterian",
        ),
        seed(
            "upmc-mercy",
            "UPMC Mercy",
            &["emergency", "cardiology", "neurology", "orthopedics"],
            CapacityStatus::Green,
            24,
            true,
            "https://www.upmc.com/locations/hospitals/mercy",
        ),
        seed(
            "allegheny-general",
            "Allegheny General Hospital",
            &["emergency", "cardiology", "orthopedics", "neurology"],
            CapacityStatus::Red,
            3,
            false,
            "https://www.ahn.org/locations/hospitals/allegheny-general",
        ),
        seed(
            "upmc-shadyside",
            "UPMC Shadyside",
            &["emergency", "cardiology", "dermatology", "gastroenterology", "pulmonology"],
            CapacityStatus::Yellow,
            9,
            true,
            "https://www.upmc.com/locations/hospitals/shadyside",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_models::Coordinates;

    fn hospital(name: &str) -> Place {
        Place {
            id: format!("way/{}", name),
            name: name.to_string(),
            category: PlaceCategory::Hospital,
            coordinates: Coordinates::new(40.44, -79.99),
            address: String::new(),
            phone: None,
            website: None,
            specialties: Vec::new(),
            capacity: None,
        }
    }

    #[test]
    fn normalization_handles_ampersand_and_punctuation() {
        assert_eq!(normalize_name("St. Mary's  Hospital & Clinic"), "st mary s hospital and clinic");
        assert_eq!(normalize_name("UPMC Mercy"), "upmc mercy");
        assert_eq!(normalize_name("  "), "");
    }

    #[test]
    fn exact_normalized_match() {
        let table = CapacityTable::new();
        let seed = table.lookup("upmc MERCY").expect("exact match");
        assert_eq!(seed.id, "upmc-mercy");
    }

    #[test]
    fn fuzzy_match_is_bidirectional() {
        let table = CapacityTable::new();
        // Directory name longer than the seed name.
        let seed = table.lookup("UPMC Mercy Hospital Campus").expect("contains seed");
        assert_eq!(seed.id, "upmc-mercy");
        // Directory name shorter than the seed name.
        let seed = table.lookup("Allegheny General").expect("seed contains name");
        assert_eq!(seed.id, "allegheny-general");
    }

    #[test]
    fn fuzzy_match_takes_first_seed_in_table_order() {
        let table = CapacityTable::new();
        // "UPMC" is contained in every UPMC seed name; the first seed wins.
        let seed = table.lookup("UPMC").expect("fuzzy match");
        assert_eq!(seed.id, "upmc-presbyterian");
    }

    #[test]
    fn unknown_name_is_a_neutral_miss() {
        let table = CapacityTable::new();
        assert!(table.lookup("Mount Sinai").is_none());
        assert!(table.lookup("").is_none());
    }

    #[test]
    fn capacity_score_policy() {
        assert_eq!(capacity_score(CapacityStatus::Red, false), 0.05);
        assert_eq!(capacity_score(CapacityStatus::Green, false), 0.05);
        assert_eq!(capacity_score(CapacityStatus::Green, true), 1.0);
        assert_eq!(capacity_score(CapacityStatus::Yellow, true), 0.6);
        assert_eq!(capacity_score(CapacityStatus::Red, true), 0.2);
    }

    #[test]
    fn enrich_unions_specialties_and_fills_missing_contacts() {
        let table = CapacityTable::new();
        let mut place = hospital("UPMC Shadyside");
        place.specialties = vec!["dermatology".to_string(), "oncology".to_string()];
        place.phone = Some("+1-412-555-0100".to_string());

        table.enrich(&mut place);

        let capacity = place.capacity.expect("capacity copied from seed");
        assert_eq!(capacity.status, CapacityStatus::Yellow);
        assert!(capacity.accepting_patients);
        // Candidate specialties come first, seed fills in the rest, no dups.
        assert_eq!(place.specialties[0], "dermatology");
        assert!(place.specialties.contains(&"oncology".to_string()));
        assert!(place.specialties.contains(&"emergency".to_string()));
        assert_eq!(
            place.specialties.iter().filter(|s| *s == "dermatology").count(),
            1
        );
        // Existing phone is kept; missing website is filled from the seed.
        assert_eq!(place.phone.as_deref(), Some("+1-412-555-0100"));
        assert!(place.website.as_deref().unwrap().contains("shadyside"));
    }

    #[test]
    fn enrich_skips_non_hospitals_and_misses() {
        let table = CapacityTable::new();

        let mut pharmacy = hospital("UPMC Mercy");
        pharmacy.category = PlaceCategory::Pharmacy;
        table.enrich(&mut pharmacy);
        assert!(pharmacy.capacity.is_none());

        let mut unknown = hospital("Mount Sinai");
        table.enrich(&mut unknown);
        assert!(unknown.capacity.is_none());
        assert!(unknown.specialties.is_empty());
    }
}
