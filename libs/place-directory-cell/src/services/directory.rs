use std::collections::{HashMap, HashSet};

use tracing::{debug, info, warn};

use shared_config::AppConfig;
use shared_models::Coordinates;

use crate::models::{uniq_lower, GeocodeResult, Place, PlaceCategory};
use crate::services::geocode::NominatimClient;
use crate::services::overpass::{OverpassClient, OverpassElement};

pub const MIN_RADIUS_METERS: u32 = 100;
pub const MAX_RADIUS_METERS: u32 = 50_000;

type TagMap = HashMap<String, String>;

/// Resolves category-filtered care destinations from the public geo
/// directory and normalizes them into canonical [`Place`] records.
pub struct PlaceDirectoryService {
    overpass: OverpassClient,
    geocoder: NominatimClient,
}

impl PlaceDirectoryService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            overpass: OverpassClient::new(config),
            geocoder: NominatimClient::new(config),
        }
    }

    /// Category-filtered radius search around `center`.
    ///
    /// Provider failures degrade to an empty list: a broken public geo
    /// source must never take the recommendation pipeline down with it.
    pub async fn nearby(
        &self,
        center: Coordinates,
        radius_m: u32,
        categories: &[PlaceCategory],
    ) -> Vec<Place> {
        let filters = filters_for_categories(categories);
        if filters.is_empty() {
            return Vec::new();
        }

        let radius = clamp_radius(radius_m);
        let query = build_query(&filters, radius, center);

        let elements = match self.overpass.query(&query).await {
            Ok(elements) => elements,
            Err(e) => {
                warn!("Nearby search degraded to empty result: {}", e);
                return Vec::new();
            }
        };

        let raw_count = elements.len();
        let places: Vec<Place> = elements
            .iter()
            .filter_map(|el| place_from_element(el, categories))
            .collect();
        let deduped = dedup_places(places);

        info!(
            "Resolved {} places from {} raw entities (radius {}m)",
            deduped.len(),
            raw_count,
            radius
        );
        deduped
    }

    /// Best-effort free-text geocoding; failures yield an empty list.
    pub async fn geocode(&self, query: &str, country: Option<&str>) -> Vec<GeocodeResult> {
        self.geocoder.search(query, country).await
    }
}

pub fn clamp_radius(radius_m: u32) -> u32 {
    radius_m.clamp(MIN_RADIUS_METERS, MAX_RADIUS_METERS)
}

/// Maps requested categories to Overpass filter predicates. Predicates
/// overlap on purpose (a generic clinic matches both urgent and primary
/// care); inference plus the requested-category check sorts that out later.
pub fn filters_for_categories(categories: &[PlaceCategory]) -> Vec<&'static str> {
    let want: HashSet<PlaceCategory> = categories.iter().copied().collect();
    let mut out = Vec::new();

    if want.contains(&PlaceCategory::Hospital) {
        out.push(r#"nwr["amenity"="hospital"]"#);
    }
    if want.contains(&PlaceCategory::UrgentCare) {
        out.push(r#"nwr["healthcare"="urgent_care"]"#);
        out.push(r#"nwr["amenity"="clinic"]["healthcare"="urgent_care"]"#);
    }
    if want.contains(&PlaceCategory::PrimaryCare) {
        out.push(r#"nwr["amenity"="clinic"]"#);
        out.push(r#"nwr["amenity"="doctors"]"#);
        out.push(r#"nwr["healthcare"="doctor"]"#);
        out.push(r#"nwr["healthcare"="clinic"]"#);
    }
    if want.contains(&PlaceCategory::Specialist) {
        out.push(r#"nwr["healthcare"="specialist"]"#);
        out.push(r#"nwr["healthcare:speciality"]"#);
        out.push(r#"nwr["healthcare:specialty"]"#);
    }
    if want.contains(&PlaceCategory::Pharmacy) {
        out.push(r#"nwr["amenity"="pharmacy"]"#);
    }
    if want.contains(&PlaceCategory::Transit) {
        out.push(r#"nwr["highway"="bus_stop"]"#);
        out.push(r#"nwr["railway"="station"]"#);
        out.push(r#"nwr["public_transport"="platform"]"#);
        out.push(r#"nwr["public_transport"="station"]"#);
    }

    out
}

fn build_query(filters: &[&str], radius: u32, center: Coordinates) -> String {
    let around = format!("(around:{},{},{})", radius, center.lat, center.lng);
    let body: String = filters
        .iter()
        .map(|f| format!("{}{};\n", f, around))
        .collect();
    format!("[out:json][timeout:15];\n(\n{});\nout center tags;", body)
}

fn tag<'a>(tags: &'a TagMap, key: &str) -> Option<&'a str> {
    tags.get(key).map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn tag_is(tags: &TagMap, key: &str, value: &str) -> bool {
    tag(tags, key).is_some_and(|v| v.eq_ignore_ascii_case(value))
}

fn speciality_tag<'a>(tags: &'a TagMap) -> Option<&'a str> {
    tag(tags, "healthcare:speciality").or_else(|| tag(tags, "healthcare:specialty"))
}

fn is_pharmacy(tags: &TagMap) -> bool {
    tag_is(tags, "amenity", "pharmacy")
}

fn is_hospital(tags: &TagMap) -> bool {
    tag_is(tags, "amenity", "hospital") || tag_is(tags, "emergency", "yes")
}

fn is_urgent_care(tags: &TagMap) -> bool {
    tag_is(tags, "healthcare", "urgent_care")
}

fn is_transit(tags: &TagMap) -> bool {
    tag_is(tags, "highway", "bus_stop")
        || tag_is(tags, "railway", "station")
        || tag_is(tags, "public_transport", "platform")
        || tag_is(tags, "public_transport", "station")
}

fn is_specialist(tags: &TagMap) -> bool {
    tag_is(tags, "healthcare", "specialist") || speciality_tag(tags).is_some()
}

fn is_clinic_or_doctor(tags: &TagMap) -> bool {
    tag_is(tags, "amenity", "clinic")
        || tag_is(tags, "amenity", "doctors")
        || tag_is(tags, "healthcare", "doctor")
        || tag_is(tags, "healthcare", "clinic")
}

/// Priority-ordered category decision table; evaluated top to bottom,
/// first match wins. Order matters: a pharmacy inside a hospital campus
/// is still a pharmacy, and an `emergency=yes` clinic counts as hospital.
const CATEGORY_RULES: &[(fn(&TagMap) -> bool, PlaceCategory)] = &[
    (is_pharmacy, PlaceCategory::Pharmacy),
    (is_hospital, PlaceCategory::Hospital),
    (is_urgent_care, PlaceCategory::UrgentCare),
    (is_transit, PlaceCategory::Transit),
    (is_specialist, PlaceCategory::Specialist),
    (is_clinic_or_doctor, PlaceCategory::PrimaryCare),
];

pub fn infer_category(tags: &TagMap) -> PlaceCategory {
    CATEGORY_RULES
        .iter()
        .find(|(matches, _)| matches(tags))
        .map(|(_, category)| *category)
        .unwrap_or(PlaceCategory::PrimaryCare)
}

fn build_address(tags: &TagMap) -> String {
    let structured: Vec<&str> = [
        "addr:housenumber",
        "addr:street",
        "addr:city",
        "addr:state",
        "addr:postcode",
    ]
    .iter()
    .filter_map(|k| tag(tags, k))
    .collect();

    let line = structured.join(" ");
    if !line.is_empty() {
        return line;
    }
    tag(tags, "addr:full")
        .or_else(|| tag(tags, "contact:address"))
        .unwrap_or("")
        .to_string()
}

fn parse_specialties(tags: &TagMap) -> Vec<String> {
    match speciality_tag(tags) {
        Some(raw) => uniq_lower(raw.split([';', ','])),
        None => Vec::new(),
    }
}

/// Normalizes one raw entity into a [`Place`], or drops it when it has no
/// usable coordinate or its inferred category was not requested (the
/// requested-category check undoes double counting from overlapping
/// filter predicates).
fn place_from_element(el: &OverpassElement, requested: &[PlaceCategory]) -> Option<Place> {
    let lat = el.lat.or_else(|| el.center.as_ref().map(|c| c.lat))?;
    let lng = el.lon.or_else(|| el.center.as_ref().map(|c| c.lon))?;
    let coordinates = Coordinates::new(lat, lng);
    if !coordinates.is_finite() {
        return None;
    }

    let tags = &el.tags;
    let category = infer_category(tags);
    if !requested.contains(&category) {
        debug!("Discarding entity with unrequested category {}", category.as_str());
        return None;
    }

    let name = tag(tags, "name").unwrap_or("Care option").to_string();
    let kind = el.kind.as_deref().unwrap_or("nwr");
    let entity = el
        .id
        .map(|id| id.to_string())
        .unwrap_or_else(|| name.clone());

    Some(Place {
        id: format!(
            "{}/{}-{}-{}",
            kind,
            entity,
            (lat * 1e5).round() as i64,
            (lng * 1e5).round() as i64
        ),
        name,
        category,
        coordinates,
        address: build_address(tags),
        phone: tag(tags, "phone")
            .or_else(|| tag(tags, "contact:phone"))
            .map(String::from),
        website: tag(tags, "website")
            .or_else(|| tag(tags, "contact:website"))
            .map(String::from),
        specialties: parse_specialties(tags),
        capacity: None,
    })
}

/// Collapses entities with the same category, case-insensitive name, and
/// coordinates within ~10m. First occurrence wins.
fn dedup_places(places: Vec<Place>) -> Vec<Place> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for p in places {
        let key = format!(
            "{}|{}|{}|{}",
            p.category.as_str(),
            p.name.to_lowercase(),
            (p.coordinates.lat * 1e4).round() as i64,
            (p.coordinates.lng * 1e4).round() as i64
        );
        if seen.insert(key) {
            out.push(p);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(pairs: &[(&str, &str)]) -> TagMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn place(name: &str, category: PlaceCategory, lat: f64, lng: f64) -> Place {
        Place {
            id: format!("node/{}-{}", name, lat),
            name: name.to_string(),
            category,
            coordinates: Coordinates::new(lat, lng),
            address: String::new(),
            phone: None,
            website: None,
            specialties: Vec::new(),
            capacity: None,
        }
    }

    #[test]
    fn radius_is_clamped_to_bounds() {
        assert_eq!(clamp_radius(0), MIN_RADIUS_METERS);
        assert_eq!(clamp_radius(99), MIN_RADIUS_METERS);
        assert_eq!(clamp_radius(100), 100);
        assert_eq!(clamp_radius(8_000), 8_000);
        assert_eq!(clamp_radius(50_000), 50_000);
        assert_eq!(clamp_radius(1_000_000), MAX_RADIUS_METERS);
    }

    #[test]
    fn pharmacy_tag_outranks_hospital_tag() {
        let t = tags(&[("amenity", "pharmacy"), ("emergency", "yes")]);
        assert_eq!(infer_category(&t), PlaceCategory::Pharmacy);
    }

    #[test]
    fn emergency_tag_implies_hospital() {
        let t = tags(&[("emergency", "yes"), ("healthcare", "clinic")]);
        assert_eq!(infer_category(&t), PlaceCategory::Hospital);
    }

    #[test]
    fn urgent_care_outranks_clinic() {
        let t = tags(&[("amenity", "clinic"), ("healthcare", "urgent_care")]);
        assert_eq!(infer_category(&t), PlaceCategory::UrgentCare);
    }

    #[test]
    fn speciality_tag_implies_specialist() {
        let t = tags(&[("healthcare:speciality", "dermatology"), ("amenity", "clinic")]);
        assert_eq!(infer_category(&t), PlaceCategory::Specialist);
    }

    #[test]
    fn transit_tags_map_to_transit() {
        assert_eq!(
            infer_category(&tags(&[("highway", "bus_stop")])),
            PlaceCategory::Transit
        );
        assert_eq!(
            infer_category(&tags(&[("public_transport", "platform")])),
            PlaceCategory::Transit
        );
    }

    #[test]
    fn untagged_entity_defaults_to_primary_care() {
        assert_eq!(infer_category(&tags(&[])), PlaceCategory::PrimaryCare);
    }

    #[test]
    fn address_prefers_structured_components() {
        let t = tags(&[
            ("addr:housenumber", "200"),
            ("addr:street", "Lothrop St"),
            ("addr:city", "Pittsburgh"),
            ("addr:state", "PA"),
            ("addr:postcode", "15213"),
            ("addr:full", "ignored"),
        ]);
        assert_eq!(build_address(&t), "200 Lothrop St Pittsburgh PA 15213");
    }

    #[test]
    fn address_falls_back_to_freeform() {
        let t = tags(&[("addr:full", "200 Lothrop St, Pittsburgh PA")]);
        assert_eq!(build_address(&t), "200 Lothrop St, Pittsburgh PA");
        assert_eq!(build_address(&tags(&[])), "");
    }

    #[test]
    fn specialties_split_lowercase_dedup() {
        let t = tags(&[("healthcare:speciality", "Cardiology; Neurology,cardiology; ")]);
        assert_eq!(parse_specialties(&t), vec!["cardiology", "neurology"]);
    }

    #[test]
    fn overlapping_predicates_for_urgent_and_primary() {
        let filters =
            filters_for_categories(&[PlaceCategory::UrgentCare, PlaceCategory::PrimaryCare]);
        // Both map onto the generic clinic predicate family.
        assert!(filters.contains(&r#"nwr["amenity"="clinic"]"#));
        assert!(filters.contains(&r#"nwr["healthcare"="urgent_care"]"#));
    }

    #[test]
    fn no_categories_means_no_filters() {
        assert!(filters_for_categories(&[]).is_empty());
    }

    #[test]
    fn dedup_collapses_nearby_same_name_same_category() {
        let a = place("UPMC Mercy", PlaceCategory::Hospital, 40.43650, -79.98810);
        // ~5m away, different case: same facility seen through two predicates.
        let b = place("upmc mercy", PlaceCategory::Hospital, 40.43653, -79.98812);
        let c = place("UPMC Mercy", PlaceCategory::Pharmacy, 40.43650, -79.98810);
        let out = dedup_places(vec![a, b, c]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].name, "UPMC Mercy");
        assert_eq!(out[0].category, PlaceCategory::Hospital);
    }

    #[test]
    fn query_contains_all_filters_and_radius() {
        let filters = filters_for_categories(&[PlaceCategory::Hospital]);
        let q = build_query(&filters, 5_000, Coordinates::new(40.44, -79.99));
        assert!(q.starts_with("[out:json][timeout:15];"));
        assert!(q.contains(r#"nwr["amenity"="hospital"](around:5000,40.44,-79.99);"#));
        assert!(q.ends_with("out center tags;"));
    }
}
