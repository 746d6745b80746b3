use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::json;
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use place_directory_cell::models::PlaceCategory;
use place_directory_cell::router::place_routes;
use place_directory_cell::services::directory::PlaceDirectoryService;
use shared_config::AppConfig;
use shared_models::Coordinates;

fn test_config(mock_server: &MockServer) -> AppConfig {
    AppConfig {
        overpass_base_url: format!("{}/api/interpreter", mock_server.uri()),
        geocoder_base_url: mock_server.uri(),
        ..AppConfig::default()
    }
}

fn test_app(config: &AppConfig) -> Router {
    place_routes(Arc::new(PlaceDirectoryService::new(config)))
}

fn overpass_body() -> serde_json::Value {
    json!({
        "elements": [
            {
                "type": "way",
                "id": 11111,
                "center": { "lat": 40.44150, "lon": -79.96080 },
                "tags": {
                    "amenity": "hospital",
                    "name": "UPMC Presbyterian",
                    "phone": "+1-412-647-2345",
                    "addr:housenumber": "200",
                    "addr:street": "Lothrop St",
                    "addr:city": "Pittsburgh"
                }
            },
            // Same hospital seen as a node through another predicate, ~5m off.
            {
                "type": "node",
                "id": 22222,
                "lat": 40.44153,
                "lon": -79.96082,
                "tags": { "amenity": "hospital", "name": "upmc presbyterian" }
            },
            {
                "type": "node",
                "id": 33333,
                "lat": 40.45000,
                "lon": -79.95000,
                "tags": {
                    "amenity": "clinic",
                    "name": "Oakland Walk-In Clinic",
                    "healthcare:speciality": "Dermatology; Allergology"
                }
            },
            // No coordinate at all: dropped.
            {
                "type": "relation",
                "id": 44444,
                "tags": { "amenity": "hospital", "name": "Ghost Hospital" }
            }
        ]
    })
}

#[tokio::test]
async fn nearby_normalizes_and_dedups() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/interpreter"))
        .respond_with(ResponseTemplate::new(200).set_body_json(overpass_body()))
        .mount(&mock_server)
        .await;

    let service = PlaceDirectoryService::new(&test_config(&mock_server));
    let places = service
        .nearby(
            Coordinates::new(40.4406, -79.9959),
            8_000,
            &[PlaceCategory::Hospital, PlaceCategory::Specialist],
        )
        .await;

    // Two hospital entities collapse to one; the clinic is inferred as
    // specialist (speciality tag) and kept; the ghost entity is dropped.
    assert_eq!(places.len(), 2);

    let hospital = &places[0];
    assert_eq!(hospital.category, PlaceCategory::Hospital);
    assert_eq!(hospital.name, "UPMC Presbyterian");
    assert_eq!(hospital.address, "200 Lothrop St Pittsburgh");
    assert_eq!(hospital.phone.as_deref(), Some("+1-412-647-2345"));
    assert!(hospital.id.starts_with("way/11111-"));
    assert!(hospital.capacity.is_none());

    let specialist = &places[1];
    assert_eq!(specialist.category, PlaceCategory::Specialist);
    assert_eq!(specialist.specialties, vec!["dermatology", "allergology"]);
}

#[tokio::test]
async fn unrequested_inferred_categories_are_discarded() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/interpreter"))
        .respond_with(ResponseTemplate::new(200).set_body_json(overpass_body()))
        .mount(&mock_server)
        .await;

    let service = PlaceDirectoryService::new(&test_config(&mock_server));
    let places = service
        .nearby(
            Coordinates::new(40.4406, -79.9959),
            8_000,
            &[PlaceCategory::Hospital],
        )
        .await;

    assert_eq!(places.len(), 1);
    assert!(places.iter().all(|p| p.category == PlaceCategory::Hospital));
}

#[tokio::test]
async fn provider_error_degrades_to_empty_list() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/interpreter"))
        .respond_with(ResponseTemplate::new(504).set_body_string("Gateway Timeout"))
        .mount(&mock_server)
        .await;

    let service = PlaceDirectoryService::new(&test_config(&mock_server));
    let places = service
        .nearby(
            Coordinates::new(40.4406, -79.9959),
            8_000,
            &[PlaceCategory::Hospital],
        )
        .await;

    assert!(places.is_empty());
}

#[tokio::test]
async fn malformed_provider_body_degrades_to_empty_list() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/interpreter"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>busy</html>"))
        .mount(&mock_server)
        .await;

    let service = PlaceDirectoryService::new(&test_config(&mock_server));
    let places = service
        .nearby(
            Coordinates::new(40.4406, -79.9959),
            8_000,
            &[PlaceCategory::Hospital],
        )
        .await;

    assert!(places.is_empty());
}

#[tokio::test]
async fn no_requested_categories_skips_the_provider() {
    // No mock mounted: a request would fail loudly, an empty category set
    // must short-circuit before any network call.
    let mock_server = MockServer::start().await;
    let service = PlaceDirectoryService::new(&test_config(&mock_server));
    let places = service
        .nearby(Coordinates::new(40.4406, -79.9959), 8_000, &[])
        .await;
    assert!(places.is_empty());
}

#[tokio::test]
async fn nearby_endpoint_returns_places_json() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/interpreter"))
        .respond_with(ResponseTemplate::new(200).set_body_json(overpass_body()))
        .mount(&mock_server)
        .await;

    let app = test_app(&test_config(&mock_server));
    let request = Request::builder()
        .method("GET")
        .uri("/nearby?lat=40.4406&lng=-79.9959&radius_m=8000&categories=hospital")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json_response: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let places = json_response["places"].as_array().unwrap();
    assert_eq!(places.len(), 1);
    assert_eq!(places[0]["category"], "hospital");
}

#[tokio::test]
async fn nearby_endpoint_requires_coordinates() {
    let mock_server = MockServer::start().await;
    let app = test_app(&test_config(&mock_server));

    let request = Request::builder()
        .method("GET")
        .uri("/nearby?lat=40.4406")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn geocode_endpoint_parses_string_coordinates() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "pittsburgh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "display_name": "Pittsburgh, PA", "lat": "40.4406", "lon": "-79.9959" },
            { "display_name": "bad row", "lat": "not-a-number", "lon": "-79.9" }
        ])))
        .mount(&mock_server)
        .await;

    let app = test_app(&test_config(&mock_server));
    let request = Request::builder()
        .method("GET")
        .uri("/geocode?q=pittsburgh")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json_response: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let results = json_response["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["name"], "Pittsburgh, PA");
    assert_eq!(results[0]["lat"], 40.4406);
}

#[tokio::test]
async fn geocode_failure_yields_empty_results() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let service = PlaceDirectoryService::new(&test_config(&mock_server));
    let results = service.geocode("pittsburgh", None).await;
    assert!(results.is_empty());
}
