//! Integration tests for the Recosanté adapter, against a mock HTTP server

use recosante::catalog;
use recosante::coordinator::{RefreshCoordinator, RefreshOutcome};
use recosante::location_resolver::{LocationInput, LocationResolver};
use recosante::models::{Location, Lookup};
use recosante::sensor::{self, Sensor};
use recosante::{GeoApiClient, RecosanteClient, RecosanteError};
use serde_json::json;
use std::process::Command;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TIMEOUT: Duration = Duration::from_secs(5);

/// Document used throughout: one ATMO detail for central Paris
fn paris_document() -> serde_json::Value {
    json!({
        "indice_atmo": {
            "indice": {"details": [{"label": "O3", "indice": {"value": 2}}]},
            "sources": [{"label": "ATMO"}],
            "validity": {"start": "2024-01-01", "end": "2024-01-02", "area": "Paris"}
        }
    })
}

fn paris() -> Location {
    Location::new("75101".to_string(), "Paris".to_string())
}

async fn mount_data(server: &MockServer, insee: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/v1/"))
        .and(query_param("insee", insee))
        .and(query_param("show_raep", "true"))
        .and(query_param("show_indice_uv", "true"))
        .respond_with(response)
        .mount(server)
        .await;
}

async fn mount_communes(server: &MockServer, postal_code: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/communes"))
        .and(query_param("codePostal", postal_code))
        .and(query_param("fields", "code,nom"))
        .respond_with(response)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_resolve_postal_code_success() {
    let mock_server = MockServer::start().await;
    mount_communes(
        &mock_server,
        "01250",
        ResponseTemplate::new(200).set_body_json(json!([
            {"code": "01250", "nom": "Saint-André"},
            {"code": "01001", "nom": "L'Abergement-Clémenciat"}
        ])),
    )
    .await;

    let geo = GeoApiClient::new(&mock_server.uri(), TIMEOUT).unwrap();
    let communes = geo.resolve_location("01250").await.unwrap();

    assert_eq!(communes.len(), 2);
    assert_eq!(communes[0].place_key(), "01250;Saint-André");

    let location = LocationResolver::resolve_location(
        &geo,
        LocationInput::PostalCode {
            postal_code: "01250".to_string(),
            commune: Some("01001".to_string()),
        },
    )
    .await
    .unwrap();
    assert_eq!(location.insee, "01001");
    assert_eq!(location.name, "L'Abergement-Clémenciat");
}

#[tokio::test]
async fn test_resolve_postal_code_with_no_commune_fails() {
    let mock_server = MockServer::start().await;
    mount_communes(&mock_server, "99999", ResponseTemplate::new(200).set_body_json(json!([]))).await;

    let geo = GeoApiClient::new(&mock_server.uri(), TIMEOUT).unwrap();
    let err = geo.resolve_location("99999").await.unwrap_err();

    assert!(matches!(err, RecosanteError::Resolution { .. }));
}

#[tokio::test]
async fn test_resolve_postal_code_non_ok_status_fails() {
    let mock_server = MockServer::start().await;
    mount_communes(&mock_server, "75001", ResponseTemplate::new(503)).await;

    let geo = GeoApiClient::new(&mock_server.uri(), TIMEOUT).unwrap();
    let err = geo.resolve_location("75001").await.unwrap_err();

    assert!(matches!(err, RecosanteError::Resolution { .. }));
    assert!(err.to_string().contains("503"));
}

#[tokio::test]
async fn test_get_data_success() {
    let mock_server = MockServer::start().await;
    mount_data(
        &mock_server,
        "75101",
        ResponseTemplate::new(200).set_body_json(paris_document()),
    )
    .await;

    let client = RecosanteClient::new(&mock_server.uri(), TIMEOUT).unwrap();
    let document = client.get_data("75101").await.unwrap();

    assert_eq!(
        document.value("indice_atmo", Some("details"), Some("O3")),
        Lookup::Found(&json!({"value": 2}))
    );
    assert_eq!(document.source("indice_atmo").as_deref(), Some("ATMO"));
    let window = document.forecast_window("indice_atmo");
    assert_eq!(window.start.as_deref(), Some("2024-01-01"));
    assert_eq!(window.end.as_deref(), Some("2024-01-02"));
    assert_eq!(document.validity("indice_atmo").as_deref(), Some("Paris"));
}

#[tokio::test]
async fn test_get_data_empty_object_is_not_an_error() {
    let mock_server = MockServer::start().await;
    mount_data(&mock_server, "75101", ResponseTemplate::new(200).set_body_json(json!({}))).await;

    let client = RecosanteClient::new(&mock_server.uri(), TIMEOUT).unwrap();
    let document = client.get_data("75101").await.unwrap();

    assert!(document.is_empty());
}

#[tokio::test]
async fn test_get_data_server_error() {
    let mock_server = MockServer::start().await;
    mount_data(&mock_server, "75101", ResponseTemplate::new(500)).await;

    let client = RecosanteClient::new(&mock_server.uri(), TIMEOUT).unwrap();
    let err = client.get_data("75101").await.unwrap_err();

    assert!(matches!(err, RecosanteError::Api { status: 500, .. }));
}

#[tokio::test]
async fn test_get_data_malformed_body() {
    let mock_server = MockServer::start().await;
    mount_data(
        &mock_server,
        "75101",
        ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"),
    )
    .await;

    let client = RecosanteClient::new(&mock_server.uri(), TIMEOUT).unwrap();
    let err = client.get_data("75101").await.unwrap_err();

    assert!(matches!(err, RecosanteError::Parse { .. }));
}

#[tokio::test]
async fn test_get_data_non_object_body() {
    let mock_server = MockServer::start().await;
    mount_data(&mock_server, "75101", ResponseTemplate::new(200).set_body_json(json!([1, 2]))).await;

    let client = RecosanteClient::new(&mock_server.uri(), TIMEOUT).unwrap();
    let err = client.get_data("75101").await.unwrap_err();

    assert!(matches!(err, RecosanteError::Parse { .. }));
}

#[tokio::test]
async fn test_end_to_end_readings_for_paris() {
    let mock_server = MockServer::start().await;
    mount_data(
        &mock_server,
        "75101",
        ResponseTemplate::new(200).set_body_json(paris_document()),
    )
    .await;

    let client = RecosanteClient::new(&mock_server.uri(), TIMEOUT).unwrap();
    let coordinator = RefreshCoordinator::new(client, paris());
    assert_eq!(coordinator.first_refresh().await.unwrap(), RefreshOutcome::Updated);

    let sensors = sensor::sensors_for(coordinator.location());
    let states = sensor::render_all(&sensors, &coordinator.snapshot());
    assert_eq!(states.len(), catalog::all().count());

    let o3 = states.iter().find(|state| state.key == "o3").unwrap();
    assert_eq!(o3.name, "Ozone - Paris");
    assert_eq!(o3.unique_id, "75101 - o3");
    assert_eq!(o3.value, Some(json!(2)));
    assert_eq!(o3.attributes.label, None);
    assert_eq!(o3.attributes.forecast_start.as_deref(), Some("2024-01-01"));
    assert_eq!(o3.attributes.forecast_end.as_deref(), Some("2024-01-02"));
    assert_eq!(o3.attributes.area_validity.as_deref(), Some("Paris"));
    assert_eq!(o3.attributes.attribution, "Recosanté - ATMO");

    // The summary reading resolves to the indice itself, which has no value
    let summary = states.iter().find(|state| state.key == "indice_atmo").unwrap();
    assert_eq!(summary.value, None);

    let available = states.iter().filter(|state| state.is_available()).count();
    assert_eq!(available, 1);
}

#[tokio::test]
async fn test_missing_array_falls_back_to_indice() {
    let mock_server = MockServer::start().await;
    mount_data(
        &mock_server,
        "33063",
        ResponseTemplate::new(200).set_body_json(json!({
            "indice_atmo": {"indice": {"value": 4, "label": "Mauvais"}}
        })),
    )
    .await;

    let client = RecosanteClient::new(&mock_server.uri(), TIMEOUT).unwrap();
    let document = client.get_data("33063").await.unwrap();
    let location = Location::new("33063".to_string(), "Bordeaux".to_string());
    let no2 = Sensor::new(catalog::find("no2").unwrap(), location).render(Some(&document));

    assert_eq!(no2.value, Some(json!(4)));
    assert_eq!(no2.attributes.label.as_deref(), Some("Mauvais"));
}

#[tokio::test]
async fn test_empty_refresh_keeps_previous_document() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(paris_document()))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    mount_data(&mock_server, "75101", ResponseTemplate::new(200).set_body_json(json!({}))).await;

    let client = RecosanteClient::new(&mock_server.uri(), TIMEOUT).unwrap();
    let coordinator = RefreshCoordinator::new(client, paris());

    assert_eq!(coordinator.refresh().await.unwrap(), RefreshOutcome::Updated);
    let before = coordinator.snapshot().unwrap();

    let outcome = coordinator.refresh().await.unwrap();
    assert!(matches!(outcome, RefreshOutcome::NoData(ref message) if message.contains("75101")));

    let after = coordinator.snapshot().unwrap();
    assert!(Arc::ptr_eq(&before, &after));
    assert!(!coordinator.status().last_update_success);
}

#[tokio::test]
async fn test_refresh_error_keeps_previous_document() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(paris_document()))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    mount_data(&mock_server, "75101", ResponseTemplate::new(502)).await;

    let client = RecosanteClient::new(&mock_server.uri(), TIMEOUT).unwrap();
    let coordinator = RefreshCoordinator::new(client, paris());

    coordinator.refresh().await.unwrap();
    assert!(coordinator.refresh().await.is_err());

    let sensors = sensor::sensors_for(coordinator.location());
    let states = sensor::render_all(&sensors, &coordinator.snapshot());
    let o3 = states.iter().find(|state| state.key == "o3").unwrap();
    assert_eq!(o3.value, Some(json!(2)));
    assert!(coordinator.status().last_error.unwrap().contains("502"));
}

#[tokio::test]
async fn test_get_data_connection_refused_is_network_error() {
    // Nothing listens on the discard port
    let client = RecosanteClient::new("http://127.0.0.1:9", TIMEOUT).unwrap();
    let err = client.get_data("75101").await.unwrap_err();

    match err {
        RecosanteError::Network { source } => assert!(source.is_connect()),
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn test_get_data_timeout_is_network_error() {
    let mock_server = MockServer::start().await;
    mount_data(
        &mock_server,
        "75101",
        ResponseTemplate::new(200)
            .set_body_json(paris_document())
            .set_delay(Duration::from_secs(5)),
    )
    .await;

    let client = RecosanteClient::new(&mock_server.uri(), Duration::from_millis(200)).unwrap();
    let err = client.get_data("75101").await.unwrap_err();

    match err {
        RecosanteError::Network { source } => assert!(source.is_timeout()),
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn test_refresh_timeout_keeps_previous_document() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(paris_document()))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    mount_data(
        &mock_server,
        "75101",
        ResponseTemplate::new(200)
            .set_body_json(json!({"indice_uv": {"indice": {"value": 9}}}))
            .set_delay(Duration::from_secs(5)),
    )
    .await;

    let client = RecosanteClient::new(&mock_server.uri(), Duration::from_millis(200)).unwrap();
    let coordinator = RefreshCoordinator::new(client, paris());

    assert_eq!(coordinator.refresh().await.unwrap(), RefreshOutcome::Updated);
    let before = coordinator.snapshot().unwrap();

    let err = coordinator.refresh().await.unwrap_err();
    assert!(matches!(err, RecosanteError::Network { .. }));

    let after = coordinator.snapshot().unwrap();
    assert!(Arc::ptr_eq(&before, &after));
    let status = coordinator.status();
    assert!(!status.last_update_success);
    assert!(status.last_error.unwrap().starts_with("Network error"));
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = Command::new(env!("CARGO_BIN_EXE_recosante"))
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Recosanté"));
    assert!(stdout.contains("resolve"));
    assert!(stdout.contains("watch"));
}

/// Test that an invalid postal code is rejected before any request
#[test]
fn test_cli_rejects_invalid_postal_code() {
    let output = Command::new(env!("CARGO_BIN_EXE_recosante"))
        .args(["--config", "/nonexistent/recosante.toml", "resolve", "12ab"])
        .env("RECOSANTE_API__GEO_BASE_URL", "http://127.0.0.1:9")
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid input"), "unexpected stderr: {stderr}");
}

/// Test the show command end to end, against the mock server
#[tokio::test(flavor = "multi_thread")]
async fn test_cli_show_json() {
    let mock_server = MockServer::start().await;
    mount_data(
        &mock_server,
        "75101",
        ResponseTemplate::new(200).set_body_json(paris_document()),
    )
    .await;

    let uri = mock_server.uri();
    let output = tokio::task::spawn_blocking(move || {
        Command::new(env!("CARGO_BIN_EXE_recosante"))
            .args([
                "--config",
                "/nonexistent/recosante.toml",
                "show",
                "--insee",
                "75101",
                "--city",
                "Paris",
                "--json",
            ])
            .env("RECOSANTE_API__BASE_URL", uri)
            .env_remove("RUST_LOG")
            .output()
            .expect("Failed to execute command")
    })
    .await
    .unwrap();

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let states: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let states = states.as_array().unwrap();
    assert_eq!(states.len(), catalog::all().count());

    let o3 = states.iter().find(|state| state["key"] == "o3").unwrap();
    assert_eq!(o3["value"], json!(2));
    assert_eq!(o3["attributes"]["attribution"], "Recosanté - ATMO");
}
