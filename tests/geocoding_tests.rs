mod common;

use common::{ScriptedProvider, found};
use axum::response::IntoResponse;
use mapboard::{
    AppError, GeocodingService,
    geo::Coordinates,
    geocoding::{
        AddressKind, GeocodeFailure, ProviderError, classify_provider_message, normalize_address,
        parse_address_response, parse_coordinate_response,
    },
};
use std::sync::Arc;

fn service(provider: Arc<ScriptedProvider>) -> GeocodingService {
    GeocodingService::new(provider)
}

// --- Normalization ---

#[test]
fn test_normalize_collapses_whitespace() {
    assert_eq!(
        normalize_address("  대구   중구\t동성로 12  "),
        "대구 중구 동성로 12"
    );
}

#[test]
fn test_normalize_strips_unit_suffix() {
    assert_eq!(normalize_address("대구 중구 동성로 12-3호"), "대구 중구 동성로 12");
    assert_eq!(normalize_address("대구 중구 동성로 12 - 101 호 상가"), "대구 중구 동성로 12");
    assert_eq!(normalize_address("대구 북구 산격동 5-2층"), "대구 북구 산격동 5");
}

#[test]
fn test_normalize_keeps_lot_numbers() {
    assert_eq!(normalize_address("대구 중구 삼덕동1가 123-45"), "대구 중구 삼덕동1가 123-45");
}

#[test]
fn test_normalize_separates_road_suffix_from_number() {
    assert_eq!(normalize_address("대구 중구 동성로12"), "대구 중구 동성로 12");
    assert_eq!(normalize_address("서울 중앙대로81길5"), "서울 중앙대로 81길 5");
    assert_eq!(normalize_address("서울 중앙대로1길5"), "서울 중앙대로 1길 5");
    assert_eq!(normalize_address("대구 중구 동성로2길3"), "대구 중구 동성로 2길 3");
}

#[test]
fn test_normalize_is_idempotent() {
    let inputs = [
        "대구 중구 동성로12-3호",
        "  서울   중앙대로81길5  ",
        "대구 중구 삼덕동1가 123-45",
        "",
        "동성로 12 - 101 호 상가 2층",
        "서울 중앙대로1길5",
        "대구 중구 동성로2길3",
    ];
    for input in inputs {
        let once = normalize_address(input);
        assert_eq!(normalize_address(&once), once, "input: {input:?}");
    }
}

// --- Classification ---

#[tokio::test]
async fn test_failure_response_carries_display_text() {
    for failure in [
        GeocodeFailure::InvalidCredentials,
        GeocodeFailure::DomainMismatch,
        GeocodeFailure::InsufficientDetail,
        GeocodeFailure::NoResults,
        GeocodeFailure::Unavailable,
    ] {
        let response = AppError::from(failure).into_response();
        assert_eq!(response.status(), failure.status());
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], failure.to_string());
    }
}

#[test]
fn test_classify_provider_messages() {
    assert_eq!(classify_provider_message("INVALID_KEY: bad"), GeocodeFailure::InvalidCredentials);
    assert_eq!(classify_provider_message("UNAVAILABLE_KEY"), GeocodeFailure::InvalidCredentials);
    assert_eq!(classify_provider_message("INCORRECT_KEY: x"), GeocodeFailure::DomainMismatch);
    assert_eq!(classify_provider_message("INVALID_DOMAIN"), GeocodeFailure::DomainMismatch);
    assert_eq!(classify_provider_message("PARAM_REQUIRED: address"), GeocodeFailure::InsufficientDetail);
    assert_eq!(classify_provider_message("INVALID_RANGE"), GeocodeFailure::InsufficientDetail);
    assert_eq!(classify_provider_message("NOT_FOUND"), GeocodeFailure::NoResults);
    assert_eq!(classify_provider_message("SYSTEM_ERROR: boom"), GeocodeFailure::Unavailable);
}

#[test]
fn test_transport_and_decode_errors_are_unavailable() {
    assert_eq!(
        ProviderError::Transport("timed out".into()).classify(),
        GeocodeFailure::Unavailable
    );
    assert_eq!(
        ProviderError::Decode("eof".into()).classify(),
        GeocodeFailure::Unavailable
    );
}

// --- Strategy chain ---

#[tokio::test]
async fn test_geocode_road_hit_skips_parcel() {
    let provider = Arc::new(ScriptedProvider {
        road: Some(found(35.87, 128.60, "대구광역시 중구 동성로 12")),
        ..ScriptedProvider::default()
    });

    let result = service(provider.clone()).geocode("동성로12").await.unwrap();
    assert_eq!(result.coordinates, Coordinates::new(35.87, 128.60));
    assert_eq!(provider.calls(), vec![AddressKind::Road]);
}

#[tokio::test]
async fn test_geocode_falls_back_to_parcel() {
    let provider = Arc::new(ScriptedProvider {
        road: Some(Ok(None)),
        parcel: Some(found(35.86, 128.59, "대구광역시 중구 삼덕동1가 123-45")),
        ..ScriptedProvider::default()
    });

    let result = service(provider.clone()).geocode("삼덕동1가 123-45").await.unwrap();
    assert_eq!(result.address, "대구광역시 중구 삼덕동1가 123-45");
    assert_eq!(provider.calls(), vec![AddressKind::Road, AddressKind::Parcel]);
}

#[tokio::test]
async fn test_geocode_falls_back_after_road_error() {
    let provider = Arc::new(ScriptedProvider {
        road: Some(Err(ProviderError::Rejected("SYSTEM_ERROR".into()))),
        parcel: Some(found(35.86, 128.59, "somewhere")),
        ..ScriptedProvider::default()
    });

    assert!(service(provider).geocode("somewhere 1").await.is_ok());
}

#[tokio::test]
async fn test_geocode_nothing_found_is_no_results() {
    let provider = Arc::new(ScriptedProvider::default());
    let result = service(provider).geocode("nowhere 1").await;
    assert_eq!(result, Err(GeocodeFailure::NoResults));
}

#[tokio::test]
async fn test_geocode_classifies_last_provider_error() {
    let provider = Arc::new(ScriptedProvider {
        road: Some(Err(ProviderError::Rejected("INVALID_KEY: expired".into()))),
        parcel: Some(Err(ProviderError::Rejected("INCORRECT_KEY: wrong domain".into()))),
        ..ScriptedProvider::default()
    });

    let result = service(provider).geocode("동성로 12").await;
    assert_eq!(result, Err(GeocodeFailure::DomainMismatch));
}

#[tokio::test]
async fn test_geocode_blank_input_is_insufficient_detail() {
    let provider = Arc::new(ScriptedProvider::default());
    let result = service(provider.clone()).geocode("   ").await;

    assert_eq!(result, Err(GeocodeFailure::InsufficientDetail));
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn test_reverse_geocode_normalizes_first_result() {
    let provider = Arc::new(ScriptedProvider {
        reverse: Some(Ok(Some("대구광역시  중구 동성로12".to_string()))),
        ..ScriptedProvider::default()
    });

    let address = service(provider)
        .reverse_geocode(Coordinates::new(35.87, 128.60))
        .await
        .unwrap();
    assert_eq!(address, "대구광역시 중구 동성로 12");
}

#[tokio::test]
async fn test_reverse_geocode_failures() {
    let empty = Arc::new(ScriptedProvider::default());
    assert_eq!(
        service(empty).reverse_geocode(Coordinates::new(0.0, 0.0)).await,
        Err(GeocodeFailure::NoResults)
    );

    let down = Arc::new(ScriptedProvider {
        reverse: Some(Err(ProviderError::Transport("connection refused".into()))),
        ..ScriptedProvider::default()
    });
    assert_eq!(
        service(down).reverse_geocode(Coordinates::new(0.0, 0.0)).await,
        Err(GeocodeFailure::Unavailable)
    );
}

// --- VWorld response parsing ---

#[test]
fn test_parse_coordinate_response_ok() {
    let body = r#"{"response":{"status":"OK",
        "refined":{"text":"대구광역시 중구 동성로 12"},
        "result":{"crs":"EPSG:4326","point":{"x":"128.5975","y":"35.8691"}}}}"#;

    let found = parse_coordinate_response(body, "동성로 12").unwrap().unwrap();
    assert_eq!(found.coordinates, Coordinates::new(35.8691, 128.5975));
    assert_eq!(found.address, "대구광역시 중구 동성로 12");
}

#[test]
fn test_parse_coordinate_response_numeric_point_without_refined() {
    let body = r#"{"response":{"status":"OK","result":{"point":{"x":128.5,"y":35.5}}}}"#;

    let found = parse_coordinate_response(body, "requested text").unwrap().unwrap();
    assert_eq!(found.coordinates, Coordinates::new(35.5, 128.5));
    assert_eq!(found.address, "requested text");
}

#[test]
fn test_parse_coordinate_response_not_found_and_error() {
    let not_found = r#"{"response":{"status":"NOT_FOUND"}}"#;
    assert_eq!(parse_coordinate_response(not_found, "x").unwrap(), None);

    let error = r#"{"response":{"status":"ERROR","error":{"code":"INVALID_KEY","text":"key expired"}}}"#;
    let err = parse_coordinate_response(error, "x").unwrap_err();
    assert_eq!(err.classify(), GeocodeFailure::InvalidCredentials);

    let garbage = "<html>gateway timeout</html>";
    assert!(matches!(
        parse_coordinate_response(garbage, "x"),
        Err(ProviderError::Decode(_))
    ));
}

#[test]
fn test_parse_address_response_takes_first_result() {
    let body = r#"{"response":{"status":"OK","result":[
        {"type":"road","text":"대구광역시 중구 동성로 12"},
        {"type":"parcel","text":"대구광역시 중구 삼덕동1가 1"}]}}"#;

    assert_eq!(
        parse_address_response(body).unwrap().as_deref(),
        Some("대구광역시 중구 동성로 12")
    );
}
