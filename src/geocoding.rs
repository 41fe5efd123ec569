//! Address ⇄ coordinate conversion.
//!
//! `GeocodingService` owns the provider-independent logic: input normalization,
//! the ordered address-type strategies and the mapping of provider errors to a
//! fixed set of user-facing failures. `VWorldClient` is the HTTP provider.

use async_trait::async_trait;
use axum::http::StatusCode;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::{
    fmt,
    sync::{Arc, LazyLock},
    time::Duration,
};

use crate::geo::Coordinates;

// --- Normalization ---

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

// `12-3호`, `12 - 101 호 상가`, `5-2층`: a dash after a numeric block introducing a unit.
static UNIT_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)\s*-\s*\d+\s*(?:호|층).*$").expect("unit suffix pattern is valid")
});

// `동성로12` -> `동성로 12`, `중앙대로1길5` -> `중앙대로 1길 5`.
static ROAD_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(로|길)(\d)").expect("road number pattern is valid"));

/// normalize_address
///
/// Collapses whitespace, strips a trailing unit/sub-address introduced by a dash
/// after a numeric block, and separates a road-type suffix (`로`, `길`) from a
/// directly following building number. Lot numbers such as `123-45` are kept.
/// Applying it twice yields the same string as applying it once.
pub fn normalize_address(raw: &str) -> String {
    let collapsed = WHITESPACE.replace_all(raw.trim(), " ");
    let without_unit = UNIT_SUFFIX.replace(&collapsed, "$1");
    let spaced = ROAD_NUMBER.replace_all(&without_unit, "$1 $2");
    WHITESPACE.replace_all(spaced.trim(), " ").into_owned()
}

// --- Failures ---

/// GeocodeFailure
///
/// The user-facing failure categories. Provider specifics never reach clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GeocodeFailure {
    #[error("the geocoding API key is invalid")]
    InvalidCredentials,
    #[error("the geocoding API key is not registered for this site's URL")]
    DomainMismatch,
    #[error("the address is not detailed enough; include the street and building number")]
    InsufficientDetail,
    #[error("no results found for the address")]
    NoResults,
    #[error("address lookup failed")]
    Unavailable,
}

impl GeocodeFailure {
    pub fn status(&self) -> StatusCode {
        match self {
            GeocodeFailure::InsufficientDetail => StatusCode::BAD_REQUEST,
            GeocodeFailure::NoResults => StatusCode::NOT_FOUND,
            GeocodeFailure::InvalidCredentials
            | GeocodeFailure::DomainMismatch
            | GeocodeFailure::Unavailable => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Known provider error substrings, checked in order; first match wins.
const ERROR_CATEGORIES: &[(&str, GeocodeFailure)] = &[
    ("INVALID_KEY", GeocodeFailure::InvalidCredentials),
    ("UNAVAILABLE_KEY", GeocodeFailure::InvalidCredentials),
    ("INCORRECT_KEY", GeocodeFailure::DomainMismatch),
    ("INVALID_DOMAIN", GeocodeFailure::DomainMismatch),
    ("PARAM_REQUIRED", GeocodeFailure::InsufficientDetail),
    ("INVALID_RANGE", GeocodeFailure::InsufficientDetail),
    ("NOT_FOUND", GeocodeFailure::NoResults),
];

/// Maps a provider error message to exactly one failure category.
pub fn classify_provider_message(message: &str) -> GeocodeFailure {
    ERROR_CATEGORIES
        .iter()
        .find(|(needle, _)| message.contains(needle))
        .map_or(GeocodeFailure::Unavailable, |(_, failure)| *failure)
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    /// The provider answered with an error status; carries its code/text.
    #[error("provider rejected request: {0}")]
    Rejected(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("unexpected provider response: {0}")]
    Decode(String),
}

impl ProviderError {
    pub fn classify(&self) -> GeocodeFailure {
        match self {
            ProviderError::Rejected(message) => classify_provider_message(message),
            ProviderError::Transport(_) | ProviderError::Decode(_) => GeocodeFailure::Unavailable,
        }
    }
}

// --- Provider seam ---

/// Address interpretation requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressKind {
    /// Road-name address (도로명주소).
    Road,
    /// Parcel / lot-number address (지번주소).
    Parcel,
}

impl AddressKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AddressKind::Road => "road",
            AddressKind::Parcel => "parcel",
        }
    }
}

impl fmt::Display for AddressKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strategies tried in order until one returns a point.
pub const ADDRESS_STRATEGIES: &[AddressKind] = &[AddressKind::Road, AddressKind::Parcel];

#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeMatch {
    pub coordinates: Coordinates,
    /// The provider's refined address text, or the normalized input.
    pub address: String,
}

/// GeocodeProvider
///
/// One external address service. `Ok(None)` means the provider answered but found
/// nothing; `Err` means it rejected the request or could not be reached.
#[async_trait]
pub trait GeocodeProvider: Send + Sync {
    async fn lookup(
        &self,
        address: &str,
        kind: AddressKind,
    ) -> Result<Option<GeocodeMatch>, ProviderError>;

    async fn reverse(&self, point: Coordinates) -> Result<Option<String>, ProviderError>;
}

/// GeocodingService
///
/// Never panics or propagates transport errors: every outcome is a match or a
/// `GeocodeFailure`.
#[derive(Clone)]
pub struct GeocodingService {
    provider: Arc<dyn GeocodeProvider>,
}

pub type GeocoderState = Arc<GeocodingService>;

impl GeocodingService {
    pub fn new(provider: Arc<dyn GeocodeProvider>) -> Self {
        Self { provider }
    }

    pub async fn geocode(&self, raw: &str) -> Result<GeocodeMatch, GeocodeFailure> {
        let address = normalize_address(raw);
        if address.is_empty() {
            return Err(GeocodeFailure::InsufficientDetail);
        }

        let mut last_error = None;
        for &kind in ADDRESS_STRATEGIES {
            match self.provider.lookup(&address, kind).await {
                Ok(Some(found)) => {
                    tracing::debug!(%address, strategy = %kind, "address resolved");
                    return Ok(found);
                }
                Ok(None) => tracing::debug!(%address, strategy = %kind, "no match"),
                Err(e) => {
                    tracing::warn!(%address, strategy = %kind, error = %e, "geocoding strategy failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.map_or(GeocodeFailure::NoResults, |e| e.classify()))
    }

    /// Single provider call; the first result's text, normalized.
    pub async fn reverse_geocode(&self, point: Coordinates) -> Result<String, GeocodeFailure> {
        match self.provider.reverse(point).await {
            Ok(Some(text)) => Ok(normalize_address(&text)),
            Ok(None) => Err(GeocodeFailure::NoResults),
            Err(e) => {
                tracing::warn!(?point, error = %e, "reverse geocoding failed");
                Err(e.classify())
            }
        }
    }
}

// --- VWorld provider ---

/// VWorldClient
///
/// Client for the VWorld address API 2.0 (`getcoord` / `getAddress`, EPSG:4326).
/// Requests carry the configured timeout so a stalled provider cannot pin a handler.
#[derive(Clone)]
pub struct VWorldClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    domain: Option<String>,
}

impl VWorldClient {
    pub fn new(
        base_url: &str,
        api_key: &str,
        domain: Option<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            domain,
        })
    }

    async fn get(&self, mut params: Vec<(&'static str, String)>) -> Result<String, ProviderError> {
        params.extend([
            ("service", "address".to_string()),
            ("version", "2.0".to_string()),
            ("crs", "epsg:4326".to_string()),
            ("format", "json".to_string()),
            ("key", self.api_key.clone()),
        ]);
        if let Some(domain) = &self.domain {
            params.push(("domain", domain.clone()));
        }

        let response = self
            .http
            .get(&self.base_url)
            .query(&params)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Rejected(format!("HTTP {status}")));
        }

        response
            .text()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))
    }
}

#[async_trait]
impl GeocodeProvider for VWorldClient {
    async fn lookup(
        &self,
        address: &str,
        kind: AddressKind,
    ) -> Result<Option<GeocodeMatch>, ProviderError> {
        let body = self
            .get(vec![
                ("request", "getcoord".to_string()),
                ("address", address.to_string()),
                ("type", kind.as_str().to_string()),
                ("refine", "true".to_string()),
                ("simple", "false".to_string()),
            ])
            .await?;
        parse_coordinate_response(&body, address)
    }

    async fn reverse(&self, point: Coordinates) -> Result<Option<String>, ProviderError> {
        let body = self
            .get(vec![
                ("request", "getAddress".to_string()),
                ("point", format!("{},{}", point.longitude, point.latitude)),
                ("type", "both".to_string()),
            ])
            .await?;
        parse_address_response(&body)
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    response: VWorldResponse,
}

#[derive(Debug, Deserialize)]
struct VWorldResponse {
    status: String,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    refined: Option<Refined>,
    #[serde(default)]
    error: Option<VWorldError>,
}

#[derive(Debug, Deserialize)]
struct Refined {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct VWorldError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    text: String,
}

fn parse_envelope(body: &str) -> Result<Option<VWorldResponse>, ProviderError> {
    let envelope: Envelope =
        serde_json::from_str(body).map_err(|e| ProviderError::Decode(e.to_string()))?;
    let response = envelope.response;
    match response.status.as_str() {
        "OK" => Ok(Some(response)),
        "NOT_FOUND" => Ok(None),
        _ => Err(ProviderError::Rejected(match &response.error {
            Some(err) => format!("{}: {}", err.code, err.text),
            None => response.status.clone(),
        })),
    }
}

// VWorld sends coordinates as strings; accept numbers as well.
fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) => s.trim().parse().ok(),
        other => other.as_f64(),
    }
}

/// Interprets a `getcoord` response body. `requested` is used as the address
/// text when the provider does not return a refined form.
pub fn parse_coordinate_response(
    body: &str,
    requested: &str,
) -> Result<Option<GeocodeMatch>, ProviderError> {
    let Some(response) = parse_envelope(body)? else {
        return Ok(None);
    };

    let point = response
        .result
        .as_ref()
        .and_then(|result| result.get("point"))
        .ok_or_else(|| ProviderError::Decode("missing result.point".to_string()))?;
    let (Some(x), Some(y)) = (point.get("x").and_then(as_f64), point.get("y").and_then(as_f64))
    else {
        return Err(ProviderError::Decode("non-numeric point".to_string()));
    };

    let address = response
        .refined
        .map(|r| r.text)
        .filter(|text| !text.trim().is_empty())
        .unwrap_or_else(|| requested.to_string());

    Ok(Some(GeocodeMatch {
        // x is longitude, y is latitude in EPSG:4326.
        coordinates: Coordinates::new(y, x),
        address,
    }))
}

/// Interprets a `getAddress` response body, keeping only the first result element.
pub fn parse_address_response(body: &str) -> Result<Option<String>, ProviderError> {
    let Some(response) = parse_envelope(body)? else {
        return Ok(None);
    };

    Ok(response
        .result
        .as_ref()
        .and_then(Value::as_array)
        .and_then(|items| items.first())
        .and_then(|first| first.get("text"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .filter(|text| !text.trim().is_empty()))
}
