#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
    response::Response,
};
use mapboard::{
    AppConfig, AppState, AuthorizationPolicy, GeocodingService, InMemoryRepository,
    MockStorageService, TokenService, bootstrap,
    geo::Coordinates,
    geocoding::{AddressKind, GeocodeMatch, GeocodeProvider, ProviderError},
    models::Role,
    password::PasswordHasher,
    repository::RepositoryState,
    storage::StorageState,
};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tower::util::ServiceExt;

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "admin";

// --- Scripted geocode provider ---

pub type LookupResult = Result<Option<GeocodeMatch>, ProviderError>;

/// Answers each address type with a canned result and records the order of calls.
#[derive(Default)]
pub struct ScriptedProvider {
    pub road: Option<LookupResult>,
    pub parcel: Option<LookupResult>,
    pub reverse: Option<Result<Option<String>, ProviderError>>,
    pub calls: Mutex<Vec<AddressKind>>,
}

impl ScriptedProvider {
    pub fn calls(&self) -> Vec<AddressKind> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GeocodeProvider for ScriptedProvider {
    async fn lookup(&self, _address: &str, kind: AddressKind) -> LookupResult {
        self.calls.lock().unwrap().push(kind);
        let scripted = match kind {
            AddressKind::Road => &self.road,
            AddressKind::Parcel => &self.parcel,
        };
        scripted.clone().unwrap_or(Ok(None))
    }

    async fn reverse(&self, _point: Coordinates) -> Result<Option<String>, ProviderError> {
        self.reverse.clone().unwrap_or(Ok(None))
    }
}

pub fn found(latitude: f64, longitude: f64, address: &str) -> LookupResult {
    Ok(Some(GeocodeMatch {
        coordinates: Coordinates::new(latitude, longitude),
        address: address.to_string(),
    }))
}

// --- State ---

/// Full application state over in-memory collaborators, with the admin account seeded.
pub async fn test_state(storage: MockStorageService, provider: ScriptedProvider) -> AppState {
    let config = AppConfig::default();
    let repo = Arc::new(InMemoryRepository::new()) as RepositoryState;
    let hasher = PasswordHasher::new(config.bcrypt_cost);

    bootstrap::ensure_admin(&repo, hasher, ADMIN_USERNAME, ADMIN_PASSWORD)
        .await
        .expect("admin seeding failed");

    AppState {
        repo,
        storage: Arc::new(storage) as StorageState,
        geocoder: Arc::new(GeocodingService::new(Arc::new(provider))),
        tokens: Arc::new(TokenService::new(&config.jwt_secret, config.jwt_ttl_secs)),
        policy: Arc::new(AuthorizationPolicy::standard()),
        hasher,
        config,
    }
}

pub async fn default_state() -> AppState {
    test_state(MockStorageService::new(), ScriptedProvider::default()).await
}

pub fn admin_token(state: &AppState) -> String {
    state.tokens.issue(ADMIN_USERNAME, Role::Admin).unwrap()
}

pub fn user_token(state: &AppState) -> String {
    state.tokens.issue("visitor", Role::User).unwrap()
}

// --- Requests ---

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    app.clone().oneshot(builder.body(body).unwrap()).await.unwrap()
}

pub async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn expect_json(response: Response, status: StatusCode) -> Value {
    assert_eq!(response.status(), status);
    json_body(response).await
}
