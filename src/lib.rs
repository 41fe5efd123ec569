use axum::{Router, extract::FromRef, http::HeaderName, middleware};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Identity: credential hashing, tokens, the gate and the path policy.
pub mod auth;
pub mod bootstrap;
pub mod password;
pub mod policy;
pub mod token;

// Stands, geometry and the external collaborators.
pub mod geo;
pub mod geocoding;
pub mod repository;
pub mod storage;

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod models;

pub mod routes;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::AppError;
pub use geocoding::{GeocoderState, GeocodingService, VWorldClient};
pub use policy::{AuthorizationPolicy, PolicyState};
pub use repository::{InMemoryRepository, PostgresRepository, RepositoryState};
pub use storage::{MockStorageService, S3StorageClient, StorageState};
pub use token::{TokenService, TokenState};

/// ApiDoc
///
/// OpenAPI document served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::login, handlers::register, handlers::me,
        handlers::list_stands, handlers::search_stands, handlers::get_stand,
        handlers::geocode, handlers::reverse_geocode,
        handlers::create_stand, handlers::update_stand, handlers::delete_stand,
        handlers::create_image_upload_url,
        handlers::list_button_links, handlers::button_links_by_type, handlers::get_button_link,
        handlers::create_button_link, handlers::update_button_link, handlers::delete_button_link,
        handlers::list_calendar_events, handlers::calendar_events_on_date,
        handlers::calendar_events_in_range, handlers::get_calendar_event,
        handlers::create_calendar_event, handlers::update_calendar_event,
        handlers::delete_calendar_event, handlers::toggle_calendar_event_complete,
        handlers::list_hero_images, handlers::get_hero_image,
        handlers::create_hero_image_upload_url, handlers::save_hero_image,
        handlers::list_popup_messages, handlers::get_popup_message, handlers::save_popup_message
    ),
    components(
        schemas(
            models::Role, models::Stand, models::StandRequest, models::LoginRequest,
            models::RegisterRequest, models::AuthResponse, models::CurrentUser,
            models::ImageUploadRequest, models::ImageUploadResponse,
            models::GeocodeResponse, models::ReverseGeocodeResponse, models::ErrorBody,
            models::ButtonLink, models::ButtonLinkRequest, models::CalendarEvent,
            models::CalendarEventRequest, models::HeroImage, models::HeroImageRequest,
            models::PopupMessage, models::PopupMessageRequest,
        )
    ),
    tags(
        (name = "mapboard", description = "Post board stand locator and site content API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Immutable container of every shared service, cloned per request. Handlers
/// take `State<AppState>`; middleware pulls single services through `FromRef`.
#[derive(Clone)]
pub struct AppState {
    pub repo: RepositoryState,
    pub storage: StorageState,
    pub geocoder: GeocoderState,
    pub tokens: TokenState,
    pub policy: PolicyState,
    pub hasher: password::PasswordHasher,
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for GeocoderState {
    fn from_ref(app_state: &AppState) -> GeocoderState {
        app_state.geocoder.clone()
    }
}

impl FromRef<AppState> for TokenState {
    fn from_ref(app_state: &AppState) -> TokenState {
        app_state.tokens.clone()
    }
}

impl FromRef<AppState> for PolicyState {
    fn from_ref(app_state: &AppState) -> PolicyState {
        app_state.policy.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the routes and the request pipeline. Per request, outermost first:
/// CORS, request id and tracing, the authentication gate, the authorization
/// policy, then the handler.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(authenticated::authenticated_routes())
        .nest("/api/admin", admin::admin_routes())
        // Layers wrap everything added above, fallback included. The last one
        // added runs first, so the gate attaches the principal before the
        // policy reads it.
        .layer(middleware::from_fn_with_state(
            state.policy.clone(),
            policy::enforce_policy,
        ))
        .layer(middleware::from_fn_with_state(
            state.tokens.clone(),
            auth::authentication_gate,
        ))
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(
                    x_request_id.clone(),
                    MakeRequestUuid,
                ))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span factory for `TraceLayer`: every log line of one request carries its
/// `x-request-id`.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
