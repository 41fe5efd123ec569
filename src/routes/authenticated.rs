use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Authenticated Router Module
///
/// Read access to stands, the geocoding helpers and the site content. Every
/// path here falls through to the policy's "any authenticated principal" default.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /api/stands?region=... | ?lat=&lng=&radius=
        .route("/api/stands", get(handlers::list_stands))
        .route("/api/stands/search", get(handlers::search_stands))
        // Static segments take priority over `{id}`.
        .route("/api/stands/geocode", get(handlers::geocode))
        .route("/api/stands/reverse-geocode", get(handlers::reverse_geocode))
        .route("/api/stands/{id}", get(handlers::get_stand))
        // GET /api/button-links?activeOnly=true
        .route("/api/button-links", get(handlers::list_button_links))
        .route(
            "/api/button-links/type/{type}",
            get(handlers::button_links_by_type),
        )
        .route("/api/button-links/{id}", get(handlers::get_button_link))
        .route("/api/calendar-events", get(handlers::list_calendar_events))
        .route(
            "/api/calendar-events/date/{date}",
            get(handlers::calendar_events_on_date),
        )
        // GET /api/calendar-events/range?startDate=&endDate=
        .route(
            "/api/calendar-events/range",
            get(handlers::calendar_events_in_range),
        )
        .route("/api/calendar-events/{id}", get(handlers::get_calendar_event))
        .route("/api/hero-images", get(handlers::list_hero_images))
        .route("/api/hero-images/{name}", get(handlers::get_hero_image))
        .route("/api/popup-messages", get(handlers::list_popup_messages))
        .route("/api/popup-messages/{name}", get(handlers::get_popup_message))
}
