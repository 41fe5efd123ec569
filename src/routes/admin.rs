use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{patch, post, put},
};

/// Admin Router Module
///
/// Every write: stands, image uploads and the site content tables. Nested under
/// `/api/admin`, which the policy restricts to ADMIN; each handler repeats the
/// role check.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/stands", post(handlers::create_stand))
        .route("/stands/image-upload", post(handlers::create_image_upload_url))
        .route(
            "/stands/{id}",
            put(handlers::update_stand).delete(handlers::delete_stand),
        )
        .route("/button-links", post(handlers::create_button_link))
        .route(
            "/button-links/{id}",
            put(handlers::update_button_link).delete(handlers::delete_button_link),
        )
        .route("/calendar-events", post(handlers::create_calendar_event))
        .route(
            "/calendar-events/{id}",
            put(handlers::update_calendar_event).delete(handlers::delete_calendar_event),
        )
        .route(
            "/calendar-events/{id}/toggle-complete",
            patch(handlers::toggle_calendar_event_complete),
        )
        .route(
            "/hero-images/image-upload",
            post(handlers::create_hero_image_upload_url),
        )
        .route("/hero-images/{name}", put(handlers::save_hero_image))
        .route("/popup-messages/{name}", put(handlers::save_popup_message))
}
