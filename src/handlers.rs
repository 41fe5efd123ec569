use crate::{
    AppState,
    auth::Principal,
    error::AppError,
    extract::{AppJson, AppPath, AppQuery},
    geo::Coordinates,
    geocoding::GeocodeFailure,
    models::{
        AuthResponse, ButtonLink, ButtonLinkRequest, CalendarEvent, CalendarEventRequest,
        CurrentUser, GeocodeResponse, HeroImage, HeroImageRequest, ImageUploadRequest,
        ImageUploadResponse, LoginRequest, NewUser, PopupMessage, PopupMessageRequest,
        RegisterRequest, ReverseGeocodeResponse, Role, Stand, StandRequest,
    },
    storage::{HERO_IMAGE_PREFIX, STAND_IMAGE_PREFIX, is_managed_image},
};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

// --- Query Structs ---

/// StandFilter
///
/// Query parameters for `GET /api/stands`. A non-blank `region` wins; otherwise
/// `lat`, `lng` and `radius` together select a proximity search; otherwise the
/// full listing is returned.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StandFilter {
    pub region: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    /// Search radius in kilometres (inclusive).
    pub radius: Option<f64>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    #[serde(default)]
    pub keyword: String,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GeocodeQuery {
    #[serde(default)]
    pub address: String,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReverseGeocodeQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

// --- Service ---

pub async fn index() -> &'static str {
    "mapboard"
}

pub async fn health() -> &'static str {
    "ok"
}

// --- Authentication ---

/// login
///
/// Verifies the credentials against the stored hash and issues a bearer token.
/// An unknown username and a wrong password produce the same 401.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = crate::models::ErrorBody)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let invalid = || AppError::Unauthorized("invalid username or password".to_string());

    let user = state
        .repo
        .find_user(&payload.username)
        .await?
        .ok_or_else(invalid)?;

    if !state
        .hasher
        .verify_async(&payload.password, &user.password_hash)
        .await?
    {
        tracing::info!(username = %user.username, "login rejected");
        return Err(invalid());
    }

    let token = state
        .tokens
        .issue(&user.username, user.role)
        .map_err(|e| AppError::Internal(format!("token signing failed: {e}")))?;

    tracing::info!(username = %user.username, role = %user.role, "login succeeded");
    Ok(Json(AuthResponse {
        token,
        username: user.username,
        role: user.role,
    }))
}

/// register
///
/// Public signup. Always creates a USER account and logs it in immediately.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Registered", body = AuthResponse),
        (status = 400, description = "Blank field or username taken", body = crate::models::ErrorBody)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let username = payload.username.trim();
    if username.is_empty() || payload.password.is_empty() {
        return Err(AppError::Validation(
            "username and password are required".to_string(),
        ));
    }

    if state.repo.find_user(username).await?.is_some() {
        return Err(AppError::Validation("username already exists".to_string()));
    }

    let password_hash = state.hasher.hash_async(&payload.password).await?;
    // A concurrent signup for the same name surfaces as `Duplicate` -> 400.
    let user = state
        .repo
        .create_user(NewUser {
            username: username.to_string(),
            password_hash,
            role: Role::User,
        })
        .await?;

    let token = state
        .tokens
        .issue(&user.username, user.role)
        .map_err(|e| AppError::Internal(format!("token signing failed: {e}")))?;

    tracing::info!(username = %user.username, "user registered");
    Ok(Json(AuthResponse {
        token,
        username: user.username,
        role: user.role,
    }))
}

/// me
///
/// Echoes the identity carried by the caller's token.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current identity", body = CurrentUser),
        (status = 401, description = "Not authenticated", body = crate::models::ErrorBody)
    )
)]
pub async fn me(principal: Principal) -> Json<CurrentUser> {
    Json(CurrentUser {
        username: principal.username,
        role: principal.role,
    })
}

// --- Stands (read) ---

/// list_stands
///
/// Region filter, proximity filter or the full listing, in that order of
/// precedence. Results are always in storage order.
#[utoipa::path(
    get,
    path = "/api/stands",
    params(StandFilter),
    responses(
        (status = 200, description = "Stands", body = [Stand]),
        (status = 400, description = "Invalid radius or coordinates", body = crate::models::ErrorBody)
    )
)]
pub async fn list_stands(
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<StandFilter>,
) -> Result<Json<Vec<Stand>>, AppError> {
    if let Some(region) = filter.region.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
        return Ok(Json(state.repo.stands_by_region(region).await?));
    }

    if let (Some(lat), Some(lng), Some(radius)) = (filter.lat, filter.lng, filter.radius) {
        if !radius.is_finite() || radius < 0.0 {
            return Err(AppError::Validation(format!("invalid radius: {radius}")));
        }
        let center = Coordinates::new(lat, lng);
        if !center.is_valid() {
            return Err(AppError::Validation(format!(
                "coordinates out of range: latitude {lat}, longitude {lng}"
            )));
        }
        let stands = state.repo.stands_within_radius(center, radius).await?;
        tracing::debug!(lat, lng, radius, found = stands.len(), "radius search");
        return Ok(Json(stands));
    }

    Ok(Json(state.repo.list_stands().await?))
}

/// search_stands
///
/// Case-insensitive substring match on name or address. A blank keyword
/// returns the full listing.
#[utoipa::path(
    get,
    path = "/api/stands/search",
    params(SearchQuery),
    responses((status = 200, description = "Matching stands", body = [Stand]))
)]
pub async fn search_stands(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<SearchQuery>,
) -> Result<Json<Vec<Stand>>, AppError> {
    let keyword = query.keyword.trim();
    if keyword.is_empty() {
        return Ok(Json(state.repo.list_stands().await?));
    }
    Ok(Json(state.repo.search_stands(keyword).await?))
}

#[utoipa::path(
    get,
    path = "/api/stands/{id}",
    params(("id" = i64, Path, description = "Stand ID")),
    responses(
        (status = 200, description = "Stand", body = Stand),
        (status = 404, description = "Not Found", body = crate::models::ErrorBody)
    )
)]
pub async fn get_stand(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> Result<Json<Stand>, AppError> {
    state
        .repo
        .get_stand(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("stand {id} not found")))
}

// --- Geocoding ---

/// geocode
///
/// Resolves a free-text address to coordinates, trying the road-name form and
/// then the parcel form.
#[utoipa::path(
    get,
    path = "/api/stands/geocode",
    params(GeocodeQuery),
    responses(
        (status = 200, description = "Resolved", body = GeocodeResponse),
        (status = 400, description = "Address lacks detail", body = GeocodeResponse),
        (status = 404, description = "No match", body = GeocodeResponse),
        (status = 500, description = "Provider failure", body = GeocodeResponse)
    )
)]
pub async fn geocode(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<GeocodeQuery>,
) -> Result<Json<GeocodeResponse>, AppError> {
    let found = state.geocoder.geocode(&query.address).await?;
    Ok(Json(GeocodeResponse {
        success: true,
        latitude: Some(found.coordinates.latitude),
        longitude: Some(found.coordinates.longitude),
        address: Some(found.address),
        error: None,
    }))
}

#[utoipa::path(
    get,
    path = "/api/stands/reverse-geocode",
    params(ReverseGeocodeQuery),
    responses(
        (status = 200, description = "Resolved", body = ReverseGeocodeResponse),
        (status = 400, description = "Missing or invalid coordinates", body = GeocodeResponse),
        (status = 404, description = "No match", body = GeocodeResponse)
    )
)]
pub async fn reverse_geocode(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ReverseGeocodeQuery>,
) -> Result<Json<ReverseGeocodeResponse>, AppError> {
    let point = match (query.lat, query.lng) {
        (Some(lat), Some(lng)) => Coordinates::new(lat, lng),
        _ => return Err(GeocodeFailure::InsufficientDetail.into()),
    };
    if !point.is_valid() {
        return Err(GeocodeFailure::InsufficientDetail.into());
    }

    let address = state.geocoder.reverse_geocode(point).await?;
    Ok(Json(ReverseGeocodeResponse {
        success: true,
        address: Some(address),
        error: None,
    }))
}

// --- Stands (admin) ---

/// create_stand
///
/// [Admin Route] The path policy already restricts `/api/admin/**`; the role is
/// checked again here.
#[utoipa::path(
    post,
    path = "/api/admin/stands",
    request_body = StandRequest,
    responses(
        (status = 201, description = "Created", body = Stand),
        (status = 400, description = "Invalid stand", body = crate::models::ErrorBody),
        (status = 403, description = "Not an admin", body = crate::models::ErrorBody)
    )
)]
pub async fn create_stand(
    principal: Principal,
    State(state): State<AppState>,
    AppJson(payload): AppJson<StandRequest>,
) -> Result<(StatusCode, Json<Stand>), AppError> {
    principal.require_role(Role::Admin)?;
    payload.validate()?;

    let stand = state.repo.create_stand(payload).await?;
    tracing::info!(id = stand.id, name = %stand.name, by = %principal.username, "stand created");
    Ok((StatusCode::CREATED, Json(stand)))
}

#[utoipa::path(
    put,
    path = "/api/admin/stands/{id}",
    params(("id" = i64, Path, description = "Stand ID")),
    request_body = StandRequest,
    responses(
        (status = 200, description = "Updated", body = Stand),
        (status = 400, description = "Invalid stand", body = crate::models::ErrorBody),
        (status = 404, description = "Not Found", body = crate::models::ErrorBody)
    )
)]
pub async fn update_stand(
    principal: Principal,
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
    AppJson(payload): AppJson<StandRequest>,
) -> Result<Json<Stand>, AppError> {
    principal.require_role(Role::Admin)?;
    payload.validate()?;

    let stand = state
        .repo
        .update_stand(id, payload)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("stand {id} not found")))?;
    tracing::info!(id, by = %principal.username, "stand updated");
    Ok(Json(stand))
}

/// delete_stand
///
/// [Admin Route] Removes the stand, then its image if the image is a managed
/// storage object. A failed image delete is logged and does not fail the request.
#[utoipa::path(
    delete,
    path = "/api/admin/stands/{id}",
    params(("id" = i64, Path, description = "Stand ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found", body = crate::models::ErrorBody)
    )
)]
pub async fn delete_stand(
    principal: Principal,
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> Result<StatusCode, AppError> {
    principal.require_role(Role::Admin)?;

    let stand = state
        .repo
        .delete_stand(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("stand {id} not found")))?;

    if let Some(key) = stand.image_url.as_deref().filter(|r| is_managed_image(r)) {
        if let Err(e) = state.storage.delete_object(key).await {
            tracing::warn!(id, %key, error = %e, "stand image could not be deleted");
        }
    }

    tracing::info!(id, by = %principal.username, "stand deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// create_image_upload_url
///
/// [Admin Route] Issues a presigned PUT URL for a stand image. The object key
/// is generated server-side (`stands/<uuid>.<ext>`); the client stores the
/// returned `resourceKey` as the stand's `imageUrl`.
#[utoipa::path(
    post,
    path = "/api/admin/stands/image-upload",
    request_body = ImageUploadRequest,
    responses(
        (status = 200, description = "URL", body = ImageUploadResponse),
        (status = 400, description = "Not an image", body = crate::models::ErrorBody)
    )
)]
pub async fn create_image_upload_url(
    principal: Principal,
    State(state): State<AppState>,
    AppJson(payload): AppJson<ImageUploadRequest>,
) -> Result<Json<ImageUploadResponse>, AppError> {
    principal.require_role(Role::Admin)?;
    presign_image_upload(&state, STAND_IMAGE_PREFIX, &payload).await.map(Json)
}

/// Validates the MIME type and signs a PUT for `<prefix><uuid>.<ext>`.
async fn presign_image_upload(
    state: &AppState,
    prefix: &str,
    payload: &ImageUploadRequest,
) -> Result<ImageUploadResponse, AppError> {
    if !payload.file_type.starts_with("image/") {
        return Err(AppError::Validation(format!(
            "unsupported file type: {}",
            payload.file_type
        )));
    }

    let extension = std::path::Path::new(&payload.filename)
        .extension()
        .and_then(std::ffi::OsStr::to_str)
        .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or("bin")
        .to_ascii_lowercase();
    let object_key = format!("{prefix}{}.{extension}", Uuid::new_v4());

    let upload_url = state
        .storage
        .get_presigned_upload_url(&object_key, &payload.file_type)
        .await
        .map_err(|e| AppError::Internal(format!("presign failed: {e}")))?;

    Ok(ImageUploadResponse {
        upload_url,
        resource_key: object_key,
    })
}

// --- Button links ---

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ButtonLinkFilter {
    /// Only return active links.
    #[serde(default)]
    pub active_only: bool,
}

/// list_button_links
///
/// Every link grouped by type and ordered within the group.
#[utoipa::path(
    get,
    path = "/api/button-links",
    params(ButtonLinkFilter),
    responses((status = 200, description = "Button links", body = [ButtonLink]))
)]
pub async fn list_button_links(
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<ButtonLinkFilter>,
) -> Result<Json<Vec<ButtonLink>>, AppError> {
    Ok(Json(state.repo.list_button_links(filter.active_only).await?))
}

#[utoipa::path(
    get,
    path = "/api/button-links/type/{type}",
    params(("type" = String, Path, description = "Button group, e.g. orange")),
    responses((status = 200, description = "Active links of the group", body = [ButtonLink]))
)]
pub async fn button_links_by_type(
    State(state): State<AppState>,
    AppPath(link_type): AppPath<String>,
) -> Result<Json<Vec<ButtonLink>>, AppError> {
    Ok(Json(state.repo.button_links_by_type(&link_type).await?))
}

#[utoipa::path(
    get,
    path = "/api/button-links/{id}",
    params(("id" = i64, Path, description = "Button link ID")),
    responses(
        (status = 200, description = "Button link", body = ButtonLink),
        (status = 404, description = "Not Found", body = crate::models::ErrorBody)
    )
)]
pub async fn get_button_link(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> Result<Json<ButtonLink>, AppError> {
    state
        .repo
        .get_button_link(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("button link {id} not found")))
}

#[utoipa::path(
    post,
    path = "/api/admin/button-links",
    request_body = ButtonLinkRequest,
    responses(
        (status = 201, description = "Created", body = ButtonLink),
        (status = 400, description = "Missing field", body = crate::models::ErrorBody)
    )
)]
pub async fn create_button_link(
    principal: Principal,
    State(state): State<AppState>,
    AppJson(payload): AppJson<ButtonLinkRequest>,
) -> Result<(StatusCode, Json<ButtonLink>), AppError> {
    principal.require_role(Role::Admin)?;
    payload.validate()?;

    let link = state.repo.create_button_link(payload).await?;
    tracing::info!(id = link.id, name = %link.name, by = %principal.username, "button link created");
    Ok((StatusCode::CREATED, Json(link)))
}

#[utoipa::path(
    put,
    path = "/api/admin/button-links/{id}",
    params(("id" = i64, Path, description = "Button link ID")),
    request_body = ButtonLinkRequest,
    responses(
        (status = 200, description = "Updated", body = ButtonLink),
        (status = 404, description = "Not Found", body = crate::models::ErrorBody)
    )
)]
pub async fn update_button_link(
    principal: Principal,
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
    AppJson(payload): AppJson<ButtonLinkRequest>,
) -> Result<Json<ButtonLink>, AppError> {
    principal.require_role(Role::Admin)?;
    payload.validate()?;

    let link = state
        .repo
        .update_button_link(id, payload)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("button link {id} not found")))?;
    tracing::info!(id, by = %principal.username, "button link updated");
    Ok(Json(link))
}

#[utoipa::path(
    delete,
    path = "/api/admin/button-links/{id}",
    params(("id" = i64, Path, description = "Button link ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found", body = crate::models::ErrorBody)
    )
)]
pub async fn delete_button_link(
    principal: Principal,
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> Result<StatusCode, AppError> {
    principal.require_role(Role::Admin)?;

    if !state.repo.delete_button_link(id).await? {
        return Err(AppError::NotFound(format!("button link {id} not found")));
    }
    tracing::info!(id, by = %principal.username, "button link deleted");
    Ok(StatusCode::NO_CONTENT)
}

// --- Calendar ---

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct CalendarRange {
    /// First day, inclusive (`YYYY-MM-DD`).
    #[param(value_type = String, example = "2025-03-01")]
    pub start_date: NaiveDate,
    /// Last day, inclusive.
    #[param(value_type = String, example = "2025-03-31")]
    pub end_date: NaiveDate,
}

#[utoipa::path(
    get,
    path = "/api/calendar-events",
    responses((status = 200, description = "All events", body = [CalendarEvent]))
)]
pub async fn list_calendar_events(
    State(state): State<AppState>,
) -> Result<Json<Vec<CalendarEvent>>, AppError> {
    Ok(Json(state.repo.list_calendar_events().await?))
}

#[utoipa::path(
    get,
    path = "/api/calendar-events/date/{date}",
    params(("date" = String, Path, description = "Day as YYYY-MM-DD")),
    responses(
        (status = 200, description = "Events on the day", body = [CalendarEvent]),
        (status = 400, description = "Malformed date", body = crate::models::ErrorBody)
    )
)]
pub async fn calendar_events_on_date(
    State(state): State<AppState>,
    AppPath(date): AppPath<NaiveDate>,
) -> Result<Json<Vec<CalendarEvent>>, AppError> {
    Ok(Json(state.repo.calendar_events_on(date).await?))
}

/// calendar_events_in_range
///
/// Events between two days, both inclusive, ordered by day. A start after the
/// end is rejected rather than answered with an empty list.
#[utoipa::path(
    get,
    path = "/api/calendar-events/range",
    params(CalendarRange),
    responses(
        (status = 200, description = "Events in the range", body = [CalendarEvent]),
        (status = 400, description = "Malformed or inverted range", body = crate::models::ErrorBody)
    )
)]
pub async fn calendar_events_in_range(
    State(state): State<AppState>,
    AppQuery(range): AppQuery<CalendarRange>,
) -> Result<Json<Vec<CalendarEvent>>, AppError> {
    if range.start_date > range.end_date {
        return Err(AppError::Validation(format!(
            "startDate {} is after endDate {}",
            range.start_date, range.end_date
        )));
    }
    Ok(Json(
        state
            .repo
            .calendar_events_between(range.start_date, range.end_date)
            .await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/calendar-events/{id}",
    params(("id" = i64, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event", body = CalendarEvent),
        (status = 404, description = "Not Found", body = crate::models::ErrorBody)
    )
)]
pub async fn get_calendar_event(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> Result<Json<CalendarEvent>, AppError> {
    state
        .repo
        .get_calendar_event(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("calendar event {id} not found")))
}

#[utoipa::path(
    post,
    path = "/api/admin/calendar-events",
    request_body = CalendarEventRequest,
    responses(
        (status = 201, description = "Created", body = CalendarEvent),
        (status = 400, description = "Missing title or date", body = crate::models::ErrorBody)
    )
)]
pub async fn create_calendar_event(
    principal: Principal,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CalendarEventRequest>,
) -> Result<(StatusCode, Json<CalendarEvent>), AppError> {
    principal.require_role(Role::Admin)?;
    payload.validate()?;

    let event = state.repo.create_calendar_event(payload).await?;
    tracing::info!(id = event.id, date = %event.event_date, by = %principal.username, "calendar event created");
    Ok((StatusCode::CREATED, Json(event)))
}

#[utoipa::path(
    put,
    path = "/api/admin/calendar-events/{id}",
    params(("id" = i64, Path, description = "Event ID")),
    request_body = CalendarEventRequest,
    responses(
        (status = 200, description = "Updated", body = CalendarEvent),
        (status = 404, description = "Not Found", body = crate::models::ErrorBody)
    )
)]
pub async fn update_calendar_event(
    principal: Principal,
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
    AppJson(payload): AppJson<CalendarEventRequest>,
) -> Result<Json<CalendarEvent>, AppError> {
    principal.require_role(Role::Admin)?;
    payload.validate()?;

    let event = state
        .repo
        .update_calendar_event(id, payload)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("calendar event {id} not found")))?;
    tracing::info!(id, by = %principal.username, "calendar event updated");
    Ok(Json(event))
}

#[utoipa::path(
    delete,
    path = "/api/admin/calendar-events/{id}",
    params(("id" = i64, Path, description = "Event ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found", body = crate::models::ErrorBody)
    )
)]
pub async fn delete_calendar_event(
    principal: Principal,
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> Result<StatusCode, AppError> {
    principal.require_role(Role::Admin)?;

    if !state.repo.delete_calendar_event(id).await? {
        return Err(AppError::NotFound(format!("calendar event {id} not found")));
    }
    tracing::info!(id, by = %principal.username, "calendar event deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    patch,
    path = "/api/admin/calendar-events/{id}/toggle-complete",
    params(("id" = i64, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Toggled", body = CalendarEvent),
        (status = 404, description = "Not Found", body = crate::models::ErrorBody)
    )
)]
pub async fn toggle_calendar_event_complete(
    principal: Principal,
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> Result<Json<CalendarEvent>, AppError> {
    principal.require_role(Role::Admin)?;

    let event = state
        .repo
        .toggle_calendar_event(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("calendar event {id} not found")))?;
    tracing::debug!(id, completed = event.completed, "calendar event toggled");
    Ok(Json(event))
}

// --- Hero images ---

#[utoipa::path(
    get,
    path = "/api/hero-images",
    responses((status = 200, description = "Hero image slots", body = [HeroImage]))
)]
pub async fn list_hero_images(
    State(state): State<AppState>,
) -> Result<Json<Vec<HeroImage>>, AppError> {
    Ok(Json(state.repo.list_hero_images().await?))
}

#[utoipa::path(
    get,
    path = "/api/hero-images/{name}",
    params(("name" = String, Path, description = "Slot name, e.g. hero1")),
    responses(
        (status = 200, description = "Hero image", body = HeroImage),
        (status = 404, description = "Not Found", body = crate::models::ErrorBody)
    )
)]
pub async fn get_hero_image(
    State(state): State<AppState>,
    AppPath(name): AppPath<String>,
) -> Result<Json<HeroImage>, AppError> {
    state
        .repo
        .get_hero_image(&name)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("hero image {name} not found")))
}

#[utoipa::path(
    post,
    path = "/api/admin/hero-images/image-upload",
    request_body = ImageUploadRequest,
    responses(
        (status = 200, description = "URL", body = ImageUploadResponse),
        (status = 400, description = "Not an image", body = crate::models::ErrorBody)
    )
)]
pub async fn create_hero_image_upload_url(
    principal: Principal,
    State(state): State<AppState>,
    AppJson(payload): AppJson<ImageUploadRequest>,
) -> Result<Json<ImageUploadResponse>, AppError> {
    principal.require_role(Role::Admin)?;
    presign_image_upload(&state, HERO_IMAGE_PREFIX, &payload).await.map(Json)
}

/// save_hero_image
///
/// [Admin Route] Points a slot at a new image, creating the slot on first use.
/// A replaced managed image is deleted from storage; a failed delete is logged.
#[utoipa::path(
    put,
    path = "/api/admin/hero-images/{name}",
    params(("name" = String, Path, description = "Slot name, e.g. hero1")),
    request_body = HeroImageRequest,
    responses(
        (status = 200, description = "Saved", body = HeroImage),
        (status = 400, description = "Blank image URL", body = crate::models::ErrorBody)
    )
)]
pub async fn save_hero_image(
    principal: Principal,
    State(state): State<AppState>,
    AppPath(name): AppPath<String>,
    AppJson(payload): AppJson<HeroImageRequest>,
) -> Result<Json<HeroImage>, AppError> {
    principal.require_role(Role::Admin)?;

    let image_url = payload.image_url.trim();
    if image_url.is_empty() {
        return Err(AppError::Validation("imageUrl is required".to_string()));
    }

    let previous = state.repo.get_hero_image(&name).await?.and_then(|h| h.image_url);
    let saved = state.repo.save_hero_image(&name, image_url).await?;

    if let Some(old) = previous
        .as_deref()
        .filter(|old| *old != image_url && is_managed_image(old))
    {
        if let Err(e) = state.storage.delete_object(old).await {
            tracing::warn!(%name, key = %old, error = %e, "replaced hero image could not be deleted");
        }
    }

    tracing::info!(%name, by = %principal.username, "hero image saved");
    Ok(Json(saved))
}

// --- Popup messages ---

#[utoipa::path(
    get,
    path = "/api/popup-messages",
    responses((status = 200, description = "Popup messages", body = [PopupMessage]))
)]
pub async fn list_popup_messages(
    State(state): State<AppState>,
) -> Result<Json<Vec<PopupMessage>>, AppError> {
    Ok(Json(state.repo.list_popup_messages().await?))
}

#[utoipa::path(
    get,
    path = "/api/popup-messages/{name}",
    params(("name" = String, Path, description = "Popup name, e.g. notice")),
    responses(
        (status = 200, description = "Popup message", body = PopupMessage),
        (status = 404, description = "Not Found", body = crate::models::ErrorBody)
    )
)]
pub async fn get_popup_message(
    State(state): State<AppState>,
    AppPath(name): AppPath<String>,
) -> Result<Json<PopupMessage>, AppError> {
    state
        .repo
        .get_popup_message(&name)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("popup message {name} not found")))
}

/// [Admin Route] Creates or replaces the named popup's content.
#[utoipa::path(
    put,
    path = "/api/admin/popup-messages/{name}",
    params(("name" = String, Path, description = "Popup name, e.g. notice")),
    request_body = PopupMessageRequest,
    responses((status = 200, description = "Saved", body = PopupMessage))
)]
pub async fn save_popup_message(
    principal: Principal,
    State(state): State<AppState>,
    AppPath(name): AppPath<String>,
    AppJson(payload): AppJson<PopupMessageRequest>,
) -> Result<Json<PopupMessage>, AppError> {
    principal.require_role(Role::Admin)?;

    let message = state.repo.save_popup_message(&name, payload.content).await?;
    tracing::info!(%name, by = %principal.username, "popup message saved");
    Ok(Json(message))
}
