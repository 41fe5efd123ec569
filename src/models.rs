use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;
use utoipa::ToSchema;

use crate::{error::AppError, geo::Coordinates};

// --- Identity ---

/// Role
///
/// The RBAC field. Exactly one role per user; serialized as `ADMIN` / `USER`
/// in JSON, in the database and inside token claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::User => "USER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Role::Admin),
            "USER" => Ok(Role::User),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

// Lets sqlx decode the TEXT `role` column straight into the enum.
impl TryFrom<String> for Role {
    type Error = UnknownRole;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// User
///
/// Credential store record from the `users` table. The password hash is opaque
/// bcrypt output and never leaves the server, so this type is not serializable.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for the credential store. The hash is computed before this is built.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
}

// --- Stands ---

/// Stand
///
/// A physical post board location from the `stands` table. Coordinates are
/// WGS-84 degrees. `image_url` holds either a managed storage key (`stands/...`)
/// or an external reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Stand {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub region: String,
    pub image_url: Option<String>,
    pub description: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

impl Stand {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

/// StandRequest
///
/// Input payload for creating a stand (POST) and for full replacement (PUT).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StandRequest {
    pub name: String,
    #[serde(default)]
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl StandRequest {
    /// Rejects blank names and coordinates outside the WGS-84 ranges.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("stand name is required".to_string()));
        }
        if !Coordinates::new(self.latitude, self.longitude).is_valid() {
            return Err(AppError::Validation(format!(
                "coordinates out of range: latitude {}, longitude {}",
                self.latitude, self.longitude
            )));
        }
        Ok(())
    }
}

// --- Auth payloads ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// RegisterRequest
///
/// Public signup payload. New accounts always receive the USER role.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

/// Returned by both login and register.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AuthResponse {
    pub token: String,
    pub username: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CurrentUser {
    pub username: String,
    pub role: Role,
}

// --- Image uploads ---

/// ImageUploadRequest
///
/// Requests a short-lived presigned URL for uploading a stand image.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, TS, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ImageUploadRequest {
    /// The original filename, used to derive the file extension.
    #[schema(example = "board.jpg")]
    pub filename: String,
    /// Must be an `image/*` MIME type; the upload is constrained to it.
    #[schema(example = "image/jpeg")]
    pub file_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ImageUploadResponse {
    /// The time-limited URL for the PUT request.
    pub upload_url: String,
    /// Storage key to put into the stand's `imageUrl`.
    pub resource_key: String,
}

// --- Button links ---

/// ButtonLink
///
/// A shortcut button on the landing page. `type` groups buttons into rows
/// (`orange`, `green`); `orderIndex` orders them within a row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ButtonLink {
    pub id: i64,
    pub name: String,
    pub url: String,
    #[serde(rename = "type")]
    pub link_type: String,
    pub icon_class: Option<String>,
    pub order_index: i32,
    pub active: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

/// Create (POST) and full replacement (PUT) payload for a button link.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ButtonLinkRequest {
    pub name: String,
    pub url: String,
    #[serde(rename = "type")]
    #[schema(example = "orange")]
    pub link_type: String,
    #[serde(default)]
    pub icon_class: Option<String>,
    #[serde(default)]
    pub order_index: i32,
    #[serde(default = "default_true")]
    pub active: bool,
}

impl Default for ButtonLinkRequest {
    fn default() -> Self {
        Self {
            name: String::new(),
            url: String::new(),
            link_type: String::new(),
            icon_class: None,
            order_index: 0,
            active: true,
        }
    }
}

impl ButtonLinkRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        for (field, value) in [("name", &self.name), ("url", &self.url), ("type", &self.link_type)] {
            if value.trim().is_empty() {
                return Err(AppError::Validation(format!("button link {field} is required")));
            }
        }
        Ok(())
    }
}

// --- Calendar ---

pub const DEFAULT_EVENT_BACKGROUND: &str = "#3b82f6";
pub const DEFAULT_EVENT_TEXT_COLOR: &str = "#ffffff";

fn default_event_background() -> String {
    DEFAULT_EVENT_BACKGROUND.to_string()
}

fn default_event_text_color() -> String {
    DEFAULT_EVENT_TEXT_COLOR.to_string()
}

/// CalendarEvent
///
/// A dated entry on the shared calendar. `eventDate` is a plain calendar day
/// with no time zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CalendarEvent {
    pub id: i64,
    pub title: String,
    pub content: Option<String>,
    #[ts(type = "string")]
    pub event_date: NaiveDate,
    pub category: Option<String>,
    pub background_color: String,
    pub text_color: String,
    pub completed: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// CalendarEventRequest
///
/// Create (POST) and full replacement (PUT) payload. Omitted colors fall back to
/// the calendar's defaults.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CalendarEventRequest {
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    #[ts(type = "string")]
    #[schema(example = "2025-03-01")]
    pub event_date: NaiveDate,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default = "default_event_background")]
    pub background_color: String,
    #[serde(default = "default_event_text_color")]
    pub text_color: String,
    #[serde(default)]
    pub completed: bool,
}

impl CalendarEventRequest {
    pub fn new(title: impl Into<String>, event_date: NaiveDate) -> Self {
        Self {
            title: title.into(),
            content: None,
            event_date,
            category: None,
            background_color: default_event_background(),
            text_color: default_event_text_color(),
            completed: false,
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.title.trim().is_empty() {
            return Err(AppError::Validation("event title is required".to_string()));
        }
        Ok(())
    }
}

// --- Hero images and popups ---

/// HeroImage
///
/// A named banner slot (`hero1`, `hero2`, ...) on the landing page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct HeroImage {
    pub id: i64,
    pub name: String,
    pub image_url: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct HeroImageRequest {
    /// A storage key from the hero upload endpoint, or an external URL.
    pub image_url: String,
}

/// PopupMessage
///
/// Free text shown in a named popup (`webhard`, `notice`). At most one row per name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct PopupMessage {
    pub id: i64,
    pub name: String,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct PopupMessageRequest {
    #[serde(default)]
    pub content: Option<String>,
}

// --- Geocoding ---

/// GeocodeResponse
///
/// `{success: true, latitude, longitude, address}` or `{success: false, error}`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct GeocodeResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GeocodeResponse {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ReverseGeocodeResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Body of every non-geocoding error response.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ErrorBody {
    pub error: String,
}
