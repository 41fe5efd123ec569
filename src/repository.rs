use crate::geo::{self, Coordinates};
use crate::models::{
    ButtonLink, ButtonLinkRequest, CalendarEvent, CalendarEventRequest, HeroImage, NewUser,
    PopupMessage, Stand, StandRequest, User,
};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::{PgPool, query_builder::QueryBuilder};
use std::sync::Arc;
use tokio::sync::RwLock;

/// RepositoryError
///
/// Persistence failures surfaced to handlers. `Duplicate` is the only one with
/// client-facing meaning (e.g. a taken username).
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("{0} already exists")]
    Duplicate(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type RepoResult<T> = Result<T, RepositoryError>;

/// Repository Trait
///
/// The abstract contract for the credential store, the stand table and the
/// site content tables (button links, calendar, hero images, popups). Handlers
/// depend only on this trait, so Postgres and the in-memory store are interchangeable.
///
/// **Send + Sync + async_trait** make `Arc<dyn Repository>` shareable across
/// Axum's task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Credential store ---
    async fn find_user(&self, username: &str) -> RepoResult<Option<User>>;
    /// Fails with `Duplicate` when the username is taken.
    async fn create_user(&self, user: NewUser) -> RepoResult<User>;

    // --- Stands (all listings are in storage order) ---
    async fn list_stands(&self) -> RepoResult<Vec<Stand>>;
    async fn get_stand(&self, id: i64) -> RepoResult<Option<Stand>>;
    async fn stands_by_region(&self, region: &str) -> RepoResult<Vec<Stand>>;
    /// Case-insensitive substring match on name or address.
    async fn search_stands(&self, keyword: &str) -> RepoResult<Vec<Stand>>;
    async fn create_stand(&self, req: StandRequest) -> RepoResult<Stand>;
    /// Full replacement of the mutable fields; `None` if the id does not exist.
    async fn update_stand(&self, id: i64, req: StandRequest) -> RepoResult<Option<Stand>>;
    /// Returns the removed row so callers can clean up its image.
    async fn delete_stand(&self, id: i64) -> RepoResult<Option<Stand>>;

    /// Stands within `radius_km` of `center`, inclusive. The default is a full
    /// scan of `list_stands`; an implementation with a spatial index may override it.
    async fn stands_within_radius(
        &self,
        center: Coordinates,
        radius_km: f64,
    ) -> RepoResult<Vec<Stand>> {
        let stands = self.list_stands().await?;
        Ok(geo::within_radius(stands, center, radius_km))
    }

    // --- Button links ---
    /// All links ordered by type, then `order_index`. `active_only` drops inactive ones.
    async fn list_button_links(&self, active_only: bool) -> RepoResult<Vec<ButtonLink>>;
    /// Active links of one type, ordered by `order_index`.
    async fn button_links_by_type(&self, link_type: &str) -> RepoResult<Vec<ButtonLink>>;
    async fn get_button_link(&self, id: i64) -> RepoResult<Option<ButtonLink>>;
    async fn create_button_link(&self, req: ButtonLinkRequest) -> RepoResult<ButtonLink>;
    async fn update_button_link(
        &self,
        id: i64,
        req: ButtonLinkRequest,
    ) -> RepoResult<Option<ButtonLink>>;
    async fn delete_button_link(&self, id: i64) -> RepoResult<bool>;

    // --- Calendar ---
    async fn list_calendar_events(&self) -> RepoResult<Vec<CalendarEvent>>;
    /// Events on one day, oldest first.
    async fn calendar_events_on(&self, date: NaiveDate) -> RepoResult<Vec<CalendarEvent>>;
    /// Events with `start <= event_date <= end`, by date and then creation time.
    async fn calendar_events_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepoResult<Vec<CalendarEvent>>;
    async fn get_calendar_event(&self, id: i64) -> RepoResult<Option<CalendarEvent>>;
    async fn create_calendar_event(&self, req: CalendarEventRequest) -> RepoResult<CalendarEvent>;
    async fn update_calendar_event(
        &self,
        id: i64,
        req: CalendarEventRequest,
    ) -> RepoResult<Option<CalendarEvent>>;
    async fn delete_calendar_event(&self, id: i64) -> RepoResult<bool>;
    /// Flips `completed`; `None` if the id does not exist.
    async fn toggle_calendar_event(&self, id: i64) -> RepoResult<Option<CalendarEvent>>;

    // --- Hero images and popups (keyed by name, upserted) ---
    async fn list_hero_images(&self) -> RepoResult<Vec<HeroImage>>;
    async fn get_hero_image(&self, name: &str) -> RepoResult<Option<HeroImage>>;
    async fn save_hero_image(&self, name: &str, image_url: &str) -> RepoResult<HeroImage>;
    async fn list_popup_messages(&self) -> RepoResult<Vec<PopupMessage>>;
    async fn get_popup_message(&self, name: &str) -> RepoResult<Option<PopupMessage>>;
    async fn save_popup_message(
        &self,
        name: &str,
        content: Option<String>,
    ) -> RepoResult<PopupMessage>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

const STAND_COLUMNS: &str = "id, name, address, latitude, longitude, region, image_url, description, created_at, updated_at";
const BUTTON_LINK_COLUMNS: &str =
    "id, name, url, link_type, icon_class, order_index, active, created_at, updated_at";
const CALENDAR_EVENT_COLUMNS: &str = "id, title, content, event_date, category, background_color, text_color, completed, created_at, updated_at";
const HERO_IMAGE_COLUMNS: &str = "id, name, image_url, created_at, updated_at";

/// PostgresRepository
///
/// The `Repository` implementation backed by PostgreSQL. Schema lives in `migrations/`.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn unique_violation(err: sqlx::Error, what: &str) -> RepositoryError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepositoryError::Duplicate(what.to_string())
        }
        _ => RepositoryError::Database(err),
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn find_user(&self, username: &str) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, role, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        sqlx::query_as::<_, User>(
            r#"INSERT INTO users (username, password_hash, role, created_at)
               VALUES ($1, $2, $3, NOW())
               RETURNING id, username, password_hash, role, created_at"#,
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unique_violation(e, "username"))
    }

    async fn list_stands(&self) -> RepoResult<Vec<Stand>> {
        let stands = sqlx::query_as::<_, Stand>(&format!(
            "SELECT {STAND_COLUMNS} FROM stands ORDER BY id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(stands)
    }

    async fn get_stand(&self, id: i64) -> RepoResult<Option<Stand>> {
        let stand = sqlx::query_as::<_, Stand>(&format!(
            "SELECT {STAND_COLUMNS} FROM stands WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(stand)
    }

    async fn stands_by_region(&self, region: &str) -> RepoResult<Vec<Stand>> {
        let stands = sqlx::query_as::<_, Stand>(&format!(
            "SELECT {STAND_COLUMNS} FROM stands WHERE region = $1 ORDER BY id ASC"
        ))
        .bind(region)
        .fetch_all(&self.pool)
        .await?;
        Ok(stands)
    }

    /// Uses QueryBuilder for safe parameterization of the ILIKE pattern. LIKE
    /// wildcards in the keyword are escaped so they match literally.
    async fn search_stands(&self, keyword: &str) -> RepoResult<Vec<Stand>> {
        let escaped = keyword
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        let pattern = format!("%{escaped}%");
        let mut builder: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new(format!("SELECT {STAND_COLUMNS} FROM stands WHERE name ILIKE "));
        builder.push_bind(pattern.clone());
        builder.push(" OR address ILIKE ");
        builder.push_bind(pattern);
        builder.push(" ORDER BY id ASC");

        let stands = builder
            .build_query_as::<Stand>()
            .fetch_all(&self.pool)
            .await?;
        Ok(stands)
    }

    async fn create_stand(&self, req: StandRequest) -> RepoResult<Stand> {
        let stand = sqlx::query_as::<_, Stand>(&format!(
            r#"INSERT INTO stands (name, address, latitude, longitude, region, image_url, description, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, NOW(), NOW())
               RETURNING {STAND_COLUMNS}"#
        ))
        .bind(req.name)
        .bind(req.address)
        .bind(req.latitude)
        .bind(req.longitude)
        .bind(req.region)
        .bind(req.image_url)
        .bind(req.description)
        .fetch_one(&self.pool)
        .await?;
        Ok(stand)
    }

    async fn update_stand(&self, id: i64, req: StandRequest) -> RepoResult<Option<Stand>> {
        let stand = sqlx::query_as::<_, Stand>(&format!(
            r#"UPDATE stands
               SET name = $2, address = $3, latitude = $4, longitude = $5,
                   region = $6, image_url = $7, description = $8, updated_at = NOW()
               WHERE id = $1
               RETURNING {STAND_COLUMNS}"#
        ))
        .bind(id)
        .bind(req.name)
        .bind(req.address)
        .bind(req.latitude)
        .bind(req.longitude)
        .bind(req.region)
        .bind(req.image_url)
        .bind(req.description)
        .fetch_optional(&self.pool)
        .await?;
        Ok(stand)
    }

    async fn delete_stand(&self, id: i64) -> RepoResult<Option<Stand>> {
        let stand = sqlx::query_as::<_, Stand>(&format!(
            "DELETE FROM stands WHERE id = $1 RETURNING {STAND_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(stand)
    }

    async fn list_button_links(&self, active_only: bool) -> RepoResult<Vec<ButtonLink>> {
        let mut builder: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new(format!("SELECT {BUTTON_LINK_COLUMNS} FROM button_links"));
        if active_only {
            builder.push(" WHERE active");
        }
        builder.push(" ORDER BY link_type ASC, order_index ASC, id ASC");

        let links = builder
            .build_query_as::<ButtonLink>()
            .fetch_all(&self.pool)
            .await?;
        Ok(links)
    }

    async fn button_links_by_type(&self, link_type: &str) -> RepoResult<Vec<ButtonLink>> {
        let links = sqlx::query_as::<_, ButtonLink>(&format!(
            r#"SELECT {BUTTON_LINK_COLUMNS} FROM button_links
               WHERE link_type = $1 AND active
               ORDER BY order_index ASC, id ASC"#
        ))
        .bind(link_type)
        .fetch_all(&self.pool)
        .await?;
        Ok(links)
    }

    async fn get_button_link(&self, id: i64) -> RepoResult<Option<ButtonLink>> {
        let link = sqlx::query_as::<_, ButtonLink>(&format!(
            "SELECT {BUTTON_LINK_COLUMNS} FROM button_links WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(link)
    }

    async fn create_button_link(&self, req: ButtonLinkRequest) -> RepoResult<ButtonLink> {
        let link = sqlx::query_as::<_, ButtonLink>(&format!(
            r#"INSERT INTO button_links (name, url, link_type, icon_class, order_index, active, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW())
               RETURNING {BUTTON_LINK_COLUMNS}"#
        ))
        .bind(req.name)
        .bind(req.url)
        .bind(req.link_type)
        .bind(req.icon_class)
        .bind(req.order_index)
        .bind(req.active)
        .fetch_one(&self.pool)
        .await?;
        Ok(link)
    }

    async fn update_button_link(
        &self,
        id: i64,
        req: ButtonLinkRequest,
    ) -> RepoResult<Option<ButtonLink>> {
        let link = sqlx::query_as::<_, ButtonLink>(&format!(
            r#"UPDATE button_links
               SET name = $2, url = $3, link_type = $4, icon_class = $5,
                   order_index = $6, active = $7, updated_at = NOW()
               WHERE id = $1
               RETURNING {BUTTON_LINK_COLUMNS}"#
        ))
        .bind(id)
        .bind(req.name)
        .bind(req.url)
        .bind(req.link_type)
        .bind(req.icon_class)
        .bind(req.order_index)
        .bind(req.active)
        .fetch_optional(&self.pool)
        .await?;
        Ok(link)
    }

    async fn delete_button_link(&self, id: i64) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM button_links WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_calendar_events(&self) -> RepoResult<Vec<CalendarEvent>> {
        let events = sqlx::query_as::<_, CalendarEvent>(&format!(
            "SELECT {CALENDAR_EVENT_COLUMNS} FROM calendar_events ORDER BY id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(events)
    }

    async fn calendar_events_on(&self, date: NaiveDate) -> RepoResult<Vec<CalendarEvent>> {
        let events = sqlx::query_as::<_, CalendarEvent>(&format!(
            r#"SELECT {CALENDAR_EVENT_COLUMNS} FROM calendar_events
               WHERE event_date = $1
               ORDER BY created_at ASC, id ASC"#
        ))
        .bind(date)
        .fetch_all(&self.pool)
        .await?;
        Ok(events)
    }

    async fn calendar_events_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepoResult<Vec<CalendarEvent>> {
        let events = sqlx::query_as::<_, CalendarEvent>(&format!(
            r#"SELECT {CALENDAR_EVENT_COLUMNS} FROM calendar_events
               WHERE event_date BETWEEN $1 AND $2
               ORDER BY event_date ASC, created_at ASC, id ASC"#
        ))
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        Ok(events)
    }

    async fn get_calendar_event(&self, id: i64) -> RepoResult<Option<CalendarEvent>> {
        let event = sqlx::query_as::<_, CalendarEvent>(&format!(
            "SELECT {CALENDAR_EVENT_COLUMNS} FROM calendar_events WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(event)
    }

    async fn create_calendar_event(&self, req: CalendarEventRequest) -> RepoResult<CalendarEvent> {
        let event = sqlx::query_as::<_, CalendarEvent>(&format!(
            r#"INSERT INTO calendar_events (title, content, event_date, category, background_color, text_color, completed, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, NOW(), NOW())
               RETURNING {CALENDAR_EVENT_COLUMNS}"#
        ))
        .bind(req.title)
        .bind(req.content)
        .bind(req.event_date)
        .bind(req.category)
        .bind(req.background_color)
        .bind(req.text_color)
        .bind(req.completed)
        .fetch_one(&self.pool)
        .await?;
        Ok(event)
    }

    async fn update_calendar_event(
        &self,
        id: i64,
        req: CalendarEventRequest,
    ) -> RepoResult<Option<CalendarEvent>> {
        let event = sqlx::query_as::<_, CalendarEvent>(&format!(
            r#"UPDATE calendar_events
               SET title = $2, content = $3, event_date = $4, category = $5,
                   background_color = $6, text_color = $7, completed = $8, updated_at = NOW()
               WHERE id = $1
               RETURNING {CALENDAR_EVENT_COLUMNS}"#
        ))
        .bind(id)
        .bind(req.title)
        .bind(req.content)
        .bind(req.event_date)
        .bind(req.category)
        .bind(req.background_color)
        .bind(req.text_color)
        .bind(req.completed)
        .fetch_optional(&self.pool)
        .await?;
        Ok(event)
    }

    async fn delete_calendar_event(&self, id: i64) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM calendar_events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn toggle_calendar_event(&self, id: i64) -> RepoResult<Option<CalendarEvent>> {
        let event = sqlx::query_as::<_, CalendarEvent>(&format!(
            r#"UPDATE calendar_events
               SET completed = NOT completed, updated_at = NOW()
               WHERE id = $1
               RETURNING {CALENDAR_EVENT_COLUMNS}"#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(event)
    }

    async fn list_hero_images(&self) -> RepoResult<Vec<HeroImage>> {
        let images = sqlx::query_as::<_, HeroImage>(&format!(
            "SELECT {HERO_IMAGE_COLUMNS} FROM hero_images ORDER BY id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(images)
    }

    async fn get_hero_image(&self, name: &str) -> RepoResult<Option<HeroImage>> {
        let image = sqlx::query_as::<_, HeroImage>(&format!(
            "SELECT {HERO_IMAGE_COLUMNS} FROM hero_images WHERE name = $1"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(image)
    }

    async fn save_hero_image(&self, name: &str, image_url: &str) -> RepoResult<HeroImage> {
        let image = sqlx::query_as::<_, HeroImage>(&format!(
            r#"INSERT INTO hero_images (name, image_url, created_at, updated_at)
               VALUES ($1, $2, NOW(), NOW())
               ON CONFLICT (name) DO UPDATE
               SET image_url = EXCLUDED.image_url, updated_at = NOW()
               RETURNING {HERO_IMAGE_COLUMNS}"#
        ))
        .bind(name)
        .bind(image_url)
        .fetch_one(&self.pool)
        .await?;
        Ok(image)
    }

    async fn list_popup_messages(&self) -> RepoResult<Vec<PopupMessage>> {
        let messages = sqlx::query_as::<_, PopupMessage>(
            "SELECT id, name, content FROM popup_messages ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(messages)
    }

    async fn get_popup_message(&self, name: &str) -> RepoResult<Option<PopupMessage>> {
        let message = sqlx::query_as::<_, PopupMessage>(
            "SELECT id, name, content FROM popup_messages WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(message)
    }

    async fn save_popup_message(
        &self,
        name: &str,
        content: Option<String>,
    ) -> RepoResult<PopupMessage> {
        let message = sqlx::query_as::<_, PopupMessage>(
            r#"INSERT INTO popup_messages (name, content)
               VALUES ($1, $2)
               ON CONFLICT (name) DO UPDATE SET content = EXCLUDED.content
               RETURNING id, name, content"#,
        )
        .bind(name)
        .bind(content)
        .fetch_one(&self.pool)
        .await?;
        Ok(message)
    }
}

/// InMemoryRepository
///
/// A `Repository` held in process memory. Used by the test suites and for running
/// the API without a database. Ids are assigned sequentially, so `Vec` order is
/// storage order.
#[derive(Default)]
pub struct InMemoryRepository {
    users: RwLock<Vec<User>>,
    stands: RwLock<Vec<Stand>>,
    button_links: RwLock<Vec<ButtonLink>>,
    calendar_events: RwLock<Vec<CalendarEvent>>,
    hero_images: RwLock<Vec<HeroImage>>,
    popup_messages: RwLock<Vec<PopupMessage>>,
    next_user_id: RwLock<i64>,
    next_stand_id: RwLock<i64>,
    next_content_id: RwLock<i64>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    // One sequence shared by the content tables; ids only need to be unique per table.
    async fn next_content_id(&self) -> i64 {
        let mut next_id = self.next_content_id.write().await;
        *next_id += 1;
        *next_id
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn find_user(&self, username: &str) -> RepoResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.username == username).cloned())
    }

    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.username == user.username) {
            return Err(RepositoryError::Duplicate("username".to_string()));
        }
        let mut next_id = self.next_user_id.write().await;
        *next_id += 1;
        let created = User {
            id: *next_id,
            username: user.username,
            password_hash: user.password_hash,
            role: user.role,
            created_at: Utc::now(),
        };
        users.push(created.clone());
        Ok(created)
    }

    async fn list_stands(&self) -> RepoResult<Vec<Stand>> {
        Ok(self.stands.read().await.clone())
    }

    async fn get_stand(&self, id: i64) -> RepoResult<Option<Stand>> {
        let stands = self.stands.read().await;
        Ok(stands.iter().find(|s| s.id == id).cloned())
    }

    async fn stands_by_region(&self, region: &str) -> RepoResult<Vec<Stand>> {
        let stands = self.stands.read().await;
        Ok(stands.iter().filter(|s| s.region == region).cloned().collect())
    }

    async fn search_stands(&self, keyword: &str) -> RepoResult<Vec<Stand>> {
        let needle = keyword.to_lowercase();
        let stands = self.stands.read().await;
        Ok(stands
            .iter()
            .filter(|s| {
                s.name.to_lowercase().contains(&needle)
                    || s.address.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect())
    }

    async fn create_stand(&self, req: StandRequest) -> RepoResult<Stand> {
        let mut stands = self.stands.write().await;
        let mut next_id = self.next_stand_id.write().await;
        *next_id += 1;
        let now = Utc::now();
        let stand = Stand {
            id: *next_id,
            name: req.name,
            address: req.address,
            latitude: req.latitude,
            longitude: req.longitude,
            region: req.region,
            image_url: req.image_url,
            description: req.description,
            created_at: now,
            updated_at: now,
        };
        stands.push(stand.clone());
        Ok(stand)
    }

    async fn update_stand(&self, id: i64, req: StandRequest) -> RepoResult<Option<Stand>> {
        let mut stands = self.stands.write().await;
        let Some(stand) = stands.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };
        stand.name = req.name;
        stand.address = req.address;
        stand.latitude = req.latitude;
        stand.longitude = req.longitude;
        stand.region = req.region;
        stand.image_url = req.image_url;
        stand.description = req.description;
        stand.updated_at = Utc::now();
        Ok(Some(stand.clone()))
    }

    async fn delete_stand(&self, id: i64) -> RepoResult<Option<Stand>> {
        let mut stands = self.stands.write().await;
        let removed = stands
            .iter()
            .position(|s| s.id == id)
            .map(|index| stands.remove(index));
        Ok(removed)
    }

    async fn list_button_links(&self, active_only: bool) -> RepoResult<Vec<ButtonLink>> {
        let mut links: Vec<ButtonLink> = self
            .button_links
            .read()
            .await
            .iter()
            .filter(|l| !active_only || l.active)
            .cloned()
            .collect();
        links.sort_by(|a, b| {
            (a.link_type.as_str(), a.order_index).cmp(&(b.link_type.as_str(), b.order_index))
        });
        Ok(links)
    }

    async fn button_links_by_type(&self, link_type: &str) -> RepoResult<Vec<ButtonLink>> {
        let mut links: Vec<ButtonLink> = self
            .button_links
            .read()
            .await
            .iter()
            .filter(|l| l.active && l.link_type == link_type)
            .cloned()
            .collect();
        links.sort_by_key(|l| l.order_index);
        Ok(links)
    }

    async fn get_button_link(&self, id: i64) -> RepoResult<Option<ButtonLink>> {
        let links = self.button_links.read().await;
        Ok(links.iter().find(|l| l.id == id).cloned())
    }

    async fn create_button_link(&self, req: ButtonLinkRequest) -> RepoResult<ButtonLink> {
        let id = self.next_content_id().await;
        let now = Utc::now();
        let link = ButtonLink {
            id,
            name: req.name,
            url: req.url,
            link_type: req.link_type,
            icon_class: req.icon_class,
            order_index: req.order_index,
            active: req.active,
            created_at: now,
            updated_at: now,
        };
        self.button_links.write().await.push(link.clone());
        Ok(link)
    }

    async fn update_button_link(
        &self,
        id: i64,
        req: ButtonLinkRequest,
    ) -> RepoResult<Option<ButtonLink>> {
        let mut links = self.button_links.write().await;
        let Some(link) = links.iter_mut().find(|l| l.id == id) else {
            return Ok(None);
        };
        link.name = req.name;
        link.url = req.url;
        link.link_type = req.link_type;
        link.icon_class = req.icon_class;
        link.order_index = req.order_index;
        link.active = req.active;
        link.updated_at = Utc::now();
        Ok(Some(link.clone()))
    }

    async fn delete_button_link(&self, id: i64) -> RepoResult<bool> {
        let mut links = self.button_links.write().await;
        let before = links.len();
        links.retain(|l| l.id != id);
        Ok(links.len() != before)
    }

    async fn list_calendar_events(&self) -> RepoResult<Vec<CalendarEvent>> {
        Ok(self.calendar_events.read().await.clone())
    }

    async fn calendar_events_on(&self, date: NaiveDate) -> RepoResult<Vec<CalendarEvent>> {
        let mut events: Vec<CalendarEvent> = self
            .calendar_events
            .read()
            .await
            .iter()
            .filter(|e| e.event_date == date)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.created_at);
        Ok(events)
    }

    async fn calendar_events_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepoResult<Vec<CalendarEvent>> {
        let mut events: Vec<CalendarEvent> = self
            .calendar_events
            .read()
            .await
            .iter()
            .filter(|e| (start..=end).contains(&e.event_date))
            .cloned()
            .collect();
        events.sort_by_key(|e| (e.event_date, e.created_at));
        Ok(events)
    }

    async fn get_calendar_event(&self, id: i64) -> RepoResult<Option<CalendarEvent>> {
        let events = self.calendar_events.read().await;
        Ok(events.iter().find(|e| e.id == id).cloned())
    }

    async fn create_calendar_event(&self, req: CalendarEventRequest) -> RepoResult<CalendarEvent> {
        let id = self.next_content_id().await;
        let now = Utc::now();
        let event = CalendarEvent {
            id,
            title: req.title,
            content: req.content,
            event_date: req.event_date,
            category: req.category,
            background_color: req.background_color,
            text_color: req.text_color,
            completed: req.completed,
            created_at: now,
            updated_at: now,
        };
        self.calendar_events.write().await.push(event.clone());
        Ok(event)
    }

    async fn update_calendar_event(
        &self,
        id: i64,
        req: CalendarEventRequest,
    ) -> RepoResult<Option<CalendarEvent>> {
        let mut events = self.calendar_events.write().await;
        let Some(event) = events.iter_mut().find(|e| e.id == id) else {
            return Ok(None);
        };
        event.title = req.title;
        event.content = req.content;
        event.event_date = req.event_date;
        event.category = req.category;
        event.background_color = req.background_color;
        event.text_color = req.text_color;
        event.completed = req.completed;
        event.updated_at = Utc::now();
        Ok(Some(event.clone()))
    }

    async fn delete_calendar_event(&self, id: i64) -> RepoResult<bool> {
        let mut events = self.calendar_events.write().await;
        let before = events.len();
        events.retain(|e| e.id != id);
        Ok(events.len() != before)
    }

    async fn toggle_calendar_event(&self, id: i64) -> RepoResult<Option<CalendarEvent>> {
        let mut events = self.calendar_events.write().await;
        let Some(event) = events.iter_mut().find(|e| e.id == id) else {
            return Ok(None);
        };
        event.completed = !event.completed;
        event.updated_at = Utc::now();
        Ok(Some(event.clone()))
    }

    async fn list_hero_images(&self) -> RepoResult<Vec<HeroImage>> {
        Ok(self.hero_images.read().await.clone())
    }

    async fn get_hero_image(&self, name: &str) -> RepoResult<Option<HeroImage>> {
        let images = self.hero_images.read().await;
        Ok(images.iter().find(|i| i.name == name).cloned())
    }

    async fn save_hero_image(&self, name: &str, image_url: &str) -> RepoResult<HeroImage> {
        let mut images = self.hero_images.write().await;
        let now = Utc::now();
        if let Some(image) = images.iter_mut().find(|i| i.name == name) {
            image.image_url = Some(image_url.to_string());
            image.updated_at = now;
            return Ok(image.clone());
        }
        let image = HeroImage {
            id: self.next_content_id().await,
            name: name.to_string(),
            image_url: Some(image_url.to_string()),
            created_at: now,
            updated_at: now,
        };
        images.push(image.clone());
        Ok(image)
    }

    async fn list_popup_messages(&self) -> RepoResult<Vec<PopupMessage>> {
        Ok(self.popup_messages.read().await.clone())
    }

    async fn get_popup_message(&self, name: &str) -> RepoResult<Option<PopupMessage>> {
        let messages = self.popup_messages.read().await;
        Ok(messages.iter().find(|m| m.name == name).cloned())
    }

    async fn save_popup_message(
        &self,
        name: &str,
        content: Option<String>,
    ) -> RepoResult<PopupMessage> {
        let mut messages = self.popup_messages.write().await;
        if let Some(message) = messages.iter_mut().find(|m| m.name == name) {
            message.content = content;
            return Ok(message.clone());
        }
        let message = PopupMessage {
            id: self.next_content_id().await,
            name: name.to_string(),
            content,
        };
        messages.push(message.clone());
        Ok(message)
    }
}
