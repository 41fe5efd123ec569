mod common;

use axum::http::{Method, StatusCode};
use chrono::NaiveDate;
use common::{ScriptedProvider, admin_token, default_state, expect_json, send, test_state, user_token};
use mapboard::{
    InMemoryRepository, create_router,
    models::{ButtonLinkRequest, CalendarEventRequest, DEFAULT_EVENT_BACKGROUND},
    repository::Repository,
    storage::MockStorageService,
};
use serde_json::{Value, json};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
}

fn link(name: &str, link_type: &str, order_index: i32, active: bool) -> ButtonLinkRequest {
    ButtonLinkRequest {
        name: name.to_string(),
        url: format!("https://example.com/{name}"),
        link_type: link_type.to_string(),
        order_index,
        active,
        ..ButtonLinkRequest::default()
    }
}

fn ids(body: &Value) -> Vec<i64> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|v| v["id"].as_i64().unwrap())
        .collect()
}

// --- Repository ---

#[tokio::test]
async fn test_button_links_ordering_and_filters() {
    let repo = InMemoryRepository::new();
    let g2 = repo.create_button_link(link("g2", "green", 2, true)).await.unwrap();
    let o1 = repo.create_button_link(link("o1", "orange", 1, true)).await.unwrap();
    let g1 = repo.create_button_link(link("g1", "green", 1, false)).await.unwrap();
    let o0 = repo.create_button_link(link("o0", "orange", 0, true)).await.unwrap();

    let all: Vec<i64> = repo.list_button_links(false).await.unwrap().iter().map(|l| l.id).collect();
    assert_eq!(all, vec![g1.id, g2.id, o0.id, o1.id]);

    let active: Vec<i64> = repo.list_button_links(true).await.unwrap().iter().map(|l| l.id).collect();
    assert_eq!(active, vec![g2.id, o0.id, o1.id]);

    // Inactive links never show up in a group.
    let green: Vec<i64> = repo.button_links_by_type("green").await.unwrap().iter().map(|l| l.id).collect();
    assert_eq!(green, vec![g2.id]);
    assert!(repo.button_links_by_type("blue").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_button_link_update_and_delete() {
    let repo = InMemoryRepository::new();
    let created = repo.create_button_link(link("docs", "orange", 0, true)).await.unwrap();

    let updated = repo
        .update_button_link(created.id, link("docs v2", "green", 5, false))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.name, "docs v2");
    assert_eq!(updated.link_type, "green");
    assert!(!updated.active);
    assert!(repo.update_button_link(999, link("x", "green", 0, true)).await.unwrap().is_none());

    assert!(repo.delete_button_link(created.id).await.unwrap());
    assert!(!repo.delete_button_link(created.id).await.unwrap());
}

#[tokio::test]
async fn test_calendar_day_and_range_queries() {
    let repo = InMemoryRepository::new();
    let late = repo.create_calendar_event(CalendarEventRequest::new("late", day(20))).await.unwrap();
    let first = repo.create_calendar_event(CalendarEventRequest::new("first", day(5))).await.unwrap();
    let second = repo.create_calendar_event(CalendarEventRequest::new("second", day(5))).await.unwrap();
    let outside = repo.create_calendar_event(CalendarEventRequest::new("april", day(31).succ_opt().unwrap())).await.unwrap();

    let on_fifth: Vec<i64> = repo.calendar_events_on(day(5)).await.unwrap().iter().map(|e| e.id).collect();
    assert_eq!(on_fifth, vec![first.id, second.id]);

    // Both ends inclusive.
    let march: Vec<i64> = repo
        .calendar_events_between(day(5), day(20))
        .await
        .unwrap()
        .iter()
        .map(|e| e.id)
        .collect();
    assert_eq!(march, vec![first.id, second.id, late.id]);
    assert!(!march.contains(&outside.id));
}

#[tokio::test]
async fn test_calendar_toggle_flips_completion() {
    let repo = InMemoryRepository::new();
    let event = repo.create_calendar_event(CalendarEventRequest::new("deadline", day(1))).await.unwrap();
    assert!(!event.completed);
    assert_eq!(event.background_color, DEFAULT_EVENT_BACKGROUND);

    let toggled = repo.toggle_calendar_event(event.id).await.unwrap().unwrap();
    assert!(toggled.completed);
    let toggled = repo.toggle_calendar_event(event.id).await.unwrap().unwrap();
    assert!(!toggled.completed);
    assert!(repo.toggle_calendar_event(999).await.unwrap().is_none());
}

#[tokio::test]
async fn test_hero_and_popup_upsert_by_name() {
    let repo = InMemoryRepository::new();
    let first = repo.save_hero_image("hero1", "hero/a.png").await.unwrap();
    let again = repo.save_hero_image("hero1", "hero/b.png").await.unwrap();
    assert_eq!(first.id, again.id);
    assert_eq!(again.image_url.as_deref(), Some("hero/b.png"));
    assert_eq!(repo.list_hero_images().await.unwrap().len(), 1);

    let notice = repo.save_popup_message("notice", Some("closed".into())).await.unwrap();
    let cleared = repo.save_popup_message("notice", None).await.unwrap();
    assert_eq!(notice.id, cleared.id);
    assert!(cleared.content.is_none());
    assert!(repo.get_popup_message("webhard").await.unwrap().is_none());
}

// --- Endpoints ---

#[tokio::test]
async fn test_button_link_endpoints() {
    let state = default_state().await;
    let admin = admin_token(&state);
    let user = user_token(&state);
    let app = create_router(state);

    let response = send(
        &app,
        Method::POST,
        "/api/admin/button-links",
        Some(&admin),
        Some(json!({"name": "Webhard", "url": "https://example.com", "type": "orange", "iconClass": "fa-cloud"})),
    )
    .await;
    let created = expect_json(response, StatusCode::CREATED).await;
    assert_eq!(created["type"], "orange");
    assert_eq!(created["iconClass"], "fa-cloud");
    assert_eq!(created["active"], true);
    assert_eq!(created["orderIndex"], 0);
    let id = created["id"].as_i64().unwrap();

    let response = send(&app, Method::GET, "/api/button-links/type/orange", Some(&user), None).await;
    assert_eq!(ids(&expect_json(response, StatusCode::OK).await), vec![id]);

    let response = send(
        &app,
        Method::PUT,
        &format!("/api/admin/button-links/{id}"),
        Some(&admin),
        Some(json!({"name": "Webhard", "url": "https://example.com", "type": "orange", "active": false})),
    )
    .await;
    assert_eq!(expect_json(response, StatusCode::OK).await["active"], false);

    let response = send(&app, Method::GET, "/api/button-links?activeOnly=true", Some(&user), None).await;
    assert!(ids(&expect_json(response, StatusCode::OK).await).is_empty());

    let response = send(&app, Method::DELETE, &format!("/api/admin/button-links/{id}"), Some(&admin), None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(&app, Method::GET, &format!("/api/button-links/{id}"), Some(&user), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_button_link_requires_fields() {
    let state = default_state().await;
    let admin = admin_token(&state);
    let app = create_router(state);

    let response = send(
        &app,
        Method::POST,
        "/api/admin/button-links",
        Some(&admin),
        Some(json!({"name": " ", "url": "https://example.com", "type": "green"})),
    )
    .await;
    let body = expect_json(response, StatusCode::BAD_REQUEST).await;
    assert_eq!(body["error"], "button link name is required");
}

#[tokio::test]
async fn test_calendar_event_endpoints() {
    let state = default_state().await;
    let admin = admin_token(&state);
    let user = user_token(&state);
    let app = create_router(state);

    let response = send(
        &app,
        Method::POST,
        "/api/admin/calendar-events",
        Some(&admin),
        Some(json!({"title": "Poster swap", "eventDate": "2025-03-05", "category": "ops"})),
    )
    .await;
    let created = expect_json(response, StatusCode::CREATED).await;
    assert_eq!(created["eventDate"], "2025-03-05");
    assert_eq!(created["backgroundColor"], "#3b82f6");
    assert_eq!(created["textColor"], "#ffffff");
    assert_eq!(created["completed"], false);
    let id = created["id"].as_i64().unwrap();

    let response = send(&app, Method::GET, "/api/calendar-events/date/2025-03-05", Some(&user), None).await;
    assert_eq!(ids(&expect_json(response, StatusCode::OK).await), vec![id]);

    let response = send(
        &app,
        Method::GET,
        "/api/calendar-events/range?startDate=2025-03-01&endDate=2025-03-05",
        Some(&user),
        None,
    )
    .await;
    assert_eq!(ids(&expect_json(response, StatusCode::OK).await), vec![id]);

    let response = send(
        &app,
        Method::PATCH,
        &format!("/api/admin/calendar-events/{id}/toggle-complete"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(expect_json(response, StatusCode::OK).await["completed"], true);

    let response = send(
        &app,
        Method::PUT,
        &format!("/api/admin/calendar-events/{id}"),
        Some(&admin),
        Some(json!({"title": "Poster swap", "eventDate": "2025-03-06", "backgroundColor": "#ef4444"})),
    )
    .await;
    let updated = expect_json(response, StatusCode::OK).await;
    assert_eq!(updated["eventDate"], "2025-03-06");
    assert_eq!(updated["backgroundColor"], "#ef4444");
    // Full replacement: omitted `completed` resets to false.
    assert_eq!(updated["completed"], false);

    let response = send(&app, Method::DELETE, &format!("/api/admin/calendar-events/{id}"), Some(&admin), None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = send(&app, Method::GET, &format!("/api/calendar-events/{id}"), Some(&user), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_calendar_rejects_bad_dates() {
    let state = default_state().await;
    let user = user_token(&state);
    let app = create_router(state);

    for uri in [
        "/api/calendar-events/date/2025-13-40",
        "/api/calendar-events/range?startDate=2025-03-10&endDate=2025-03-01",
        "/api/calendar-events/range?startDate=2025-03-10",
    ] {
        let response = send(&app, Method::GET, uri, Some(&user), None).await;
        let body = expect_json(response, StatusCode::BAD_REQUEST).await;
        assert!(body["error"].is_string(), "uri: {uri}");
    }
}

#[tokio::test]
async fn test_hero_image_replacement_deletes_managed_image() {
    let storage = MockStorageService::new();
    let state = test_state(storage.clone(), ScriptedProvider::default()).await;
    let admin = admin_token(&state);
    let user = user_token(&state);
    let app = create_router(state);

    let response = send(
        &app,
        Method::POST,
        "/api/admin/hero-images/image-upload",
        Some(&admin),
        Some(json!({"filename": "banner.PNG", "fileType": "image/png"})),
    )
    .await;
    let upload = expect_json(response, StatusCode::OK).await;
    let key = upload["resourceKey"].as_str().unwrap().to_string();
    assert!(key.starts_with("hero/") && key.ends_with(".png"));

    let response = send(
        &app,
        Method::PUT,
        "/api/admin/hero-images/hero1",
        Some(&admin),
        Some(json!({"imageUrl": &key})),
    )
    .await;
    assert_eq!(expect_json(response, StatusCode::OK).await["imageUrl"], key.as_str());

    let response = send(
        &app,
        Method::PUT,
        "/api/admin/hero-images/hero1",
        Some(&admin),
        Some(json!({"imageUrl": "https://cdn.example.com/banner.jpg"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(storage.deleted_keys().await, vec![key]);

    let response = send(&app, Method::GET, "/api/hero-images/hero1", Some(&user), None).await;
    let body = expect_json(response, StatusCode::OK).await;
    assert_eq!(body["imageUrl"], "https://cdn.example.com/banner.jpg");

    let response = send(&app, Method::GET, "/api/hero-images/hero2", Some(&user), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_popup_message_endpoints() {
    let state = default_state().await;
    let admin = admin_token(&state);
    let user = user_token(&state);
    let app = create_router(state);

    let response = send(&app, Method::GET, "/api/popup-messages/notice", Some(&user), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    for content in ["Closed on Monday", "Open as usual"] {
        let response = send(
            &app,
            Method::PUT,
            "/api/admin/popup-messages/notice",
            Some(&admin),
            Some(json!({"content": content})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = send(&app, Method::GET, "/api/popup-messages", Some(&user), None).await;
    let all = expect_json(response, StatusCode::OK).await;
    assert_eq!(all.as_array().unwrap().len(), 1);
    assert_eq!(all[0]["name"], "notice");
    assert_eq!(all[0]["content"], "Open as usual");
}

#[tokio::test]
async fn test_content_writes_are_admin_only() {
    let state = default_state().await;
    let user = user_token(&state);
    let app = create_router(state);

    let writes = [
        (Method::POST, "/api/admin/button-links"),
        (Method::POST, "/api/admin/calendar-events"),
        (Method::PATCH, "/api/admin/calendar-events/1/toggle-complete"),
        (Method::PUT, "/api/admin/hero-images/hero1"),
        (Method::PUT, "/api/admin/popup-messages/notice"),
    ];
    for (method, uri) in writes {
        let response = send(&app, method.clone(), uri, Some(&user), Some(json!({}))).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{method} {uri}");

        let response = send(&app, method.clone(), uri, None, Some(json!({}))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{method} {uri}");
    }

    // Reads still need a login.
    let response = send(&app, Method::GET, "/api/calendar-events", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
