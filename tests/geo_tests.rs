use chrono::Utc;
use mapboard::{
    InMemoryRepository,
    geo::{Coordinates, haversine_km, within_radius},
    models::{Stand, StandRequest},
    repository::Repository,
};

const DAEGU: Coordinates = Coordinates::new(35.8691, 128.5975);

fn stand(id: i64, latitude: f64, longitude: f64) -> Stand {
    Stand {
        id,
        name: format!("stand-{id}"),
        address: String::new(),
        latitude,
        longitude,
        region: String::new(),
        image_url: None,
        description: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn ids(stands: &[Stand]) -> Vec<i64> {
    stands.iter().map(|s| s.id).collect()
}

#[test]
fn test_haversine_identical_points_is_zero() {
    assert_eq!(haversine_km(DAEGU, DAEGU), 0.0);
}

#[test]
fn test_haversine_is_symmetric() {
    let seoul = Coordinates::new(37.5665, 126.9780);
    let forward = haversine_km(DAEGU, seoul);
    let backward = haversine_km(seoul, DAEGU);

    assert!((forward - backward).abs() < 1e-9);
    // Seoul-Daegu is roughly 237 km as the crow flies.
    assert!((230.0..245.0).contains(&forward), "got {forward}");
}

#[test]
fn test_haversine_antipodal_points() {
    let d = haversine_km(Coordinates::new(0.0, 0.0), Coordinates::new(0.0, 180.0));
    let half_circumference = std::f64::consts::PI * 6371.0;
    assert!((d - half_circumference).abs() < 1e-6);
}

#[test]
fn test_zero_radius_returns_only_coincident_stands() {
    let stands = vec![
        stand(1, DAEGU.latitude, DAEGU.longitude),
        stand(2, 35.8700, 128.5975),
        stand(3, DAEGU.latitude, DAEGU.longitude),
    ];

    let found = within_radius(stands, DAEGU, 0.0);
    assert_eq!(ids(&found), vec![1, 3]);
}

#[test]
fn test_radius_boundary_is_inclusive() {
    let far = stand(1, 35.9, 128.6);
    let exact = haversine_km(DAEGU, far.coordinates());

    assert_eq!(ids(&within_radius(vec![far.clone()], DAEGU, exact)), vec![1]);
    assert!(within_radius(vec![far], DAEGU, exact * 0.999).is_empty());
}

#[test]
fn test_within_radius_preserves_storage_order() {
    // Farther stand first: output is not sorted by distance.
    let stands = vec![
        stand(7, 35.8780, 128.5975),
        stand(3, 35.8692, 128.5975),
        stand(9, 36.5, 129.0),
        stand(5, 35.8691, 128.5980),
    ];

    let found = within_radius(stands, DAEGU, 2.0);
    assert_eq!(ids(&found), vec![7, 3, 5]);
}

#[test]
fn test_coordinates_validation() {
    assert!(DAEGU.is_valid());
    assert!(Coordinates::new(-90.0, 180.0).is_valid());
    assert!(!Coordinates::new(90.5, 0.0).is_valid());
    assert!(!Coordinates::new(0.0, -180.5).is_valid());
    assert!(!Coordinates::new(f64::NAN, 0.0).is_valid());
}

#[tokio::test]
async fn test_repository_radius_search_scenario() {
    let repo = InMemoryRepository::new();
    let created = repo
        .create_stand(StandRequest {
            name: "Dongseong-ro board".to_string(),
            latitude: DAEGU.latitude,
            longitude: DAEGU.longitude,
            ..StandRequest::default()
        })
        .await
        .unwrap();

    let near = repo.stands_within_radius(DAEGU, 1.0).await.unwrap();
    assert_eq!(ids(&near), vec![created.id]);

    // 0.45 degrees of latitude is about 50 km.
    let away = Coordinates::new(DAEGU.latitude + 0.45, DAEGU.longitude);
    assert!((49.0..51.0).contains(&haversine_km(DAEGU, away)));
    assert!(repo.stands_within_radius(away, 1.0).await.unwrap().is_empty());
}
