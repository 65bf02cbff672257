//! Loads a representative catalogue file and checks the derived views the
//! draw engine relies on.

use tablepick_core::{GeoPoint, RestaurantCatalog};

const FIXTURE: &str = include_str!("fixtures/restaurants.json");

fn catalog() -> RestaurantCatalog {
    serde_json::from_str(FIXTURE).unwrap_or_else(|e| panic!("fixture does not parse: {e}"))
}

#[test]
fn fixture_loads_with_defaults_for_missing_fields() {
    let catalog = catalog();
    assert_eq!(catalog.restaurants.len(), 4);

    let bare = catalog
        .get("new-place")
        .unwrap_or_else(|| panic!("new-place missing"));
    assert!(bare.tags.is_empty());
    assert!(bare.category.is_empty());
    assert!(bare.coordinate().is_none());
    assert!(!bare.rating.has_ratings());
}

#[test]
fn null_coordinates_are_unusable() {
    let catalog = catalog();
    let truck = catalog
        .get("food-truck")
        .unwrap_or_else(|| panic!("food-truck missing"));
    assert!(truck.lat.is_nan());
    assert!(truck.coordinate().is_none());
}

#[test]
fn rating_snapshots_classify_candidates() {
    let catalog = catalog();
    let rated: Vec<(&str, bool, bool)> = catalog
        .restaurants
        .iter()
        .map(|r| (r.id.as_str(), r.rating.has_ratings(), r.rating.is_highly_rated()))
        .collect();
    assert_eq!(
        rated,
        vec![
            ("kinoshita", true, true),
            ("bar-da-dona-onca", true, false),
            ("food-truck", false, false),
            ("new-place", false, false),
        ]
    );
    let kinoshita = catalog
        .get("kinoshita")
        .unwrap_or_else(|| panic!("kinoshita missing"));
    assert!(kinoshita.rating.last_visited_at.is_some());
}

#[test]
fn distances_between_located_restaurants() {
    let catalog = catalog();
    let from = GeoPoint::new(-23.5614, -46.6559); // Avenida Paulista
    let mut located: Vec<(&str, f64)> = catalog
        .restaurants
        .iter()
        .filter_map(|r| r.coordinate().map(|c| (r.id.as_str(), from.distance_meters(&c))))
        .collect();
    located.sort_by(|a, b| a.1.total_cmp(&b.1));

    assert_eq!(located.len(), 2);
    assert_eq!(located[0].0, "bar-da-dona-onca");
    assert!(located.iter().all(|(_, m)| *m > 1_000.0 && *m < 5_000.0));
}

#[test]
fn tags_are_matched_lowercase() {
    let catalog = catalog();
    let kinoshita = catalog
        .get("kinoshita")
        .unwrap_or_else(|| panic!("kinoshita missing"));
    let tags: Vec<String> = kinoshita.normalized_tags().collect();
    assert_eq!(tags, vec!["sushi", "omakase", "peixe"]);
}
