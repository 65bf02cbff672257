//! The restaurant record handed to the draw engine.
//!
//! Restaurants come from the catalogue file (`{"restaurants": [...]}`) and are
//! read-only for the engine. A record without coordinates still loads; its
//! `lat`/`lng` become NaN and [`Restaurant::coordinate`] reports `None`, so
//! any radius filter drops it.

use geo::{Distance, Haversine, Point};
use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;

/// Average at or above which a rated restaurant counts as well rated.
pub const WELL_RATED_THRESHOLD: f64 = 4.0;

/// WGS84 position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Both components finite and inside the WGS84 ranges.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Great-circle distance in metres.
    #[must_use]
    pub fn distance_meters(&self, other: &GeoPoint) -> f64 {
        Haversine.distance(Point::from(*self), Point::from(*other))
    }
}

impl From<GeoPoint> for Point<f64> {
    fn from(p: GeoPoint) -> Self {
        // geo uses x = longitude, y = latitude
        Point::new(p.lng, p.lat)
    }
}

/// Internal rating derived from the user's own visits.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RatingSnapshot {
    /// Mean of visit ratings (0–5); 0 when unrated.
    #[serde(default)]
    pub average: f64,
    #[serde(default)]
    pub count: u32,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_visited_at: Option<OffsetDateTime>,
}

impl RatingSnapshot {
    #[must_use]
    pub fn new(average: f64, count: u32) -> Self {
        Self {
            average,
            count,
            last_visited_at: None,
        }
    }

    #[must_use]
    pub const fn has_ratings(&self) -> bool {
        self.count > 0
    }

    #[must_use]
    pub fn is_highly_rated(&self) -> bool {
        self.count > 0 && self.average >= WELL_RATED_THRESHOLD
    }
}

/// A curated restaurant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_link: Option<String>,
    #[serde(default = "nan", deserialize_with = "nullable_coordinate")]
    pub lat: f64,
    #[serde(default = "nan", deserialize_with = "nullable_coordinate")]
    pub lng: f64,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub rating: RatingSnapshot,
}

impl Restaurant {
    /// Minimal record; used by tests and ad-hoc candidate lists.
    #[must_use]
    pub fn new(id: impl Into<String>, category: impl Into<String>, tags: Vec<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            category: category.into(),
            address: String::new(),
            city: String::new(),
            state: String::new(),
            tags,
            notes: String::new(),
            external_link: None,
            lat: f64::NAN,
            lng: f64::NAN,
            is_favorite: false,
            rating: RatingSnapshot::default(),
        }
    }

    #[must_use]
    pub fn with_location(mut self, lat: f64, lng: f64) -> Self {
        self.lat = lat;
        self.lng = lng;
        self
    }

    #[must_use]
    pub fn with_rating(mut self, average: f64, count: u32) -> Self {
        self.rating = RatingSnapshot::new(average, count);
        self
    }

    /// Usable coordinate, if any.
    #[must_use]
    pub fn coordinate(&self) -> Option<GeoPoint> {
        let point = GeoPoint::new(self.lat, self.lng);
        point.is_valid().then_some(point)
    }

    /// Lowercased tags, for case-insensitive matching.
    pub fn normalized_tags(&self) -> impl Iterator<Item = String> + '_ {
        self.tags.iter().map(|t| t.to_lowercase())
    }
}

/// The catalogue file layout: `{"restaurants": [...]}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RestaurantCatalog {
    pub restaurants: Vec<Restaurant>,
}

impl RestaurantCatalog {
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Restaurant> {
        self.restaurants.iter().find(|r| r.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Restaurant> {
        self.restaurants.iter_mut().find(|r| r.id == id)
    }
}

fn nan() -> f64 {
    f64::NAN
}

fn nullable_coordinate<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn catalog_entry_without_coordinates_has_no_location() {
        let value = json!({
            "restaurants": [
                {"id": "r1", "name": "Sushi Place", "category": "Japonês",
                 "tags": ["sushi", "japonês"], "lat": -23.56, "lng": -46.65},
                {"id": "r2", "name": "Pizza", "category": "Italiano",
                 "tags": ["pizza"], "lat": null}
            ]
        });
        let catalog: RestaurantCatalog = serde_json::from_value(value).expect("catalog");

        let first = catalog.get("r1").expect("r1");
        assert!(first.coordinate().is_some());
        assert!(!first.rating.has_ratings());

        let second = catalog.get("r2").expect("r2");
        assert!(second.coordinate().is_none());
        assert!(second.external_link.is_none());
    }

    #[test]
    fn well_rated_requires_count_and_threshold() {
        assert!(RatingSnapshot::new(4.0, 1).is_highly_rated());
        assert!(!RatingSnapshot::new(3.9, 12).is_highly_rated());
        assert!(!RatingSnapshot::new(5.0, 0).is_highly_rated());
    }

    #[test]
    fn distance_between_known_points() {
        // Avenida Paulista to Praça da Sé, roughly 2.8 km apart.
        let paulista = GeoPoint::new(-23.5614, -46.6559);
        let se = GeoPoint::new(-23.5503, -46.6339);
        let d = paulista.distance_meters(&se);
        assert!((2_000.0..3_500.0).contains(&d), "unexpected distance {d}");
        assert!(paulista.distance_meters(&paulista) < 1e-6);
    }

    #[test]
    fn out_of_range_coordinates_are_rejected() {
        let r = Restaurant::new("x", "bar", vec![]).with_location(120.0, 10.0);
        assert!(r.coordinate().is_none());
    }
}
