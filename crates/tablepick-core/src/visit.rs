//! A recorded visit and its rating.
//!
//! Visits feed three consumers: the recent-history lookup used for
//! anti-repetition, the rating aggregation behind each restaurant's
//! [`RatingSnapshot`](crate::RatingSnapshot), and preference learning.
//! The visit log stores one JSON object per line.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// One visit to a restaurant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Visit {
    pub id: String,
    pub restaurant_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub date_visited: OffsetDateTime,
    /// Star rating, 1–5.
    pub rating: u8,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Whether the drawn restaurant matched what the user was after.
    #[serde(default)]
    pub is_match: bool,
    #[serde(default)]
    pub would_return: bool,
}

impl Visit {
    /// New visit dated now; the rating is clamped to 1–5.
    #[must_use]
    pub fn new(restaurant_id: impl Into<String>, rating: u8) -> Self {
        let restaurant_id = restaurant_id.into();
        let date_visited = OffsetDateTime::now_utc();
        Self {
            id: format!("{restaurant_id}-{}", date_visited.unix_timestamp_nanos()),
            restaurant_id,
            date_visited,
            rating: rating.clamp(1, 5),
            tags: Vec::new(),
            note: None,
            is_match: false,
            would_return: false,
        }
    }

    #[must_use]
    pub fn at(mut self, date_visited: OffsetDateTime) -> Self {
        self.date_visited = date_visited;
        self
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn visit_from_json_line() {
        let line = json!({
            "id": "v1",
            "restaurant_id": "r1",
            "date_visited": "2025-12-29T19:30:00Z",
            "rating": 4,
            "tags": ["sushi"]
        });
        let visit: Visit = serde_json::from_value(line).expect("visit");
        assert_eq!(visit.restaurant_id, "r1");
        assert_eq!(visit.rating, 4);
        assert!(visit.note.is_none());
        assert!(!visit.would_return);
    }

    #[test]
    fn new_visit_clamps_rating() {
        assert_eq!(Visit::new("r1", 9).rating, 5);
        assert_eq!(Visit::new("r1", 0).rating, 1);
        assert!(Visit::new("r1", 3).id.starts_with("r1-"));
    }
}
