#![warn(clippy::unwrap_used, clippy::expect_used)]

//! Core types for tablepick.
//!
//! Holds the restaurant record the draw engine reads, the per-draw
//! [`PreferenceContext`], the [`LearnedPreferences`] affinity weights and the
//! small traits through which the engine reaches its collaborators (visit
//! history and the preferences store).

pub mod context;
pub mod error;
pub mod preferences;
pub mod restaurant;
pub mod visit;

pub use context::{PreferenceContext, RatingPriority};
pub use error::{HistoryError, StoreError};
pub use preferences::LearnedPreferences;
pub use restaurant::{GeoPoint, RatingSnapshot, Restaurant, RestaurantCatalog};
pub use visit::Visit;

/// Source of recently visited restaurant IDs, most recent first.
pub trait RecentHistoryProvider {
    fn recent_ids(&self, limit: usize) -> Result<Vec<String>, HistoryError>;
}

/// Persistence for [`LearnedPreferences`].
pub trait PreferencesStore {
    fn load(&self) -> Result<LearnedPreferences, StoreError>;
    fn save(&self, prefs: &LearnedPreferences) -> Result<(), StoreError>;
    fn reset(&self) -> Result<(), StoreError>;
}

/// Read access to recorded visits.
pub trait VisitRepository {
    /// All visits, ordered by `date_visited` descending.
    fn fetch_all(&self) -> Result<Vec<Visit>, HistoryError>;

    /// Visits for one restaurant, most recent first.
    fn fetch_for(&self, restaurant_id: &str) -> Result<Vec<Visit>, HistoryError> {
        Ok(self
            .fetch_all()?
            .into_iter()
            .filter(|v| v.restaurant_id == restaurant_id)
            .collect())
    }
}

impl<T: RecentHistoryProvider + ?Sized> RecentHistoryProvider for &T {
    fn recent_ids(&self, limit: usize) -> Result<Vec<String>, HistoryError> {
        (**self).recent_ids(limit)
    }
}

impl<T: PreferencesStore + ?Sized> PreferencesStore for &T {
    fn load(&self) -> Result<LearnedPreferences, StoreError> {
        (**self).load()
    }
    fn save(&self, prefs: &LearnedPreferences) -> Result<(), StoreError> {
        (**self).save(prefs)
    }
    fn reset(&self) -> Result<(), StoreError> {
        (**self).reset()
    }
}
