use tablepick_core::{LearnedPreferences, PreferencesStore, StoreError};

/// Applies ratings to the stored [`LearnedPreferences`].
///
/// Does nothing while learning is disabled; the flag is the caller's
/// setting, read at construction.
#[derive(Debug)]
pub struct PreferenceLearningService<S> {
    store: S,
    learning_enabled: bool,
}

impl<S: PreferencesStore> PreferenceLearningService<S> {
    pub fn new(store: S, learning_enabled: bool) -> Self {
        Self {
            store,
            learning_enabled,
        }
    }

    #[must_use]
    pub fn is_learning_enabled(&self) -> bool {
        self.learning_enabled
    }

    pub fn load_preferences(&self) -> Result<LearnedPreferences, StoreError> {
        self.store.load()
    }

    pub fn reset_preferences(&self) -> Result<(), StoreError> {
        self.store.reset()
    }

    /// Adds the rating's delta to every non-empty tag and to the category,
    /// then saves. Returns the preferences as they are after the call.
    ///
    /// A neutral rating (3) or disabled learning leaves the store untouched.
    pub fn apply_rating<T: AsRef<str>>(
        &self,
        rating: i32,
        tags: &[T],
        category: &str,
    ) -> Result<LearnedPreferences, StoreError> {
        let mut prefs = self.store.load()?;
        if !self.learning_enabled {
            return Ok(prefs);
        }

        let delta = LearnedPreferences::weight_delta(rating);
        if delta == 0.0 {
            return Ok(prefs);
        }

        for tag in tags {
            let tag: &str = tag.as_ref();
            if !tag.trim().is_empty() {
                prefs.update_tag_weight(tag, delta);
            }
        }
        if !category.trim().is_empty() {
            prefs.update_category_weight(category, delta);
        }

        self.store.save(&prefs)?;
        Ok(prefs)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    #[derive(Default)]
    struct MemoryStore {
        prefs: RefCell<Option<LearnedPreferences>>,
        saves: Cell<usize>,
    }

    impl PreferencesStore for MemoryStore {
        fn load(&self) -> Result<LearnedPreferences, StoreError> {
            Ok(self.prefs.borrow().clone().unwrap_or_default())
        }
        fn save(&self, prefs: &LearnedPreferences) -> Result<(), StoreError> {
            self.saves.set(self.saves.get() + 1);
            *self.prefs.borrow_mut() = Some(prefs.clone());
            Ok(())
        }
        fn reset(&self) -> Result<(), StoreError> {
            *self.prefs.borrow_mut() = None;
            Ok(())
        }
    }

    #[test]
    fn five_stars_raise_tags_and_category() {
        let service = PreferenceLearningService::new(MemoryStore::default(), true);
        let prefs = service
            .apply_rating(5, &["Sushi", "Japonês"], "Japonês")
            .expect("apply");

        assert_eq!(prefs.weight_for_tag("sushi"), 1.0);
        assert_eq!(prefs.weight_for_tag("japonês"), 1.0);
        assert_eq!(prefs.weight_for_category("japonês"), 1.0);
        assert_eq!(service.store.saves.get(), 1);
    }

    #[test]
    fn repeated_low_ratings_accumulate_and_clamp() {
        let service = PreferenceLearningService::new(MemoryStore::default(), true);
        for _ in 0..12 {
            service.apply_rating(1, &["fast food"], "Lanches").expect("apply");
        }
        let prefs = service.load_preferences().expect("load");
        assert_eq!(prefs.weight_for_tag("fast food"), -5.0);
        assert_eq!(prefs.weight_for_category("lanches"), -5.0);
    }

    #[test]
    fn neutral_rating_does_not_save() {
        let service = PreferenceLearningService::new(MemoryStore::default(), true);
        let prefs = service.apply_rating(3, &["pizza"], "Italiano").expect("apply");
        assert!(!prefs.has_learned_preferences());
        assert_eq!(service.store.saves.get(), 0);
    }

    #[test]
    fn disabled_learning_leaves_store_untouched() {
        let service = PreferenceLearningService::new(MemoryStore::default(), false);
        assert!(!service.is_learning_enabled());
        let prefs = service.apply_rating(5, &["pizza"], "Italiano").expect("apply");
        assert!(!prefs.has_learned_preferences());
        assert_eq!(service.store.saves.get(), 0);
    }

    #[test]
    fn blank_tags_and_category_are_skipped() {
        let service = PreferenceLearningService::new(MemoryStore::default(), true);
        let prefs = service.apply_rating(4, &["", "  ", "ramen"], "").expect("apply");
        assert_eq!(prefs.total_weights_count(), 1);
        assert_eq!(prefs.weight_for_tag("ramen"), 0.5);
    }

    #[test]
    fn reset_clears_learned_weights() {
        let service = PreferenceLearningService::new(MemoryStore::default(), true);
        service.apply_rating(5, &["ramen"], "Japonês").expect("apply");
        service.reset_preferences().expect("reset");
        let prefs = service.load_preferences().expect("load");
        assert!(!prefs.has_learned_preferences());
    }
}
