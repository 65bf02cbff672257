//! Learned affinity weights per tag and per category.
//!
//! Weights are accumulated from visit ratings (see [`LearnedPreferences::weight_delta`])
//! and only ever bias the draw: [`LearnedPreferences::sorting_weight`] never
//! drops below [`SORTING_WEIGHT_FLOOR`], so a disliked restaurant keeps a
//! small chance. Excluding a restaurant outright is left to the hard filters.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use time::OffsetDateTime;

/// Current schema version of the persisted preferences.
pub const CURRENT_VERSION: u32 = 1;
/// Lower clamp bound for any stored weight.
pub const MIN_WEIGHT: f64 = -5.0;
/// Upper clamp bound for any stored weight.
pub const MAX_WEIGHT: f64 = 5.0;
/// Weight of a tag or category that was never rated.
pub const DEFAULT_WEIGHT: f64 = 0.0;
/// Smallest multiplier [`LearnedPreferences::sorting_weight`] returns.
pub const SORTING_WEIGHT_FLOOR: f64 = 0.1;

/// Accumulated per-tag and per-category weights. Keys are stored lowercase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnedPreferences {
    pub version: u32,
    #[serde(default)]
    pub tag_weights: BTreeMap<String, f64>,
    #[serde(default)]
    pub category_weights: BTreeMap<String, f64>,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Default for LearnedPreferences {
    fn default() -> Self {
        Self::empty()
    }
}

impl LearnedPreferences {
    /// Preferences without any learned weight.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            version: CURRENT_VERSION,
            tag_weights: BTreeMap::new(),
            category_weights: BTreeMap::new(),
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    #[must_use]
    pub fn weight_for_tag(&self, tag: &str) -> f64 {
        self.tag_weights
            .get(&tag.to_lowercase())
            .copied()
            .unwrap_or(DEFAULT_WEIGHT)
    }

    #[must_use]
    pub fn weight_for_category(&self, category: &str) -> f64 {
        self.category_weights
            .get(&category.to_lowercase())
            .copied()
            .unwrap_or(DEFAULT_WEIGHT)
    }

    /// Adds `delta` to the tag's weight and clamps the result.
    pub fn update_tag_weight(&mut self, tag: &str, delta: f64) {
        let entry = self
            .tag_weights
            .entry(tag.to_lowercase())
            .or_insert(DEFAULT_WEIGHT);
        *entry = Self::clamp_weight(*entry + delta);
        self.touch();
    }

    /// Adds `delta` to the category's weight and clamps the result.
    pub fn update_category_weight(&mut self, category: &str, delta: f64) {
        let entry = self
            .category_weights
            .entry(category.to_lowercase())
            .or_insert(DEFAULT_WEIGHT);
        *entry = Self::clamp_weight(*entry + delta);
        self.touch();
    }

    pub fn set_tag_weight(&mut self, tag: &str, weight: f64) {
        self.tag_weights
            .insert(tag.to_lowercase(), Self::clamp_weight(weight));
        self.touch();
    }

    pub fn set_category_weight(&mut self, category: &str, weight: f64) {
        self.category_weights
            .insert(category.to_lowercase(), Self::clamp_weight(weight));
        self.touch();
    }

    /// Sum of all tag weights plus the category weight. May be negative.
    #[must_use]
    pub fn match_score<S: AsRef<str>>(&self, tags: &[S], category: &str) -> f64 {
        let tag_score: f64 = tags
            .iter()
            .map(|tag| self.weight_for_tag(tag.as_ref()))
            .sum();
        tag_score + self.weight_for_category(category)
    }

    /// Strictly positive sampling multiplier: `max(0.1, 1.0 + match_score)`.
    #[must_use]
    pub fn sorting_weight<S: AsRef<str>>(&self, tags: &[S], category: &str) -> f64 {
        (1.0 + self.match_score(tags, category)).max(SORTING_WEIGHT_FLOOR)
    }

    /// Maps a 1–5 star rating to a weight delta; out-of-range ratings clamp
    /// to the nearest endpoint.
    #[must_use]
    pub fn weight_delta(rating: i32) -> f64 {
        match rating {
            5.. => 1.0,
            4 => 0.5,
            3 => 0.0,
            2 => -0.5,
            _ => -1.0,
        }
    }

    /// Clamps into `[MIN_WEIGHT, MAX_WEIGHT]`; non-finite input becomes neutral.
    #[must_use]
    pub fn clamp_weight(weight: f64) -> f64 {
        if weight.is_nan() {
            return DEFAULT_WEIGHT;
        }
        weight.clamp(MIN_WEIGHT, MAX_WEIGHT)
    }

    #[must_use]
    pub fn has_learned_preferences(&self) -> bool {
        !self.tag_weights.is_empty() || !self.category_weights.is_empty()
    }

    #[must_use]
    pub fn total_weights_count(&self) -> usize {
        self.tag_weights.len() + self.category_weights.len()
    }

    /// The `n` tags with the highest weight, strongest first.
    #[must_use]
    pub fn top_tags(&self, n: usize) -> Vec<(&str, f64)> {
        let mut tags: Vec<(&str, f64)> = self
            .tag_weights
            .iter()
            .map(|(tag, weight)| (tag.as_str(), *weight))
            .collect();
        tags.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        tags.truncate(n);
        tags
    }

    fn touch(&mut self) {
        self.updated_at = OffsetDateTime::now_utc();
    }
}
