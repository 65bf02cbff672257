//! Filtered, weighted random pick over a candidate list.
//!
//! Filters are boolean and absolute. Ratings and learned preferences only
//! change the odds among the survivors.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use tablepick_core::{LearnedPreferences, PreferenceContext, RatingPriority, Restaurant};

/// Draw weight of a well-rated restaurant under [`RatingPriority::Prefer`].
pub const WELL_RATED_MULTIPLIER: f64 = 3.0;
/// Draw weight of a rated, but not well-rated, restaurant.
pub const RATED_MULTIPLIER: f64 = 1.5;
/// Draw weight of a restaurant without internal ratings.
pub const UNRATED_MULTIPLIER: f64 = 1.0;

/// Something that draws one restaurant out of a candidate list.
pub trait Randomizer {
    fn pick<'a>(
        &mut self,
        candidates: &'a [Restaurant],
        context: &PreferenceContext,
        exclude_ids: &HashSet<String>,
    ) -> Option<&'a Restaurant>;
}

impl<T: Randomizer + ?Sized> Randomizer for &mut T {
    fn pick<'a>(
        &mut self,
        candidates: &'a [Restaurant],
        context: &PreferenceContext,
        exclude_ids: &HashSet<String>,
    ) -> Option<&'a Restaurant> {
        (**self).pick(candidates, context, exclude_ids)
    }
}

/// Default [`Randomizer`], generic over its random source so draws are
/// reproducible under a fixed seed.
#[derive(Debug, Clone)]
pub struct RestaurantRandomizer<R = StdRng> {
    rng: R,
}

impl RestaurantRandomizer<StdRng> {
    /// Randomizer seeded from OS entropy.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl Default for RestaurantRandomizer<StdRng> {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl<R: Rng> RestaurantRandomizer<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Candidates that pass every hard filter, in input order.
    #[must_use]
    pub fn eligible<'a>(
        candidates: &'a [Restaurant],
        context: &PreferenceContext,
        exclude_ids: &HashSet<String>,
    ) -> Vec<&'a Restaurant> {
        let filter = Filter::new(context, exclude_ids);
        candidates.iter().filter(|r| filter.accepts(r)).collect()
    }

    /// Like [`Randomizer::pick`], but when `Only` yields nothing the draw is
    /// repeated once with [`RatingPriority::Prefer`]. Useful for candidate
    /// sets that carry no internal ratings at all.
    pub fn pick_with_rating_fallback<'a>(
        &mut self,
        candidates: &'a [Restaurant],
        context: &PreferenceContext,
        exclude_ids: &HashSet<String>,
    ) -> Option<&'a Restaurant> {
        if let Some(found) = self.pick(candidates, context, exclude_ids) {
            return Some(found);
        }
        if context.rating_priority != RatingPriority::Only {
            return None;
        }
        let relaxed = PreferenceContext {
            rating_priority: RatingPriority::Prefer,
            ..context.clone()
        };
        self.pick(candidates, &relaxed, exclude_ids)
    }

    fn select<'a>(
        &mut self,
        eligible: &[&'a Restaurant],
        context: &PreferenceContext,
    ) -> Option<&'a Restaurant> {
        let learned = context
            .learned_preferences
            .as_ref()
            .filter(|p| p.has_learned_preferences());

        let weights: Vec<f64> = match (context.rating_priority, learned) {
            (RatingPriority::Prefer, prefs) => eligible
                .iter()
                .map(|r| rating_multiplier(r) * learned_multiplier(prefs, r))
                .collect(),
            (_, Some(prefs)) => eligible
                .iter()
                .map(|r| learned_multiplier(Some(prefs), r))
                .collect(),
            (_, None) => return eligible.choose(&mut self.rng).copied(),
        };

        roulette_index(&weights, &mut self.rng).and_then(|i| eligible.get(i).copied())
    }
}

impl<R: Rng> Randomizer for RestaurantRandomizer<R> {
    fn pick<'a>(
        &mut self,
        candidates: &'a [Restaurant],
        context: &PreferenceContext,
        exclude_ids: &HashSet<String>,
    ) -> Option<&'a Restaurant> {
        let eligible = Self::eligible(candidates, context, exclude_ids);
        if eligible.is_empty() {
            return None;
        }
        self.select(&eligible, context)
    }
}

fn rating_multiplier(r: &Restaurant) -> f64 {
    if r.rating.is_highly_rated() {
        WELL_RATED_MULTIPLIER
    } else if r.rating.has_ratings() {
        RATED_MULTIPLIER
    } else {
        UNRATED_MULTIPLIER
    }
}

fn learned_multiplier(prefs: Option<&LearnedPreferences>, r: &Restaurant) -> f64 {
    prefs.map_or(1.0, |p| p.sorting_weight(&r.tags, &r.category))
}

/// Roulette-wheel selection: draws in `[0, total)` and returns the index
/// whose cumulative weight first exceeds the draw. A degenerate total
/// (zero, negative or non-finite) falls back to a uniform index.
pub fn roulette_index<R: Rng + ?Sized>(weights: &[f64], rng: &mut R) -> Option<usize> {
    if weights.is_empty() {
        return None;
    }
    let total: f64 = weights.iter().sum();
    if !(total.is_finite() && total > 0.0) {
        return Some(rng.gen_range(0..weights.len()));
    }
    let draw = rng.gen_range(0.0..total);
    Some(index_for_draw(weights, draw))
}

/// Walks the cumulative weights for a given draw. A draw at or past the
/// last boundary (rounding) maps to the last index. `weights` must be
/// non-empty.
#[must_use]
pub fn index_for_draw(weights: &[f64], draw: f64) -> usize {
    let mut cumulative = 0.0;
    for (index, weight) in weights.iter().enumerate() {
        cumulative += weight;
        if draw < cumulative {
            return index;
        }
    }
    weights.len().saturating_sub(1)
}

struct Filter<'c> {
    exclude_ids: &'c HashSet<String>,
    desired: HashSet<String>,
    avoid: HashSet<String>,
    radius: Option<(tablepick_core::GeoPoint, f64)>,
    only_well_rated: bool,
}

impl<'c> Filter<'c> {
    fn new(context: &PreferenceContext, exclude_ids: &'c HashSet<String>) -> Self {
        let lower = |tags: &HashSet<String>| tags.iter().map(|t| t.to_lowercase()).collect();
        let radius = match (context.radius_km, context.user_location) {
            (Some(km), Some(origin)) => Some((origin, f64::from(km) * 1000.0)),
            _ => None,
        };
        Self {
            exclude_ids,
            desired: lower(&context.desired_tags),
            avoid: lower(&context.avoid_tags),
            radius,
            only_well_rated: context.rating_priority == RatingPriority::Only,
        }
    }

    fn accepts(&self, r: &Restaurant) -> bool {
        if self.exclude_ids.contains(&r.id) {
            return false;
        }
        if !self.desired.is_empty() || !self.avoid.is_empty() {
            let tags: HashSet<String> = r.normalized_tags().collect();
            if !self.desired.is_empty() && self.desired.is_disjoint(&tags) {
                return false;
            }
            if !self.avoid.is_disjoint(&tags) {
                return false;
            }
        }
        if let Some((origin, max_meters)) = &self.radius {
            let within = r
                .coordinate()
                .is_some_and(|c| origin.distance_meters(&c) <= *max_meters);
            if !within {
                return false;
            }
        }
        if self.only_well_rated && !r.rating.is_highly_rated() {
            return false;
        }
        true
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;
    use tablepick_core::GeoPoint;

    fn tagged(id: &str, tags: &[&str]) -> Restaurant {
        Restaurant::new(id, "restaurant", tags.iter().map(|t| (*t).to_string()).collect())
    }

    #[test]
    fn draw_past_total_falls_back_to_last_candidate() {
        let weights = [0.1, 0.2, 0.3];
        let total: f64 = weights.iter().sum();
        assert_eq!(index_for_draw(&weights, total), 2);
        assert_eq!(index_for_draw(&weights, total + 1e-9), 2);
        assert_eq!(index_for_draw(&weights, 0.0), 0);
        assert_eq!(index_for_draw(&weights, 0.15), 1);
    }

    #[test]
    fn roulette_index_handles_degenerate_totals() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(roulette_index(&[], &mut rng), None);
        let idx = roulette_index(&[0.0, 0.0], &mut rng).expect("uniform fallback");
        assert!(idx < 2);
        let idx = roulette_index(&[f64::INFINITY, 1.0], &mut rng).expect("uniform fallback");
        assert!(idx < 2);
    }

    #[test]
    fn roulette_index_with_zero_rng_picks_first_positive_slot() {
        // StepRng(0, 0) always yields 0, so the draw is 0.0.
        let mut rng = StepRng::new(0, 0);
        assert_eq!(roulette_index(&[0.0, 2.0, 1.0], &mut rng), Some(1));
    }

    #[test]
    fn prefer_weight_multiplies_rating_tier_and_learned_weight() {
        let mut prefs = LearnedPreferences::empty();
        prefs.set_tag_weight("ramen", 3.0);
        let top = tagged("top", &["ramen"]).with_rating(4.5, 3);
        let plain = tagged("plain", &[]);

        let weight = |r: &Restaurant| rating_multiplier(r) * learned_multiplier(Some(&prefs), r);
        assert_eq!(weight(&top), WELL_RATED_MULTIPLIER * 4.0);
        assert_eq!(weight(&plain), UNRATED_MULTIPLIER);

        let weights = [weight(&top), weight(&plain)];
        assert_eq!(index_for_draw(&weights, 11.99), 0);
        assert_eq!(index_for_draw(&weights, 12.0), 1);
    }

    #[test]
    fn tag_filters_are_case_insensitive() {
        let candidates = vec![tagged("a", &["Sushi"]), tagged("b", &["Pizza", "Cheap"])];
        let ctx = PreferenceContext::new().desiring(["SUSHI"]);
        let picked = RestaurantRandomizer::<StdRng>::eligible(&candidates, &ctx, &HashSet::new());
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].id, "a");

        let ctx = PreferenceContext::new().avoiding(["cheap"]);
        let picked = RestaurantRandomizer::<StdRng>::eligible(&candidates, &ctx, &HashSet::new());
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].id, "a");
    }

    #[test]
    fn radius_filter_drops_far_and_unlocated_candidates() {
        let origin = GeoPoint::new(-23.5614, -46.6559);
        let candidates = vec![
            tagged("near", &[]).with_location(-23.5630, -46.6540),
            tagged("far", &[]).with_location(-22.9068, -43.1729),
            tagged("nowhere", &[]),
        ];
        let ctx = PreferenceContext::new().within(3, origin);
        let picked = RestaurantRandomizer::<StdRng>::eligible(&candidates, &ctx, &HashSet::new());
        let ids: Vec<&str> = picked.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["near"]);
    }

    #[test]
    fn radius_without_location_is_ignored() {
        let candidates = vec![tagged("nowhere", &[])];
        let ctx = PreferenceContext {
            radius_km: Some(1),
            ..PreferenceContext::default()
        };
        let picked = RestaurantRandomizer::<StdRng>::eligible(&candidates, &ctx, &HashSet::new());
        assert_eq!(picked.len(), 1);
    }

    #[test]
    fn rating_fallback_relaxes_only_to_prefer() {
        let candidates = vec![tagged("a", &[]), tagged("b", &[]).with_rating(3.0, 2)];
        let ctx = PreferenceContext::new().with_rating_priority(RatingPriority::Only);
        let mut randomizer = RestaurantRandomizer::seeded(1);

        assert!(randomizer
            .pick(&candidates, &ctx, &HashSet::new())
            .is_none());
        assert!(randomizer
            .pick_with_rating_fallback(&candidates, &ctx, &HashSet::new())
            .is_some());

        let none_ctx = PreferenceContext::new().desiring(["ramen"]);
        assert!(randomizer
            .pick_with_rating_fallback(&candidates, &none_ctx, &HashSet::new())
            .is_none());
    }

    #[test]
    fn empty_learned_preferences_behave_like_none() {
        let candidates = vec![tagged("a", &[]), tagged("b", &[]), tagged("c", &[])];
        let plain = PreferenceContext::new();
        let with_empty =
            PreferenceContext::new().with_learned_preferences(LearnedPreferences::empty());

        let mut r1 = RestaurantRandomizer::seeded(99);
        let mut r2 = RestaurantRandomizer::seeded(99);
        for _ in 0..20 {
            let a = r1.pick(&candidates, &plain, &HashSet::new()).map(|r| &r.id);
            let b = r2.pick(&candidates, &with_empty, &HashSet::new()).map(|r| &r.id);
            assert_eq!(a, b);
        }
    }
}
