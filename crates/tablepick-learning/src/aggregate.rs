use serde::Serialize;
use std::collections::HashMap;
use tablepick_core::{RatingSnapshot, Visit, VisitRepository};
use time::OffsetDateTime;

/// Rating statistics of one restaurant, computed from its visits.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingAggregation {
    /// Mean rating (1–5); 0 without visits.
    pub average: f64,
    pub count: u32,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_visited_at: Option<OffsetDateTime>,
}

impl RatingAggregation {
    pub const EMPTY: Self = Self {
        average: 0.0,
        count: 0,
        last_visited_at: None,
    };

    #[must_use]
    pub const fn has_ratings(&self) -> bool {
        self.count > 0
    }

    fn record(&mut self, visit: &Visit) {
        // running mean keeps the sum out of the struct
        let n = f64::from(self.count) + 1.0;
        self.average += (f64::from(visit.rating) - self.average) / n;
        self.count += 1;
        if self
            .last_visited_at
            .map_or(true, |last| visit.date_visited > last)
        {
            self.last_visited_at = Some(visit.date_visited);
        }
    }
}

impl Default for RatingAggregation {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl From<RatingAggregation> for RatingSnapshot {
    fn from(agg: RatingAggregation) -> Self {
        Self {
            average: agg.average,
            count: agg.count,
            last_visited_at: agg.last_visited_at,
        }
    }
}

/// Computes [`RatingAggregation`]s from recorded visits.
#[derive(Debug, Default)]
pub struct RatingAggregator;

impl RatingAggregator {
    /// Aggregation for a single restaurant.
    #[must_use]
    pub fn aggregate(&self, visits: &[Visit], restaurant_id: &str) -> RatingAggregation {
        let mut agg = RatingAggregation::EMPTY;
        for visit in visits.iter().filter(|v| v.restaurant_id == restaurant_id) {
            agg.record(visit);
        }
        agg
    }

    /// Aggregations keyed by restaurant id, for every restaurant with visits.
    #[must_use]
    pub fn aggregate_all(&self, visits: &[Visit]) -> HashMap<String, RatingAggregation> {
        let mut stats: HashMap<String, RatingAggregation> = HashMap::new();
        for visit in visits {
            stats
                .entry(visit.restaurant_id.clone())
                .or_default()
                .record(visit);
        }
        stats
    }

    /// Reads the visits of one restaurant from a repository. Read failures
    /// yield [`RatingAggregation::EMPTY`] and are returned alongside so the
    /// caller can report them.
    pub fn compute<R: VisitRepository>(
        &self,
        repository: &R,
        restaurant_id: &str,
    ) -> (RatingAggregation, Option<tablepick_core::HistoryError>) {
        match repository.fetch_for(restaurant_id) {
            Ok(visits) => (self.aggregate(&visits, restaurant_id), None),
            Err(e) => (RatingAggregation::EMPTY, Some(e)),
        }
    }
}
