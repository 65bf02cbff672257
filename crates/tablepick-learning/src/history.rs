use std::collections::HashSet;
use tablepick_core::{HistoryError, RecentHistoryProvider, VisitRepository};

/// Recently visited restaurants, derived from the visit log.
#[derive(Debug)]
pub struct RecentHistoryService<R> {
    visits: R,
}

impl<R: VisitRepository> RecentHistoryService<R> {
    pub fn new(visits: R) -> Self {
        Self { visits }
    }
}

impl<R: VisitRepository> RecentHistoryProvider for RecentHistoryService<R> {
    /// Unique restaurant IDs, ordered by their most recent visit. A
    /// restaurant visited several times appears once.
    fn recent_ids(&self, limit: usize) -> Result<Vec<String>, HistoryError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let mut seen = HashSet::new();
        let mut ids = Vec::with_capacity(limit);
        for visit in self.visits.fetch_all()? {
            if seen.insert(visit.restaurant_id.clone()) {
                ids.push(visit.restaurant_id);
                if ids.len() >= limit {
                    break;
                }
            }
        }
        Ok(ids)
    }
}
