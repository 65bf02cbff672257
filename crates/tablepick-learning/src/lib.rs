#![warn(clippy::unwrap_used, clippy::expect_used)]

//! Feedback side of tablepick.
//!
//! Turns visit ratings into learned weights, derives the recently visited
//! restaurants used for anti-repetition and aggregates the per-restaurant
//! rating snapshot. The draw engine only reads what these services write.

mod aggregate;
mod history;
mod learning;

pub use aggregate::{RatingAggregation, RatingAggregator};
pub use history::RecentHistoryService;
pub use learning::PreferenceLearningService;
