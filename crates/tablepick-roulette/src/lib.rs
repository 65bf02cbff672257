#![warn(clippy::unwrap_used, clippy::expect_used)]

//! Restaurant draw engine.
//!
//! [`RestaurantRandomizer`] applies the hard filters of a
//! [`PreferenceContext`](tablepick_core::PreferenceContext) and performs a
//! roulette-wheel pick biased by internal ratings and learned preferences.
//! [`SmartRouletteService`] wraps it with anti-repetition and a staged
//! fallback so that personalisation never starves a non-empty pool.

mod randomizer;
mod smart;

pub use randomizer::{
    index_for_draw, roulette_index, Randomizer, RestaurantRandomizer, RATED_MULTIPLIER,
    UNRATED_MULTIPLIER, WELL_RATED_MULTIPLIER,
};
pub use smart::{
    RouletteSettings, SettingsProvider, SmartRouletteService, DEFAULT_AVOID_REPEATS_LIMIT,
    MAX_AVOID_REPEATS_LIMIT,
};

#[cfg(feature = "telemetry")]
pub(crate) fn warn(msg: &str) {
    tracing::warn!("{msg}");
}

#[cfg(not(feature = "telemetry"))]
pub(crate) fn warn(msg: &str) {
    eprintln!("tablepick-roulette: {msg}");
}

#[cfg(feature = "telemetry")]
pub(crate) fn debug(msg: &str) {
    tracing::debug!("{msg}");
}

#[cfg(not(feature = "telemetry"))]
pub(crate) fn debug(_msg: &str) {}
