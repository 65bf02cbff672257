use crate::{GeoPoint, LearnedPreferences};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// How internal ratings influence a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RatingPriority {
    /// Ratings are ignored.
    #[default]
    None,
    /// Rated restaurants get a higher draw weight.
    Prefer,
    /// Only well-rated restaurants are eligible.
    Only,
}

impl RatingPriority {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Prefer => "prefer",
            Self::Only => "only",
        }
    }
}

impl fmt::Display for RatingPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RatingPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "prefer" => Ok(Self::Prefer),
            "only" => Ok(Self::Only),
            _ => Err(format!("unknown rating priority '{s}'")),
        }
    }
}

/// Per-draw settings. Tags are matched case-insensitively.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreferenceContext {
    /// At least one must match, if non-empty.
    pub desired_tags: HashSet<String>,
    /// None may match.
    pub avoid_tags: HashSet<String>,
    /// Only applied together with `user_location`.
    pub radius_km: Option<u32>,
    pub user_location: Option<GeoPoint>,
    pub rating_priority: RatingPriority,
    /// Injected by the smart roulette when learning is enabled.
    pub learned_preferences: Option<LearnedPreferences>,
}

impl PreferenceContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn desiring<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.desired_tags.extend(tags.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn avoiding<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.avoid_tags.extend(tags.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn within(mut self, radius_km: u32, location: GeoPoint) -> Self {
        self.radius_km = Some(radius_km);
        self.user_location = Some(location);
        self
    }

    #[must_use]
    pub fn with_rating_priority(mut self, priority: RatingPriority) -> Self {
        self.rating_priority = priority;
        self
    }

    #[must_use]
    pub fn with_learned_preferences(mut self, prefs: LearnedPreferences) -> Self {
        self.learned_preferences = Some(prefs);
        self
    }
}
