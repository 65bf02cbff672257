//! Anti-repetition and learned-preference orchestration around a
//! [`Randomizer`].
//!
//! A draw is attempted with progressively fewer exclusions:
//! session + recent history, then session only, then nothing. History and
//! preferences are best-effort inputs; a failing collaborator is logged and
//! treated as empty.

use crate::randomizer::Randomizer;
use crate::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tablepick_core::{
    LearnedPreferences, PreferenceContext, PreferencesStore, RecentHistoryProvider, Restaurant,
};

/// Number of recent visits excluded when nothing else is configured.
pub const DEFAULT_AVOID_REPEATS_LIMIT: usize = 10;
/// Upper bound for [`RouletteSettings::avoid_repeats_limit`].
pub const MAX_AVOID_REPEATS_LIMIT: usize = 50;

/// Flags read once per draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouletteSettings {
    #[serde(default = "default_learning_enabled")]
    pub learning_enabled: bool,
    /// `0` disables anti-repetition.
    #[serde(default = "default_avoid_repeats_limit")]
    pub avoid_repeats_limit: usize,
}

impl Default for RouletteSettings {
    fn default() -> Self {
        Self {
            learning_enabled: true,
            avoid_repeats_limit: DEFAULT_AVOID_REPEATS_LIMIT,
        }
    }
}

impl RouletteSettings {
    /// Settings with the limit clamped to `0..=MAX_AVOID_REPEATS_LIMIT`.
    #[must_use]
    pub fn new(learning_enabled: bool, avoid_repeats_limit: usize) -> Self {
        Self {
            learning_enabled,
            avoid_repeats_limit,
        }
        .clamped()
    }

    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            avoid_repeats_limit: self.avoid_repeats_limit.min(MAX_AVOID_REPEATS_LIMIT),
            ..self
        }
    }

    #[must_use]
    pub const fn avoid_repeats_enabled(&self) -> bool {
        self.avoid_repeats_limit > 0
    }
}

fn default_learning_enabled() -> bool {
    true
}

fn default_avoid_repeats_limit() -> usize {
    DEFAULT_AVOID_REPEATS_LIMIT
}

/// Source of [`RouletteSettings`].
pub trait SettingsProvider {
    fn settings(&self) -> RouletteSettings;
}

impl SettingsProvider for RouletteSettings {
    fn settings(&self) -> RouletteSettings {
        *self
    }
}

impl<F: Fn() -> RouletteSettings> SettingsProvider for F {
    fn settings(&self) -> RouletteSettings {
        self()
    }
}

/// Draw service combining learned preferences, anti-repetition and a staged
/// fallback.
#[derive(Debug)]
pub struct SmartRouletteService<Z, H, S, C = RouletteSettings> {
    randomizer: Z,
    history: H,
    store: S,
    settings: C,
}

impl<Z, H, S, C> SmartRouletteService<Z, H, S, C>
where
    Z: Randomizer,
    H: RecentHistoryProvider,
    S: PreferencesStore,
    C: SettingsProvider,
{
    pub fn new(randomizer: Z, history: H, store: S, settings: C) -> Self {
        Self {
            randomizer,
            history,
            store,
            settings,
        }
    }

    pub fn randomizer_mut(&mut self) -> &mut Z {
        &mut self.randomizer
    }

    /// Draws one restaurant, or `None` when no candidate passes the hard
    /// filters even without any exclusion.
    pub fn pick<'a>(
        &mut self,
        candidates: &'a [Restaurant],
        context: &PreferenceContext,
        session_excludes: &HashSet<String>,
    ) -> Option<&'a Restaurant> {
        let settings = self.settings.settings().clamped();

        let mut enriched = context.clone();
        enriched.learned_preferences = if settings.learning_enabled {
            self.learned_preferences()
        } else {
            None
        };

        let mut all_excludes = session_excludes.clone();
        if settings.avoid_repeats_enabled() {
            all_excludes.extend(self.recent_ids(settings.avoid_repeats_limit));
        }

        if let Some(found) = self.randomizer.pick(candidates, &enriched, &all_excludes) {
            return Some(found);
        }

        let mut last_excludes = &all_excludes;
        if settings.avoid_repeats_enabled() && !all_excludes.is_empty() {
            debug("draw empty with history exclusions; retrying with session exclusions only");
            if let Some(found) = self
                .randomizer
                .pick(candidates, &enriched, session_excludes)
            {
                return Some(found);
            }
            last_excludes = session_excludes;
        }

        if last_excludes.is_empty() {
            return None;
        }
        debug("draw empty with session exclusions; retrying without exclusions");
        self.randomizer.pick(candidates, &enriched, &HashSet::new())
    }

    /// Candidates left after session and history exclusions, ignoring the
    /// context filters. No draw is performed.
    pub fn available_candidates_count(
        &self,
        candidates: &[Restaurant],
        session_excludes: &HashSet<String>,
    ) -> usize {
        let settings = self.settings.settings().clamped();
        let mut all_excludes = session_excludes.clone();
        if settings.avoid_repeats_enabled() {
            all_excludes.extend(self.recent_ids(settings.avoid_repeats_limit));
        }
        candidates
            .iter()
            .filter(|r| !all_excludes.contains(&r.id))
            .count()
    }

    /// True when every candidate is excluded, i.e. a draw would have to fall
    /// back.
    pub fn would_use_fallback(
        &self,
        candidates: &[Restaurant],
        session_excludes: &HashSet<String>,
    ) -> bool {
        self.available_candidates_count(candidates, session_excludes) == 0
    }

    fn learned_preferences(&self) -> Option<LearnedPreferences> {
        match self.store.load() {
            Ok(prefs) => Some(prefs),
            Err(e) => {
                warn(&format!("learned preferences unavailable, drawing without: {e}"));
                None
            }
        }
    }

    fn recent_ids(&self, limit: usize) -> Vec<String> {
        match self.history.recent_ids(limit) {
            Ok(mut ids) => {
                ids.truncate(limit);
                ids
            }
            Err(e) => {
                warn(&format!("recent history unavailable, not excluding repeats: {e}"));
                Vec::new()
            }
        }
    }
}
