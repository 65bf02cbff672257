//! File-backed collaborators for the engine: the restaurant catalogue, the
//! visit log, learned preferences and user settings, all under one data
//! directory.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tablepick_core::preferences::CURRENT_VERSION;
use tablepick_core::{
    HistoryError, LearnedPreferences, PreferencesStore, RestaurantCatalog, StoreError, Visit,
    VisitRepository,
};
use tablepick_roulette::RouletteSettings;

pub const CATALOG_FILE: &str = "restaurants.json";
pub const VISITS_FILE: &str = "visits.jsonl";
pub const PREFERENCES_FILE: &str = "preferences.json";
pub const SETTINGS_FILE: &str = "settings.json";

pub const DEFAULT_RADIUS_KM: u32 = 3;
pub const MIN_RADIUS_KM: u32 = 1;
pub const MAX_RADIUS_KM: u32 = 10;

fn ensure_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

pub fn load_catalog(path: &Path) -> Result<RestaurantCatalog> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open catalogue {}", path.display()))?;
    let catalog = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse catalogue {}", path.display()))?;
    Ok(catalog)
}

pub fn save_catalog(path: &Path, catalog: &RestaurantCatalog) -> Result<()> {
    ensure_parent(path)?;
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, catalog)?;
    Ok(())
}

/// Append-only JSONL visit log.
#[derive(Debug, Clone)]
pub struct VisitLog {
    path: PathBuf,
}

impl VisitLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn append(&self, visit: &Visit) -> Result<(), HistoryError> {
        ensure_parent(&self.path)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let line = serde_json::to_string(visit).map_err(io::Error::from)?;
        writeln!(file, "{line}")?;
        Ok(())
    }
}

impl VisitRepository for VisitLog {
    /// A missing log is an empty history. Blank lines are skipped.
    fn fetch_all(&self) -> Result<Vec<Visit>, HistoryError> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut visits = Vec::new();
        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let visit: Visit = serde_json::from_str(&line)
                .map_err(|source| HistoryError::Parse {
                    line: idx + 1,
                    source,
                })?;
            visits.push(visit);
        }
        visits.sort_by(|a, b| b.date_visited.cmp(&a.date_visited));
        Ok(visits)
    }
}

/// [`LearnedPreferences`] stored as a single JSON document.
#[derive(Debug, Clone)]
pub struct JsonPreferencesStore {
    path: PathBuf,
}

impl JsonPreferencesStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PreferencesStore for JsonPreferencesStore {
    /// Missing file loads as empty, and so does an unreadable document
    /// (with a warning); the next save replaces it. Documents from an older
    /// version are re-stamped and written back.
    fn load(&self) -> Result<LearnedPreferences, StoreError> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Ok(LearnedPreferences::empty())
            }
            Err(e) => return Err(e.into()),
        };
        let mut prefs: LearnedPreferences = match serde_json::from_reader(BufReader::new(file)) {
            Ok(prefs) => prefs,
            Err(e) if e.is_io() => return Err(e.into()),
            Err(e) => {
                eprintln!(
                    "Warning: failed to parse preferences from {:?}; starting fresh: {}",
                    self.path, e
                );
                return Ok(LearnedPreferences::empty());
            }
        };
        if prefs.version < CURRENT_VERSION {
            prefs.version = CURRENT_VERSION;
            self.save(&prefs)?;
        }
        Ok(prefs)
    }

    fn save(&self, prefs: &LearnedPreferences) -> Result<(), StoreError> {
        ensure_parent(&self.path)?;
        let file = File::create(&self.path)?;
        serde_json::to_writer_pretty(file, prefs)?;
        Ok(())
    }

    fn reset(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// User settings file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(flatten)]
    pub roulette: RouletteSettings,
    /// Radius used by `pick` when a location is given without one.
    #[serde(default = "default_radius_km")]
    pub default_radius_km: u32,
}

fn default_radius_km() -> u32 {
    DEFAULT_RADIUS_KM
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            roulette: RouletteSettings::default(),
            default_radius_km: DEFAULT_RADIUS_KM,
        }
    }
}

impl Settings {
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            roulette: self.roulette.clamped(),
            default_radius_km: self.default_radius_km.clamp(MIN_RADIUS_KM, MAX_RADIUS_KM),
        }
    }

    /// Missing file yields the defaults; stored values are clamped.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let file = File::open(path)?;
        let settings: Settings = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse settings {}", path.display()))?;
        Ok(settings.clamped())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        ensure_parent(path)?;
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}
