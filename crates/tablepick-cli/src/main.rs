//! CLI for tablepick.
//!
//! Draws a restaurant from a local catalogue, records visits and their
//! ratings, and manages the learned preferences and settings that steer the
//! draw. Everything lives as JSON under one data directory.

mod store;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tablepick_core::{
    GeoPoint, PreferenceContext, PreferencesStore, RatingPriority, RecentHistoryProvider,
    Restaurant, Visit, VisitRepository,
};
use tablepick_learning::{PreferenceLearningService, RatingAggregator, RecentHistoryService};
use tablepick_roulette::{Randomizer, RestaurantRandomizer, SmartRouletteService};

use store::{
    load_catalog, save_catalog, JsonPreferencesStore, Settings, VisitLog, CATALOG_FILE,
    PREFERENCES_FILE, SETTINGS_FILE, VISITS_FILE,
};

/// Exit status when no restaurant survives the filters.
const EXIT_NO_MATCH: u8 = 2;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding the catalogue, visit log, preferences and settings
    #[arg(long, global = true, default_value = "data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Draw a restaurant
    Pick(PickArgs),
    /// Record a visit and its rating
    Rate {
        /// Restaurant ID
        #[arg(long)]
        id: String,

        /// Stars, 1-5
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
        rating: u8,

        #[arg(long)]
        note: Option<String>,

        #[arg(long)]
        would_return: bool,
    },
    /// List recently visited restaurants, most recent first
    History {
        #[arg(long, default_value = "10", value_parser = clap::value_parser!(u32).range(1..))]
        limit: u32,
    },
    /// Inspect or reset learned preferences
    Prefs {
        #[command(subcommand)]
        action: PrefsAction,
    },
    /// Inspect or change settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(clap::Args)]
struct PickArgs {
    /// Tags a restaurant must carry (any of them)
    #[arg(long, value_delimiter = ',')]
    desired: Vec<String>,

    /// Tags that rule a restaurant out
    #[arg(long, value_delimiter = ',')]
    avoid: Vec<String>,

    /// Search radius; needs --lat and --lng. Defaults to the configured radius.
    #[arg(long)]
    radius_km: Option<u32>,

    #[arg(long, requires = "lng", allow_negative_numbers = true)]
    lat: Option<f64>,

    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    lng: Option<f64>,

    #[arg(long, default_value = "none")]
    rating_priority: RatingPriority,

    /// Restaurant IDs already rejected in this session
    #[arg(long, value_delimiter = ',')]
    exclude: Vec<String>,

    /// Seed for a reproducible draw
    #[arg(long)]
    seed: Option<u64>,

    /// With `--rating-priority only`, fall back to `prefer` when nothing is
    /// well rated
    #[arg(long)]
    relax_rating: bool,
}

#[derive(Subcommand)]
enum PrefsAction {
    Show,
    Reset,
}

#[derive(Subcommand)]
enum SettingsAction {
    Show,
    Set {
        /// Enable or disable preference learning
        #[arg(long)]
        learning: Option<bool>,

        /// How many recent visits to keep out of the draw; 0 disables
        #[arg(long)]
        avoid_repeats: Option<usize>,

        /// Radius used when a location is given without --radius-km
        #[arg(long)]
        default_radius_km: Option<u32>,
    },
}

/// Randomizer that relaxes `Only` to `Prefer` when nothing qualifies.
struct RelaxedRating(RestaurantRandomizer);

impl Randomizer for RelaxedRating {
    fn pick<'a>(
        &mut self,
        candidates: &'a [Restaurant],
        context: &PreferenceContext,
        exclude_ids: &HashSet<String>,
    ) -> Option<&'a Restaurant> {
        self.0
            .pick_with_rating_fallback(candidates, context, exclude_ids)
    }
}

#[derive(Serialize)]
struct PickOutput<'a> {
    restaurant: &'a Restaurant,
    #[serde(skip_serializing_if = "Option::is_none")]
    distance_m: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    distance: Option<String>,
}

/// Human-readable distance: metres below 1 km, one decimal above.
fn format_distance(meters: f64) -> String {
    if meters < 1000.0 {
        format!("{meters:.0} m")
    } else {
        format!("{:.1} km", meters / 1000.0)
    }
}

fn build_context(args: &PickArgs, settings: &Settings) -> Result<PreferenceContext> {
    let mut context = PreferenceContext::new()
        .desiring(&args.desired)
        .avoiding(&args.avoid)
        .with_rating_priority(args.rating_priority);

    match (args.lat, args.lng) {
        (Some(lat), Some(lng)) => {
            let location = GeoPoint::new(lat, lng);
            if !location.is_valid() {
                bail!("Invalid location: {lat}, {lng}");
            }
            let radius = args.radius_km.unwrap_or(settings.default_radius_km);
            context = context.within(radius, location);
        }
        _ if args.radius_km.is_some() => bail!("--radius-km needs --lat and --lng"),
        _ => {}
    }
    Ok(context)
}

fn random_source(seed: Option<u64>) -> RestaurantRandomizer {
    seed.map_or_else(RestaurantRandomizer::from_entropy, RestaurantRandomizer::seeded)
}

/// Runs the smart roulette over the catalogue. Returns the drawn restaurant
/// and, when a location was given, its distance in metres.
fn draw(data_dir: &Path, args: &PickArgs) -> Result<Option<(Restaurant, Option<f64>)>> {
    let catalog = load_catalog(&data_dir.join(CATALOG_FILE))?;
    let settings = Settings::load(&data_dir.join(SETTINGS_FILE))?;
    let context = build_context(args, &settings)?;
    let session_excludes: HashSet<String> = args.exclude.iter().cloned().collect();

    let history = RecentHistoryService::new(VisitLog::new(data_dir.join(VISITS_FILE)));
    let store = JsonPreferencesStore::new(data_dir.join(PREFERENCES_FILE));
    let randomizer = random_source(args.seed);

    let picked = if args.relax_rating {
        SmartRouletteService::new(RelaxedRating(randomizer), history, store, settings.roulette)
            .pick(&catalog.restaurants, &context, &session_excludes)
    } else {
        SmartRouletteService::new(randomizer, history, store, settings.roulette)
            .pick(&catalog.restaurants, &context, &session_excludes)
    };

    Ok(picked.map(|restaurant| {
        let distance_m = context
            .user_location
            .zip(restaurant.coordinate())
            .map(|(from, to)| from.distance_meters(&to));
        (restaurant.clone(), distance_m)
    }))
}

fn pick(data_dir: &Path, args: &PickArgs) -> Result<ExitCode> {
    let Some((restaurant, distance_m)) = draw(data_dir, args)? else {
        eprintln!("No restaurants match the current filters.");
        return Ok(ExitCode::from(EXIT_NO_MATCH));
    };

    let output = PickOutput {
        restaurant: &restaurant,
        distance_m,
        distance: distance_m.map(format_distance),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(ExitCode::SUCCESS)
}

fn rate(
    data_dir: &Path,
    id: &str,
    rating: u8,
    note: Option<String>,
    would_return: bool,
) -> Result<()> {
    let catalog_path = data_dir.join(CATALOG_FILE);
    let mut catalog = load_catalog(&catalog_path)?;
    let Some(restaurant) = catalog.get_mut(id) else {
        bail!("Unknown restaurant: {id}");
    };

    let mut visit = Visit::new(id, rating);
    visit.tags = restaurant.tags.clone();
    visit.note = note;
    visit.would_return = would_return;

    let settings = Settings::load(&data_dir.join(SETTINGS_FILE))?;
    let log = VisitLog::new(data_dir.join(VISITS_FILE));
    log.append(&visit).context("Failed to record visit")?;

    // visit log and catalogue must agree before learning runs
    let visits = log.fetch_for(id).context("Failed to read visit log")?;
    restaurant.rating = RatingAggregator.aggregate(&visits, id).into();
    println!(
        "Rated {} with {} stars ({:.1} average over {} visits).",
        restaurant.name, rating, restaurant.rating.average, restaurant.rating.count
    );
    let tags = restaurant.tags.clone();
    let category = restaurant.category.clone();
    save_catalog(&catalog_path, &catalog).context("Failed to save catalogue")?;

    let learning = PreferenceLearningService::new(
        JsonPreferencesStore::new(data_dir.join(PREFERENCES_FILE)),
        settings.roulette.learning_enabled,
    );
    learning
        .apply_rating(i32::from(rating), &tags, &category)
        .context("Failed to update learned preferences")?;
    Ok(())
}

fn history(data_dir: &Path, limit: u32) -> Result<()> {
    let service = RecentHistoryService::new(VisitLog::new(data_dir.join(VISITS_FILE)));
    let ids = service
        .recent_ids(limit as usize)
        .context("Failed to read visit log")?;
    if ids.is_empty() {
        println!("No visits recorded.");
        return Ok(());
    }

    // names are a nicety; history works without a catalogue
    let catalog = load_catalog(&data_dir.join(CATALOG_FILE)).ok();
    for id in ids {
        match catalog.as_ref().and_then(|c| c.get(&id)) {
            Some(r) => println!("{id}\t{}", r.name),
            None => println!("{id}"),
        }
    }
    Ok(())
}

fn prefs(data_dir: &Path, action: &PrefsAction) -> Result<()> {
    let store = JsonPreferencesStore::new(data_dir.join(PREFERENCES_FILE));
    match action {
        PrefsAction::Show => {
            let prefs = store.load().context("Failed to load preferences")?;
            println!("{}", serde_json::to_string_pretty(&prefs)?);
            for (tag, weight) in prefs.top_tags(5) {
                println!("{tag}: {weight:+.1}");
            }
        }
        PrefsAction::Reset => {
            store.reset().context("Failed to reset preferences")?;
            println!("Learned preferences cleared.");
        }
    }
    Ok(())
}

fn settings(data_dir: &Path, action: &SettingsAction) -> Result<()> {
    let path = data_dir.join(SETTINGS_FILE);
    let mut settings = Settings::load(&path)?;
    if let SettingsAction::Set {
        learning,
        avoid_repeats,
        default_radius_km,
    } = action
    {
        if let Some(enabled) = learning {
            settings.roulette.learning_enabled = *enabled;
        }
        if let Some(limit) = avoid_repeats {
            settings.roulette.avoid_repeats_limit = *limit;
        }
        if let Some(radius) = default_radius_km {
            settings.default_radius_km = *radius;
        }
        settings = settings.clamped();
        settings.save(&path).context("Failed to save settings")?;
    }
    println!("{}", serde_json::to_string_pretty(&settings)?);
    Ok(())
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let data_dir = cli.data_dir;

    match cli.command {
        Commands::Pick(args) => return pick(&data_dir, &args),
        Commands::Rate {
            id,
            rating,
            note,
            would_return,
        } => rate(&data_dir, &id, rating, note, would_return)?,
        Commands::History { limit } => history(&data_dir, limit)?,
        Commands::Prefs { action } => prefs(&data_dir, &action)?,
        Commands::Settings { action } => settings(&data_dir, &action)?,
    }

    Ok(ExitCode::SUCCESS)
}
