//! punnyland - dad jokes on demand
//!
//! Reads the curated dataset (never writes it) and keeps the listener's
//! profile in `~/.punnyland/user_data.json`.

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use punnyland::delivery::wrap;
use punnyland::lines;
use punnyland::{JokeDeck, JokePackage, UserProfile};
use punnyland_common::config::{
    load_default_config, load_toml_config, resolve_dataset_path, resolve_profile_dir, TomlConfig,
};
use punnyland_common::CornLevel;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Recent jokes skipped by `joke`
const RECENT_FOR_LEVEL: usize = 10;
/// Recent jokes skipped by `random`
const RECENT_FOR_RANDOM: usize = 15;

/// Dad jokes on demand, sorted by corniness
#[derive(Parser, Debug)]
#[command(name = "punnyland")]
#[command(about = "Where dad jokes come to life")]
#[command(version)]
struct Cli {
    /// Dataset file (overrides PUNNYLAND_DATASET and the config file)
    #[arg(long, global = true, value_name = "FILE")]
    dataset: Option<PathBuf>,

    /// Profile directory (default: ~/.punnyland)
    #[arg(long, global = true, value_name = "DIR")]
    profile_dir: Option<PathBuf>,

    /// Config file (default: <config dir>/punnyland/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Tell a joke at your preferred corniness level
    Joke {
        /// Corniness level (1-5)
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=5))]
        level: Option<u8>,
    },
    /// Tell a joke from any level
    Random,
    /// Today's joke of the day (once per day)
    Daily,
    /// Find jokes containing a word
    Search {
        term: String,

        /// Only search this level (1-5)
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=5))]
        level: Option<u8>,
    },
    /// Your statistics and the dataset's
    Stats,
    /// Set your name and preferred level
    Setup {
        #[arg(long)]
        name: String,

        #[arg(long, default_value = "3", value_parser = clap::value_parser!(u8).range(1..=5))]
        level: u8,
    },
    /// Change your preferred corniness level
    Level {
        #[arg(value_parser = clap::value_parser!(u8).range(1..=5))]
        level: u8,
    },
    /// Let dad know that one landed
    Groan,
    /// Jokes you heard recently
    History {
        #[arg(long, default_value = "10")]
        limit: usize,
    },
    /// Manage favorite jokes
    Favorites {
        #[command(subcommand)]
        action: Option<FavoritesAction>,
    },
}

#[derive(Subcommand, Debug)]
enum FavoritesAction {
    /// List favorites (default)
    List,
    /// Save the joke you heard last
    Add,
    /// Remove a favorite by its number in the list
    Remove { number: usize },
    /// Write favorites to a text file
    Export {
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

fn level_from(value: u8) -> Result<CornLevel> {
    CornLevel::from_value(value).with_context(|| format!("Corniness level must be 1-5, got {}", value))
}

fn level_banner(level: CornLevel) -> String {
    format!(
        "[Level {}: {} - {}]",
        level,
        level.display_name(),
        level.description()
    )
}

fn print_package(package: &JokePackage) {
    println!("{}", package.setup_line);
    println!("{}\n", package.dad_setup);
    println!("  {}\n", package.joke);
    println!("{}", level_banner(package.level));
    println!("{}", package.follow_up);
    if let Some(fact) = package.dad_fact {
        println!("\n{}", fact);
    }
}

/// Record a delivered joke, announce achievements and save
fn remember(profile: &mut UserProfile, package: &JokePackage) -> Result<()> {
    for title in profile.record_joke(&package.joke, package.level) {
        println!("\nAchievement unlocked: {}!", title);
    }
    profile.save().context("Failed to save profile")
}

fn load_deck(dataset: &Path) -> Result<JokeDeck> {
    JokeDeck::load(dataset).with_context(|| format!("Failed to load jokes from {}", dataset.display()))
}

fn run(cli: Cli, config: &TomlConfig) -> Result<()> {
    let dataset = resolve_dataset_path(cli.dataset.as_deref(), config);
    let profile_dir = resolve_profile_dir(cli.profile_dir.as_deref(), config);
    let mut profile = UserProfile::load(&profile_dir);
    let mut rng = rand::thread_rng();

    match cli.command {
        Command::Joke { level } => {
            let deck = load_deck(&dataset)?;
            let level = match level {
                Some(value) => level_from(value)?,
                None => profile.level(),
            };
            let recent = profile.recent_jokes(RECENT_FOR_LEVEL);
            let Some(package) = deck.package(level, profile.name(), &recent, &mut rng) else {
                bail!("I'm all out of jokes at level {}. Try a different corniness level!", level);
            };
            print_package(&package);
            remember(&mut profile, &package)?;
            if !profile.data.setup_completed {
                println!("\nTip: run `punnyland setup --name <name>` so dad knows who you are.");
            }
        }
        Command::Random => {
            let deck = load_deck(&dataset)?;
            let recent = profile.recent_jokes(RECENT_FOR_RANDOM);
            let Some(record) = deck.random_joke(&recent, &mut rng) else {
                bail!("No jokes available right now. That's... not very funny.");
            };
            let package = wrap(record, profile.name(), &mut rng);
            println!("Rolling the dad joke dice...\n");
            print_package(&package);
            remember(&mut profile, &package)?;
        }
        Command::Daily => {
            let today = Local::now().date_naive();
            if !profile.is_daily_eligible_on(today) {
                println!("You've already heard today's joke! Come back tomorrow for a fresh one!");
                return Ok(());
            }
            let deck = load_deck(&dataset)?;
            let Some(record) = deck.daily_joke(profile.level(), today) else {
                bail!("There's no joke of the day at level {}. Try a regular joke instead!", profile.level());
            };
            let package = wrap(record, profile.name(), &mut rng);
            println!("{}\n", lines::pick(&mut rng, lines::DAILY_INTROS));
            print_package(&package);
            println!("\nThis is your special joke of the day! Come back tomorrow for another!");
            profile.mark_daily_seen_on(today);
            remember(&mut profile, &package)?;
        }
        Command::Search { term, level } => {
            let deck = load_deck(&dataset)?;
            let level = level.map(level_from).transpose()?;
            let results = deck.search(&term, level);
            if results.is_empty() {
                println!("No jokes found containing '{}'.", term);
                return Ok(());
            }
            println!("Found {} joke(s) containing '{}':\n", results.len(), term);
            for (i, record) in results.iter().enumerate() {
                println!("{}. {}", i + 1, record.text);
                println!("   {}\n", level_banner(record.declared_level));
            }
        }
        Command::Stats => {
            let deck = load_deck(&dataset)?;
            let mine = profile.stats();
            let theirs = deck.stats();
            println!("Your Punnyland Statistics\n");
            println!("Name:             {}", mine.name.as_deref().unwrap_or("(not set)"));
            println!(
                "Corniness level:  {} ({})",
                mine.corniness_level,
                mine.corniness_level.display_name()
            );
            println!("Jokes heard:      {}", mine.total_jokes);
            println!("Favorite jokes:   {}", mine.favorites);
            println!("Groans:           {}", mine.groans);
            println!("Achievements:     {}", mine.achievements.len());
            for title in &mine.achievements {
                println!("  - {}", title);
            }
            println!("Member since:     {}", mine.member_since);

            println!("\nDatabase");
            println!("Total jokes:      {} ({})", theirs.total, theirs.health);
            for level in CornLevel::all() {
                println!(
                    "  Level {} {:<20} {}",
                    level,
                    level.display_name(),
                    theirs.per_level[level.index()]
                );
            }
        }
        Command::Setup { name, level } => {
            let level = level_from(level)?;
            profile.complete_setup(&name, level)?;
            profile.save().context("Failed to save profile")?;
            println!(
                "Welcome to Punnyland, {}! Your corniness level is {} ({}).",
                name.trim(),
                level,
                level.display_name()
            );
        }
        Command::Level { level } => {
            let level = profile.set_level(level)?;
            profile.save().context("Failed to save profile")?;
            println!("Corniness level set to {}", level_banner(level));
        }
        Command::Groan => {
            let count = profile.groan();
            profile.save().context("Failed to save profile")?;
            println!("{} (groan #{})", lines::pick(&mut rng, lines::GROAN_RESPONSES), count);
        }
        Command::History { limit } => {
            let history = &profile.data.joke_history;
            if history.is_empty() {
                println!("No jokes heard yet. Try `punnyland joke`!");
                return Ok(());
            }
            for entry in history.iter().rev().take(limit) {
                println!(
                    "{}  [{}] {}",
                    entry.timestamp.format("%Y-%m-%d %H:%M"),
                    entry.corniness,
                    entry.joke
                );
            }
        }
        Command::Favorites { action } => match action.unwrap_or(FavoritesAction::List) {
            FavoritesAction::List => {
                if profile.favorites().is_empty() {
                    println!("No favorite jokes yet! Hear one you like and run `punnyland favorites add`.");
                }
                for (i, fav) in profile.favorites().iter().enumerate() {
                    println!("{}. {}", i + 1, fav.joke);
                    println!("   {}\n", level_banner(fav.corniness));
                }
            }
            FavoritesAction::Add => {
                let Some(last) = profile.last_heard().cloned() else {
                    bail!("You haven't heard any jokes yet!");
                };
                if profile.add_favorite(&last.joke, last.corniness) {
                    // a saved favorite counts as a groan
                    profile.groan();
                    profile.save().context("Failed to save profile")?;
                    println!("Added to your favorites! Great choice!");
                } else {
                    println!("That joke is already in your favorites!");
                }
            }
            FavoritesAction::Remove { number } => {
                let removed = profile.remove_favorite(number)?;
                profile.save().context("Failed to save profile")?;
                println!("Removed: {}", removed.joke);
            }
            FavoritesAction::Export { output } => {
                let path = profile
                    .export_favorites(output.as_deref())
                    .context("Could not export favorites")?;
                println!("Favorites exported to {}", path.display());
            }
        },
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = match cli.config.as_deref() {
        Some(path) => load_toml_config(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?,
        None => load_default_config(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_writer(std::io::stderr)
        .init();
    info!(
        "Starting punnyland v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    run(cli, &config)
}
