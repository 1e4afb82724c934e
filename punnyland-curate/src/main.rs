//! punnyland-curate - maintenance tools for the joke dataset
//!
//! Every tool loads the dataset as an immutable snapshot, computes a new
//! snapshot and commits it (timestamped backup, then atomic write). Audit and
//! rate are read-only.
//!
//! ```bash
//! punnyland-curate audit [--report <file>] [--fail-on-issues]
//! punnyland-curate rate ["joke text"] [--json]
//! punnyland-curate clean [--drop-invalid] [--dry-run] [--output <file>]
//! punnyland-curate dedup [--threshold 85] [--dry-run] [--output <file>]
//! punnyland-curate reclassify [--min-confidence 0.6] [--dry-run] [--output <file>]
//! ```

mod display;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use punnyland_common::cleaner::clean_store;
use punnyland_common::config::{
    load_default_config, load_toml_config, resolve_dataset_path, resolve_rules_path, TomlConfig,
};
use punnyland_common::dedup::{deduplicate, find_duplicates};
use punnyland_common::fsutil::write_atomic;
use punnyland_common::rater::{rate_store, rate_text};
use punnyland_common::reclassify;
use punnyland_common::report::build_report_with_threshold;
use punnyland_common::rules::CompiledRules;
use punnyland_common::store::{CommitOptions, CommitOutcome};
use punnyland_common::{JokeStore, RuleTable};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Curation tools for the Punnyland joke dataset
#[derive(Parser, Debug)]
#[command(name = "punnyland-curate")]
#[command(about = "Audit, rate, clean, deduplicate and reclassify the joke dataset")]
#[command(version)]
struct Cli {
    /// Dataset file (overrides PUNNYLAND_DATASET and the config file)
    #[arg(long, global = true, value_name = "FILE")]
    dataset: Option<PathBuf>,

    /// Rule table overrides (TOML)
    #[arg(long, global = true, value_name = "FILE")]
    rules: Option<PathBuf>,

    /// Config file (default: <config dir>/punnyland/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

/// Options shared by the tools that rewrite the dataset
#[derive(Args, Debug, Clone)]
struct WriteArgs {
    /// Show what would change without writing anything
    #[arg(long)]
    dry_run: bool,

    /// Write the result here instead of overwriting the dataset
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate every joke and report quality, balance and duplicates
    Audit {
        /// Save the full report as JSON
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,

        /// Duplicate similarity threshold (0-100)
        #[arg(long)]
        threshold: Option<f64>,

        /// Exit non-zero when invalid jokes or duplicates are found
        #[arg(long)]
        fail_on_issues: bool,
    },
    /// Rate a single joke, or every joke in the dataset
    Rate {
        /// Joke text to rate; rates the whole dataset when omitted
        text: Option<String>,

        /// Print ratings as JSON
        #[arg(long)]
        json: bool,

        /// Number of lowest-scoring jokes to list for a dataset rating
        #[arg(long, default_value = "10")]
        worst: usize,
    },
    /// Strip explanations, noise and stray punctuation from every joke
    Clean {
        /// Also remove jokes that still fail validation after cleaning
        #[arg(long)]
        drop_invalid: bool,

        #[command(flatten)]
        write: WriteArgs,
    },
    /// Remove near-duplicate jokes, keeping one per group
    Dedup {
        /// Similarity threshold (0-100)
        #[arg(long)]
        threshold: Option<f64>,

        #[command(flatten)]
        write: WriteArgs,
    },
    /// Move jokes to the level the classifier predicts
    Reclassify {
        /// Apply moves at or above this confidence (0-1); report only when omitted
        #[arg(long)]
        min_confidence: Option<f64>,

        #[command(flatten)]
        write: WriteArgs,
    },
}

fn init_tracing(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<TomlConfig> {
    match path {
        Some(path) => load_toml_config(path)
            .with_context(|| format!("Failed to read config file {}", path.display())),
        None => Ok(load_default_config()),
    }
}

fn load_rules(path: Option<&Path>) -> Result<CompiledRules> {
    let table = match path {
        Some(path) => {
            info!("Loading rule table from {}", path.display());
            RuleTable::load(path)
                .with_context(|| format!("Failed to load rule table {}", path.display()))?
        }
        None => RuleTable::default(),
    };
    table.compile().context("Invalid rule table")
}

fn check_threshold(threshold: f64) -> Result<f64> {
    if !(0.0..=100.0).contains(&threshold) {
        bail!("--threshold must be within 0-100, got {}", threshold);
    }
    Ok(threshold)
}

/// Show the diff and commit `after` unless it is a dry run
fn commit(
    before: &JokeStore,
    after: &JokeStore,
    dataset: &Path,
    write: &WriteArgs,
    operation: &str,
) -> Result<()> {
    let diff = before.diff(after);
    display::print_diff(&diff, write.dry_run);

    let target = write.output.as_deref().unwrap_or(dataset);
    let options = CommitOptions {
        operation,
        dry_run: write.dry_run,
    };
    let outcome = after
        .commit(target, &options)
        .with_context(|| format!("Failed to write {}", target.display()))?;

    match outcome {
        CommitOutcome::DryRun => println!("Dry run: no files were changed."),
        CommitOutcome::Unchanged => println!("No changes needed."),
        CommitOutcome::Written { backup } => {
            if let Some(backup) = backup {
                println!("Backup saved to {}", backup.display());
            }
            println!("Wrote {} jokes to {}", after.len(), target.display());
        }
    }
    Ok(())
}

fn run(cli: Cli, config: &TomlConfig) -> Result<ExitCode> {
    let dataset = resolve_dataset_path(cli.dataset.as_deref(), config);
    let rules_path = resolve_rules_path(cli.rules.as_deref(), config);
    let rules = load_rules(rules_path.as_deref())?;

    // single-text rating needs no dataset
    if let Command::Rate {
        text: Some(text),
        json,
        ..
    } = &cli.command
    {
        let rating = rate_text(&rules, text);
        if *json {
            println!("{}", serde_json::to_string_pretty(&rating)?);
        } else {
            display::print_rating(&rating);
        }
        return Ok(ExitCode::SUCCESS);
    }

    info!("Dataset: {}", dataset.display());
    let store = JokeStore::load(&dataset)
        .with_context(|| format!("Failed to load dataset {}", dataset.display()))?;

    match cli.command {
        Command::Audit {
            report,
            threshold,
            fail_on_issues,
        } => {
            let threshold = check_threshold(threshold.unwrap_or(rules.table.dedup.threshold))?;
            let audit = build_report_with_threshold(&rules, &store, threshold);
            display::print_report(&audit);

            if let Some(path) = report {
                let json = serde_json::to_string_pretty(&audit)?;
                write_atomic(&path, json.as_bytes())
                    .with_context(|| format!("Failed to save report {}", path.display()))?;
                println!("\nReport saved to {}", path.display());
            }

            if fail_on_issues && audit.has_issues() {
                warn!("Audit found issues");
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Rate { json, worst, .. } => {
            let ratings = rate_store(&rules, &store);
            if json {
                println!("{}", serde_json::to_string_pretty(&ratings)?);
            } else {
                display::print_dataset_ratings(&ratings, worst);
            }
        }
        Command::Clean {
            drop_invalid,
            write,
        } => {
            let outcome = clean_store(&rules, &store, drop_invalid);
            display::print_clean_changes(&outcome.changes);
            commit(&store, &outcome.store, &dataset, &write, "clean")?;
        }
        Command::Dedup { threshold, write } => {
            let threshold = check_threshold(threshold.unwrap_or(rules.table.dedup.threshold))?;
            let scan = find_duplicates(&rules, &store, threshold);
            display::print_duplicates(&store, &scan);
            let deduped = deduplicate(&store, &scan);
            commit(&store, &deduped, &dataset, &write, "dedup")?;
        }
        Command::Reclassify {
            min_confidence,
            write,
        } => {
            let plan = reclassify::plan(&rules, &store);
            display::print_reclassify_plan(&plan, &rules);
            match min_confidence {
                Some(min) if !(0.0..=1.0).contains(&min) => {
                    bail!("--min-confidence must be within 0-1, got {}", min);
                }
                Some(min) => {
                    let moved = reclassify::apply(&store, &plan, min);
                    commit(&store, &moved, &dataset, &write, "reclassify")?;
                }
                None => {
                    println!("\nNo jokes moved. Pass --min-confidence to apply changes.");
                }
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    init_tracing(&config.logging.level);
    info!(
        "Starting punnyland-curate v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    run(cli, &config)
}
