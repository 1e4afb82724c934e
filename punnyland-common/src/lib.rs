//! # Punnyland Common Library
//!
//! Shared code for the Punnyland joke tools including:
//! - Joke dataset loading, snapshots and atomic commits
//! - Corniness levels
//! - Data-driven rule tables
//! - Quality validation, classification and duplicate detection
//! - Cleaning, reclassification and rating passes
//! - Audit report aggregation
//! - Configuration loading

pub mod classifier;
pub mod cleaner;
pub mod config;
pub mod dedup;
pub mod error;
pub mod fsutil;
pub mod level;
pub mod rater;
pub mod reclassify;
pub mod report;
pub mod rules;
pub mod store;
pub mod validator;

pub use error::{Error, Result};
pub use level::CornLevel;
pub use rules::RuleTable;
pub use store::{JokeRecord, JokeStore};
