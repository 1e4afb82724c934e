//! Joke selection
//!
//! [`JokeDeck`] is a read-only view over a dataset snapshot. Selection takes
//! the caller's RNG so the daily joke can use a date-seeded generator and
//! tests can use a fixed seed.

use crate::lines;
use chrono::{Datelike, NaiveDate};
use punnyland_common::{CornLevel, JokeRecord, JokeStore, Result};
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::path::Path;

/// Below this many unheard jokes the whole level is used again
const MIN_FRESH_CANDIDATES: usize = 3;

/// Chance of a dad fact riding along with a joke
const DAD_FACT_CHANCE: f64 = 0.3;

/// Level weights for a random joke (levels 1..5)
const LEVEL_WEIGHTS: [f64; 5] = [0.1, 0.2, 0.4, 0.2, 0.1];

/// Dataset statistics shown by `stats`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeckStats {
    pub total: usize,
    pub per_level: [usize; 5],
    pub average_per_level: f64,
    pub health: &'static str,
}

/// A joke with everything dad says around it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JokePackage {
    pub joke: String,
    pub level: CornLevel,
    pub setup_line: String,
    pub dad_setup: &'static str,
    pub follow_up: &'static str,
    pub dad_fact: Option<&'static str>,
}

/// Read-only joke collection
#[derive(Debug, Clone, Default)]
pub struct JokeDeck {
    store: JokeStore,
}

impl JokeDeck {
    pub fn new(store: JokeStore) -> Self {
        Self { store }
    }

    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self::new(JokeStore::load(path)?))
    }

    pub fn store(&self) -> &JokeStore {
        &self.store
    }

    /// Random joke at `level`, skipping jokes in `recent` while enough remain
    pub fn joke_by_level<R: Rng + ?Sized>(
        &self,
        level: CornLevel,
        recent: &[String],
        rng: &mut R,
    ) -> Option<&JokeRecord> {
        let all: Vec<&JokeRecord> = self.store.level(level).collect();
        let fresh: Vec<&JokeRecord> = all
            .iter()
            .copied()
            .filter(|r| !recent.contains(&r.text))
            .collect();
        let pool = if fresh.len() < MIN_FRESH_CANDIDATES {
            all
        } else {
            fresh
        };
        pool.choose(rng).copied()
    }

    /// Random joke from a level weighted toward the middle
    pub fn random_joke<R: Rng + ?Sized>(&self, recent: &[String], rng: &mut R) -> Option<&JokeRecord> {
        let weights = WeightedIndex::new(LEVEL_WEIGHTS).ok()?;
        let level = CornLevel::all()[weights.sample(rng)];
        self.joke_by_level(level, recent, rng)
    }

    /// Joke of the day: the same joke for the same date
    pub fn daily_joke(&self, level: CornLevel, date: NaiveDate) -> Option<&JokeRecord> {
        let mut rng = StdRng::seed_from_u64(date.num_days_from_ce() as u64);
        self.joke_by_level(level, &[], &mut rng)
    }

    /// Case-insensitive substring search, in dataset order
    pub fn search(&self, term: &str, level: Option<CornLevel>) -> Vec<&JokeRecord> {
        let needle = term.to_lowercase();
        self.store
            .records()
            .iter()
            .filter(|r| level.map_or(true, |l| r.declared_level == l))
            .filter(|r| r.text.to_lowercase().contains(&needle))
            .collect()
    }

    pub fn stats(&self) -> DeckStats {
        let total = self.store.len();
        let health = if total >= 200 {
            "Excellent"
        } else if total >= 100 {
            "Good"
        } else {
            "Needs more jokes!"
        };
        DeckStats {
            total,
            per_level: self.store.count_by_level(),
            average_per_level: total as f64 / CornLevel::all().len() as f64,
            health,
        }
    }

    /// Joke plus setup, follow-up and the occasional dad fact
    pub fn package<R: Rng + ?Sized>(
        &self,
        level: CornLevel,
        name: Option<&str>,
        recent: &[String],
        rng: &mut R,
    ) -> Option<JokePackage> {
        let record = self.joke_by_level(level, recent, rng)?;
        Some(wrap(record, name, rng))
    }
}

/// Dress a chosen joke in dad's lines
pub fn wrap<R: Rng + ?Sized>(record: &JokeRecord, name: Option<&str>, rng: &mut R) -> JokePackage {
    JokePackage {
        joke: record.text.clone(),
        level: record.declared_level,
        setup_line: lines::setup_line(rng, name),
        dad_setup: lines::pick(rng, lines::DAD_SETUPS),
        follow_up: lines::pick(rng, lines::FOLLOW_UPS),
        dad_fact: rng
            .gen_bool(DAD_FACT_CHANCE)
            .then(|| lines::pick(rng, lines::DAD_FACTS)),
    }
}
