//! Joke text cleanup
//!
//! Strips what the validator flags as appended explanation (trailing
//! explanation sentences, explanatory parentheticals, hashtags and "lol"),
//! stray symbols and excess punctuation, while leaving the setup and
//! punchline alone.
//!
//! [`clean_text`] repeats its pass until the text stops changing, so cleaning
//! already-clean text is a no-op.

use crate::rules::CompiledRules;
use crate::store::{JokeRecord, JokeStore};
use crate::validator::{
    explanatory_parentheticals, trailing_explanation_start, trailing_noise_start, validate_text,
    Violation,
};
use crate::CornLevel;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

const MAX_PASSES: usize = 16;

static REPEATED_BANG: Lazy<Regex> = Lazy::new(|| Regex::new(r"!{2,}").expect("pattern compiles"));
static DANGLING_DOTS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([!?])[.\u{2026}]+$").expect("pattern compiles"));
static SPACE_BEFORE_PUNCT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+([.!?,;:])").expect("pattern compiles"));

fn single_pass(rules: &CompiledRules, text: &str) -> String {
    // whitespace becomes a space, stray symbols (emoji) are dropped, letters are kept
    let mut out: String = text
        .chars()
        .filter_map(|c| {
            if c.is_whitespace() {
                Some(' ')
            } else if rules.is_printable(c) || c.is_alphanumeric() {
                Some(c)
            } else {
                None
            }
        })
        .collect();

    if let Some(start) = trailing_noise_start(rules, &out) {
        out.truncate(start);
    }

    for (start, end) in explanatory_parentheticals(rules, &out).into_iter().rev() {
        out.replace_range(start..end, "");
    }

    if let Some(start) = trailing_explanation_start(rules, &out) {
        out.truncate(start);
    }

    let out = REPEATED_BANG.replace_all(&out, "!");
    let out = out.split_whitespace().collect::<Vec<_>>().join(" ");
    let out = SPACE_BEFORE_PUNCT.replace_all(&out, "$1");
    let out = DANGLING_DOTS.replace(&out, "$1");
    out.trim_end_matches(|c: char| c == ',' || c.is_whitespace())
        .trim()
        .to_string()
}

/// Clean one joke text (idempotent)
pub fn clean_text(rules: &CompiledRules, text: &str) -> String {
    let mut current = text.to_string();
    for _ in 0..MAX_PASSES {
        let next = single_pass(rules, &current);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

/// Why a record changed during a clean pass
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CleanChange {
    /// Text rewritten
    Rewritten {
        level: CornLevel,
        before: String,
        after: String,
    },
    /// Record removed because nothing was left after cleaning
    RemovedEmpty { level: CornLevel, before: String },
    /// Record removed because it still fails validation
    RemovedInvalid {
        level: CornLevel,
        text: String,
        violations: BTreeSet<Violation>,
    },
}

/// Result of cleaning a snapshot
#[derive(Debug, Clone)]
pub struct CleanOutcome {
    pub store: JokeStore,
    pub changes: Vec<CleanChange>,
}

impl CleanOutcome {
    pub fn is_unchanged(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Clean every record; with `drop_invalid`, also remove records that still
/// fail validation after cleaning
pub fn clean_store(rules: &CompiledRules, store: &JokeStore, drop_invalid: bool) -> CleanOutcome {
    let mut kept = Vec::with_capacity(store.len());
    let mut changes = Vec::new();

    for record in store.records() {
        let level = record.declared_level;
        let cleaned = clean_text(rules, &record.text);

        if cleaned.is_empty() {
            changes.push(CleanChange::RemovedEmpty {
                level,
                before: record.text.clone(),
            });
            continue;
        }

        if drop_invalid {
            let violations = validate_text(rules, &cleaned);
            if !violations.is_empty() {
                debug!(level = level.value(), ?violations, "dropping invalid joke");
                changes.push(CleanChange::RemovedInvalid {
                    level,
                    text: cleaned,
                    violations,
                });
                continue;
            }
        }

        if cleaned != record.text {
            changes.push(CleanChange::Rewritten {
                level,
                before: record.text.clone(),
                after: cleaned.clone(),
            });
        }
        kept.push(JokeRecord::new(cleaned, level));
    }

    CleanOutcome {
        store: JokeStore::from_records(kept),
        changes,
    }
}
