//! Joke rating
//!
//! Combines validator and classifier output for a single text into a rating
//! with a 0-100 quality score and suggestions for the curator.

use crate::classifier::{classify, JokeForm, Prediction};
use crate::rules::CompiledRules;
use crate::store::JokeStore;
use crate::validator::{validate_text, Violation};
use crate::CornLevel;
use serde::Serialize;
use std::collections::BTreeSet;

const VIOLATION_PENALTY: f64 = 10.0;
const OVERRUN_PENALTY_PER_CHAR: f64 = 0.1;

/// Rating for one joke text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingResult {
    pub text: String,
    pub length: usize,
    pub valid: bool,
    pub violations: BTreeSet<Violation>,
    pub prediction: Prediction,
    /// Pun signals after the cap
    pub pun_signals: u32,
    pub form: JokeForm,
    /// Level the joke is filed under, when rating a dataset record
    pub declared_level: Option<CornLevel>,
    /// 0-100
    pub quality_score: f64,
    pub recommendations: Vec<String>,
}

impl RatingResult {
    /// Whether the prediction disagrees with the declared level
    pub fn is_misfiled(&self) -> bool {
        matches!(
            (self.declared_level, self.prediction.level),
            (Some(declared), Some(predicted)) if declared != predicted
        )
    }
}

fn quality_score(rules: &CompiledRules, violations: usize, length: usize, level: Option<CornLevel>) -> f64 {
    let cap = level.map_or(rules.table.validator.hard_cap, |l| rules.soft_cap(l));
    let overrun = length.saturating_sub(cap) as f64;
    let score = 100.0 - VIOLATION_PENALTY * violations as f64 - OVERRUN_PENALTY_PER_CHAR * overrun;
    (score.clamp(0.0, 100.0) * 10.0).round() / 10.0
}

fn recommendations(
    rules: &CompiledRules,
    violations: &BTreeSet<Violation>,
    prediction: &Prediction,
    length: usize,
    declared: Option<CornLevel>,
) -> Vec<String> {
    let mut out: Vec<String> = violations
        .iter()
        .map(|v| match v {
            Violation::Empty => "Add some joke text".to_string(),
            Violation::TooLong => format!(
                "Shorten to at most {} characters",
                rules.table.validator.hard_cap
            ),
            Violation::TooShort => "Expand the setup; the joke is too short".to_string(),
            Violation::HasTrailingExplanation => {
                "Remove the explanation after the punchline (run clean)".to_string()
            }
            Violation::NonAsciiOrUnprintable => {
                "Replace emoji and unusual characters with plain text".to_string()
            }
            Violation::ForbiddenWord => "Replace the forbidden word".to_string(),
        })
        .collect();

    if let Some(level) = prediction.level {
        let cap = rules.soft_cap(level);
        if length > cap {
            out.push(format!(
                "Longer than the {} soft cap of {} characters",
                level.display_name(),
                cap
            ));
        }
        if let Some(declared) = declared.filter(|d| *d != level) {
            out.push(format!(
                "Filed as level {} but reads like level {} ({}, confidence {:.2})",
                declared,
                level,
                level.display_name(),
                prediction.confidence
            ));
        }
        if prediction.signals == 0 && prediction.form == JokeForm::Statement {
            out.push("No wordplay detected; consider a stronger pun".to_string());
        }
    }

    out
}

fn rate(rules: &CompiledRules, text: &str, declared: Option<CornLevel>) -> RatingResult {
    let violations = validate_text(rules, text);
    let prediction = classify(rules, text);
    let length = text.chars().count();
    RatingResult {
        text: text.to_string(),
        length,
        valid: violations.is_empty(),
        quality_score: quality_score(rules, violations.len(), length, prediction.level),
        recommendations: recommendations(rules, &violations, &prediction, length, declared),
        pun_signals: prediction.signals,
        form: prediction.form,
        declared_level: declared,
        violations,
        prediction,
    }
}

/// Rate a single text
pub fn rate_text(rules: &CompiledRules, text: &str) -> RatingResult {
    rate(rules, text, None)
}

/// Rate every record in the snapshot, in dataset order
pub fn rate_store(rules: &CompiledRules, store: &JokeStore) -> Vec<RatingResult> {
    store
        .records()
        .iter()
        .map(|r| rate(rules, &r.text, Some(r.declared_level)))
        .collect()
}
