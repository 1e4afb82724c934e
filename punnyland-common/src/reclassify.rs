//! Reclassification planning
//!
//! Compares each record's declared level with the classifier's prediction and
//! sorts disagreements into confidence bands. Moves are only applied with an
//! explicit minimum confidence from the operator.

use crate::classifier::classify;
use crate::rules::CompiledRules;
use crate::store::{JokeRecord, JokeStore};
use crate::CornLevel;
use serde::Serialize;
use std::collections::BTreeMap;

/// Confidence band of a proposed move
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceBand {
    High,
    Medium,
    Low,
}

/// One proposed level change
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoveCandidate {
    /// Index into [`JokeStore::records`]
    pub index: usize,
    pub text: String,
    pub from: CornLevel,
    pub to: CornLevel,
    pub confidence: f64,
    pub band: ConfidenceBand,
}

/// Reclassification plan for a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct ReclassifyPlan {
    pub total: usize,
    pub already_correct: usize,
    /// Records with empty text; never moved
    pub unclassifiable: usize,
    pub candidates: Vec<MoveCandidate>,
    /// Counts keyed by "from->to"
    pub transitions: BTreeMap<String, usize>,
}

impl ReclassifyPlan {
    /// Share of records whose prediction matches the declared level (0-100)
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.already_correct as f64 / self.total as f64 * 100.0
    }

    pub fn count_in(&self, band: ConfidenceBand) -> usize {
        self.candidates.iter().filter(|c| c.band == band).count()
    }

    /// Candidates a run with `min_confidence` would move
    pub fn moves_at(&self, min_confidence: f64) -> impl Iterator<Item = &MoveCandidate> {
        self.candidates
            .iter()
            .filter(move |c| c.confidence >= min_confidence)
    }
}

/// Classify every record and collect disagreements
pub fn plan(rules: &CompiledRules, store: &JokeStore) -> ReclassifyPlan {
    let bands = &rules.table.reclassify;
    let mut result = ReclassifyPlan {
        total: store.len(),
        ..Default::default()
    };

    for (index, record) in store.records().iter().enumerate() {
        let prediction = classify(rules, &record.text);
        let Some(predicted) = prediction.level else {
            result.unclassifiable += 1;
            continue;
        };
        if predicted == record.declared_level {
            result.already_correct += 1;
            continue;
        }

        let band = if prediction.confidence >= bands.high_confidence {
            ConfidenceBand::High
        } else if prediction.confidence >= bands.low_confidence {
            ConfidenceBand::Medium
        } else {
            ConfidenceBand::Low
        };
        *result
            .transitions
            .entry(format!("{}->{}", record.declared_level, predicted))
            .or_insert(0) += 1;
        result.candidates.push(MoveCandidate {
            index,
            text: record.text.clone(),
            from: record.declared_level,
            to: predicted,
            confidence: prediction.confidence,
            band,
        });
    }

    result
}

/// New snapshot with every candidate at or above `min_confidence` moved
///
/// Moved records are appended to their new level, keeping their relative order.
pub fn apply(store: &JokeStore, plan: &ReclassifyPlan, min_confidence: f64) -> JokeStore {
    let mut targets: Vec<Option<CornLevel>> = vec![None; store.len()];
    for candidate in plan.moves_at(min_confidence) {
        if let Some(slot) = targets.get_mut(candidate.index) {
            *slot = Some(candidate.to);
        }
    }

    let (stay, moved): (Vec<_>, Vec<_>) = store
        .records()
        .iter()
        .zip(targets)
        .partition(|(_, target)| target.is_none());

    let mut records: Vec<JokeRecord> = stay.into_iter().map(|(r, _)| r.clone()).collect();
    records.extend(moved.into_iter().filter_map(|(r, target)| {
        target.map(|level| JokeRecord::new(r.text.clone(), level))
    }));
    JokeStore::from_records(records)
}
