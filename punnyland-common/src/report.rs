//! Audit report
//!
//! Aggregates validator, classifier and duplicate detector output over a
//! snapshot. Pure aggregation; the report serializes to JSON as-is.

use crate::classifier::classify;
use crate::dedup::{find_duplicates, DuplicateScan};
use crate::rules::CompiledRules;
use crate::store::JokeStore;
use crate::validator::validate;
use crate::CornLevel;
use chrono::Local;
use serde::Serialize;
use std::collections::BTreeMap;

/// Ideal share of the dataset per level, in percent
const IDEAL_SHARE: f64 = 100.0 / 5.0;

/// Distribution entry for one level
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelStats {
    pub level: CornLevel,
    pub name: &'static str,
    pub count: usize,
    pub percentage: f64,
    pub avg_length: f64,
    pub min_length: usize,
    pub max_length: usize,
}

/// A record flagged by the validator
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvalidRecord {
    pub level: CornLevel,
    pub text: String,
    pub violations: Vec<String>,
}

/// A record longer than its level's soft cap
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SoftCapOverrun {
    pub level: CornLevel,
    pub text: String,
    pub over_by: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct ClassificationSummary {
    /// Records whose prediction equals the declared level
    pub agreeing: usize,
    /// Percentage of classifiable records that agree
    pub agreement_rate: f64,
    /// Disagreements below the low-confidence band
    pub low_confidence: usize,
    pub unclassifiable: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateSummary {
    pub threshold: f64,
    pub groups: usize,
    pub redundant_records: usize,
    /// Texts of each group, keeper first
    pub examples: Vec<Vec<String>>,
}

/// Full audit of a snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditReport {
    pub generated_at: String,
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    /// Violation id -> number of records with that violation
    pub violation_counts: BTreeMap<String, usize>,
    pub distribution: Vec<LevelStats>,
    pub balance_score: f64,
    pub quality_score: f64,
    pub duplicates: DuplicateSummary,
    pub classification: ClassificationSummary,
    pub soft_cap_overruns: Vec<SoftCapOverrun>,
    pub invalid_records: Vec<InvalidRecord>,
    pub recommendations: Vec<String>,
}

impl AuditReport {
    /// Whether anything needs a curator's attention
    pub fn has_issues(&self) -> bool {
        self.invalid > 0 || self.duplicates.groups > 0
    }
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

fn distribution(store: &JokeStore) -> Vec<LevelStats> {
    CornLevel::all()
        .iter()
        .map(|level| {
            let lengths: Vec<usize> = store.level(*level).map(|r| r.char_len()).collect();
            let count = lengths.len();
            LevelStats {
                level: *level,
                name: level.display_name(),
                count,
                percentage: round1(percentage(count, store.len())),
                avg_length: if count == 0 {
                    0.0
                } else {
                    round1(lengths.iter().sum::<usize>() as f64 / count as f64)
                },
                min_length: lengths.iter().copied().min().unwrap_or(0),
                max_length: lengths.iter().copied().max().unwrap_or(0),
            }
        })
        .collect()
}

/// 100 minus twice the mean deviation from an even split, floored at 0
pub fn balance_score(distribution: &[LevelStats], total: usize) -> f64 {
    if total == 0 || distribution.is_empty() {
        return 0.0;
    }
    let deviation: f64 = distribution
        .iter()
        .map(|s| (percentage(s.count, total) - IDEAL_SHARE).abs())
        .sum::<f64>()
        / distribution.len() as f64;
    round1((100.0 - 2.0 * deviation).max(0.0))
}

fn duplicate_summary(store: &JokeStore, scan: &DuplicateScan) -> DuplicateSummary {
    let records = store.records();
    let examples = scan
        .groups
        .iter()
        .map(|g| {
            std::iter::once(g.keeper)
                .chain(g.redundant())
                .map(|i| records[i].text.clone())
                .collect()
        })
        .collect();
    DuplicateSummary {
        threshold: scan.threshold,
        groups: scan.groups.len(),
        redundant_records: scan.redundant_count(),
        examples,
    }
}

fn recommendations(report: &AuditReport) -> Vec<String> {
    let mut out = Vec::new();
    if report.invalid > 0 {
        out.push(format!(
            "{} jokes fail validation; run `clean` (with --drop-invalid to remove the rest)",
            report.invalid
        ));
    }
    if report.duplicates.groups > 0 {
        out.push(format!(
            "{} duplicate groups found; run `dedup` to remove {} redundant jokes",
            report.duplicates.groups, report.duplicates.redundant_records
        ));
    }
    for stats in &report.distribution {
        if stats.percentage < IDEAL_SHARE / 2.0 {
            out.push(format!(
                "Level {} ({}) is underrepresented at {:.1}%; add more jokes",
                stats.level, stats.name, stats.percentage
            ));
        } else if stats.percentage > IDEAL_SHARE * 1.5 {
            out.push(format!(
                "Level {} ({}) is overrepresented at {:.1}%",
                stats.level, stats.name, stats.percentage
            ));
        }
    }
    if report.classification.low_confidence > 0 {
        out.push(format!(
            "{} jokes disagree with the classifier at low confidence; review them by hand",
            report.classification.low_confidence
        ));
    }
    if !report.soft_cap_overruns.is_empty() {
        out.push(format!(
            "{} jokes run past their level's preferred length",
            report.soft_cap_overruns.len()
        ));
    }
    out
}

/// Audit a snapshot
pub fn build_report(rules: &CompiledRules, store: &JokeStore) -> AuditReport {
    build_report_with_threshold(rules, store, rules.table.dedup.threshold)
}

/// Audit a snapshot with an explicit duplicate threshold
pub fn build_report_with_threshold(
    rules: &CompiledRules,
    store: &JokeStore,
    threshold: f64,
) -> AuditReport {
    let total = store.len();
    let mut violation_counts = BTreeMap::new();
    let mut invalid_records = Vec::new();
    let mut soft_cap_overruns = Vec::new();
    let mut classification = ClassificationSummary::default();

    for record in store.records() {
        let validation = validate(rules, record);
        for violation in &validation.violations {
            *violation_counts.entry(violation.id().to_string()).or_insert(0) += 1;
        }
        if !validation.is_valid() {
            invalid_records.push(InvalidRecord {
                level: record.declared_level,
                text: record.text.clone(),
                violations: validation.violations.iter().map(|v| v.id().to_string()).collect(),
            });
        }
        if let Some(over_by) = validation.soft_cap_overrun {
            soft_cap_overruns.push(SoftCapOverrun {
                level: record.declared_level,
                text: record.text.clone(),
                over_by,
            });
        }

        let prediction = classify(rules, &record.text);
        match prediction.level {
            None => classification.unclassifiable += 1,
            Some(level) if level == record.declared_level => classification.agreeing += 1,
            Some(_) if prediction.confidence < rules.table.reclassify.low_confidence => {
                classification.low_confidence += 1
            }
            Some(_) => {}
        }
    }
    classification.agreement_rate = round1(percentage(
        classification.agreeing,
        total - classification.unclassifiable,
    ));

    let invalid = invalid_records.len();
    let valid = total - invalid;
    let distribution = distribution(store);
    let balance = balance_score(&distribution, total);
    let quality = if total == 0 {
        0.0
    } else {
        round1(0.7 * percentage(valid, total) + 0.3 * balance)
    };
    let scan = find_duplicates(rules, store, threshold);

    let mut report = AuditReport {
        generated_at: Local::now().to_rfc3339(),
        total,
        valid,
        invalid,
        violation_counts,
        distribution,
        balance_score: balance,
        quality_score: quality,
        duplicates: duplicate_summary(store, &scan),
        classification,
        soft_cap_overruns,
        invalid_records,
        recommendations: Vec::new(),
    };
    report.recommendations = recommendations(&report);
    report
}
