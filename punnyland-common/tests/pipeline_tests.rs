//! End-to-end curation passes over an in-memory snapshot
//!
//! Each pass takes a snapshot and returns a new one; these tests chain them the
//! way the curation tool does and check the properties the dataset relies on.

use punnyland_common::classifier::classify;
use punnyland_common::cleaner::{clean_store, clean_text};
use punnyland_common::dedup::{deduplicate, find_duplicates, similarity};
use punnyland_common::rater::rate_store;
use punnyland_common::reclassify;
use punnyland_common::report::build_report;
use punnyland_common::rules::CompiledRules;
use punnyland_common::validator::{validate_text, Violation};
use punnyland_common::{CornLevel, JokeRecord, JokeStore, RuleTable};
use std::path::PathBuf;

fn dirty_store() -> JokeStore {
    let jokes = [
        (CornLevel::MildChuckle, "I used to be a banker, but I lost interest (because banking is about interest rates)."),
        (CornLevel::MildChuckle, "I would tell you a chemistry joke, but I know I wouldn't get a reaction."),
        (CornLevel::DadApproved, "Why did the chicken cross the road? To get to the other side!...Talk about a wild ride!"),
        (CornLevel::DadApproved, "What do you call a fake noodle? An impasta! Get it?"),
        (CornLevel::EyeRoll, "What do you call a fake noodle? An impasta!"),
        (CornLevel::EyeRoll, "I used to hate facial hair, but then it grew on me, because it's fun."),
        (CornLevel::GroanZone, "What do you call a fish that needs help with his vocals? Auto-tuna!"),
        (CornLevel::GroanZone, "what do you call a fish that needs help with his vocals?? auto tuna! lol"),
        (CornLevel::UltraCorn, "What do you call a cow with no legs? Ground beef! Udderly moo-ving."),
        (CornLevel::UltraCorn, "   "),
    ];
    JokeStore::from_records(jokes.iter().map(|(l, t)| JokeRecord::new(*t, *l)).collect())
}

#[test]
fn test_wild_ride_flagged_and_facial_hair_not() {
    let rules = CompiledRules::built_in();
    let wild = "Why did the chicken cross the road? To get to the other side!...Talk about a wild ride!";
    assert!(validate_text(rules, wild).contains(&Violation::HasTrailingExplanation));

    let hair = "I used to hate facial hair, but then it grew on me, because it's fun.";
    assert!(!validate_text(rules, hair).contains(&Violation::HasTrailingExplanation));
    assert!(classify(rules, hair).hits.iter().all(|h| !h.rule.contains("fur")));
}

#[test]
fn test_clean_dedup_pipeline_converges() {
    let rules = CompiledRules::built_in();
    let store = dirty_store();

    let cleaned = clean_store(rules, &store, true);
    // only the whitespace-only record disappears
    assert_eq!(cleaned.store.len(), store.len() - 1);
    for record in cleaned.store.records() {
        assert!(
            validate_text(rules, &record.text).is_empty(),
            "still invalid after clean: {:?}",
            record.text
        );
    }
    assert!(clean_store(rules, &cleaned.store, true).is_unchanged());

    let scan = find_duplicates(rules, &cleaned.store, rules.table.dedup.threshold);
    assert_eq!(scan.groups.len(), 2, "impasta and auto-tuna pairs");
    let deduped = deduplicate(&cleaned.store, &scan);
    assert_eq!(deduped.len(), cleaned.store.len() - 2);
    assert!(find_duplicates(rules, &deduped, 85.0).groups.is_empty());

    let report = build_report(rules, &deduped);
    assert_eq!(report.invalid, 0);
    assert_eq!(report.duplicates.groups, 0);
    assert_eq!(report.total, deduped.len());
}

#[test]
fn test_report_on_dirty_store() {
    let rules = CompiledRules::built_in();
    let report = build_report(rules, &dirty_store());
    assert_eq!(report.total, 10);
    assert_eq!(report.invalid, 5);
    assert_eq!(report.violation_counts.get("HAS_TRAILING_EXPLANATION"), Some(&4));
    assert_eq!(report.violation_counts.get("EMPTY"), Some(&1));
    assert_eq!(report.classification.unclassifiable, 1);
    assert!(report.quality_score > 0.0 && report.quality_score <= 100.0);
    assert!(!report.recommendations.is_empty());
}

#[test]
fn test_reclassify_without_threshold_changes_nothing() {
    let rules = CompiledRules::built_in();
    let store = dirty_store();
    let plan = reclassify::plan(rules, &store);
    assert_eq!(
        plan.already_correct + plan.unclassifiable + plan.candidates.len(),
        plan.total
    );
    let unchanged = reclassify::apply(&store, &plan, f64::INFINITY);
    assert_eq!(unchanged, store);
}

#[test]
fn test_rating_covers_every_record() {
    let rules = CompiledRules::built_in();
    let store = dirty_store();
    let ratings = rate_store(rules, &store);
    assert_eq!(ratings.len(), store.len());
    assert!(ratings
        .iter()
        .all(|r| (0.0..=100.0).contains(&r.quality_score)));
}

#[test]
fn test_clean_text_idempotent_over_dataset() {
    let rules = CompiledRules::built_in();
    for record in dirty_store().records() {
        let once = clean_text(rules, &record.text);
        assert_eq!(clean_text(rules, &once), once);
    }
}

#[test]
fn test_similarity_properties_over_dataset() {
    let store = dirty_store();
    let texts: Vec<&str> = store.records().iter().map(|r| r.text.as_str()).collect();
    for a in &texts {
        assert_eq!(similarity(a, a), 100.0);
        for b in &texts {
            assert_eq!(similarity(a, b), similarity(b, a));
        }
    }
}

#[test]
fn test_custom_rule_table_changes_threshold() {
    let table = RuleTable::from_toml_str("[dedup]\nthreshold = 100.0\n").unwrap();
    let rules = table.compile().unwrap();
    let store = dirty_store();
    let scan = find_duplicates(&rules, &store, rules.table.dedup.threshold);
    // only exact matches after normalization count now
    assert!(scan.groups.len() <= 1);
}

#[test]
fn test_shipped_dataset_is_clean() {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("data")
        .join("jokes.json");
    let store = JokeStore::load(&path).unwrap();
    assert!(store.count_by_level().iter().all(|c| *c > 0));

    let rules = CompiledRules::built_in();
    let report = build_report(rules, &store);
    assert_eq!(report.invalid, 0, "{:?}", report.invalid_records);
    assert_eq!(report.duplicates.groups, 0, "{:?}", report.duplicates.examples);
}
