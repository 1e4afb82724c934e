//! Console output for the curation tools

use punnyland_common::cleaner::CleanChange;
use punnyland_common::dedup::DuplicateScan;
use punnyland_common::rater::RatingResult;
use punnyland_common::reclassify::{ConfidenceBand, ReclassifyPlan};
use punnyland_common::report::AuditReport;
use punnyland_common::rules::CompiledRules;
use punnyland_common::store::StoreDiff;
use punnyland_common::JokeStore;

const RULE: &str = "============================================================";
const PREVIEW_CHARS: usize = 70;
const MAX_LISTED: usize = 10;

fn header(title: &str) {
    println!("{}", RULE);
    println!("{}", title);
    println!("{}", RULE);
}

fn preview(text: &str) -> String {
    if text.chars().count() <= PREVIEW_CHARS {
        text.to_string()
    } else {
        let cut: String = text.chars().take(PREVIEW_CHARS - 3).collect();
        format!("{}...", cut)
    }
}

pub fn print_diff(diff: &StoreDiff, dry_run: bool) {
    if diff.is_empty() {
        return;
    }
    let verb = if dry_run { "Would change" } else { "Changing" };
    println!(
        "\n{}: {} removed, {} added",
        verb,
        diff.removed.len(),
        diff.added.len()
    );
    for record in diff.removed.iter().take(MAX_LISTED) {
        println!("  - [{}] {}", record.declared_level, preview(&record.text));
    }
    for record in diff.added.iter().take(MAX_LISTED) {
        println!("  + [{}] {}", record.declared_level, preview(&record.text));
    }
    let hidden = diff.removed.len().saturating_sub(MAX_LISTED) + diff.added.len().saturating_sub(MAX_LISTED);
    if hidden > 0 {
        println!("  ... and {} more", hidden);
    }
}

pub fn print_rating(rating: &RatingResult) {
    header("JOKE RATING");
    println!("Text:       {}", rating.text);
    println!("Length:     {} characters", rating.length);
    println!("Form:       {:?}", rating.form);
    println!("Pun signals: {}", rating.pun_signals);
    match rating.prediction.level {
        Some(level) => println!(
            "Predicted:  level {} ({}), confidence {:.2}",
            level,
            level.display_name(),
            rating.prediction.confidence
        ),
        None => println!("Predicted:  unclassifiable"),
    }
    println!("Quality:    {:.1}/100", rating.quality_score);
    if rating.valid {
        println!("Valid:      yes");
    } else {
        println!("Valid:      no");
        for violation in &rating.violations {
            println!("  - {}: {}", violation, violation.describe());
        }
    }
    if !rating.recommendations.is_empty() {
        println!("\nRecommendations:");
        for r in &rating.recommendations {
            println!("  * {}", r);
        }
    }
}

pub fn print_dataset_ratings(ratings: &[RatingResult], worst: usize) {
    header("DATASET RATING");
    if ratings.is_empty() {
        println!("No jokes to rate.");
        return;
    }
    let average = ratings.iter().map(|r| r.quality_score).sum::<f64>() / ratings.len() as f64;
    let invalid = ratings.iter().filter(|r| !r.valid).count();
    let misfiled = ratings.iter().filter(|r| r.is_misfiled()).count();
    println!("Jokes rated:     {}", ratings.len());
    println!("Average quality: {:.1}/100", average);
    println!("Invalid:         {}", invalid);
    println!("Misfiled:        {}", misfiled);

    let mut ranked: Vec<&RatingResult> = ratings.iter().collect();
    ranked.sort_by(|a, b| a.quality_score.total_cmp(&b.quality_score));
    let lowest: Vec<_> = ranked
        .into_iter()
        .filter(|r| r.quality_score < 100.0 || r.is_misfiled())
        .take(worst)
        .collect();
    if !lowest.is_empty() {
        println!("\nNeeds attention:");
        for r in lowest {
            let level = r
                .declared_level
                .map_or_else(|| "?".to_string(), |l| l.to_string());
            println!("  [{}] {:5.1}  {}", level, r.quality_score, preview(&r.text));
            for rec in &r.recommendations {
                println!("           * {}", rec);
            }
        }
    }
}

pub fn print_report(report: &AuditReport) {
    header("DATASET AUDIT");
    println!("Generated:     {}", report.generated_at);
    println!("Total jokes:   {}", report.total);
    println!("Valid:         {}", report.valid);
    println!("Invalid:       {}", report.invalid);
    println!("Quality score: {:.1}/100", report.quality_score);
    println!("Balance score: {:.1}/100", report.balance_score);

    println!("\nDistribution:");
    for s in &report.distribution {
        println!(
            "  Level {} {:<20} {:4} ({:5.1}%)  avg {:5.1}  min {:3}  max {:3}",
            s.level, s.name, s.count, s.percentage, s.avg_length, s.min_length, s.max_length
        );
    }

    if !report.violation_counts.is_empty() {
        println!("\nViolations:");
        for (rule, count) in &report.violation_counts {
            println!("  {:<26} {}", rule, count);
        }
        for record in report.invalid_records.iter().take(MAX_LISTED) {
            println!(
                "  [{}] {}  ({})",
                record.level,
                preview(&record.text),
                record.violations.join(", ")
            );
        }
    }

    println!(
        "\nDuplicates (threshold {:.0}): {} groups, {} redundant",
        report.duplicates.threshold, report.duplicates.groups, report.duplicates.redundant_records
    );
    for group in report.duplicates.examples.iter().take(MAX_LISTED) {
        for (i, text) in group.iter().enumerate() {
            let marker = if i == 0 { "keep" } else { "drop" };
            println!("  {} {}", marker, preview(text));
        }
    }

    let c = &report.classification;
    println!("\nClassification:");
    println!("  Agreement with declared level: {:.1}%", c.agreement_rate);
    println!("  Low-confidence disagreements:  {}", c.low_confidence);
    println!("  Unclassifiable:                {}", c.unclassifiable);
    println!("  Over preferred length:         {}", report.soft_cap_overruns.len());

    if !report.recommendations.is_empty() {
        println!("\nRecommendations:");
        for r in &report.recommendations {
            println!("  * {}", r);
        }
    }
}

pub fn print_clean_changes(changes: &[CleanChange]) {
    header("CLEAN");
    if changes.is_empty() {
        println!("All jokes are already clean.");
        return;
    }
    for change in changes.iter().take(MAX_LISTED * 2) {
        match change {
            CleanChange::Rewritten {
                level,
                before,
                after,
            } => {
                println!("[{}] {}", level, preview(before));
                println!("  -> {}", preview(after));
            }
            CleanChange::RemovedEmpty { level, before } => {
                println!("[{}] removed (empty after cleaning): {:?}", level, before);
            }
            CleanChange::RemovedInvalid {
                level,
                text,
                violations,
            } => {
                let ids: Vec<&str> = violations.iter().map(|v| v.id()).collect();
                println!("[{}] removed ({}): {}", level, ids.join(", "), preview(text));
            }
        }
    }
    if changes.len() > MAX_LISTED * 2 {
        println!("... and {} more", changes.len() - MAX_LISTED * 2);
    }
}

pub fn print_duplicates(store: &JokeStore, scan: &DuplicateScan) {
    header("DUPLICATES");
    println!(
        "Compared {} pairs at threshold {:.0}: {} groups, {} redundant jokes",
        scan.comparisons,
        scan.threshold,
        scan.groups.len(),
        scan.redundant_count()
    );
    let records = store.records();
    for group in &scan.groups {
        let keeper = &records[group.keeper];
        println!("\nkeep [{}] {}", keeper.declared_level, preview(&keeper.text));
        for i in group.redundant() {
            let r = &records[i];
            println!("drop [{}] {}", r.declared_level, preview(&r.text));
        }
    }
}

pub fn print_reclassify_plan(plan: &ReclassifyPlan, rules: &CompiledRules) {
    let bands = &rules.table.reclassify;
    header("RECLASSIFY");
    println!("Jokes analysed:   {}", plan.total);
    println!("Already correct:  {} ({:.1}%)", plan.already_correct, plan.accuracy());
    println!("Unclassifiable:   {}", plan.unclassifiable);
    println!(
        "High confidence:  {} (>= {:.2})",
        plan.count_in(ConfidenceBand::High),
        bands.high_confidence
    );
    println!(
        "Medium confidence: {} (>= {:.2})",
        plan.count_in(ConfidenceBand::Medium),
        bands.low_confidence
    );
    println!("Low confidence:   {}", plan.count_in(ConfidenceBand::Low));

    if !plan.transitions.is_empty() {
        println!("\nProposed moves:");
        for (transition, count) in &plan.transitions {
            println!("  {}: {}", transition, count);
        }
    }
    for c in plan.candidates.iter().take(MAX_LISTED) {
        println!(
            "  {} -> {} ({:.2}, {:?}) {}",
            c.from,
            c.to,
            c.confidence,
            c.band,
            preview(&c.text)
        );
    }
}
