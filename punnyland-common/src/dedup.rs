//! Duplicate detection
//!
//! All-pairs comparison of normalized joke text using a normalized
//! Levenshtein ratio on a 0-100 scale. A duplicate group is a keeper plus
//! the records at or above the threshold with it; a dedup pass keeps only the
//! keeper.
//!
//! Keeper order: fewest validator violations, then shorter text, then
//! first-seen order. The order is total, so the keeper is stable across runs.

use crate::rules::CompiledRules;
use crate::store::{JokeRecord, JokeStore};
use crate::validator::validate_text;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Lowercase, turn everything except letters, digits and apostrophes into
/// spaces, collapse whitespace
pub fn normalize(text: &str) -> String {
    let mapped: String = text
        .chars()
        .flat_map(|c| c.to_lowercase())
        .map(|c| match c {
            '\u{2019}' => '\'',
            c if c.is_alphanumeric() || c == '\'' => c,
            _ => ' ',
        })
        .collect();
    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Similarity of two texts on a 0-100 scale
///
/// Symmetric, and `similarity(a, a) == 100`.
pub fn similarity(a: &str, b: &str) -> f64 {
    similarity_normalized(&normalize(a), &normalize(b))
}

fn similarity_normalized(a: &str, b: &str) -> f64 {
    if a == b {
        return 100.0;
    }
    strsim::normalized_levenshtein(a, b) * 100.0
}

/// A pair of records at or above the threshold
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicatePair {
    /// Index into [`JokeStore::records`]
    pub first: usize,
    pub second: usize,
    pub similarity: f64,
}

/// A keeper and the records that duplicate it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateGroup {
    /// Member indices in first-seen order
    pub members: Vec<usize>,
    /// Index of the record kept when the group collapses
    pub keeper: usize,
}

impl DuplicateGroup {
    /// Members that a dedup pass removes
    pub fn redundant(&self) -> impl Iterator<Item = usize> + '_ {
        self.members.iter().copied().filter(move |m| *m != self.keeper)
    }
}

/// Result of a duplicate scan
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct DuplicateScan {
    pub threshold: f64,
    pub comparisons: usize,
    pub pairs: Vec<DuplicatePair>,
    pub groups: Vec<DuplicateGroup>,
}

impl DuplicateScan {
    /// Number of records a dedup pass removes
    pub fn redundant_count(&self) -> usize {
        self.groups.iter().map(|g| g.members.len() - 1).sum()
    }
}

/// Sort key for keeper preference; lower wins
fn keeper_rank(rules: &CompiledRules, records: &[JokeRecord], i: usize) -> (usize, usize, usize) {
    let record = &records[i];
    (
        validate_text(rules, &record.text).len(),
        record.char_len(),
        i,
    )
}

/// Compare all pairs of records and group duplicates
///
/// Records are visited in keeper order. Each one joins the first keeper it
/// is at or above `threshold` with, or becomes a keeper itself. Every
/// redundant record therefore duplicates its own keeper, and no two keepers
/// are duplicates of each other.
pub fn find_duplicates(rules: &CompiledRules, store: &JokeStore, threshold: f64) -> DuplicateScan {
    let records = store.records();
    let normalized: Vec<String> = records.iter().map(|r| normalize(&r.text)).collect();
    let n = records.len();

    let mut linked: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut pairs = Vec::new();
    let mut comparisons = 0;

    for i in 0..n {
        for j in (i + 1)..n {
            comparisons += 1;
            let score = similarity_normalized(&normalized[i], &normalized[j]);
            if score >= threshold {
                debug!(first = i, second = j, similarity = score, "duplicate pair");
                pairs.push(DuplicatePair {
                    first: i,
                    second: j,
                    similarity: score,
                });
                linked[i].push(j);
                linked[j].push(i);
            }
        }
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by_cached_key(|i| keeper_rank(rules, records, *i));

    let mut keepers: Vec<usize> = Vec::new();
    let mut members_by_keeper: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for i in order {
        let home = keepers.iter().copied().find(|k| linked[i].contains(k));
        let keeper = match home {
            Some(k) => k,
            None => {
                keepers.push(i);
                i
            }
        };
        members_by_keeper.entry(keeper).or_default().push(i);
    }

    let mut groups: Vec<DuplicateGroup> = members_by_keeper
        .into_iter()
        .filter(|(_, members)| members.len() > 1)
        .map(|(keeper, mut members)| {
            members.sort_unstable();
            DuplicateGroup { members, keeper }
        })
        .collect();
    groups.sort_by_key(|g| g.members[0]);

    info!(
        "Compared {} pairs, found {} duplicate groups",
        comparisons,
        groups.len()
    );

    DuplicateScan {
        threshold,
        comparisons,
        pairs,
        groups,
    }
}

/// New snapshot with every non-keeper removed
pub fn deduplicate(store: &JokeStore, scan: &DuplicateScan) -> JokeStore {
    let mut drop = vec![false; store.len()];
    for group in &scan.groups {
        for i in group.redundant() {
            drop[i] = true;
        }
    }
    let kept = store
        .records()
        .iter()
        .zip(drop)
        .filter(|(_, d)| !d)
        .map(|(r, _)| r.clone())
        .collect();
    JokeStore::from_records(kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CornLevel;

    fn rules() -> &'static CompiledRules {
        CompiledRules::built_in()
    }

    fn store(texts: &[(&str, CornLevel)]) -> JokeStore {
        JokeStore::from_records(
            texts
                .iter()
                .map(|(t, l)| JokeRecord::new(*t, *l))
                .collect(),
        )
    }

    #[test]
    fn test_normalize() {
        assert_eq!(
            normalize("What do you call a fish?? Auto-tuna!"),
            "what do you call a fish auto tuna"
        );
        assert_eq!(normalize("They\u{2019}d crack  up"), "they'd crack up");
    }

    #[test]
    fn test_similarity_reflexive_and_symmetric() {
        let a = "Why did the bicycle fall over? It was two-tired!";
        let b = "Why did the bike fall down? It was too tired!";
        assert_eq!(similarity(a, a), 100.0);
        assert_eq!(similarity(a, b), similarity(b, a));
        assert!(similarity(a, b) < 100.0);
    }

    #[test]
    fn test_auto_tuna_pair_is_duplicate_group() {
        let s = store(&[
            (
                "What do you call a fish that needs help with his vocals? Auto-tuna!",
                CornLevel::GroanZone,
            ),
            (
                "what do you call a fish that needs help with his vocals?? auto tuna!",
                CornLevel::GroanZone,
            ),
            ("I used to be a banker, but I lost interest.", CornLevel::MildChuckle),
        ]);
        let scan = find_duplicates(rules(), &s, 85.0);
        assert_eq!(scan.groups.len(), 1);
        assert_eq!(scan.redundant_count(), 1);
        assert!(scan.pairs[0].similarity >= 85.0);
        assert_eq!(scan.comparisons, 3);
    }

    #[test]
    fn test_keeper_prefers_fewer_violations_then_shorter_then_first() {
        let s = store(&[
            ("Why don't eggs tell jokes? They'd crack each other up! lol", CornLevel::DadApproved),
            ("Why don't eggs tell jokes? They would crack each other up!", CornLevel::DadApproved),
            ("Why don't eggs tell jokes? They'd crack each other up!", CornLevel::DadApproved),
        ]);
        let scan = find_duplicates(rules(), &s, 85.0);
        assert_eq!(scan.groups.len(), 1);
        // index 0 has a violation; index 2 is shorter than index 1
        let group = &scan.groups[0];
        assert_eq!(group.members, vec![0, 1, 2]);
        assert_eq!(s.records()[group.keeper].text, "Why don't eggs tell jokes? They'd crack each other up!");

        let identical = store(&[
            ("Same joke here, really!", CornLevel::EyeRoll),
            ("same joke here really", CornLevel::EyeRoll),
        ]);
        // Both valid; the shorter one wins even though it was seen second
        let scan = find_duplicates(rules(), &identical, 85.0);
        let keeper = &identical.records()[scan.groups[0].keeper];
        assert_eq!(keeper.text, "same joke here really");
    }

    #[test]
    fn test_first_seen_breaks_exact_ties() {
        let s = store(&[
            ("What is a pun? A word joke!", CornLevel::DadApproved),
            ("what is a pun? a word joke!", CornLevel::DadApproved),
        ]);
        let scan = find_duplicates(rules(), &s, 85.0);
        assert_eq!(scan.groups[0].keeper, 0);
    }

    #[test]
    fn test_deduplicate_removes_redundant_only() {
        let s = store(&[
            ("What do you call a fake noodle? An impasta!", CornLevel::DadApproved),
            ("What do you call a fake noodle? An impasta!!", CornLevel::EyeRoll),
            ("Why did the scarecrow win an award? He was outstanding in his field!", CornLevel::EyeRoll),
        ]);
        let scan = find_duplicates(rules(), &s, 85.0);
        let deduped = deduplicate(&s, &scan);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped.records()[0].declared_level, CornLevel::DadApproved);

        let rescan = find_duplicates(rules(), &deduped, 85.0);
        assert!(rescan.groups.is_empty());
    }

    #[test]
    fn test_chain_keeps_record_unlike_the_keeper() {
        // b is close to both a and c, but a and c are not close to each other
        let a = "aaaaaa bbbbbb cccccc dddddd eeeeee ffffff gggggg hhhhhh iiiiii";
        let b = "zzzzzz bbbbbb cccccc dddddd eeeeee ffffff gggggg hhhhhh iiiiii";
        let c = "zzzzzz bbbbbb cccccc dddddd eeeeee ffffff gggggg hhhhhh yyyyyy";
        assert!(similarity(a, b) >= 85.0 && similarity(b, c) >= 85.0);
        assert!(similarity(a, c) < 85.0);

        let s = store(&[
            (a, CornLevel::EyeRoll),
            (b, CornLevel::EyeRoll),
            (c, CornLevel::EyeRoll),
        ]);
        let scan = find_duplicates(rules(), &s, 85.0);
        assert_eq!(scan.pairs.len(), 2);
        assert_eq!(scan.groups.len(), 1);
        assert_eq!(scan.groups[0].members, vec![0, 1]);
        assert_eq!(scan.groups[0].keeper, 0);

        let deduped = deduplicate(&s, &scan);
        let kept: Vec<&str> = deduped
            .records()
            .iter()
            .map(|r| r.text.as_str())
            .collect();
        assert_eq!(kept, vec![a, c]);
    }

    #[test]
    fn test_every_redundant_record_duplicates_its_keeper() {
        let s = store(&[
            ("Why did the math book look sad? It had too many problems.", CornLevel::DadApproved),
            ("Why did the math book look so sad? It had too many problems!", CornLevel::DadApproved),
            ("Why did the math book look so sad? It had way too many problems!", CornLevel::DadApproved),
            ("Why was the math book sad? Too many problems.", CornLevel::DadApproved),
        ]);
        let scan = find_duplicates(rules(), &s, 85.0);
        for group in &scan.groups {
            for i in group.redundant() {
                let score = similarity(&s.records()[i].text, &s.records()[group.keeper].text);
                assert!(score >= 85.0, "record {} vs keeper {}: {}", i, group.keeper, score);
            }
        }
        let deduped = deduplicate(&s, &scan);
        assert!(find_duplicates(rules(), &deduped, 85.0).groups.is_empty());
    }

    #[test]
    fn test_distinct_jokes_not_grouped() {
        let s = store(&[
            ("What do you call a sleeping bull? A bulldozer!", CornLevel::DadApproved),
            ("What do you call a fake noodle? An impasta!", CornLevel::DadApproved),
        ]);
        assert!(find_duplicates(rules(), &s, 85.0).groups.is_empty());
    }
}
