//! Quality validator
//!
//! Checks a joke against independent structural and content rules. The result
//! is the set of violated rules; an empty set means the joke is valid. Rules
//! never depend on each other or on evaluation order.
//!
//! Exceeding the declared level's soft cap is advisory and reported on
//! [`RecordValidation`], never as a violation.

use crate::rules::CompiledRules;
use crate::store::JokeRecord;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Identifier of a violated rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Violation {
    /// Empty or whitespace-only text
    Empty,
    /// Longer than the hard cap
    TooLong,
    /// Explanation appended after the punchline
    HasTrailingExplanation,
    /// Characters outside the accepted printable set
    NonAsciiOrUnprintable,
    /// Non-empty but shorter than the minimum length
    TooShort,
    /// Contains a forbidden word
    ForbiddenWord,
}

impl Violation {
    /// Stable rule identifier
    pub fn id(&self) -> &'static str {
        match self {
            Violation::Empty => "EMPTY",
            Violation::TooLong => "TOO_LONG",
            Violation::HasTrailingExplanation => "HAS_TRAILING_EXPLANATION",
            Violation::NonAsciiOrUnprintable => "NON_ASCII_OR_UNPRINTABLE",
            Violation::TooShort => "TOO_SHORT",
            Violation::ForbiddenWord => "FORBIDDEN_WORD",
        }
    }

    /// Human-readable explanation
    pub fn describe(&self) -> &'static str {
        match self {
            Violation::Empty => "joke text is empty",
            Violation::TooLong => "joke exceeds the hard length cap",
            Violation::HasTrailingExplanation => "explanation appended after the punchline",
            Violation::NonAsciiOrUnprintable => "contains non-ASCII or unprintable characters",
            Violation::TooShort => "joke is shorter than the minimum length",
            Violation::ForbiddenWord => "contains a forbidden word",
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Validation of a filed record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordValidation {
    pub violations: BTreeSet<Violation>,
    /// Characters over the declared level's soft cap, if any
    pub soft_cap_overrun: Option<usize>,
}

impl RecordValidation {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Sentence-like segments: text up to and including a run of terminators
static SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^.!?\u{2026}]+[.!?\u{2026}]*").expect("segment pattern compiles"));

static PARENTHETICAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\(([^()]*)\)").expect("parenthetical pattern compiles"));

/// Byte ranges of sentence-like segments, skipping whitespace-only pieces
pub(crate) fn segments(text: &str) -> Vec<(usize, usize)> {
    SEGMENT
        .find_iter(text)
        .filter(|m| !m.as_str().trim().is_empty())
        .map(|m| (m.start(), m.end()))
        .collect()
}

/// Byte offset where an explanation appended after the punchline begins
///
/// The punchline is the sentence after the opening question(s) in
/// question/answer jokes, or the first sentence otherwise. Sentences after it
/// that open with an explanation marker ("get it", "you see", "talk about")
/// are explanations. Causal openers ("because") may be the punchline itself,
/// so they only count from the third sentence onward.
pub(crate) fn trailing_explanation_start(rules: &CompiledRules, text: &str) -> Option<usize> {
    let segs = segments(text);
    let questions = segs
        .iter()
        .take_while(|(s, e)| text[*s..*e].trim_end().ends_with('?'))
        .count();
    let first_trailing = questions + 1;
    let first_causal = first_trailing.max(2);

    segs.iter()
        .enumerate()
        .skip(first_trailing)
        .find(|(i, (s, e))| {
            let sentence = &text[*s..*e];
            rules.trailing_marker.is_match(sentence)
                || (*i >= first_causal && rules.causal_marker.is_match(sentence))
        })
        .map(|(_, (s, _))| *s)
}

/// Byte ranges (including leading whitespace) of explanatory parentheticals
pub(crate) fn explanatory_parentheticals(rules: &CompiledRules, text: &str) -> Vec<(usize, usize)> {
    PARENTHETICAL
        .captures_iter(text)
        .filter(|c| {
            c.get(1)
                .map_or(false, |inner| rules.parenthetical_marker.is_match(inner.as_str()))
        })
        .filter_map(|c| c.get(0).map(|m| (m.start(), m.end())))
        .collect()
}

/// Byte offset where trailing chatter (hashtags, "lol", "haha") begins
pub(crate) fn trailing_noise_start(rules: &CompiledRules, text: &str) -> Option<usize> {
    rules.trailing_noise.find(text).map(|m| m.start())
}

/// Whether `text` carries an explanation the joke does not need
pub fn has_trailing_explanation(rules: &CompiledRules, text: &str) -> bool {
    trailing_explanation_start(rules, text).is_some()
        || !explanatory_parentheticals(rules, text).is_empty()
        || trailing_noise_start(rules, text).is_some()
}

/// Validate joke text; empty set means valid
pub fn validate_text(rules: &CompiledRules, text: &str) -> BTreeSet<Violation> {
    let v = &rules.table.validator;
    let mut violations = BTreeSet::new();
    let len = text.chars().count();

    if text.trim().is_empty() {
        violations.insert(Violation::Empty);
    } else if len < v.min_length {
        violations.insert(Violation::TooShort);
    }
    if len > v.hard_cap {
        violations.insert(Violation::TooLong);
    }
    if has_trailing_explanation(rules, text) {
        violations.insert(Violation::HasTrailingExplanation);
    }
    if text.chars().any(|c| !rules.is_printable(c)) {
        violations.insert(Violation::NonAsciiOrUnprintable);
    }
    if rules.forbidden.is_match(text) {
        violations.insert(Violation::ForbiddenWord);
    }

    violations
}

/// Validate a filed record, including the soft-cap advisory for its level
pub fn validate(rules: &CompiledRules, record: &JokeRecord) -> RecordValidation {
    let cap = rules.soft_cap(record.declared_level);
    let len = record.char_len();
    RecordValidation {
        violations: validate_text(rules, &record.text),
        soft_cap_overrun: (len > cap).then(|| len - cap),
    }
}
