//! Data-driven rule tables
//!
//! Every pattern list, weight and threshold used by the validator, classifier,
//! cleaner, duplicate detector and reclassifier lives in a [`RuleTable`]. The
//! built-in table is the default; a TOML file can override any subset of it:
//!
//! ```toml
//! [classifier]
//! level_thresholds = [1.0, 3.0, 4.5, 6.0]
//!
//! [dedup]
//! threshold = 90.0
//! ```
//!
//! [`RuleTable::compile`] validates the table and builds the regexes once.

use crate::{Error, Result};
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Complete rule table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RuleTable {
    pub validator: ValidatorRules,
    pub classifier: ClassifierRules,
    pub dedup: DedupRules,
    pub reclassify: ReclassifyRules,
}

/// Structural and content rules for a single joke
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorRules {
    /// Hard cap on joke length in characters
    pub hard_cap: usize,
    /// Minimum length of a non-empty joke
    pub min_length: usize,
    /// Preferred length per level (1..5); exceeding it is advisory only
    pub soft_caps: [usize; 5],
    /// Non-ASCII characters accepted as printable (typographic dashes, quotes, ellipsis)
    pub allowed_extra_chars: String,
    /// Phrases that open an explanation when they start a sentence after the punchline
    pub trailing_markers: Vec<String>,
    /// Phrases like "because" that may legitimately open a punchline, so they
    /// only count as an explanation from the sentence after the punchline onward
    pub causal_markers: Vec<String>,
    /// Words that mark a parenthetical as an explanation
    pub parenthetical_markers: Vec<String>,
    /// Regex fragments for trailing chatter ("lol", "haha")
    pub noise_markers: Vec<String>,
    /// Whole words that disqualify a joke
    pub forbidden_words: Vec<String>,
}

impl Default for ValidatorRules {
    fn default() -> Self {
        Self {
            hard_cap: 180,
            min_length: 10,
            soft_caps: [100, 120, 140, 160, 180],
            allowed_extra_chars: "\u{2013}\u{2014}\u{2018}\u{2019}\u{201C}\u{201D}\u{2026}".to_string(),
            trailing_markers: strings(&[
                "get it",
                "you see",
                "that's why",
                "thats why",
                "talk about",
                "in other words",
                "meaning",
                "translation",
                "it means",
                "just kidding",
            ]),
            causal_markers: strings(&["because", "cause"]),
            parenthetical_markers: strings(&[
                "get it",
                "because",
                "translation",
                "meaning",
                "you see",
                "in other words",
            ]),
            noise_markers: strings(&["lol", "haha+", "hehe+", "rofl"]),
            forbidden_words: strings(&[
                "damn", "hell", "crap", "stupid", "idiot", "dumb", "trump", "biden", "democrat",
                "republican", "politics", "religion", "god", "jesus", "muslim", "christian",
            ]),
        }
    }
}

/// One pun-signal rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PunRule {
    pub name: String,
    /// Case-insensitive regex
    pub pattern: String,
    /// Signals contributed per match (or once, see `per_match`)
    pub weight: u32,
    /// Count every match instead of just presence
    #[serde(default)]
    pub per_match: bool,
    /// Case-insensitive regexes; if any matches the text the rule does not fire
    #[serde(default)]
    pub unless: Vec<String>,
}

/// Weight contributed once a joke reaches `min_len` characters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LengthBand {
    pub min_len: usize,
    pub weight: f64,
}

/// Classifier policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierRules {
    /// Case-insensitive regex recognising question/answer form
    pub qa_pattern: String,
    /// Score added for question/answer form
    pub qa_bonus: f64,
    /// Score per detected pun signal
    pub signal_weight: f64,
    /// Pun signals beyond this count are ignored
    pub max_signals: u32,
    /// Length bands, ascending by `min_len`; the last band reached applies
    pub length_bands: Vec<LengthBand>,
    /// Score needed for levels 2, 3, 4 and 5 (ascending)
    pub level_thresholds: [f64; 4],
    pub pun_rules: Vec<PunRule>,
}

impl Default for ClassifierRules {
    fn default() -> Self {
        Self {
            qa_pattern: r"^\W*(?:why|what|how|where|when|who|which)\b[^?]*\?+\s*\S".to_string(),
            qa_bonus: 1.0,
            signal_weight: 1.5,
            max_signals: 6,
            length_bands: vec![
                LengthBand { min_len: 0, weight: 0.0 },
                LengthBand { min_len: 60, weight: 0.5 },
                LengthBand { min_len: 100, weight: 1.0 },
                LengthBand { min_len: 140, weight: 1.5 },
            ],
            level_thresholds: [1.0, 2.5, 4.0, 5.5],
            pun_rules: vec![
                PunRule {
                    name: "hyphenated_wordplay".to_string(),
                    pattern: r"\b[a-z]+-[a-z]+\b".to_string(),
                    weight: 1,
                    per_match: true,
                    unless: Vec::new(),
                },
                PunRule {
                    name: "sound_alike".to_string(),
                    pattern: r"\b(?:impasta|gummy bear|ground beef|can't opener|cant opener|outstanding|auto-?tuna|two-tired|sofishticated|bulldozer|dadjoke|punderful|pundemonium)\b".to_string(),
                    weight: 1,
                    per_match: true,
                    unless: Vec::new(),
                },
                PunRule {
                    name: "animal_terms".to_string(),
                    pattern: r"\b(?:moo|paws|purr|purrfect|udderly|dairy|beef|hoof|quack|oink|baa|hiss|tail)\b".to_string(),
                    weight: 1,
                    per_match: true,
                    unless: Vec::new(),
                },
                PunRule {
                    name: "animal_fur".to_string(),
                    pattern: r"\bfur(?:ry|s)?\b".to_string(),
                    weight: 1,
                    per_match: false,
                    // hair jokes use "fur" figuratively
                    unless: strings(&[r"facial hair", r"\bbeard", r"\bmoustache", r"\bmustache"]),
                },
                PunRule {
                    name: "wordplay_phrases".to_string(),
                    pattern: r"grew on me|lost interest|time flies|crack (?:each other |them |you )?up|turned (?:myself )?around|make up everything|put down|outstanding in (?:his|her|their) field|hokey pokey".to_string(),
                    weight: 1,
                    per_match: true,
                    unless: Vec::new(),
                },
            ],
        }
    }
}

/// Duplicate detection policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupRules {
    /// Similarity (0-100) at or above which two jokes are duplicates
    pub threshold: f64,
}

impl Default for DedupRules {
    fn default() -> Self {
        Self { threshold: 85.0 }
    }
}

/// Reclassification confidence bands
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReclassifyRules {
    /// Confidence at or above which a move counts as high confidence
    pub high_confidence: f64,
    /// Confidence below which a prediction is reported as low confidence
    pub low_confidence: f64,
}

impl Default for ReclassifyRules {
    fn default() -> Self {
        Self {
            high_confidence: 0.6,
            low_confidence: 0.4,
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl RuleTable {
    /// Load a (possibly partial) rule table from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let table: RuleTable = toml::from_str(content)?;
        table.check()?;
        Ok(table)
    }

    /// Check the invariants the classifier's monotonicity depends on
    pub fn check(&self) -> Result<()> {
        let v = &self.validator;
        if v.hard_cap == 0 {
            return Err(Error::Config("validator.hard_cap must be positive".to_string()));
        }
        if v.min_length > v.hard_cap {
            return Err(Error::Config(
                "validator.min_length must not exceed hard_cap".to_string(),
            ));
        }

        let c = &self.classifier;
        if c.qa_bonus < 0.0 || c.signal_weight < 0.0 {
            return Err(Error::Config(
                "classifier weights must be non-negative".to_string(),
            ));
        }
        if c.level_thresholds.windows(2).any(|w| w[0] >= w[1]) {
            return Err(Error::Config(
                "classifier.level_thresholds must be strictly ascending".to_string(),
            ));
        }
        for pair in c.length_bands.windows(2) {
            if pair[0].min_len >= pair[1].min_len || pair[0].weight > pair[1].weight {
                return Err(Error::Config(
                    "classifier.length_bands must ascend in min_len with non-decreasing weight"
                        .to_string(),
                ));
            }
        }
        if c.length_bands.iter().any(|b| b.weight < 0.0) {
            return Err(Error::Config(
                "classifier.length_bands weights must be non-negative".to_string(),
            ));
        }

        if !(0.0..=100.0).contains(&self.dedup.threshold) {
            return Err(Error::Config(
                "dedup.threshold must be within 0-100".to_string(),
            ));
        }
        let r = &self.reclassify;
        if !(0.0..=1.0).contains(&r.high_confidence) || !(0.0..=1.0).contains(&r.low_confidence) {
            return Err(Error::Config(
                "reclassify confidence bands must be within 0-1".to_string(),
            ));
        }
        Ok(())
    }

    /// Validate and compile all patterns
    pub fn compile(self) -> Result<CompiledRules> {
        self.check()?;

        let trailing_marker = marker_regex(r"^\W*", &self.validator.trailing_markers, r"\b")?;
        let causal_marker = marker_regex(r"^\W*", &self.validator.causal_markers, r"\b")?;
        let parenthetical_marker =
            marker_regex(r"\b", &self.validator.parenthetical_markers, r"\b")?;
        let noise_fragments = self.validator.noise_markers.join("|");
        let trailing_noise = build_regex(&format!(
            r"(?:\s*(?:#\w+|\b(?:{})\b)[.!?]*)+\s*$",
            if noise_fragments.is_empty() { r"[^\s\S]" } else { noise_fragments.as_str() }
        ))?;
        let forbidden = marker_regex(r"\b", &self.validator.forbidden_words, r"\b")?;
        let qa = build_regex(&self.classifier.qa_pattern)?;

        let mut puns = Vec::with_capacity(self.classifier.pun_rules.len());
        for rule in &self.classifier.pun_rules {
            let unless = rule
                .unless
                .iter()
                .map(|p| build_regex(p))
                .collect::<Result<Vec<_>>>()?;
            puns.push(CompiledPunRule {
                name: rule.name.clone(),
                pattern: build_regex(&rule.pattern)?,
                weight: rule.weight,
                per_match: rule.per_match,
                unless,
            });
        }

        debug!("Compiled rule table with {} pun rules", puns.len());

        Ok(CompiledRules {
            table: self,
            trailing_marker,
            causal_marker,
            parenthetical_marker,
            trailing_noise,
            forbidden,
            qa,
            puns,
        })
    }
}

fn build_regex(pattern: &str) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| Error::Pattern {
            pattern: pattern.to_string(),
            source,
        })
}

/// `prefix(?:m1|m2|...)suffix` over escaped plain phrases
fn marker_regex(prefix: &str, markers: &[String], suffix: &str) -> Result<Regex> {
    if markers.is_empty() {
        // never matches
        return build_regex(r"[^\s\S]");
    }
    let alternatives: Vec<String> = markers
        .iter()
        .map(|m| regex::escape(m))
        .collect();
    build_regex(&format!("{}(?:{}){}", prefix, alternatives.join("|"), suffix))
}

/// Pun rule with compiled patterns
#[derive(Debug, Clone)]
pub struct CompiledPunRule {
    pub name: String,
    pub pattern: Regex,
    pub weight: u32,
    pub per_match: bool,
    pub unless: Vec<Regex>,
}

impl CompiledPunRule {
    /// Signals this rule contributes for `text`
    pub fn signals(&self, text: &str) -> u32 {
        if self.unless.iter().any(|u| u.is_match(text)) {
            return 0;
        }
        if self.per_match {
            let hits = self.pattern.find_iter(text).count() as u32;
            hits.saturating_mul(self.weight)
        } else if self.pattern.is_match(text) {
            self.weight
        } else {
            0
        }
    }
}

/// Validated rule table with its regexes built
#[derive(Debug, Clone)]
pub struct CompiledRules {
    pub table: RuleTable,
    pub(crate) trailing_marker: Regex,
    pub(crate) causal_marker: Regex,
    pub(crate) parenthetical_marker: Regex,
    pub(crate) trailing_noise: Regex,
    pub(crate) forbidden: Regex,
    pub(crate) qa: Regex,
    pub(crate) puns: Vec<CompiledPunRule>,
}

static BUILT_IN: Lazy<CompiledRules> = Lazy::new(|| {
    RuleTable::default()
        .compile()
        .expect("built-in rule table compiles")
});

impl CompiledRules {
    /// The built-in rule table, compiled once
    pub fn built_in() -> &'static CompiledRules {
        &BUILT_IN
    }

    pub fn pun_rules(&self) -> &[CompiledPunRule] {
        &self.puns
    }

    /// Soft cap for a level
    pub fn soft_cap(&self, level: crate::CornLevel) -> usize {
        self.table.validator.soft_caps[level.index()]
    }

    /// Whether `c` is in the accepted printable set
    pub fn is_printable(&self, c: char) -> bool {
        (' '..='~').contains(&c) || self.table.validator.allowed_extra_chars.contains(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_compiles() {
        let compiled = RuleTable::default().compile().unwrap();
        assert_eq!(compiled.pun_rules().len(), 5);
        assert_eq!(compiled.soft_cap(crate::CornLevel::EyeRoll), 140);
    }

    #[test]
    fn test_partial_toml_overrides_only_named_fields() {
        let table = RuleTable::from_toml_str(
            r#"
            [dedup]
            threshold = 92.5

            [classifier]
            qa_bonus = 2.0
            "#,
        )
        .unwrap();
        assert_eq!(table.dedup.threshold, 92.5);
        assert_eq!(table.classifier.qa_bonus, 2.0);
        assert_eq!(table.validator.hard_cap, 180);
        assert_eq!(table.classifier.level_thresholds, [1.0, 2.5, 4.0, 5.5]);
    }

    #[test]
    fn test_negative_weight_rejected() {
        let err = RuleTable::from_toml_str("[classifier]\nsignal_weight = -1.0\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_descending_thresholds_rejected() {
        let err = RuleTable::from_toml_str("[classifier]\nlevel_thresholds = [3.0, 2.0, 4.0, 5.0]\n")
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_bad_pattern_reported() {
        let mut table = RuleTable::default();
        table.classifier.qa_pattern = "(unclosed".to_string();
        assert!(matches!(table.compile(), Err(Error::Pattern { .. })));
    }

    #[test]
    fn test_fur_rule_skips_hair_context() {
        let rules = CompiledRules::built_in();
        let fur = rules
            .pun_rules()
            .iter()
            .find(|r| r.name == "animal_fur")
            .unwrap();
        assert_eq!(fur.signals("My cat has the softest fur."), 1);
        assert_eq!(fur.signals("My beard is so soft it's practically fur."), 0);
        assert_eq!(fur.signals("Let's discuss this further."), 0);
    }

    #[test]
    fn test_printable_set() {
        let rules = CompiledRules::built_in();
        assert!(rules.is_printable('a'));
        assert!(rules.is_printable('\u{2019}'));
        assert!(!rules.is_printable('\t'));
        assert!(!rules.is_printable('é'));
    }
}
