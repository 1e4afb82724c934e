//! Corniness classifier
//!
//! Heuristic, rule-table driven prediction of a joke's corniness level.
//!
//! # Scoring
//! - Structural form: question/answer jokes add `qa_bonus`
//! - Pun signals: sum of pun rule hits, capped at `max_signals`, times `signal_weight`
//! - Length band: weight of the highest band the joke reaches
//!
//! The score maps onto levels 1-5 through four ascending thresholds. All
//! weights are non-negative and band weights never decrease with length, so
//! detecting one more pun signal can never lower the predicted level.
//!
//! # Confidence
//! Three independent votes (form, pun density, length band) each suggest a
//! level. A vote equal to the prediction counts 1, an adjacent vote 0.5; the
//! confidence is the average, rounded to three decimals.

use crate::rules::CompiledRules;
use crate::CornLevel;
use serde::Serialize;
use tracing::trace;

/// Structural form of a joke
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JokeForm {
    /// "Why/What ... ? ... !"
    QuestionAnswer,
    /// Single statement (one or more sentences, no opening question)
    Statement,
}

/// Hits of one pun rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignalHit {
    pub rule: String,
    pub signals: u32,
}

/// Classifier output for one text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// `None` when the text is empty (unclassifiable)
    pub level: Option<CornLevel>,
    /// 0.0 to 1.0
    pub confidence: f64,
    pub form: JokeForm,
    /// Pun signals after the cap
    pub signals: u32,
    pub hits: Vec<SignalHit>,
    pub score: f64,
}

impl Prediction {
    pub fn is_unclassifiable(&self) -> bool {
        self.level.is_none()
    }

    fn unclassifiable() -> Self {
        Self {
            level: None,
            confidence: 0.0,
            form: JokeForm::Statement,
            signals: 0,
            hits: Vec::new(),
            score: 0.0,
        }
    }
}

/// Detect question/answer vs statement form
pub fn detect_form(rules: &CompiledRules, text: &str) -> JokeForm {
    if rules.qa.is_match(text) {
        JokeForm::QuestionAnswer
    } else {
        JokeForm::Statement
    }
}

/// Count pun signals per rule (before the cap)
pub fn pun_hits(rules: &CompiledRules, text: &str) -> Vec<SignalHit> {
    rules
        .pun_rules()
        .iter()
        .filter_map(|rule| {
            let signals = rule.signals(text);
            (signals > 0).then(|| SignalHit {
                rule: rule.name.clone(),
                signals,
            })
        })
        .collect()
}

/// Total pun signals, capped at `max_signals`
pub fn count_signals(rules: &CompiledRules, text: &str) -> u32 {
    let total: u32 = pun_hits(rules, text).iter().map(|h| h.signals).sum();
    total.min(rules.table.classifier.max_signals)
}

/// Weight of the highest length band `len` reaches
fn length_weight(rules: &CompiledRules, len: usize) -> f64 {
    rules
        .table
        .classifier
        .length_bands
        .iter()
        .filter(|b| len >= b.min_len)
        .last()
        .map_or(0.0, |b| b.weight)
}

/// Level for a score: 1 plus the number of thresholds reached
fn level_for_score(rules: &CompiledRules, score: f64) -> CornLevel {
    let reached = rules
        .table
        .classifier
        .level_thresholds
        .iter()
        .filter(|t| score >= **t)
        .count();
    CornLevel::MildChuckle.offset(reached as i32)
}

fn density_vote(signals: u32) -> CornLevel {
    match signals {
        0 => CornLevel::MildChuckle,
        1 => CornLevel::DadApproved,
        2 => CornLevel::EyeRoll,
        3 | 4 => CornLevel::GroanZone,
        _ => CornLevel::UltraCorn,
    }
}

fn form_vote(form: JokeForm) -> CornLevel {
    match form {
        JokeForm::QuestionAnswer => CornLevel::DadApproved,
        JokeForm::Statement => CornLevel::MildChuckle,
    }
}

/// Smallest level whose soft cap fits `len`
fn length_vote(rules: &CompiledRules, len: usize) -> CornLevel {
    CornLevel::all()
        .iter()
        .copied()
        .find(|l| len <= rules.soft_cap(*l))
        .unwrap_or(CornLevel::UltraCorn)
}

fn agreement(predicted: CornLevel, vote: CornLevel) -> f64 {
    match (i32::from(predicted.value()) - i32::from(vote.value())).abs() {
        0 => 1.0,
        1 => 0.5,
        _ => 0.0,
    }
}

/// Predict the corniness level of `text`
pub fn classify(rules: &CompiledRules, text: &str) -> Prediction {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Prediction::unclassifiable();
    }

    let c = &rules.table.classifier;
    let form = detect_form(rules, trimmed);
    let hits = pun_hits(rules, trimmed);
    let signals = hits
        .iter()
        .map(|h| h.signals)
        .sum::<u32>()
        .min(c.max_signals);
    let len = trimmed.chars().count();

    let form_score = match form {
        JokeForm::QuestionAnswer => c.qa_bonus,
        JokeForm::Statement => 0.0,
    };
    let score = form_score + f64::from(signals) * c.signal_weight + length_weight(rules, len);
    let level = level_for_score(rules, score);

    let votes = [
        form_vote(form),
        density_vote(signals),
        length_vote(rules, len),
    ];
    let agreed: f64 = votes.iter().map(|v| agreement(level, *v)).sum();
    let confidence = (agreed / votes.len() as f64 * 1000.0).round() / 1000.0;

    trace!(
        level = level.value(),
        score,
        signals,
        confidence,
        "classified joke"
    );

    Prediction {
        level: Some(level),
        confidence,
        form,
        signals,
        hits,
        score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> &'static CompiledRules {
        CompiledRules::built_in()
    }

    #[test]
    fn test_chicken_is_low_corn() {
        let p = classify(
            rules(),
            "Why did the chicken cross the road? To get to the other side!",
        );
        assert_eq!(p.form, JokeForm::QuestionAnswer);
        assert_eq!(p.signals, 0);
        let level = p.level.unwrap();
        assert!(
            level <= CornLevel::DadApproved,
            "expected level 1 or 2, got {}",
            level
        );
    }

    #[test]
    fn test_statement_form() {
        let p = classify(rules(), "I used to be a banker, but I lost interest.");
        assert_eq!(p.form, JokeForm::Statement);
        assert_eq!(p.signals, 1);
    }

    #[test]
    fn test_facial_hair_does_not_count_fur() {
        let p = classify(
            rules(),
            "I used to hate facial hair, but then it grew on me, because it's fun.",
        );
        assert!(p.hits.iter().all(|h| !h.rule.contains("fur")));
        assert!(p.hits.iter().any(|h| h.rule == "wordplay_phrases"));
    }

    #[test]
    fn test_empty_text_unclassifiable() {
        for text in ["", "   "] {
            let p = classify(rules(), text);
            assert!(p.is_unclassifiable());
            assert_eq!(p.confidence, 0.0);
        }
    }

    #[test]
    fn test_deterministic() {
        let text = "What do you call a fish that needs help with his vocals? Auto-tuna!";
        let a = classify(rules(), text);
        let b = classify(rules(), text);
        assert_eq!(a, b);
    }

    #[test]
    fn test_confidence_in_range() {
        let texts = [
            "Why did the chicken cross the road? To get to the other side!",
            "Time flies like an arrow. Fruit flies like a banana.",
            "What do you call a cow with no legs? Ground beef! Udderly moo-ving, paws for thought.",
        ];
        for text in texts {
            let p = classify(rules(), text);
            assert!((0.0..=1.0).contains(&p.confidence), "{}: {}", text, p.confidence);
        }
    }

    #[test]
    fn test_more_puns_never_lower_level() {
        let base = "What do you call a cow on a trampoline?";
        let additions = [
            " A milk shake!",
            " Udderly ridiculous!",
            " Moo-ving up in the world!",
            " Dairy-devil with great paws!",
            " Beef-ore you ask, it's a hoof-hearted pun!",
        ];
        let mut text = base.to_string();
        let mut previous = classify(rules(), &text);
        for addition in additions {
            text.push_str(addition);
            let next = classify(rules(), &text);
            assert!(next.signals >= previous.signals);
            assert!(
                next.level >= previous.level,
                "level dropped after adding '{}': {:?} -> {:?}",
                addition,
                previous.level,
                next.level
            );
            previous = next;
        }
    }

    #[test]
    fn test_heavy_puns_reach_top_levels() {
        let p = classify(
            rules(),
            "What do you call a cow-boy dairy farmer with purrfect paws? Udderly moo-tastic, a real hoof-hearted beef-cake!",
        );
        assert!(p.level.unwrap() >= CornLevel::GroanZone);
    }

    #[test]
    fn test_signal_cap() {
        let text = "moo moo moo moo moo moo moo moo moo moo moo moo";
        assert_eq!(count_signals(rules(), text), 6);
    }
}
