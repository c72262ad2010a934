//! Reinforcement rules: adjust the classifier's raw output with lexical evidence.
//!
//! Rules are pure functions evaluated in a fixed order; the first one that
//! returns a decision wins and the rest are skipped:
//!
//! 1. `insult_override`      – any insult token → `(NEG, 1.0)`
//! 2. `lexical_dominance`    – strictly more positive (negative) hits → POS (NEG), boosted confidence
//! 3. `sarcasm`              – cue word + `!`/`¿` + unsure classifier → inverted label
//! 4. `short_text_negative`  – ≤ 7 tokens with any negative hit → `(NEG, 1.0)`
//! 5. fallback               – classifier output unchanged
//!
//! Every returned confidence is clamped to `[0, 1]`.

use serde::Serialize;

use crate::analyze::insult::InsultDetector;
use crate::analyze::scoring::{LexicalScore, LexicalScorer};
use crate::lexicon::Lexicon;
use crate::sentiment::{tokenize, ClassifierResult, Polarity, ReinforcedResult};

/// Below this classifier confidence the lexical boost is the large one.
///
/// The bound is strict: a confidence of exactly 0.6 takes the small boost
/// (0.6 -> 0.75), 0.59 takes the large one (0.59 -> 0.89).
pub const LOW_CONFIDENCE_THRESHOLD: f32 = 0.6;
pub const LOW_CONFIDENCE_BOOST: f32 = 0.3;
pub const HIGH_CONFIDENCE_BOOST: f32 = 0.15;
/// Sarcasm only overrides a classifier that is less sure than this.
pub const SARCASM_MAX_CONFIDENCE: f32 = 0.8;
pub const SARCASM_BOOST: f32 = 0.2;
pub const SHORT_TEXT_MAX_TOKENS: usize = 7;

/// Which rule produced the final result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    InsultOverride,
    LexicalDominance,
    Sarcasm,
    ShortTextNegative,
    Fallback,
}

impl RuleKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RuleKind::InsultOverride => "insult_override",
            RuleKind::LexicalDominance => "lexical_dominance",
            RuleKind::Sarcasm => "sarcasm",
            RuleKind::ShortTextNegative => "short_text_negative",
            RuleKind::Fallback => "fallback",
        }
    }
}

/// Everything a rule may look at, computed once per text.
#[derive(Debug)]
pub struct RuleInput<'a> {
    pub raw: &'a str,
    pub lowered: String,
    pub tokens: Vec<String>,
    pub score: LexicalScore,
    pub classifier: ClassifierResult,
    lexicon: &'a Lexicon,
}

impl<'a> RuleInput<'a> {
    pub fn new(lexicon: &'a Lexicon, raw: &'a str, classifier: ClassifierResult) -> Self {
        let lowered = raw.to_lowercase();
        let tokens = tokenize(&lowered);
        let score = LexicalScorer::new(lexicon).score_tokens(&lowered, &tokens);
        Self {
            raw,
            lowered,
            tokens,
            score,
            classifier,
            lexicon,
        }
    }
}

pub type RuleFn = fn(&RuleInput<'_>) -> Option<ReinforcedResult>;

/// Fixed evaluation order.
pub const RULES: [(RuleKind, RuleFn); 4] = [
    (RuleKind::InsultOverride, insult_override),
    (RuleKind::LexicalDominance, lexical_dominance),
    (RuleKind::Sarcasm, sarcasm),
    (RuleKind::ShortTextNegative, short_text_negative),
];

/// Result of reinforcement along with the rule that decided it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Reinforcement {
    pub result: ReinforcedResult,
    pub rule: RuleKind,
    #[serde(skip)]
    pub score: LexicalScore,
}

#[derive(Debug, Clone, Copy)]
pub struct SentimentReinforcer<'a> {
    lexicon: &'a Lexicon,
}

impl<'a> SentimentReinforcer<'a> {
    pub fn new(lexicon: &'a Lexicon) -> Self {
        Self { lexicon }
    }

    /// `(text, classifier label, classifier confidence)` → final `(label, confidence)`.
    pub fn reinforce(&self, text: &str, label: Polarity, confidence: f32) -> ReinforcedResult {
        self.reinforce_detailed(text, ClassifierResult::new(label, confidence))
            .result
    }

    pub fn reinforce_detailed(&self, text: &str, classifier: ClassifierResult) -> Reinforcement {
        let input = RuleInput::new(self.lexicon, text, classifier);
        apply_rules(&input)
    }
}

/// Walk `RULES` in order; first decision wins.
pub fn apply_rules(input: &RuleInput<'_>) -> Reinforcement {
    for (kind, rule) in RULES.iter() {
        if let Some(result) = rule(input) {
            return Reinforcement {
                result: ReinforcedResult::new(result.label, result.confidence),
                rule: *kind,
                score: input.score,
            };
        }
    }
    Reinforcement {
        result: input.classifier.into(),
        rule: RuleKind::Fallback,
        score: input.score,
    }
}

// --- rules ---

pub fn insult_override(input: &RuleInput<'_>) -> Option<ReinforcedResult> {
    InsultDetector::new(input.lexicon)
        .contains_insult(&input.lowered)
        .then(|| ReinforcedResult::new(Polarity::Negative, 1.0))
}

pub fn lexical_dominance(input: &RuleInput<'_>) -> Option<ReinforcedResult> {
    let LexicalScore {
        pos_count,
        neg_count,
        ..
    } = input.score;

    let label = if pos_count > neg_count && pos_count > 0 {
        Polarity::Positive
    } else if neg_count > pos_count && neg_count > 0 {
        Polarity::Negative
    } else {
        return None;
    };

    let c = input.classifier.confidence;
    let boost = if c < LOW_CONFIDENCE_THRESHOLD {
        LOW_CONFIDENCE_BOOST
    } else {
        HIGH_CONFIDENCE_BOOST
    };
    Some(ReinforcedResult::new(label, (c + boost).min(1.0)))
}

pub fn sarcasm(input: &RuleInput<'_>) -> Option<ReinforcedResult> {
    let c = input.classifier.confidence;
    if c >= SARCASM_MAX_CONFIDENCE {
        return None;
    }
    if !(input.raw.contains('!') || input.raw.contains('¿')) {
        return None;
    }
    let cues = input.lexicon.sarcasm_cues();
    let has_cue = input.tokens.iter().any(|t| cues.contains_word(t))
        || cues.phrases().iter().any(|p| input.lowered.contains(p.as_str()));
    if !has_cue {
        return None;
    }
    Some(ReinforcedResult::new(
        input.classifier.label.inverted(),
        (c + SARCASM_BOOST).min(1.0),
    ))
}

pub fn short_text_negative(input: &RuleInput<'_>) -> Option<ReinforcedResult> {
    (input.score.tokens <= SHORT_TEXT_MAX_TOKENS && input.score.neg_count > 0)
        .then(|| ReinforcedResult::new(Polarity::Negative, 1.0))
}
