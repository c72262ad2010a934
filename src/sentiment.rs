//! Polarity types shared by every stage of the pipeline, plus the word-boundary
//! tokenizer and the classifier label mapping.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Confidence assigned when the classifier gives nothing usable for a text.
pub const DEFAULT_CONFIDENCE: f32 = 0.5;

/// One of the three polarity labels. Serialized as `"POS"` / `"NEG"` / `"NEU"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Polarity {
    #[serde(rename = "POS")]
    Positive,
    #[serde(rename = "NEG")]
    Negative,
    #[serde(rename = "NEU")]
    Neutral,
}

impl Polarity {
    pub const ALL: [Polarity; 3] = [Polarity::Positive, Polarity::Negative, Polarity::Neutral];

    pub fn as_str(self) -> &'static str {
        match self {
            Polarity::Positive => "POS",
            Polarity::Negative => "NEG",
            Polarity::Neutral => "NEU",
        }
    }

    /// POS <-> NEG; NEU stays NEU.
    pub fn inverted(self) -> Self {
        match self {
            Polarity::Positive => Polarity::Negative,
            Polarity::Negative => Polarity::Positive,
            Polarity::Neutral => Polarity::Neutral,
        }
    }

    /// Map a raw classifier label to a polarity (case-insensitive substring match).
    ///
    /// `neg*` → NEG, `neu*` → NEU, `pos*` → POS; `LABEL_0/1/2` are read as NEG/NEU/POS.
    /// Anything else is `None` and is treated as a malformed classifier response.
    pub fn from_label(raw: &str) -> Option<Self> {
        let l = raw.trim().to_lowercase();
        if l.contains("neg") {
            return Some(Polarity::Negative);
        }
        if l.contains("neu") {
            return Some(Polarity::Neutral);
        }
        if l.contains("pos") {
            return Some(Polarity::Positive);
        }
        match l.as_str() {
            "label_0" => Some(Polarity::Negative),
            "label_1" => Some(Polarity::Neutral),
            "label_2" => Some(Polarity::Positive),
            _ => None,
        }
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of the external classifier for one text, already mapped to a polarity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassifierResult {
    pub label: Polarity,
    pub confidence: f32,
}

impl ClassifierResult {
    pub fn new(label: Polarity, confidence: f32) -> Self {
        Self {
            label,
            confidence: clamp01(confidence),
        }
    }
}

/// Final (label, confidence) for one text after reinforcement.
/// Confidence is always inside `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReinforcedResult {
    pub label: Polarity,
    pub confidence: f32,
}

impl ReinforcedResult {
    pub fn new(label: Polarity, confidence: f32) -> Self {
        Self {
            label,
            confidence: clamp01(confidence),
        }
    }

    /// `(NEU, 0.5)`: used when the classifier failed for a text.
    pub fn neutral_default() -> Self {
        Self::new(Polarity::Neutral, DEFAULT_CONFIDENCE)
    }
}

impl From<ClassifierResult> for ReinforcedResult {
    fn from(c: ClassifierResult) -> Self {
        Self::new(c.label, c.confidence)
    }
}

/// Clamp to [0.0, 1.0]; NaN collapses to 0.0.
pub fn clamp01(x: f32) -> f32 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}

/// Unicode word-boundary tokenizer over lowercased input.
/// Accented letters and `ñ` stay inside their words.
pub fn tokenize(text: &str) -> Vec<String> {
    static RE_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?u)\b\w+\b").expect("tokenizer regex"));
    let lowered = text.to_lowercase();
    RE_WORD
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}
