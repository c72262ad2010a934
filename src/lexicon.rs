//! # Lexicon
//!
//! Curated Spanish word lists used by the rule-based stages:
//! positive / negative terms (single words and multi-word phrases), insults and
//! obfuscated-insult regexes, negators, sarcasm cues and word-cloud stopwords.
//!
//! - Loaded once at startup from JSON (`config/lexicon.json` is compiled in as the seed).
//! - A missing or empty resource degrades to an empty set and logs a warning;
//!   the rest of the lexicon still loads.
//! - Read-only after construction, so one `Arc<Lexicon>` is shared by every request.

use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::analyze::obfuscation::denoise;

pub const ENV_LEXICON_PATH: &str = "SENTIVOTE_LEXICON_PATH";

static BUILTIN_LEXICON: &str = include_str!("../config/lexicon.json");

/// Raw JSON shape. `None` means the key was absent.
#[derive(Debug, Default, Deserialize)]
struct LexiconFile {
    positive: Option<Vec<String>>,
    negative: Option<Vec<String>>,
    insults: Option<Vec<String>>,
    insult_patterns: Option<Vec<String>>,
    negators: Option<Vec<String>>,
    sarcasm_cues: Option<Vec<String>>,
    stopwords: Option<Vec<String>>,
}

/// Words and phrases of one polarity. Entries containing whitespace are phrases.
#[derive(Debug, Clone, Default)]
pub struct TermSet {
    words: HashSet<String>,
    phrases: Vec<String>,
}

impl TermSet {
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut words = HashSet::new();
        let mut phrases = Vec::new();
        for e in entries {
            let norm = collapse_ws(&e.as_ref().to_lowercase());
            if norm.is_empty() {
                continue;
            }
            if norm.contains(' ') {
                if !phrases.contains(&norm) {
                    phrases.push(norm);
                }
            } else {
                words.insert(norm);
            }
        }
        Self { words, phrases }
    }

    pub fn contains_word(&self, token: &str) -> bool {
        self.words.contains(token)
    }

    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty() && self.phrases.is_empty()
    }

    pub fn len(&self) -> usize {
        self.words.len() + self.phrases.len()
    }
}

#[derive(Debug, Default)]
pub struct Lexicon {
    positive: TermSet,
    negative: TermSet,
    /// Stored in denoised form so they compare directly with denoised tokens.
    insults: Vec<String>,
    insult_patterns: Vec<Regex>,
    negators: HashSet<String>,
    sarcasm_cues: TermSet,
    stopwords: HashSet<String>,
}

impl Lexicon {
    /// The lexicon compiled into the binary.
    pub fn builtin() -> Self {
        Self::from_json_str(BUILTIN_LEXICON).unwrap_or_else(|e| {
            warn!(error = %e, "built-in lexicon is invalid; using empty lexicon");
            Self::default()
        })
    }

    /// Parse a lexicon JSON document. Missing keys degrade to empty sets.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let raw: LexiconFile = serde_json::from_str(s).context("parsing lexicon json")?;
        Ok(Self::from_file_parts(raw))
    }

    /// Load from a JSON file. An unreadable or invalid file yields an empty lexicon
    /// (with a warning) rather than an error.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        let loaded = fs::read_to_string(path)
            .with_context(|| format!("reading lexicon from {}", path.display()))
            .and_then(|s| Self::from_json_str(&s));
        match loaded {
            Ok(lx) => {
                info!(path = %path.display(), "lexicon loaded");
                lx
            }
            Err(e) => {
                warn!(error = ?e, "lexicon unavailable; every resource degrades to empty");
                Self::default()
            }
        }
    }

    /// `$SENTIVOTE_LEXICON_PATH` (or an explicit path) if set, else the built-in seed.
    pub fn load_default(path: Option<&Path>) -> Self {
        if let Some(p) = path {
            return Self::load_from_file(p);
        }
        match std::env::var(ENV_LEXICON_PATH) {
            Ok(p) if !p.trim().is_empty() => Self::load_from_file(p),
            _ => Self::builtin(),
        }
    }

    fn from_file_parts(raw: LexiconFile) -> Self {
        let positive = TermSet::from_entries(resource("positive", raw.positive));
        let negative = TermSet::from_entries(resource("negative", raw.negative));

        let mut insults: Vec<String> = resource("insults", raw.insults)
            .iter()
            .map(|w| denoise(&w.trim().to_lowercase()))
            .filter(|w| !w.is_empty())
            .collect();
        insults.sort();
        insults.dedup();

        let insult_patterns = resource("insult_patterns", raw.insult_patterns)
            .iter()
            .filter_map(|p| match Regex::new(&format!("(?i){p}")) {
                Ok(re) => Some(re),
                Err(e) => {
                    warn!(pattern = %p, error = %e, "skipping invalid insult pattern");
                    None
                }
            })
            .collect();

        let negators = word_set(resource("negators", raw.negators));
        let sarcasm_cues = TermSet::from_entries(resource("sarcasm_cues", raw.sarcasm_cues));
        let stopwords = word_set(resource("stopwords", raw.stopwords));

        Self {
            positive,
            negative,
            insults,
            insult_patterns,
            negators,
            sarcasm_cues,
            stopwords,
        }
    }

    pub fn positive(&self) -> &TermSet {
        &self.positive
    }

    pub fn negative(&self) -> &TermSet {
        &self.negative
    }

    pub fn insults(&self) -> &[String] {
        &self.insults
    }

    pub fn insult_patterns(&self) -> &[Regex] {
        &self.insult_patterns
    }

    pub fn is_negator(&self, token: &str) -> bool {
        self.negators.contains(token)
    }

    pub fn sarcasm_cues(&self) -> &TermSet {
        &self.sarcasm_cues
    }

    pub fn is_stopword(&self, token: &str) -> bool {
        self.stopwords.contains(token)
    }
}

/// Unwrap a resource list, warning when it is missing or empty.
fn resource(name: &'static str, list: Option<Vec<String>>) -> Vec<String> {
    match list {
        Some(v) if v.iter().any(|s| !s.trim().is_empty()) => v,
        Some(_) => {
            warn!(resource = name, "lexicon resource is empty");
            Vec::new()
        }
        None => {
            warn!(resource = name, "lexicon resource missing; using empty set");
            Vec::new()
        }
    }
}

fn word_set(items: Vec<String>) -> HashSet<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
