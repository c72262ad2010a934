//! Word-cloud term extraction.
//!
//! Texts assigned to a polarity bucket are filtered so the bucket only shows
//! vocabulary that does not belong to the *other* polarity:
//! - insult tokens are always dropped;
//! - for POS, tokens whose raw form or Spanish stem is in the negative lexicon are dropped;
//! - for NEG, the same against the positive lexicon;
//! - for NEU, against both.
//!
//! Output keeps one entry per input text (possibly empty) so indices line up
//! with the source metadata.

use rust_stemmers::{Algorithm, Stemmer};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::analyze::insult::InsultDetector;
use crate::lexicon::{Lexicon, TermSet};
use crate::sentiment::Polarity;

const MIN_TERM_CHARS: usize = 3;

/// Raw lexicon words and their stems, computed once.
#[derive(Debug, Default)]
struct StemmedSet {
    raw: HashSet<String>,
    stems: HashSet<String>,
}

impl StemmedSet {
    fn build(set: &TermSet, stemmer: &Stemmer) -> Self {
        let raw: HashSet<String> = set.words().map(str::to_string).collect();
        let stems = raw.iter().map(|w| stemmer.stem(w).into_owned()).collect();
        Self { raw, stems }
    }

    fn matches(&self, token: &str, stem: &str) -> bool {
        self.raw.contains(token) || self.stems.contains(stem)
    }
}

/// One term of a bucket with its frequency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TermCount {
    pub term: String,
    pub count: usize,
}

/// Cleaned text and top terms of one bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketTerms {
    pub text: String,
    pub terms: Vec<TermCount>,
}

/// Everything the external word-cloud renderer needs for one batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WordCloudData {
    pub general: String,
    pub buckets: HashMap<Polarity, Option<BucketTerms>>,
}

pub struct TermExtractor {
    lexicon: Arc<Lexicon>,
    stemmer: Stemmer,
    positive: StemmedSet,
    negative: StemmedSet,
}

impl fmt::Debug for TermExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TermExtractor")
            .field("positive_stems", &self.positive.stems.len())
            .field("negative_stems", &self.negative.stems.len())
            .finish()
    }
}

impl TermExtractor {
    pub fn new(lexicon: Arc<Lexicon>) -> Self {
        let stemmer = Stemmer::create(Algorithm::Spanish);
        let positive = StemmedSet::build(lexicon.positive(), &stemmer);
        let negative = StemmedSet::build(lexicon.negative(), &stemmer);
        Self {
            lexicon,
            stemmer,
            positive,
            negative,
        }
    }

    /// Filter every text for `target`; same length and order as `texts`.
    pub fn bucket_for_wordcloud<S: AsRef<str>>(&self, texts: &[S], target: Polarity) -> Vec<String> {
        texts
            .iter()
            .map(|t| self.clean_for_bucket(t.as_ref(), target))
            .collect()
    }

    fn clean_for_bucket(&self, text: &str, target: Polarity) -> String {
        let insults = InsultDetector::new(&self.lexicon);
        let excluded: Vec<&StemmedSet> = match target {
            Polarity::Positive => vec![&self.negative],
            Polarity::Negative => vec![&self.positive],
            Polarity::Neutral => vec![&self.positive, &self.negative],
        };

        text.to_lowercase()
            .split_whitespace()
            .filter(|tok| !insults.is_insult(tok))
            .filter(|tok| {
                let stem = self.stemmer.stem(tok);
                !excluded.iter().any(|set| set.matches(tok, &stem))
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Top `top_n` terms of `text`: stopwords and tokens shorter than three chars
    /// are ignored; ordered by count (desc) then term.
    pub fn term_frequencies(&self, text: &str, top_n: usize) -> Vec<TermCount> {
        let mut freq: HashMap<&str, usize> = HashMap::new();
        for tok in text.split_whitespace() {
            if tok.chars().count() < MIN_TERM_CHARS || self.lexicon.is_stopword(tok) {
                continue;
            }
            *freq.entry(tok).or_insert(0) += 1;
        }
        let mut out: Vec<TermCount> = freq
            .into_iter()
            .map(|(term, count)| TermCount {
                term: term.to_string(),
                count,
            })
            .collect();
        out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.term.cmp(&b.term)));
        out.truncate(top_n);
        out
    }

    /// Build all three buckets plus the general corpus string.
    ///
    /// `assigned` holds already-cleaned texts with the bucket they belong to.
    pub fn build_wordcloud(&self, assigned: &[(Polarity, String)], top_n: usize) -> WordCloudData {
        let general = join_non_empty(assigned.iter().map(|(_, t)| t.as_str()));

        let mut buckets = HashMap::with_capacity(3);
        for target in Polarity::ALL {
            let texts: Vec<&str> = assigned
                .iter()
                .filter(|(p, _)| *p == target)
                .map(|(_, t)| t.as_str())
                .collect();
            let cleaned = self.bucket_for_wordcloud(&texts, target);
            let text = join_non_empty(cleaned.iter().map(String::as_str));
            let terms = self.term_frequencies(&text, top_n);
            let entry = (!terms.is_empty()).then_some(BucketTerms { text, terms });
            buckets.insert(target, entry);
        }

        WordCloudData { general, buckets }
    }
}

fn join_non_empty<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts
        .filter(|s| !s.trim().is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
