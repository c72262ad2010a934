//! Lexical polarity counts.
//!
//! - Single-word lexicon hits count 1 each.
//! - Every exact substring occurrence of a multi-word phrase counts 2.
//! - Negation: if any of the 1..=3 tokens before a single-word hit is a negator,
//!   the hit is cancelled (+1 then -1). It never moves to the opposite polarity.

use crate::lexicon::{Lexicon, TermSet};
use crate::sentiment::tokenize;

pub const PHRASE_WEIGHT: i32 = 2;
pub const WORD_WEIGHT: i32 = 1;
pub const NEGATION_WINDOW: usize = 3;

/// Signed per-polarity counts plus the token count the short-text rule needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LexicalScore {
    pub pos_count: i32,
    pub neg_count: i32,
    pub tokens: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct LexicalScorer<'a> {
    lexicon: &'a Lexicon,
}

impl<'a> LexicalScorer<'a> {
    pub fn new(lexicon: &'a Lexicon) -> Self {
        Self { lexicon }
    }

    pub fn score(&self, text: &str) -> LexicalScore {
        let tokens = tokenize(text);
        self.score_tokens(&text.to_lowercase(), &tokens)
    }

    /// Score with an already lowercased text and its tokens.
    pub fn score_tokens(&self, lowered: &str, tokens: &[String]) -> LexicalScore {
        let pos_count = self.polarity_count(self.lexicon.positive(), lowered, tokens);
        let neg_count = self.polarity_count(self.lexicon.negative(), lowered, tokens);
        LexicalScore {
            pos_count,
            neg_count,
            tokens: tokens.len(),
        }
    }

    fn polarity_count(&self, set: &TermSet, lowered: &str, tokens: &[String]) -> i32 {
        let mut count = 0i32;

        for (i, tok) in tokens.iter().enumerate() {
            if !set.contains_word(tok) {
                continue;
            }
            count += WORD_WEIGHT;
            if self.negated_at(tokens, i) {
                count -= WORD_WEIGHT;
            }
        }

        for phrase in set.phrases() {
            let hits = lowered.matches(phrase.as_str()).count() as i32;
            count += hits * PHRASE_WEIGHT;
        }

        count
    }

    fn negated_at(&self, tokens: &[String], i: usize) -> bool {
        (1..=NEGATION_WINDOW).any(|k| i >= k && self.lexicon.is_negator(tokens[i - k].as_str()))
    }
}
