//! Fold a post's result and its comments' results into one thread sentiment.
//!
//! - Comment majority: most frequent label, ties go to the label seen first.
//! - No comments: majority `NEU`, average confidence `0.5`.
//! - Final label: NEG if either side is NEG; POS only if both are POS; else NEU.
//! - Final confidence: `0.4 * post + 0.6 * comment average`.

use serde::Serialize;

use crate::sentiment::{clamp01, Polarity, ReinforcedResult, DEFAULT_CONFIDENCE};

/// Weight of the post in the final confidence; comments get `1 - POST_WEIGHT`.
pub const POST_WEIGHT: f32 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThreadAggregate {
    pub final_label: Polarity,
    pub final_confidence: f32,
    pub comment_label: Polarity,
    pub comment_confidence: f32,
}

pub fn aggregate(post: ReinforcedResult, comments: &[ReinforcedResult]) -> ThreadAggregate {
    let (comment_label, comment_confidence) = comment_consensus(comments);

    let final_label = if post.label == Polarity::Negative || comment_label == Polarity::Negative {
        Polarity::Negative
    } else if post.label == Polarity::Positive && comment_label == Polarity::Positive {
        Polarity::Positive
    } else {
        Polarity::Neutral
    };

    let final_confidence =
        clamp01(POST_WEIGHT * post.confidence + (1.0 - POST_WEIGHT) * comment_confidence);

    ThreadAggregate {
        final_label,
        final_confidence,
        comment_label,
        comment_confidence,
    }
}

/// Majority label (stable on ties) and mean confidence of the comments.
pub fn comment_consensus(comments: &[ReinforcedResult]) -> (Polarity, f32) {
    if comments.is_empty() {
        return (Polarity::Neutral, DEFAULT_CONFIDENCE);
    }

    // Insertion-ordered counts keep the tie-break on first appearance.
    let mut counts: Vec<(Polarity, usize)> = Vec::with_capacity(3);
    for c in comments {
        match counts.iter_mut().find(|(p, _)| *p == c.label) {
            Some((_, n)) => *n += 1,
            None => counts.push((c.label, 1)),
        }
    }
    let mut majority = counts[0];
    for &(p, n) in counts.iter().skip(1) {
        if n > majority.1 {
            majority = (p, n);
        }
    }

    let sum: f32 = comments.iter().map(|c| c.confidence).sum();
    (majority.0, clamp01(sum / comments.len() as f32))
}
