// src/analyze/mod.rs
//! Lexical analysis stages: de-obfuscation, insult detection, lexical scoring,
//! rule-based reinforcement, thread aggregation, word-cloud terms and the
//! optional prose conclusion.

pub mod conclusion;
pub mod insult;
pub mod obfuscation;
pub mod rules;
pub mod scoring;
pub mod terms;
pub mod thread;

// Re-export convenient types.
pub use crate::analyze::conclusion::{ConclusionClient, ConclusionRequest, DynConclusionClient};
pub use crate::analyze::insult::InsultDetector;
pub use crate::analyze::obfuscation::denoise;
pub use crate::analyze::rules::{Reinforcement, RuleKind, SentimentReinforcer};
pub use crate::analyze::scoring::{LexicalScore, LexicalScorer};
pub use crate::analyze::terms::{BucketTerms, TermCount, TermExtractor, WordCloudData};
pub use crate::analyze::thread::{aggregate, ThreadAggregate};
