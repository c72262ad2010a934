// src/lib.rs
// Public library surface for integration tests (and the binary).

pub mod analyze;
pub mod api;
pub mod classifier;
pub mod config;
pub mod corpus;
pub mod engine;
pub mod lexicon;
pub mod metrics;
pub mod sentiment;
pub mod text;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::engine::{AnalysisOutcome, AnalysisReport, Analyzer, ThreadResult};
pub use crate::sentiment::{ClassifierResult, Polarity, ReinforcedResult};

use std::sync::Arc;

use axum::Router;
use tracing::info;

use crate::analyze::conclusion::build_conclusion_client;
use crate::classifier::build_classifier;
use crate::config::AppConfig;
use crate::corpus::load_corpus_lenient;
use crate::lexicon::Lexicon;

/// Build the application state from `AppConfig::load_default()`: lexicon,
/// classifier, corpus and conclusion client.
pub fn build_state(cfg: &AppConfig) -> anyhow::Result<AppState> {
    let lexicon = Arc::new(Lexicon::load_default(cfg.lexicon_path.as_deref()));
    let classifier = build_classifier(&cfg.classifier)?;
    let analyzer = Analyzer::from_config(cfg, lexicon, classifier);
    let corpus = load_corpus_lenient(&cfg.corpus_path);
    let conclusion = build_conclusion_client(&cfg.conclusion);

    info!(
        classifier = analyzer.classifier_name(),
        conclusion = conclusion.provider_name(),
        posts = corpus.len(),
        max_concurrency = cfg.max_concurrency,
        "application state ready"
    );
    Ok(AppState::new(analyzer, corpus, conclusion))
}

/// Full in-process app without the metrics route (the Prometheus recorder is
/// process-global and installed by the binary).
pub async fn app() -> anyhow::Result<Router> {
    let cfg = AppConfig::load_default()?;
    Ok(router(build_state(&cfg)?))
}
