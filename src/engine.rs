//! # Analysis Engine
//! Per-request orchestration: classify every post and comment, reinforce each
//! result with the lexical rules, fold comments into a thread verdict and
//! build the word-cloud buckets.
//!
//! Threads are analysed concurrently (bounded by `max_concurrency`). A thread
//! whose task fails is left out of the report entirely; a text whose
//! classification fails gets `(NEU, 0.5)`.

use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

use crate::analyze::rules::{RuleKind, SentimentReinforcer};
use crate::analyze::terms::{TermExtractor, WordCloudData};
use crate::analyze::thread::{aggregate, ThreadAggregate};
use crate::classifier::{classify_with_fallback, DynClassifier};
use crate::config::AppConfig;
use crate::corpus::{CorpusQuery, PostRecord};
use crate::lexicon::Lexicon;
use crate::sentiment::{ClassifierResult, Polarity, ReinforcedResult};
use crate::text::normalize_for_wordcloud;

const DEFAULT_MAX_CONCURRENCY: usize = 4;
const DEFAULT_TOP_N: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentResult {
    pub id_comentario: String,
    pub texto_comentario: String,
    pub result: ReinforcedResult,
    pub rule: RuleKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThreadResult {
    pub post_id: String,
    pub candidato: String,
    pub usuario: String,
    pub fecha: Option<String>,
    pub texto: String,
    pub post: ReinforcedResult,
    pub post_rule: RuleKind,
    pub comments: Vec<CommentResult>,
    pub aggregate: ThreadAggregate,
}

impl ThreadResult {
    pub fn text_count(&self) -> usize {
        1 + self.comments.len()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub threads: Vec<ThreadResult>,
    pub wordcloud: WordCloudData,
    pub total_texts: usize,
}

/// Either a report or the explicit "nothing matched" state.
#[derive(Debug, Clone)]
pub enum AnalysisOutcome {
    NoResults,
    Report(AnalysisReport),
}

impl AnalysisOutcome {
    pub fn report(&self) -> Option<&AnalysisReport> {
        match self {
            AnalysisOutcome::Report(r) => Some(r),
            AnalysisOutcome::NoResults => None,
        }
    }
}

/// Shared, read-only analysis context. Cheap to clone.
#[derive(Clone)]
pub struct Analyzer {
    lexicon: Arc<Lexicon>,
    classifier: DynClassifier,
    terms: Arc<TermExtractor>,
    max_concurrency: usize,
    top_n: usize,
}

impl Analyzer {
    pub fn new(lexicon: Arc<Lexicon>, classifier: DynClassifier) -> Self {
        let terms = Arc::new(TermExtractor::new(lexicon.clone()));
        Self {
            lexicon,
            classifier,
            terms,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            top_n: DEFAULT_TOP_N,
        }
    }

    pub fn from_config(cfg: &AppConfig, lexicon: Arc<Lexicon>, classifier: DynClassifier) -> Self {
        Self::new(lexicon, classifier).with_limits(cfg.max_concurrency, cfg.wordcloud_top_n)
    }

    pub fn with_limits(mut self, max_concurrency: usize, top_n: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self.top_n = top_n.max(1);
        self
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    pub fn classifier_name(&self) -> &'static str {
        self.classifier.name()
    }

    /// Reinforce one text. A missing classifier result short-circuits to
    /// `(NEU, 0.5)` without running the rules.
    pub fn reinforce(&self, text: &str, classified: Option<ClassifierResult>) -> (ReinforcedResult, RuleKind) {
        counter!("sentiment_texts_total").increment(1);
        let Some(c) = classified else {
            debug!(text = %anon_hash(text), "no classifier result; neutral default");
            return (ReinforcedResult::neutral_default(), RuleKind::Fallback);
        };
        let r = SentimentReinforcer::new(&self.lexicon).reinforce_detailed(text, c);
        counter!("sentiment_rule_total", "rule" => r.rule.as_str()).increment(1);
        debug!(
            text = %anon_hash(text),
            rule = r.rule.as_str(),
            from = %c.label,
            to = %r.result.label,
            confidence = r.result.confidence,
            pos = r.score.pos_count,
            neg = r.score.neg_count,
            "reinforced"
        );
        (r.result, r.rule)
    }

    /// Post plus comments in one classifier call, then per-text reinforcement
    /// and aggregation.
    pub async fn analyze_thread(&self, post: &PostRecord) -> ThreadResult {
        let mut texts = Vec::with_capacity(1 + post.comentarios.len());
        texts.push(post.texto.clone());
        texts.extend(post.comentarios.iter().map(|c| c.texto_comentario.clone()));

        let mut classified = classify_with_fallback(self.classifier.as_ref(), &texts)
            .await
            .into_iter();

        let (post_result, post_rule) = self.reinforce(&post.texto, classified.next().flatten());
        let comments: Vec<CommentResult> = post
            .comentarios
            .iter()
            .map(|c| {
                let (result, rule) = self.reinforce(&c.texto_comentario, classified.next().flatten());
                CommentResult {
                    id_comentario: c.id_comentario.clone(),
                    texto_comentario: c.texto_comentario.clone(),
                    result,
                    rule,
                }
            })
            .collect();

        let comment_results: Vec<ReinforcedResult> = comments.iter().map(|c| c.result).collect();
        let agg = aggregate(post_result, &comment_results);

        ThreadResult {
            post_id: post.id_post.clone(),
            candidato: post.candidato.clone(),
            usuario: post.usuario.clone(),
            fecha: post.fecha.clone(),
            texto: post.texto.clone(),
            post: post_result,
            post_rule,
            comments,
            aggregate: agg,
        }
    }

    /// Filter `corpus` with `query` and analyse the matches.
    pub async fn analyze_query(&self, corpus: &[PostRecord], query: &CorpusQuery) -> AnalysisOutcome {
        let matched: Vec<PostRecord> = query.filter(corpus).into_iter().cloned().collect();
        info!(matched = matched.len(), corpus = corpus.len(), "corpus query");
        self.analyze_posts(matched).await
    }

    /// Analyse posts concurrently; results keep the input order.
    pub async fn analyze_posts(&self, posts: Vec<PostRecord>) -> AnalysisOutcome {
        if posts.is_empty() {
            return AnalysisOutcome::NoResults;
        }
        let started = Instant::now();
        let requested = posts.len();

        let sem = Arc::new(Semaphore::new(self.max_concurrency));
        let mut set = JoinSet::new();
        for (idx, post) in posts.into_iter().enumerate() {
            let this = self.clone();
            let sem = sem.clone();
            set.spawn(async move {
                let _permit = sem.acquire_owned().await.ok();
                (idx, this.analyze_thread(&post).await)
            });
        }

        let mut indexed = Vec::with_capacity(requested);
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(pair) => indexed.push(pair),
                Err(e) => {
                    counter!("analysis_threads_dropped_total").increment(1);
                    warn!(error = %e, "thread analysis task failed; dropping thread");
                }
            }
        }
        indexed.sort_by_key(|(idx, _)| *idx);
        let threads: Vec<ThreadResult> = indexed.into_iter().map(|(_, t)| t).collect();

        if threads.is_empty() {
            return AnalysisOutcome::NoResults;
        }

        let wordcloud = self.build_wordcloud(&threads).await;
        let total_texts = threads.iter().map(ThreadResult::text_count).sum();

        let elapsed = started.elapsed().as_millis() as f64;
        histogram!("analysis_duration_ms").record(elapsed);
        info!(
            threads = threads.len(),
            dropped = requested - threads.len(),
            texts = total_texts,
            elapsed_ms = elapsed,
            "analysis finished"
        );

        AnalysisOutcome::Report(AnalysisReport {
            threads,
            wordcloud,
            total_texts,
        })
    }

    /// Post text goes to the thread's final bucket; each comment to its own.
    /// A failure here yields empty buckets, never a failed report.
    async fn build_wordcloud(&self, threads: &[ThreadResult]) -> WordCloudData {
        let assigned = bucket_assignment(threads);
        let terms = self.terms.clone();
        let top_n = self.top_n;
        wordcloud_or_empty(tokio::task::spawn_blocking(move || {
            terms.build_wordcloud(&assigned, top_n)
        }))
        .await
    }
}

/// Await a word-cloud task; a panicked or cancelled task yields empty buckets.
pub async fn wordcloud_or_empty(task: JoinHandle<WordCloudData>) -> WordCloudData {
    match task.await {
        Ok(wc) => wc,
        Err(e) => {
            warn!(error = %e, "word-cloud extraction failed; returning empty buckets");
            WordCloudData::default()
        }
    }
}

pub fn bucket_assignment(threads: &[ThreadResult]) -> Vec<(Polarity, String)> {
    let mut out = Vec::new();
    for t in threads {
        out.push((t.aggregate.final_label, normalize_for_wordcloud(&t.texto)));
        for c in &t.comments {
            out.push((c.result.label, normalize_for_wordcloud(&c.texto_comentario)));
        }
    }
    out
}

/// Short SHA-256 prefix used to refer to a text in logs.
pub fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}
