//! Classifier boundary: the black-box model that returns a label and a score
//! per text. Injected as a trait object so tests can use fixed stubs.
//!
//! Contract: `classify(texts)` returns one prediction per text, in order.
//! Failures are resolved per text by [`classify_with_fallback`]: a failing
//! batch is retried text-by-text and whatever still fails becomes `None`
//! (the engine turns that into `(NEU, 0.5)`).

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use metrics::counter;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ClassifierSection;
use crate::sentiment::{ClassifierResult, Polarity};

/// Raw model output. Accepts both `{label, score}` and the Spanish
/// `{sentimiento, confianza}` field names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPrediction {
    #[serde(alias = "sentimiento")]
    pub label: String,
    #[serde(alias = "confianza")]
    pub score: f32,
}

impl RawPrediction {
    pub fn new(label: impl Into<String>, score: f32) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }

    /// `None` if the label is unmapped or the score is not a finite number.
    pub fn to_result(&self) -> Option<ClassifierResult> {
        if !self.score.is_finite() {
            return None;
        }
        Polarity::from_label(&self.label).map(|p| ClassifierResult::new(p, self.score))
    }
}

#[async_trait::async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, texts: &[String]) -> Result<Vec<RawPrediction>>;
    fn name(&self) -> &'static str;
}

pub type DynClassifier = Arc<dyn Classifier>;

/// Factory from config.
///
/// * `CLASSIFIER_TEST_MODE=mock` → deterministic `StaticClassifier("NEU", 0.6)`.
/// * provider `"mock"` → same.
/// * provider `"disabled"` → every text gets a neutral `(NEU, 0.5)` prior, so only
///   the lexical rules decide.
/// * otherwise the HTTP classifier service.
pub fn build_classifier(cfg: &ClassifierSection) -> Result<DynClassifier> {
    if std::env::var("CLASSIFIER_TEST_MODE")
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        return Ok(Arc::new(StaticClassifier::new("NEU", 0.6)));
    }
    match cfg.provider.as_str() {
        "mock" => Ok(Arc::new(StaticClassifier::new("NEU", 0.6))),
        "disabled" => Ok(Arc::new(StaticClassifier::new("NEU", 0.5))),
        "http" => Ok(Arc::new(HttpClassifier::new(
            &cfg.url,
            Duration::from_secs(cfg.timeout_secs),
            cfg.batch_size,
        )?)),
        other => bail!("unsupported classifier provider: {other}"),
    }
}

/// Classify `texts`, never failing: one `Option` per input text.
pub async fn classify_with_fallback(
    classifier: &dyn Classifier,
    texts: &[String],
) -> Vec<Option<ClassifierResult>> {
    if texts.is_empty() {
        return Vec::new();
    }

    match classifier.classify(texts).await {
        Ok(preds) if preds.len() == texts.len() => {
            let out: Vec<Option<ClassifierResult>> = preds.iter().map(RawPrediction::to_result).collect();
            record_failures(out.iter().filter(|r| r.is_none()).count());
            return out;
        }
        Ok(preds) => warn!(
            classifier = classifier.name(),
            expected = texts.len(),
            got = preds.len(),
            "classifier returned a mismatched batch; retrying per text"
        ),
        Err(e) => warn!(
            classifier = classifier.name(),
            error = ?e,
            "classifier batch failed; retrying per text"
        ),
    }

    if texts.len() == 1 {
        record_failures(1);
        return vec![None];
    }

    let mut out = Vec::with_capacity(texts.len());
    for text in texts {
        let one = std::slice::from_ref(text);
        let res = match classifier.classify(one).await {
            Ok(preds) if preds.len() == 1 => preds[0].to_result(),
            Ok(_) => None,
            Err(e) => {
                debug!(error = ?e, "single-text classification failed");
                None
            }
        };
        if res.is_none() {
            record_failures(1);
        }
        out.push(res);
    }
    out
}

fn record_failures(n: usize) {
    if n > 0 {
        counter!("classifier_failures_total").increment(n as u64);
    }
}

// ------------------------------------------------------------
// Implementations
// ------------------------------------------------------------

/// Remote classifier service: `POST {"textos": [...]}` → `[{label, score}, ...]`.
pub struct HttpClassifier {
    http: reqwest::Client,
    url: String,
    batch_size: usize,
}

impl HttpClassifier {
    pub fn new(url: &str, timeout: Duration, batch_size: usize) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("sentivote/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(timeout)
            .build()
            .context("building classifier http client")?;
        Ok(Self {
            http,
            url: url.to_string(),
            batch_size: batch_size.max(1),
        })
    }
}

#[derive(Serialize)]
struct ClassifyReq<'a> {
    textos: &'a [String],
}

#[async_trait::async_trait]
impl Classifier for HttpClassifier {
    async fn classify(&self, texts: &[String]) -> Result<Vec<RawPrediction>> {
        let mut out = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.batch_size) {
            let resp = self
                .http
                .post(&self.url)
                .json(&ClassifyReq { textos: chunk })
                .send()
                .await
                .with_context(|| format!("calling classifier at {}", self.url))?;
            let status = resp.status();
            if !status.is_success() {
                return Err(anyhow!("classifier returned HTTP {status}"));
            }
            let mut preds: Vec<RawPrediction> =
                resp.json().await.context("decoding classifier response")?;
            if preds.len() != chunk.len() {
                bail!(
                    "classifier returned {} predictions for {} texts",
                    preds.len(),
                    chunk.len()
                );
            }
            out.append(&mut preds);
        }
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Same prediction for every text.
#[derive(Debug, Clone)]
pub struct StaticClassifier {
    pub fixed: RawPrediction,
}

impl StaticClassifier {
    pub fn new(label: &str, score: f32) -> Self {
        Self {
            fixed: RawPrediction::new(label, score),
        }
    }
}

#[async_trait::async_trait]
impl Classifier for StaticClassifier {
    async fn classify(&self, texts: &[String]) -> Result<Vec<RawPrediction>> {
        Ok(vec![self.fixed.clone(); texts.len()])
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

/// Per-text closure; a `None` from the closure fails the whole call, which
/// exercises the per-text retry path.
pub struct FnClassifier<F>
where
    F: Fn(&str) -> Option<RawPrediction> + Send + Sync,
{
    f: F,
}

impl<F> FnClassifier<F>
where
    F: Fn(&str) -> Option<RawPrediction> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait::async_trait]
impl<F> Classifier for FnClassifier<F>
where
    F: Fn(&str) -> Option<RawPrediction> + Send + Sync,
{
    async fn classify(&self, texts: &[String]) -> Result<Vec<RawPrediction>> {
        texts
            .iter()
            .map(|t| (self.f)(t).ok_or_else(|| anyhow!("no prediction for text")))
            .collect()
    }

    fn name(&self) -> &'static str {
        "fn"
    }
}
