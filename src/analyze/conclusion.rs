//! Prose conclusion over the word-cloud buckets.
//!
//! The analysis engine never calls this; the API exposes it as a separate,
//! optional step. Providers:
//! - `OpenAiProvider` (Chat Completions, needs `OPENAI_API_KEY`);
//! - `LocalSummary`, a deterministic fallback used when the provider is disabled,
//!   unkeyed, or fails.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::ConclusionSection;
use crate::sentiment::Polarity;

const MAX_TERMS_PER_BUCKET: usize = 15;
const MAX_CONCLUSION_CHARS: usize = 1200;

/// Top terms per bucket plus optional per-bucket post counts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConclusionRequest {
    #[serde(default)]
    pub palabras: HashMap<Polarity, HashMap<String, usize>>,
    #[serde(default)]
    pub conteos: HashMap<Polarity, usize>,
}

pub trait ConclusionClient: Send + Sync {
    fn conclude<'a>(
        &'a self,
        req: &'a ConclusionRequest,
    ) -> Pin<Box<dyn Future<Output = String> + Send + 'a>>;
    fn provider_name(&self) -> &'static str;
}

pub type DynConclusionClient = Arc<dyn ConclusionClient>;

/// Factory from config; anything not fully configured falls back to `LocalSummary`.
pub fn build_conclusion_client(cfg: &ConclusionSection) -> DynConclusionClient {
    if !cfg.enabled {
        return Arc::new(LocalSummary);
    }
    match cfg.provider.to_ascii_lowercase().as_str() {
        "openai" => {
            let key = std::env::var("OPENAI_API_KEY").unwrap_or_default();
            if key.trim().is_empty() {
                warn!("conclusions enabled but OPENAI_API_KEY is missing; using local summary");
                return Arc::new(LocalSummary);
            }
            match OpenAiProvider::new(key, cfg.model.clone()) {
                Ok(p) => Arc::new(p),
                Err(e) => {
                    warn!(error = ?e, "failed to build OpenAI client; using local summary");
                    Arc::new(LocalSummary)
                }
            }
        }
        other => {
            warn!(provider = other, "unknown conclusion provider; using local summary");
            Arc::new(LocalSummary)
        }
    }
}

// ------------------------------------------------------------
// Local deterministic summary
// ------------------------------------------------------------

pub struct LocalSummary;

impl LocalSummary {
    pub fn summarize(req: &ConclusionRequest) -> String {
        let weight = |p: Polarity| -> usize {
            if !req.conteos.is_empty() {
                req.conteos.get(&p).copied().unwrap_or(0)
            } else {
                req.palabras
                    .get(&p)
                    .map(|m| m.values().sum())
                    .unwrap_or(0)
            }
        };

        // Fixed order NEG, POS, NEU: an exact tie names the first.
        let order = [Polarity::Negative, Polarity::Positive, Polarity::Neutral];
        let mut best = order[0];
        for p in order.iter().skip(1) {
            if weight(*p) > weight(best) {
                best = *p;
            }
        }
        if order.iter().all(|p| weight(*p) == 0) {
            return "No hay datos suficientes para generar una conclusión".to_string();
        }

        let word = match best {
            Polarity::Negative => "negativo",
            Polarity::Positive => "positivo",
            Polarity::Neutral => "neutral",
        };
        let mut out = format!("Predomina el sentimiento {word}");
        let top = top_terms(req, best, 5);
        if !top.is_empty() {
            out.push_str(&format!(" (términos frecuentes: {})", top.join(", ")));
        }
        out
    }
}

impl ConclusionClient for LocalSummary {
    fn conclude<'a>(
        &'a self,
        req: &'a ConclusionRequest,
    ) -> Pin<Box<dyn Future<Output = String> + Send + 'a>> {
        Box::pin(async move { LocalSummary::summarize(req) })
    }
    fn provider_name(&self) -> &'static str {
        "local"
    }
}

fn top_terms(req: &ConclusionRequest, p: Polarity, n: usize) -> Vec<String> {
    let Some(m) = req.palabras.get(&p) else {
        return Vec::new();
    };
    let mut v: Vec<(&String, &usize)> = m.iter().collect();
    v.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    v.into_iter().take(n).map(|(t, _)| t.clone()).collect()
}

// ------------------------------------------------------------
// OpenAI provider
// ------------------------------------------------------------

pub struct OpenAiProvider {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiProvider {
    pub fn new(api_key: String, model: Option<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("sentivote/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(20))
            .build()?;
        Ok(Self {
            http,
            api_key,
            model: model.unwrap_or_else(|| "gpt-4o-mini".to_string()),
        })
    }

    async fn fetch(&self, req: &ConclusionRequest) -> Option<String> {
        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f32,
            max_tokens: u32,
        }
        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMsg,
        }
        #[derive(Deserialize)]
        struct ChoiceMsg {
            content: String,
        }

        let sys = "Eres un analista político. Con las palabras más frecuentes por sentimiento \
                   (POS, NEG, NEU) redacta una conclusión breve y neutral en español, sin emojis.";
        let prompt = build_prompt(req);
        let body = Req {
            model: &self.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: sys,
                },
                Msg {
                    role: "user",
                    content: &prompt,
                },
            ],
            temperature: 0.3,
            max_tokens: 300,
        };

        let resp = self
            .http
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .ok()?;
        if !resp.status().is_success() {
            warn!(status = %resp.status(), "conclusion provider returned an error status");
            return None;
        }
        let parsed: Resp = resp.json().await.ok()?;
        let content = parsed.choices.first().map(|c| c.message.content.as_str())?;
        let cleaned = sanitize(content);
        (!cleaned.is_empty()).then_some(cleaned)
    }
}

impl ConclusionClient for OpenAiProvider {
    fn conclude<'a>(
        &'a self,
        req: &'a ConclusionRequest,
    ) -> Pin<Box<dyn Future<Output = String> + Send + 'a>> {
        Box::pin(async move {
            match self.fetch(req).await {
                Some(text) => text,
                None => LocalSummary::summarize(req),
            }
        })
    }
    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

pub fn build_prompt(req: &ConclusionRequest) -> String {
    let mut out = String::new();
    for p in Polarity::ALL {
        let terms = top_terms(req, p, MAX_TERMS_PER_BUCKET);
        out.push_str(&format!("{p}: {}\n", terms.join(", ")));
    }
    if !req.conteos.is_empty() {
        out.push_str("Publicaciones por sentimiento: ");
        let counts: Vec<String> = Polarity::ALL
            .iter()
            .map(|p| format!("{p}={}", req.conteos.get(p).copied().unwrap_or(0)))
            .collect();
        out.push_str(&counts.join(", "));
    }
    out
}

/// Single line, collapsed whitespace, bounded length.
pub fn sanitize(input: &str) -> String {
    let collapsed = input.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(MAX_CONCLUSION_CHARS).collect()
}
