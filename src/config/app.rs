// src/config/app.rs
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::{env, fs};

pub const DEFAULT_CONFIG_PATH: &str = "config/app.toml";
pub const ENV_CONFIG_PATH: &str = "SENTIVOTE_CONFIG_PATH";
pub const ENV_CORPUS_PATH: &str = "SENTIVOTE_CORPUS_PATH";
pub const ENV_MAX_CONCURRENCY: &str = "SENTIVOTE_MAX_CONCURRENCY";
pub const ENV_CLASSIFIER_URL: &str = "CLASSIFIER_URL";

fn default_corpus_path() -> PathBuf {
    PathBuf::from("data/corpus_sample.json")
}
fn default_max_concurrency() -> usize {
    4
}
fn default_top_n() -> usize {
    50
}
fn default_provider() -> String {
    "http".to_string()
}
fn default_classifier_url() -> String {
    "http://127.0.0.1:5000/analizar".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_batch_size() -> usize {
    32
}
fn default_conclusion_provider() -> String {
    "openai".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_corpus_path")]
    pub corpus_path: PathBuf,
    /// `None` → built-in lexicon (or `$SENTIVOTE_LEXICON_PATH`).
    #[serde(default)]
    pub lexicon_path: Option<PathBuf>,
    /// Threads analysed at once; bounded by what the classifier tolerates.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    #[serde(default = "default_top_n")]
    pub wordcloud_top_n: usize,
    #[serde(default)]
    pub classifier: ClassifierSection,
    #[serde(default)]
    pub conclusion: ConclusionSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierSection {
    /// "http" | "mock" | "disabled" (case-insensitive)
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_classifier_url")]
    pub url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Max texts per classifier call.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConclusionSection {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_conclusion_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            corpus_path: default_corpus_path(),
            lexicon_path: None,
            max_concurrency: default_max_concurrency(),
            wordcloud_top_n: default_top_n(),
            classifier: ClassifierSection::default(),
            conclusion: ConclusionSection::default(),
        }
    }
}

impl Default for ClassifierSection {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            url: default_classifier_url(),
            timeout_secs: default_timeout_secs(),
            batch_size: default_batch_size(),
        }
    }
}

impl Default for ConclusionSection {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: default_conclusion_provider(),
            model: None,
        }
    }
}

impl AppConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let cfg: AppConfig =
            toml::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;
        Ok(cfg.sanitized())
    }

    /// `$SENTIVOTE_CONFIG_PATH` or `config/app.toml`; a missing file means defaults.
    /// Env overrides are applied last.
    pub fn load_default() -> Result<Self> {
        let path = env::var(ENV_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        let cfg = if path.exists() {
            Self::load_from_file(&path)?
        } else {
            tracing::warn!(path = %path.display(), "config file not found; using defaults");
            Self::default()
        };
        Ok(cfg.with_env_overrides())
    }

    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(p) = env::var(ENV_CORPUS_PATH) {
            if !p.trim().is_empty() {
                self.corpus_path = PathBuf::from(p);
            }
        }
        if let Ok(p) = env::var(crate::lexicon::ENV_LEXICON_PATH) {
            if !p.trim().is_empty() {
                self.lexicon_path = Some(PathBuf::from(p));
            }
        }
        if let Some(n) = env::var(ENV_MAX_CONCURRENCY)
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
        {
            self.max_concurrency = n;
        }
        if let Ok(url) = env::var(ENV_CLASSIFIER_URL) {
            if !url.trim().is_empty() {
                self.classifier.url = url;
            }
        }
        self.sanitized()
    }

    fn sanitized(mut self) -> Self {
        self.max_concurrency = self.max_concurrency.max(1);
        self.classifier.batch_size = self.classifier.batch_size.max(1);
        self.classifier.provider = self.classifier.provider.trim().to_ascii_lowercase();
        if self.wordcloud_top_n == 0 {
            self.wordcloud_top_n = default_top_n();
        }
        self
    }
}
