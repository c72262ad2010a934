use anyhow::{Context, Result};
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder. Fails if a global recorder is already set.
    pub fn init() -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;
        ensure_described();
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

/// One-time registration so the series carry help text on /metrics.
pub fn ensure_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "sentiment_texts_total",
            "Texts (posts and comments) run through reinforcement."
        );
        describe_counter!(
            "sentiment_rule_total",
            "Reinforcement decisions by the rule that fired."
        );
        describe_counter!(
            "classifier_failures_total",
            "Texts that fell back to the neutral default after a classifier failure."
        );
        describe_counter!(
            "analysis_threads_dropped_total",
            "Threads left out of a report because their task failed."
        );
        describe_histogram!(
            "analysis_duration_ms",
            "Wall time of one analysis request in milliseconds."
        );
    });
}
