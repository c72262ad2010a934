//! Sentiment service: binary entrypoint.
//! Boots the Axum HTTP server, wiring routes, shared state, and metrics.

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sentivote::config::AppConfig;
use sentivote::metrics::Metrics;

/// Compact logs by default; `SENTIVOTE_LOG_JSON=1` switches to JSON lines.
/// `try_init` keeps this a no-op when the runtime already installed a subscriber.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sentivote=info,warn"));

    let json = std::env::var("SENTIVOTE_LOG_JSON")
        .ok()
        .is_some_and(|v| v == "1");

    let registry = tracing_subscriber::registry().with(filter);
    let _ = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    init_tracing();

    let cfg = AppConfig::load_default()?;
    let state = sentivote::build_state(&cfg)?;
    let mut router = sentivote::router(state);

    match Metrics::init() {
        Ok(m) => router = router.merge(m.router()),
        Err(e) => tracing::warn!(error = ?e, "metrics disabled"),
    }

    Ok(router.into())
}
