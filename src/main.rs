//! Story Dashboard Service: binary entrypoint
//! Boots the Axum HTTP server: config, tracing, story catalog, backend client,
//! chart pipeline routes and the Prometheus `/metrics` route.
//!
//! See `README.md` for the route list and configuration.

use shuttle_axum::ShuttleAxum;

use story_dashboard::config::AppConfig;
use story_dashboard::metrics::Metrics;
use story_dashboard::telemetry;

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    telemetry::init();

    let cfg = AppConfig::load_default()?;
    tracing::info!(
        backend = %cfg.backend_base_url,
        timeout_ms = cfg.request_timeout_ms,
        "configuration loaded"
    );

    let metrics = Metrics::init()?;
    let router = story_dashboard::app(&cfg, Some(&metrics))?;

    Ok(router.into())
}
