// src/lib.rs
// Public library surface for the service binary and integration tests.

pub mod api;
pub mod backend;
pub mod builders;
pub mod chart;
pub mod config;
pub mod indicator;
pub mod insights;
pub mod metrics;
pub mod session;
pub mod simulate;
pub mod story;
pub mod telemetry;

pub use crate::api::{router, AppState};
pub use crate::chart::{
    is_chart_type_valid, transform_data_for_chart, ChartKind, ChartRecord, ChartView,
    RawSeriesPayload,
};

use axum::Router;

/// Router wired from config: story catalog, HTTP backend, default insights.
/// `/metrics` is served when a recorder handle is given.
pub fn app(cfg: &config::AppConfig, metrics: Option<&metrics::Metrics>) -> anyhow::Result<Router> {
    let router = api::router(AppState::from_config(cfg)?);
    Ok(match metrics {
        Some(m) => m.mount(router),
        None => router,
    })
}
