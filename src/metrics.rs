// src/metrics.rs
use axum::{extract::State, routing::get, Router};
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

pub const BACKEND_REQUESTS_TOTAL: &str = "backend_requests_total";
pub const BACKEND_ERRORS_TOTAL: &str = "backend_errors_total";
pub const BACKEND_REQUEST_MS: &str = "backend_request_ms";
pub const SESSION_STALE_RESPONSES_TOTAL: &str = "session_stale_responses_total";

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(BACKEND_REQUESTS_TOTAL, "Requests issued to the REST backend.");
        describe_counter!(
            BACKEND_ERRORS_TOTAL,
            "Backend requests that failed (transport, status or envelope)."
        );
        describe_histogram!(BACKEND_REQUEST_MS, "Backend request latency in milliseconds.");
        describe_counter!(
            SESSION_STALE_RESPONSES_TOTAL,
            "Responses discarded because the selection changed while in flight."
        );
    });
}

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder. Fails if one is already installed.
    pub fn init() -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new().install_recorder()?;
        ensure_described();
        Ok(Self { handle })
    }

    /// Wrap a handle from a recorder that is not installed globally.
    pub fn from_handle(handle: PrometheusHandle) -> Self {
        Self { handle }
    }

    /// Mount `GET /metrics` on `router`.
    pub fn mount(&self, router: Router) -> Router {
        router.merge(
            Router::new()
                .route("/metrics", get(render))
                .with_state(self.handle.clone()),
        )
    }
}

async fn render(State(handle): State<PrometheusHandle>) -> String {
    handle.render()
}
