// src/backend/http.rs
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use metrics::{counter, histogram};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Instant;

use crate::backend::error::{unwrap_envelope, FetchError};
use crate::backend::Backend;
use crate::chart::payload::RawSeriesPayload;
use crate::config::AppConfig;
use crate::indicator::{DashboardSummary, Indicator, StoryIndicator, VisualEntity};
use crate::metrics::{
    ensure_described, BACKEND_ERRORS_TOTAL, BACKEND_REQUESTS_TOTAL, BACKEND_REQUEST_MS,
};

/// REST backend reached over HTTP. One shared `reqwest::Client` with
/// connect and overall timeouts; no retries.
pub struct HttpBackend {
    http: reqwest::Client,
    base: Url,
}

impl HttpBackend {
    pub fn new(cfg: &AppConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("story-dashboard/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(cfg.connect_timeout())
            .timeout(cfg.request_timeout())
            .build()
            .context("building reqwest client")?;
        Self::with_client(&cfg.backend_base_url, http)
    }

    pub fn with_client(base_url: &str, http: reqwest::Client) -> Result<Self> {
        let base = Url::parse(base_url).with_context(|| format!("invalid backend url '{base_url}'"))?;
        if base.cannot_be_a_base() {
            return Err(anyhow!("backend url '{base_url}' cannot be a base"));
        }
        Ok(Self { http, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// `<base>/api/<segments...>`, each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("api").extend(segments);
        }
        url
    }

    async fn get_raw(&self, endpoint: &'static str, segments: &[&str]) -> Result<(u16, String), FetchError> {
        let resp = self.http.get(self.endpoint(segments)).send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        tracing::debug!(endpoint, status, bytes = body.len(), "backend response");
        Ok((status, body))
    }

    /// GET an enveloped endpoint and return the value under `data_key`.
    async fn get_data(
        &self,
        endpoint: &'static str,
        segments: &[&str],
        data_key: &str,
    ) -> Result<Value, FetchError> {
        ensure_described();
        counter!(BACKEND_REQUESTS_TOTAL, "endpoint" => endpoint).increment(1);
        let t0 = Instant::now();

        let result = match self.get_raw(endpoint, segments).await {
            Ok((status, body)) => unwrap_envelope(status, &body, data_key),
            Err(e) => Err(e),
        };

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!(BACKEND_REQUEST_MS, "endpoint" => endpoint).record(ms);
        if let Err(e) = &result {
            counter!(BACKEND_ERRORS_TOTAL, "endpoint" => endpoint).increment(1);
            tracing::warn!(error = %e, endpoint, ms, "backend request failed");
        }
        result
    }
}

fn decode<T: DeserializeOwned>(v: Value) -> Result<T, FetchError> {
    serde_json::from_value(v).map_err(|e| FetchError::Decode(e.to_string()))
}

/// Decode a JSON array element-wise, skipping (and logging) malformed entries.
fn decode_list<T: DeserializeOwned>(endpoint: &str, v: Value) -> Result<Vec<T>, FetchError> {
    let Value::Array(items) = v else {
        return Err(FetchError::Decode(format!("{endpoint}: expected an array")));
    };
    Ok(items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(t) => Some(t),
            Err(e) => {
                tracing::warn!(error = %e, endpoint, "skipping malformed entry");
                None
            }
        })
        .collect())
}

#[async_trait]
impl Backend for HttpBackend {
    async fn health(&self) -> Result<(), FetchError> {
        ensure_described();
        counter!(BACKEND_REQUESTS_TOTAL, "endpoint" => "health").increment(1);
        match self.get_raw("health", &["health"]).await {
            Ok((status, _)) if (200..300).contains(&status) => Ok(()),
            Ok((status, body)) => {
                counter!(BACKEND_ERRORS_TOTAL, "endpoint" => "health").increment(1);
                Err(unwrap_envelope(status, &body, "data")
                    .err()
                    .unwrap_or(FetchError::Status {
                        code: status,
                        message: String::new(),
                    }))
            }
            Err(e) => {
                counter!(BACKEND_ERRORS_TOTAL, "endpoint" => "health").increment(1);
                tracing::warn!(error = %e, "backend health check failed");
                Err(e)
            }
        }
    }

    async fn indicators(&self) -> Result<Vec<Indicator>, FetchError> {
        let v = self.get_data("indicators", &["indicators"], "data").await?;
        decode_list("indicators", v)
    }

    async fn dashboard_summary(&self) -> Result<DashboardSummary, FetchError> {
        let v = self
            .get_data("dashboard-summary", &["dashboard-summary"], "data")
            .await?;
        decode(v)
    }

    async fn time_series(&self, indicator_id: &str) -> Result<RawSeriesPayload, FetchError> {
        let v = self
            .get_data("time-series", &["time-series", indicator_id], "data")
            .await?;
        Ok(RawSeriesPayload::from_value(&v))
    }

    async fn related_visualizations(
        &self,
        indicator_id: &str,
    ) -> Result<Vec<VisualEntity>, FetchError> {
        let v = self
            .get_data(
                "related-visualizations",
                &["related-visualizations", indicator_id],
                "data",
            )
            .await?;
        decode_list("related-visualizations", v)
    }

    async fn story_data(&self, story_id: &str) -> Result<Vec<StoryIndicator>, FetchError> {
        let v = self
            .get_data("story-data", &["story-data", story_id], "indicators")
            .await?;
        decode_list("story-data", v)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
