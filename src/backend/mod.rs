// src/backend/mod.rs
pub mod error;
pub mod http;
pub mod memory;

pub use error::FetchError;
pub use http::HttpBackend;
pub use memory::MemoryBackend;

use futures_util::future::join_all;
use serde::Serialize;

use crate::chart::payload::RawSeriesPayload;
use crate::indicator::{DashboardSummary, Indicator, StoryIndicator, VisualEntity};

/// Read-only view of the dashboard's REST backend.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    async fn health(&self) -> Result<(), FetchError>;
    async fn indicators(&self) -> Result<Vec<Indicator>, FetchError>;
    async fn dashboard_summary(&self) -> Result<DashboardSummary, FetchError>;
    async fn time_series(&self, indicator_id: &str) -> Result<RawSeriesPayload, FetchError>;
    async fn related_visualizations(
        &self,
        indicator_id: &str,
    ) -> Result<Vec<VisualEntity>, FetchError>;
    /// Indicators a story depends on (the envelope's `indicators` field).
    async fn story_data(&self, story_id: &str) -> Result<Vec<StoryIndicator>, FetchError>;
    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardBootstrap {
    pub indicators: Vec<Indicator>,
    pub summary: DashboardSummary,
}

/// Health check first; indicators and summary are then fetched concurrently.
/// Any failure aborts the whole bootstrap.
pub async fn load_dashboard<B: Backend + ?Sized>(
    backend: &B,
) -> Result<DashboardBootstrap, FetchError> {
    backend.health().await?;
    let (indicators, summary) =
        tokio::try_join!(backend.indicators(), backend.dashboard_summary())?;
    tracing::info!(
        backend = backend.name(),
        indicators = indicators.len(),
        "dashboard bootstrap loaded"
    );
    Ok(DashboardBootstrap {
        indicators,
        summary,
    })
}

/// One story indicator with either its series or the reason it is missing.
#[derive(Debug, Clone, Serialize)]
pub struct IndicatorSeries {
    pub indicator: StoryIndicator,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<RawSeriesPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StorySeries {
    pub story_id: String,
    pub series: Vec<IndicatorSeries>,
}

impl StorySeries {
    pub fn failed(&self) -> usize {
        self.series.iter().filter(|s| s.error.is_some()).count()
    }
}

/// Resolve a story's indicators, then fetch every series concurrently.
/// Individual series failures are reported per indicator, not as a whole.
pub async fn load_story_series<B: Backend + ?Sized>(
    backend: &B,
    story_id: &str,
) -> Result<StorySeries, FetchError> {
    let indicators = backend.story_data(story_id).await?;
    let results = join_all(
        indicators
            .iter()
            .map(|ind| backend.time_series(&ind.indicator_id)),
    )
    .await;

    let series: Vec<IndicatorSeries> = indicators
        .into_iter()
        .zip(results)
        .map(|(indicator, res)| match res {
            Ok(payload) => IndicatorSeries {
                indicator,
                payload: Some(payload),
                error: None,
            },
            Err(e) => {
                tracing::warn!(indicator = %indicator.indicator_id, error = %e, "story series fetch failed");
                IndicatorSeries {
                    indicator,
                    payload: None,
                    error: Some(e.user_message()),
                }
            }
        })
        .collect();

    let out = StorySeries {
        story_id: story_id.to_string(),
        series,
    };
    tracing::info!(
        story = story_id,
        series = out.series.len(),
        failed = out.failed(),
        "story series loaded"
    );
    Ok(out)
}
