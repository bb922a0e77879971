// src/backend/memory.rs
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;

use crate::backend::{Backend, FetchError};
use crate::chart::payload::RawSeriesPayload;
use crate::indicator::{DashboardSummary, Indicator, StoryIndicator, VisualEntity};

/// In-process backend serving canned data. Used by tests and local demos;
/// per-indicator delays let callers reproduce out-of-order responses.
#[derive(Default)]
pub struct MemoryBackend {
    healthy: bool,
    indicators: Vec<Indicator>,
    summary: DashboardSummary,
    series: HashMap<String, RawSeriesPayload>,
    related: HashMap<String, Vec<VisualEntity>>,
    stories: HashMap<String, Vec<StoryIndicator>>,
    failures: HashMap<String, FetchError>,
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            healthy: true,
            ..Default::default()
        }
    }

    pub fn unhealthy(mut self) -> Self {
        self.healthy = false;
        self
    }

    pub fn with_indicators(mut self, indicators: Vec<Indicator>) -> Self {
        self.indicators = indicators;
        self
    }

    pub fn with_summary(mut self, summary: DashboardSummary) -> Self {
        self.summary = summary;
        self
    }

    pub fn with_series(mut self, indicator_id: &str, payload: RawSeriesPayload) -> Self {
        self.series.insert(indicator_id.to_string(), payload);
        self
    }

    pub fn with_related(mut self, indicator_id: &str, related: Vec<VisualEntity>) -> Self {
        self.related.insert(indicator_id.to_string(), related);
        self
    }

    pub fn with_story(mut self, story_id: &str, indicators: Vec<StoryIndicator>) -> Self {
        self.stories.insert(story_id.to_string(), indicators);
        self
    }

    /// Make every call keyed by `key` fail. Keys are endpoint names
    /// (`indicators`, `dashboard-summary`) or an indicator/story id.
    pub fn failing(mut self, key: &str, err: FetchError) -> Self {
        self.failures.insert(key.to_string(), err);
        self
    }

    /// Delay `time_series(indicator_id)` by `delay`.
    pub fn with_delay(mut self, indicator_id: &str, delay: Duration) -> Self {
        self.delays.insert(indicator_id.to_string(), delay);
        self
    }

    /// Calls seen so far, as `endpoint` or `endpoint:id`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().push(call);
    }

    fn check(&self, key: &str) -> Result<(), FetchError> {
        match self.failures.get(key) {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    fn not_found(what: &str, id: &str) -> FetchError {
        FetchError::Rejected {
            message: format!("{what} '{id}' not found"),
        }
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn health(&self) -> Result<(), FetchError> {
        self.record("health".into());
        if self.healthy {
            Ok(())
        } else {
            Err(FetchError::Connect("backend marked unhealthy".into()))
        }
    }

    async fn indicators(&self) -> Result<Vec<Indicator>, FetchError> {
        self.record("indicators".into());
        self.check("indicators")?;
        Ok(self.indicators.clone())
    }

    async fn dashboard_summary(&self) -> Result<DashboardSummary, FetchError> {
        self.record("dashboard-summary".into());
        self.check("dashboard-summary")?;
        Ok(self.summary.clone())
    }

    async fn time_series(&self, indicator_id: &str) -> Result<RawSeriesPayload, FetchError> {
        self.record(format!("time-series:{indicator_id}"));
        if let Some(d) = self.delays.get(indicator_id) {
            tokio::time::sleep(*d).await;
        }
        self.check(indicator_id)?;
        self.series
            .get(indicator_id)
            .cloned()
            .ok_or_else(|| Self::not_found("indicator", indicator_id))
    }

    async fn related_visualizations(
        &self,
        indicator_id: &str,
    ) -> Result<Vec<VisualEntity>, FetchError> {
        self.record(format!("related-visualizations:{indicator_id}"));
        self.check(indicator_id)?;
        Ok(self.related.get(indicator_id).cloned().unwrap_or_default())
    }

    async fn story_data(&self, story_id: &str) -> Result<Vec<StoryIndicator>, FetchError> {
        self.record(format!("story-data:{story_id}"));
        self.check(story_id)?;
        self.stories
            .get(story_id)
            .cloned()
            .ok_or_else(|| Self::not_found("story", story_id))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
