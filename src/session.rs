// src/session.rs
//! Dashboard selection state.
//!
//! Every indicator fetch is issued under a [`RequestToken`]. Any later
//! selection bumps the generation, so a response that resolves after the
//! user moved on is discarded instead of overwriting newer state.

use chrono::{DateTime, Utc};
use metrics::counter;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::backend::{load_dashboard, Backend, FetchError};
use crate::chart::kind::ChartKind;
use crate::chart::payload::{RawSeriesPayload, TimeRange};
use crate::chart::selector::ChartView;
use crate::indicator::{DashboardSummary, Indicator};
use crate::insights::InsightGenerator;
use crate::metrics::{ensure_described, SESSION_STALE_RESPONSES_TOTAL};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    #[default]
    Overview,
    Charts,
    Data,
    Related,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selection {
    pub indicator_id: Option<String>,
    pub chart_kind: ChartKind,
    pub tab: Tab,
    pub time_range: TimeRange,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            indicator_id: None,
            chart_kind: ChartKind::Line,
            tab: Tab::default(),
            time_range: TimeRange::All,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed {
        message: String,
    },
}

/// Identifies the selection a fetch was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestToken {
    pub generation: u64,
    pub indicator_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Current,
    Stale,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub selection: Selection,
    pub status: LoadStatus,
    pub generation: u64,
    pub loaded_at: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct State {
    selection: Selection,
    generation: u64,
    status: LoadStatus,
    indicators: Vec<Indicator>,
    summary: Option<DashboardSummary>,
    payload: Option<RawSeriesPayload>,
    previous_kind: Option<ChartKind>,
    loaded_at: Option<DateTime<Utc>>,
}

pub struct DashboardSession {
    backend: Arc<dyn Backend>,
    insights: Arc<dyn InsightGenerator>,
    state: RwLock<State>,
}

impl DashboardSession {
    pub fn new(backend: Arc<dyn Backend>, insights: Arc<dyn InsightGenerator>) -> Self {
        Self {
            backend,
            insights,
            state: RwLock::new(State::default()),
        }
    }

    pub fn selection(&self) -> Selection {
        self.state.read().selection.clone()
    }

    pub fn status(&self) -> LoadStatus {
        self.state.read().status.clone()
    }

    pub fn indicators(&self) -> Vec<Indicator> {
        self.state.read().indicators.clone()
    }

    pub fn summary(&self) -> Option<DashboardSummary> {
        self.state.read().summary.clone()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let s = self.state.read();
        SessionSnapshot {
            selection: s.selection.clone(),
            status: s.status.clone(),
            generation: s.generation,
            loaded_at: s.loaded_at,
        }
    }

    /// Load indicators and summary. A failure puts the whole page into `Failed`.
    pub async fn bootstrap(&self) -> Result<(), FetchError> {
        self.state.write().status = LoadStatus::Loading;
        match load_dashboard(self.backend.as_ref()).await {
            Ok(boot) => {
                let mut s = self.state.write();
                s.indicators = boot.indicators;
                s.summary = Some(boot.summary);
                s.status = LoadStatus::Idle;
                Ok(())
            }
            Err(e) => {
                self.state.write().status = LoadStatus::Failed {
                    message: e.user_message(),
                };
                Err(e)
            }
        }
    }

    /// Switch to `indicator_id` and start a new generation. The previous
    /// payload is dropped so nothing derived from it can be shown.
    pub fn begin_fetch(&self, indicator_id: &str) -> RequestToken {
        let mut s = self.state.write();
        s.generation += 1;
        s.selection.indicator_id = Some(indicator_id.to_string());
        s.payload = None;
        s.status = LoadStatus::Loading;
        RequestToken {
            generation: s.generation,
            indicator_id: indicator_id.to_string(),
        }
    }

    /// Apply a fetch outcome if `token` is still current; otherwise discard it.
    pub fn apply_result(
        &self,
        token: &RequestToken,
        result: Result<RawSeriesPayload, FetchError>,
    ) -> Applied {
        let mut s = self.state.write();
        if token.generation != s.generation {
            ensure_described();
            counter!(SESSION_STALE_RESPONSES_TOTAL).increment(1);
            tracing::debug!(
                indicator = %token.indicator_id,
                token = token.generation,
                current = s.generation,
                "discarding stale response"
            );
            return Applied::Stale;
        }
        match result {
            Ok(payload) => {
                s.payload = Some(payload);
                s.status = LoadStatus::Ready;
                s.loaded_at = Some(Utc::now());
            }
            Err(e) => {
                s.payload = None;
                s.status = LoadStatus::Failed {
                    message: e.user_message(),
                };
            }
        }
        Applied::Current
    }

    pub async fn select_indicator(&self, indicator_id: &str) -> Applied {
        let token = self.begin_fetch(indicator_id);
        let result = self.backend.time_series(indicator_id).await;
        self.apply_result(&token, result)
    }

    /// Re-issue the fetch for the current indicator, if one is selected.
    pub async fn retry(&self) -> Option<Applied> {
        let id = self.state.read().selection.indicator_id.clone()?;
        Some(self.select_indicator(&id).await)
    }

    pub fn select_chart_kind(&self, kind: ChartKind) {
        self.state.write().selection.chart_kind = kind;
    }

    pub fn select_tab(&self, tab: Tab) {
        self.state.write().selection.tab = tab;
    }

    pub fn set_time_range(&self, range: TimeRange) {
        self.state.write().selection.time_range = range;
    }

    /// Back to the initial selection. Bootstrap data is kept; in-flight
    /// fetches become stale.
    pub fn reset(&self) {
        let mut s = self.state.write();
        s.generation += 1;
        s.selection = Selection::default();
        s.payload = None;
        s.previous_kind = None;
        s.loaded_at = None;
        s.status = LoadStatus::Idle;
    }

    /// Derive the chart panel from current state. The resolved kind becomes
    /// the fallback for the next derivation.
    pub fn view(&self) -> ChartView {
        let mut s = self.state.write();
        let payload = s
            .payload
            .as_ref()
            .map(|p| p.within(s.selection.time_range));
        let indicator = s
            .selection
            .indicator_id
            .as_deref()
            .and_then(|id| s.indicators.iter().find(|i| i.id == id));
        let view = ChartView::derive(
            s.selection.chart_kind,
            s.previous_kind,
            payload.as_ref(),
            indicator,
            self.insights.as_ref(),
        );
        s.previous_kind = Some(view.effective_kind);
        view
    }
}
