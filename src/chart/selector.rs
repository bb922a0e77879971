// src/chart/selector.rs
//! # Visualization selector
//! Resolves the chart kind that is actually rendered and derives the full
//! view (records, summary, insights) from it.
//!
//! Policy: the user's kind wins when drawable; otherwise the first drawable
//! kind of `FALLBACK_ORDER`; otherwise nothing is drawable and the view is an
//! explicit empty state that keeps the previous kind. Records are always
//! derived from the resolved kind, never from the raw selection.

use serde::Serialize;

use crate::chart::eligibility::ChartEligibility;
use crate::chart::kind::{ChartKind, FALLBACK_ORDER};
use crate::chart::payload::RawSeriesPayload;
use crate::chart::transform::{transform_data_for_chart, ChartRecord};
use crate::indicator::Indicator;
use crate::insights::InsightGenerator;

pub const NO_DATA_MESSAGE: &str = "No data available";
pub const NOT_ENOUGH_DATA_MESSAGE: &str = "Not enough data for this chart";

/// Outcome of resolving the selected kind against a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Selected(ChartKind),
    Fallback(ChartKind),
    Unavailable,
}

pub fn resolve(selected: ChartKind, eligibility: &ChartEligibility) -> Resolution {
    if eligibility.is_valid(selected) {
        return Resolution::Selected(selected);
    }
    FALLBACK_ORDER
        .into_iter()
        .find(|k| eligibility.is_valid(*k))
        .map_or(Resolution::Unavailable, Resolution::Fallback)
}

/// Kind to render. When nothing is drawable the previous kind is kept
/// (or the selection, if there was none).
pub fn effective_kind(
    selected: ChartKind,
    previous: Option<ChartKind>,
    payload: Option<&RawSeriesPayload>,
) -> ChartKind {
    match resolve(selected, &ChartEligibility::of(payload)) {
        Resolution::Selected(k) | Resolution::Fallback(k) => k,
        Resolution::Unavailable => previous.unwrap_or(selected),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ViewState {
    Ready,
    Empty { message: String },
}

/// Everything the renderer needs for one chart panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartView {
    pub selected_kind: ChartKind,
    pub effective_kind: ChartKind,
    pub fallback_applied: bool,
    pub state: ViewState,
    pub eligibility: ChartEligibility,
    pub records: Vec<ChartRecord>,
    pub summary: String,
    pub insights: Vec<String>,
}

impl ChartView {
    pub fn derive(
        selected: ChartKind,
        previous: Option<ChartKind>,
        payload: Option<&RawSeriesPayload>,
        indicator: Option<&Indicator>,
        generator: &dyn InsightGenerator,
    ) -> Self {
        let eligibility = ChartEligibility::of(payload);
        let resolution = resolve(selected, &eligibility);

        let (effective_kind, fallback_applied) = match resolution {
            Resolution::Selected(k) => (k, false),
            Resolution::Fallback(k) => (k, true),
            Resolution::Unavailable => (previous.unwrap_or(selected), false),
        };

        let empty = |message: &str| Self {
            selected_kind: selected,
            effective_kind,
            fallback_applied,
            state: ViewState::Empty {
                message: message.to_string(),
            },
            eligibility,
            records: Vec::new(),
            summary: String::new(),
            insights: Vec::new(),
        };

        let Some(p) = payload.filter(|p| !p.is_empty()) else {
            return empty(NO_DATA_MESSAGE);
        };
        if resolution == Resolution::Unavailable {
            return empty(NOT_ENOUGH_DATA_MESSAGE);
        }

        let records = transform_data_for_chart(effective_kind, Some(p));
        if records.is_empty() {
            return empty(NOT_ENOUGH_DATA_MESSAGE);
        }
        let summary = generator.summary(effective_kind, &records, indicator, Some(p));
        let insights = generator.insights(effective_kind, &records, indicator);

        Self {
            selected_kind: selected,
            effective_kind,
            fallback_applied,
            state: ViewState::Ready,
            eligibility,
            records,
            summary,
            insights,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state == ViewState::Ready
    }
}
