// src/chart/transform.rs
//! Record transformer: converts a `RawSeriesPayload` into the flat record
//! list a generic chart component consumes. Always returns a `Vec`, empty
//! when the payload is missing or the kind has nothing to show.

use serde::Serialize;

use crate::chart::kind::ChartKind;
use crate::chart::payload::{
    BarEntry, BarShape, PieSource, RawSeriesPayload, FALLBACK_YEAR,
};

/// Canonical unit handed to the renderer.
///
/// Observation-style kinds (line/area/bar) get `{country, value, year}`;
/// proportional kinds (pie/radial) get `{name, value}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChartRecord {
    Observation {
        country: String,
        value: f64,
        year: i32,
    },
    Slice {
        name: String,
        value: f64,
    },
}

impl ChartRecord {
    pub fn category(&self) -> &str {
        match self {
            ChartRecord::Observation { country, .. } => country,
            ChartRecord::Slice { name, .. } => name,
        }
    }

    pub fn value(&self) -> f64 {
        match self {
            ChartRecord::Observation { value, .. } | ChartRecord::Slice { value, .. } => *value,
        }
    }

    pub fn year(&self) -> Option<i32> {
        match self {
            ChartRecord::Observation { year, .. } => Some(*year),
            ChartRecord::Slice { .. } => None,
        }
    }
}

pub fn transform_data_for_chart(
    kind: ChartKind,
    payload: Option<&RawSeriesPayload>,
) -> Vec<ChartRecord> {
    let Some(p) = payload else {
        return Vec::new();
    };
    match kind {
        ChartKind::Line | ChartKind::Area => first_slice_records(p),
        ChartKind::Bar => bar_records(p),
        ChartKind::Pie | ChartKind::Radial => pie_records(p),
    }
}

/// String-token variant: unknown kinds yield no records.
pub fn transform_token(token: &str, payload: Option<&RawSeriesPayload>) -> Vec<ChartRecord> {
    match ChartKind::parse(token) {
        Some(kind) => transform_data_for_chart(kind, payload),
        None => Vec::new(),
    }
}

/// Only the first time slice of `line_data` is represented, one record per entity.
fn first_slice_records(p: &RawSeriesPayload) -> Vec<ChartRecord> {
    let Some(slice) = p.line_data.first() else {
        return Vec::new();
    };
    let year = p.slice_year(0).unwrap_or(FALLBACK_YEAR);
    slice
        .values
        .iter()
        .map(|(entity, value)| ChartRecord::Observation {
            country: entity.clone(),
            value: *value,
            year,
        })
        .collect()
}

/// Every slice of `line_data` as one record per (entity, year).
pub fn line_series(payload: Option<&RawSeriesPayload>) -> Vec<ChartRecord> {
    let Some(p) = payload else {
        return Vec::new();
    };
    p.line_data
        .iter()
        .enumerate()
        .flat_map(|(i, slice)| {
            let year = p.slice_year(i).unwrap_or(FALLBACK_YEAR);
            slice
                .values
                .iter()
                .map(move |(entity, value)| ChartRecord::Observation {
                    country: entity.clone(),
                    value: *value,
                    year,
                })
        })
        .collect()
}

fn bar_records(p: &RawSeriesPayload) -> Vec<ChartRecord> {
    let default_year = p.first_year().unwrap_or(FALLBACK_YEAR);
    match p.bar_shape() {
        None => Vec::new(),
        Some(BarShape::Flat(entries)) => entries
            .iter()
            .map(|e| flat_record(e, default_year))
            .collect(),
        Some(BarShape::Nested(entries)) => entries
            .iter()
            .flat_map(|e| match e.series() {
                Some(points) => points
                    .iter()
                    .map(|pt| ChartRecord::Observation {
                        country: e.label.clone(),
                        value: pt.value.unwrap_or(0.0),
                        year: pt.year.or(e.year).unwrap_or(default_year),
                    })
                    .collect::<Vec<_>>(),
                // Mixed payloads: an entity without a nested array still gets its row.
                None => vec![flat_record(e, default_year)],
            })
            .collect(),
    }
}

fn flat_record(e: &BarEntry, default_year: i32) -> ChartRecord {
    ChartRecord::Observation {
        country: e.label.clone(),
        value: e.resolved_value().unwrap_or(0.0),
        year: e.year.unwrap_or(default_year),
    }
}

fn pie_records(p: &RawSeriesPayload) -> Vec<ChartRecord> {
    match p.pie_source() {
        None => Vec::new(),
        Some(PieSource::Preshaped(slices)) => {
            let out: Vec<ChartRecord> = slices
                .iter()
                .filter_map(|s| positive(s.value).map(|v| (s.name.clone(), v)))
                .map(|(name, value)| ChartRecord::Slice { name, value })
                .collect();
            // No usable preshaped slice: derive from bar_data like the classifier does.
            if out.is_empty() {
                derived_pie_records(&p.bar_data)
            } else {
                out
            }
        }
        Some(PieSource::DerivedFromBar(entries)) => derived_pie_records(entries),
    }
}

fn derived_pie_records(entries: &[BarEntry]) -> Vec<ChartRecord> {
    entries
        .iter()
        .filter_map(|e| positive(e.resolved_value()).map(|v| (e.label.clone(), v)))
        .map(|(name, value)| ChartRecord::Slice { name, value })
        .collect()
}

fn positive(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite() && *x > 0.0)
}
