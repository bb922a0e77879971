// src/chart/payload.rs
//! # Raw series payload
//! The backend describes one indicator's observations in several loosely
//! typed shapes at once. This module decodes that JSON into explicit
//! variants so the classifier and transformer never guess at field types.
//!
//! - Decoding never fails: wrong types collapse to empty defaults.
//! - A value is numeric only when it is a finite JSON number.
//! - `bar_data` is either `Nested` (some entry carries a `data` array) or `Flat`.
//! - Pie data is either `Preshaped` (`pie_data`) or `DerivedFromBar`.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Year used when neither the record nor the payload names one.
pub const FALLBACK_YEAR: i32 = 2024;

/// Label used for bar/pie entries that carry neither `country` nor `name`.
pub const UNKNOWN_LABEL: &str = "Unknown";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct RawSeriesPayload {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub line_data: Vec<LineSlice>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bar_data: Vec<BarEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pie_data: Vec<PieSlice>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub years: Vec<i32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub countries: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub raw_data: Vec<Observation>,
}

/// One time slice of `line_data`: entity name → value, in backend order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineSlice {
    /// Present when the slice carried its own `year`/`period` key.
    pub year: Option<i32>,
    pub values: Vec<(String, f64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarEntry {
    #[serde(rename = "country")]
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<BarData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
}

/// The `data` field of a bar entry: a per-year series or a bare number.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BarData {
    Series(Vec<SeriesPoint>),
    Scalar(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub value: Option<f64>,
    pub year: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieSlice {
    pub name: String,
    pub value: Option<f64>,
}

/// A single row of `raw_data`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    pub year: Option<i32>,
    pub country: String,
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// How `bar_data` is laid out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BarShape<'a> {
    /// At least one entry carries a nested per-year `data` array.
    Nested(&'a [BarEntry]),
    /// Every entry is a single `{country, value}` record.
    Flat(&'a [BarEntry]),
}

/// Where pie/radial slices come from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PieSource<'a> {
    Preshaped(&'a [PieSlice]),
    DerivedFromBar(&'a [BarEntry]),
}

impl BarEntry {
    /// Nested per-year points, if the entry has them.
    pub fn series(&self) -> Option<&[SeriesPoint]> {
        match &self.data {
            Some(BarData::Series(points)) => Some(points),
            _ => None,
        }
    }

    pub fn resolved_value(&self) -> Option<f64> {
        resolve_entry_value(self)
    }
}

/// Resolve a single number for a bar entry, in this order:
/// 1. its direct numeric `value`;
/// 2. the `value` of the first element of its nested `data` array;
/// 3. `data` itself when it is a bare number.
pub fn resolve_entry_value(entry: &BarEntry) -> Option<f64> {
    if let Some(v) = entry.value {
        return Some(v);
    }
    match &entry.data {
        Some(BarData::Series(points)) => points.first().and_then(|p| p.value),
        Some(BarData::Scalar(v)) => Some(*v),
        None => None,
    }
}

impl RawSeriesPayload {
    /// Decode an arbitrary JSON value. Never fails.
    pub fn from_value(v: &Value) -> Self {
        let Some(obj) = v.as_object() else {
            return Self::default();
        };

        Self {
            line_data: array(obj, "line_data")
                .filter_map(Value::as_object)
                .map(decode_line_slice)
                .collect(),
            bar_data: array(obj, "bar_data")
                .filter_map(Value::as_object)
                .map(decode_bar_entry)
                .collect(),
            pie_data: array(obj, "pie_data")
                .filter_map(Value::as_object)
                .map(|o| PieSlice {
                    name: label_of(o, &["name", "country"])
                        .unwrap_or_else(|| UNKNOWN_LABEL.to_string()),
                    value: o.get("value").and_then(numeric),
                })
                .collect(),
            years: array(obj, "years").filter_map(year_of).collect(),
            countries: array(obj, "countries")
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            raw_data: array(obj, "raw_data")
                .filter_map(Value::as_object)
                .map(|o| Observation {
                    year: o.get("year").and_then(year_of),
                    country: label_of(o, &["country", "name"])
                        .unwrap_or_else(|| UNKNOWN_LABEL.to_string()),
                    value: o.get("value").and_then(numeric),
                    unit: o.get("unit").and_then(Value::as_str).map(str::to_string),
                    notes: o.get("notes").and_then(Value::as_str).map(str::to_string),
                })
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.line_data.is_empty()
            && self.bar_data.is_empty()
            && self.pie_data.is_empty()
            && self.raw_data.is_empty()
    }

    pub fn first_year(&self) -> Option<i32> {
        self.years.first().copied()
    }

    /// Shape of `bar_data`, or `None` when it is empty.
    pub fn bar_shape(&self) -> Option<BarShape<'_>> {
        if self.bar_data.is_empty() {
            return None;
        }
        if self.bar_data.iter().any(|e| e.series().is_some()) {
            Some(BarShape::Nested(&self.bar_data))
        } else {
            Some(BarShape::Flat(&self.bar_data))
        }
    }

    /// Source of pie slices, or `None` when neither `pie_data` nor `bar_data` has entries.
    pub fn pie_source(&self) -> Option<PieSource<'_>> {
        if !self.pie_data.is_empty() {
            Some(PieSource::Preshaped(&self.pie_data))
        } else if !self.bar_data.is_empty() {
            Some(PieSource::DerivedFromBar(&self.bar_data))
        } else {
            None
        }
    }

    /// Year a line slice stands for: its own label, else the aligned entry of `years`.
    pub fn slice_year(&self, index: usize) -> Option<i32> {
        self.line_data
            .get(index)
            .and_then(|s| s.year)
            .or_else(|| self.years.get(index).copied())
    }

    /// Latest year mentioned anywhere in the payload.
    pub fn latest_year(&self) -> Option<i32> {
        let from_slices = (0..self.line_data.len()).filter_map(|i| self.slice_year(i));
        let from_bars = self.bar_data.iter().flat_map(|e| {
            e.series()
                .unwrap_or_default()
                .iter()
                .filter_map(|p| p.year)
                .chain(e.year)
        });
        let from_raw = self.raw_data.iter().filter_map(|o| o.year);
        self.years
            .iter()
            .copied()
            .chain(from_slices)
            .chain(from_bars)
            .chain(from_raw)
            .max()
    }

    /// Restrict every year-bearing field to `range`. Pie data carries no years and is kept.
    pub fn within(&self, range: TimeRange) -> RawSeriesPayload {
        let cutoff = match range {
            TimeRange::All => return self.clone(),
            TimeRange::LastYears(n) => match self.latest_year() {
                Some(latest) => latest.saturating_sub(i32::from(n.max(1)) - 1),
                None => return self.clone(),
            },
        };
        let keep = |y: Option<i32>| y.map_or(true, |y| y >= cutoff);

        let line_data = self
            .line_data
            .iter()
            .enumerate()
            .filter(|(i, _)| keep(self.slice_year(*i)))
            .map(|(_, s)| s.clone())
            .collect();

        let bar_data = self
            .bar_data
            .iter()
            .filter_map(|e| match &e.data {
                Some(BarData::Series(points)) => {
                    let kept: Vec<SeriesPoint> =
                        points.iter().copied().filter(|p| keep(p.year)).collect();
                    if kept.is_empty() {
                        None
                    } else {
                        Some(BarEntry {
                            data: Some(BarData::Series(kept)),
                            ..e.clone()
                        })
                    }
                }
                _ => keep(e.year).then(|| e.clone()),
            })
            .collect();

        RawSeriesPayload {
            line_data,
            bar_data,
            pie_data: self.pie_data.clone(),
            years: self.years.iter().copied().filter(|y| *y >= cutoff).collect(),
            countries: self.countries.clone(),
            raw_data: self
                .raw_data
                .iter()
                .filter(|o| keep(o.year))
                .cloned()
                .collect(),
        }
    }
}

impl From<Value> for RawSeriesPayload {
    fn from(v: Value) -> Self {
        Self::from_value(&v)
    }
}

impl Serialize for LineSlice {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len() + 1))?;
        if let Some(y) = self.year {
            map.serialize_entry("year", &y)?;
        }
        for (k, v) in &self.values {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Window of years a dashboard is looking at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TimeRange {
    #[default]
    All,
    /// The latest N years present in the payload.
    LastYears(u16),
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeRange::All => f.write_str("all"),
            TimeRange::LastYears(n) => write!(f, "{n}y"),
        }
    }
}

impl FromStr for TimeRange {
    type Err = String;

    /// Accepts `all` or `<n>y` (e.g. `5y`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim().to_ascii_lowercase();
        if t.is_empty() || t == "all" {
            return Ok(TimeRange::All);
        }
        t.strip_suffix('y')
            .and_then(|n| n.parse::<u16>().ok())
            .filter(|n| *n > 0)
            .map(TimeRange::LastYears)
            .ok_or_else(|| format!("invalid time range '{s}'"))
    }
}

impl TryFrom<String> for TimeRange {
    type Error = String;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<TimeRange> for String {
    fn from(r: TimeRange) -> Self {
        r.to_string()
    }
}

/* ----------------------------
Decoding helpers
---------------------------- */

/// Finite JSON number, or `None`.
pub(crate) fn numeric(v: &Value) -> Option<f64> {
    v.as_f64().filter(|x| x.is_finite())
}

/// Year from an integer (or integral float) or an integer string.
pub(crate) fn year_of(v: &Value) -> Option<i32> {
    match v {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .and_then(|y| i32::try_from(y).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// First of `keys` holding a non-empty string (numbers are stringified).
pub(crate) fn label_of(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| match obj.get(*k) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn array<'a>(obj: &'a Map<String, Value>, key: &str) -> impl Iterator<Item = &'a Value> {
    obj.get(key)
        .and_then(Value::as_array)
        .map(|a| a.iter())
        .into_iter()
        .flatten()
}

const SLICE_LABEL_KEYS: [&str; 2] = ["year", "period"];

fn decode_line_slice(o: &Map<String, Value>) -> LineSlice {
    let year = SLICE_LABEL_KEYS
        .iter()
        .find_map(|k| o.get(*k).and_then(year_of));
    let values = o
        .iter()
        .filter(|(k, _)| !SLICE_LABEL_KEYS.contains(&k.as_str()))
        .filter_map(|(k, v)| numeric(v).map(|n| (k.clone(), n)))
        .collect();
    LineSlice { year, values }
}

fn decode_bar_entry(o: &Map<String, Value>) -> BarEntry {
    let data = match o.get("data") {
        Some(Value::Array(points)) => Some(BarData::Series(
            points
                .iter()
                .filter_map(Value::as_object)
                .map(|p| SeriesPoint {
                    value: p.get("value").and_then(numeric),
                    year: p.get("year").and_then(year_of),
                })
                .collect(),
        )),
        Some(v) => numeric(v).map(BarData::Scalar),
        None => None,
    };
    BarEntry {
        label: label_of(o, &["country", "name"]).unwrap_or_else(|| UNKNOWN_LABEL.to_string()),
        value: o.get("value").and_then(numeric),
        data,
        year: o.get("year").and_then(year_of),
    }
}
