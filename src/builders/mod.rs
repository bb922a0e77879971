// src/builders/mod.rs
//! # Story chart builders
//! Each story ships a bespoke `data` object. A builder maps that object to
//! one named chart configuration, or `None` when the fields it needs are
//! absent (the caller then hides the chart).
//!
//! All builders share one contract, `fn(&Value) -> Option<ChartConfig>`,
//! and are looked up by chart id through `BuilderRegistry`.

pub mod growth;
pub mod productivity;
pub mod structure;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::chart::kind::ChartKind;
use crate::chart::payload::{label_of, numeric, year_of};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartConfig {
    pub id: String,
    pub title: String,
    pub subtitle: String,
    #[serde(rename = "type")]
    pub kind: ChartKind,
    pub data: Vec<Map<String, Value>>,
    pub insights: Vec<String>,
    pub category: String,
}

pub type ChartBuilder = fn(&Value) -> Option<ChartConfig>;

/// Chart id → builder, in registration order.
#[derive(Clone, Default)]
pub struct BuilderRegistry {
    builders: Vec<(&'static str, ChartBuilder)>,
}

impl BuilderRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry with every built-in story chart.
    pub fn with_defaults() -> Self {
        let mut r = Self::empty();
        r.register(growth::GDP_GROWTH_TRAJECTORY, growth::gdp_growth_trajectory);
        r.register(growth::WAGE_GROWTH_REAL, growth::wage_growth_real);
        r.register(
            productivity::PRODUCTIVITY_INTERNATIONAL,
            productivity::productivity_international,
        );
        r.register(
            productivity::REGIONAL_PRODUCTIVITY,
            productivity::regional_productivity,
        );
        r.register(structure::INVESTMENT_SHARE, structure::investment_share);
        r.register(structure::SECTOR_COMPOSITION, structure::sector_composition);
        r
    }

    /// Add or replace the builder for `id`.
    pub fn register(&mut self, id: &'static str, builder: ChartBuilder) {
        match self.builders.iter_mut().find(|(k, _)| *k == id) {
            Some(slot) => slot.1 = builder,
            None => self.builders.push((id, builder)),
        }
    }

    pub fn ids(&self) -> Vec<&'static str> {
        self.builders.iter().map(|(id, _)| *id).collect()
    }

    /// Build chart `id` from a story's data; unknown ids and missing fields give `None`.
    pub fn build(&self, id: &str, data: &Value) -> Option<ChartConfig> {
        self.builders
            .iter()
            .find(|(k, _)| *k == id)
            .and_then(|(_, f)| f(data))
    }

    /// Ids whose builder produces a chart for `data`.
    pub fn available(&self, data: &Value) -> Vec<&'static str> {
        self.builders
            .iter()
            .filter(|(_, f)| f(data).is_some())
            .map(|(id, _)| *id)
            .collect()
    }
}

impl std::fmt::Debug for BuilderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuilderRegistry")
            .field("ids", &self.ids())
            .finish()
    }
}

/* ----------------------------
Field helpers shared by builders
---------------------------- */

/// Array at `pointer` decoded element-wise as numbers (non-numbers become `None`).
pub(crate) fn number_list(data: &Value, pointer: &str) -> Option<Vec<Option<f64>>> {
    let arr = data.pointer(pointer)?.as_array()?;
    Some(arr.iter().map(numeric).collect())
}

pub(crate) fn year_list(data: &Value, pointer: &str) -> Option<Vec<i32>> {
    let arr = data.pointer(pointer)?.as_array()?;
    let years: Vec<i32> = arr.iter().filter_map(year_of).collect();
    (!years.is_empty()).then_some(years)
}

/// `(label, value)` pairs from an array of objects, skipping entries without a numeric value.
pub(crate) fn labelled_values(
    data: &Value,
    pointer: &str,
    label_key: &str,
    value_key: &str,
) -> Option<Vec<(String, f64)>> {
    let arr = data.pointer(pointer)?.as_array()?;
    let out: Vec<(String, f64)> = arr
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|o| {
            let label = label_of(o, &[label_key])?;
            let value = o.get(value_key).and_then(numeric)?;
            Some((label, value))
        })
        .collect();
    (!out.is_empty()).then_some(out)
}

pub(crate) fn row<const N: usize>(fields: [(&str, Value); N]) -> Map<String, Value> {
    fields
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

/// Round for display so rows don't carry float noise.
pub(crate) fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixed(_: &Value) -> Option<ChartConfig> {
        Some(ChartConfig {
            id: "fixed".into(),
            title: "Fixed".into(),
            subtitle: String::new(),
            kind: ChartKind::Bar,
            data: vec![],
            insights: vec![],
            category: "test".into(),
        })
    }

    #[test]
    fn unknown_id_is_none() {
        let r = BuilderRegistry::with_defaults();
        assert!(r.build("no-such-chart", &json!({})).is_none());
    }

    #[test]
    fn empty_data_makes_every_chart_unavailable() {
        let r = BuilderRegistry::with_defaults();
        assert!(r.available(&json!({})).is_empty());
        assert_eq!(r.ids().len(), 6);
    }

    #[test]
    fn register_replaces_existing_id() {
        let mut r = BuilderRegistry::with_defaults();
        r.register(growth::GDP_GROWTH_TRAJECTORY, fixed);
        assert_eq!(r.ids().len(), 6);
        let c = r.build(growth::GDP_GROWTH_TRAJECTORY, &json!({})).unwrap();
        assert_eq!(c.title, "Fixed");
    }

    #[test]
    fn labelled_values_skip_non_numeric() {
        let data = json!({"xs": [{"k": "a", "v": 1}, {"k": "b", "v": "2"}, {"v": 3}]});
        assert_eq!(
            labelled_values(&data, "/xs", "k", "v"),
            Some(vec![("a".to_string(), 1.0)])
        );
        assert_eq!(labelled_values(&data, "/missing", "k", "v"), None);
    }
}
