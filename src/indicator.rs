// src/indicator.rs
//! Reference data served by the backend: indicators, the dashboard summary,
//! related visualizations and per-story indicator lists.
//!
//! Upstream records are loosely typed (numeric ids, null units, tag lists
//! serialized as strings), so the deserializers here are tolerant.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Indicator {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub unit: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub category: String,
    #[serde(default, deserialize_with = "tags_field")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    #[serde(default)]
    pub total_indicators: u64,
    #[serde(default)]
    pub total_countries: u64,
    #[serde(default)]
    pub total_data_points: u64,
    /// Indicator count per category.
    #[serde(default)]
    pub categories: BTreeMap<String, u64>,
    /// Story count per domain.
    #[serde(default)]
    pub domains: BTreeMap<String, u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualEntity {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub title: String,
    #[serde(rename = "type", default, deserialize_with = "string_or_empty")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Indicator reference attached to a story. Shared by the bundled story
/// catalog and the backend `story-data` endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryIndicator {
    #[serde(deserialize_with = "id_string")]
    pub indicator_id: String,
    pub name: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub unit: String,
}

impl Indicator {
    /// Unit-aware number formatting: `%` is attached, other units follow a space.
    pub fn format_value(&self, v: f64) -> String {
        format_with_unit(v, &self.unit)
    }
}

pub fn format_with_unit(v: f64, unit: &str) -> String {
    let unit = unit.trim();
    if unit.is_empty() {
        format!("{v:.2}")
    } else if unit == "%" {
        format!("{v:.2}%")
    } else {
        format!("{v:.2} {unit}")
    }
}

static QUOTED_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"'([^']*)'|"([^"]*)""#).expect("quoted item regex"));

/// Parse a tag list that may arrive as a JSON array, a JSON string, a
/// single-quoted list literal or a bare word. Unparseable input becomes a
/// single tag; empty input becomes no tags. Nothing is ever evaluated.
pub fn format_tags(raw: &str) -> Vec<String> {
    let t = raw.trim();
    if t.is_empty() {
        return Vec::new();
    }
    match serde_json::from_str::<Value>(t) {
        Ok(Value::Array(items)) => return tags_from_items(&items),
        Ok(Value::String(s)) => return clean(vec![s]),
        Ok(_) => return vec![t.to_string()],
        Err(_) => {}
    }
    if t.starts_with('[') && t.ends_with(']') {
        let items: Vec<String> = QUOTED_ITEM
            .captures_iter(t)
            .filter_map(|c| c.get(1).or_else(|| c.get(2)))
            .map(|m| m.as_str().to_string())
            .collect();
        let items = clean(items);
        if !items.is_empty() {
            return items;
        }
    }
    vec![t.to_string()]
}

/// Same as [`format_tags`] but starting from an already-decoded JSON value.
pub fn format_tags_value(v: &Value) -> Vec<String> {
    match v {
        Value::Null => Vec::new(),
        Value::Array(items) => tags_from_items(items),
        Value::String(s) => format_tags(s),
        other => vec![other.to_string()],
    }
}

fn tags_from_items(items: &[Value]) -> Vec<String> {
    clean(
        items
            .iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                Value::Bool(b) => Some(b.to_string()),
                _ => None,
            })
            .collect(),
    )
}

fn clean(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn id_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    match Value::deserialize(d)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!("unsupported id: {other}"))),
    }
}

fn string_or_empty<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

fn tags_field<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    Ok(format_tags_value(&Value::deserialize(d)?))
}
