// src/builders/productivity.rs
use serde_json::{json, Value};

use super::{labelled_values, round1, row, ChartConfig};
use crate::chart::kind::ChartKind;

pub const PRODUCTIVITY_INTERNATIONAL: &str = "productivity-international";
pub const REGIONAL_PRODUCTIVITY: &str = "regional-productivity";

const DEFAULT_FOCUS: &str = "UK";

fn sorted_desc(mut v: Vec<(String, f64)>) -> Vec<(String, f64)> {
    v.sort_by(|a, b| b.1.total_cmp(&a.1));
    v
}

/// Expects `productivity: {focus?, countries: [{country, output_per_hour}]}`.
pub fn productivity_international(data: &Value) -> Option<ChartConfig> {
    let countries = sorted_desc(labelled_values(
        data,
        "/productivity/countries",
        "country",
        "output_per_hour",
    )?);
    let focus = data
        .pointer("/productivity/focus")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_FOCUS);

    let (leader, leader_value) = countries.first().cloned()?;
    let mut insights = vec![format!(
        "{leader} leads the comparison at {leader_value:.1} per hour worked"
    )];
    if let Some(rank) = countries
        .iter()
        .position(|(c, _)| c.eq_ignore_ascii_case(focus))
    {
        let focus_value = countries[rank].1;
        insights.push(format!(
            "{focus} ranks {} of {} on output per hour",
            rank + 1,
            countries.len()
        ));
        if rank > 0 && leader_value > 0.0 {
            let gap = (1.0 - focus_value / leader_value) * 100.0;
            insights.push(format!("{focus} is {gap:.0}% below {leader}"));
        }
    }
    insights.push(
        "Output per hour is the standard basis for international productivity comparisons"
            .to_string(),
    );

    Some(ChartConfig {
        id: PRODUCTIVITY_INTERNATIONAL.to_string(),
        title: "Productivity: international comparison".to_string(),
        subtitle: "GDP per hour worked, current prices (USD PPP)".to_string(),
        kind: ChartKind::Bar,
        data: countries
            .into_iter()
            .map(|(c, v)| row([("country", json!(c)), ("value", json!(round1(v)))]))
            .collect(),
        insights,
        category: "economy".to_string(),
    })
}

/// Expects `regions: [{region, productivity}]` (index, national average = 100).
pub fn regional_productivity(data: &Value) -> Option<ChartConfig> {
    let regions = sorted_desc(labelled_values(data, "/regions", "region", "productivity")?);
    let (top, top_v) = regions.first().cloned()?;
    let (bottom, bottom_v) = regions.last().cloned()?;

    let mut insights = Vec::new();
    if regions.len() >= 2 && bottom_v > 0.0 {
        insights.push(format!(
            "{top} is {:.1}x as productive as {bottom}",
            top_v / bottom_v
        ));
    }
    let above = regions.iter().filter(|(_, v)| *v > 100.0).count();
    insights.push(format!(
        "{above} of {} regions are above the national average",
        regions.len()
    ));
    insights.push("Regional gaps are wider than in most comparable economies".to_string());

    Some(ChartConfig {
        id: REGIONAL_PRODUCTIVITY.to_string(),
        title: "Regional productivity".to_string(),
        subtitle: "Output per hour by region (national average = 100)".to_string(),
        kind: ChartKind::Bar,
        data: regions
            .into_iter()
            .map(|(r, v)| row([("region", json!(r)), ("value", json!(round1(v)))]))
            .collect(),
        insights,
        category: "economy".to_string(),
    })
}
