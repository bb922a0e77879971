// src/builders/structure.rs
use serde_json::{json, Value};

use super::{labelled_values, round1, row, ChartConfig};
use crate::chart::kind::ChartKind;

pub const INVESTMENT_SHARE: &str = "investment-share";
pub const SECTOR_COMPOSITION: &str = "sector-composition";

/// Slices with a strictly positive share, largest first.
fn positive_slices(v: Vec<(String, f64)>) -> Option<(Vec<(String, f64)>, f64)> {
    let mut slices: Vec<(String, f64)> = v.into_iter().filter(|(_, s)| *s > 0.0).collect();
    if slices.is_empty() {
        return None;
    }
    slices.sort_by(|a, b| b.1.total_cmp(&a.1));
    let total = slices.iter().map(|(_, s)| s).sum();
    Some((slices, total))
}

/// Expects `investment: {components: [{name, share}]}`.
pub fn investment_share(data: &Value) -> Option<ChartConfig> {
    let (slices, total) =
        positive_slices(labelled_values(data, "/investment/components", "name", "share")?)?;
    let (top, top_v) = &slices[0];

    let insights = vec![
        format!(
            "{top} is the largest component at {:.0}% of investment",
            top_v / total * 100.0
        ),
        "Business investment is the component most sensitive to uncertainty".to_string(),
    ];

    Some(ChartConfig {
        id: INVESTMENT_SHARE.to_string(),
        title: "What makes up investment".to_string(),
        subtitle: "Share of gross fixed capital formation by component".to_string(),
        kind: ChartKind::Pie,
        data: slices
            .iter()
            .map(|(n, v)| row([("name", json!(n)), ("value", json!(round1(*v)))]))
            .collect(),
        insights,
        category: "economy".to_string(),
    })
}

/// Expects `sectors: [{sector, share}]`.
pub fn sector_composition(data: &Value) -> Option<ChartConfig> {
    let (slices, total) = positive_slices(labelled_values(data, "/sectors", "sector", "share")?)?;
    let (top, top_v) = &slices[0];

    let insights = vec![
        format!("{top} accounts for {:.0}% of output", top_v / total * 100.0),
        format!("{} sectors shown", slices.len()),
        "Services dominate output, where productivity gains are hardest to measure".to_string(),
    ];

    Some(ChartConfig {
        id: SECTOR_COMPOSITION.to_string(),
        title: "Sector composition of output".to_string(),
        subtitle: "Gross value added by sector (% of total)".to_string(),
        kind: ChartKind::Radial,
        data: slices
            .iter()
            .map(|(n, v)| row([("name", json!(n)), ("value", json!(round1(*v)))]))
            .collect(),
        insights,
        category: "economy".to_string(),
    })
}
