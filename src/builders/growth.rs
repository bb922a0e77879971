// src/builders/growth.rs
use serde_json::{json, Map, Value};

use super::{number_list, round1, row, year_list, ChartConfig};
use crate::chart::kind::ChartKind;

pub const GDP_GROWTH_TRAJECTORY: &str = "gdp-growth-trajectory";
pub const WAGE_GROWTH_REAL: &str = "wage-growth-real";

/// Expects `gdp_growth: {years[], values[], trend?[]}`.
pub fn gdp_growth_trajectory(data: &Value) -> Option<ChartConfig> {
    let years = year_list(data, "/gdp_growth/years")?;
    let values = number_list(data, "/gdp_growth/values")?;
    let trend = number_list(data, "/gdp_growth/trend").unwrap_or_default();

    let mut rows: Vec<Map<String, Value>> = Vec::new();
    let mut points: Vec<(i32, f64, Option<f64>)> = Vec::new();
    for (i, year) in years.iter().enumerate() {
        let Some(v) = values.get(i).copied().flatten() else {
            continue;
        };
        let t = trend.get(i).copied().flatten();
        let mut r = row([("year", json!(year)), ("growth", json!(v))]);
        if let Some(t) = t {
            r.insert("trend".into(), json!(t));
        }
        rows.push(r);
        points.push((*year, v, t));
    }
    let (first, last) = (points.first()?, points.last()?);

    let avg = points.iter().map(|p| p.1).sum::<f64>() / points.len() as f64;
    let weakest = points.iter().min_by(|a, b| a.1.total_cmp(&b.1))?;

    let mut insights = vec![
        format!(
            "Average annual growth of {:.1}% between {} and {}",
            avg, first.0, last.0
        ),
        format!("Weakest year: {} at {:.1}%", weakest.0, weakest.1),
    ];
    if let Some((year, v, Some(t))) = points.iter().rev().find(|p| p.2.is_some()).copied() {
        let gap = round1(t - v);
        if gap > 0.0 {
            insights.push(format!("Growth ran {gap:.1} points below trend in {year}"));
        } else {
            insights.push(format!("Growth was at or above trend in {year}"));
        }
    }
    insights.push("Growth never returned to its pre-2008 trajectory".to_string());

    Some(ChartConfig {
        id: GDP_GROWTH_TRAJECTORY.to_string(),
        title: "GDP growth trajectory".to_string(),
        subtitle: "Annual real GDP growth against the long-run trend (%)".to_string(),
        kind: ChartKind::Line,
        data: rows,
        insights,
        category: "economy".to_string(),
    })
}

/// Expects `wages: {years[], nominal[], inflation[]}`; real growth is nominal minus inflation.
pub fn wage_growth_real(data: &Value) -> Option<ChartConfig> {
    let years = year_list(data, "/wages/years")?;
    let nominal = number_list(data, "/wages/nominal")?;
    let inflation = number_list(data, "/wages/inflation")?;

    let mut rows = Vec::new();
    let mut real_values = Vec::new();
    for (i, year) in years.iter().enumerate() {
        let (Some(n), Some(p)) = (
            nominal.get(i).copied().flatten(),
            inflation.get(i).copied().flatten(),
        ) else {
            continue;
        };
        let real = round1(n - p);
        rows.push(row([
            ("year", json!(year)),
            ("nominal", json!(n)),
            ("inflation", json!(p)),
            ("real", json!(real)),
        ]));
        real_values.push(real);
    }
    if rows.is_empty() {
        return None;
    }

    let falling = real_values.iter().filter(|r| **r < 0.0).count();
    let cumulative: f64 = real_values.iter().sum();
    let insights = vec![
        format!("Real pay fell in {falling} of {} years", real_values.len()),
        format!("Cumulative real change of {cumulative:.1} points over the period"),
        "Nominal pay rises masked falling living standards after 2008".to_string(),
    ];

    Some(ChartConfig {
        id: WAGE_GROWTH_REAL.to_string(),
        title: "Real wage growth".to_string(),
        subtitle: "Nominal pay growth less consumer price inflation (%)".to_string(),
        kind: ChartKind::Area,
        data: rows,
        insights,
        category: "labour".to_string(),
    })
}
