// src/insights.rs
//! # Chart insights
//! Turns a transformed record list into a one-paragraph summary and a list
//! of short insight strings. Callers must cope with an empty summary and
//! any number of insights (including none).

use std::collections::BTreeMap;

use crate::chart::kind::ChartKind;
use crate::chart::payload::RawSeriesPayload;
use crate::chart::transform::ChartRecord;
use crate::indicator::{format_with_unit, Indicator};

pub trait InsightGenerator: Send + Sync {
    fn summary(
        &self,
        kind: ChartKind,
        records: &[ChartRecord],
        indicator: Option<&Indicator>,
        payload: Option<&RawSeriesPayload>,
    ) -> String;

    fn insights(
        &self,
        kind: ChartKind,
        records: &[ChartRecord],
        indicator: Option<&Indicator>,
    ) -> Vec<String>;
}

/// Descriptive statistics over the records (extremes, mean, shares, changes).
#[derive(Debug, Clone, Copy, Default)]
pub struct StatisticalInsights;

struct Stats<'a> {
    n: usize,
    max: &'a ChartRecord,
    min: &'a ChartRecord,
    mean: f64,
    total: f64,
}

fn stats(records: &[ChartRecord]) -> Option<Stats<'_>> {
    let first = records.first()?;
    let (mut max, mut min, mut total) = (first, first, 0.0);
    for r in records {
        if r.value() > max.value() {
            max = r;
        }
        if r.value() < min.value() {
            min = r;
        }
        total += r.value();
    }
    Some(Stats {
        n: records.len(),
        max,
        min,
        mean: total / records.len() as f64,
        total,
    })
}

fn year_span(records: &[ChartRecord]) -> Option<(i32, i32)> {
    let years = records.iter().filter_map(ChartRecord::year);
    let lo = years.clone().min()?;
    let hi = years.max()?;
    Some((lo, hi))
}

fn period_phrase(span: Option<(i32, i32)>) -> String {
    match span {
        Some((lo, hi)) if lo == hi => format!(" in {lo}"),
        Some((lo, hi)) => format!(" from {lo} to {hi}"),
        None => String::new(),
    }
}

fn year_suffix(r: &ChartRecord) -> String {
    r.year().map(|y| format!(" in {y}")).unwrap_or_default()
}

fn share_pct(part: f64, total: f64) -> f64 {
    if total > 0.0 {
        part / total * 100.0
    } else {
        0.0
    }
}

fn distinct_categories(records: &[ChartRecord]) -> usize {
    let mut seen: Vec<&str> = records.iter().map(ChartRecord::category).collect();
    seen.sort_unstable();
    seen.dedup();
    seen.len()
}

/// Largest absolute first-to-last change among categories observed in two or more years.
fn largest_change(records: &[ChartRecord]) -> Option<(&str, f64, i32, i32)> {
    let mut by_cat: BTreeMap<&str, Vec<(i32, f64)>> = BTreeMap::new();
    for r in records {
        if let Some(y) = r.year() {
            by_cat.entry(r.category()).or_default().push((y, r.value()));
        }
    }
    by_cat
        .into_iter()
        .filter_map(|(cat, mut pts)| {
            pts.sort_by_key(|(y, _)| *y);
            let (y0, v0) = *pts.first()?;
            let (y1, v1) = *pts.last()?;
            (y1 > y0).then_some((cat, v1 - v0, y0, y1))
        })
        .max_by(|a, b| a.1.abs().total_cmp(&b.1.abs()))
}

impl InsightGenerator for StatisticalInsights {
    fn summary(
        &self,
        kind: ChartKind,
        records: &[ChartRecord],
        indicator: Option<&Indicator>,
        _payload: Option<&RawSeriesPayload>,
    ) -> String {
        let Some(s) = stats(records) else {
            return String::new();
        };
        let name = indicator.map_or("This indicator", |i| i.name.as_str());
        let unit = indicator.map_or("", |i| i.unit.as_str());

        if kind.is_proportional() {
            return format!(
                "{name}: breakdown across {} categories. {} accounts for {:.1}% of the total.",
                s.n,
                s.max.category(),
                share_pct(s.max.value(), s.total)
            );
        }

        let period = period_phrase(year_span(records));
        let cats = distinct_categories(records);
        if cats == 1 {
            return format!(
                "{name}: {} at {}{period}.",
                s.max.category(),
                format_with_unit(s.max.value(), unit)
            );
        }
        format!(
            "{name} compared across {cats} categories{period}. Highest: {} at {}; lowest: {} at {}.",
            s.max.category(),
            format_with_unit(s.max.value(), unit),
            s.min.category(),
            format_with_unit(s.min.value(), unit)
        )
    }

    fn insights(
        &self,
        kind: ChartKind,
        records: &[ChartRecord],
        indicator: Option<&Indicator>,
    ) -> Vec<String> {
        let Some(s) = stats(records) else {
            return Vec::new();
        };
        let unit = indicator.map_or("", |i| i.unit.as_str());
        let fmt = |v: f64| format_with_unit(v, unit);
        let mut out = Vec::new();

        if kind.is_proportional() {
            out.push(format!(
                "{} holds the largest share at {:.1}%",
                s.max.category(),
                share_pct(s.max.value(), s.total)
            ));
            if s.n >= 2 {
                out.push(format!(
                    "Smallest share: {} at {:.1}%",
                    s.min.category(),
                    share_pct(s.min.value(), s.total)
                ));
            }
            if s.n >= 3 {
                let mut values: Vec<f64> = records.iter().map(ChartRecord::value).collect();
                values.sort_by(|a, b| b.total_cmp(a));
                let top3: f64 = values.iter().take(3).sum();
                out.push(format!(
                    "Top three categories account for {:.1}% of the total",
                    share_pct(top3, s.total)
                ));
            }
            return out;
        }

        out.push(format!(
            "Highest value: {} at {}{}",
            s.max.category(),
            fmt(s.max.value()),
            year_suffix(s.max)
        ));
        if s.n >= 2 {
            out.push(format!(
                "Lowest value: {} at {}{}",
                s.min.category(),
                fmt(s.min.value()),
                year_suffix(s.min)
            ));
            out.push(format!("Average across {} records: {}", s.n, fmt(s.mean)));
            out.push(format!(
                "Spread between highest and lowest: {}",
                fmt(s.max.value() - s.min.value())
            ));
        }
        if let Some((cat, delta, y0, y1)) = largest_change(records) {
            let dir = if delta >= 0.0 { "rose" } else { "fell" };
            out.push(format!(
                "Largest change: {cat} {dir} by {} between {y0} and {y1}",
                fmt(delta.abs())
            ));
        }
        let negatives = records.iter().filter(|r| r.value() < 0.0).count();
        if negatives > 0 {
            out.push(format!("{negatives} of {} values are negative", s.n));
        }
        out
    }
}
