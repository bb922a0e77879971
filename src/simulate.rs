// src/simulate.rs
//! Past / present / future period view for a story indicator.
//!
//! Periods the backend did not report can be filled with synthetic values.
//! Fabrication lives behind [`Fabricator`] and every value carries a
//! [`Provenance`], so a simulated number is never presented unmarked.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::BTreeMap;
use std::ops::Bound;

use crate::chart::payload::RawSeriesPayload;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Past,
    Present,
    Future,
}

impl Period {
    pub const ALL: [Period; 3] = [Period::Past, Period::Present, Period::Future];

    /// Other periods ordered by distance, used to pick an anchor value.
    fn neighbours(self) -> [Period; 2] {
        match self {
            Period::Past => [Period::Present, Period::Future],
            Period::Present => [Period::Past, Period::Future],
            Period::Future => [Period::Present, Period::Past],
        }
    }

    fn default_year(self, current_year: i32) -> i32 {
        match self {
            Period::Past => current_year - 1,
            Period::Present => current_year,
            Period::Future => current_year + 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Reported,
    Simulated,
    Missing,
}

impl Provenance {
    pub fn label(self) -> &'static str {
        match self {
            Provenance::Reported => "Reported",
            Provenance::Simulated => "Simulated",
            Provenance::Missing => "No data for this period",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReportedPoint {
    pub year: i32,
    pub value: f64,
}

/// Reported value per period, if the backend had one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ReportedPeriods {
    pub current_year: i32,
    pub past: Option<ReportedPoint>,
    pub present: Option<ReportedPoint>,
    pub future: Option<ReportedPoint>,
}

impl ReportedPeriods {
    pub fn new(current_year: i32) -> Self {
        Self {
            current_year,
            ..Default::default()
        }
    }

    pub fn get(&self, period: Period) -> Option<ReportedPoint> {
        match period {
            Period::Past => self.past,
            Period::Present => self.present,
            Period::Future => self.future,
        }
    }

    pub fn set(mut self, period: Period, point: ReportedPoint) -> Self {
        match period {
            Period::Past => self.past = Some(point),
            Period::Present => self.present = Some(point),
            Period::Future => self.future = Some(point),
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodValue {
    pub period: Period,
    pub year: i32,
    pub value: Option<f64>,
    pub provenance: Provenance,
    pub label: &'static str,
}

/// Produces a stand-in value for a period with no reported data.
pub trait Fabricator: Send + Sync {
    /// `anchor` is the nearest reported value, if any period was reported.
    fn fabricate(&self, period: Period, anchor: Option<f64>) -> f64;
}

/// Baseline used when no period has a reported value.
pub const DEFAULT_BASELINE: f64 = 50.0;
/// Relative jitter applied around the anchor.
pub const DEFAULT_JITTER: f64 = 0.1;

/// Random values within `±jitter` (relative) of the anchor.
pub struct RandomFabricator {
    rng: Mutex<StdRng>,
    jitter: f64,
}

impl RandomFabricator {
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_os_rng())
    }

    /// Deterministic sequence for tests.
    pub fn seeded(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            rng: Mutex::new(rng),
            jitter: DEFAULT_JITTER,
        }
    }

    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = if jitter.is_finite() { jitter.abs() } else { DEFAULT_JITTER };
        self
    }
}

impl Default for RandomFabricator {
    fn default() -> Self {
        Self::new()
    }
}

impl Fabricator for RandomFabricator {
    fn fabricate(&self, _period: Period, anchor: Option<f64>) -> f64 {
        let base = anchor.unwrap_or(DEFAULT_BASELINE);
        let spread = base.abs().max(1.0) * self.jitter;
        if spread <= 0.0 {
            return base;
        }
        base + self.rng.lock().random_range(-spread..=spread)
    }
}

/// One value per period. Gaps are fabricated when `fabricator` is given,
/// otherwise they stay `Missing`.
pub fn period_view(
    reported: &ReportedPeriods,
    fabricator: Option<&dyn Fabricator>,
) -> Vec<PeriodValue> {
    Period::ALL
        .into_iter()
        .map(|period| {
            if let Some(p) = reported.get(period) {
                return PeriodValue {
                    period,
                    year: p.year,
                    value: Some(p.value),
                    provenance: Provenance::Reported,
                    label: Provenance::Reported.label(),
                };
            }
            let year = period.default_year(reported.current_year);
            match fabricator {
                Some(f) => {
                    let anchor = period
                        .neighbours()
                        .into_iter()
                        .find_map(|n| reported.get(n))
                        .map(|p| p.value);
                    PeriodValue {
                        period,
                        year,
                        value: Some(f.fabricate(period, anchor)),
                        provenance: Provenance::Simulated,
                        label: Provenance::Simulated.label(),
                    }
                }
                None => PeriodValue {
                    period,
                    year,
                    value: None,
                    provenance: Provenance::Missing,
                    label: Provenance::Missing.label(),
                },
            }
        })
        .collect()
}

/// Split a payload's yearly values (mean across entities) into periods
/// around `current_year`: latest year before it, the year itself, and the
/// earliest year after it. Only values whose year comes from the payload
/// count; undated values are left out so they never pass as reported.
pub fn reported_periods(payload: &RawSeriesPayload, current_year: i32) -> ReportedPeriods {
    let mut source = dated_line_values(payload);
    if source.is_empty() {
        source = dated_bar_values(payload);
    }
    if source.is_empty() {
        source = payload
            .raw_data
            .iter()
            .filter_map(|o| Some((o.year?, o.value?)))
            .collect();
    }

    let mut by_year: BTreeMap<i32, (f64, u32)> = BTreeMap::new();
    for (year, value) in source {
        let slot = by_year.entry(year).or_insert((0.0, 0));
        slot.0 += value;
        slot.1 += 1;
    }

    let mean = |(&year, &(sum, n)): (&i32, &(f64, u32))| ReportedPoint {
        year,
        value: sum / f64::from(n),
    };
    ReportedPeriods {
        current_year,
        past: by_year.range(..current_year).next_back().map(mean),
        present: by_year.get_key_value(&current_year).map(mean),
        future: by_year
            .range((Bound::Excluded(current_year), Bound::Unbounded))
            .next()
            .map(mean),
    }
}

fn dated_line_values(p: &RawSeriesPayload) -> Vec<(i32, f64)> {
    p.line_data
        .iter()
        .enumerate()
        .filter_map(|(i, slice)| p.slice_year(i).map(|year| (year, slice)))
        .flat_map(|(year, slice)| slice.values.iter().map(move |(_, v)| (year, *v)))
        .collect()
}

fn dated_bar_values(p: &RawSeriesPayload) -> Vec<(i32, f64)> {
    let payload_year = p.first_year();
    p.bar_data
        .iter()
        .flat_map(|e| match e.series() {
            Some(points) => points
                .iter()
                .filter_map(|pt| Some((pt.year.or(e.year).or(payload_year)?, pt.value?)))
                .collect::<Vec<_>>(),
            None => e
                .year
                .or(payload_year)
                .zip(e.resolved_value())
                .into_iter()
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Fixed(f64);
    impl Fabricator for Fixed {
        fn fabricate(&self, _period: Period, anchor: Option<f64>) -> f64 {
            anchor.unwrap_or(0.0) + self.0
        }
    }

    #[test]
    fn reported_values_are_labelled_reported() {
        let r = ReportedPeriods::new(2024)
            .set(Period::Past, ReportedPoint { year: 2023, value: 1.0 })
            .set(Period::Present, ReportedPoint { year: 2024, value: 2.0 })
            .set(Period::Future, ReportedPoint { year: 2025, value: 3.0 });
        let view = period_view(&r, Some(&Fixed(100.0)));
        assert!(view.iter().all(|v| v.provenance == Provenance::Reported));
        assert!(view.iter().all(|v| v.label == "Reported"));
        assert_eq!(view[2].value, Some(3.0));
    }

    #[test]
    fn gaps_are_simulated_from_nearest_reported_value() {
        let r = ReportedPeriods::new(2024)
            .set(Period::Past, ReportedPoint { year: 2022, value: 4.0 });
        let view = period_view(&r, Some(&Fixed(0.5)));
        assert_eq!(view[0].provenance, Provenance::Reported);
        assert_eq!(view[1].provenance, Provenance::Simulated);
        assert_eq!(view[1].label, "Simulated");
        assert_eq!(view[1].value, Some(4.5));
        assert_eq!(view[1].year, 2024);
        assert_eq!(view[2].year, 2025);
    }

    #[test]
    fn disabled_simulation_leaves_explicit_gaps() {
        let view = period_view(&ReportedPeriods::new(2024), None);
        assert_eq!(view.len(), 3);
        for v in &view {
            assert_eq!(v.provenance, Provenance::Missing);
            assert!(v.value.is_none());
        }
    }

    #[test]
    fn random_fabricator_stays_within_jitter() {
        let f = RandomFabricator::seeded(7).with_jitter(0.2);
        for _ in 0..200 {
            let v = f.fabricate(Period::Future, Some(10.0));
            assert!((8.0..=12.0).contains(&v), "{v}");
        }
        let base = f.fabricate(Period::Past, None);
        assert!((DEFAULT_BASELINE - 10.0..=DEFAULT_BASELINE + 10.0).contains(&base));
        assert_eq!(RandomFabricator::seeded(1).with_jitter(0.0).fabricate(Period::Past, Some(3.0)), 3.0);
    }

    #[test]
    fn periods_split_around_current_year() {
        let p = RawSeriesPayload::from_value(&json!({
            "line_data": [
                {"DE": 1.0, "FR": 3.0},
                {"DE": 5.0, "FR": 7.0},
                {"DE": 9.0}
            ],
            "years": [2021, 2023, 2026]
        }));
        let r = reported_periods(&p, 2024);
        assert_eq!(r.past, Some(ReportedPoint { year: 2023, value: 6.0 }));
        assert_eq!(r.present, None);
        assert_eq!(r.future, Some(ReportedPoint { year: 2026, value: 9.0 }));
    }

    #[test]
    fn periods_fall_back_to_bar_then_raw_data() {
        let bars = RawSeriesPayload::from_value(&json!({
            "bar_data": [{"country": "UK", "data": [{"value": 2.0, "year": 2024}]}]
        }));
        assert_eq!(
            reported_periods(&bars, 2024).present,
            Some(ReportedPoint { year: 2024, value: 2.0 })
        );

        let raw = RawSeriesPayload::from_value(&json!({
            "raw_data": [{"year": 2020, "country": "UK", "value": 1.5}]
        }));
        let r = reported_periods(&raw, 2024);
        assert_eq!(r.past, Some(ReportedPoint { year: 2020, value: 1.5 }));
        assert!(r.present.is_none() && r.future.is_none());
    }

    #[test]
    fn undated_values_are_never_reported() {
        let p = RawSeriesPayload::from_value(&json!({
            "line_data": [{"DE": 1.0}, {"DE": 9.0}],
            "bar_data": [{"country": "DE", "value": 3.0}]
        }));
        let r = reported_periods(&p, 2026);
        assert_eq!(r, ReportedPeriods::new(2026));

        let view = period_view(&r, None);
        assert!(view.iter().all(|v| v.provenance == Provenance::Missing));
        let view = period_view(&r, Some(&Fixed(1.0)));
        assert!(view.iter().all(|v| v.provenance == Provenance::Simulated));
    }

    #[test]
    fn undated_line_slices_fall_through_to_dated_bars() {
        let p = RawSeriesPayload::from_value(&json!({
            "line_data": [{"DE": 1.0}],
            "bar_data": [
                {"country": "DE", "value": 4.0, "year": 2025},
                {"country": "FR", "value": 8.0}
            ]
        }));
        let r = reported_periods(&p, 2026);
        assert_eq!(r.past, Some(ReportedPoint { year: 2025, value: 4.0 }));
        assert!(r.present.is_none());
    }
}
