// src/chart/eligibility.rs
//! Shape classifier: decides, per chart kind, whether a payload carries
//! enough usable data to be drawn. Pure predicates, no I/O.

use serde::Serialize;

use crate::chart::kind::ChartKind;
use crate::chart::payload::{BarEntry, PieSlice, RawSeriesPayload};

/// Whether `kind` can be drawn from `payload`. A missing payload is never drawable.
pub fn is_chart_type_valid(kind: ChartKind, payload: Option<&RawSeriesPayload>) -> bool {
    let Some(p) = payload else {
        return false;
    };
    match kind {
        ChartKind::Line | ChartKind::Area => !p.line_data.is_empty(),
        ChartKind::Bar => !p.bar_data.is_empty(),
        ChartKind::Pie | ChartKind::Radial => {
            has_positive_slice(&p.pie_data) || has_positive_entry(&p.bar_data)
        }
    }
}

/// String-token variant used at the HTTP boundary: unknown kinds are invalid.
pub fn is_chart_token_valid(token: &str, payload: Option<&RawSeriesPayload>) -> bool {
    ChartKind::parse(token).is_some_and(|k| is_chart_type_valid(k, payload))
}

fn has_positive_slice(slices: &[PieSlice]) -> bool {
    slices.iter().any(|s| s.value.is_some_and(|v| v > 0.0))
}

fn has_positive_entry(entries: &[BarEntry]) -> bool {
    entries
        .iter()
        .any(|e| e.resolved_value().is_some_and(|v| v > 0.0))
}

/// Eligibility of every chart kind for one payload, evaluated together so a
/// selector can enable/disable its options in one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChartEligibility {
    pub line: bool,
    pub area: bool,
    pub bar: bool,
    pub pie: bool,
    pub radial: bool,
}

impl ChartEligibility {
    pub fn of(payload: Option<&RawSeriesPayload>) -> Self {
        Self {
            line: is_chart_type_valid(ChartKind::Line, payload),
            area: is_chart_type_valid(ChartKind::Area, payload),
            bar: is_chart_type_valid(ChartKind::Bar, payload),
            pie: is_chart_type_valid(ChartKind::Pie, payload),
            radial: is_chart_type_valid(ChartKind::Radial, payload),
        }
    }

    pub fn is_valid(&self, kind: ChartKind) -> bool {
        match kind {
            ChartKind::Line => self.line,
            ChartKind::Area => self.area,
            ChartKind::Bar => self.bar,
            ChartKind::Pie => self.pie,
            ChartKind::Radial => self.radial,
        }
    }

    pub fn any(&self) -> bool {
        ChartKind::ALL.iter().any(|k| self.is_valid(*k))
    }

    pub fn valid_kinds(&self) -> Vec<ChartKind> {
        ChartKind::ALL
            .into_iter()
            .filter(|k| self.is_valid(*k))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(v: serde_json::Value) -> RawSeriesPayload {
        RawSeriesPayload::from_value(&v)
    }

    #[test]
    fn null_payload_is_never_valid() {
        for k in ChartKind::ALL {
            assert!(!is_chart_type_valid(k, None), "{k} should be invalid for null");
        }
        assert!(!ChartEligibility::of(None).any());
    }

    #[test]
    fn line_and_area_need_line_data() {
        let p = payload(json!({"bar_data": [{"country": "DE", "value": 1.0}]}));
        assert!(!is_chart_type_valid(ChartKind::Line, Some(&p)));
        assert!(!is_chart_type_valid(ChartKind::Area, Some(&p)));

        let p = payload(json!({"line_data": [{"DE": 0.2}], "years": [2024]}));
        assert!(is_chart_type_valid(ChartKind::Line, Some(&p)));
        assert!(is_chart_type_valid(ChartKind::Area, Some(&p)));
    }

    #[test]
    fn pie_falls_back_to_positive_bar_entries() {
        let p = payload(json!({"bar_data": [
            {"country": "DE", "value": -2.0},
            {"country": "FR", "data": [{"value": 0.5, "year": 2020}]}
        ]}));
        assert!(is_chart_type_valid(ChartKind::Pie, Some(&p)));
        assert!(is_chart_type_valid(ChartKind::Radial, Some(&p)));

        let p = payload(json!({"bar_data": [{"country": "DE", "value": 0}]}));
        assert!(!is_chart_type_valid(ChartKind::Pie, Some(&p)));
        assert!(is_chart_type_valid(ChartKind::Bar, Some(&p)));
    }

    #[test]
    fn preshaped_pie_needs_one_positive_slice() {
        let p = payload(json!({"pie_data": [{"name": "A", "value": 0}]}));
        assert!(!is_chart_type_valid(ChartKind::Pie, Some(&p)));
        let p = payload(json!({"pie_data": [{"name": "A", "value": 0}, {"name": "B", "value": 2}]}));
        assert!(is_chart_type_valid(ChartKind::Pie, Some(&p)));
    }

    #[test]
    fn presence_alone_makes_line_and_bar_eligible() {
        let p = payload(json!({"line_data": [{}], "years": [2024]}));
        assert!(is_chart_type_valid(ChartKind::Line, Some(&p)));
        assert!(is_chart_type_valid(ChartKind::Area, Some(&p)));

        let p = payload(json!({"bar_data": [{"country": "DE", "data": []}]}));
        assert!(is_chart_type_valid(ChartKind::Bar, Some(&p)));
        assert!(ChartEligibility::of(Some(&p)).any());
    }

    #[test]
    fn unknown_token_is_invalid() {
        let p = payload(json!({"bar_data": [{"country": "DE", "value": 1.0}]}));
        assert!(!is_chart_token_valid("scatter", Some(&p)));
        assert!(is_chart_token_valid("BAR", Some(&p)));
    }

    #[test]
    fn eligibility_lists_valid_kinds_in_canonical_order() {
        let p = payload(json!({
            "line_data": [{"DE": 1.0}],
            "bar_data": [{"country": "DE", "value": 1.0}]
        }));
        let e = ChartEligibility::of(Some(&p));
        assert_eq!(
            e.valid_kinds(),
            vec![
                ChartKind::Line,
                ChartKind::Area,
                ChartKind::Bar,
                ChartKind::Pie,
                ChartKind::Radial
            ]
        );
    }
}
