// src/chart/mod.rs
//! Data shape normalization & chart eligibility pipeline:
//! payload decoding → classification → fallback resolution → records.

pub mod eligibility;
pub mod kind;
pub mod payload;
pub mod selector;
pub mod transform;

pub use eligibility::{is_chart_type_valid, ChartEligibility};
pub use kind::{ChartKind, FALLBACK_ORDER};
pub use payload::{RawSeriesPayload, TimeRange};
pub use selector::{effective_kind, ChartView, ViewState};
pub use transform::{transform_data_for_chart, ChartRecord};
