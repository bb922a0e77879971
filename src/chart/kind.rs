// src/chart/kind.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Chart representations the renderer knows how to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
    Area,
    Bar,
    Pie,
    Radial,
}

/// Order in which alternatives are tried when the selected kind cannot be drawn.
pub const FALLBACK_ORDER: [ChartKind; 5] = [
    ChartKind::Bar,
    ChartKind::Line,
    ChartKind::Area,
    ChartKind::Pie,
    ChartKind::Radial,
];

impl ChartKind {
    pub const ALL: [ChartKind; 5] = [
        ChartKind::Line,
        ChartKind::Area,
        ChartKind::Bar,
        ChartKind::Pie,
        ChartKind::Radial,
    ];

    /// Parse a kind token case-insensitively. Unknown tokens yield `None`.
    pub fn parse(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "line" => Some(Self::Line),
            "area" => Some(Self::Area),
            "bar" => Some(Self::Bar),
            "pie" => Some(Self::Pie),
            "radial" => Some(Self::Radial),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Line => "line",
            Self::Area => "area",
            Self::Bar => "bar",
            Self::Pie => "pie",
            Self::Radial => "radial",
        }
    }

    /// Pie and radial charts show shares of a whole rather than observations.
    pub fn is_proportional(self) -> bool {
        matches!(self, Self::Pie | Self::Radial)
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownChartKind(pub String);

impl fmt::Display for UnknownChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown chart kind '{}'", self.0)
    }
}

impl std::error::Error for UnknownChartKind {}

impl FromStr for ChartKind {
    type Err = UnknownChartKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| UnknownChartKind(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive_and_rejects_unknown() {
        assert_eq!(ChartKind::parse(" Pie "), Some(ChartKind::Pie));
        assert_eq!(ChartKind::parse("RADIAL"), Some(ChartKind::Radial));
        assert_eq!(ChartKind::parse("scatter"), None);
        assert!("donut".parse::<ChartKind>().is_err());
    }

    #[test]
    fn fallback_order_starts_with_bar_and_covers_every_kind() {
        assert_eq!(FALLBACK_ORDER[0], ChartKind::Bar);
        for k in ChartKind::ALL {
            assert!(FALLBACK_ORDER.contains(&k));
        }
    }

    #[test]
    fn serde_uses_lowercase_tokens() {
        let s = serde_json::to_string(&ChartKind::Area).unwrap();
        assert_eq!(s, "\"area\"");
        let k: ChartKind = serde_json::from_str("\"bar\"").unwrap();
        assert_eq!(k, ChartKind::Bar);
    }
}
