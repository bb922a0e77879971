// src/story.rs
//! # Stories
//! Static narrative content: domains, stories, nested sections with optional
//! inline charts (already shaped, never normalized), and the bespoke `data`
//! object the chart builders read. The bundled catalog and an optional file
//! override share this one schema.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::builders::BuilderRegistry;
use crate::indicator::StoryIndicator;

const BUNDLED_STORIES: &str = include_str!("../data/stories.json");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub domain: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub indicators: Vec<StoryIndicator>,
    /// Builder chart ids this story wants to show, in display order.
    #[serde(default)]
    pub charts: Vec<String>,
    #[serde(default)]
    pub sections: Vec<StorySection>,
    /// Bespoke per-story data read by the chart builders.
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorySection {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart: Option<InlineChart>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subsections: Vec<StorySection>,
}

/// A chart embedded directly in a section; its data is passed through as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlineChart {
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
}

/// Listing view of a story (no sections or data).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StorySummary {
    pub id: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub domain: String,
    pub summary: String,
}

impl Story {
    /// Inline charts of every section, depth-first in reading order.
    pub fn inline_charts(&self) -> Vec<&InlineChart> {
        fn walk<'a>(sections: &'a [StorySection], out: &mut Vec<&'a InlineChart>) {
            for s in sections {
                if let Some(c) = &s.chart {
                    out.push(c);
                }
                walk(&s.subsections, out);
            }
        }
        let mut out = Vec::new();
        walk(&self.sections, &mut out);
        out
    }

    /// Ids from `charts` whose builder produces a chart for this story's data.
    pub fn available_charts<'a>(&'a self, registry: &BuilderRegistry) -> Vec<&'a str> {
        self.charts
            .iter()
            .map(String::as_str)
            .filter(|id| registry.build(id, &self.data).is_some())
            .collect()
    }

    pub fn summary_view(&self) -> StorySummary {
        StorySummary {
            id: self.id.clone(),
            title: self.title.clone(),
            subtitle: self.subtitle.clone(),
            domain: self.domain.clone(),
            summary: self.summary.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoryCatalog {
    #[serde(default)]
    pub domains: Vec<Domain>,
    #[serde(default)]
    pub stories: Vec<Story>,
}

impl StoryCatalog {
    /// Catalog compiled into the binary.
    pub fn bundled() -> Result<Self> {
        Self::parse(BUNDLED_STORIES).context("parsing bundled stories")
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading stories from {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("parsing stories from {}", path.display()))
    }

    /// Override file when configured, else the bundled catalog.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_path(p),
            None => Self::bundled(),
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        let catalog: StoryCatalog = serde_json::from_str(s)?;
        catalog.validate()?;
        Ok(catalog)
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for s in &self.stories {
            if !seen.insert(s.id.as_str()) {
                bail!("duplicate story id '{}'", s.id);
            }
        }
        for s in &self.stories {
            if !self.domains.is_empty() && self.domain(&s.domain).is_none() {
                bail!("story '{}' refers to unknown domain '{}'", s.id, s.domain);
            }
        }
        Ok(())
    }

    pub fn story(&self, id: &str) -> Option<&Story> {
        self.stories.iter().find(|s| s.id == id)
    }

    pub fn domain(&self, id: &str) -> Option<&Domain> {
        self.domains.iter().find(|d| d.id == id)
    }

    /// Stories, optionally restricted to one domain.
    pub fn stories_in(&self, domain: Option<&str>) -> Vec<&Story> {
        self.stories
            .iter()
            .filter(|s| domain.map_or(true, |d| s.domain == d))
            .collect()
    }
}
