// src/config.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "config/dashboard.toml";
pub const DEFAULT_BACKEND_BASE_URL: &str = "http://localhost:8000";

pub const ENV_CONFIG_PATH: &str = "DASHBOARD_CONFIG_PATH";
pub const ENV_BACKEND_BASE_URL: &str = "BACKEND_BASE_URL";
pub const ENV_BACKEND_TIMEOUT_MS: &str = "BACKEND_TIMEOUT_MS";
pub const ENV_STORIES_PATH: &str = "STORIES_PATH";
pub const ENV_SIMULATE_MISSING_PERIODS: &str = "SIMULATE_MISSING_PERIODS";

const MIN_TIMEOUT_MS: u64 = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base URL of the REST backend, without a trailing slash.
    pub backend_base_url: String,
    /// Overall per-request timeout.
    pub request_timeout_ms: u64,
    pub connect_timeout_ms: u64,
    /// Story catalog override; the bundled catalog is used when absent.
    pub stories_path: Option<PathBuf>,
    /// Fill missing past/present/future periods with labelled synthetic values.
    pub simulate_missing_periods: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend_base_url: DEFAULT_BACKEND_BASE_URL.to_string(),
            request_timeout_ms: 10_000,
            connect_timeout_ms: 4_000,
            stories_path: None,
            simulate_missing_periods: true,
        }
    }
}

impl AppConfig {
    /// Load from an explicit path. Supports TOML or JSON (by extension).
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let cfg: AppConfig = if ext == "json" {
            serde_json::from_str(&content)
                .with_context(|| format!("parsing json config {}", path.display()))?
        } else {
            toml::from_str(&content)
                .with_context(|| format!("parsing toml config {}", path.display()))?
        };
        Ok(cfg.sanitized())
    }

    /// Resolve config using env var + fallbacks, then apply env overrides:
    /// 1) $DASHBOARD_CONFIG_PATH (must exist)
    /// 2) config/dashboard.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        let base = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from(&pb)?
        } else {
            let p = PathBuf::from(DEFAULT_CONFIG_PATH);
            if p.exists() {
                Self::load_from(&p)?
            } else {
                Self::default()
            }
        };
        Ok(base.with_env_overrides())
    }

    /// Apply `BACKEND_BASE_URL`, `BACKEND_TIMEOUT_MS`, `STORIES_PATH` and
    /// `SIMULATE_MISSING_PERIODS`. Unparseable values are ignored.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var(ENV_BACKEND_BASE_URL) {
            if !url.trim().is_empty() {
                self.backend_base_url = url;
            }
        }
        match std::env::var(ENV_BACKEND_TIMEOUT_MS).map(|v| v.trim().parse::<u64>()) {
            Ok(Ok(ms)) => self.request_timeout_ms = ms,
            Ok(Err(e)) => tracing::warn!(error = %e, "ignoring invalid {ENV_BACKEND_TIMEOUT_MS}"),
            Err(_) => {}
        }
        if let Ok(p) = std::env::var(ENV_STORIES_PATH) {
            if !p.trim().is_empty() {
                self.stories_path = Some(PathBuf::from(p));
            }
        }
        if let Ok(v) = std::env::var(ENV_SIMULATE_MISSING_PERIODS) {
            match v.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.simulate_missing_periods = true,
                "0" | "false" | "no" | "off" => self.simulate_missing_periods = false,
                other => tracing::warn!(value = other, "ignoring invalid {ENV_SIMULATE_MISSING_PERIODS}"),
            }
        }
        self.sanitized()
    }

    fn sanitized(mut self) -> Self {
        self.backend_base_url = self.backend_base_url.trim().trim_end_matches('/').to_string();
        if self.backend_base_url.is_empty() {
            self.backend_base_url = DEFAULT_BACKEND_BASE_URL.to_string();
        }
        self.request_timeout_ms = self.request_timeout_ms.max(MIN_TIMEOUT_MS);
        self.connect_timeout_ms = self
            .connect_timeout_ms
            .clamp(MIN_TIMEOUT_MS, self.request_timeout_ms);
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}
