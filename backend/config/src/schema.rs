//! docsight configuration schema.
//!
//! Every field is optional in the file; [`crate::apply_all_defaults`] fills
//! the gaps and the accessors below read the resolved values.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use docsight_markdown::FormatOptions;

use crate::defaults::{DEFAULT_API_URL, DEFAULT_LOG_LEVEL, DEFAULT_TIMEOUT_SECS};

/// Root of `config.yaml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocsightConfig {
    /// Analysis service connection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api: Option<ApiConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,

    /// Response formatting heuristics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatting: Option<FormatOptions>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    /// Directory for the rolling NDJSON log; file logging is off when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json: Option<bool>,
}

impl DocsightConfig {
    pub fn base_url(&self) -> &str {
        self.api
            .as_ref()
            .and_then(|api| api.base_url.as_deref())
            .unwrap_or(DEFAULT_API_URL)
    }

    pub fn timeout(&self) -> Duration {
        let secs = self
            .api
            .as_ref()
            .and_then(|api| api.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Duration::from_secs(secs)
    }

    pub fn log_level(&self) -> &str {
        self.logging
            .as_ref()
            .and_then(|l| l.level.as_deref())
            .unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_dir(&self) -> Option<PathBuf> {
        self.logging.as_ref().and_then(|l| l.dir.clone())
    }

    pub fn log_json(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.json).unwrap_or(false)
    }

    pub fn format_options(&self) -> FormatOptions {
        self.formatting.clone().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors_fall_back_to_defaults() {
        let config = DocsightConfig::default();
        assert_eq!(config.base_url(), "http://localhost:8000");
        assert_eq!(config.timeout(), Duration::from_secs(120));
        assert_eq!(config.log_level(), "info");
        assert_eq!(config.log_dir(), None);
        assert!(!config.log_json());
        assert_eq!(config.format_options(), FormatOptions::default());
    }

    #[test]
    fn test_camel_case_yaml() {
        let yaml = "api:\n  baseUrl: https://docs.example.org\n  timeoutSecs: 30\nformatting:\n  lookaheadLines: 40\n";
        let config: DocsightConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.base_url(), "https://docs.example.org");
        assert_eq!(config.timeout(), Duration::from_secs(30));
        let opts = config.format_options();
        assert_eq!(opts.lookahead_lines, 40);
        assert_eq!(opts.max_blank_run, 2);
    }
}
