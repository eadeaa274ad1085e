//! Config validation with user-facing messages.

use crate::schema::DocsightConfig;
use thiserror::Error;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// Every error and warning found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

pub fn validate(config: &DocsightConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_api(config, &mut report);
    validate_logging(config, &mut report);
    validate_formatting(config, &mut report);
    report
}

fn validate_api(config: &DocsightConfig, report: &mut ValidationReport) {
    let Some(api) = &config.api else { return };
    if let Some(url) = &api.base_url {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            report.error("api.baseUrl", format!("'{url}' is not an http(s) URL"));
        }
    }
    if api.timeout_secs == Some(0) {
        report.error("api.timeoutSecs", "timeout must be at least 1 second");
    }
}

fn validate_logging(config: &DocsightConfig, report: &mut ValidationReport) {
    let Some(level) = config.logging.as_ref().and_then(|l| l.level.as_deref()) else {
        return;
    };
    if !LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
        report.warn(
            "logging.level",
            format!("unknown level '{level}'; RUST_LOG-style directives are passed through as-is"),
        );
    }
}

fn validate_formatting(config: &DocsightConfig, report: &mut ValidationReport) {
    let Some(fmt) = &config.formatting else { return };
    if fmt.lookahead_lines == 0 {
        report.error("formatting.lookaheadLines", "must be at least 1");
    }
    if !(fmt.code_ratio_threshold > 0.0 && fmt.code_ratio_threshold <= 1.0) {
        report.error("formatting.codeRatioThreshold", "must be in (0, 1]");
    }
    if fmt.max_input_bytes == Some(0) {
        report.error("formatting.maxInputBytes", "must be positive; omit it for no limit");
    }
    if fmt.min_code_chars == 0 {
        report.warn("formatting.minCodeChars", "0 turns every code-like line into a code block");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ApiConfig, LoggingConfig};
    use docsight_markdown::FormatOptions;

    #[test]
    fn test_default_config_is_valid() {
        let config = crate::apply_all_defaults(DocsightConfig::default());
        let report = validate(&config);
        assert!(report.is_valid());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_bad_values_reported() {
        let config = DocsightConfig {
            api: Some(ApiConfig {
                base_url: Some("ftp://files".into()),
                timeout_secs: Some(0),
            }),
            logging: Some(LoggingConfig {
                level: Some("loud".into()),
                ..Default::default()
            }),
            formatting: Some(FormatOptions {
                lookahead_lines: 0,
                code_ratio_threshold: 1.5,
                min_code_chars: 0,
                ..FormatOptions::default()
            }),
        };
        let report = validate(&config);
        let paths: Vec<_> = report.errors.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "api.baseUrl",
                "api.timeoutSecs",
                "formatting.lookaheadLines",
                "formatting.codeRatioThreshold",
            ]
        );
        assert_eq!(report.warnings.len(), 2);
    }
}
