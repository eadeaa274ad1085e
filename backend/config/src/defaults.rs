//! Config defaults: fills every unset field with its default value.

use docsight_markdown::FormatOptions;

use crate::schema::{ApiConfig, DocsightConfig, LoggingConfig};

/// Analysis service address when neither the file nor the environment sets one.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Connect and request timeout for the analysis service.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: DocsightConfig) -> DocsightConfig {
    let config = apply_api_defaults(config);
    let config = apply_logging_defaults(config);
    apply_formatting_defaults(config)
}

fn apply_api_defaults(mut config: DocsightConfig) -> DocsightConfig {
    let api = config.api.get_or_insert_with(ApiConfig::default);
    if api.base_url.as_deref().map_or(true, |url| url.trim().is_empty()) {
        api.base_url = Some(DEFAULT_API_URL.to_string());
    }
    if api.timeout_secs.is_none() {
        api.timeout_secs = Some(DEFAULT_TIMEOUT_SECS);
    }
    config
}

fn apply_logging_defaults(mut config: DocsightConfig) -> DocsightConfig {
    let logging = config.logging.get_or_insert_with(LoggingConfig::default);
    if logging.level.is_none() {
        logging.level = Some(DEFAULT_LOG_LEVEL.to_string());
    }
    if logging.json.is_none() {
        logging.json = Some(false);
    }
    config
}

fn apply_formatting_defaults(mut config: DocsightConfig) -> DocsightConfig {
    config.formatting.get_or_insert_with(FormatOptions::default);
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_empty_config() {
        let config = apply_all_defaults(DocsightConfig::default());
        let api = config.api.as_ref().unwrap();
        assert_eq!(api.base_url.as_deref(), Some(DEFAULT_API_URL));
        assert_eq!(api.timeout_secs, Some(DEFAULT_TIMEOUT_SECS));
        assert_eq!(config.logging.as_ref().unwrap().level.as_deref(), Some("info"));
        assert_eq!(config.formatting, Some(FormatOptions::default()));
    }

    #[test]
    fn test_defaults_keep_explicit_values() {
        let config = DocsightConfig {
            api: Some(ApiConfig {
                base_url: Some("https://api.example.org".into()),
                timeout_secs: None,
            }),
            ..Default::default()
        };
        let config = apply_all_defaults(config);
        assert_eq!(config.base_url(), "https://api.example.org");
        assert_eq!(config.api.unwrap().timeout_secs, Some(120));
    }

    #[test]
    fn test_blank_url_replaced() {
        let config = DocsightConfig {
            api: Some(ApiConfig {
                base_url: Some("  ".into()),
                timeout_secs: Some(5),
            }),
            ..Default::default()
        };
        assert_eq!(apply_all_defaults(config).base_url(), DEFAULT_API_URL);
    }
}
