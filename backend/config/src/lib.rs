//! `docsight-config`: runtime configuration for the docsight client.
//!
//! Provides:
//! - Typed config schema (service connection, logging, formatting heuristics)
//! - YAML loading from `~/.docsight/config.yaml`
//! - `${ENV_VAR}` substitution and the `DOCSIGHT_API_URL` override
//! - Default value application
//! - Validation report

pub mod defaults;
pub mod env;
pub mod io;
pub mod schema;
pub mod validation;

pub use defaults::apply_all_defaults;
pub use env::{apply_env_overrides, contains_env_var_reference, resolve_env_vars, resolve_env_vars_with, MissingEnvVarError, API_URL_ENV};
pub use io::{config_dir, config_file_path, load_config};
pub use schema::{ApiConfig, DocsightConfig, LoggingConfig};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// Load, substitute env vars, apply overrides and defaults, and validate.
///
/// This is the main entry point for loading a config at runtime. Validation
/// problems are logged, not returned.
pub async fn load_and_prepare(path: &Path) -> Result<DocsightConfig> {
    let raw = load_config(path).await?;
    prepare(raw, &std::env::vars().collect())
}

/// [`load_and_prepare`] on an already-parsed tree with an explicit environment.
pub fn prepare(raw: Value, env: &HashMap<String, String>) -> Result<DocsightConfig> {
    let value = resolve_env_vars_with(&raw, env).context("Failed to resolve env vars in config")?;

    let config: DocsightConfig =
        serde_json::from_value(value).context("Failed to deserialize config after processing")?;
    let config = apply_env_overrides(config, env);
    let config = apply_all_defaults(config);

    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }

    Ok(config)
}
