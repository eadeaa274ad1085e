//! Environment variable substitution and overrides for config values.
//!
//! `${VAR_NAME}` in any string value is replaced at load time. Only uppercase
//! `[A-Z_][A-Z0-9_]*` names are matched; `$${VAR}` escapes to a literal
//! `${VAR}`.

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;
use std::collections::HashMap;

use crate::schema::{ApiConfig, DocsightConfig};

/// Overrides `api.baseUrl` after substitution.
pub const API_URL_ENV: &str = "DOCSIGHT_API_URL";

/// A reference, optionally escaped by a leading `$`.
static ENV_VAR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\$?)\$\{([A-Z_][A-Z0-9_]*)\}").unwrap());

#[derive(Debug, thiserror::Error)]
#[error("Missing env var \"{var_name}\" referenced at config path: {config_path}")]
pub struct MissingEnvVarError {
    pub var_name: String,
    pub config_path: String,
}

/// Substitute `${VAR}` references from the process environment.
pub fn resolve_env_vars(value: &Value) -> Result<Value> {
    resolve_env_vars_with(value, &std::env::vars().collect())
}

/// Substitute `${VAR}` references from `env`. Unset or empty variables are
/// an error naming the config path that referenced them.
pub fn resolve_env_vars_with(value: &Value, env: &HashMap<String, String>) -> Result<Value> {
    Ok(substitute_value(value, env, "")?)
}

fn substitute_value(
    value: &Value,
    env: &HashMap<String, String>,
    path: &str,
) -> Result<Value, MissingEnvVarError> {
    match value {
        Value::String(s) => substitute_string(s, env, path).map(Value::String),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| substitute_value(v, env, &format!("{path}[{i}]")))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (key, v) in map {
                let child = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{path}.{key}")
                };
                out.insert(key.clone(), substitute_value(v, env, &child)?);
            }
            Ok(Value::Object(out))
        }
        other => Ok(other.clone()),
    }
}

fn substitute_string(
    s: &str,
    env: &HashMap<String, String>,
    path: &str,
) -> Result<String, MissingEnvVarError> {
    if !s.contains("${") {
        return Ok(s.to_string());
    }
    let mut missing = None;
    let out = ENV_VAR_PATTERN.replace_all(s, |caps: &Captures| {
        let name = &caps[2];
        if !caps[1].is_empty() {
            return format!("${{{name}}}");
        }
        match env.get(name).filter(|v| !v.is_empty()) {
            Some(value) => value.clone(),
            None => {
                missing.get_or_insert_with(|| MissingEnvVarError {
                    var_name: name.to_string(),
                    config_path: path.to_string(),
                });
                String::new()
            }
        }
    });
    match missing {
        Some(err) => Err(err),
        None => Ok(out.into_owned()),
    }
}

pub fn contains_env_var_reference(s: &str) -> bool {
    ENV_VAR_PATTERN
        .captures_iter(s)
        .any(|caps| caps[1].is_empty())
}

/// Apply environment overrides that win over the file.
pub fn apply_env_overrides(mut config: DocsightConfig, env: &HashMap<String, String>) -> DocsightConfig {
    if let Some(url) = env.get(API_URL_ENV).filter(|v| !v.trim().is_empty()) {
        config.api.get_or_insert_with(ApiConfig::default).base_url = Some(url.trim().to_string());
    }
    config
}
