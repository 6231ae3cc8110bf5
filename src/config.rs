//! Template set configuration and render variables from TOML
//!
//! ```toml
//! base_dir = "templates"
//! cache = true
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::value::Value;

/// Errors that can occur when loading configuration or variables
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse configuration TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Variable '{name}' has unsupported type {kind}")]
    UnsupportedValue { name: String, kind: &'static str },
}

/// Settings for a [`TemplateSet`](crate::TemplateSet)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SetConfig {
    /// Directory that top-level and string-compiled templates resolve against
    pub base_dir: PathBuf,
    /// Keep compiled templates for reuse
    pub cache: bool,
}

impl Default for SetConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::new(),
            cache: true,
        }
    }
}

impl SetConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    pub fn with_cache(mut self, cache: bool) -> Self {
        self.cache = cache;
        self
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}

/// Read render variables from a TOML file
pub fn load_variables(path: &Path) -> Result<HashMap<String, Value>, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    variables_from_str(&content)
}

/// Parse a TOML document into render variables.
///
/// Strings, numbers, booleans and arrays of those are supported; tables and
/// datetimes are rejected.
pub fn variables_from_str(content: &str) -> Result<HashMap<String, Value>, ConfigError> {
    let table: toml::Table = toml::from_str(content)?;
    table
        .into_iter()
        .map(|(name, value)| {
            let value = convert(&name, value)?;
            Ok((name, value))
        })
        .collect()
}

fn convert(name: &str, value: toml::Value) -> Result<Value, ConfigError> {
    Ok(match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => Value::Number(f),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Array(items) => Value::List(
            items
                .into_iter()
                .map(|item| convert(name, item))
                .collect::<Result<_, _>>()?,
        ),
        toml::Value::Table(_) => return Err(unsupported(name, "table")),
        toml::Value::Datetime(_) => return Err(unsupported(name, "datetime")),
    })
}

fn unsupported(name: &str, kind: &'static str) -> ConfigError {
    ConfigError::UnsupportedValue {
        name: name.to_string(),
        kind,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SetConfig::default();
        assert_eq!(config.base_dir, PathBuf::new());
        assert!(config.cache);
        assert_eq!(SetConfig::from_str("").expect("Should parse"), config);
    }

    #[test]
    fn test_from_str_partial() {
        let config = SetConfig::from_str(r#"base_dir = "templates""#).expect("Should parse");
        assert_eq!(config.base_dir, PathBuf::from("templates"));
        assert!(config.cache);

        let config = SetConfig::from_str("cache = false").expect("Should parse");
        assert!(!config.cache);
    }

    #[test]
    fn test_from_str_invalid() {
        assert!(matches!(
            SetConfig::from_str("cache = \"yes\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_builder() {
        let config = SetConfig::new().with_base_dir("views").with_cache(false);
        assert_eq!(config.base_dir, PathBuf::from("views"));
        assert!(!config.cache);
    }

    #[test]
    fn test_variables_from_str() {
        let vars = variables_from_str(
            r#"
title = "Sign in"
count = 3
ratio = 0.5
admin = false
tags = ["a", 1]
"#,
        )
        .expect("Should parse");
        assert_eq!(vars["title"], Value::from("Sign in"));
        assert_eq!(vars["count"], Value::from(3i64));
        assert_eq!(vars["ratio"], Value::Number(0.5));
        assert_eq!(vars["admin"], Value::Bool(false));
        assert_eq!(
            vars["tags"],
            Value::List(vec![Value::from("a"), Value::from(1i64)])
        );
    }

    #[test]
    fn test_variables_reject_tables() {
        let err = variables_from_str("[user]\nname = \"x\"").unwrap_err();
        assert_eq!(err.to_string(), "Variable 'user' has unsupported type table");
    }
}
