//! Computation settings
//!
//! Loaded from YAML or JSON; every section is optional.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("CONFIG/yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("CONFIG/json: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComputeConfig {
    #[serde(default)]
    pub settings: Settings,

    #[serde(default)]
    pub package: PackageInfo,

    /// Options per plugin name, merged into what each plugin receives
    #[serde(default)]
    pub plugins: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub extras: Option<ExtrasSettings>,

    /// Passed to plugins as `sandbox`
    #[serde(default)]
    pub sandbox: bool,

    /// Skip token scope introspection
    #[serde(default)]
    pub notoken: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtrasSettings {
    /// Enabled extra features (list, or `true` for all)
    #[serde(default)]
    pub features: Option<Value>,

    #[serde(default)]
    pub default: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageInfo {
    pub version: String,
    pub author: String,
}

impl Default for PackageInfo {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            author: env!("CARGO_PKG_AUTHORS").to_string(),
        }
    }
}

impl ComputeConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// `extras.features`, else `extras.default`, else `false`
    pub fn extras(&self) -> Value {
        let extras = self.settings.extras.as_ref();
        extras
            .and_then(|e| e.features.clone())
            .or_else(|| extras.and_then(|e| e.default).map(Value::Bool))
            .unwrap_or(Value::Bool(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_yaml_uses_defaults() {
        let config = ComputeConfig::from_yaml("{}").unwrap();
        assert!(!config.settings.sandbox);
        assert!(!config.settings.notoken);
        assert_eq!(config.extras(), json!(false));
        assert_eq!(config.package.version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_yaml_settings() {
        let config = ComputeConfig::from_yaml(
            r#"
settings:
  sandbox: true
  notoken: true
  extras:
    default: true
package:
  version: "3.34.0"
  author: lowlighter
plugins:
  isocalendar:
    duration: full-year
"#,
        )
        .unwrap();
        assert!(config.settings.sandbox);
        assert!(config.settings.notoken);
        assert_eq!(config.extras(), json!(true));
        assert_eq!(config.package.author, "lowlighter");
        assert_eq!(config.plugins["isocalendar"], json!({ "duration": "full-year" }));
    }

    #[test]
    fn test_extras_features_win_over_default() {
        let config = ComputeConfig::from_json(
            r#"{"settings": {"extras": {"features": ["metrics.run.puppeteer"], "default": true}}}"#,
        )
        .unwrap();
        assert_eq!(config.extras(), json!(["metrics.run.puppeteer"]));
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(matches!(
            ComputeConfig::from_yaml("settings: [unterminated"),
            Err(ConfigError::Yaml(_))
        ));
    }
}
