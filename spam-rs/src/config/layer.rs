//! Configuration sources
//!
//! Every source produces a [`ConfigLayer`]: a partial configuration whose
//! fields keep their raw JSON form, so type problems (a number inside the
//! whitelist, a threshold given as a string) are judged once, during
//! validation of the merged result.

use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use tracing::warn;

use crate::error::Result;

/// Environment variable overriding the threshold
pub const ENV_THRESHOLD: &str = "THRESHOLD";
/// Environment variable overriding the whitelist (comma separated)
pub const ENV_WHITELIST: &str = "WHITELIST";
/// Environment variable overriding the blacklist (comma separated)
pub const ENV_BLACKLIST: &str = "BLACKLIST";

/// Partial configuration from a single source
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ConfigLayer {
    #[serde(default, deserialize_with = "non_null")]
    pub threshold: Option<Value>,
    #[serde(default, deserialize_with = "non_null")]
    pub whitelist: Option<Value>,
    #[serde(default, deserialize_with = "non_null")]
    pub blacklist: Option<Value>,
    #[serde(default, deserialize_with = "non_null")]
    pub algorithm: Option<Value>,
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub threshold: Option<f64>,
    pub whitelist: Option<Vec<String>>,
    pub blacklist: Option<Vec<String>>,
    pub algorithm: Option<String>,
}

/// Treat an explicit JSON `null` the same as a missing key
fn non_null<'de, D>(deserializer: D) -> std::result::Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => None,
        other => Some(other),
    })
}

impl ConfigLayer {
    /// Load a layer from a JSON config file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Read the layer from the process environment
    pub fn from_env() -> Self {
        Self::from_env_vars(std::env::vars())
    }

    /// Build the layer from an explicit set of environment variables
    pub fn from_env_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut layer = Self::default();

        for (key, value) in vars {
            let value = value.as_ref();
            match key.as_ref() {
                ENV_THRESHOLD => layer.threshold = parse_env_threshold(value),
                ENV_WHITELIST => layer.whitelist = parse_env_list(value),
                ENV_BLACKLIST => layer.blacklist = parse_env_list(value),
                _ => {}
            }
        }

        layer
    }

    /// Build the layer from command line overrides
    pub fn from_cli(overrides: CliOverrides) -> Self {
        Self {
            threshold: overrides.threshold.map(threshold_value),
            whitelist: overrides.whitelist.and_then(string_list),
            blacklist: overrides.blacklist.and_then(string_list),
            algorithm: overrides
                .algorithm
                .filter(|name| !name.trim().is_empty())
                .map(Value::String),
        }
    }

    /// Place `higher` on top of this layer; its fields win where present
    pub fn overlay(self, higher: ConfigLayer) -> ConfigLayer {
        ConfigLayer {
            threshold: higher.threshold.or(self.threshold),
            whitelist: higher.whitelist.or(self.whitelist),
            blacklist: higher.blacklist.or(self.blacklist),
            algorithm: higher.algorithm.or(self.algorithm),
        }
    }

    /// True when the layer sets nothing
    pub fn is_empty(&self) -> bool {
        self.threshold.is_none()
            && self.whitelist.is_none()
            && self.blacklist.is_none()
            && self.algorithm.is_none()
    }
}

/// JSON has no infinity or NaN; those are kept as text so validation rejects them
fn threshold_value(value: f64) -> Value {
    serde_json::Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(value.to_string()))
}

fn string_list(items: Vec<String>) -> Option<Value> {
    if items.is_empty() {
        return None;
    }
    Some(Value::Array(items.into_iter().map(Value::String).collect()))
}

fn parse_env_threshold(raw: &str) -> Option<Value> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Some(threshold_value(value)),
        _ => {
            warn!("Invalid threshold value in environment variable {}: {:?}", ENV_THRESHOLD, raw);
            Some(Value::String(raw.to_string()))
        }
    }
}

fn parse_env_list(raw: &str) -> Option<Value> {
    let items: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect();

    string_list(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_env_layer_parses_all_variables() {
        let layer = ConfigLayer::from_env_vars([
            ("THRESHOLD", "0.3"),
            ("WHITELIST", "a@example.com, b@example.com"),
            ("BLACKLIST", "spam.com"),
            ("PATH", "/usr/bin"),
        ]);

        assert_eq!(layer.threshold, Some(json!(0.3)));
        assert_eq!(layer.whitelist, Some(json!(["a@example.com", "b@example.com"])));
        assert_eq!(layer.blacklist, Some(json!(["spam.com"])));
        assert!(layer.algorithm.is_none());
    }

    #[test]
    fn test_env_invalid_threshold_is_kept_for_validation() {
        let layer = ConfigLayer::from_env_vars([("THRESHOLD", "very high")]);
        assert_eq!(layer.threshold, Some(json!("very high")));

        let layer = ConfigLayer::from_env_vars([("THRESHOLD", " inf ")]);
        assert_eq!(layer.threshold, Some(json!("inf")));

        let layer = ConfigLayer::from_env_vars([("THRESHOLD", "  ")]);
        assert!(layer.threshold.is_none());
    }

    #[test]
    fn test_cli_non_finite_threshold_is_kept() {
        let layer = ConfigLayer::from_cli(CliOverrides {
            threshold: Some(f64::INFINITY),
            ..Default::default()
        });
        assert_eq!(layer.threshold, Some(json!("inf")));

        let layer = ConfigLayer::from_cli(CliOverrides {
            threshold: Some(f64::NAN),
            ..Default::default()
        });
        assert_eq!(layer.threshold, Some(json!("NaN")));
    }

    #[test]
    fn test_env_empty_lists_are_absent() {
        let layer = ConfigLayer::from_env_vars([("WHITELIST", ""), ("BLACKLIST", " , ,")]);
        assert!(layer.whitelist.is_none());
        assert!(layer.blacklist.is_none());
        assert!(layer.is_empty());
    }

    #[test]
    fn test_cli_layer() {
        let layer = ConfigLayer::from_cli(CliOverrides {
            threshold: Some(0.9),
            whitelist: Some(vec![]),
            blacklist: Some(vec!["bad@spam.com".to_string()]),
            algorithm: Some("svm".to_string()),
        });

        assert_eq!(layer.threshold, Some(json!(0.9)));
        assert!(layer.whitelist.is_none());
        assert_eq!(layer.blacklist, Some(json!(["bad@spam.com"])));
        assert_eq!(layer.algorithm, Some(json!("svm")));
    }

    #[test]
    fn test_file_layer_keeps_raw_values() {
        let layer: ConfigLayer = serde_json::from_str(
            r#"{"threshold": "0.4", "whitelist": [1, "a@b.com"], "blacklist": null, "extra": true}"#,
        )
        .unwrap();

        assert_eq!(layer.threshold, Some(json!("0.4")));
        assert_eq!(layer.whitelist, Some(json!([1, "a@b.com"])));
        assert!(layer.blacklist.is_none());
    }

    #[test]
    fn test_overlay_prefers_higher_layer() {
        let file = ConfigLayer {
            threshold: Some(json!(0.5)),
            whitelist: Some(json!(["file@example.com"])),
            ..Default::default()
        };
        let env = ConfigLayer {
            threshold: Some(json!(0.6)),
            ..Default::default()
        };

        let merged = file.overlay(env);
        assert_eq!(merged.threshold, Some(json!(0.6)));
        assert_eq!(merged.whitelist, Some(json!(["file@example.com"])));
    }
}
