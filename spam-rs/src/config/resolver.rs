//! Configuration merging and validation

use serde_json::Value;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use super::layer::{CliOverrides, ConfigLayer};
use super::{FilterConfig, DEFAULT_ALGORITHM, DEFAULT_THRESHOLD};
use crate::error::{Result, SpamError};

/// Resolves the effective configuration from file, environment and CLI
///
/// The environment and CLI layers are captured once at construction; only
/// the file is re-read on every [`resolve`](Self::resolve), which is what
/// the hot-reload watcher relies on.
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
    config_path: Option<PathBuf>,
    env: ConfigLayer,
    cli: ConfigLayer,
}

impl ConfigResolver {
    /// Create a resolver reading the given file and the process environment
    pub fn new(config_path: Option<PathBuf>) -> Self {
        Self {
            config_path,
            env: ConfigLayer::from_env(),
            cli: ConfigLayer::default(),
        }
    }

    /// Replace the environment layer
    pub fn with_env(mut self, env: ConfigLayer) -> Self {
        self.env = env;
        self
    }

    /// Set the command line layer
    pub fn with_cli(mut self, overrides: CliOverrides) -> Self {
        self.cli = ConfigLayer::from_cli(overrides);
        self
    }

    /// Path of the config file, if any
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Read the file layer; problems are logged and yield an empty layer
    pub fn file_layer(&self) -> ConfigLayer {
        let Some(path) = &self.config_path else {
            return ConfigLayer::default();
        };

        match ConfigLayer::from_file(path) {
            Ok(layer) => {
                debug!("Loaded configuration file {}", path.display());
                layer
            }
            Err(SpamError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Configuration file {} not found. Using default settings.", path.display());
                ConfigLayer::default()
            }
            Err(e) => {
                warn!("Error reading configuration file {}: {}. Using default settings.", path.display(), e);
                ConfigLayer::default()
            }
        }
    }

    /// Merge all layers: CLI > environment > file
    pub fn merged(&self) -> ConfigLayer {
        self.file_layer()
            .overlay(self.env.clone())
            .overlay(self.cli.clone())
    }

    /// Merge and validate, returning the validation error to the caller
    pub fn try_resolve(&self) -> Result<FilterConfig> {
        validate(&self.merged())
    }

    /// Merge and validate, falling back to defaults on invalid input
    pub fn resolve(&self) -> FilterConfig {
        match self.try_resolve() {
            Ok(config) => {
                info!(
                    "Configuration loaded: threshold={}, algorithm={}, whitelist={}, blacklist={}",
                    config.threshold,
                    config.algorithm,
                    config.whitelist.len(),
                    config.blacklist.len()
                );
                config
            }
            Err(e) => {
                error!("{}", e);
                warn!("Using default settings due to configuration errors.");
                FilterConfig::default()
            }
        }
    }
}

/// Validate a merged layer into a usable configuration
pub fn validate(layer: &ConfigLayer) -> Result<FilterConfig> {
    let threshold = match &layer.threshold {
        None => DEFAULT_THRESHOLD,
        Some(value) => validate_threshold(value)?,
    };

    let whitelist = match &layer.whitelist {
        None => BTreeSet::new(),
        Some(value) => validate_list(value, "Whitelist")?,
    };

    let blacklist = match &layer.blacklist {
        None => BTreeSet::new(),
        Some(value) => validate_list(value, "Blacklist")?,
    };

    let algorithm = match &layer.algorithm {
        None => DEFAULT_ALGORITHM.to_string(),
        Some(Value::String(name)) if !name.trim().is_empty() => name.trim().to_string(),
        Some(other) => {
            return Err(SpamError::Validation(format!(
                "Algorithm must be a non-empty string, got {}",
                other
            )))
        }
    };

    Ok(FilterConfig {
        threshold,
        whitelist,
        blacklist,
        algorithm,
    })
}

fn validate_threshold(value: &Value) -> Result<f64> {
    let threshold = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match threshold {
        Some(t) if (0.0..=1.0).contains(&t) => Ok(t),
        _ => Err(SpamError::Validation(format!(
            "Threshold must be a number between 0 and 1, got {}",
            value
        ))),
    }
}

fn validate_list(value: &Value, field: &str) -> Result<BTreeSet<String>> {
    let invalid = || SpamError::Validation(format!("{} must be a list of strings.", field));

    let Value::Array(items) = value else {
        return Err(invalid());
    };

    items
        .iter()
        .map(|item| item.as_str().map(str::to_string).ok_or_else(invalid))
        .collect()
}
