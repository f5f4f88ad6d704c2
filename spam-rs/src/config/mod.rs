//! Filter configuration
//!
//! Configuration is assembled from three sources with fixed precedence:
//! command line flags win over environment variables, which win over the
//! JSON config file. The merged result is validated before use; an invalid
//! configuration is reported and replaced by [`FilterConfig::default`].
//!
//! - [`layer`]: one partial view per source
//! - [`resolver`]: merging and validation
//! - [`watcher`]: hot reload of the config file

pub mod layer;
pub mod resolver;
pub mod watcher;

pub use layer::{CliOverrides, ConfigLayer};
pub use resolver::{validate, ConfigResolver};
pub use watcher::ConfigWatcher;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Spam probability at or above which a message is marked as spam
pub const DEFAULT_THRESHOLD: f64 = 0.7;

/// Algorithm used when none is configured
pub const DEFAULT_ALGORITHM: &str = "naive_bayes";

/// Default config file location
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Validated filter configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Sensitivity cutoff, always within [0, 1]
    pub threshold: f64,
    /// Addresses or domains that are never marked as spam
    pub whitelist: BTreeSet<String>,
    /// Addresses or domains that are always marked as spam
    pub blacklist: BTreeSet<String>,
    /// Name of the classifier to dispatch to
    pub algorithm: String,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            whitelist: BTreeSet::new(),
            blacklist: BTreeSet::new(),
            algorithm: DEFAULT_ALGORITHM.to_string(),
        }
    }
}
