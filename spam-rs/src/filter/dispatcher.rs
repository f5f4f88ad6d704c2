//! Algorithm dispatcher
//!
//! [`SpamFilter`] owns one trained [`Model`] per algorithm and reads its
//! configuration from a `watch` channel, so a hot reload takes effect on the
//! next message without locking.

use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

use super::lists::AddressList;
use super::types::Verdict;
use crate::classifiers::{Algorithm, Model, TrainingOptions};
use crate::config::FilterConfig;
use crate::corpus::TrainingSet;
use crate::email::Email;
use crate::error::{Result, SpamError};

/// Spam filter dispatching to the configured classifier
pub struct SpamFilter {
    models: HashMap<Algorithm, Model>,
    config: watch::Receiver<FilterConfig>,
}

impl SpamFilter {
    /// Filter with a fixed configuration
    pub fn new(config: FilterConfig) -> Self {
        let (_tx, rx) = watch::channel(config);
        Self::with_config_updates(rx)
    }

    /// Filter following a live configuration, e.g. from [`crate::config::ConfigWatcher`]
    pub fn with_config_updates(config: watch::Receiver<FilterConfig>) -> Self {
        Self {
            models: HashMap::new(),
            config,
        }
    }

    /// Add a trained model, replacing any previous one for the same algorithm
    pub fn register(&mut self, model: impl Into<Model>) -> Option<Model> {
        let model = model.into();
        self.models.insert(model.algorithm(), model)
    }

    pub fn with_model(mut self, model: impl Into<Model>) -> Self {
        self.register(model);
        self
    }

    /// Train and register one model per requested algorithm
    pub fn train(
        &mut self,
        set: &TrainingSet,
        algorithms: &[Algorithm],
        options: &TrainingOptions,
    ) -> Result<()> {
        for &algorithm in algorithms {
            info!(
                "Training {} on {} samples ({} spam, {} ham)",
                algorithm,
                set.len(),
                set.spam_count(),
                set.ham_count()
            );
            let model = Model::train(algorithm, set.pairs(), options)?;
            self.models.insert(algorithm, model);
        }
        Ok(())
    }

    /// Registered algorithms
    pub fn algorithms(&self) -> Vec<Algorithm> {
        let mut algorithms: Vec<_> = self.models.keys().copied().collect();
        algorithms.sort_by_key(|a| a.as_str());
        algorithms
    }

    /// Snapshot of the current configuration
    pub fn config(&self) -> FilterConfig {
        self.config.borrow().clone()
    }

    /// Classify raw message text
    pub fn run(&self, content: &str) -> Result<Verdict> {
        self.classify(&Email::parse(content))
    }

    /// Classify a parsed email against one configuration snapshot
    pub fn classify(&self, email: &Email) -> Result<Verdict> {
        let config = self.config();

        let algorithm: Algorithm = config.algorithm.parse()?;
        let model = self
            .models
            .get(&algorithm)
            .ok_or_else(|| SpamError::UnsupportedAlgorithm(config.algorithm.clone()))?;

        if let Some(sender) = email.from.as_deref() {
            // Blacklist wins over whitelist
            if let Some(entry) = AddressList::from(&config.blacklist).matching_entry(sender) {
                debug!("Sender {} blacklisted by {}", sender, entry);
                return Ok(Verdict::blacklisted(algorithm, entry));
            }
            if let Some(entry) = AddressList::from(&config.whitelist).matching_entry(sender) {
                debug!("Sender {} whitelisted by {}", sender, entry);
                return Ok(Verdict::whitelisted(algorithm, entry));
            }
        }

        let p = model.spam_probability(&email.content())?;
        let verdict = Verdict::scored(algorithm, p, config.threshold);
        debug!(
            "{} scored {:.4} (threshold {}): {}",
            algorithm, p, config.threshold, verdict.label
        );
        Ok(verdict)
    }

    /// Classify many messages on a pool of `workers` blocking tasks
    ///
    /// Results come back in input order; one failing message does not abort
    /// the others.
    pub async fn classify_batch(
        self: &Arc<Self>,
        contents: Vec<String>,
        workers: usize,
    ) -> Vec<Result<Verdict>> {
        let workers = workers.max(1);
        debug!("Classifying {} messages with {} workers", contents.len(), workers);

        let mut results: Vec<(usize, Result<Verdict>)> = stream::iter(contents.into_iter().enumerate())
            .map(|(index, content)| {
                let filter = Arc::clone(self);
                async move {
                    let joined = tokio::task::spawn_blocking(move || filter.run(&content)).await;
                    (index, joined.map_err(SpamError::from).and_then(|verdict| verdict))
                }
            })
            .buffer_unordered(workers)
            .collect()
            .await;

        results.sort_by_key(|(index, _)| *index);
        results.into_iter().map(|(_, verdict)| verdict).collect()
    }
}

impl std::fmt::Debug for SpamFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpamFilter")
            .field("algorithms", &self.algorithms())
            .field("config", &*self.config.borrow())
            .finish()
    }
}
